use std::{cmp::Ordering, collections::BTreeSet, fmt, sync::Arc};

use super::{Expression, PredicateVisitor, VisitOutcome};

/// Comparison operator used by binary predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Equals (`=`).
    Equal,
    /// Not equals (`!=`).
    NotEqual,
    /// Less than (`<`).
    LessThan,
    /// Less than or equal to (`<=`).
    LessThanOrEqual,
    /// Greater than (`>`).
    GreaterThan,
    /// Greater than or equal to (`>=`).
    GreaterThanOrEqual,
}

impl ComparisonOp {
    /// Returns a textual representation of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        }
    }

    /// Returns the operator that swaps the left/right side of the comparison.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            ComparisonOp::Equal => ComparisonOp::Equal,
            ComparisonOp::NotEqual => ComparisonOp::NotEqual,
            ComparisonOp::LessThan => ComparisonOp::GreaterThan,
            ComparisonOp::LessThanOrEqual => ComparisonOp::GreaterThanOrEqual,
            ComparisonOp::GreaterThan => ComparisonOp::LessThan,
            ComparisonOp::GreaterThanOrEqual => ComparisonOp::LessThanOrEqual,
        }
    }

    /// Evaluates the operator against a comparison ordering.
    #[must_use]
    pub fn test_ordering(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering == Ordering::Equal,
            ComparisonOp::NotEqual => ordering != Ordering::Equal,
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::LessThanOrEqual => ordering != Ordering::Greater,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
            ComparisonOp::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary spatial relation between two geometry expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpatialOp {
    /// Bounding boxes interact.
    BBox,
    /// Geometries share at least one point.
    Intersects,
    /// Left geometry contains the right one.
    Contains,
    /// Geometries cross.
    Crosses,
    /// Geometries share no point.
    Disjoint,
    /// Geometries are within the predicate distance of each other.
    DWithin,
    /// Geometries are further apart than the predicate distance.
    Beyond,
    /// Geometries are topologically equal.
    Equals,
    /// Geometries overlap.
    Overlaps,
    /// Geometries touch at their boundaries only.
    Touches,
    /// Left geometry lies within the right one.
    Within,
}

impl SpatialOp {
    /// Every spatial operator, in declaration order.
    pub const ALL: [SpatialOp; 11] = [
        SpatialOp::BBox,
        SpatialOp::Intersects,
        SpatialOp::Contains,
        SpatialOp::Crosses,
        SpatialOp::Disjoint,
        SpatialOp::DWithin,
        SpatialOp::Beyond,
        SpatialOp::Equals,
        SpatialOp::Overlaps,
        SpatialOp::Touches,
        SpatialOp::Within,
    ];

    /// Returns the ECQL function name of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SpatialOp::BBox => "BBOX",
            SpatialOp::Intersects => "INTERSECTS",
            SpatialOp::Contains => "CONTAINS",
            SpatialOp::Crosses => "CROSSES",
            SpatialOp::Disjoint => "DISJOINT",
            SpatialOp::DWithin => "DWITHIN",
            SpatialOp::Beyond => "BEYOND",
            SpatialOp::Equals => "EQUALS",
            SpatialOp::Overlaps => "OVERLAPS",
            SpatialOp::Touches => "TOUCHES",
            SpatialOp::Within => "WITHIN",
        }
    }

    /// Returns true for the distance-based operators.
    #[must_use]
    pub fn takes_distance(self) -> bool {
        matches!(self, SpatialOp::DWithin | SpatialOp::Beyond)
    }
}

impl fmt::Display for SpatialOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pattern operand of a `LIKE` predicate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LikePattern {
    /// Pattern text.
    pub pattern: Arc<str>,
    /// Wildcard matching any run of characters.
    pub wildcard_multi: char,
    /// Wildcard matching exactly one character.
    pub wildcard_single: char,
    /// Escape character for literal wildcards.
    pub escape: char,
    /// Case-sensitive match when true.
    pub match_case: bool,
}

impl LikePattern {
    /// Creates a case-sensitive SQL-style pattern (`%`, `_`, `\`).
    #[must_use]
    pub fn new<P>(pattern: P) -> Self
    where
        P: Into<Arc<str>>,
    {
        Self {
            pattern: pattern.into(),
            wildcard_multi: '%',
            wildcard_single: '_',
            escape: '\\',
            match_case: true,
        }
    }

    /// Overrides the wildcard and escape characters.
    #[must_use]
    pub fn wildcards(self, multi: char, single: char, escape: char) -> Self {
        Self {
            wildcard_multi: multi,
            wildcard_single: single,
            escape,
            ..self
        }
    }

    /// Sets case sensitivity.
    #[must_use]
    pub fn match_case(self, match_case: bool) -> Self {
        Self { match_case, ..self }
    }
}

impl From<&str> for LikePattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LikePattern {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Arc<str>> for LikePattern {
    fn from(value: Arc<str>) -> Self {
        Self::new(value)
    }
}

/// Identifier of a single feature, as assigned by the data source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(Arc<str>);

impl FeatureId {
    /// Creates a feature identifier.
    #[must_use]
    pub fn new<N>(id: N) -> Self
    where
        N: Into<Arc<str>>,
    {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recursive predicate node; leaf and branch variants coexist.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateNode {
    /// Always-true constant; matches all rows.
    MatchAll,
    /// Always-false constant; matches no rows.
    MatchNone,
    /// Binary comparison.
    Compare {
        /// Left operand.
        left: Expression,
        /// Operator.
        op: ComparisonOp,
        /// Right operand.
        right: Expression,
    },
    /// Inclusive range test `low <= test <= high`.
    Between {
        /// Lower bound.
        low: Expression,
        /// Value under test.
        test: Expression,
        /// Upper bound.
        high: Expression,
    },
    /// Pattern match over a string value.
    Like {
        /// Value to match.
        value: Expression,
        /// Pattern.
        pattern: LikePattern,
    },
    /// Null check (`IS NULL`).
    IsNull {
        /// Expression under inspection.
        value: Expression,
    },
    /// Binary spatial relation.
    Spatial {
        /// Relation.
        op: SpatialOp,
        /// Left geometry.
        left: Expression,
        /// Right geometry.
        right: Expression,
        /// Buffer distance for [`SpatialOp::DWithin`] and [`SpatialOp::Beyond`].
        distance: Option<f64>,
    },
    /// Membership in an explicit set of feature identifiers.
    FeatureIds(BTreeSet<FeatureId>),
    /// Vendor-specific predicate without pushdown rules.
    Custom {
        /// Predicate name.
        name: Arc<str>,
        /// Arguments.
        args: Vec<Expression>,
    },
    /// Logical negation.
    Not(Box<Predicate>),
    /// Conjunction over multiple predicates.
    And(Vec<Predicate>),
    /// Disjunction over multiple predicates.
    Or(Vec<Predicate>),
}

impl PredicateNode {
    /// Returns true when the node has no child predicates.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            PredicateNode::Not(_) | PredicateNode::And(_) | PredicateNode::Or(_)
        )
    }
}

/// Boolean predicate over feature attributes and geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    kind: PredicateNode,
}

impl Predicate {
    /// Returns a reference to the underlying node.
    #[must_use]
    pub fn kind(&self) -> &PredicateNode {
        &self.kind
    }

    /// Builds a predicate directly from a single node.
    #[must_use]
    pub fn from_node(node: PredicateNode) -> Self {
        Self { kind: node }
    }

    /// Consumes the predicate and returns its node.
    #[must_use]
    pub fn into_node(self) -> PredicateNode {
        self.kind
    }

    /// Predicate matching every row.
    #[must_use]
    pub fn match_all() -> Self {
        Self::from_node(PredicateNode::MatchAll)
    }

    /// Predicate matching no row.
    #[must_use]
    pub fn match_none() -> Self {
        Self::from_node(PredicateNode::MatchNone)
    }

    /// Returns true for the [`PredicateNode::MatchAll`] constant.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        matches!(self.kind, PredicateNode::MatchAll)
    }

    /// Returns true for the [`PredicateNode::MatchNone`] constant.
    #[must_use]
    pub fn is_match_none(&self) -> bool {
        matches!(self.kind, PredicateNode::MatchNone)
    }

    /// Binary comparison `left op right`.
    #[must_use]
    pub fn compare<L, R>(left: L, op: ComparisonOp, right: R) -> Self
    where
        L: Into<Expression>,
        R: Into<Expression>,
    {
        Self::from_node(PredicateNode::Compare {
            left: left.into(),
            op,
            right: right.into(),
        })
    }

    /// `left = right`.
    #[must_use]
    pub fn eq<L, R>(left: L, right: R) -> Self
    where
        L: Into<Expression>,
        R: Into<Expression>,
    {
        Self::compare(left, ComparisonOp::Equal, right)
    }

    /// `left != right`.
    #[must_use]
    pub fn ne<L, R>(left: L, right: R) -> Self
    where
        L: Into<Expression>,
        R: Into<Expression>,
    {
        Self::compare(left, ComparisonOp::NotEqual, right)
    }

    /// `left < right`.
    #[must_use]
    pub fn lt<L, R>(left: L, right: R) -> Self
    where
        L: Into<Expression>,
        R: Into<Expression>,
    {
        Self::compare(left, ComparisonOp::LessThan, right)
    }

    /// `left > right`.
    #[must_use]
    pub fn gt<L, R>(left: L, right: R) -> Self
    where
        L: Into<Expression>,
        R: Into<Expression>,
    {
        Self::compare(left, ComparisonOp::GreaterThan, right)
    }

    /// `low <= test <= high`.
    #[must_use]
    pub fn between<Lo, T, Hi>(low: Lo, test: T, high: Hi) -> Self
    where
        Lo: Into<Expression>,
        T: Into<Expression>,
        Hi: Into<Expression>,
    {
        Self::from_node(PredicateNode::Between {
            low: low.into(),
            test: test.into(),
            high: high.into(),
        })
    }

    /// `value LIKE pattern`.
    #[must_use]
    pub fn like<V, P>(value: V, pattern: P) -> Self
    where
        V: Into<Expression>,
        P: Into<LikePattern>,
    {
        Self::from_node(PredicateNode::Like {
            value: value.into(),
            pattern: pattern.into(),
        })
    }

    /// `value IS NULL`.
    #[must_use]
    pub fn is_null<V>(value: V) -> Self
    where
        V: Into<Expression>,
    {
        Self::from_node(PredicateNode::IsNull {
            value: value.into(),
        })
    }

    /// Spatial relation without a distance.
    #[must_use]
    pub fn spatial<L, R>(op: SpatialOp, left: L, right: R) -> Self
    where
        L: Into<Expression>,
        R: Into<Expression>,
    {
        Self::from_node(PredicateNode::Spatial {
            op,
            left: left.into(),
            right: right.into(),
            distance: None,
        })
    }

    /// Distance-based spatial relation ([`SpatialOp::DWithin`] or [`SpatialOp::Beyond`]).
    #[must_use]
    pub fn spatial_distance<L, R>(op: SpatialOp, left: L, right: R, distance: f64) -> Self
    where
        L: Into<Expression>,
        R: Into<Expression>,
    {
        Self::from_node(PredicateNode::Spatial {
            op,
            left: left.into(),
            right: right.into(),
            distance: Some(distance),
        })
    }

    /// Membership in the supplied feature identifiers.
    #[must_use]
    pub fn feature_ids<I, F>(ids: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FeatureId>,
    {
        Self::from_node(PredicateNode::FeatureIds(
            ids.into_iter().map(Into::into).collect(),
        ))
    }

    /// Vendor-specific predicate.
    #[must_use]
    pub fn custom<N, I>(name: N, args: I) -> Self
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = Expression>,
    {
        Self::from_node(PredicateNode::Custom {
            name: name.into(),
            args: args.into_iter().collect(),
        })
    }

    /// Wraps the predicate in a negation.
    #[must_use]
    pub fn not(predicate: Predicate) -> Self {
        Self::from_node(PredicateNode::Not(Box::new(predicate)))
    }

    /// Builds a conjunction from the supplied clauses, flattening nested conjunctions.
    ///
    /// # Panics
    ///
    /// Panics if no clauses are provided.
    #[must_use]
    pub fn and<I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut acc = Vec::new();
        for clause in clauses {
            match clause.into_node() {
                PredicateNode::And(mut nested) => acc.append(&mut nested),
                other => acc.push(Predicate::from_node(other)),
            }
        }

        assert!(!acc.is_empty(), "Predicate::and requires at least one clause");

        if acc.len() == 1 {
            acc.pop().expect("length checked")
        } else {
            Self::from_node(PredicateNode::And(acc))
        }
    }

    /// Builds a disjunction from the supplied clauses, flattening nested disjunctions.
    ///
    /// # Panics
    ///
    /// Panics if no clauses are provided.
    #[must_use]
    pub fn or<I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut acc = Vec::new();
        for clause in clauses {
            match clause.into_node() {
                PredicateNode::Or(mut nested) => acc.append(&mut nested),
                other => acc.push(Predicate::from_node(other)),
            }
        }

        assert!(!acc.is_empty(), "Predicate::or requires at least one clause");

        if acc.len() == 1 {
            acc.pop().expect("length checked")
        } else {
            Self::from_node(PredicateNode::Or(acc))
        }
    }

    /// Builds a conjunction from the supplied predicates, if any are provided.
    #[must_use]
    pub fn conjunction(predicates: Vec<Predicate>) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.into_iter().next(),
            _ => Some(Predicate::and(predicates)),
        }
    }

    /// Builds a disjunction from the supplied predicates, if any.
    #[must_use]
    pub fn disjunction(predicates: Vec<Predicate>) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.into_iter().next(),
            _ => Some(Predicate::or(predicates)),
        }
    }

    /// Returns the negation of this predicate, unwrapping an existing `NOT`
    /// instead of stacking a second one.
    #[must_use]
    pub fn negate(self) -> Self {
        match self.kind {
            PredicateNode::Not(inner) => *inner,
            other => Self::not(Self::from_node(other)),
        }
    }

    /// Accepts a visitor that walks the predicate tree bottom-up.
    pub fn accept<V>(&self, visitor: &mut V) -> Result<VisitOutcome<V::Value>, V::Error>
    where
        V: PredicateVisitor + ?Sized,
    {
        visitor.visit_predicate(self)
    }
}

impl From<PredicateNode> for Predicate {
    fn from(value: PredicateNode) -> Self {
        Self::from_node(value)
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
    separator: &str,
) -> fmt::Result {
    for (idx, item) in items.into_iter().enumerate() {
        if idx > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PredicateNode::MatchAll => f.write_str("INCLUDE"),
            PredicateNode::MatchNone => f.write_str("EXCLUDE"),
            PredicateNode::Compare { left, op, right } => write!(f, "{left} {op} {right}"),
            PredicateNode::Between { low, test, high } => {
                write!(f, "{test} BETWEEN {low} AND {high}")
            }
            PredicateNode::Like { value, pattern } => {
                let keyword = if pattern.match_case { "LIKE" } else { "ILIKE" };
                write!(f, "{value} {keyword} '{}'", pattern.pattern)
            }
            PredicateNode::IsNull { value } => write!(f, "{value} IS NULL"),
            PredicateNode::Spatial {
                op,
                left,
                right,
                distance,
            } => match distance {
                Some(distance) => write!(f, "{op}({left}, {right}, {distance})"),
                None => write!(f, "{op}({left}, {right})"),
            },
            PredicateNode::FeatureIds(ids) => {
                f.write_str("IN (")?;
                write_joined(f, ids.iter().map(|id| format!("'{id}'")), ", ")?;
                f.write_str(")")
            }
            PredicateNode::Custom { name, args } => {
                write!(f, "{name}(")?;
                write_joined(f, args, ", ")?;
                f.write_str(")")
            }
            PredicateNode::Not(inner) => write!(f, "NOT ({inner})"),
            PredicateNode::And(clauses) => {
                f.write_str("(")?;
                write_joined(f, clauses, " AND ")?;
                f.write_str(")")
            }
            PredicateNode::Or(clauses) => {
                f.write_str("(")?;
                write_joined(f, clauses, " OR ")?;
                f.write_str(")")
            }
        }
    }
}
