//! Declarative description of what a remote feature source evaluates natively.
//!
//! A [`Capabilities`] value is built once per source (typically from its
//! advertised filter capabilities) and only queried afterwards. Nothing in the
//! splitter mutates it.

use std::{collections::BTreeSet, fmt, sync::Arc};

use tonbo_predicate::SpatialOp;

/// Predicate kinds a source may support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PredicateKind {
    /// `BETWEEN` range tests.
    Between,
    /// `=`, `!=`, `<`, `<=`, `>`, `>=`.
    SimpleComparison,
    /// `LIKE` pattern matching.
    Like,
    /// `IS NULL` checks.
    NullCheck,
    /// `AND`, `OR` and `NOT`.
    Logical,
    /// One specific spatial relation.
    Spatial(SpatialOp),
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateKind::Between => f.write_str("between"),
            PredicateKind::SimpleComparison => f.write_str("simple_comparison"),
            PredicateKind::Like => f.write_str("like"),
            PredicateKind::NullCheck => f.write_str("null_check"),
            PredicateKind::Logical => f.write_str("logical"),
            PredicateKind::Spatial(op) => write!(f, "spatial:{}", op.as_str().to_lowercase()),
        }
    }
}

/// Expression kinds a source may support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExpressionKind {
    /// `+`, `-`, `*`, `/`.
    SimpleArithmetic,
    /// Function calls.
    Function,
}

/// Immutable capability descriptor of a remote source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    predicates: BTreeSet<PredicateKind>,
    expressions: BTreeSet<ExpressionKind>,
    functions: Option<BTreeSet<Arc<str>>>,
}

impl Capabilities {
    /// Source that evaluates nothing; every predicate stays local.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Source that evaluates every predicate and expression kind.
    #[must_use]
    pub fn all() -> Self {
        Self::none()
            .with_predicate(PredicateKind::Between)
            .with_predicate(PredicateKind::SimpleComparison)
            .with_predicate(PredicateKind::Like)
            .with_predicate(PredicateKind::NullCheck)
            .with_predicate(PredicateKind::Logical)
            .with_spatial_ops(SpatialOp::ALL)
            .with_expression(ExpressionKind::SimpleArithmetic)
            .with_expression(ExpressionKind::Function)
    }

    /// Comparisons combined with logical connectives, the floor most sources offer.
    #[must_use]
    pub fn simple_comparisons() -> Self {
        Self::none()
            .with_predicate(PredicateKind::SimpleComparison)
            .with_predicate(PredicateKind::Logical)
    }

    /// Adds a supported predicate kind.
    #[must_use]
    pub fn with_predicate(mut self, kind: PredicateKind) -> Self {
        self.predicates.insert(kind);
        self
    }

    /// Removes a predicate kind.
    #[must_use]
    pub fn without_predicate(mut self, kind: PredicateKind) -> Self {
        self.predicates.remove(&kind);
        self
    }

    /// Adds support for each of the supplied spatial relations.
    #[must_use]
    pub fn with_spatial_ops<I>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = SpatialOp>,
    {
        self.predicates
            .extend(ops.into_iter().map(PredicateKind::Spatial));
        self
    }

    /// Adds a supported expression kind.
    #[must_use]
    pub fn with_expression(mut self, kind: ExpressionKind) -> Self {
        self.expressions.insert(kind);
        self
    }

    /// Removes an expression kind.
    #[must_use]
    pub fn without_expression(mut self, kind: ExpressionKind) -> Self {
        self.expressions.remove(&kind);
        self
    }

    /// Restricts function support to an explicit allow-list; each call adds one name.
    ///
    /// Without any allow-list entry every function name is accepted as long as
    /// [`ExpressionKind::Function`] is supported.
    #[must_use]
    pub fn with_function<N>(mut self, name: N) -> Self
    where
        N: Into<Arc<str>>,
    {
        self.functions
            .get_or_insert_with(BTreeSet::new)
            .insert(name.into());
        self
    }

    /// Returns true when the source evaluates the predicate kind.
    #[must_use]
    pub fn supports(&self, kind: PredicateKind) -> bool {
        self.predicates.contains(&kind)
    }

    /// Returns true when the source evaluates the expression kind.
    #[must_use]
    pub fn supports_expression(&self, kind: ExpressionKind) -> bool {
        self.expressions.contains(&kind)
    }

    /// Returns true when the source evaluates calls to the named function.
    #[must_use]
    pub fn supports_function(&self, name: &str) -> bool {
        self.supports_expression(ExpressionKind::Function)
            && self
                .functions
                .as_ref()
                .map_or(true, |allowed| allowed.contains(name))
    }
}
