//! Common test utilities for integration tests: a reference local evaluator,
//! client-side edits and a seeded generator of random predicate trees.
#![allow(dead_code)]

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use regex::RegexBuilder;
use roaring::RoaringBitmap;
use tonbo_pushdown::{
    Capabilities, ComparisonOp, Envelope, Expression, ExpressionKind, FeatureId, FeatureType,
    LikePattern, MathOp, PendingEdits, Predicate, PredicateKind, PredicateNode, ScalarValue,
    SpatialOp,
};

/// Attributes advertised by the remote source.
pub const SCHEMA_ATTRIBUTES: [&str; 4] = ["name", "lanes", "speed", "geom"];
/// Attribute present on local rows but unknown to the source.
pub const GHOST_ATTRIBUTE: &str = "ghost";

/// Number of rows generated per table.
pub const TABLE_LEN: usize = 40;

const NAMES: [&str; 6] = ["Main", "Mill", "main", "Oak", "O_k", "Elm%"];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn roads_schema() -> FeatureType {
    FeatureType::new("roads").attributes(SCHEMA_ATTRIBUTES)
}

/// A feature with its attribute values.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub id: FeatureId,
    pub values: BTreeMap<Arc<str>, ScalarValue>,
}

impl Row {
    fn value(&self, path: &str) -> ScalarValue {
        self.values.get(path).cloned().unwrap_or(ScalarValue::Null)
    }
}

/// Rows addressed by position; row sets are bitmaps of positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn all(&self) -> RoaringBitmap {
        (0..self.rows.len() as u32).collect()
    }

    /// Rows matching `predicate`, with two-valued logic.
    pub fn select(&self, predicate: &Predicate) -> RoaringBitmap {
        match predicate.kind() {
            PredicateNode::MatchAll => self.all(),
            PredicateNode::MatchNone => RoaringBitmap::new(),
            PredicateNode::Not(inner) => self.all() - self.select(inner),
            PredicateNode::And(clauses) => {
                let mut acc = self.all();
                for clause in clauses {
                    acc &= self.select(clause);
                }
                acc
            }
            PredicateNode::Or(clauses) => {
                let mut acc = RoaringBitmap::new();
                for clause in clauses {
                    acc |= self.select(clause);
                }
                acc
            }
            _ => self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| matches_leaf(row, predicate))
                .map(|(idx, _)| idx as u32)
                .collect(),
        }
    }

    pub fn ids(&self, rows: &RoaringBitmap) -> BTreeSet<FeatureId> {
        rows.iter()
            .map(|idx| self.rows[idx as usize].id.clone())
            .collect()
    }

    pub fn subset(&self, rows: &RoaringBitmap) -> Table {
        Table::new(
            rows.iter()
                .map(|idx| self.rows[idx as usize].clone())
                .collect(),
        )
    }

    /// Identifiers selected by `predicate`.
    pub fn matching_ids(&self, predicate: &Predicate) -> BTreeSet<FeatureId> {
        self.ids(&self.select(predicate))
    }
}

fn eval(row: &Row, expr: &Expression) -> ScalarValue {
    match expr {
        Expression::Attribute(attribute) => row.value(&attribute.path),
        Expression::Literal(value) => value.clone(),
        Expression::Math { op, left, right } => {
            let (Some(lhs), Some(rhs)) = (eval(row, left).as_f64(), eval(row, right).as_f64())
            else {
                return ScalarValue::Null;
            };
            match op {
                MathOp::Add => ScalarValue::Float64(lhs + rhs),
                MathOp::Subtract => ScalarValue::Float64(lhs - rhs),
                MathOp::Multiply => ScalarValue::Float64(lhs * rhs),
                MathOp::Divide if rhs == 0.0 => ScalarValue::Null,
                MathOp::Divide => ScalarValue::Float64(lhs / rhs),
            }
        }
        Expression::Function { name, args } => {
            let arg = args.first().map_or(ScalarValue::Null, |arg| eval(row, arg));
            match name.as_deref() {
                Some("abs") => arg
                    .as_f64()
                    .map_or(ScalarValue::Null, |v| ScalarValue::Float64(v.abs())),
                Some("strlen") => arg.as_str().map_or(ScalarValue::Null, |v| {
                    ScalarValue::Int64(v.chars().count() as i64)
                }),
                _ => ScalarValue::Null,
            }
        }
    }
}

fn like_regex(pattern: &LikePattern) -> regex::Regex {
    let mut source = String::from("^");
    let mut escaped = false;
    for ch in pattern.pattern.chars() {
        if escaped {
            source.push_str(&regex::escape(&ch.to_string()));
            escaped = false;
        } else if ch == pattern.escape {
            escaped = true;
        } else if ch == pattern.wildcard_multi {
            source.push_str(".*");
        } else if ch == pattern.wildcard_single {
            source.push('.');
        } else {
            source.push_str(&regex::escape(&ch.to_string()));
        }
    }
    source.push('$');
    RegexBuilder::new(&source)
        .case_insensitive(!pattern.match_case)
        .dot_matches_new_line(true)
        .build()
        .expect("like pattern compiles")
}

fn spatial(op: SpatialOp, left: &Envelope, right: &Envelope, distance: Option<f64>) -> bool {
    let intersects = left.intersects(right);
    let nested = left.contains(right) || right.contains(left);
    match op {
        SpatialOp::BBox | SpatialOp::Intersects => intersects,
        SpatialOp::Contains => left.contains(right),
        SpatialOp::Within => right.contains(left),
        SpatialOp::Disjoint => !intersects,
        SpatialOp::Equals => left == right,
        SpatialOp::Overlaps | SpatialOp::Crosses => intersects && !nested,
        SpatialOp::Touches => {
            intersects
                && (left.max_x == right.min_x
                    || right.max_x == left.min_x
                    || left.max_y == right.min_y
                    || right.max_y == left.min_y)
        }
        SpatialOp::DWithin => left.distance(right) <= distance.unwrap_or(0.0),
        SpatialOp::Beyond => left.distance(right) > distance.unwrap_or(0.0),
    }
}

fn matches_leaf(row: &Row, predicate: &Predicate) -> bool {
    match predicate.kind() {
        PredicateNode::Compare { left, op, right } => eval(row, left)
            .compare(&eval(row, right))
            .is_some_and(|ordering| op.test_ordering(ordering)),
        PredicateNode::Between { low, test, high } => {
            let test = eval(row, test);
            let above = test
                .compare(&eval(row, low))
                .is_some_and(|ordering| ComparisonOp::GreaterThanOrEqual.test_ordering(ordering));
            let below = test
                .compare(&eval(row, high))
                .is_some_and(|ordering| ComparisonOp::LessThanOrEqual.test_ordering(ordering));
            above && below
        }
        PredicateNode::Like { value, pattern } => eval(row, value)
            .as_str()
            .is_some_and(|text| like_regex(pattern).is_match(text)),
        PredicateNode::IsNull { value } => eval(row, value).is_null(),
        PredicateNode::Spatial {
            op,
            left,
            right,
            distance,
        } => {
            let (left, right) = (eval(row, left), eval(row, right));
            match (left.as_envelope(), right.as_envelope()) {
                (Some(left), Some(right)) => spatial(*op, left, right, *distance),
                _ => false,
            }
        }
        PredicateNode::FeatureIds(ids) => ids.contains(&row.id),
        PredicateNode::Custom { name, args } if &**name == "isNil" => args
            .first()
            .map_or(false, |arg| eval(row, arg).is_null()),
        PredicateNode::Custom { .. } => false,
        PredicateNode::MatchAll => true,
        PredicateNode::MatchNone => false,
        PredicateNode::Not(_) | PredicateNode::And(_) | PredicateNode::Or(_) => {
            unreachable!("connectives are evaluated as row sets")
        }
    }
}

fn collect_attributes(expr: &Expression, out: &mut BTreeSet<String>) {
    match expr {
        Expression::Attribute(attribute) => {
            out.insert(attribute.path.to_string());
        }
        Expression::Literal(_) => {}
        Expression::Math { left, right, .. } => {
            collect_attributes(left, out);
            collect_attributes(right, out);
        }
        Expression::Function { args, .. } => {
            for arg in args {
                collect_attributes(arg, out);
            }
        }
    }
}

/// Every attribute path referenced anywhere in `predicate`.
pub fn referenced_attributes(predicate: &Predicate) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let mut pending = vec![predicate];
    while let Some(next) = pending.pop() {
        match next.kind() {
            PredicateNode::Not(inner) => pending.push(inner),
            PredicateNode::And(clauses) | PredicateNode::Or(clauses) => pending.extend(clauses),
            PredicateNode::Compare { left, right, .. }
            | PredicateNode::Spatial { left, right, .. } => {
                collect_attributes(left, &mut out);
                collect_attributes(right, &mut out);
            }
            PredicateNode::Between { low, test, high } => {
                for expr in [low, test, high] {
                    collect_attributes(expr, &mut out);
                }
            }
            PredicateNode::Like { value, .. } | PredicateNode::IsNull { value } => {
                collect_attributes(value, &mut out);
            }
            PredicateNode::Custom { args, .. } => {
                for arg in args {
                    collect_attributes(arg, &mut out);
                }
            }
            PredicateNode::FeatureIds(_) | PredicateNode::MatchAll | PredicateNode::MatchNone => {}
        }
    }
    out
}

/// Uncommitted client edits together with the values they write.
#[derive(Clone, Debug, Default)]
pub struct ClientEdits {
    pub pending: PendingEdits,
    deleted: BTreeSet<FeatureId>,
    changes: BTreeMap<FeatureId, Vec<(Arc<str>, ScalarValue)>>,
}

impl ClientEdits {
    pub fn delete(&mut self, ids: &[FeatureId]) {
        if ids.is_empty() {
            return;
        }
        self.deleted.extend(ids.iter().cloned());
        self.pending.delete(Predicate::feature_ids(ids.iter().cloned()));
    }

    pub fn update(&mut self, ids: &[FeatureId], attribute: &str, value: ScalarValue) {
        if ids.is_empty() {
            return;
        }
        for id in ids {
            self.changes
                .entry(id.clone())
                .or_default()
                .push((attribute.into(), value.clone()));
        }
        self.pending
            .update([attribute], Predicate::feature_ids(ids.iter().cloned()));
    }

    /// Identifiers deleted in this transaction.
    pub fn deleted(&self) -> &BTreeSet<FeatureId> {
        &self.deleted
    }

    /// Drops deleted rows and writes pending values, as a client-side reader does.
    pub fn apply(&self, table: &Table) -> Table {
        Table::new(
            table
                .rows
                .iter()
                .filter(|row| !self.deleted.contains(&row.id))
                .map(|row| {
                    let mut row = row.clone();
                    for (attribute, value) in self.changes.get(&row.id).into_iter().flatten() {
                        row.values.insert(attribute.clone(), value.clone());
                    }
                    row
                })
                .collect(),
        )
    }
}

/// Seeded generator of rows, edits, capabilities and predicate trees.
pub struct Generator {
    rng: fastrand::Rng,
}

impl Generator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    fn maybe_null(&mut self, value: ScalarValue) -> ScalarValue {
        if self.rng.u8(..10) == 0 {
            ScalarValue::Null
        } else {
            value
        }
    }

    fn envelope(&mut self) -> Envelope {
        let x = self.rng.i32(0..8) as f64;
        let y = self.rng.i32(0..8) as f64;
        Envelope::new(
            x,
            y,
            x + self.rng.i32(0..4) as f64,
            y + self.rng.i32(0..4) as f64,
        )
    }

    fn value_for(&mut self, attribute: &str) -> ScalarValue {
        let value = match attribute {
            "name" => ScalarValue::from(NAMES[self.rng.usize(..NAMES.len())]),
            "lanes" => ScalarValue::Int64(self.rng.i64(0..6)),
            "speed" => ScalarValue::Float64(self.rng.i32(-3..12) as f64 * 10.0),
            "geom" => ScalarValue::Geometry(self.envelope()),
            _ => ScalarValue::Int64(self.rng.i64(-2..3)),
        };
        self.maybe_null(value)
    }

    fn attribute(&mut self) -> &'static str {
        match self.rng.u8(..9) {
            0 => GHOST_ATTRIBUTE,
            1 | 2 => "name",
            3 | 4 => "lanes",
            5 | 6 => "speed",
            _ => "geom",
        }
    }

    pub fn table(&mut self) -> Table {
        let rows = (0..TABLE_LEN)
            .map(|idx| {
                let values = SCHEMA_ATTRIBUTES
                    .iter()
                    .copied()
                    .chain([GHOST_ATTRIBUTE])
                    .map(|attribute| (Arc::<str>::from(attribute), self.value_for(attribute)))
                    .collect();
                Row {
                    id: FeatureId::new(format!("roads.{idx}")),
                    values,
                }
            })
            .collect();
        Table::new(rows)
    }

    fn some_ids(&mut self, len: usize, max: usize) -> Vec<FeatureId> {
        (0..self.rng.usize(0..=max))
            .map(|_| FeatureId::new(format!("roads.{}", self.rng.usize(..len))))
            .collect()
    }

    pub fn edits(&mut self) -> ClientEdits {
        let mut edits = ClientEdits::default();
        let deleted = self.some_ids(TABLE_LEN, 3);
        edits.delete(&deleted);
        for _ in 0..self.rng.usize(0..3) {
            let ids = self.some_ids(TABLE_LEN, 4);
            let attribute = self.attribute();
            let value = self.value_for(attribute);
            edits.update(&ids, attribute, value);
        }
        edits
    }

    pub fn capabilities(&mut self) -> Capabilities {
        let mut caps = Capabilities::none();
        for kind in [
            PredicateKind::Between,
            PredicateKind::SimpleComparison,
            PredicateKind::Like,
            PredicateKind::NullCheck,
        ] {
            if self.rng.bool() {
                caps = caps.with_predicate(kind);
            }
        }
        if self.rng.u8(..4) != 0 {
            caps = caps.with_predicate(PredicateKind::Logical);
        }
        let ops: Vec<SpatialOp> = SpatialOp::ALL
            .into_iter()
            .filter(|_| self.rng.bool())
            .collect();
        caps = caps.with_spatial_ops(ops);
        if self.rng.bool() {
            caps = caps.with_expression(ExpressionKind::SimpleArithmetic);
        }
        if self.rng.bool() {
            caps = caps.with_expression(ExpressionKind::Function);
            if self.rng.bool() {
                caps = caps.with_function("strlen");
            }
        }
        caps
    }

    fn literal(&mut self, attribute: &str) -> Expression {
        Expression::literal(self.value_for(attribute))
    }

    fn expression(&mut self, attribute: &str, depth: usize) -> Expression {
        let numeric = matches!(attribute, "lanes" | "speed" | GHOST_ATTRIBUTE);
        match self.rng.u8(..10) {
            0 if numeric && depth > 0 => {
                let op = [MathOp::Add, MathOp::Subtract, MathOp::Multiply, MathOp::Divide]
                    [self.rng.usize(..4)];
                Expression::math(
                    self.expression(attribute, depth - 1),
                    op,
                    self.literal(attribute),
                )
            }
            1 if numeric => Expression::function("abs", [Expression::attribute(attribute)]),
            1 if attribute == "name" => {
                Expression::function("strlen", [Expression::attribute(attribute)])
            }
            2 => self.literal(attribute),
            _ => Expression::attribute(attribute),
        }
    }

    fn leaf(&mut self) -> Predicate {
        let attribute = self.attribute();
        match self.rng.u8(..12) {
            0 => Predicate::match_all(),
            1 => Predicate::match_none(),
            2 | 3 => {
                let op = [
                    ComparisonOp::Equal,
                    ComparisonOp::NotEqual,
                    ComparisonOp::LessThan,
                    ComparisonOp::LessThanOrEqual,
                    ComparisonOp::GreaterThan,
                    ComparisonOp::GreaterThanOrEqual,
                ][self.rng.usize(..6)];
                let left = self.expression(attribute, 2);
                let right = self.literal(attribute);
                Predicate::compare(left, op, right)
            }
            4 => {
                let test = self.expression(attribute, 1);
                Predicate::between(self.literal(attribute), test, self.literal(attribute))
            }
            5 => {
                let pattern = ["M%", "%a%", "O_k", "main", "Elm\\%", "%"][self.rng.usize(..6)];
                let pattern = LikePattern::new(pattern).match_case(self.rng.bool());
                Predicate::like(Expression::attribute("name"), pattern)
            }
            6 => Predicate::is_null(self.expression(attribute, 1)),
            7 | 8 => {
                let op = SpatialOp::ALL[self.rng.usize(..SpatialOp::ALL.len())];
                let geometry = if self.rng.u8(..8) == 0 {
                    Expression::literal(ScalarValue::Null)
                } else {
                    Expression::literal(self.envelope())
                };
                let field = Expression::attribute(if self.rng.u8(..6) == 0 {
                    GHOST_ATTRIBUTE
                } else {
                    "geom"
                });
                if op.takes_distance() {
                    Predicate::spatial_distance(op, field, geometry, self.rng.i32(0..4) as f64)
                } else {
                    Predicate::spatial(op, field, geometry)
                }
            }
            9 => Predicate::feature_ids(self.some_ids(TABLE_LEN, 3)),
            10 => Predicate::custom("isNil", [Expression::attribute(attribute)]),
            _ => Predicate::gt(Expression::attribute("lanes"), self.literal("lanes")),
        }
    }

    pub fn predicate(&mut self, depth: usize) -> Predicate {
        if depth == 0 || self.rng.u8(..3) == 0 {
            return self.leaf();
        }
        match self.rng.u8(..3) {
            0 => Predicate::not(self.predicate(depth - 1)),
            kind => {
                let clauses: Vec<Predicate> = (0..self.rng.usize(1..=3))
                    .map(|_| self.predicate(depth - 1))
                    .collect();
                // Built without flattening so nested connectives survive.
                if kind == 1 {
                    Predicate::from_node(PredicateNode::And(clauses))
                } else {
                    Predicate::from_node(PredicateNode::Or(clauses))
                }
            }
        }
    }
}
