#![deny(missing_docs)]
//! Tonbo predicate model crate.
//!
//! Predicates are immutable trees over feature attributes and geometry.
//! Nothing here evaluates rows: the crate only describes queries and offers a
//! bottom-up visitor so planners can classify each node.

mod core;

pub use core::{
    AttributeRef, ComparisonOp, Envelope, Expression, FeatureId, LikePattern, MathOp, Predicate,
    PredicateBuilder, PredicateNode, PredicateVisitor, ScalarValue, SpatialOp, VisitOutcome,
};
