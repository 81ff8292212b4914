#![deny(missing_docs)]
//! Core predicate structures shared across Tonbo pushdown planning.

mod builder;
mod expression;
mod node;
mod value;
mod visitor;

pub use builder::PredicateBuilder;
pub use expression::{AttributeRef, Expression, MathOp};
pub use node::{ComparisonOp, FeatureId, LikePattern, Predicate, PredicateNode, SpatialOp};
pub use value::{Envelope, ScalarValue};
pub use visitor::{PredicateVisitor, VisitOutcome};
