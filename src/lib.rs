#![deny(missing_docs)]
//! Predicate pushdown planning for remote feature sources.
//!
//! A remote source (a database, a web feature service) evaluates only part of
//! the predicate language. Given the source's [`Capabilities`], the schema of
//! the queried feature type and optionally the pending edits of a client
//! transaction, [`split`] divides a [`Predicate`] into:
//!
//! - a pre-filter the source evaluates, and
//! - a post-filter evaluated locally on the rows it returns.
//!
//! Evaluating both in sequence selects exactly the rows the input selects.
//! Whatever cannot be proven safe to push stays local.
//!
//! ```
//! use tonbo_pushdown::{split, Capabilities, Expression, FeatureType, Predicate};
//!
//! let roads = FeatureType::new("roads").attributes(["name", "lanes"]);
//! let wide = Predicate::gt(Expression::attribute("lanes"), Expression::literal(2));
//! let main = Predicate::like(Expression::attribute("name"), "Main%");
//! let filter = Predicate::and([wide.clone(), main.clone()]);
//!
//! let result = split(&filter, &Capabilities::simple_comparisons(), &roads, None).unwrap();
//! assert_eq!(result.pre, wide);
//! assert_eq!(result.post, main);
//! ```

mod logging;

/// Capability descriptor of a remote source.
pub mod capabilities;
/// Options controlling a split.
pub mod option;
/// Pending client edits.
pub mod overlay;
/// Attribute membership checks.
pub mod schema;
/// The pre/post splitter.
pub mod split;

pub use tonbo_predicate::{
    AttributeRef, ComparisonOp, Envelope, Expression, FeatureId, LikePattern, MathOp, Predicate,
    PredicateBuilder, PredicateNode, ScalarValue, SpatialOp,
};

pub use crate::{
    capabilities::{Capabilities, ExpressionKind, PredicateKind},
    option::SplitOptions,
    overlay::{PendingEdits, TransactionOverlay},
    schema::{AttributeSchema, FeatureType},
    split::{split, FilterSplitter, SplitDiagnostic, SplitError, SplitResult},
};
