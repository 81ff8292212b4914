use thiserror::Error;

/// Contract violations that stop a split.
///
/// Data-dependent problems never surface here: any node the source cannot
/// evaluate is kept for local evaluation instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// An `AND`/`OR` node without children.
    #[error("{kind} requires at least one clause")]
    EmptyLogical {
        /// Connective name.
        kind: &'static str,
    },
    /// The tree nests deeper than `SplitOptions::max_depth`.
    #[error("predicate nesting exceeds the configured limit of {limit}")]
    DepthLimitExceeded {
        /// Configured limit.
        limit: usize,
    },
    /// An attribute outside the schema while strict attribute checking is on.
    #[error("unknown attribute: {path}")]
    UnknownAttribute {
        /// Attribute path as written in the predicate.
        path: String,
    },
}
