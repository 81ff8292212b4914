use std::{fmt, sync::Arc};

/// Unexpected shapes met during a split.
///
/// None of these changes soundness: the affected node is evaluated locally.
/// They are returned so callers can surface why less was pushed down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitDiagnostic {
    /// Attribute path the schema does not know.
    UnknownAttribute {
        /// Attribute path as written in the predicate.
        path: Arc<str>,
    },
    /// Function call without a resolved name.
    UnnamedFunction,
    /// Predicate kind without pushdown rules.
    UnrecognizedPredicate {
        /// Predicate name.
        name: Arc<str>,
    },
    /// A disjunction that could not be rewritten into a negated conjunction.
    OrRewriteFailed,
    /// Pending updates touch the predicate; the post-filter is the full input.
    PendingUpdates {
        /// Updated attribute paths referenced by the predicate.
        attributes: Vec<Arc<str>>,
    },
    /// The overlay deletes every feature, so nothing is requested remotely.
    EverythingDeleted,
}

impl fmt::Display for SplitDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitDiagnostic::UnknownAttribute { path } => {
                write!(f, "attribute '{path}' is unknown to the source")
            }
            SplitDiagnostic::UnnamedFunction => f.write_str("function call has no name"),
            SplitDiagnostic::UnrecognizedPredicate { name } => {
                write!(f, "predicate '{name}' has no pushdown rule")
            }
            SplitDiagnostic::OrRewriteFailed => {
                f.write_str("disjunction could not be rewritten as a negated conjunction")
            }
            SplitDiagnostic::PendingUpdates { attributes } => {
                f.write_str("pending updates on ")?;
                for (idx, attribute) in attributes.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(attribute)?;
                }
                f.write_str("; post-filter is the full predicate")
            }
            SplitDiagnostic::EverythingDeleted => {
                f.write_str("every feature is pending deletion")
            }
        }
    }
}
