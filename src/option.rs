/// Default bound on predicate tree depth accepted by the splitter.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Tunables for a single split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    pub(crate) max_depth: usize,
    pub(crate) strict_attributes: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_attributes: false,
        }
    }
}

impl SplitOptions {
    /// Maximum nesting of predicate nodes before the split is refused.
    #[must_use]
    pub fn max_depth(self, max_depth: usize) -> Self {
        SplitOptions { max_depth, ..self }
    }

    /// Reject attribute paths unknown to the schema instead of evaluating them locally.
    #[must_use]
    pub fn strict_attributes(self, strict_attributes: bool) -> Self {
        SplitOptions {
            strict_attributes,
            ..self
        }
    }
}
