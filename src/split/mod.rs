//! Splits a predicate into the part a remote source evaluates and the part
//! re-evaluated locally on the rows it returns.
//!
//! The split is sound: evaluating [`SplitResult::pre`] remotely and then
//! [`SplitResult::post`] locally selects exactly the rows the input predicate
//! selects on the authoritative data, pending client edits included. Nothing
//! is optimised beyond that; when in doubt a node is evaluated locally.

mod diagnostics;
mod error;
mod expression;
mod visitor;

use std::sync::Arc;

pub use diagnostics::SplitDiagnostic;
pub use error::SplitError;
use tonbo_predicate::Predicate;

use self::visitor::{Outcome, Splitter};
use crate::{
    capabilities::Capabilities,
    logging::{pushdown_log, LogContext},
    option::SplitOptions,
    overlay::TransactionOverlay,
    schema::AttributeSchema,
};

const SPLIT_LOG_CTX: LogContext = LogContext::new("component=splitter");

/// Pre-filter for the remote source and post-filter for local evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitResult {
    /// Predicate sent to the remote source.
    pub pre: Predicate,
    /// Predicate evaluated locally on the rows the remote source returns.
    pub post: Predicate,
    /// Unexpected shapes met during the split.
    pub diagnostics: Vec<SplitDiagnostic>,
}

impl SplitResult {
    /// Returns `(pre, post)`, dropping diagnostics.
    pub fn into_parts(self) -> (Predicate, Predicate) {
        (self.pre, self.post)
    }

    /// Returns true when nothing is left for local evaluation.
    pub fn fully_pushed(&self) -> bool {
        self.post.is_match_all()
    }
}

/// Single-use splitter; build one per predicate.
pub struct FilterSplitter<'a> {
    capabilities: &'a Capabilities,
    schema: &'a dyn AttributeSchema,
    overlay: Option<&'a dyn TransactionOverlay>,
    options: SplitOptions,
}

impl<'a> FilterSplitter<'a> {
    /// Splitter for a source with `capabilities` serving a type described by `schema`.
    pub fn new(capabilities: &'a Capabilities, schema: &'a dyn AttributeSchema) -> Self {
        Self {
            capabilities,
            schema,
            overlay: None,
            options: SplitOptions::default(),
        }
    }

    /// Accounts for the pending edits of a client transaction.
    pub fn with_overlay(self, overlay: &'a dyn TransactionOverlay) -> Self {
        Self {
            overlay: Some(overlay),
            ..self
        }
    }

    /// Overrides the default options.
    pub fn with_options(self, options: SplitOptions) -> Self {
        Self { options, ..self }
    }

    /// Splits `predicate`, consuming the splitter.
    pub fn split(self, predicate: &Predicate) -> Result<SplitResult, SplitError> {
        let mut splitter = Splitter::new(
            self.capabilities,
            self.schema,
            self.overlay,
            &self.options,
        );
        let outcome = predicate.accept(&mut splitter)?;
        Ok(splitter.finish(predicate, outcome))
    }
}

/// Splits `predicate` for a source with `capabilities`, using default options.
pub fn split(
    predicate: &Predicate,
    capabilities: &Capabilities,
    schema: &dyn AttributeSchema,
    overlay: Option<&dyn TransactionOverlay>,
) -> Result<SplitResult, SplitError> {
    let splitter = FilterSplitter::new(capabilities, schema);
    match overlay {
        Some(overlay) => splitter.with_overlay(overlay).split(predicate),
        None => splitter.split(predicate),
    }
}

impl Splitter<'_> {
    /// Turns the root outcome into the pre/post pair.
    fn finish(mut self, original: &Predicate, outcome: Outcome) -> SplitResult {
        let post = if self.touched.is_empty() {
            outcome.residual.unwrap_or_else(Predicate::match_all)
        } else {
            // Local residuals were computed against remote values; with
            // pending updates only the full predicate is safe.
            self.diagnose(SplitDiagnostic::PendingUpdates {
                attributes: self.touched_attributes.clone(),
            });
            original.clone()
        };

        // (pushable OR updated) AND NOT deleted
        let mut pre = outcome.value.unwrap_or_else(Predicate::match_all);
        if let Some(updates) = Predicate::disjunction(std::mem::take(&mut self.touched)) {
            pre = include_updated(pre, updates);
        }
        if let Some(overlay) = self.overlay {
            pre = self.exclude_deleted(pre, overlay.delete_filter());
        }

        pushdown_log!(
            log::Level::Debug,
            ctx: SPLIT_LOG_CTX,
            "predicate_split",
            "pre=\"{}\" post=\"{}\" touched={} diagnostics={}",
            pre,
            post,
            display_paths(&self.touched_attributes),
            self.diagnostics.len(),
        );
        for diagnostic in &self.diagnostics {
            pushdown_log!(
                log::Level::Trace,
                ctx: SPLIT_LOG_CTX,
                "split_diagnostic",
                "detail=\"{}\"",
                diagnostic,
            );
        }

        SplitResult {
            pre,
            post,
            diagnostics: self.diagnostics,
        }
    }

    fn exclude_deleted(&mut self, pre: Predicate, deleted: Option<Predicate>) -> Predicate {
        let Some(deleted) = deleted else {
            return pre;
        };
        if deleted.is_match_none() || pre.is_match_none() {
            return pre;
        }
        if deleted.is_match_all() {
            self.diagnose(SplitDiagnostic::EverythingDeleted);
            return Predicate::match_none();
        }
        if pre.is_match_all() {
            return deleted.negate();
        }
        Predicate::and([pre, deleted.negate()])
    }
}

fn include_updated(pre: Predicate, updates: Predicate) -> Predicate {
    if pre.is_match_all() || updates.is_match_all() {
        Predicate::match_all()
    } else if pre.is_match_none() {
        updates
    } else if updates.is_match_none() {
        pre
    } else {
        Predicate::or([pre, updates])
    }
}

fn display_paths(paths: &[Arc<str>]) -> String {
    paths
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(",")
}
