//! Client-held edits the remote source has not seen yet.
//!
//! The splitter only reads an overlay through [`TransactionOverlay`]; the
//! in-memory [`PendingEdits`] log is what a client transaction records its
//! uncommitted deletes and updates into.

use std::{collections::BTreeMap, sync::Arc};

use tonbo_predicate::Predicate;

/// Read-only view over pending edits, valid for the duration of one split.
pub trait TransactionOverlay {
    /// Disjunction of every pending deletion, or `None` when nothing is deleted.
    fn delete_filter(&self) -> Option<Predicate>;

    /// Disjunction of every pending update that touches `path`, if any.
    fn update_filter(&self, path: &str) -> Option<Predicate>;
}

impl<T> TransactionOverlay for &T
where
    T: TransactionOverlay + ?Sized,
{
    fn delete_filter(&self) -> Option<Predicate> {
        (**self).delete_filter()
    }

    fn update_filter(&self, path: &str) -> Option<Predicate> {
        (**self).update_filter(path)
    }
}

/// In-memory log of uncommitted deletes and updates.
///
/// Each edit is recorded as the predicate selecting the affected features
/// (usually a feature identifier set). Filters are combined on read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingEdits {
    deletes: Vec<Predicate>,
    updates: BTreeMap<Arc<str>, Vec<Predicate>>,
}

impl PendingEdits {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the deletion of every feature matched by `selection`.
    pub fn delete(&mut self, selection: Predicate) {
        if !self.deletes.contains(&selection) {
            self.deletes.push(selection);
        }
    }

    /// Records an update of `attributes` on every feature matched by `selection`.
    pub fn update<I, S>(&mut self, attributes: I, selection: Predicate)
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        for attribute in attributes {
            let filters = self.updates.entry(attribute.into()).or_default();
            if !filters.contains(&selection) {
                filters.push(selection.clone());
            }
        }
    }

    /// Returns true when no edit has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty()
    }

    /// Attribute paths with at least one pending update.
    pub fn updated_attributes(&self) -> impl Iterator<Item = &str> + '_ {
        self.updates.keys().map(AsRef::as_ref)
    }

    /// Drops every recorded edit, as after a commit or rollback.
    pub fn clear(&mut self) {
        self.deletes.clear();
        self.updates.clear();
    }
}

impl TransactionOverlay for PendingEdits {
    fn delete_filter(&self) -> Option<Predicate> {
        Predicate::disjunction(self.deletes.clone())
    }

    fn update_filter(&self, path: &str) -> Option<Predicate> {
        self.updates
            .get(path)
            .and_then(|filters| Predicate::disjunction(filters.clone()))
    }
}
