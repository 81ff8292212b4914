//! Attribute membership checks against the queried feature type.

use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

/// Answers whether an attribute path is known to the remote source.
pub trait AttributeSchema {
    /// Returns true when `path` names an attribute of the feature type.
    fn contains(&self, path: &str) -> bool;
}

impl<S> AttributeSchema for &S
where
    S: AttributeSchema + ?Sized,
{
    fn contains(&self, path: &str) -> bool {
        (**self).contains(path)
    }
}

impl AttributeSchema for HashSet<String> {
    fn contains(&self, path: &str) -> bool {
        HashSet::contains(self, path)
    }
}

impl AttributeSchema for BTreeSet<String> {
    fn contains(&self, path: &str) -> bool {
        BTreeSet::contains(self, path)
    }
}

/// Named feature type with its set of attribute paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureType {
    name: Arc<str>,
    attributes: BTreeSet<Arc<str>>,
}

impl FeatureType {
    /// Start a feature type without attributes.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeSet::new(),
        }
    }

    /// Declare one attribute path.
    pub fn attribute(mut self, path: impl Into<Arc<str>>) -> Self {
        self.attributes.insert(path.into());
        self
    }

    /// Declare several attribute paths.
    pub fn attributes<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.attributes.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Type name as advertised by the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterate the declared attribute paths in order.
    pub fn attribute_paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.attributes.iter().map(AsRef::as_ref)
    }
}

impl AttributeSchema for FeatureType {
    fn contains(&self, path: &str) -> bool {
        self.attributes.contains(path)
    }
}
