//! Validation messages keyed by document path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::path::Path;

/// Path-keyed validation messages mirroring the edited document.
///
/// An empty list at a path means "validated, no error"; a path with no entry
/// has not been validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTree(BTreeMap<Path, Vec<String>>);

impl ErrorTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded at exactly `path`.
    pub fn get(&self, path: &Path) -> Option<&[String]> {
        self.0.get(path).map(Vec::as_slice)
    }

    /// Replace the messages at `path`.
    pub fn set(&mut self, path: Path, messages: Vec<String>) {
        self.0.insert(path, messages);
    }

    /// Mark `path` as validated without error.
    pub fn clear(&mut self, path: Path) {
        self.0.insert(path, Vec::new());
    }

    /// Append one message at `path`.
    pub fn push(&mut self, path: Path, message: impl Into<String>) {
        self.0.entry(path).or_default().push(message.into());
    }

    /// Overwrite every path present in `other`, keeping the rest.
    pub fn merge(&mut self, other: ErrorTree) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[String])> {
        self.0
            .iter()
            .map(|(path, messages)| (path, messages.as_slice()))
    }

    /// Whether no recorded path carries a message.
    pub fn is_valid(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Number of paths carrying at least one message.
    pub fn error_count(&self) -> usize {
        self.0.values().filter(|m| !m.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
