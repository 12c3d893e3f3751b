//! File listings grouped by category.

use std::collections::BTreeMap;

use release_gateway::{FileCategory, FileDescriptor, MediaDescriptor};
use serde::{Deserialize, Serialize};

/// Original files per category plus derived media.
///
/// Each slice holds whatever the last successful fetch of that slice
/// returned; slices are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSet {
    pub originals: BTreeMap<FileCategory, Vec<FileDescriptor>>,
    pub media: Vec<MediaDescriptor>,
}

impl Default for FileSet {
    fn default() -> Self {
        Self {
            originals: FileCategory::ALL
                .into_iter()
                .map(|category| (category, Vec::new()))
                .collect(),
            media: Vec::new(),
        }
    }
}

impl FileSet {
    /// Listing of one original category.
    pub fn category(&self, category: FileCategory) -> &[FileDescriptor] {
        self.originals
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replace the listing of one original category.
    pub fn set_category(&mut self, category: FileCategory, files: Vec<FileDescriptor>) {
        self.originals.insert(category, files);
    }

    /// Whether every original category is empty.
    pub fn originals_empty(&self) -> bool {
        self.originals.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_every_category_empty() {
        let files = FileSet::default();
        assert_eq!(files.originals.len(), 4);
        assert!(files.originals_empty());
        assert!(files.media.is_empty());
    }

    #[test]
    fn set_category_touches_one_slice() {
        let mut files = FileSet::default();
        files.set_category(
            FileCategory::Docs,
            vec![FileDescriptor::new("README.md", "/docs/README.md")],
        );
        assert_eq!(files.category(FileCategory::Docs).len(), 1);
        assert!(files.category(FileCategory::Code).is_empty());
        assert!(files.category(FileCategory::Data).is_empty());
        assert!(files.category(FileCategory::Results).is_empty());
    }
}
