//! Remote resource contracts for the release editor
//!
//! These traits define the four collaborators the editor core depends on:
//! - `ReleaseResource`: release records (retrieve)
//! - `FileListingResource`: original files partitioned by category
//! - `MediaResource`: derived media attached to a codebase
//! - `ProfileImageUpload`: profile picture storage
//!
//! All traits are async and transport-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module; `HttpGateway` talks to a live server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Result type for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Partition of uploaded original files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Code,
    Data,
    Docs,
    Results,
}

impl FileCategory {
    /// Every original category, in the order they are fetched.
    pub const ALL: [FileCategory; 4] = [
        FileCategory::Code,
        FileCategory::Data,
        FileCategory::Docs,
        FileCategory::Results,
    ];

    /// Wire name used in URLs and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Code => "code",
            FileCategory::Data => "data",
            FileCategory::Docs => "docs",
            FileCategory::Results => "results",
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileCategory {
    type Err = GatewayError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "code" => Ok(FileCategory::Code),
            "data" => Ok(FileCategory::Data),
            "docs" => Ok(FileCategory::Docs),
            "results" => Ok(FileCategory::Results),
            other => Err(GatewayError::Config(format!("unknown file category '{}'", other))),
        }
    }
}

/// One entry of an original-file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// File name without directories
    pub name: String,
    /// Server-side path, used to address the file for deletion
    pub path: String,
    /// Size in bytes, when the server reports it
    pub size: Option<u64>,
    /// Download URL
    pub url: Option<String>,
}

impl FileDescriptor {
    /// Descriptor with only a name and path.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size: None,
            url: None,
        }
    }
}

/// One entry of a codebase's media listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub name: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub featured: Option<bool>,
}

impl MediaDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            thumbnail_url: None,
            featured: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Release records.
///
/// `retrieve` returns the raw JSON payload; it may be partial; the store
/// decides which keys to apply.
#[async_trait]
pub trait ReleaseResource: Send + Sync {
    async fn retrieve(
        &self,
        identifier: &str,
        version_number: &str,
    ) -> GatewayResult<serde_json::Value>;
}

/// Original files of a release, partitioned by [`FileCategory`].
///
/// Guarantees:
/// - `list` reflects the server state at the time of the call.
/// - `delete` and `clear_category` acknowledge only; callers re-list to observe
///   the outcome.
#[async_trait]
pub trait FileListingResource: Send + Sync {
    /// List one category of a release.
    async fn list(
        &self,
        identifier: &str,
        version_number: &str,
        category: FileCategory,
    ) -> GatewayResult<Vec<FileDescriptor>>;

    /// Delete one file by its server-side path.
    async fn delete(&self, path: &str) -> GatewayResult<()>;

    /// Remove every file of one category.
    async fn clear_category(
        &self,
        identifier: &str,
        version_number: &str,
        category: FileCategory,
    ) -> GatewayResult<()>;
}

/// Derived media of a codebase.
#[async_trait]
pub trait MediaResource: Send + Sync {
    async fn list(&self, identifier: &str) -> GatewayResult<Vec<MediaDescriptor>>;
}

/// Profile picture storage.
#[async_trait]
pub trait ProfileImageUpload: Send + Sync {
    /// Upload image bytes for a user and return the stored image reference.
    async fn upload(&self, user_key: &str, image: Vec<u8>) -> GatewayResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_names_round_trip() {
        for category in FileCategory::ALL {
            let parsed: FileCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
            assert_eq!(
                serde_json::to_value(category).unwrap(),
                serde_json::json!(category.as_str())
            );
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!("media".parse::<FileCategory>().is_err());
    }

    #[test]
    fn file_descriptor_tolerates_missing_optionals() {
        let file: FileDescriptor =
            serde_json::from_str(r#"{"name": "main.py", "path": "/src/main.py"}"#).unwrap();
        assert_eq!(file, FileDescriptor::new("main.py", "/src/main.py"));
    }
}
