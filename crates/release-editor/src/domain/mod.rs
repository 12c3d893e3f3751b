//! Domain models for the release editor.
//!
//! Canonical definitions for the edited entities:
//! - `Release`: the versioned record being edited
//! - `Codebase`: the release's parent record
//! - `Contributor`: entries of the release's contributor list
//! - `FileSet`: file listings partitioned by category

pub mod contributor;
pub mod error;
pub mod files;
pub mod lenient;
pub mod release;

pub use contributor::{Contributor, ContributorKey, ContributorKind, LinkedUser};
pub use error::{EditorError, Result};
pub use files::FileSet;
pub use release::{
    Codebase, Release, ReleaseDetail, ReleaseIdentity, ReviewStatus, ReviewUrls, Submitter, Tag,
};
