//! Release Editor Core Library
//!
//! Path-addressable release state with debounced, schema-driven field
//! validation and category-partitioned file synchronisation.

pub mod config;
pub mod domain;
pub mod editor;
pub mod error_tree;
pub mod metrics;
pub mod obs;
pub mod path;
pub mod profile;
pub mod scheduler;
pub mod schema;
pub mod store;
pub mod telemetry;

pub use config::EditorConfig;

pub use domain::{
    Codebase, Contributor, ContributorKey, ContributorKind, EditorError, FileSet, LinkedUser,
    Release, ReleaseDetail, ReleaseIdentity, Result, ReviewStatus, ReviewUrls, Submitter, Tag,
};

pub use editor::ReleaseEditor;
pub use error_tree::ErrorTree;
pub use path::{Path, PathError, Segment};
pub use profile::{ProfileEditor, ProfileStore};
pub use scheduler::{ErrorSink, ValidationScheduler, ValidationState};
pub use schema::{profile_schema, release_schema, validate_field, validate_whole, Rule, Schema};
pub use store::ReleaseStore;

pub use metrics::METRICS;
pub use telemetry::init_tracing;

/// Release editor version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
