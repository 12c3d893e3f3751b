//! Release Gateway: remote resources behind the release editor
//!
//! This crate defines the contracts the editor core consumes to talk to the
//! server that owns releases, file listings, media and profile pictures.
//! The core never constructs a concrete client itself; collaborators are
//! injected as trait objects so the editor can run against fakes in tests.
//!
//! ## Key Components
//!
//! - `ReleaseResource`: retrieve a release payload by identifier + version
//! - `FileListingResource`: list / delete / clear original files per category
//! - `MediaResource`: list derived media for a codebase
//! - `ProfileImageUpload`: store a profile picture for a user
//! - `HttpGateway`: `reqwest` implementation of all four contracts
//! - `fakes`: in-memory implementations with scripted latency and failures

mod error;
pub mod fakes;
pub mod http;
pub mod resources;

pub use error::GatewayError;
pub use http::{GatewayConfig, HttpGateway};
pub use resources::{
    FileCategory, FileDescriptor, FileListingResource, GatewayResult, MediaDescriptor,
    MediaResource, ProfileImageUpload, ReleaseResource,
};
