//! Structured events for editor lifecycle.
//!
//! Every event carries an `event` field naming it, plus the identity or
//! path it concerns. Configure output with `RUST_LOG`; pass `--json` to the
//! CLI for machine-readable lines.

use release_gateway::FileCategory;
use tracing::{debug, info, warn};

use crate::domain::ReleaseIdentity;
use crate::path::Path;

/// Span tagged with the release being edited. Attach it to futures with
/// `tracing::Instrument` so it survives across awaits.
pub fn release_span(identity: &ReleaseIdentity) -> tracing::Span {
    tracing::info_span!(
        "release_editor.release",
        identifier = %identity.identifier,
        version_number = %identity.version_number,
    )
}

/// Emit event: release retrieved and loaded into the store.
pub fn emit_release_initialized(identity: &ReleaseIdentity, live: bool, duration_ms: u64) {
    info!(
        event = "release.initialized",
        identifier = %identity.identifier,
        version_number = %identity.version_number,
        live = live,
        duration_ms = duration_ms,
    );
}

/// Emit event: one original category listing replaced.
pub fn emit_category_fetched(identity: &ReleaseIdentity, category: FileCategory, files: usize) {
    info!(
        event = "files.category_fetched",
        identifier = %identity.identifier,
        version_number = %identity.version_number,
        category = %category,
        files = files,
    );
}

/// Emit event: media listing replaced.
pub fn emit_media_fetched(identifier: &str, files: usize) {
    info!(event = "files.media_fetched", identifier = %identifier, files = files);
}

/// Emit event: a file or a whole category was removed remotely.
pub fn emit_files_removed(identity: &ReleaseIdentity, category: FileCategory, target: &str) {
    info!(
        event = "files.removed",
        identifier = %identity.identifier,
        version_number = %identity.version_number,
        category = %category,
        target = %target,
    );
}

/// Emit event: a debounced field validation settled.
pub fn emit_field_validated(path: &Path, errors: usize) {
    debug!(event = "validation.settled", path = %path, errors = errors);
}

/// Emit event: whole-record validation finished.
pub fn emit_record_validated(errors: usize) {
    info!(event = "validation.record", errors = errors, valid = errors == 0);
}

/// Emit event: a remote call failed (warning level).
pub fn emit_remote_failure(operation: &str, error: &dyn std::fmt::Display) {
    warn!(event = "remote.failure", operation = %operation, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_span_enters() {
        let _entered = release_span(&ReleaseIdentity::new("cb-1", "1.0.0")).entered();
    }

    #[test]
    fn emitters_accept_their_fields() {
        let identity = ReleaseIdentity::new("cb-1", "1.0.0");
        emit_release_initialized(&identity, false, 12);
        emit_category_fetched(&identity, FileCategory::Docs, 3);
        emit_media_fetched("cb-1", 0);
        emit_files_removed(&identity, FileCategory::Code, "*");
        emit_field_validated(&"codebase.title".parse().unwrap(), 1);
        emit_record_validated(0);
        emit_remote_failure("retrieve", &"boom");
    }
}
