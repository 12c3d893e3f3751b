//! Domain-level error taxonomy for the release editor.
//!
//! Field validation failures are not errors: they are recorded in the
//! validation error tree. Everything here is returned to the caller of an
//! action.

use release_gateway::GatewayError;

use crate::path::PathError;

/// Release editor errors.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("remote call failed: {0}")]
    Remote(#[from] GatewayError),

    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("release payload must be a JSON object")]
    PayloadNotObject,

    #[error("no release loaded: {0} is empty")]
    NotLoaded(&'static str),

    #[error("validation scheduling requires a running Tokio runtime")]
    NoRuntime,
}

/// Result type for release editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_wraps_gateway_error() {
        let err: EditorError = GatewayError::Rejected("down".to_string()).into();
        assert!(err.to_string().contains("remote call failed"));
        assert!(err.to_string().contains("down"));
    }

    #[test]
    fn not_loaded_error() {
        let err = EditorError::NotLoaded("codebase identifier");
        assert_eq!(err.to_string(), "no release loaded: codebase identifier is empty");
    }
}
