//! Error types for release-gateway

use thiserror::Error;

/// Errors raised by a remote resource call.
///
/// Every variant represents a rejected call; callers decide whether to
/// surface it. The gateway itself never retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: String,
        url: String,
        status: u16,
    },

    /// The response body did not match the expected shape
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The addressed resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Scripted failure raised by an in-memory fake
    #[error("rejected: {0}")]
    Rejected(String),

    /// Gateway configuration is unusable
    #[error("invalid gateway configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_request() {
        let err = GatewayError::Status {
            method: "DELETE".to_string(),
            url: "http://localhost/files/x".to_string(),
            status: 403,
        };
        let msg = err.to_string();
        assert!(msg.contains("DELETE"));
        assert!(msg.contains("403"));
    }

    #[test]
    fn json_error_is_decode() {
        let err: GatewayError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, GatewayError::Decode(_)));
    }
}
