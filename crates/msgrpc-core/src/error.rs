//! Error types for msgrpc

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Endpoint not set; call set_endpoint before issuing requests")]
    EndpointNotSet,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Unexpected content type: expected '{expected}', got '{actual}'")]
    ContentType { expected: String, actual: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Another request is already in flight on this client")]
    Busy,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// True when the transport delivered a response but its payload could not be used
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Error::Json(_) | Error::MalformedResponse(_) | Error::Rpc { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_classification() {
        assert!(Error::MalformedResponse("missing result".to_string()).is_decode_error());
        assert!(Error::Rpc {
            code: -32601,
            message: "Method not found".to_string()
        }
        .is_decode_error());

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(Error::from(json_err).is_decode_error());

        assert!(!Error::Transport("connection refused".to_string()).is_decode_error());
        assert!(!Error::Status(500).is_decode_error());
        assert!(!Error::Timeout(Duration::from_secs(1)).is_decode_error());
        assert!(!Error::ContentType {
            expected: "text/plain".to_string(),
            actual: "text/html".to_string(),
        }
        .is_decode_error());
    }

    #[test]
    fn test_error_display() {
        let err = Error::ContentType {
            expected: "text/plain; charset=utf-8".to_string(),
            actual: "application/json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected content type: expected 'text/plain; charset=utf-8', got 'application/json'"
        );
        assert_eq!(Error::Status(404).to_string(), "HTTP status 404");
    }
}
