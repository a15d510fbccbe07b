//! Error type for client backends
//!
//! Every fault a backend can raise while connecting, executing a query, or
//! streaming rows is a `ClientError`. The dispatcher renders these as text.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection details are unusable (missing address, bad URL)
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// Transport failure talking to the server
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body could not be decoded into rows
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Handle was used after release
    #[error("Client is closed")]
    Closed,

    /// Backend-specific failure with a preformatted message
    #[error("{0}")]
    Backend(String),
}

impl ClientError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ClientError::status(401, "unauthorized access");
        assert_eq!(err.to_string(), "Server returned 401: unauthorized access");
    }

    #[test]
    fn test_backend_error_display_is_message() {
        let err = ClientError::backend("database not found");
        assert_eq!(err.to_string(), "database not found");
    }

    #[test]
    fn test_decode_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ClientError::from(json_err);
        assert!(err.to_string().starts_with("Failed to decode response:"));
    }

    #[test]
    fn test_closed_error_display() {
        assert_eq!(ClientError::Closed.to_string(), "Client is closed");
    }
}
