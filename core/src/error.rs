//! Error types for the UniSender API client.
//!
//! # Design
//! Every failure of a call surfaces through a single `Error` so callers can
//! match on where the call stopped: in the transport, at the HTTP status, in
//! the API's own error envelope, while decoding the result, or before
//! anything was sent because the request could not be encoded.

use thiserror::Error;

/// Boxed error produced by a `Transport` implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by `execute` and by client construction.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed before an HTTP response was produced
    /// (connection refused, timeout, TLS failure). The source is kept as-is.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The server answered with a status outside 2xx.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The envelope carried an error discriminator. Code and message are
    /// copied verbatim from the response.
    #[error("API error [{code}]: {message}")]
    Api { code: String, message: String },

    /// The envelope was not valid JSON or `result` did not match the
    /// expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request could not be encoded as given.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// True when the remote API itself rejected the call.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::Api { .. })
    }

    /// The provider's error code, if this is an API error.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_exposes_code() {
        let err = Error::Api {
            code: "invalid_api_key".to_string(),
            message: "AK100: bad key".to_string(),
        };
        assert!(err.is_api_error());
        assert_eq!(err.api_code(), Some("invalid_api_key"));
        assert_eq!(err.to_string(), "API error [invalid_api_key]: AK100: bad key");
    }

    #[test]
    fn transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = Error::Transport(Box::new(io));
        assert!(!err.is_api_error());
        assert!(err.api_code().is_none());
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "timed out");
    }

    #[test]
    fn http_error_display() {
        let err = Error::Http {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
    }
}
