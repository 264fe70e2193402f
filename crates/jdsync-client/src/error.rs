//! Client error types.

use thiserror::Error;

/// Client error type.
///
/// The four operation variants carry a human-readable message that callers
/// surface to the user unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// The request did not settle before its deadline.
    #[error("request timed out: {url}")]
    Timeout {
        /// Request url, without query string.
        url: String,
    },

    /// Token exchange failed.
    #[error("{0}")]
    AuthFailed(String),

    /// Listing records failed.
    #[error("{0}")]
    QueryFailed(String),

    /// Creating a record failed.
    #[error("{0}")]
    CreateFailed(String),

    /// Deleting a record failed.
    #[error("{0}")]
    DeleteFailed(String),

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The panel answered with something that is not its JSON envelope.
    #[error("invalid response (HTTP {status}): {detail}")]
    InvalidResponse {
        /// HTTP status code.
        status: u16,
        /// Decoder error.
        detail: String,
    },

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Check if this is a failed delete.
    pub fn is_delete_failure(&self) -> bool {
        matches!(self, Error::DeleteFailed(_))
    }

    /// Fold a transport or decoding failure into an operation error.
    ///
    /// Timeouts, url and configuration errors are kept as they are.
    pub(crate) fn into_operation(self, wrap: fn(String) -> Error) -> Error {
        match self {
            Error::Http(_) | Error::InvalidResponse { .. } => wrap(self.to_string()),
            other => other,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_operation_wraps_decode_errors() {
        let err = Error::InvalidResponse {
            status: 502,
            detail: "expected value".to_string(),
        }
        .into_operation(Error::QueryFailed);

        match err {
            Error::QueryFailed(msg) => assert!(msg.contains("502")),
            other => panic!("expected QueryFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_into_operation_keeps_timeouts() {
        let err = Error::Timeout {
            url: "http://ql/open/envs".to_string(),
        }
        .into_operation(Error::CreateFailed);
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "request timed out: http://ql/open/envs");
    }

    #[test]
    fn test_operation_messages_surface_unchanged() {
        assert_eq!(Error::AuthFailed("bad secret".into()).to_string(), "bad secret");
        assert!(Error::DeleteFailed("x".into()).is_delete_failure());
    }
}
