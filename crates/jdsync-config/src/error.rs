//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading settings or touching the store.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// One or more of the panel url, client id or client secret is unset.
    #[error("configuration incomplete, missing: {}", missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    /// The panel url does not start with `http://` or `https://`.
    #[error("panel url must start with http:// or https:// (got '{0}')")]
    BadUrlScheme(String),

    /// Failed to read the backing store file.
    #[error("failed to read store '{path}': {source}")]
    ReadStore {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write the backing store file.
    #[error("failed to write store '{path}': {source}")]
    WriteStore {
        path: String,
        source: std::io::Error,
    },

    /// The backing store file is not a JSON object of strings.
    #[error("failed to parse store '{path}': {source}")]
    ParseStore {
        path: String,
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Whether this error comes from the settings themselves rather than
    /// from the persistence layer.
    pub fn is_settings_error(&self) -> bool {
        matches!(
            self,
            ConfigError::Incomplete { .. } | ConfigError::BadUrlScheme(_)
        )
    }
}
