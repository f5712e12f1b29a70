// src/app/error.rs
use thiserror::Error;

/// Failures talking to the remote catalog. None of them are fatal: the
/// controller keeps its previous list and shows the message as a notice.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no TMDB API key configured")]
    MissingApiKey,

    #[error("request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    #[error("HTTP {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl CatalogError {
    /// True for transport-level failures (as opposed to a body we could not read).
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::MissingApiKey | Self::Network { .. } | Self::Status { .. }
        )
    }
}

/// Failures of the durable key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored value for `{key}` is unreadable: {message}")]
    Decode { key: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
