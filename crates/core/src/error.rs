//! Unified error types for swcache.
//!
//! Every message starts with a stable code so host logs can be grepped
//! without parsing the variant.

use tokio_rusqlite::rusqlite;

/// Unified error types for the cache controller, its stores and its network clients.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an unknown HTTP method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// No cache entry or generation found.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored response metadata could not be encoded or decoded.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(String),

    /// The request was rejected before a response arrived (offline, DNS, reset).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// A static asset could not be fetched during install.
    #[error("PRECACHE_FAILED: {url}: {reason}")]
    PrecacheFailed { url: String, reason: String },

    /// Lifecycle transition not allowed from the current registration state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),
}

impl Error {
    /// Whether this error came from the network layer rather than the store.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("widgets-app-v1".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("widgets-app-v1"));
    }

    #[test]
    fn test_precache_failed_display() {
        let err = Error::PrecacheFailed { url: "http://localhost:3000/icon-192x192.png".into(), reason: "status 404".into() };
        assert_eq!(err.to_string(), "PRECACHE_FAILED: http://localhost:3000/icon-192x192.png: status 404");
    }

    #[test]
    fn test_is_network() {
        assert!(Error::Network("offline".into()).is_network());
        assert!(Error::FetchTimeout("20s".into()).is_network());
        assert!(!Error::CacheMiss("x".into()).is_network());
        assert!(!Error::InvalidState("x".into()).is_network());
    }

    #[test]
    fn test_from_rusqlite_error() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(err.to_string().starts_with("CACHE_ERROR"));
    }
}
