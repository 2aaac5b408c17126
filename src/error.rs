//! Error types for catchment

use thiserror::Error;

/// Main error type for catchment operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bad radius, bad coordinates, missing selection
    #[error("Validation error: {0}")]
    Validation(String),

    /// Favorites limit reached
    #[error("Capacity error: {0}")]
    Capacity(String),

    /// Operation on an unknown id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote store rejected the mutation or was unreachable
    #[error("Persistence error: {message}")]
    Persistence { message: String, retryable: bool },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Geocoding error: {0}")]
    Geocoding(String),
}

impl Error {
    /// Persistence failure that is worth retrying (timeouts, unreachable store)
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            retryable: true,
        }
    }

    /// Persistence failure the store rejected outright
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            retryable: false,
        }
    }

    /// Whether retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { retryable: true, .. })
    }
}

/// Result type alias for catchment operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_flag() {
        assert!(Error::retryable("timed out").is_retryable());
        assert!(!Error::rejected("409").is_retryable());
        assert!(!Error::Validation("radius".to_string()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = Error::Capacity("at most 6 favorites".to_string());
        assert_eq!(err.to_string(), "Capacity error: at most 6 favorites");

        let err = Error::rejected("store said no");
        assert_eq!(err.to_string(), "Persistence error: store said no");
    }
}
