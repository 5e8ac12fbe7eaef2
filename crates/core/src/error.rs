//! Error handling for the AdScout core engine

use thiserror::Error;

use crate::filters::ValidationReport;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations
///
/// Authorization denial is deliberately absent: a viewer lacking the
/// similar-creatives capability receives an empty result, never an error.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Strict-mode filter validation failed; carries every field-level message
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationReport),

    /// A referenced creative does not exist among ready items
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Failure reported by the backing data store
    #[error("Store error: {message}")]
    Store { message: String },

    /// Invalid engine or logging configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for errors outside the engine taxonomy
    #[error(transparent)]
    Generic(#[from] anyhow::Error),
}

impl EngineError {
    /// Create a not-found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a backing-store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if error is retryable by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store { .. })
    }
}
