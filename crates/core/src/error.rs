//! Error types for foamcut.

use thiserror::Error;

/// Result type alias for foamcut operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while optimizing a cutting plan.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any strategy ran (bad dimension, zero quantity, empty list).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Strategy or mode name that does not exist.
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// A single strategy failed inside an orchestrated run.
    #[error("Strategy '{strategy}' failed: {detail}")]
    StrategyFailure {
        /// Name of the failing strategy.
        strategy: String,
        /// Error message or panic payload.
        detail: String,
    },

    /// Every requested strategy failed.
    #[error("All strategies failed: {0}")]
    AllStrategiesFailed(String),

    /// Computation cancelled before any result was produced.
    #[error("Computation cancelled")]
    Cancelled,

    /// Serialization error.
    #[cfg(feature = "serde")]
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error (a broken result invariant).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Returns true if this error is fatal for the whole call.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::ConfigError(_))
    }
}
