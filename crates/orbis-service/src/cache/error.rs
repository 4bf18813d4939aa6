//! Cache error types.

use orbis_core::OrbisError;
use thiserror::Error;

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by the cache store and the cache-aside orchestrator.
///
/// `Clone` so that background write failures can be fanned out on a
/// broadcast channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The store is not connected or refused the connection.
    #[error("Cache store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored value could not be decoded, or a result could not be encoded.
    #[error("Cache serialization error: {0}")]
    Serialization(String),

    /// A TTL expression could not be turned into seconds.
    #[error("Invalid duration expression '{input}': {reason}")]
    DurationParse { input: String, reason: String },

    /// A pattern delete failed part-way through.
    #[error("Pattern delete '{pattern}' failed after removing {deleted} keys: {message}")]
    PatternScan {
        pattern: String,
        deleted: u64,
        message: String,
    },

    /// A store round-trip exceeded the operation timeout.
    #[error("Cache operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// The store rejected a command.
    #[error("Cache command failed: {0}")]
    Command(String),
}

impl CacheError {
    /// Creates a duration parse error.
    #[must_use]
    pub fn duration_parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DurationParse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Returns true when the error means the store cannot be reached at all.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<CacheError> for OrbisError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::StoreUnavailable(_) => Self::Unavailable(err.to_string()),
            CacheError::DurationParse { .. } => Self::Validation(err.to_string()),
            CacheError::Timeout { .. } => Self::Timeout(err.to_string()),
            CacheError::Serialization(_)
            | CacheError::PatternScan { .. }
            | CacheError::Command(_) => Self::Cache(err.to_string()),
        }
    }
}
