//! Result type aliases for Orbis.

use crate::OrbisError;

/// A specialized `Result` type for Orbis operations.
pub type OrbisResult<T> = Result<T, OrbisError>;
