//! Sculpting error types.
//!
//! The numeric core never fails: non-finite similarities, degenerate
//! consensus directions and an unmet divergence bound all degrade to
//! "leave the vector as close to unchanged as possible". Errors are only
//! raised where data enters the crate: building an embedding table,
//! looking up tokens, and loading configuration.

use thiserror::Error;

/// Errors that can occur while preparing or running a sculpting pass.
#[derive(Debug, Error)]
pub enum SculptError {
    /// Empty input provided (empty table, zero-dimensional query)
    #[error("Empty input provided for sculpting")]
    EmptyInput,

    /// Query dimension does not match the embedding table
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// A table row has a different length than the first row
    #[error("Ragged embedding table: row {row} has {actual} values, expected {expected}")]
    RaggedTable {
        /// Offending row index
        row: usize,
        /// Dimension of row 0
        expected: usize,
        /// Dimension of the offending row
        actual: usize,
    },

    /// Token id has no row in the embedding table
    #[error("Token {token} out of range for table with {rows} rows")]
    TokenOutOfRange {
        /// Token id that was looked up
        token: u32,
        /// Number of rows in the table
        rows: usize,
    },

    /// No embedding table registered for a branch
    #[error("Unknown embedding branch: {0}")]
    UnknownBranch(String),

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {value}. {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Parameter value as string
        value: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error while reading configuration or tables
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sculpting operations.
pub type SculptResult<T> = Result<T, SculptError>;

impl From<serde_json::Error> for SculptError {
    fn from(err: serde_json::Error) -> Self {
        SculptError::SerializationError(err.to_string())
    }
}

impl SculptError {
    /// Create an invalid parameter error.
    pub fn invalid_param(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        SculptError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this error is recoverable (can be retried with different input).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SculptError::InvalidParameter { .. }
                | SculptError::DimensionMismatch { .. }
                | SculptError::TokenOutOfRange { .. }
                | SculptError::EmptyInput
        )
    }
}
