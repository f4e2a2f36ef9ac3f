//! # Mapping Errors
//!
//! Failures raised while converting a result row into a caller's type.
//! Driver and pool failures live in the client crate.

use thiserror::Error;

/// Result type for row and value conversions.
pub type MappingResult<T> = Result<T, MappingError>;

/// A row could not be projected onto the requested shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    /// No column with this name exists in the row.
    #[error("column `{0}` not found")]
    MissingColumn(String),

    /// Positional access past the last column.
    ///
    /// `index` is reported the way the caller supplied it.
    #[error("column index {index} out of range for a row of {width} columns")]
    IndexOutOfRange { index: usize, width: usize },

    /// SQL NULL where the target type has no null representation.
    #[error("column `{column}` is NULL but {expected} is not nullable")]
    UnexpectedNull {
        column: String,
        expected: &'static str,
    },

    /// Storage class does not convert into the target type.
    #[error("column `{column}`: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Integer does not fit the target width.
    #[error("column `{column}`: value {value} out of range for {expected}")]
    OutOfRange {
        column: String,
        value: i64,
        expected: &'static str,
    },

    /// Free-form failure raised by a hand-written `FromRecord` impl.
    #[error("{0}")]
    Custom(String),
}

impl MappingError {
    /// Builds a [`MappingError::Custom`] from any displayable message.
    pub fn custom(message: impl std::fmt::Display) -> Self {
        MappingError::Custom(message.to_string())
    }

    /// Rewrites the column label carried by the error.
    ///
    /// `FromValue` impls do not know which column they read; callers that do
    /// attach it afterwards.
    pub fn in_column(self, name: &str) -> Self {
        match self {
            MappingError::UnexpectedNull { expected, .. } => MappingError::UnexpectedNull {
                column: name.to_string(),
                expected,
            },
            MappingError::TypeMismatch {
                expected, found, ..
            } => MappingError::TypeMismatch {
                column: name.to_string(),
                expected,
                found,
            },
            MappingError::OutOfRange {
                value, expected, ..
            } => MappingError::OutOfRange {
                column: name.to_string(),
                value,
                expected,
            },
            other => other,
        }
    }
}
