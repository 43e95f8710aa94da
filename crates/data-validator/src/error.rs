//! Validation Error Types

use thiserror::Error;

/// Errors during profile validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Categorical value outside the known options
    #[error("{field} value {value:?} is not one of the available options")]
    UnknownOption { field: &'static str, value: String },

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl ValidationError {
    /// Field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::OutOfRange { field, .. } => field,
            ValidationError::UnknownOption { field, .. } => field,
            ValidationError::MissingField(field) => field,
        }
    }
}
