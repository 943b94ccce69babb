//! # Error Types
//!
//! Construction-time validation errors. These are always surfaced to the
//! immediate caller and are never retried.

use thiserror::Error;

/// Errors raised while constructing or parsing a validated value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Identifier is not exactly 24 lowercase hexadecimal characters.
    #[error("The string {value:?} is not a valid 24-character hexadecimal ObjectId")]
    InvalidObjectId { value: String },

    /// A closed entity received a field it does not declare.
    #[error("Unknown field `{field}` on {entity}")]
    UnknownField { entity: &'static str, field: String },

    /// An enumerated field received a value outside its domain.
    #[error("Invalid value {value:?} for `{field}`: expected one of {expected}")]
    InvalidEnum {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A required field is absent.
    #[error("Missing required field `{field}` on {entity}")]
    MissingField { entity: &'static str, field: String },

    /// A field is present but has the wrong JSON type.
    #[error("Field `{field}` must be {expected}")]
    WrongType { field: String, expected: &'static str },

    /// The keyword set handed to a specification is not the one it references.
    #[error("Keyword set mismatch: specification references {expected}, got {actual}")]
    KeywordsMismatch { expected: String, actual: String },

    /// Catch-all for payloads that could not be decoded at all.
    #[error("Malformed {entity}: {message}")]
    Malformed {
        entity: &'static str,
        message: String,
    },
}

impl ValidationError {
    /// Wrap a serde decoding failure for `entity`.
    pub fn malformed(entity: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Malformed {
            entity,
            message: err.to_string(),
        }
    }
}
