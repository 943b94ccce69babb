//! # Domain Errors
//!
//! Batch-level failures of the pack and unpack pipelines.
//!
//! Per-task molecule failures are not errors at this level; they are
//! recorded as [`TaskError`](crate::domain::TaskError) values and the batch
//! continues.

use crate::ports::StoreError;
use qcf_types::ValidationError;
use thiserror::Error;

/// Batch-fatal packing failures. Nothing partial is returned.
#[derive(Debug, Clone, Error)]
pub enum PackError {
    /// The batch description is malformed or missing a required field.
    #[error("Invalid batch description: {0}")]
    Validation(#[from] ValidationError),

    /// The shared option set for the batch does not exist.
    #[error("Options not found: program={program} name={name}")]
    OptionsNotFound { program: String, name: String },

    /// More molecules than the configured limit.
    #[error("Batch too large: {count} > {max}")]
    BatchTooLarge { count: usize, max: usize },

    /// A store call failed outright.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The service was built with an invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Unpacking failures.
#[derive(Debug, Clone, Error)]
pub enum UnpackError {
    /// A store call failed outright.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The store registered the molecules but returned no id for this task.
    #[error("No molecule id returned for task {task_key}")]
    MissingMoleculeId { task_key: String },

    /// A completed record could not be decoded.
    #[error("Malformed result for task {task_key}: {message}")]
    Malformed { task_key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_error_display() {
        let err = PackError::OptionsNotFound {
            program: "psi4".to_string(),
            name: "default".to_string(),
        };
        assert_eq!(err.to_string(), "Options not found: program=psi4 name=default");
    }

    #[test]
    fn test_validation_converts_into_pack_error() {
        let err: PackError = ValidationError::MissingField {
            entity: "SingleRunMeta",
            field: "method".to_string(),
        }
        .into();
        assert!(err.to_string().contains("method"));
    }
}
