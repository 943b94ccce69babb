//! Procedure configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use qcf_procedures::domain::ProcedureConfig;
//!
//! let config = ProcedureConfig::default()
//!     .with_max_molecules_per_batch(500)
//!     .with_warn_on_collapse(true);
//! config.validate()?;
//! ```

use crate::domain::errors::PackError;
use serde::{Deserialize, Serialize};

/// Hard ceiling for `max_molecules_per_batch`.
pub const MAX_BATCH_CEILING: usize = 1_000_000;

/// Configuration for the single-run procedure service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureConfig {
    /// Largest molecule list accepted by one `pack` call.
    pub max_molecules_per_batch: usize,
    /// Log collapsed duplicate task keys at `warn` instead of `debug`.
    pub warn_on_collapse: bool,
}

impl Default for ProcedureConfig {
    fn default() -> Self {
        Self {
            max_molecules_per_batch: 10_000,
            warn_on_collapse: false,
        }
    }
}

impl ProcedureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration bounds.
    pub fn validate(&self) -> Result<(), PackError> {
        if self.max_molecules_per_batch == 0 {
            return Err(PackError::InvalidConfig(
                "max_molecules_per_batch cannot be 0".to_string(),
            ));
        }

        if self.max_molecules_per_batch > MAX_BATCH_CEILING {
            return Err(PackError::InvalidConfig(format!(
                "max_molecules_per_batch must be at most {}",
                MAX_BATCH_CEILING
            )));
        }

        Ok(())
    }

    /// Builder-style method to set the batch size limit
    pub fn with_max_molecules_per_batch(mut self, max: usize) -> Self {
        self.max_molecules_per_batch = max;
        self
    }

    /// Builder-style method to raise duplicate-collapse logging to `warn`
    pub fn with_warn_on_collapse(mut self, warn: bool) -> Self {
        self.warn_on_collapse = warn;
        self
    }
}
