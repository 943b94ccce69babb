//! # Inbound Ports (Driving Ports)
//!
//! Public API of a procedure: expand a compact batch into tasks and fold
//! completed tasks back into the compact shape.

use crate::domain::{CompactResult, PackError, PackedBatch, QcSchemaResult, TaskKey, UnpackError};
use qcf_types::ObjectId;
use serde_json::Value;
use std::collections::BTreeMap;

/// Primary API of a procedure.
pub trait ProcedureApi {
    /// Expand one batch description over many molecules.
    ///
    /// ## Returns
    ///
    /// - `Ok(PackedBatch)`: packed tasks plus per-task errors
    /// - `Err(Validation)`: the batch description is malformed
    /// - `Err(OptionsNotFound)`: the shared option set does not exist
    /// - `Err(Store)`: a store call failed outright
    fn pack(&self, batch_spec: &Value, molecules: &[ObjectId]) -> Result<PackedBatch, PackError>;

    /// Restore completed tasks to their compact shape, registering the
    /// returned molecules with the store.
    fn unpack(
        &self,
        results: BTreeMap<TaskKey, QcSchemaResult>,
    ) -> Result<BTreeMap<TaskKey, CompactResult>, UnpackError>;
}
