//! Result folding: exchange records -> compact records.

use super::{SingleRunProcedure, SUBSYSTEM};
use crate::domain::{CompactResult, QcSchemaResult, TaskKey, UnpackError};
use crate::ports::{ProcedureStore, ResultIndexer};
use qcf_telemetry::log_batch_event;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

impl<S: ProcedureStore, I: ResultIndexer> SingleRunProcedure<S, I> {
    pub(super) fn unpack_batch(
        &self,
        results: BTreeMap<TaskKey, QcSchemaResult>,
    ) -> Result<BTreeMap<TaskKey, CompactResult>, UnpackError> {
        if results.is_empty() {
            return Ok(BTreeMap::new());
        }

        let batch_id = Uuid::new_v4();
        let span = tracing::info_span!("unpack", batch = %batch_id, results = results.len());
        let _guard = span.enter();

        let molecules = results
            .iter()
            .map(|(key, result)| (key.as_str().to_string(), result.molecule.clone()))
            .collect();

        self.metrics.record_store_call();
        let response = self.store.add_molecules(molecules)?;
        let mut ids = response.data;

        let mut compact = BTreeMap::new();
        for (key, result) in results {
            let molecule_id = ids
                .remove(key.as_str())
                .ok_or_else(|| UnpackError::MissingMoleculeId {
                    task_key: key.to_string(),
                })?;
            compact.insert(key, result.into_compact(molecule_id));
        }

        self.metrics.record_unpack(compact.len());
        log_batch_event!(
            info,
            SUBSYSTEM,
            batch_id,
            "Unpacked results",
            results = compact.len(),
            molecules_inserted = response.meta.n_inserted,
            molecules_existing = response.meta.duplicates.len()
        );

        Ok(compact)
    }

    /// Decode raw completed records before unpacking them.
    ///
    /// Fails on the first record that does not match the exchange schema.
    pub fn unpack_json(
        &self,
        results: BTreeMap<TaskKey, Value>,
    ) -> Result<BTreeMap<TaskKey, CompactResult>, UnpackError> {
        let decoded = results
            .into_iter()
            .map(|(key, value)| match serde_json::from_value::<QcSchemaResult>(value) {
                Ok(result) => Ok((key, result)),
                Err(e) => Err(UnpackError::Malformed {
                    task_key: key.to_string(),
                    message: e.to_string(),
                }),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        self.unpack_batch(decoded)
    }
}
