//! Service Layer
//!
//! Wires the domain pipeline to the injected store and task indexer.

mod packer;
mod unpacker;

use crate::adapters::CanonicalResultIndexer;
use crate::domain::{
    CompactResult, PackError, PackedBatch, ProcedureConfig, QcSchemaResult, TaskKey, UnpackError,
};
use crate::metrics::ProcedureMetrics;
use crate::ports::{ProcedureApi, ProcedureStore, ResultIndexer};
use qcf_telemetry::log_event;
use qcf_types::ObjectId;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Subsystem name attached to every log event of this crate.
pub(crate) const SUBSYSTEM: &str = "qcf-procedures";

/// Single-run procedure: one specification applied to many molecules.
///
/// Implements [`ProcedureApi`] against an injected [`ProcedureStore`].
pub struct SingleRunProcedure<S: ProcedureStore, I: ResultIndexer = CanonicalResultIndexer> {
    /// Persistent store (driven port)
    store: Arc<S>,
    /// Names tasks from their content
    indexer: I,
    config: ProcedureConfig,
    metrics: Arc<ProcedureMetrics>,
}

impl<S: ProcedureStore> SingleRunProcedure<S> {
    /// Create a service with the default configuration and task indexer.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            indexer: CanonicalResultIndexer,
            config: ProcedureConfig::default(),
            metrics: Arc::new(ProcedureMetrics::new()),
        }
    }
}

impl<S: ProcedureStore, I: ResultIndexer> SingleRunProcedure<S, I> {
    /// Create a service with a custom indexer and configuration.
    pub fn with_config(store: Arc<S>, indexer: I, config: ProcedureConfig) -> Result<Self, PackError> {
        config.validate()?;
        log_event!(
            debug,
            SUBSYSTEM,
            "Procedure configured",
            max_molecules_per_batch = config.max_molecules_per_batch,
            warn_on_collapse = config.warn_on_collapse
        );
        Ok(Self {
            store,
            indexer,
            config,
            metrics: Arc::new(ProcedureMetrics::new()),
        })
    }

    /// Share an existing metrics collector.
    pub fn with_metrics(mut self, metrics: Arc<ProcedureMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &ProcedureConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<ProcedureMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: ProcedureStore, I: ResultIndexer> ProcedureApi for SingleRunProcedure<S, I> {
    fn pack(&self, batch_spec: &Value, molecules: &[ObjectId]) -> Result<PackedBatch, PackError> {
        self.pack_batch(batch_spec, molecules)
    }

    fn unpack(
        &self,
        results: BTreeMap<TaskKey, QcSchemaResult>,
    ) -> Result<BTreeMap<TaskKey, CompactResult>, UnpackError> {
        self.unpack_batch(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryStore;

    #[test]
    fn test_with_config_validates() {
        let store = Arc::new(InMemoryStore::new());
        let config = ProcedureConfig::default().with_max_molecules_per_batch(0);
        let result = SingleRunProcedure::with_config(store, CanonicalResultIndexer, config);
        assert!(matches!(result, Err(PackError::InvalidConfig(_))));
    }

    #[test]
    fn test_shared_metrics() {
        let store = Arc::new(InMemoryStore::new());
        let metrics = Arc::new(ProcedureMetrics::new());
        let service = SingleRunProcedure::new(store).with_metrics(Arc::clone(&metrics));
        assert!(Arc::ptr_eq(&service.metrics(), &metrics));
    }
}
