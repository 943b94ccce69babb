//! Batch expansion: compact description + molecule ids -> exchange tasks.

use super::{SingleRunProcedure, SUBSYSTEM};
use crate::domain::{
    PackError, PackedBatch, QcSchemaInput, SingleRunMeta, TaskError, TaskKey, TaskSkeleton,
    MOLECULE_NOT_FOUND,
};
use crate::ports::{OptionsKey, ProcedureStore, ResultIndexer};
use qcf_telemetry::{log_batch_event, log_task_event};
use qcf_types::{Molecule, ObjectId};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

impl<S: ProcedureStore, I: ResultIndexer> SingleRunProcedure<S, I> {
    pub(super) fn pack_batch(
        &self,
        batch_spec: &Value,
        molecules: &[ObjectId],
    ) -> Result<PackedBatch, PackError> {
        let batch_id = Uuid::new_v4();
        let span = tracing::info_span!("pack", batch = %batch_id, molecules = molecules.len());
        let _guard = span.enter();

        match self.pack_inner(batch_id, batch_spec, molecules) {
            Ok(batch) => Ok(batch),
            Err(err) => {
                self.metrics.record_rejected();
                log_batch_event!(warn, SUBSYSTEM, batch_id, "Batch rejected", error = %err);
                Err(err)
            }
        }
    }

    fn pack_inner(
        &self,
        batch_id: Uuid,
        batch_spec: &Value,
        molecules: &[ObjectId],
    ) -> Result<PackedBatch, PackError> {
        let meta = SingleRunMeta::from_json(batch_spec)?;

        if molecules.len() > self.config.max_molecules_per_batch {
            return Err(PackError::BatchTooLarge {
                count: molecules.len(),
                max: self.config.max_molecules_per_batch,
            });
        }

        let (skeletons, collapsed) = self.expand(batch_id, &meta, molecules);

        let resolved = self.resolve_molecules(&skeletons)?;
        let mut tasks = BTreeMap::new();
        let mut errors = Vec::new();
        let mut pending = Vec::with_capacity(skeletons.len());
        for (key, skeleton) in skeletons {
            match resolved.get(&skeleton.molecule_id) {
                Some(molecule) => pending.push((key, skeleton, molecule.clone())),
                None => {
                    log_task_event!(
                        debug,
                        SUBSYSTEM,
                        batch_id,
                        key,
                        "Molecule not found",
                        molecule_id = %skeleton.molecule_id
                    );
                    errors.push(TaskError {
                        task_key: key,
                        reason: MOLECULE_NOT_FOUND.to_string(),
                    });
                }
            }
        }

        let keywords = self.resolve_options(&meta)?;
        for (key, skeleton, molecule) in pending {
            tasks.insert(key, QcSchemaInput::assemble(skeleton, molecule, keywords.clone()));
        }

        self.metrics.record_pack(tasks.len(), errors.len(), collapsed);
        log_batch_event!(
            info,
            SUBSYSTEM,
            batch_id,
            "Packed single-run batch",
            tasks = tasks.len(),
            errors = errors.len(),
            collapsed = collapsed
        );

        Ok(PackedBatch { tasks, errors })
    }

    /// Build one skeleton per molecule reference, keyed by content.
    ///
    /// A later skeleton with an existing key replaces the earlier one.
    fn expand(
        &self,
        batch_id: Uuid,
        meta: &SingleRunMeta,
        molecules: &[ObjectId],
    ) -> (BTreeMap<TaskKey, TaskSkeleton>, usize) {
        let mut skeletons = BTreeMap::new();
        let mut collapsed = 0;

        for molecule_id in molecules {
            let skeleton = TaskSkeleton::new(meta, molecule_id.clone());
            let key = self.indexer.task_key(&skeleton);
            if skeletons.insert(key.clone(), skeleton).is_some() {
                collapsed += 1;
                if self.config.warn_on_collapse {
                    log_task_event!(warn, SUBSYSTEM, batch_id, key, "Duplicate task collapsed");
                } else {
                    log_task_event!(debug, SUBSYSTEM, batch_id, key, "Duplicate task collapsed");
                }
            }
        }

        (skeletons, collapsed)
    }

    /// Resolve every distinct molecule reference in one store call.
    fn resolve_molecules(
        &self,
        skeletons: &BTreeMap<TaskKey, TaskSkeleton>,
    ) -> Result<HashMap<ObjectId, Molecule>, PackError> {
        let mut seen = HashSet::new();
        let ids: Vec<ObjectId> = skeletons
            .values()
            .filter(|s| seen.insert(s.molecule_id.clone()))
            .map(|s| s.molecule_id.clone())
            .collect();

        self.metrics.record_store_call();
        let response = self.store.get_molecules(&ids)?;

        Ok(response
            .data
            .into_iter()
            .filter_map(|molecule| molecule.id.clone().map(|id| (id, molecule)))
            .collect())
    }

    /// Fetch the batch's shared option set in one store call.
    fn resolve_options(&self, meta: &SingleRunMeta) -> Result<Map<String, Value>, PackError> {
        let request = OptionsKey::new(meta.program.clone(), meta.options.clone());

        self.metrics.record_store_call();
        let response = self.store.get_options(std::slice::from_ref(&request))?;

        response
            .data
            .into_iter()
            .next()
            .map(|document| document.keywords.values().clone())
            .ok_or(PackError::OptionsNotFound {
                program: request.program,
                name: request.name,
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::adapters::{CanonicalResultIndexer, InMemoryStore};
    use crate::domain::{KeywordSet, PackError, ProcedureConfig, MOLECULE_NOT_FOUND};
    use crate::ports::ProcedureApi;
    use crate::service::SingleRunProcedure;
    use qcf_types::{Molecule, ObjectId};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn batch_spec() -> Value {
        json!({
            "procedure": "single",
            "driver": "energy",
            "method": "HF",
            "basis": "sto-3g",
            "options": "default",
            "program": "psi4"
        })
    }

    fn seeded_store() -> (Arc<InMemoryStore>, Vec<ObjectId>) {
        qcf_telemetry::init_for_tests();
        let store = Arc::new(InMemoryStore::new());
        store.add_options(
            "psi4",
            "default",
            KeywordSet::new(json!({"scf_type": "DF"}).as_object().cloned().unwrap()),
        );
        let ids = ["He", "Ne"]
            .iter()
            .map(|s| {
                store
                    .insert_molecule(Molecule::new(vec![s.to_string()], vec![0.0, 0.0, 0.0]))
                    .unwrap()
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_pack_resolves_molecules_and_options() {
        let (store, ids) = seeded_store();
        let service = SingleRunProcedure::new(store);

        let batch = service.pack(&batch_spec(), &ids).unwrap();
        assert_eq!(batch.tasks.len(), 2);
        assert!(batch.errors.is_empty());
        for task in batch.tasks.values() {
            assert_eq!(task.keywords["scf_type"], json!("df"));
            assert!(task.molecule.id.is_some());
        }
    }

    #[test]
    fn test_unknown_molecule_is_per_task_error() {
        let (store, mut ids) = seeded_store();
        ids.push(ObjectId::from_sequence(4242));
        let service = SingleRunProcedure::new(store);

        let batch = service.pack(&batch_spec(), &ids).unwrap();
        assert_eq!(batch.tasks.len(), 2);
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].reason, MOLECULE_NOT_FOUND);
    }

    #[test]
    fn test_duplicates_collapse() {
        let (store, ids) = seeded_store();
        let service = SingleRunProcedure::new(store);
        let refs = vec![ids[0].clone(), ids[0].clone(), ids[1].clone()];

        let batch = service.pack(&batch_spec(), &refs).unwrap();
        assert_eq!(batch.tasks.len(), 2);
        assert_eq!(service.metrics().snapshot().duplicates_collapsed, 1);
    }

    #[test]
    fn test_missing_options_is_fatal() {
        let (store, ids) = seeded_store();
        let service = SingleRunProcedure::new(store);
        let mut spec = batch_spec();
        spec["options"] = json!("tight");

        let err = service.pack(&spec, &ids).unwrap_err();
        assert!(matches!(err, PackError::OptionsNotFound { ref name, .. } if name == "tight"));
        assert_eq!(service.metrics().snapshot().batches_rejected, 1);
    }

    #[test]
    fn test_batch_too_large() {
        let (store, ids) = seeded_store();
        let config = ProcedureConfig::default().with_max_molecules_per_batch(1);
        let service =
            SingleRunProcedure::with_config(Arc::clone(&store), CanonicalResultIndexer, config)
                .unwrap();

        let err = service.pack(&batch_spec(), &ids).unwrap_err();
        assert!(matches!(err, PackError::BatchTooLarge { count: 2, max: 1 }));
        assert_eq!(store.call_counts().get_molecules, 0);
    }

    #[test]
    fn test_malformed_spec_touches_nothing() {
        let (store, ids) = seeded_store();
        let service = SingleRunProcedure::new(Arc::clone(&store));
        let mut spec = batch_spec();
        spec.as_object_mut().unwrap().remove("method");

        assert!(matches!(
            service.pack(&spec, &ids),
            Err(PackError::Validation(_))
        ));
        assert_eq!(store.call_counts().get_molecules, 0);
        assert_eq!(store.call_counts().get_options, 0);
    }
}
