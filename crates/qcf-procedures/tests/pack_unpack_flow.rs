//! # Pack / Unpack Flow Tests
//!
//! Drive `SingleRunProcedure` end to end against `InMemoryStore`.
//!
//! ## Test Categories
//!
//! 1. **Round Trip** - pack, simulated execution, unpack
//! 2. **Partial Failure** - unresolvable molecules stay per-task
//! 3. **Batch-Fatal Errors** - missing options, malformed descriptions
//! 4. **Store Cost** - constant number of store calls per batch

use qcf_procedures::{
    InMemoryStore, KeywordSet, Molecule, ObjectId, PackError, PackedBatch, ProcedureApi,
    QcSchemaResult, SingleRunProcedure, StoreCallCounts, TaskKey,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// TEST HELPERS
// =============================================================================

const SYMBOLS: [&str; 4] = ["He", "Ne", "Ar", "Kr"];

fn batch_spec() -> Value {
    json!({
        "procedure": "single",
        "driver": "energy",
        "method": "HF",
        "basis": "sto-3g",
        "program": "psi4",
        "options": "default"
    })
}

fn make_store(n_molecules: usize) -> (Arc<InMemoryStore>, Vec<ObjectId>) {
    qcf_telemetry::init_for_tests();
    let store = Arc::new(InMemoryStore::new());
    let keywords = json!({"scf_type": "DF", "e_convergence": 1e-8});
    store.add_options(
        "psi4",
        "default",
        KeywordSet::new(keywords.as_object().cloned().unwrap()),
    );

    let ids = SYMBOLS
        .iter()
        .take(n_molecules)
        .enumerate()
        .map(|(i, symbol)| {
            store
                .insert_molecule(Molecule::new(
                    vec![symbol.to_string()],
                    vec![0.0, 0.0, i as f64],
                ))
                .unwrap()
        })
        .collect();
    (store, ids)
}

/// Stand-in for the execution layer: echo each task with a result payload.
fn execute(batch: &PackedBatch) -> BTreeMap<TaskKey, QcSchemaResult> {
    batch
        .tasks
        .iter()
        .map(|(key, task)| {
            let mut record = serde_json::to_value(task).unwrap();
            record["return_result"] = json!(-2.85);
            record["success"] = json!(true);
            (key.clone(), serde_json::from_value(record).unwrap())
        })
        .collect()
}

// =============================================================================
// ROUND TRIP
// =============================================================================

#[test]
fn test_round_trip_restores_compact_fields() {
    let (store, ids) = make_store(3);
    let service = SingleRunProcedure::new(Arc::clone(&store));

    let batch = service.pack(&batch_spec(), &ids).unwrap();
    assert_eq!(batch.tasks.len(), 3);
    assert!(batch.errors.is_empty());

    let compact = service.unpack(execute(&batch)).unwrap();
    assert_eq!(compact.len(), 3);

    let mut restored_ids: Vec<ObjectId> = Vec::new();
    for (key, result) in &compact {
        assert!(batch.tasks.contains_key(key));
        assert_eq!(result.method, "HF");
        assert_eq!(result.basis.as_deref(), Some("sto-3g"));
        assert_eq!(result.program, "psi4");
        assert_eq!(result.options, "default");
        assert_eq!(result.extras["return_result"], json!(-2.85));
        restored_ids.push(result.molecule_id.clone());
    }

    // Results carry the same molecules back; the store recognises them.
    restored_ids.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(restored_ids, expected);
    assert_eq!(store.molecule_count(), 3);
}

#[test]
fn test_no_envelope_fields_leak() {
    let (store, ids) = make_store(2);
    let service = SingleRunProcedure::new(store);

    let batch = service.pack(&batch_spec(), &ids).unwrap();
    let compact = service.unpack(execute(&batch)).unwrap();

    for result in compact.values() {
        let value = serde_json::to_value(result).unwrap();
        for field in [
            "schema_name",
            "schema_version",
            "qcfractal_tags",
            "model",
            "keywords",
            "molecule",
        ] {
            assert!(value.get(field).is_none(), "{} leaked", field);
        }
    }
}

#[test]
fn test_packed_task_shape() {
    let (store, ids) = make_store(1);
    let service = SingleRunProcedure::new(store);

    let batch = service.pack(&batch_spec(), &ids).unwrap();
    let task = serde_json::to_value(batch.tasks.values().next().unwrap()).unwrap();

    assert_eq!(task["schema_name"], json!("qc_schema_input"));
    assert_eq!(task["schema_version"], json!(1));
    assert_eq!(task["driver"], json!("energy"));
    assert_eq!(task["model"], json!({"method": "HF", "basis": "sto-3g"}));
    assert_eq!(
        task["qcfractal_tags"],
        json!({"program": "psi4", "options": "default"})
    );
    assert_eq!(task["keywords"]["scf_type"], json!("df"));
    assert_eq!(task["molecule"]["symbols"], json!(["He"]));
    for field in ["method", "basis", "options", "program", "molecule_id", "procedure"] {
        assert!(task.get(field).is_none(), "{} not folded", field);
    }
}

// =============================================================================
// PARTIAL FAILURE
// =============================================================================

#[test]
fn test_three_molecules_two_resolvable() {
    let (store, mut ids) = make_store(2);
    let missing = ObjectId::parse("ffffffffffffffffffffffff").unwrap();
    ids.push(missing);
    let service = SingleRunProcedure::new(store);

    let batch = service.pack(&batch_spec(), &ids).unwrap();
    assert_eq!(batch.tasks.len(), 2);
    assert_eq!(batch.errors.len(), 1);
    assert_eq!(batch.errors[0].reason, "Molecule not found");
    assert!(!batch.tasks.contains_key(&batch.errors[0].task_key));

    // Surviving tasks are identical to a batch without the bad reference.
    let (clean_store, clean_ids) = make_store(2);
    let clean = SingleRunProcedure::new(clean_store)
        .pack(&batch_spec(), &clean_ids)
        .unwrap();
    assert_eq!(batch.tasks, clean.tasks);
}

#[test]
fn test_all_molecules_missing_still_succeeds() {
    let (store, _) = make_store(0);
    let service = SingleRunProcedure::new(store);
    let ids = vec![ObjectId::from_sequence(100), ObjectId::from_sequence(101)];

    let batch = service.pack(&batch_spec(), &ids).unwrap();
    assert!(batch.tasks.is_empty());
    assert_eq!(batch.errors.len(), 2);
}

// =============================================================================
// DEDUPLICATION
// =============================================================================

#[test]
fn test_identical_references_collapse() {
    let (store, ids) = make_store(2);
    let service = SingleRunProcedure::new(store);
    let refs = vec![ids[0].clone(), ids[1].clone(), ids[0].clone(), ids[0].clone()];

    let batch = service.pack(&batch_spec(), &refs).unwrap();
    assert_eq!(batch.tasks.len(), 2);
    assert!(batch.errors.is_empty());

    let snapshot = service.metrics().snapshot();
    assert_eq!(snapshot.duplicates_collapsed, 2);
    assert_eq!(snapshot.tasks_packed, 2);
}

#[test]
fn test_task_keys_stable_across_batches() {
    let (store, ids) = make_store(2);
    let service = SingleRunProcedure::new(store);

    let first = service.pack(&batch_spec(), &ids).unwrap();
    let reversed: Vec<ObjectId> = ids.iter().rev().cloned().collect();
    let second = service.pack(&batch_spec(), &reversed).unwrap();

    let a: Vec<&TaskKey> = first.tasks.keys().collect();
    let b: Vec<&TaskKey> = second.tasks.keys().collect();
    assert_eq!(a, b);
}

// =============================================================================
// BATCH-FATAL ERRORS
// =============================================================================

#[test]
fn test_missing_options_fails_batch() {
    let (store, ids) = make_store(2);
    let service = SingleRunProcedure::new(store);
    let mut spec = batch_spec();
    spec["options"] = json!("nonexistent");

    let err = service.pack(&spec, &ids).unwrap_err();
    assert!(matches!(err, PackError::OptionsNotFound { .. }));
}

#[test]
fn test_options_program_is_case_insensitive() {
    let (store, ids) = make_store(1);
    let service = SingleRunProcedure::new(store);
    let mut spec = batch_spec();
    spec["program"] = json!("PSI4");

    let batch = service.pack(&spec, &ids).unwrap();
    assert_eq!(batch.tasks.len(), 1);
}

#[test]
fn test_missing_required_field_fails_batch() {
    for field in ["program", "driver", "method", "options"] {
        let (store, ids) = make_store(1);
        let service = SingleRunProcedure::new(Arc::clone(&store));
        let mut spec = batch_spec();
        spec.as_object_mut().unwrap().remove(field);

        let err = service.pack(&spec, &ids).unwrap_err();
        assert!(matches!(err, PackError::Validation(_)), "{}", field);
        assert_eq!(store.call_counts(), StoreCallCounts::default());
    }
}

#[test]
fn test_invalid_driver_fails_batch() {
    let (store, ids) = make_store(1);
    let service = SingleRunProcedure::new(store);
    let mut spec = batch_spec();
    spec["driver"] = json!("optimization");

    assert!(matches!(
        service.pack(&spec, &ids),
        Err(PackError::Validation(_))
    ));
}

// =============================================================================
// STORE COST
// =============================================================================

#[test]
fn test_store_calls_do_not_scale_with_batch() {
    let (store, ids) = make_store(4);
    let service = SingleRunProcedure::new(Arc::clone(&store));
    let mut refs = ids.clone();
    refs.extend(ids.iter().cloned());
    refs.push(ObjectId::from_sequence(9999));

    let batch = service.pack(&batch_spec(), &refs).unwrap();
    service.unpack(execute(&batch)).unwrap();

    assert_eq!(
        store.call_counts(),
        StoreCallCounts {
            get_molecules: 1,
            add_molecules: 1,
            get_options: 1,
        }
    );
    assert_eq!(service.metrics().snapshot().store_calls, 3);
}
