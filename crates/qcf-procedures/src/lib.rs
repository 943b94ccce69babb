//! # QCF Procedures
//!
//! Canonicalization and batch packing for single-run quantum chemistry
//! computations.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `recursive_normalizer`: canonical form of configuration values
//!   - `hash_index`: SHA-256 over sorted-key canonical JSON
//!   - `KeywordSet`: frozen, hash-indexed option set
//!   - `QcSpecification` / `OptimizationSpecification`: closed descriptors
//!   - `SingleRunMeta`, `TaskSkeleton`, `QcSchemaInput`, `CompactResult`
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `ProcedureApi`: Driving port (pack / unpack)
//!   - `ProcedureStore`: Driven port, batched molecule and option access
//!   - `BasisNormalizer`, `ResultIndexer`: injected collaborators
//!
//! - **Adapters Layer** (`adapters/`)
//!   - `InMemoryStore`: deduplicating in-process store
//!   - `DefaultBasisNormalizer`, `CanonicalResultIndexer`
//!
//! - **Service Layer** (`service/`)
//!   - `SingleRunProcedure`: Implements `ProcedureApi`
//!
//! ## Invariants
//!
//! - Normalization is idempotent.
//! - Equal canonical keyword values yield equal hash indices regardless of
//!   key order or string case.
//! - Packing and unpacking each cost a constant number of store calls.
//! - An unresolvable molecule fails only its own task; a missing option set
//!   or malformed batch description fails the whole batch.
//!
//! ## Usage Example
//!
//! ```ignore
//! use qcf_procedures::{InMemoryStore, KeywordSet, ProcedureApi, SingleRunProcedure};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStore::new());
//! store.add_options("psi4", "default", KeywordSet::new(keywords));
//!
//! let service = SingleRunProcedure::new(store);
//! let batch = service.pack(
//!     &json!({"driver": "energy", "method": "HF", "basis": "sto-3g",
//!             "program": "psi4", "options": "default"}),
//!     &molecule_ids,
//! )?;
//!
//! // Always check both: tasks that packed and tasks that did not.
//! for error in &batch.errors {
//!     eprintln!("{}: {}", error.task_key, error.reason);
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{CanonicalResultIndexer, DefaultBasisNormalizer, InMemoryStore, StoreCallCounts};
pub use domain::{
    hash_index, recursive_normalizer, CompactResult, KeywordSet, KeywordSetBuilder,
    NormalizeOptions, OptimizationSpecification, PackError, PackedBatch, ProcedureConfig,
    QcSchemaInput, QcSchemaResult, QcSpecification, SingleRunMeta, TaskError, TaskKey,
    UnpackError,
};
pub use metrics::{MetricsSnapshot, ProcedureMetrics};
pub use ports::{
    BasisNormalizer, OptionDocument, OptionsKey, ProcedureApi, ProcedureStore, ResponseMeta,
    ResultIndexer, StoreError, StoreResponse,
};
pub use service::SingleRunProcedure;

pub use qcf_types::{Driver, KeywordSetId, Molecule, ObjectId, ValidationError};
