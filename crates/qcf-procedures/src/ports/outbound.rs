//! # Outbound Ports (Driven Ports)
//!
//! SPIs required by the procedure service.
//!
//! Every store operation is batched: one call resolves all molecules of a
//! batch, one call fetches the batch's option set and one call registers all
//! result molecules. Packing and unpacking therefore cost O(1) store round
//! trips regardless of batch size.

use crate::domain::{KeywordSet, TaskKey, TaskSkeleton};
use qcf_types::{Molecule, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Bookkeeping returned alongside every store payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Whether the call as a whole succeeded.
    pub success: bool,
    /// Number of requested entries that were found.
    pub n_found: usize,
    /// Number of entries newly inserted.
    pub n_inserted: usize,
    /// Requested keys that were not found.
    pub missing: Vec<String>,
    /// Inserted entries that already existed.
    pub duplicates: Vec<String>,
}

/// A store payload with its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreResponse<T> {
    pub meta: ResponseMeta,
    pub data: T,
}

/// Lookup key for a named option set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionsKey {
    pub program: String,
    pub name: String,
}

impl OptionsKey {
    pub fn new(program: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            name: name.into(),
        }
    }
}

/// A named option set as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDocument {
    pub program: String,
    pub name: String,
    pub keywords: KeywordSet,
}

/// Batched access to the persistent store.
///
/// Consistency, locking and molecule deduplication are the store's own
/// responsibility.
pub trait ProcedureStore: Send + Sync {
    /// Resolve molecules by id. Unknown ids are omitted from `data` and
    /// listed in `meta.missing`.
    fn get_molecules(&self, ids: &[ObjectId]) -> Result<StoreResponse<Vec<Molecule>>, StoreError>;

    /// Register molecules, returning the id assigned to each local key.
    fn add_molecules(
        &self,
        molecules: BTreeMap<String, Molecule>,
    ) -> Result<StoreResponse<BTreeMap<String, ObjectId>>, StoreError>;

    /// Fetch named option sets.
    fn get_options(
        &self,
        requests: &[OptionsKey],
    ) -> Result<StoreResponse<Vec<OptionDocument>>, StoreError>;
}

/// Library-specific basis-name canonicalization.
pub trait BasisNormalizer: Send + Sync {
    /// Canonical basis name, or `None` when the input denotes no basis.
    fn prepare_basis(&self, basis: Option<&str>) -> Option<String>;
}

/// Names a task from its semantic content.
///
/// Two skeletons describing the same computation on the same molecule must
/// map to the same key.
pub trait ResultIndexer: Send + Sync {
    fn task_key(&self, skeleton: &TaskSkeleton) -> TaskKey;
}

/// Store operation errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    #[error("Serialization error: {message}")]
    SerializationError { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::CommunicationError {
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "Communication error: connection reset");
    }

    #[test]
    fn test_options_key_new() {
        let key = OptionsKey::new("psi4", "default");
        assert_eq!(key.program, "psi4");
        assert_eq!(key.name, "default");
    }
}
