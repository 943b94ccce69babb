//! In-memory store adapter.
//!
//! Stands in for the remote store in tests and single-process embeddings.
//! Ids are handed out from a sequence counter.

use crate::domain::{hash_index, KeywordSet};
use crate::ports::{
    OptionDocument, OptionsKey, ProcedureStore, ResponseMeta, StoreError, StoreResponse,
};
use parking_lot::RwLock;
use qcf_types::{KeywordSetId, Molecule, ObjectId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Number of calls received per store operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCallCounts {
    pub get_molecules: u64,
    pub add_molecules: u64,
    pub get_options: u64,
}

#[derive(Default)]
struct StoreState {
    next_sequence: u64,
    molecules: HashMap<ObjectId, Molecule>,
    /// Content hash of an id-less molecule -> id.
    molecule_index: HashMap<String, ObjectId>,
    /// Keyword-set hash index -> id.
    keyword_index: HashMap<String, ObjectId>,
    options: HashMap<OptionsKey, OptionDocument>,
}

impl StoreState {
    fn allocate_id(&mut self) -> ObjectId {
        self.next_sequence += 1;
        ObjectId::from_sequence(self.next_sequence)
    }
}

/// In-memory `ProcedureStore`.
///
/// Deduplicates molecules by content and keyword sets by hash index.
/// Production deployments talk to the remote store instead.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    get_molecules_calls: AtomicU64,
    add_molecules_calls: AtomicU64,
    get_options_calls: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named option set for `program`.
    ///
    /// Keyword sets with an equal hash index share one id. Program names
    /// are matched case-insensitively.
    pub fn add_options(&self, program: &str, name: &str, keywords: KeywordSet) -> ObjectId {
        let mut state = self.state.write();

        let existing = state.keyword_index.get(keywords.hash_index()).cloned();
        let id = match existing {
            Some(id) => id,
            None => {
                let id = state.allocate_id();
                state
                    .keyword_index
                    .insert(keywords.hash_index().to_string(), id.clone());
                id
            }
        };

        let key = OptionsKey::new(program.to_lowercase(), name);
        let document = OptionDocument {
            program: key.program.clone(),
            name: name.to_string(),
            keywords: keywords.with_id(KeywordSetId::Object(id.clone())),
        };
        state.options.insert(key, document);
        id
    }

    /// Register a single molecule outside of a batch.
    pub fn insert_molecule(&self, molecule: Molecule) -> Result<ObjectId, StoreError> {
        let mut state = self.state.write();
        Self::register(&mut state, molecule).map(|(id, _)| id)
    }

    pub fn molecule_count(&self) -> usize {
        self.state.read().molecules.len()
    }

    pub fn call_counts(&self) -> StoreCallCounts {
        StoreCallCounts {
            get_molecules: self.get_molecules_calls.load(Ordering::Relaxed),
            add_molecules: self.add_molecules_calls.load(Ordering::Relaxed),
            get_options: self.get_options_calls.load(Ordering::Relaxed),
        }
    }

    /// Insert or find a molecule; the flag is true when it already existed.
    fn register(state: &mut StoreState, molecule: Molecule) -> Result<(ObjectId, bool), StoreError> {
        let content = molecule.without_id();
        let value = serde_json::to_value(&content).map_err(|e| StoreError::SerializationError {
            message: e.to_string(),
        })?;
        let digest = hash_index(&value);

        if let Some(existing) = state.molecule_index.get(&digest).cloned() {
            return Ok((existing, true));
        }

        let id = state.allocate_id();
        state.molecule_index.insert(digest, id.clone());
        state.molecules.insert(id.clone(), content.with_id(id.clone()));
        Ok((id, false))
    }
}

impl ProcedureStore for InMemoryStore {
    fn get_molecules(&self, ids: &[ObjectId]) -> Result<StoreResponse<Vec<Molecule>>, StoreError> {
        self.get_molecules_calls.fetch_add(1, Ordering::Relaxed);
        let state = self.state.read();

        let mut meta = ResponseMeta {
            success: true,
            ..Default::default()
        };
        let mut data = Vec::with_capacity(ids.len());
        for id in ids {
            match state.molecules.get(id) {
                Some(molecule) => data.push(molecule.clone()),
                None => meta.missing.push(id.to_string()),
            }
        }
        meta.n_found = data.len();

        debug!(requested = ids.len(), found = meta.n_found, "get_molecules");
        Ok(StoreResponse { meta, data })
    }

    fn add_molecules(
        &self,
        molecules: BTreeMap<String, Molecule>,
    ) -> Result<StoreResponse<BTreeMap<String, ObjectId>>, StoreError> {
        self.add_molecules_calls.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.write();

        let mut meta = ResponseMeta {
            success: true,
            ..Default::default()
        };
        let mut data = BTreeMap::new();
        for (key, molecule) in molecules {
            let (id, existed) = Self::register(&mut state, molecule)?;
            if existed {
                meta.duplicates.push(key.clone());
            } else {
                meta.n_inserted += 1;
            }
            data.insert(key, id);
        }

        debug!(
            inserted = meta.n_inserted,
            duplicates = meta.duplicates.len(),
            "add_molecules"
        );
        Ok(StoreResponse { meta, data })
    }

    fn get_options(
        &self,
        requests: &[OptionsKey],
    ) -> Result<StoreResponse<Vec<OptionDocument>>, StoreError> {
        self.get_options_calls.fetch_add(1, Ordering::Relaxed);
        let state = self.state.read();

        let mut meta = ResponseMeta {
            success: true,
            ..Default::default()
        };
        let mut data = Vec::with_capacity(requests.len());
        for request in requests {
            let key = OptionsKey::new(request.program.to_lowercase(), request.name.clone());
            match state.options.get(&key) {
                Some(document) => data.push(document.clone()),
                None => meta.missing.push(format!("{}/{}", request.program, request.name)),
            }
        }
        meta.n_found = data.len();

        Ok(StoreResponse { meta, data })
    }
}
