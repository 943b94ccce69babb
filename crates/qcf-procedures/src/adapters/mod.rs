//! Adapters Layer
//!
//! - `DefaultBasisNormalizer`: alias-free basis canonicalization
//! - `CanonicalResultIndexer`: content-hash task keys
//! - `InMemoryStore`: `ProcedureStore` for tests and embedded use

pub mod basis;
pub mod indexer;
pub mod memory;

pub use basis::DefaultBasisNormalizer;
pub use indexer::CanonicalResultIndexer;
pub use memory::{InMemoryStore, StoreCallCounts};
