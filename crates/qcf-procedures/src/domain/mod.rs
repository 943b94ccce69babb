//! # Domain Layer
//!
//! Pure canonicalization and task-shaping logic.
//!
//! - `normalizer`, `hashing`: canonical form and content identity
//! - `keyword_set`: the OptionSet entity
//! - `specification`: closed computation descriptors
//! - `task`: batch description, skeletons and exchange schema
//!
//! This module contains NO I/O. Store access goes through `ports`.

pub mod config;
pub mod errors;
pub mod hashing;
pub mod keyword_set;
pub mod normalizer;
pub mod specification;
pub mod task;

pub use config::*;
pub use errors::*;
pub use hashing::*;
pub use keyword_set::*;
pub use normalizer::*;
pub use specification::*;
pub use task::*;
