//! # QCF Types Crate
//!
//! Value types shared by every crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Store-assigned identity**: `ObjectId` values are handed out by the
//!   persistent store. This crate validates them but never invents them.
//! - **Closed vs. open entities**: descriptors reject unknown fields,
//!   molecules and keyword sets carry arbitrary extras through untouched.
//! - **Frozen after construction**: fields that participate in identity are
//!   private; a "modified" value is always a new value.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
