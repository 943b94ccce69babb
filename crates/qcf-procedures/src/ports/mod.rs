//! # Ports Layer
//!
//! - **Driving Ports (Inbound)**: `ProcedureApi`, consumed by the service
//!   that receives submissions.
//! - **Driven Ports (Outbound)**: the batched store, the basis-name
//!   canonicalizer and the task-key formatter.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
