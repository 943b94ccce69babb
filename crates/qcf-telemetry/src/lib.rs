//! # QCF Telemetry
//!
//! Tracing subscriber setup and structured logging helpers for the QCF
//! procedure crates.
//!
//! Library crates only emit `tracing` events. The embedding service calls
//! [`init_tracing`] once at startup to decide where those events go.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qcf_telemetry::{init_tracing, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_tracing(&config).expect("Failed to init tracing");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QCF_SERVICE_NAME` | `qcf-procedures` | Service name attached to events |
//! | `QCF_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `QCF_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `QCF_CONSOLE_OUTPUT` | `true` | Emit to stdout at all |

mod config;
mod logging;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{init_for_tests, init_tracing};

/// Re-exported so the logging macros resolve `tracing` from this crate.
pub use tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
