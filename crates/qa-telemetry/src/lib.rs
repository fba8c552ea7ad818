//! # Achievements Telemetry
//!
//! Logging setup shared by the gateway binary and its tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qa_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     // Your application code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QA_SERVICE_NAME` | `qa-gateway` | Service name in logs |
//! | `QA_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `QA_JSON_LOGS` | `false` (`true` in containers) | JSON output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
