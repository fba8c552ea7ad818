//! # Achievements Gateway Runtime
//!
//! Startup pieces for the `qa-gateway` binary.
//!
//! ## Startup Sequence
//!
//! 1. Parse flags / `QA_*` environment ([`cli::Args`])
//! 2. Install logging (`qa-telemetry`)
//! 3. Load the JSON config file, apply overrides, validate
//! 4. Build the adapters ([`wiring::collaborators`])
//! 5. Serve until Ctrl+C, then shut down gracefully

pub mod cli;
pub mod wiring;

pub use cli::Args;
pub use wiring::collaborators;
