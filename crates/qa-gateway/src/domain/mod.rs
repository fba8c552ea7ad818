//! Domain types for the achievements gateway.
//!
//! Addresses, the ABI codec, contract calls, feed events, configuration and
//! errors. Nothing in here performs I/O.

pub mod abi;
pub mod activity;
pub mod address;
pub mod config;
pub mod contracts;
pub mod correlation;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use activity::{ActivityEvent, Verb};
pub use address::{CanonicalAddress, DisplayAddress, Network};
pub use config::GatewayConfig;
pub use contracts::ContractCall;
pub use correlation::RequestId;
pub use error::{ApiError, ErrorKind, GatewayError, GatewayResult};
pub use types::*;
