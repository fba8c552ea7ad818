//! Achievements Gateway - HTTP front end for the Qtum achievements contracts.
//!
//! Client applications register accounts, prove they own a Qtum address and
//! submit achievement, support and reward transactions through this crate.
//! Every accepted transaction is mirrored into an external activity feed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        ACHIEVEMENTS GATEWAY                          │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │   HTTP (axum)   Tracing → CORS → BodyLimit → routes                 │
//! │        │                                                            │
//! │   ┌────┴─────────────────────── Gateway ──────────────────────────┐ │
//! │   │ OwnershipVerifier ── AddressCodec ── ContractReader           │ │
//! │   │ PendingRegistrationTracker ── ConfirmationWatcher (detached)  │ │
//! │   │ TransactionOrchestrator ── ActivityRecorder                   │ │
//! │   └────┬──────────────┬──────────────┬──────────────┬─────────────┘ │
//! └────────┼──────────────┼──────────────┼──────────────┼───────────────┘
//!          ▼              ▼              ▼              ▼
//!     Qtum node      identity svc    access tokens   activity feed
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use qa_gateway::{Collaborators, GatewayConfig, GatewayServer};
//!
//! let server = GatewayServer::new(config, collaborators)?;
//! let mut running = server.start().await?;
//! tokio::signal::ctrl_c().await?;
//! running.shutdown();
//! running.wait().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod http;
pub mod middleware;
pub mod ports;
pub mod schema;
pub mod service;

// Re-exports for public API
pub use domain::config::GatewayConfig;
pub use domain::error::{ApiError, ErrorKind, GatewayError, GatewayResult};
pub use domain::types::*;
pub use http::{build_router, GatewayServer, RunningServer};
pub use middleware::GatewayMetrics;
pub use service::{Collaborators, Gateway};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
