//! Adapters for the gateway.
//!
//! Infrastructure implementations of the outbound ports.

mod error_conversions;
pub mod feed;
pub mod identity;
pub mod local;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod pending;
pub mod qtum_rpc;

pub use feed::{HttpActivityFeed, LogOnlyFeed};
pub use identity::{JwtAccessTokenIssuer, JwtIdentityVerifier};
pub use local::LocalAddressConversion;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{InMemoryChain, InMemoryFeed, StaticIdentityVerifier};
pub use pending::InMemoryPendingStore;
pub use qtum_rpc::{QtumRpcClient, QtumRpcConfig};
