//! Outbound (driven) ports for the gateway.
//!
//! These traits define the collaborators the gateway depends on: the Qtum
//! node, the identity service, the access-token issuer, the activity feed
//! and the pending-registration store.

use crate::domain::{
    ActivityEvent, AuthToken, CanonicalAddress, DisplayAddress, Identity, RawTransaction,
    SubmitOptions, TransactionId,
};
use async_trait::async_trait;

/// Node RPC failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    /// Node unreachable or HTTP-level failure
    #[error("node transport error: {0}")]
    Transport(String),
    /// Node answered with a JSON-RPC error
    #[error("node rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// Node answered with something we could not interpret
    #[error("malformed node response: {0}")]
    Malformed(String),
    /// Contract execution threw
    #[error("contract execution failed: {0}")]
    Execution(String),
}

/// Feed sink failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedError {
    #[error("feed transport error: {0}")]
    Transport(String),
    #[error("feed rejected event with status {0}")]
    Rejected(u16),
}

/// Identity service and token failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("profile lookup failed: {0}")]
    Profile(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Qtum node RPC.
#[async_trait]
pub trait ChainNode: Send + Sync {
    /// `gethexaddress`: display form to canonical hash160.
    async fn get_hex_address(&self, address: &DisplayAddress) -> Result<CanonicalAddress, ChainError>;

    /// `fromhexaddress`: canonical hash160 to display form.
    async fn from_hex_address(&self, address: &CanonicalAddress) -> Result<DisplayAddress, ChainError>;

    /// `callcontract`: read-only execution, returns the raw output bytes.
    async fn call_contract(
        &self,
        contract: &CanonicalAddress,
        data: &[u8],
    ) -> Result<Vec<u8>, ChainError>;

    /// `sendtocontract`: signed by the node wallet and broadcast.
    async fn send_to_contract(
        &self,
        contract: &CanonicalAddress,
        data: &[u8],
        options: &SubmitOptions,
    ) -> Result<TransactionId, ChainError>;

    /// `decoderawtransaction`
    async fn decode_raw_transaction(
        &self,
        raw: &RawTransaction,
    ) -> Result<serde_json::Value, ChainError>;

    /// `sendrawtransaction`
    async fn send_raw_transaction(&self, raw: &RawTransaction) -> Result<TransactionId, ChainError>;

    /// Confirmation depth, `None` while the node does not know the transaction.
    async fn confirmations(&self, txid: &TransactionId) -> Result<Option<u64>, ChainError>;
}

/// Identity (auth) service.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Whether `token` proves control of `identity`. Never errors; any
    /// verification failure is simply `false`.
    async fn validate_token(&self, identity: &Identity, token: &AuthToken) -> bool;

    /// Human-readable profile name for `identity`.
    async fn profile_name(&self, identity: &Identity) -> Result<String, AuthError>;
}

/// Issues access tokens bound to a verified display address.
pub trait AccessTokenIssuer: Send + Sync {
    fn issue(&self, address: &DisplayAddress) -> Result<String, AuthError>;
}

/// Activity feed sink.
#[async_trait]
pub trait ActivityFeed: Send + Sync {
    async fn add_activity(&self, event: &ActivityEvent) -> Result<(), FeedError>;
}

/// Backing store for in-flight registrations.
///
/// `try_insert` must be atomic: of two concurrent calls for one identity,
/// exactly one returns `true`.
pub trait PendingStore: Send + Sync {
    fn try_insert(&self, identity: &Identity) -> bool;

    /// Returns whether an entry was present.
    fn remove(&self, identity: &Identity) -> bool;

    fn contains(&self, identity: &Identity) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
