//! Core value types shared by the gateway layers.

use crate::domain::address::{CanonicalAddress, DisplayAddress};
use crate::domain::contracts::ContractCall;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque client identity. Only ever passed to the verifier or used as a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Auth token proving control of an [`Identity`]. Never logged.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Transaction id returned by the node (64 hex chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(txid: impl Into<String>) -> Self {
        Self(txid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pre-signed transaction supplied by a caller, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RawTransaction(String);

impl RawTransaction {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// Sender options applied to every contract submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitOptions {
    /// Gas limit per call
    pub gas_limit: u64,
    /// Gas price in QTUM
    pub gas_price: f64,
    /// Value sent with the call in QTUM
    pub amount: f64,
    /// Wallet address the node signs with (node default when `None`)
    pub sender: Option<String>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            gas_limit: 250_000,
            gas_price: 0.0000004,
            amount: 0.0,
            sender: None,
        }
    }
}

/// A submitted contract call: the id plus what was sent.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub txid: TransactionId,
    pub call: ContractCall,
}

/// One row of the registry's user enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUser {
    pub address: CanonicalAddress,
    pub account: String,
    pub name: String,
}

/// Registry user rendered for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListing {
    pub user_address: DisplayAddress,
    pub user_account: String,
    pub user_name: String,
}

/// Where a mutating request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStage {
    Validating,
    OwnershipChecked,
    Submitted,
    Recorded,
    Responded,
    ConfirmPending,
    Cleared,
}

impl OperationStage {
    /// Failures before submission never touched the chain.
    pub fn is_pre_submission(self) -> bool {
        matches!(self, OperationStage::Validating | OperationStage::OwnershipChecked)
    }
}

impl fmt::Display for OperationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationStage::Validating => "validating",
            OperationStage::OwnershipChecked => "ownership_checked",
            OperationStage::Submitted => "submitted",
            OperationStage::Recorded => "recorded",
            OperationStage::Responded => "responded",
            OperationStage::ConfirmPending => "confirm_pending",
            OperationStage::Cleared => "cleared",
        };
        f.write_str(name)
    }
}
