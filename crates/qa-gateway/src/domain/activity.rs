//! Activity feed events.
//!
//! An event mirrors one accepted transaction: `actor` did `verb` to `object`,
//! and `target` is the transaction id that carries it on chain.

use crate::domain::types::TransactionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Feed verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Register,
    Confirm,
    Create,
    Update,
    Withdraw,
    Support,
    Deposit,
}

impl Verb {
    /// `create` for a first version, `update` when it supersedes a previous link.
    pub fn for_creation(previous_link: Option<&str>) -> Self {
        match previous_link {
            Some(link) if !link.is_empty() => Verb::Update,
            _ => Verb::Create,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Register => "register",
            Verb::Confirm => "confirm",
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Withdraw => "withdraw",
            Verb::Support => "support",
            Verb::Deposit => "deposit",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write-once feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub actor: String,
    pub object: String,
    pub target: TransactionId,
    pub verb: Verb,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_name: Option<String>,
}

impl ActivityEvent {
    pub fn new(
        verb: Verb,
        actor: impl Into<String>,
        object: impl Into<String>,
        target: TransactionId,
    ) -> Self {
        Self {
            actor: actor.into(),
            object: object.into(),
            target,
            verb,
            name: None,
            witness: None,
            witness_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_witness(mut self, witness: impl Into<String>, witness_name: Option<String>) -> Self {
        self.witness = Some(witness.into());
        self.witness_name = witness_name;
        self
    }
}
