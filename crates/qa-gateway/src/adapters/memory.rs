//! In-memory collaborators for tests. Built with `cfg(test)` or the
//! `test-util` feature.
//!
//! [`InMemoryChain`] behaves like a Qtum node hosting the three contracts:
//! it decodes calldata, answers registry and achievements reads, and applies
//! `register`/`initRewards` as soon as they are submitted. Depth only grows
//! when [`InMemoryChain::mine`] is called (or on every poll with auto-mine).

use crate::domain::abi::{self, decode, encode_tokens, split_call, ParamType, Token};
use crate::domain::address::{decode_display, encode_display};
use crate::domain::contracts::{achievements, registry, rewards};
use crate::domain::{
    ActivityEvent, AuthToken, CanonicalAddress, DisplayAddress, Identity, Network, RawTransaction,
    RegisteredUser, SubmitOptions, TransactionId,
};
use crate::ports::{AuthError, ChainError, ChainNode, FeedError, IdentityVerifier, ActivityFeed};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use primitive_types::U256;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

const SIGNATURES: &[&str] = &[
    registry::ACCOUNT_EXISTS,
    registry::EXISTS,
    registry::GET_ADDRESS_BY_ACCOUNT,
    registry::GET_USERS_COUNT,
    registry::GET_USER_BY_INDEX,
    registry::REGISTER,
    achievements::CONFIRM_FROM,
    achievements::CREATE_FROM,
    achievements::REWARDS,
    achievements::INIT_REWARDS,
    rewards::WITHDRAW,
    rewards::SUPPORT,
    rewards::DEPOSIT,
];

/// Signature whose selector starts `data`.
pub fn signature_of(data: &[u8]) -> Option<&'static str> {
    let (sel, _) = split_call(data).ok()?;
    SIGNATURES.iter().copied().find(|sig| abi::selector(sig) == sel)
}

/// One accepted `sendtocontract`.
#[derive(Debug, Clone)]
pub struct Submission {
    pub txid: TransactionId,
    pub contract: CanonicalAddress,
    pub signature: Option<&'static str>,
    pub data: Vec<u8>,
    pub options: SubmitOptions,
}

impl Submission {
    /// Method name, or `"unknown"` for an unrecognised selector.
    pub fn method(&self) -> &'static str {
        self.signature
            .and_then(|sig| sig.split_once('('))
            .map(|(name, _)| name)
            .unwrap_or("unknown")
    }
}

/// Per-RPC call counters.
#[derive(Debug, Default)]
pub struct ChainStats {
    conversions: AtomicU64,
    calls: AtomicU64,
    submissions: AtomicU64,
    raw_relays: AtomicU64,
    confirmation_polls: AtomicU64,
}

impl ChainStats {
    pub fn conversions(&self) -> u64 {
        self.conversions.load(Ordering::Relaxed)
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::Relaxed)
    }

    pub fn raw_relays(&self) -> u64 {
        self.raw_relays.load(Ordering::Relaxed)
    }

    pub fn confirmation_polls(&self) -> u64 {
        self.confirmation_polls.load(Ordering::Relaxed)
    }

    /// Any RPC at all.
    pub fn total(&self) -> u64 {
        self.conversions() + self.calls() + self.submissions() + self.raw_relays()
    }
}

#[derive(Debug, Default)]
struct ChainState {
    users: Vec<RegisteredUser>,
    rewards: CanonicalAddress,
    submissions: Vec<Submission>,
    raw: Vec<RawTransaction>,
    depths: HashMap<TransactionId, u64>,
    next_tx: u64,
}

impl ChainState {
    fn address_of(&self, account: &str) -> CanonicalAddress {
        self.users
            .iter()
            .find(|u| u.account == account)
            .map(|u| u.address)
            .unwrap_or(CanonicalAddress::ZERO)
    }

    fn new_txid(&mut self) -> TransactionId {
        self.next_tx += 1;
        let txid = TransactionId::new(format!("{:064x}", self.next_tx));
        self.depths.insert(txid.clone(), 0);
        txid
    }
}

/// Fake Qtum node.
#[derive(Debug, Default)]
pub struct InMemoryChain {
    network: Network,
    state: RwLock<ChainState>,
    stats: ChainStats,
    fail_submissions: Mutex<Option<String>>,
    fail_confirmations: AtomicBool,
    auto_mine: AtomicBool,
}

impl InMemoryChain {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    pub fn stats(&self) -> &ChainStats {
        &self.stats
    }

    /// Put a user straight into the registry.
    pub fn seed_user(&self, address: CanonicalAddress, account: &str, name: &str) {
        self.state.write().users.push(RegisteredUser {
            address,
            account: account.to_string(),
            name: name.to_string(),
        });
    }

    pub fn set_rewards(&self, address: CanonicalAddress) {
        self.state.write().rewards = address;
    }

    pub fn users(&self) -> Vec<RegisteredUser> {
        self.state.read().users.clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.read().submissions.clone()
    }

    pub fn raw_transactions(&self) -> Vec<RawTransaction> {
        self.state.read().raw.clone()
    }

    /// Add one confirmation to every known transaction.
    pub fn mine(&self) {
        for depth in self.state.write().depths.values_mut() {
            *depth += 1;
        }
    }

    /// Mine a block before answering every confirmation poll.
    pub fn set_auto_mine(&self, enabled: bool) {
        self.auto_mine.store(enabled, Ordering::SeqCst);
    }

    /// Reject every `sendtocontract` with `message` (`None` to stop).
    pub fn fail_submissions(&self, message: Option<&str>) {
        *self.fail_submissions.lock() = message.map(str::to_string);
    }

    /// Make confirmation polls error out.
    pub fn fail_confirmations(&self, enabled: bool) {
        self.fail_confirmations.store(enabled, Ordering::SeqCst);
    }

    fn execute_read(&self, data: &[u8]) -> Result<Vec<u8>, ChainError> {
        let (_, args) = split_call(data).map_err(|e| ChainError::Execution(e.to_string()))?;
        let signature = signature_of(data)
            .ok_or_else(|| ChainError::Execution("unknown selector".to_string()))?;
        let state = self.state.read();
        let bad_args = |e: abi::AbiError| ChainError::Execution(e.to_string());

        let tokens = match signature {
            registry::ACCOUNT_EXISTS => {
                let account = string_arg(decode(&[ParamType::String], args).map_err(bad_args)?);
                vec![Token::Bool(!state.address_of(&account).is_zero())]
            }
            registry::EXISTS => {
                let address = address_arg(decode(&[ParamType::Address], args).map_err(bad_args)?);
                vec![Token::Bool(state.users.iter().any(|u| u.address == address))]
            }
            registry::GET_ADDRESS_BY_ACCOUNT => {
                let account = string_arg(decode(&[ParamType::String], args).map_err(bad_args)?);
                vec![Token::Address(state.address_of(&account))]
            }
            registry::GET_USERS_COUNT => vec![Token::Uint(U256::from(state.users.len() as u64))],
            registry::GET_USER_BY_INDEX => {
                let index = decode(&[ParamType::Uint], args)
                    .map_err(bad_args)?
                    .into_iter()
                    .next()
                    .and_then(Token::into_uint)
                    .unwrap_or_default();
                let user = state
                    .users
                    .get(index.low_u64() as usize)
                    .ok_or_else(|| ChainError::Execution("Revert".to_string()))?;
                vec![
                    Token::Address(user.address),
                    Token::String(user.account.clone()),
                    Token::String(user.name.clone()),
                ]
            }
            achievements::REWARDS => vec![Token::Address(state.rewards)],
            other => {
                return Err(ChainError::Execution(format!("{} is not a view", other)));
            }
        };

        Ok(encode_tokens(&tokens))
    }

    fn apply_write(state: &mut ChainState, signature: Option<&'static str>, data: &[u8]) {
        let Ok((_, args)) = split_call(data) else {
            return;
        };
        match signature {
            Some(registry::REGISTER) => {
                let types = [ParamType::Address, ParamType::String, ParamType::String];
                if let Ok(tokens) = decode(&types, args) {
                    let mut it = tokens.into_iter();
                    if let (Some(Token::Address(address)), Some(Token::String(account)), Some(Token::String(name))) =
                        (it.next(), it.next(), it.next())
                    {
                        state.users.push(RegisteredUser { address, account, name });
                    }
                }
            }
            Some(achievements::INIT_REWARDS) => {
                if let Ok(tokens) = decode(&[ParamType::Address], args) {
                    state.rewards = address_arg(tokens);
                }
            }
            _ => {}
        }
    }
}

fn string_arg(tokens: Vec<Token>) -> String {
    tokens
        .into_iter()
        .next()
        .and_then(Token::into_string)
        .unwrap_or_default()
}

fn address_arg(tokens: Vec<Token>) -> CanonicalAddress {
    tokens
        .into_iter()
        .next()
        .and_then(Token::into_address)
        .unwrap_or(CanonicalAddress::ZERO)
}

#[async_trait]
impl ChainNode for InMemoryChain {
    async fn get_hex_address(&self, address: &DisplayAddress) -> Result<CanonicalAddress, ChainError> {
        self.stats.conversions.fetch_add(1, Ordering::Relaxed);
        decode_display(address.as_str(), self.network).map_err(|e| ChainError::Rpc {
            code: -5,
            message: e.to_string(),
        })
    }

    async fn from_hex_address(&self, address: &CanonicalAddress) -> Result<DisplayAddress, ChainError> {
        self.stats.conversions.fetch_add(1, Ordering::Relaxed);
        Ok(encode_display(address, self.network))
    }

    async fn call_contract(
        &self,
        _contract: &CanonicalAddress,
        data: &[u8],
    ) -> Result<Vec<u8>, ChainError> {
        self.stats.calls.fetch_add(1, Ordering::Relaxed);
        self.execute_read(data)
    }

    async fn send_to_contract(
        &self,
        contract: &CanonicalAddress,
        data: &[u8],
        options: &SubmitOptions,
    ) -> Result<TransactionId, ChainError> {
        self.stats.submissions.fetch_add(1, Ordering::Relaxed);
        if let Some(message) = self.fail_submissions.lock().clone() {
            return Err(ChainError::Rpc { code: -4, message });
        }

        let signature = signature_of(data);
        let mut state = self.state.write();
        let txid = state.new_txid();
        Self::apply_write(&mut state, signature, data);
        state.submissions.push(Submission {
            txid: txid.clone(),
            contract: *contract,
            signature,
            data: data.to_vec(),
            options: options.clone(),
        });
        Ok(txid)
    }

    async fn decode_raw_transaction(
        &self,
        raw: &RawTransaction,
    ) -> Result<serde_json::Value, ChainError> {
        self.stats.calls.fetch_add(1, Ordering::Relaxed);
        hex::decode(raw.as_hex()).map_err(|_| ChainError::Rpc {
            code: -22,
            message: "TX decode failed".to_string(),
        })?;
        Ok(serde_json::json!({ "hex": raw.as_hex(), "vin": [], "vout": [] }))
    }

    async fn send_raw_transaction(&self, raw: &RawTransaction) -> Result<TransactionId, ChainError> {
        self.stats.raw_relays.fetch_add(1, Ordering::Relaxed);
        hex::decode(raw.as_hex()).map_err(|_| ChainError::Rpc {
            code: -22,
            message: "TX decode failed".to_string(),
        })?;
        let mut state = self.state.write();
        let txid = state.new_txid();
        state.raw.push(raw.clone());
        Ok(txid)
    }

    async fn confirmations(&self, txid: &TransactionId) -> Result<Option<u64>, ChainError> {
        self.stats.confirmation_polls.fetch_add(1, Ordering::Relaxed);
        if self.fail_confirmations.load(Ordering::SeqCst) {
            return Err(ChainError::Transport("connection refused".to_string()));
        }
        if self.auto_mine.load(Ordering::SeqCst) {
            self.mine();
        }
        Ok(self.state.read().depths.get(txid).copied())
    }
}

/// Feed sink that keeps every event.
#[derive(Debug, Default)]
pub struct InMemoryFeed {
    events: Mutex<Vec<ActivityEvent>>,
    failing: AtomicBool,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().clone()
    }

    /// Make the sink reject events.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ActivityFeed for InMemoryFeed {
    async fn add_activity(&self, event: &ActivityEvent) -> Result<(), FeedError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FeedError::Rejected(503));
        }
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Identity verifier backed by a fixed table of identity → (token, name).
#[derive(Debug, Default)]
pub struct StaticIdentityVerifier {
    users: RwLock<HashMap<Identity, (String, String)>>,
    validations: AtomicU64,
}

impl StaticIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, identity: &str, token: &str, name: &str) -> Self {
        self.add_user(identity, token, name);
        self
    }

    pub fn add_user(&self, identity: &str, token: &str, name: &str) {
        self.users
            .write()
            .insert(Identity::new(identity), (token.to_string(), name.to_string()));
    }

    /// Number of `validate_token` calls so far.
    pub fn validations(&self) -> u64 {
        self.validations.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn validate_token(&self, identity: &Identity, token: &AuthToken) -> bool {
        self.validations.fetch_add(1, Ordering::Relaxed);
        self.users
            .read()
            .get(identity)
            .is_some_and(|(expected, _)| expected == token.expose())
    }

    async fn profile_name(&self, identity: &Identity) -> Result<String, AuthError> {
        Ok(self
            .users
            .read()
            .get(identity)
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| identity.to_string()))
    }
}
