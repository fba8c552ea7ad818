//! Typed read-only contract calls.

use crate::domain::abi::{decode, ParamType, Token};
use crate::domain::config::ContractsConfig;
use crate::domain::{CanonicalAddress, ContractCall, GatewayError, GatewayResult, RegisteredUser};
use crate::ports::ChainNode;
use primitive_types::U256;
use std::sync::Arc;
use tracing::warn;

/// Reads the registry and achievements contracts through `callcontract`.
/// Results are never cached.
pub struct ContractReader {
    chain: Arc<dyn ChainNode>,
    contracts: ContractsConfig,
}

impl ContractReader {
    pub fn new(chain: Arc<dyn ChainNode>, contracts: ContractsConfig) -> Self {
        Self { chain, contracts }
    }

    pub fn contracts(&self) -> &ContractsConfig {
        &self.contracts
    }

    async fn read(&self, call: ContractCall, outputs: &[ParamType]) -> GatewayResult<Vec<Token>> {
        let method = call.method();
        let output = self
            .chain
            .call_contract(&call.contract, &call.calldata())
            .await
            .map_err(|e| {
                warn!(method, error = %e, "callcontract failed");
                GatewayError::Contract(format!("{}: {}", method, e))
            })?;

        let tokens = decode(outputs, &output)
            .map_err(|e| GatewayError::Contract(format!("{} returned bad data: {}", method, e)))?;
        Ok(tokens)
    }

    async fn read_one(&self, call: ContractCall, output: ParamType) -> GatewayResult<Token> {
        let method = call.method();
        self.read(call, &[output])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Contract(format!("{} returned nothing", method)))
    }

    pub async fn account_exists(&self, account: &str) -> GatewayResult<bool> {
        let call = ContractCall::account_exists(self.contracts.registry, account);
        bool_of(self.read_one(call, ParamType::Bool).await?)
    }

    pub async fn address_exists(&self, address: CanonicalAddress) -> GatewayResult<bool> {
        let call = ContractCall::exists(self.contracts.registry, address);
        bool_of(self.read_one(call, ParamType::Bool).await?)
    }

    /// Zero address when the account is unknown.
    pub async fn address_by_account(&self, account: &str) -> GatewayResult<CanonicalAddress> {
        let call = ContractCall::address_by_account(self.contracts.registry, account);
        address_of(self.read_one(call, ParamType::Address).await?)
    }

    pub async fn users_count(&self) -> GatewayResult<u64> {
        let call = ContractCall::users_count(self.contracts.registry);
        let count = self
            .read_one(call, ParamType::Uint)
            .await?
            .into_uint()
            .ok_or_else(|| unexpected("getUsersCount"))?;
        if count > U256::from(u64::MAX) {
            return Err(GatewayError::Contract(format!("user count {} out of range", count)));
        }
        Ok(count.as_u64())
    }

    pub async fn user_by_index(&self, index: u64) -> GatewayResult<RegisteredUser> {
        let call = ContractCall::user_by_index(self.contracts.registry, index);
        let mut tokens = self
            .read(call, &[ParamType::Address, ParamType::String, ParamType::String])
            .await?
            .into_iter();

        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(Token::Address(address)), Some(Token::String(account)), Some(Token::String(name))) => {
                Ok(RegisteredUser { address, account, name })
            }
            _ => Err(unexpected("getUserByIndex")),
        }
    }

    /// Rewards contract the achievements contract points at (zero if unset).
    pub async fn rewards_address(&self) -> GatewayResult<CanonicalAddress> {
        let call = ContractCall::rewards_address(self.contracts.achievements);
        address_of(self.read_one(call, ParamType::Address).await?)
    }
}

fn unexpected(method: &str) -> GatewayError {
    GatewayError::Contract(format!("{} returned an unexpected type", method))
}

fn bool_of(token: Token) -> GatewayResult<bool> {
    token.into_bool().ok_or_else(|| unexpected("bool read"))
}

fn address_of(token: Token) -> GatewayResult<CanonicalAddress> {
    token.into_address().ok_or_else(|| unexpected("address read"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryChain;
    use crate::domain::{ErrorKind, Network};

    fn reader() -> (Arc<InMemoryChain>, ContractReader) {
        let chain = Arc::new(InMemoryChain::new(Network::Testnet));
        let contracts = ContractsConfig {
            registry: CanonicalAddress::from_bytes([1; 20]),
            achievements: CanonicalAddress::from_bytes([2; 20]),
            rewards: CanonicalAddress::from_bytes([3; 20]),
        };
        (chain.clone(), ContractReader::new(chain, contracts))
    }

    #[tokio::test]
    async fn test_registry_reads() {
        let (chain, reader) = reader();
        let alice = CanonicalAddress::from_bytes([0xa0; 20]);
        chain.seed_user(alice, "alice", "Alice");

        assert!(reader.account_exists("alice").await.unwrap());
        assert!(!reader.account_exists("bob").await.unwrap());
        assert!(reader.address_exists(alice).await.unwrap());
        assert_eq!(reader.address_by_account("alice").await.unwrap(), alice);
        assert!(reader.address_by_account("bob").await.unwrap().is_zero());
        assert_eq!(reader.users_count().await.unwrap(), 1);

        let user = reader.user_by_index(0).await.unwrap();
        assert_eq!(user.account, "alice");
        assert_eq!(user.name, "Alice");
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_contract_error() {
        let (_, reader) = reader();
        let err = reader.user_by_index(7).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractError);
    }

    #[tokio::test]
    async fn test_rewards_address() {
        let (chain, reader) = reader();
        assert!(reader.rewards_address().await.unwrap().is_zero());
        chain.set_rewards(CanonicalAddress::from_bytes([3; 20]));
        assert_eq!(
            reader.rewards_address().await.unwrap(),
            CanonicalAddress::from_bytes([3; 20])
        );
    }
}
