//! Contract method signatures and call construction.
//!
//! | Contract | Reads | Writes |
//! |----------|-------|--------|
//! | Registry | `accountExists`, `exists`, `getAddressByAccount`, `getUsersCount`, `getUserByIndex` | `register` |
//! | Achievements | `rewards` | `confirmFrom`, `createFrom`, `initRewards` |
//! | Rewards | - | `withdraw` (gateway), `support`/`deposit` (client-signed) |

use crate::domain::abi::{self, keccak256, Token};
use crate::domain::address::CanonicalAddress;
use primitive_types::U256;

/// Account registry contract.
pub mod registry {
    pub const ACCOUNT_EXISTS: &str = "accountExists(string)";
    pub const EXISTS: &str = "exists(address)";
    pub const GET_ADDRESS_BY_ACCOUNT: &str = "getAddressByAccount(string)";
    pub const GET_USERS_COUNT: &str = "getUsersCount()";
    pub const GET_USER_BY_INDEX: &str = "getUserByIndex(uint256)";
    pub const REGISTER: &str = "register(address,string,string)";
}

/// Achievements contract.
pub mod achievements {
    pub const CONFIRM_FROM: &str = "confirmFrom(address,string)";
    pub const CREATE_FROM: &str = "createFrom(address,string,bytes32,string,string)";
    pub const REWARDS: &str = "rewards()";
    pub const INIT_REWARDS: &str = "initRewards(address)";
}

/// Rewards contract.
pub mod rewards {
    pub const WITHDRAW: &str = "withdraw(string,address)";
    pub const SUPPORT: &str = "support(string)";
    pub const DEPOSIT: &str = "deposit(string,address)";
}

/// A contract method invocation, ready to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: CanonicalAddress,
    pub signature: &'static str,
    pub args: Vec<Token>,
}

impl ContractCall {
    pub fn new(contract: CanonicalAddress, signature: &'static str, args: Vec<Token>) -> Self {
        Self {
            contract,
            signature,
            args,
        }
    }

    /// Method name without the parameter list.
    pub fn method(&self) -> &'static str {
        self.signature
            .split_once('(')
            .map(|(name, _)| name)
            .unwrap_or(self.signature)
    }

    /// Selector plus encoded arguments.
    pub fn calldata(&self) -> Vec<u8> {
        abi::encode_call(self.signature, &self.args)
    }

    // Registry writes

    pub fn register(registry: CanonicalAddress, address: CanonicalAddress, account: &str, name: &str) -> Self {
        Self::new(
            registry,
            registry::REGISTER,
            vec![
                Token::Address(address),
                Token::String(account.to_string()),
                Token::String(name.to_string()),
            ],
        )
    }

    // Registry reads

    pub fn account_exists(registry: CanonicalAddress, account: &str) -> Self {
        Self::new(registry, registry::ACCOUNT_EXISTS, vec![Token::String(account.to_string())])
    }

    pub fn exists(registry: CanonicalAddress, address: CanonicalAddress) -> Self {
        Self::new(registry, registry::EXISTS, vec![Token::Address(address)])
    }

    pub fn address_by_account(registry: CanonicalAddress, account: &str) -> Self {
        Self::new(
            registry,
            registry::GET_ADDRESS_BY_ACCOUNT,
            vec![Token::String(account.to_string())],
        )
    }

    pub fn users_count(registry: CanonicalAddress) -> Self {
        Self::new(registry, registry::GET_USERS_COUNT, Vec::new())
    }

    pub fn user_by_index(registry: CanonicalAddress, index: u64) -> Self {
        Self::new(registry, registry::GET_USER_BY_INDEX, vec![Token::Uint(U256::from(index))])
    }

    // Achievements

    pub fn confirm_from(achievements: CanonicalAddress, address: CanonicalAddress, link: &str) -> Self {
        Self::new(
            achievements,
            achievements::CONFIRM_FROM,
            vec![Token::Address(address), Token::String(link.to_string())],
        )
    }

    pub fn create_from(
        achievements: CanonicalAddress,
        address: CanonicalAddress,
        link: &str,
        content_hash: [u8; 32],
        title: &str,
        previous_link: &str,
    ) -> Self {
        Self::new(
            achievements,
            achievements::CREATE_FROM,
            vec![
                Token::Address(address),
                Token::String(link.to_string()),
                Token::FixedBytes32(content_hash),
                Token::String(title.to_string()),
                Token::String(previous_link.to_string()),
            ],
        )
    }

    pub fn rewards_address(achievements: CanonicalAddress) -> Self {
        Self::new(achievements, achievements::REWARDS, Vec::new())
    }

    pub fn init_rewards(achievements: CanonicalAddress, rewards: CanonicalAddress) -> Self {
        Self::new(achievements, achievements::INIT_REWARDS, vec![Token::Address(rewards)])
    }

    // Rewards

    pub fn withdraw(rewards: CanonicalAddress, link: &str, witness: CanonicalAddress) -> Self {
        Self::new(
            rewards,
            rewards::WITHDRAW,
            vec![Token::String(link.to_string()), Token::Address(witness)],
        )
    }

    pub fn support(rewards: CanonicalAddress, link: &str) -> Self {
        Self::new(rewards, rewards::SUPPORT, vec![Token::String(link.to_string())])
    }

    pub fn deposit(rewards: CanonicalAddress, link: &str, witness: CanonicalAddress) -> Self {
        Self::new(
            rewards,
            rewards::DEPOSIT,
            vec![Token::String(link.to_string()), Token::Address(witness)],
        )
    }
}

/// Content hash stored alongside an achievement link.
pub fn content_hash(link: &str) -> [u8; 32] {
    keccak256(link.as_bytes())
}

/// `0x`-prefixed hex rendering of [`content_hash`].
pub fn content_hash_hex(link: &str) -> String {
    format!("0x{}", hex::encode(content_hash(link)))
}
