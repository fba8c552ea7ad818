//! Qtum address representations.
//!
//! Callers speak base58check *display* addresses (`q...` on testnet, `Q...` on
//! mainnet). Contracts speak the 20-byte hash160 that the node renders as 40
//! lowercase hex characters, the *canonical* form. The two types never compare
//! with each other; crossing between them always goes through a conversion.

use primitive_types::H160;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Version byte + 20-byte hash + 4-byte checksum.
pub const DISPLAY_ADDRESS_BYTES: usize = 25;

const CHECKSUM_LEN: usize = 4;

/// Network the gateway talks to; selects the P2PKH version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    /// Version byte prefixed to pay-to-pubkey-hash addresses.
    pub fn pubkey_hash_prefix(self) -> u8 {
        match self {
            Network::Mainnet => 0x3a,
            Network::Testnet | Network::Regtest => 0x78,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Regtest => write!(f, "regtest"),
        }
    }
}

impl FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(AddressError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Address parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("not valid base58")]
    InvalidBase58,
    #[error("decoded address is {0} bytes, expected {DISPLAY_ADDRESS_BYTES}")]
    InvalidLength(usize),
    #[error("version byte 0x{found:02x} does not match network prefix 0x{expected:02x}")]
    WrongNetwork { expected: u8, found: u8 },
    #[error("checksum mismatch")]
    BadChecksum,
    #[error("invalid hex address: {0}")]
    InvalidHex(String),
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

/// Wallet-facing base58check address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayAddress(String);

impl DisplayAddress {
    /// Validate `s` for `network` and wrap it.
    pub fn parse(s: &str, network: Network) -> Result<Self, AddressError> {
        decode_display(s, network)?;
        Ok(Self(s.to_string()))
    }

    /// Wrap a string produced by a trusted converter (the node).
    pub fn new_unchecked(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DisplayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for DisplayAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Hash160 address as used by the contract layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CanonicalAddress(H160);

impl CanonicalAddress {
    pub const ZERO: CanonicalAddress = CanonicalAddress(H160::zero());

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(H160::from(bytes))
    }

    /// Parse 40 hex characters, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != 40 {
            return Err(AddressError::InvalidHex(s.to_string()));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        self.0.as_fixed_bytes()
    }

    /// Node-style rendering: 40 lowercase hex chars, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// EVM-style rendering with `0x` prefix.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<H160> for CanonicalAddress {
    fn from(h: H160) -> Self {
        Self(h)
    }
}

impl fmt::Display for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for CanonicalAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CanonicalAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CanonicalAddress::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Pure syntactic check of a display address. Never touches the network.
pub fn validate_display_form(s: &str, network: Network) -> bool {
    decode_display(s, network).is_ok()
}

/// Decode a base58check display address into its hash160.
pub fn decode_display(s: &str, network: Network) -> Result<CanonicalAddress, AddressError> {
    let raw = bs58::decode(s)
        .into_vec()
        .map_err(|_| AddressError::InvalidBase58)?;

    if raw.len() != DISPLAY_ADDRESS_BYTES {
        return Err(AddressError::InvalidLength(raw.len()));
    }

    let (payload, checksum) = raw.split_at(DISPLAY_ADDRESS_BYTES - CHECKSUM_LEN);
    if checksum != &double_sha256(payload)[..CHECKSUM_LEN] {
        return Err(AddressError::BadChecksum);
    }

    let expected = network.pubkey_hash_prefix();
    if payload[0] != expected {
        return Err(AddressError::WrongNetwork {
            expected,
            found: payload[0],
        });
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok(CanonicalAddress::from_bytes(hash))
}

/// Encode a hash160 as a base58check display address for `network`.
pub fn encode_display(address: &CanonicalAddress, network: Network) -> DisplayAddress {
    let mut payload = Vec::with_capacity(DISPLAY_ADDRESS_BYTES);
    payload.push(network.pubkey_hash_prefix());
    payload.extend_from_slice(address.as_bytes());
    let checksum = double_sha256(&payload);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    DisplayAddress(bs58::encode(payload).into_string())
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}
