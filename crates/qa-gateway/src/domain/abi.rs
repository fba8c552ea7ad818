//! Minimal Solidity ABI codec for the achievements contracts.
//!
//! Covers exactly the parameter types those contracts use: `address`,
//! `uint256`, `bool`, `bytes32` and `string`. Calls are encoded as a 4-byte
//! Keccak-256 selector followed by head/tail encoded arguments.

use crate::domain::address::CanonicalAddress;
use primitive_types::U256;
use sha3::{Digest, Keccak256};

/// ABI word size in bytes.
pub const WORD: usize = 32;

/// Selector length in bytes.
pub const SELECTOR_LEN: usize = 4;

/// A typed ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(CanonicalAddress),
    Uint(U256),
    Bool(bool),
    FixedBytes32([u8; 32]),
    String(String),
}

impl Token {
    pub fn into_address(self) -> Option<CanonicalAddress> {
        match self {
            Token::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_uint(self) -> Option<U256> {
        match self {
            Token::Uint(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_bool(self) -> Option<bool> {
        match self {
            Token::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Token::String(s) => Some(s),
            _ => None,
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, Token::String(_))
    }
}

/// Expected type of an output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint,
    Bool,
    FixedBytes32,
    String,
}

/// Decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("data too short: need {needed} bytes, have {available}")]
    OutOfBounds { needed: usize, available: usize },
    #[error("offset or length does not fit in memory: {0}")]
    Overflow(U256),
    #[error("string is not valid utf-8")]
    InvalidUtf8,
    #[error("calldata shorter than a selector")]
    MissingSelector,
}

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// First four bytes of the signature hash, e.g. `register(address,string,string)`.
pub fn selector(signature: &str) -> [u8; SELECTOR_LEN] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode a full call: selector followed by the arguments.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode_tokens(tokens));
    out
}

/// Head/tail encoding of a flat argument list.
pub fn encode_tokens(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&uint_word(U256::from((head_len + tail.len()) as u64)));
            if let Token::String(s) = token {
                tail.extend_from_slice(&uint_word(U256::from(s.len() as u64)));
                tail.extend_from_slice(s.as_bytes());
                tail.resize(tail.len() + padding(s.len()), 0);
            }
        } else {
            head.extend_from_slice(&static_word(token));
        }
    }

    head.extend(tail);
    head
}

/// Split calldata into its selector and argument bytes.
pub fn split_call(data: &[u8]) -> Result<([u8; SELECTOR_LEN], &[u8]), AbiError> {
    if data.len() < SELECTOR_LEN {
        return Err(AbiError::MissingSelector);
    }
    let (sel, args) = data.split_at(SELECTOR_LEN);
    Ok(([sel[0], sel[1], sel[2], sel[3]], args))
}

/// Decode return data (or call arguments) laid out as `types`.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    types
        .iter()
        .enumerate()
        .map(|(index, ty)| {
            let word = read_word(data, index * WORD)?;
            match ty {
                ParamType::Address => {
                    let mut bytes = [0u8; 20];
                    bytes.copy_from_slice(&word[12..]);
                    Ok(Token::Address(CanonicalAddress::from_bytes(bytes)))
                }
                ParamType::Uint => Ok(Token::Uint(U256::from_big_endian(word))),
                ParamType::Bool => Ok(Token::Bool(word.iter().any(|b| *b != 0))),
                ParamType::FixedBytes32 => {
                    let mut bytes = [0u8; 32];
                    bytes.copy_from_slice(word);
                    Ok(Token::FixedBytes32(bytes))
                }
                ParamType::String => {
                    let offset = word_to_usize(word)?;
                    let len = word_to_usize(read_word(data, offset)?)?;
                    let start = offset + WORD;
                    let end = start.checked_add(len).ok_or(AbiError::Overflow(U256::from(len as u64)))?;
                    let bytes = data.get(start..end).ok_or(AbiError::OutOfBounds {
                        needed: end,
                        available: data.len(),
                    })?;
                    String::from_utf8(bytes.to_vec())
                        .map(Token::String)
                        .map_err(|_| AbiError::InvalidUtf8)
                }
            }
        })
        .collect()
}

fn static_word(token: &Token) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match token {
        Token::Address(a) => word[12..].copy_from_slice(a.as_bytes()),
        Token::Uint(v) => v.to_big_endian(&mut word),
        Token::Bool(b) => word[WORD - 1] = u8::from(*b),
        Token::FixedBytes32(bytes) => word.copy_from_slice(bytes),
        Token::String(_) => {}
    }
    word
}

fn uint_word(value: U256) -> [u8; WORD] {
    static_word(&Token::Uint(value))
}

fn padding(len: usize) -> usize {
    (WORD - len % WORD) % WORD
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    let end = offset + WORD;
    data.get(offset..end).ok_or(AbiError::OutOfBounds {
        needed: end,
        available: data.len(),
    })
}

fn word_to_usize(word: &[u8]) -> Result<usize, AbiError> {
    let value = U256::from_big_endian(word);
    if value > U256::from(u32::MAX) {
        return Err(AbiError::Overflow(value));
    }
    Ok(value.as_u64() as usize)
}
