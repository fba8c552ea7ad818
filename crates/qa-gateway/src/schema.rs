//! Request and response bodies.
//!
//! Requests reject unknown fields; field names are camelCase on the wire.

use crate::domain::{
    AuthToken, CanonicalAddress, DisplayAddress, Identity, RawTransaction, TransactionId,
    UserListing,
};
use serde::{Deserialize, Serialize};

// Requests

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckRequest {
    pub user: Identity,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckAddressRequest {
    pub user: Identity,
    pub wallet_address: String,
}

/// Body shared by `/getAccessToken` and `/register`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OwnedAddressRequest {
    pub address: String,
    pub user: Identity,
    pub token: AuthToken,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfirmRequest {
    pub address: String,
    pub user: Identity,
    pub token: AuthToken,
    pub link: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateRequest {
    pub user: Identity,
    pub token: AuthToken,
    pub address: String,
    pub link: String,
    pub title: String,
    #[serde(default)]
    pub previous_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WithdrawRequest {
    pub link: String,
    pub witness: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EncodeSupportRequest {
    pub link: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EncodeDepositRequest {
    pub link: String,
    pub witness: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitRequest {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SupportRequest {
    pub raw_tx: RawTransaction,
    pub link: String,
    pub address: String,
    pub user: Identity,
    pub token: AuthToken,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DepositRequest {
    pub raw_tx: RawTransaction,
    pub link: String,
    pub witness: String,
    pub address: String,
    pub user: Identity,
    pub token: AuthToken,
    #[serde(default)]
    pub witness_name: Option<String>,
}

// Responses

#[derive(Debug, Clone, Serialize)]
pub struct PingResponse {
    pub pong: &'static str,
}

impl Default for PingResponse {
    fn default() -> Self {
        Self { pong: "pong" }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAddressResponse {
    pub ok: bool,
    pub user: Identity,
    pub wallet_address: String,
    /// Address the registry holds for `user`
    pub address: CanonicalAddress,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersResponse {
    pub users_list: Vec<UserListing>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub address: DisplayAddress,
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user: Identity,
    pub address: DisplayAddress,
    pub hex_address: CanonicalAddress,
    pub user_profile_name: String,
    pub txid: TransactionId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub user: Identity,
    pub address: DisplayAddress,
    pub hex_address: CanonicalAddress,
    pub link: String,
    pub user_profile_name: String,
    pub txid: TransactionId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub user: Identity,
    pub address: DisplayAddress,
    pub hex_address: CanonicalAddress,
    pub link: String,
    pub title: String,
    pub previous_link: String,
    pub txid: TransactionId,
    pub user_profile_name: String,
    pub content_hash: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawResponse {
    pub txid: TransactionId,
    pub link: String,
    pub witness: DisplayAddress,
    pub hex_witness: CanonicalAddress,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeSupportResponse {
    /// Rewards contract
    pub address: CanonicalAddress,
    pub link: String,
    pub encoded_data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeDepositResponse {
    /// Rewards contract
    pub address: CanonicalAddress,
    pub link: String,
    pub witness: DisplayAddress,
    pub encoded_data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    pub txid: TransactionId,
    pub rewards_address: CanonicalAddress,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResponse {
    pub txid: TransactionId,
    pub link: String,
    pub address: DisplayAddress,
    pub user_profile_name: String,
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    pub txid: TransactionId,
    pub link: String,
    pub witness: String,
    pub address: DisplayAddress,
    pub user_profile_name: String,
    pub user: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_rejected() {
        let body = r#"{"user": "alice", "extra": 1}"#;
        assert!(serde_json::from_str::<CheckRequest>(body).is_err());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let body = r#"{"address": "qX", "user": "alice"}"#;
        assert!(serde_json::from_str::<OwnedAddressRequest>(body).is_err());
    }

    #[test]
    fn test_camel_case_fields() {
        let body = r#"{
            "rawTx": "0200", "link": "l", "witness": "qW", "address": "qA",
            "user": "alice", "token": "t", "witnessName": "Bob"
        }"#;
        let req: DepositRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.raw_tx.as_hex(), "0200");
        assert_eq!(req.witness_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_previous_link_optional() {
        let body = r#"{"user": "a", "token": "t", "address": "q", "link": "l", "title": "T"}"#;
        let req: CreateRequest = serde_json::from_str(body).unwrap();
        assert!(req.previous_link.is_none());
    }

    #[test]
    fn test_check_response_shape() {
        let json = serde_json::to_value(CheckResponse { exists: true, pending: None }).unwrap();
        assert_eq!(json, serde_json::json!({"exists": true}));

        let json = serde_json::to_value(CheckResponse { exists: false, pending: Some(true) }).unwrap();
        assert_eq!(json, serde_json::json!({"exists": false, "pending": true}));
    }
}
