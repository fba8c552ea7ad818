//! JSON-RPC client for the Qtum node.

use crate::domain::{CanonicalAddress, DisplayAddress, RawTransaction, SubmitOptions, TransactionId};
use crate::ports::{ChainError, ChainNode};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// bitcoind-style "Invalid or non-wallet transaction id"
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

/// JSON-RPC response structure.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// `callcontract` result, only the parts the gateway reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallContractResult {
    execution_result: ExecutionResult,
}

#[derive(Debug, Deserialize)]
struct ExecutionResult {
    excepted: String,
    output: String,
}

#[derive(Debug, Deserialize)]
struct SendToContractResult {
    txid: String,
}

#[derive(Debug, Deserialize)]
struct WalletTransaction {
    confirmations: i64,
}

/// Connection settings for [`QtumRpcClient`].
#[derive(Debug, Clone)]
pub struct QtumRpcConfig {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

/// Qtum node RPC client.
pub struct QtumRpcClient {
    http_client: reqwest::Client,
    config: QtumRpcConfig,
    request_id: AtomicU64,
}

impl QtumRpcClient {
    pub fn new(config: QtumRpcConfig) -> Result<Self, ChainError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
            request_id: AtomicU64::new(1),
        })
    }

    /// Make a JSON-RPC call.
    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, ChainError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        trace!(method, id, %params, "node rpc call");

        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            method,
            params,
            id,
        };

        let mut builder = self.http_client.post(&self.config.url).json(&request);
        if let Some(user) = &self.config.user {
            builder = builder.basic_auth(user, self.config.password.as_deref());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        // The node reports RPC errors with a 500 status and a JSON body
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        let rpc_response: JsonRpcResponse = serde_json::from_slice(&body).map_err(|_| {
            ChainError::Transport(format!("{} returned status {}", method, status))
        })?;

        if let Some(error) = rpc_response.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let result = rpc_response.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| ChainError::Malformed(format!("{}: {}", method, e)))
    }
}

/// Pull the output bytes out of a `callcontract` result.
fn call_output(result: CallContractResult) -> Result<Vec<u8>, ChainError> {
    let execution = result.execution_result;
    if execution.excepted != "None" {
        return Err(ChainError::Execution(execution.excepted));
    }
    hex::decode(&execution.output).map_err(|e| ChainError::Malformed(format!("output: {}", e)))
}

fn send_params(contract: &CanonicalAddress, data: &[u8], options: &SubmitOptions) -> Value {
    let mut params = vec![
        json!(contract.to_hex()),
        json!(hex::encode(data)),
        json!(options.amount),
        json!(options.gas_limit),
        json!(options.gas_price),
    ];
    if let Some(sender) = &options.sender {
        params.push(json!(sender));
    }
    Value::Array(params)
}

#[async_trait]
impl ChainNode for QtumRpcClient {
    async fn get_hex_address(&self, address: &DisplayAddress) -> Result<CanonicalAddress, ChainError> {
        let hex: String = self.call("gethexaddress", json!([address.as_str()])).await?;
        CanonicalAddress::from_hex(&hex).map_err(|e| ChainError::Malformed(e.to_string()))
    }

    async fn from_hex_address(&self, address: &CanonicalAddress) -> Result<DisplayAddress, ChainError> {
        let display: String = self.call("fromhexaddress", json!([address.to_hex()])).await?;
        Ok(DisplayAddress::new_unchecked(display))
    }

    async fn call_contract(
        &self,
        contract: &CanonicalAddress,
        data: &[u8],
    ) -> Result<Vec<u8>, ChainError> {
        let result: CallContractResult = self
            .call("callcontract", json!([contract.to_hex(), hex::encode(data)]))
            .await?;
        call_output(result)
    }

    async fn send_to_contract(
        &self,
        contract: &CanonicalAddress,
        data: &[u8],
        options: &SubmitOptions,
    ) -> Result<TransactionId, ChainError> {
        let result: SendToContractResult = self
            .call("sendtocontract", send_params(contract, data, options))
            .await?;
        debug!(contract = %contract, txid = %result.txid, "sendtocontract accepted");
        Ok(TransactionId::new(result.txid))
    }

    async fn decode_raw_transaction(&self, raw: &RawTransaction) -> Result<Value, ChainError> {
        self.call("decoderawtransaction", json!([raw.as_hex()])).await
    }

    async fn send_raw_transaction(&self, raw: &RawTransaction) -> Result<TransactionId, ChainError> {
        let txid: String = self.call("sendrawtransaction", json!([raw.as_hex()])).await?;
        Ok(TransactionId::new(txid))
    }

    async fn confirmations(&self, txid: &TransactionId) -> Result<Option<u64>, ChainError> {
        match self
            .call::<WalletTransaction>("gettransaction", json!([txid.as_str()]))
            .await
        {
            // Negative depth means conflicted; treat as not yet confirmed
            Ok(tx) => Ok(Some(tx.confirmations.max(0) as u64)),
            Err(ChainError::Rpc { code, .. }) if code == RPC_INVALID_ADDRESS_OR_KEY => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header_exists, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> QtumRpcClient {
        QtumRpcClient::new(QtumRpcConfig {
            url: server.uri(),
            user: Some("qtum".into()),
            password: Some("secret".into()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn rpc_ok(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"result": result, "error": null, "id": 1}))
    }

    #[tokio::test]
    async fn test_get_hex_address() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_exists("authorization"))
            .and(body_partial_json(json!({"method": "gethexaddress"})))
            .respond_with(rpc_ok(json!("7926223070547d2d15b2ef5e7383e541c338ffe9")))
            .expect(1)
            .mount(&server)
            .await;

        let hex = client(&server)
            .get_hex_address(&DisplayAddress::new_unchecked("qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW"))
            .await
            .unwrap();
        assert_eq!(hex.to_hex(), "7926223070547d2d15b2ef5e7383e541c338ffe9");
    }

    #[tokio::test]
    async fn test_rpc_error_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "result": null,
                "error": {"code": -5, "message": "Invalid address"},
                "id": 1
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_hex_address(&DisplayAddress::new_unchecked("bogus"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Rpc { code: -5, .. }));
    }

    #[tokio::test]
    async fn test_call_contract_decodes_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "callcontract"})))
            .respond_with(rpc_ok(json!({
                "address": "0101010101010101010101010101010101010101",
                "executionResult": {"excepted": "None", "output": "00ff"}
            })))
            .mount(&server)
            .await;

        let output = client(&server)
            .call_contract(&CanonicalAddress::from_bytes([1; 20]), &[0xde, 0xad])
            .await
            .unwrap();
        assert_eq!(output, vec![0x00, 0xff]);
    }

    #[tokio::test]
    async fn test_call_contract_exception() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_ok(json!({
                "executionResult": {"excepted": "Revert", "output": ""}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .call_contract(&CanonicalAddress::from_bytes([1; 20]), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Execution(ref e) if e == "Revert"));
    }

    #[tokio::test]
    async fn test_send_to_contract_params() {
        let server = MockServer::start().await;
        let options = SubmitOptions {
            sender: Some("qSender".into()),
            ..SubmitOptions::default()
        };
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "sendtocontract",
                "params": ["0202020202020202020202020202020202020202", "abcd", 0.0, 250000, 0.0000004, "qSender"]
            })))
            .respond_with(rpc_ok(json!({"txid": "aa11", "sender": "qSender", "hash160": "00"})))
            .expect(1)
            .mount(&server)
            .await;

        let txid = client(&server)
            .send_to_contract(&CanonicalAddress::from_bytes([2; 20]), &[0xab, 0xcd], &options)
            .await
            .unwrap();
        assert_eq!(txid.as_str(), "aa11");
    }

    #[tokio::test]
    async fn test_confirmations_unknown_tx() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "result": null,
                "error": {"code": -5, "message": "Invalid or non-wallet transaction id"},
                "id": 1
            })))
            .mount(&server)
            .await;

        let depth = client(&server)
            .confirmations(&TransactionId::new("ff"))
            .await
            .unwrap();
        assert_eq!(depth, None);
    }

    #[tokio::test]
    async fn test_confirmations_depth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "gettransaction"})))
            .respond_with(rpc_ok(json!({"confirmations": 3, "txid": "ff"})))
            .mount(&server)
            .await;

        let depth = client(&server)
            .confirmations(&TransactionId::new("ff"))
            .await
            .unwrap();
        assert_eq!(depth, Some(3));
    }

    #[tokio::test]
    async fn test_non_json_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = client(&server)
            .send_raw_transaction(&RawTransaction::new("00"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)));
    }
}
