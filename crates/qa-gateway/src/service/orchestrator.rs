//! Contract submission.
//!
//! Every submission is a single best-effort RPC. A failure is reported to
//! the caller as `SUBMIT_ERROR` and nothing is retried.

use crate::domain::{
    ContractCall, GatewayError, GatewayResult, RawTransaction, SubmitOptions, TransactionId,
    TransactionRecord,
};
use crate::middleware::GatewayMetrics;
use crate::ports::{ChainError, ChainNode};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TransactionOrchestrator {
    chain: Arc<dyn ChainNode>,
    options: SubmitOptions,
    metrics: Arc<GatewayMetrics>,
}

impl TransactionOrchestrator {
    pub fn new(chain: Arc<dyn ChainNode>, options: SubmitOptions, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            chain,
            options,
            metrics,
        }
    }

    pub fn options(&self) -> &SubmitOptions {
        &self.options
    }

    /// `sendtocontract` with the configured sender options.
    pub async fn submit(&self, call: ContractCall) -> GatewayResult<TransactionRecord> {
        let method = call.method();
        let result = self
            .chain
            .send_to_contract(&call.contract, &call.calldata(), &self.options)
            .await;
        self.metrics.record_submission(result.is_ok());

        match result {
            Ok(txid) => {
                info!(method, contract = %call.contract, txid = %txid, "contract call submitted");
                Ok(TransactionRecord { txid, call })
            }
            Err(e) => {
                warn!(method, contract = %call.contract, error = %e, "contract call rejected");
                Err(GatewayError::Submit(format!("{}: {}", method, e)))
            }
        }
    }

    /// Broadcast a transaction the client signed itself.
    pub async fn relay_raw(&self, raw: &RawTransaction) -> GatewayResult<TransactionId> {
        let txid = self.chain.send_raw_transaction(raw).await.map_err(|e| {
            warn!(error = %e, "sendrawtransaction rejected");
            GatewayError::Submit(e.to_string())
        })?;
        self.metrics.record_raw_relay();
        info!(txid = %txid, "raw transaction relayed");
        Ok(txid)
    }

    /// Decode a client-signed transaction before relaying it. A transaction
    /// the node cannot decode is the caller's fault.
    pub async fn inspect_raw(&self, raw: &RawTransaction) -> GatewayResult<serde_json::Value> {
        match self.chain.decode_raw_transaction(raw).await {
            Ok(decoded) => {
                debug!(decoded = %decoded, "raw transaction decoded");
                Ok(decoded)
            }
            Err(ChainError::Rpc { code, message }) => {
                debug!(code, message = %message, "raw transaction rejected by decoder");
                Err(GatewayError::InvalidRequest(format!(
                    "rawTx could not be decoded: {}",
                    message
                )))
            }
            Err(e) => Err(GatewayError::Submit(e.to_string())),
        }
    }
}
