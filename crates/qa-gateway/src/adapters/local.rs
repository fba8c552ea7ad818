//! Offline address conversion.
//!
//! Wraps another [`ChainNode`] and answers `gethexaddress`/`fromhexaddress`
//! from the base58check codec instead of a node round trip. Every other call
//! is passed through.

use crate::domain::address::{decode_display, encode_display};
use crate::domain::{CanonicalAddress, DisplayAddress, Network, RawTransaction, SubmitOptions, TransactionId};
use crate::ports::{ChainError, ChainNode};
use async_trait::async_trait;
use std::sync::Arc;

pub struct LocalAddressConversion {
    inner: Arc<dyn ChainNode>,
    network: Network,
}

impl LocalAddressConversion {
    pub fn new(inner: Arc<dyn ChainNode>, network: Network) -> Self {
        Self { inner, network }
    }
}

#[async_trait]
impl ChainNode for LocalAddressConversion {
    async fn get_hex_address(&self, address: &DisplayAddress) -> Result<CanonicalAddress, ChainError> {
        decode_display(address.as_str(), self.network)
            .map_err(|e| ChainError::Malformed(e.to_string()))
    }

    async fn from_hex_address(&self, address: &CanonicalAddress) -> Result<DisplayAddress, ChainError> {
        Ok(encode_display(address, self.network))
    }

    async fn call_contract(
        &self,
        contract: &CanonicalAddress,
        data: &[u8],
    ) -> Result<Vec<u8>, ChainError> {
        self.inner.call_contract(contract, data).await
    }

    async fn send_to_contract(
        &self,
        contract: &CanonicalAddress,
        data: &[u8],
        options: &SubmitOptions,
    ) -> Result<TransactionId, ChainError> {
        self.inner.send_to_contract(contract, data, options).await
    }

    async fn decode_raw_transaction(
        &self,
        raw: &RawTransaction,
    ) -> Result<serde_json::Value, ChainError> {
        self.inner.decode_raw_transaction(raw).await
    }

    async fn send_raw_transaction(&self, raw: &RawTransaction) -> Result<TransactionId, ChainError> {
        self.inner.send_raw_transaction(raw).await
    }

    async fn confirmations(&self, txid: &TransactionId) -> Result<Option<u64>, ChainError> {
        self.inner.confirmations(txid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryChain;

    #[tokio::test]
    async fn test_converts_without_node() {
        let chain = Arc::new(InMemoryChain::new(Network::Testnet));
        let local = LocalAddressConversion::new(chain.clone(), Network::Testnet);

        let display = DisplayAddress::new_unchecked("qHfQ5uKcbWvJ4dhyfy1Vh4RRtETb2AA14v");
        let canonical = local.get_hex_address(&display).await.unwrap();
        assert_eq!(canonical.to_hex(), "0123456789abcdef0123456789abcdef01234567");
        assert_eq!(local.from_hex_address(&canonical).await.unwrap(), display);
        assert_eq!(chain.stats().conversions(), 0);
    }

    #[tokio::test]
    async fn test_rejects_wrong_network() {
        let chain = Arc::new(InMemoryChain::new(Network::Mainnet));
        let local = LocalAddressConversion::new(chain, Network::Mainnet);
        let testnet = DisplayAddress::new_unchecked("qHfQ5uKcbWvJ4dhyfy1Vh4RRtETb2AA14v");
        assert!(matches!(
            local.get_hex_address(&testnet).await,
            Err(ChainError::Malformed(_))
        ));
    }
}
