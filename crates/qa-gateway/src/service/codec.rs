//! Display ⇄ canonical address conversion.

use crate::domain::address::validate_display_form;
use crate::domain::{CanonicalAddress, DisplayAddress, GatewayError, GatewayResult, Network};
use crate::ports::ChainNode;
use std::sync::Arc;
use tracing::warn;

pub struct AddressCodec {
    chain: Arc<dyn ChainNode>,
    network: Network,
}

impl AddressCodec {
    pub fn new(chain: Arc<dyn ChainNode>, network: Network) -> Self {
        Self { chain, network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Pure syntactic check; never touches the node.
    pub fn validate_display_form(&self, s: &str) -> bool {
        validate_display_form(s, self.network)
    }

    /// Validate and wrap, failing with `INVALID_ADDRESS`.
    pub fn parse(&self, s: &str) -> GatewayResult<DisplayAddress> {
        DisplayAddress::parse(s, self.network).map_err(|e| {
            GatewayError::InvalidAddress(format!("{:?} is not a {} address: {}", s, self.network, e))
        })
    }

    pub async fn to_canonical(&self, address: &DisplayAddress) -> GatewayResult<CanonicalAddress> {
        self.chain.get_hex_address(address).await.map_err(|e| {
            warn!(address = %address, error = %e, "gethexaddress failed");
            GatewayError::Conversion(e.to_string())
        })
    }

    pub async fn to_display(&self, address: &CanonicalAddress) -> GatewayResult<DisplayAddress> {
        self.chain.from_hex_address(address).await.map_err(|e| {
            warn!(address = %address, error = %e, "fromhexaddress failed");
            GatewayError::Conversion(e.to_string())
        })
    }
}
