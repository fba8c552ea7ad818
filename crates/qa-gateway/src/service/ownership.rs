//! Identity and address-ownership checks gating every mutating operation.
//!
//! The checks run as a fixed pipeline, each stage consuming the previous
//! stage's output:
//!
//! ```text
//! claimed ──form──▶ DisplayAddress ──token──▶ Authenticated ──owner──▶ Verified
//!           │                        │                        │
//!     INVALID_ADDRESS           INVALID_TOKEN         INVALID_ADDRESS_OWNER
//! ```
//!
//! The form check is pure, so a malformed address never reaches the
//! identity service or the registry.

use crate::domain::{
    AuthToken, CanonicalAddress, DisplayAddress, GatewayError, GatewayResult, Identity,
};
use crate::ports::IdentityVerifier;
use crate::service::codec::AddressCodec;
use crate::service::registry::ContractReader;
use std::sync::Arc;
use tracing::debug;

/// An address whose token checked out, resolved to both forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub display: DisplayAddress,
    pub canonical: CanonicalAddress,
}

/// An [`Authenticated`] address the registry records for the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified(Authenticated);

impl Verified {
    pub fn display(&self) -> &DisplayAddress {
        &self.0.display
    }

    pub fn canonical(&self) -> CanonicalAddress {
        self.0.canonical
    }
}

pub struct OwnershipVerifier {
    codec: Arc<AddressCodec>,
    identities: Arc<dyn IdentityVerifier>,
    registry: Arc<ContractReader>,
}

impl OwnershipVerifier {
    pub fn new(
        codec: Arc<AddressCodec>,
        identities: Arc<dyn IdentityVerifier>,
        registry: Arc<ContractReader>,
    ) -> Self {
        Self {
            codec,
            identities,
            registry,
        }
    }

    /// Form, token and conversion checks. Used where no address is on record
    /// yet (registration).
    pub async fn authenticate(
        &self,
        identity: &Identity,
        token: &AuthToken,
        claimed: &str,
    ) -> GatewayResult<Authenticated> {
        let display = self.codec.parse(claimed)?;
        self.check_token(identity, token).await?;
        let canonical = self.codec.to_canonical(&display).await?;
        Ok(Authenticated { display, canonical })
    }

    /// Full pipeline: [`authenticate`](Self::authenticate) plus the registry
    /// ownership check.
    pub async fn verify(
        &self,
        identity: &Identity,
        token: &AuthToken,
        claimed: &str,
    ) -> GatewayResult<Verified> {
        let authenticated = self.authenticate(identity, token, claimed).await?;
        self.check_owner(identity, authenticated).await
    }

    async fn check_token(&self, identity: &Identity, token: &AuthToken) -> GatewayResult<()> {
        if self.identities.validate_token(identity, token).await {
            Ok(())
        } else {
            debug!(identity = %identity, "token rejected");
            Err(GatewayError::InvalidToken)
        }
    }

    async fn check_owner(
        &self,
        identity: &Identity,
        authenticated: Authenticated,
    ) -> GatewayResult<Verified> {
        let recorded = self.registry.address_by_account(identity.as_str()).await?;
        if recorded != authenticated.canonical {
            debug!(
                identity = %identity,
                claimed = %authenticated.canonical,
                recorded = %recorded,
                "address not owned by identity"
            );
            return Err(GatewayError::InvalidAddressOwner);
        }
        Ok(Verified(authenticated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryChain, StaticIdentityVerifier};
    use crate::domain::config::ContractsConfig;
    use crate::domain::{ErrorKind, Network};

    const ALICE_ADDR: &str = "qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW";
    const ALICE_HEX: &str = "7926223070547d2d15b2ef5e7383e541c338ffe9";
    const OTHER_ADDR: &str = "qHfQ5uKcbWvJ4dhyfy1Vh4RRtETb2AA14v";

    struct Fixture {
        chain: Arc<InMemoryChain>,
        identities: Arc<StaticIdentityVerifier>,
        verifier: OwnershipVerifier,
    }

    fn fixture() -> Fixture {
        let chain = Arc::new(InMemoryChain::new(Network::Testnet));
        let identities = Arc::new(StaticIdentityVerifier::new().with_user("alice", "tok", "Alice"));
        let codec = Arc::new(AddressCodec::new(chain.clone(), Network::Testnet));
        let registry = Arc::new(ContractReader::new(
            chain.clone(),
            ContractsConfig {
                registry: CanonicalAddress::from_bytes([1; 20]),
                achievements: CanonicalAddress::from_bytes([2; 20]),
                rewards: CanonicalAddress::from_bytes([3; 20]),
            },
        ));
        chain.seed_user(CanonicalAddress::from_hex(ALICE_HEX).unwrap(), "alice", "Alice");
        Fixture {
            verifier: OwnershipVerifier::new(codec, identities.clone(), registry),
            chain,
            identities,
        }
    }

    #[tokio::test]
    async fn test_malformed_address_makes_no_calls() {
        let f = fixture();
        let err = f
            .verifier
            .verify(&Identity::new("alice"), &AuthToken::new("tok"), "not-an-address")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);
        assert_eq!(f.identities.validations(), 0);
        assert_eq!(f.chain.stats().total(), 0);
    }

    #[tokio::test]
    async fn test_bad_token_before_ownership_lookup() {
        let f = fixture();
        let err = f
            .verifier
            .verify(&Identity::new("alice"), &AuthToken::new("wrong"), ALICE_ADDR)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidToken);
        assert_eq!(f.chain.stats().calls(), 0);
        assert_eq!(f.chain.stats().conversions(), 0);
    }

    #[tokio::test]
    async fn test_wrong_owner() {
        let f = fixture();
        let err = f
            .verifier
            .verify(&Identity::new("alice"), &AuthToken::new("tok"), OTHER_ADDR)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddressOwner);
    }

    #[tokio::test]
    async fn test_verified_owner() {
        let f = fixture();
        let verified = f
            .verifier
            .verify(&Identity::new("alice"), &AuthToken::new("tok"), ALICE_ADDR)
            .await
            .unwrap();
        assert_eq!(verified.canonical().to_hex(), ALICE_HEX);
        assert_eq!(verified.display().as_str(), ALICE_ADDR);
    }

    #[tokio::test]
    async fn test_authenticate_skips_registry() {
        let f = fixture();
        let auth = f
            .verifier
            .authenticate(&Identity::new("alice"), &AuthToken::new("tok"), OTHER_ADDR)
            .await
            .unwrap();
        assert_eq!(auth.canonical.to_hex(), "0123456789abcdef0123456789abcdef01234567");
        assert_eq!(f.chain.stats().calls(), 0);
    }
}
