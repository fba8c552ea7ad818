//! Adapter wiring: builds the real collaborators from configuration.

use anyhow::{Context, Result};
use qa_gateway::adapters::{
    HttpActivityFeed, InMemoryPendingStore, JwtAccessTokenIssuer, JwtIdentityVerifier,
    LocalAddressConversion, LogOnlyFeed, QtumRpcClient, QtumRpcConfig,
};
use qa_gateway::ports::{ActivityFeed, ChainNode};
use qa_gateway::{Collaborators, GatewayConfig};
use std::sync::Arc;
use tracing::{info, warn};

pub fn collaborators(config: &GatewayConfig) -> Result<Collaborators> {
    let rpc = QtumRpcClient::new(QtumRpcConfig {
        url: config.node.url.clone(),
        user: config.node.user.clone(),
        password: config.node.password.clone(),
        timeout: config.node.request_timeout,
    })
    .context("failed to build Qtum RPC client")?;

    let chain: Arc<dyn ChainNode> = if config.node.local_conversion {
        info!(network = %config.node.network, "Converting addresses locally");
        Arc::new(LocalAddressConversion::new(Arc::new(rpc), config.node.network))
    } else {
        Arc::new(rpc)
    };

    let feed: Arc<dyn ActivityFeed> = match &config.feed.url {
        Some(url) => Arc::new(
            HttpActivityFeed::new(url.clone(), config.feed.api_key.clone(), config.feed.timeout)
                .context("failed to build activity feed client")?,
        ),
        None => {
            warn!("No activity feed configured; events are only logged");
            Arc::new(LogOnlyFeed)
        }
    };

    let mut identities = JwtIdentityVerifier::new(
        &config.auth.identity_secret,
        config.auth.identity_issuer.as_deref(),
    );
    if let Some(url) = &config.auth.profile_url {
        identities = identities
            .with_profile_service(url, config.node.request_timeout)
            .with_context(|| format!("invalid profile service url {}", url))?;
    }

    let tokens = JwtAccessTokenIssuer::new(
        &config.auth.access_token_secret,
        config.auth.access_token_issuer.clone(),
        config.auth.access_token_ttl,
    );

    Ok(Collaborators {
        chain,
        identities: Arc::new(identities),
        tokens: Arc::new(tokens),
        feed,
        pending: Arc::new(InMemoryPendingStore::new()),
    })
}
