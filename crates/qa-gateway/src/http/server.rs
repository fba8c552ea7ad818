//! Gateway HTTP server.

use crate::domain::config::GatewayConfig;
use crate::domain::error::{GatewayError, GatewayResult};
use crate::http::routes::{routes, AppState};
use crate::middleware::{create_cors_layer, GatewayMetrics, TracingLayer};
use crate::service::{Collaborators, Gateway};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Build the full router: routes plus the middleware stack.
///
/// Layer order: Request → Tracing → CORS → BodyLimit → Handler
///
/// The body limit is enforced by the body extractor, so an oversized body
/// gets the gateway's `PAYLOAD_TOO_LARGE` error shape.
pub fn build_router(gateway: Arc<Gateway>, config: &GatewayConfig) -> Router {
    let metrics = Arc::clone(gateway.metrics());
    let mut router = routes(AppState { gateway })
        .layer(DefaultBodyLimit::max(config.http.max_body_size));
    if config.cors.enabled {
        router = router.layer(create_cors_layer(&config.cors));
    }
    router.layer(TracingLayer::with_metrics(metrics))
}

/// Gateway server state
pub struct GatewayServer {
    config: GatewayConfig,
    gateway: Arc<Gateway>,
}

impl GatewayServer {
    /// Validate `config` and assemble the gateway around `collaborators`.
    pub fn new(config: GatewayConfig, collaborators: Collaborators) -> GatewayResult<Self> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let metrics = Arc::new(GatewayMetrics::new());
        let gateway = Arc::new(Gateway::with_metrics(collaborators, &config, metrics));

        Ok(Self { config, gateway })
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.gateway), &self.config)
    }

    /// Bind and start serving in the background.
    pub async fn start(self) -> GatewayResult<RunningServer> {
        let addr = self.config.http_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = self.router();

        info!(addr = %local_addr, network = %self.config.node.network, "Achievements gateway listening");
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Ok(RunningServer {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }
}

/// Handle to a server started with [`GatewayServer::start`].
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the server task to end.
    pub async fn wait(self) -> GatewayResult<()> {
        match self.handle.await {
            Ok(Ok(())) => {
                info!("Achievements gateway stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "HTTP server error");
                Err(GatewayError::from(e))
            }
            Err(e) => Err(GatewayError::Internal(format!("server task failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::JwtAccessTokenIssuer;
    use crate::adapters::memory::{InMemoryChain, InMemoryFeed, StaticIdentityVerifier};
    use crate::adapters::pending::InMemoryPendingStore;
    use crate::domain::config::ContractsConfig;
    use crate::domain::{CanonicalAddress, ErrorKind, Network};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    fn collaborators() -> Collaborators {
        Collaborators {
            chain: Arc::new(InMemoryChain::new(Network::Testnet)),
            identities: Arc::new(StaticIdentityVerifier::new()),
            tokens: Arc::new(JwtAccessTokenIssuer::new("s", "test", Duration::from_secs(60))),
            feed: Arc::new(InMemoryFeed::new()),
            pending: Arc::new(InMemoryPendingStore::new()),
        }
    }

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.http.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.http.port = 0;
        config.contracts = ContractsConfig {
            registry: CanonicalAddress::from_bytes([1; 20]),
            achievements: CanonicalAddress::from_bytes([2; 20]),
            rewards: CanonicalAddress::from_bytes([3; 20]),
        };
        config.auth.identity_secret = "identity-test-secret".into();
        config.auth.access_token_secret = "access-test-secret".into();
        config
    }

    #[test]
    fn test_rejects_invalid_config() {
        let err = GatewayServer::new(GatewayConfig::default(), collaborators()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.to_string().contains("registry"));
    }

    #[tokio::test]
    async fn test_start_ping_shutdown() {
        let server = GatewayServer::new(config(), collaborators()).unwrap();
        let mut running = server.start().await.unwrap();

        let url = format!("http://{}/ping", running.local_addr());
        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
        assert_eq!(body, serde_json::json!({"pong": "pong"}));

        running.shutdown();
        running.wait().await.unwrap();
    }
}
