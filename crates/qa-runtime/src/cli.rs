//! Command line flags and `QA_*` environment overrides.
//!
//! Precedence, lowest first: built-in defaults, the `--config` JSON file,
//! then any flag or environment variable given here.

use anyhow::{Context, Result};
use clap::Parser;
use qa_gateway::domain::{CanonicalAddress, Network};
use qa_gateway::GatewayConfig;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Parser)]
#[command(name = "qa-gateway", version, about = "Qtum achievements gateway")]
pub struct Args {
    /// JSON configuration file
    #[arg(short, long, env = "QA_CONFIG")]
    pub config: Option<PathBuf>,

    /// HTTP bind address
    #[arg(long, env = "QA_HTTP_HOST")]
    pub host: Option<IpAddr>,

    /// HTTP port
    #[arg(short, long, env = "QA_HTTP_PORT")]
    pub port: Option<u16>,

    /// Qtum node JSON-RPC url
    #[arg(long, env = "QA_NODE_URL")]
    pub node_url: Option<String>,

    #[arg(long, env = "QA_NODE_USER")]
    pub node_user: Option<String>,

    #[arg(long, env = "QA_NODE_PASSWORD", hide_env_values = true)]
    pub node_password: Option<String>,

    /// `mainnet` or `testnet`
    #[arg(long, env = "QA_NETWORK")]
    pub network: Option<Network>,

    /// Convert addresses locally instead of asking the node
    #[arg(long, env = "QA_LOCAL_CONVERSION")]
    pub local_conversion: bool,

    /// Registry contract, 40 hex chars
    #[arg(long, env = "QA_REGISTRY_CONTRACT")]
    pub registry: Option<String>,

    /// Achievements contract, 40 hex chars
    #[arg(long, env = "QA_ACHIEVEMENTS_CONTRACT")]
    pub achievements: Option<String>,

    /// Rewards contract, 40 hex chars
    #[arg(long, env = "QA_REWARDS_CONTRACT")]
    pub rewards: Option<String>,

    /// Wallet address the node signs submissions with
    #[arg(long, env = "QA_SENDER")]
    pub sender: Option<String>,

    /// Activity feed endpoint
    #[arg(long, env = "QA_FEED_URL")]
    pub feed_url: Option<String>,

    #[arg(long, env = "QA_FEED_API_KEY", hide_env_values = true)]
    pub feed_api_key: Option<String>,

    #[arg(long, env = "QA_IDENTITY_SECRET", hide_env_values = true)]
    pub identity_secret: Option<String>,

    #[arg(long, env = "QA_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub access_token_secret: Option<String>,

    /// Profile service base url
    #[arg(long, env = "QA_PROFILE_URL")]
    pub profile_url: Option<String>,
}

impl Args {
    /// Defaults, then the config file, then overrides; validated.
    pub fn load_config(&self) -> Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => GatewayConfig::default(),
        };
        self.apply(&mut config)?;
        config.validate().context("invalid gateway configuration")?;
        Ok(config)
    }

    fn apply(&self, config: &mut GatewayConfig) -> Result<()> {
        if let Some(host) = self.host {
            config.http.host = host;
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }

        if let Some(url) = &self.node_url {
            config.node.url = url.clone();
        }
        if self.node_user.is_some() {
            config.node.user = self.node_user.clone();
        }
        if self.node_password.is_some() {
            config.node.password = self.node_password.clone();
        }
        if let Some(network) = self.network {
            config.node.network = network;
        }
        if self.local_conversion {
            config.node.local_conversion = true;
        }

        for (name, value, slot) in [
            ("registry", &self.registry, &mut config.contracts.registry),
            ("achievements", &self.achievements, &mut config.contracts.achievements),
            ("rewards", &self.rewards, &mut config.contracts.rewards),
        ] {
            if let Some(hex) = value {
                *slot = CanonicalAddress::from_hex(hex)
                    .with_context(|| format!("invalid {} contract address", name))?;
            }
        }
        if self.sender.is_some() {
            config.submit.sender = self.sender.clone();
        }

        if self.feed_url.is_some() {
            config.feed.url = self.feed_url.clone();
        }
        if self.feed_api_key.is_some() {
            config.feed.api_key = self.feed_api_key.clone();
        }

        if let Some(secret) = &self.identity_secret {
            config.auth.identity_secret = secret.clone();
        }
        if let Some(secret) = &self.access_token_secret {
            config.auth.access_token_secret = secret.clone();
        }
        if self.profile_url.is_some() {
            config.auth.profile_url = self.profile_url.clone();
        }

        Ok(())
    }
}

/// Read a JSON config file; missing sections take their defaults.
pub fn read_config(path: &Path) -> Result<GatewayConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONTRACTS: &str = r#"{
        "contracts": {
            "registry": "0101010101010101010101010101010101010101",
            "achievements": "0202020202020202020202020202020202020202",
            "rewards": "0303030303030303030303030303030303030303"
        },
        "confirmation": {"timeout": "2m"}
    }"#;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_then_flags() {
        let file = config_file(CONTRACTS);
        let args = Args::try_parse_from([
            "qa-gateway",
            "--config",
            file.path().to_str().unwrap(),
            "--port",
            "8088",
            "--network",
            "mainnet",
            "--rewards",
            "0404040404040404040404040404040404040404",
            "--identity-secret",
            "identity-test-secret",
            "--access-token-secret",
            "access-test-secret",
        ])
        .unwrap();

        let config = args.load_config().unwrap();
        assert_eq!(config.http.port, 8088);
        assert_eq!(config.node.network, Network::Mainnet);
        assert_eq!(config.confirmation.timeout.as_secs(), 120);
        assert_eq!(config.contracts.registry, CanonicalAddress::from_bytes([1; 20]));
        assert_eq!(config.contracts.rewards, CanonicalAddress::from_bytes([4; 20]));
        assert_eq!(config.auth.identity_secret, "identity-test-secret");
    }

    #[test]
    fn test_refuses_to_start_without_secrets() {
        let file = config_file(CONTRACTS);
        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..Args::default()
        };
        let err = args.load_config().unwrap_err();
        assert!(format!("{:#}", err).contains("auth.identity_secret"));
    }

    #[test]
    fn test_missing_contracts_fail_validation() {
        let err = Args::default().load_config().unwrap_err();
        assert!(format!("{:#}", err).contains("registry"));
    }

    #[test]
    fn test_bad_override_address() {
        let file = config_file(CONTRACTS);
        let args = Args {
            config: Some(file.path().to_path_buf()),
            achievements: Some("not-hex".into()),
            ..Args::default()
        };
        let err = args.load_config().unwrap_err();
        assert!(err.to_string().contains("achievements"));
    }

    #[test]
    fn test_unreadable_and_malformed_files() {
        let err = read_config(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));

        let file = config_file("{ not json");
        let err = read_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
