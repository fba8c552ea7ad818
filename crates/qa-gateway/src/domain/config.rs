//! Gateway configuration with validation.

use crate::domain::address::{CanonicalAddress, Network};
use crate::domain::types::SubmitOptions;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Qtum node connection
    pub node: NodeConfig,
    /// Deployed contract addresses
    pub contracts: ContractsConfig,
    /// Options for every `sendtocontract` submission
    pub submit: SubmitOptions,
    /// Registration confirmation wait
    pub confirmation: ConfirmationConfig,
    /// Identity tokens and access tokens
    pub auth: AuthConfig,
    /// Activity feed sink
    pub feed: FeedConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit("max_body_size cannot be 0".into()));
        }

        if self.node.url.is_empty() {
            return Err(ConfigError::Invalid("node.url cannot be empty".into()));
        }

        for (name, address) in [
            ("registry", self.contracts.registry),
            ("achievements", self.contracts.achievements),
            ("rewards", self.contracts.rewards),
        ] {
            if address.is_zero() {
                return Err(ConfigError::MissingContract(name));
            }
        }

        if self.submit.gas_limit == 0 {
            return Err(ConfigError::Invalid("submit.gas_limit cannot be 0".into()));
        }

        if self.confirmation.required == 0 {
            return Err(ConfigError::Invalid(
                "confirmation.required must be at least 1".into(),
            ));
        }

        if self.confirmation.poll_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "confirmation.poll_interval cannot be 0".into(),
            ));
        }

        if self.confirmation.timeout < self.confirmation.poll_interval {
            return Err(ConfigError::InvalidTimeout(
                "confirmation.timeout is shorter than poll_interval".into(),
            ));
        }

        if self.auth.identity_secret.is_empty() {
            return Err(ConfigError::MissingSecret("auth.identity_secret"));
        }

        if self.auth.access_token_secret.is_empty() {
            return Err(ConfigError::MissingSecret("auth.access_token_secret"));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 3000)
    pub port: u16,
    /// Max request body size in bytes
    pub max_body_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 3000,
            max_body_size: 256 * 1024,
        }
    }
}

/// Qtum node RPC connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// JSON-RPC endpoint
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Network the node runs; fixes the display address prefix
    pub network: Network,
    /// Per-call timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Convert addresses locally instead of asking the node
    pub local_conversion: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:13889".to_string(),
            user: None,
            password: None,
            network: Network::Testnet,
            request_timeout: Duration::from_secs(30),
            local_conversion: false,
        }
    }
}

/// Contract addresses in canonical hex
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    pub registry: CanonicalAddress,
    pub achievements: CanonicalAddress,
    pub rewards: CanonicalAddress,
}

/// Confirmation wait for registrations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Depth at which a registration counts as confirmed
    pub required: u64,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Pending flag is released after this even if still unconfirmed
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            required: 1,
            poll_interval: Duration::from_secs(15),
            timeout: Duration::from_secs(10 * 60),
        }
    }
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret identity tokens are signed with; no default
    pub identity_secret: String,
    /// Optional issuer claim required on identity tokens
    pub identity_issuer: Option<String>,
    /// Profile service base URL; `GET {url}/{identity}` returns `{"name": ...}`
    pub profile_url: Option<String>,
    /// HS256 secret for issued access tokens; no default
    pub access_token_secret: String,
    #[serde(with = "humantime_serde")]
    pub access_token_ttl: Duration,
    /// `iss` claim on issued access tokens
    pub access_token_issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_secret: String::new(),
            identity_issuer: None,
            profile_url: None,
            access_token_secret: String::new(),
            access_token_ttl: Duration::from_secs(3600),
            access_token_issuer: "qtum-achievements".to_string(),
        }
    }
}

/// Activity feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Endpoint events are POSTed to; events are only logged when unset
    pub url: Option<String>,
    /// Bearer key sent with each event
    pub api_key: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Expose headers
    pub expose_headers: Vec<String>,
    /// Max age for preflight cache
    pub max_age: u64,
    /// Allow credentials
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            expose_headers: vec!["x-request-id".to_string()],
            max_age: 86400, // 24 hours
            allow_credentials: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Contract address left at zero
    #[error("contract address not configured: {0}")]
    MissingContract(&'static str),
    /// Signing secret left empty
    #[error("secret not configured: {0}")]
    MissingSecret(&'static str),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Duration (de)serialization as `"500ms"`, `"15s"`, `"10m"` or `"1h"`
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else if let Some(hours) = s.strip_suffix('h') {
            hours
                .trim()
                .parse::<u64>()
                .map(|h| Duration::from_secs(h * 3600))
                .map_err(|_| "invalid hours")
        } else {
            // Plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.contracts.registry = CanonicalAddress::from_bytes([1; 20]);
        config.contracts.achievements = CanonicalAddress::from_bytes([2; 20]);
        config.contracts.rewards = CanonicalAddress::from_bytes([3; 20]);
        config.auth.identity_secret = "identity-test-secret".into();
        config.auth.access_token_secret = "access-test-secret".into();
        config
    }

    #[test]
    fn test_default_config_needs_contracts() {
        let config = GatewayConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingContract("registry"))
        ));
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_secrets_have_no_default() {
        let mut config = configured();
        config.auth = AuthConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSecret("auth.identity_secret"))
        ));

        config.auth.identity_secret = "identity-test-secret".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSecret("auth.access_token_secret"))
        ));
    }

    #[test]
    fn test_config_address() {
        let config = GatewayConfig::default();
        assert_eq!(config.http_addr().port(), 3000);
    }

    #[test]
    fn test_confirmation_validation() {
        let mut config = configured();
        config.confirmation.timeout = Duration::from_secs(1);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))));

        let mut config = configured();
        config.confirmation.required = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_durations() {
        use humantime_serde::parse_duration;
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("15s"), Ok(Duration::from_secs(15)));
        assert_eq!(parse_duration("10m"), Ok(Duration::from_secs(600)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration("42"), Ok(Duration::from_secs(42)));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{
            "node": {"url": "http://node:3889", "network": "regtest", "request_timeout": "5s"},
            "contracts": {
                "registry": "0101010101010101010101010101010101010101",
                "achievements": "0x0202020202020202020202020202020202020202",
                "rewards": "0303030303030303030303030303030303030303"
            },
            "submit": {"gas_limit": 500000},
            "auth": {"identity_secret": "id-secret", "access_token_secret": "access-secret"},
            "confirmation": {"poll_interval": "500ms", "timeout": "2m"}
        }"#;
        let config: GatewayConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.node.network, Network::Regtest);
        assert_eq!(config.submit.gas_limit, 500_000);
        assert_eq!(config.submit.gas_price, SubmitOptions::default().gas_price);
        assert_eq!(config.confirmation.poll_interval, Duration::from_millis(500));
        assert_eq!(config.http.port, 3000);
    }
}
