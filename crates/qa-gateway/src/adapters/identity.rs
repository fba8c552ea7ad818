//! JWT identity verification and access-token issuance.
//!
//! Identity tokens are HS256 JWTs minted by the auth service; a token is
//! valid for an identity when its signature checks out, it has not expired
//! and its `sub` claim equals the identity. Access tokens are HS256 JWTs
//! minted here, with the verified display address as subject.

use crate::domain::{AuthToken, DisplayAddress, Identity};
use crate::ports::{AccessTokenIssuer, AuthError, IdentityVerifier};
use async_trait::async_trait;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Claims read from identity tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Claims written into access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Verified display address
    pub sub: String,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    name: Option<String>,
}

fn unix_now() -> Result<u64, AuthError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuthError::Signing(format!("system time error: {}", e)))
}

/// Verifies identity tokens and looks up profile names.
pub struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
    profiles: Option<(reqwest::Client, reqwest::Url)>,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            profiles: None,
        }
    }

    /// Resolve profile names from `GET {base}/{identity}`.
    pub fn with_profile_service(mut self, base: &str, timeout: Duration) -> Result<Self, AuthError> {
        let url = reqwest::Url::parse(base).map_err(|e| AuthError::Profile(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(AuthError::Profile(format!("{} cannot be a base url", base)));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Profile(e.to_string()))?;
        self.profiles = Some((client, url));
        Ok(self)
    }

    fn profile_url(base: &reqwest::Url, identity: &Identity) -> Result<reqwest::Url, AuthError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| AuthError::Profile("profile url cannot be a base".into()))?
            .pop_if_empty()
            .push(identity.as_str());
        Ok(url)
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn validate_token(&self, identity: &Identity, token: &AuthToken) -> bool {
        match decode::<IdentityClaims>(token.expose(), &self.key, &self.validation) {
            Ok(data) if data.claims.sub == identity.as_str() => true,
            Ok(_) => {
                debug!(identity = %identity, "token subject does not match identity");
                false
            }
            Err(err) => {
                debug!(identity = %identity, error = %err, "identity token rejected");
                false
            }
        }
    }

    async fn profile_name(&self, identity: &Identity) -> Result<String, AuthError> {
        let Some((client, base)) = &self.profiles else {
            return Ok(identity.to_string());
        };

        let url = Self::profile_url(base, identity)?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::Profile(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!(identity = %identity, "no profile found, using identity as name");
            return Ok(identity.to_string());
        }
        if !response.status().is_success() {
            return Err(AuthError::Profile(format!("status {}", response.status())));
        }

        let profile: Profile = response
            .json()
            .await
            .map_err(|e| AuthError::Profile(e.to_string()))?;

        Ok(profile
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| identity.to_string()))
    }
}

/// Mints access tokens for verified addresses.
#[derive(Clone)]
pub struct JwtAccessTokenIssuer {
    key: EncodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtAccessTokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
        }
    }
}

impl AccessTokenIssuer for JwtAccessTokenIssuer {
    fn issue(&self, address: &DisplayAddress) -> Result<String, AuthError> {
        let now = unix_now()?;
        let claims = AccessClaims {
            sub: address.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}
