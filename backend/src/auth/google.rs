use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::GoogleConfig;

/// Claims extracted from a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    /// Stable Google account identifier
    pub subject: String,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Malformed token: {0}")]
    Malformed(String),
    #[error("Key not found for kid: {0}")]
    KeyNotFound(String),
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("JWKS fetch error: {0}")]
    KeyFetch(String),
}

/// Verifies identity assertions issued by an external provider.
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<VerifiedClaims, VerifyError>;
}

#[derive(Debug, Deserialize)]
struct OidcConfig {
    jwks_uri: String,
}

/// JWKS key set response.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    #[allow(dead_code)]
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

/// Google ID token payload fields we care about.
#[derive(Debug, Deserialize)]
struct GoogleClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

/// Verifies Google ID tokens against Google's published signing keys.
pub struct GoogleIdTokenVerifier {
    http_client: Client,
    jwks_uri: String,
    keys: Arc<RwLock<HashMap<String, DecodingKey>>>,
    last_refresh: RwLock<Option<Instant>>,
    min_refresh_interval: Duration,
    client_ids: Vec<String>,
    allowed_issuers: Vec<String>,
}

impl GoogleIdTokenVerifier {
    pub async fn new(config: &GoogleConfig) -> Result<Self, VerifyError> {
        let http_client = Client::new();

        // Fetch OIDC configuration to get JWKS URI
        let config_url = format!(
            "{}/.well-known/openid-configuration",
            config.issuer.trim_end_matches('/')
        );
        let discovery: OidcConfig = http_client
            .get(&config_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

        let verifier = Self {
            http_client,
            jwks_uri: discovery.jwks_uri,
            keys: Arc::new(RwLock::new(HashMap::new())),
            last_refresh: RwLock::new(None),
            min_refresh_interval: Duration::from_secs(60),
            client_ids: config.client_ids.clone(),
            allowed_issuers: config.allowed_issuers.clone(),
        };

        verifier.refresh_keys().await?;

        Ok(verifier)
    }

    /// Minimum delay between two key refreshes triggered by unknown `kid`s.
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    async fn refresh_keys(&self) -> Result<(), VerifyError> {
        tracing::info!("Fetching JWKS from {}", self.jwks_uri);

        *self.last_refresh.write().await = Some(Instant::now());

        let response: JwksResponse = self.http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

        let mut keys = self.keys.write().await;
        keys.clear();

        for jwk in response.keys {
            if jwk.kty == "RSA" {
                if let (Some(n), Some(e)) = (&jwk.n, &jwk.e) {
                    match DecodingKey::from_rsa_components(n, e) {
                        Ok(key) => {
                            keys.insert(jwk.kid.clone(), key);
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse RSA key {}: {}", jwk.kid, e);
                        }
                    }
                }
            }
        }

        tracing::info!("Loaded {} JWKS keys", keys.len());
        Ok(())
    }

    async fn refresh_allowed(&self) -> bool {
        match *self.last_refresh.read().await {
            Some(at) => at.elapsed() >= self.min_refresh_interval,
            None => true,
        }
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        // Google rotates its signing keys; an unknown kid may be a new one.
        if self.refresh_allowed().await {
            self.refresh_keys().await?;
            if let Some(key) = self.keys.read().await.get(kid) {
                return Ok(key.clone());
            }
        }

        Err(VerifyError::KeyNotFound(kid.to_string()))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&self.allowed_issuers);
        validation.set_audience(&self.client_ids);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedClaims, VerifyError> {
        if self.client_ids.is_empty() {
            return Err(VerifyError::Invalid("no client ids configured".to_string()));
        }

        // Decode header to get kid
        let header = decode_header(id_token)
            .map_err(|e| VerifyError::Malformed(e.to_string()))?;

        let kid = header.kid
            .ok_or_else(|| VerifyError::Malformed("Missing kid in token header".to_string()))?;

        let key = self.key_for(&kid).await?;

        let token_data = decode::<GoogleClaims>(id_token, &key, &self.validation())
            .map_err(|e| VerifyError::Invalid(e.to_string()))?;

        let claims = token_data.claims;
        Ok(VerifiedClaims {
            subject: claims.sub,
            email: claims.email,
            given_name: claims.given_name,
            family_name: claims.family_name,
        })
    }
}
