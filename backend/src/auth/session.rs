//! Session token creation and validation.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::credentials::Authentication;
use crate::config::SessionConfig;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Session JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (local username)
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to sign session token: {0}")]
    Signing(String),
    #[error("Invalid session token: {0}")]
    Invalid(String),
    #[error("Missing session token")]
    Missing,
}

/// Issues and validates HS256 session tokens.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: Duration::hours(config.ttl_hours),
        }
    }

    pub fn issue(&self, auth: &Authentication) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: auth.principal.clone(),
            roles: auth.authorities.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| SessionError::Invalid(e.to_string()))
    }

    /// Validate the bearer token carried by `headers`.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<SessionClaims, SessionError> {
        let token = bearer_token(headers).ok_or(SessionError::Missing)?;
        self.validate(token)
    }
}

/// Attach a session token to a response.
pub fn add_token(headers: &mut HeaderMap, token: &str) -> Result<(), SessionError> {
    let value = HeaderValue::from_str(&format!("{}{}", BEARER_PREFIX, token))
        .map_err(|e| SessionError::Signing(e.to_string()))?;
    headers.insert(header::AUTHORIZATION, value);
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("Authorization"),
    );
    Ok(())
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}
