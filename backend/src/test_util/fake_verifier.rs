use std::collections::HashMap;
use async_trait::async_trait;

use crate::auth::{IdTokenVerifier, VerifiedClaims, VerifyError};

/// Verifier that accepts a fixed set of tokens. Anything else fails as a
/// signature error.
#[derive(Debug, Default)]
pub struct FakeVerifier {
    tokens: HashMap<String, VerifiedClaims>,
}

impl FakeVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, claims: VerifiedClaims) -> Self {
        self.tokens.insert(token.to_string(), claims);
        self
    }
}

#[async_trait]
impl IdTokenVerifier for FakeVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedClaims, VerifyError> {
        self.tokens
            .get(id_token)
            .cloned()
            .ok_or_else(|| VerifyError::Invalid("InvalidSignature".to_string()))
    }
}

pub fn claims(subject: &str, given_name: Option<&str>, family_name: Option<&str>) -> VerifiedClaims {
    VerifiedClaims {
        subject: subject.to_string(),
        email: Some(format!("{}@example.com", subject)),
        given_name: given_name.map(String::from),
        family_name: family_name.map(String::from),
    }
}
