//! Login endpoint request and response bodies.

use serde::{Deserialize, Serialize};

/// Body of `POST /google-login`.
///
/// Web clients send the Google credential as `idToken`; `id_token` is
/// accepted as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTokenRequest {
    #[serde(alias = "id_token")]
    pub id_token: String,
}

/// Body returned alongside the `Authorization` header on a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
}

/// Uniform error body. Never carries failure details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
