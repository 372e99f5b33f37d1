//! Login failure taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use login_common::ErrorBody;

use crate::auth::{CredentialError, PasswordError, SessionError, VerifyError};
use crate::store::StoreError;

/// Why a login attempt failed. Only the HTTP boundary collapses this into a
/// generic client message.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("ID token missing from request body")]
    MissingToken,

    #[error("ID token verification failed: {0}")]
    Verification(#[from] VerifyError),

    #[error("Credential check failed: {0}")]
    Rejected(CredentialError),

    #[error("Role {0} not found in database")]
    MissingSeedRole(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to encode placeholder credential: {0}")]
    Encoding(#[from] PasswordError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<CredentialError> for LoginError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Store(e) => LoginError::Store(e),
            other => LoginError::Rejected(other),
        }
    }
}

impl LoginError {
    /// Failures the client could cause. Everything else is a server fault.
    pub fn is_bad_credentials(&self) -> bool {
        matches!(
            self,
            LoginError::MissingToken | LoginError::Verification(_) | LoginError::Rejected(_)
        )
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let (status, message) = if self.is_bad_credentials() {
            (StatusCode::UNAUTHORIZED, "Bad credentials")
        } else {
            tracing::error!("Login failed with server error: {}", self);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}
