//! Google login flow: verify the ID token, provision the local user on first
//! login, run the credential check, then issue a session token.

use std::sync::Arc;

use login_common::IdTokenRequest;

use crate::auth::{
    Authentication, CredentialValidator, IdTokenVerifier, PasswordEncoder, SessionIssuer,
    VerifiedClaims,
};
use crate::error::LoginError;
use crate::models::{NewUser, User};
use crate::store::AccountStore;

/// Role every Google account receives on first login.
pub const USER_ROLE_NAME: &str = "ROLE_USER";

/// Parse the login request body. Any failure means "no assertion".
pub fn parse_id_token_request(body: &[u8]) -> Result<IdTokenRequest, LoginError> {
    let request: IdTokenRequest = serde_json::from_slice(body).map_err(|e| {
        tracing::info!("ID token parsing from request body failed: {}", e);
        LoginError::MissingToken
    })?;

    if request.id_token.trim().is_empty() {
        tracing::info!("ID token in request body is empty");
        return Err(LoginError::MissingToken);
    }

    Ok(request)
}

pub struct LoginService {
    verifier: Arc<dyn IdTokenVerifier>,
    validator: Arc<dyn CredentialValidator>,
    store: Arc<AccountStore>,
    encoder: PasswordEncoder,
    sessions: SessionIssuer,
}

impl LoginService {
    pub fn new(
        verifier: Arc<dyn IdTokenVerifier>,
        validator: Arc<dyn CredentialValidator>,
        store: Arc<AccountStore>,
        encoder: PasswordEncoder,
        sessions: SessionIssuer,
    ) -> Self {
        Self {
            verifier,
            validator,
            store,
            encoder,
            sessions,
        }
    }

    /// Run both phases. Returns the authentication and its session token.
    pub async fn login(&self, body: &[u8]) -> Result<(Authentication, String), LoginError> {
        let auth = self.attempt_authentication(body).await?;
        let token = self.successful_authentication(&auth)?;
        Ok((auth, token))
    }

    pub async fn attempt_authentication(&self, body: &[u8]) -> Result<Authentication, LoginError> {
        let request = parse_id_token_request(body)?;

        let claims = self.verifier.verify(&request.id_token).await.map_err(|e| {
            tracing::info!("Google ID token verification failed: {}", e);
            LoginError::Verification(e)
        })?;

        let username = claims.subject.clone();

        if self.store.find_user_by_username(&username)?.is_none() {
            self.register(&claims)?;
        }

        // The placeholder credential is the encoded username.
        let auth = self.validator.authenticate(&username, &username).await.map_err(|e| {
            tracing::info!("Credential check for {} failed: {}", username, e);
            LoginError::from(e)
        })?;

        Ok(auth)
    }

    /// Issue the session token, then stamp the user's last login.
    pub fn successful_authentication(&self, auth: &Authentication) -> Result<String, LoginError> {
        let token = self.sessions.issue(auth)?;

        match self.store.find_user_by_username(auth.name())? {
            Some(mut user) => {
                user.update_last_login();
                self.store.save_user(&user)?;
            }
            None => tracing::warn!("User {} vanished before last login update", auth.name()),
        }

        tracing::info!("Successful Google login for: {}", auth.name());
        Ok(token)
    }

    fn register(&self, claims: &VerifiedClaims) -> Result<User, LoginError> {
        let role = self.store.find_role_by_name(USER_ROLE_NAME)?.ok_or_else(|| {
            tracing::error!("Role {} not found in database.", USER_ROLE_NAME);
            LoginError::MissingSeedRole(USER_ROLE_NAME.to_string())
        })?;

        let new_user = NewUser {
            username: claims.subject.clone(),
            password: self.encoder.encode(&claims.subject)?,
            first_name: claims.given_name.clone(),
            last_name: claims.family_name.clone(),
        };

        let user = self.store.create_user_with_role(&new_user, &role)?;
        Ok(user)
    }
}
