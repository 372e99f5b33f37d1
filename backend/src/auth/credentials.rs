use std::sync::Arc;
use async_trait::async_trait;

use super::password::PasswordEncoder;
use crate::store::{AccountStore, StoreError};

/// An authenticated principal and the authorities granted to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    pub principal: String,
    pub authorities: Vec<String>,
}

impl Authentication {
    pub fn name(&self) -> &str {
        &self.principal
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Bad credentials")]
    BadCredentials,
    #[error("User is disabled")]
    Disabled,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Final credential check performed before a session is established.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn authenticate(&self, principal: &str, credential: &str) -> Result<Authentication, CredentialError>;
}

/// Checks credentials against the account store. Authorities come from the
/// persisted role assignments.
pub struct StoreCredentialValidator {
    store: Arc<AccountStore>,
    encoder: PasswordEncoder,
}

impl StoreCredentialValidator {
    pub fn new(store: Arc<AccountStore>, encoder: PasswordEncoder) -> Self {
        Self { store, encoder }
    }
}

#[async_trait]
impl CredentialValidator for StoreCredentialValidator {
    async fn authenticate(&self, principal: &str, credential: &str) -> Result<Authentication, CredentialError> {
        let user = self.store
            .find_user_by_username(principal)?
            .ok_or(CredentialError::BadCredentials)?;

        if !self.encoder.matches(credential, &user.password) {
            return Err(CredentialError::BadCredentials);
        }

        if !user.enabled {
            return Err(CredentialError::Disabled);
        }

        let authorities = self.store
            .roles_for_user(user.id)?
            .into_iter()
            .map(|r| r.name)
            .collect();

        Ok(Authentication {
            principal: user.username,
            authorities,
        })
    }
}
