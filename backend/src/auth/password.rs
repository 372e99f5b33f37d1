//! Argon2id credential encoding.
//!
//! Google accounts never log in with a password, but every local user still
//! carries an encoded credential so the generic credential check can run.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

// 19 MiB memory, 2 iterations, parallelism 1
const DEFAULT_M_COST_KIB: u32 = 19_456;
const DEFAULT_T_COST: u32 = 2;
const DEFAULT_P_COST: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),
    #[error("Failed to hash credential: {0}")]
    Hash(String),
}

/// Encodes raw credentials into PHC strings and checks them back.
#[derive(Clone)]
pub struct PasswordEncoder {
    argon2: Argon2<'static>,
}

impl PasswordEncoder {
    pub fn new() -> Result<Self, PasswordError> {
        Self::with_params(DEFAULT_M_COST_KIB, DEFAULT_T_COST, DEFAULT_P_COST)
    }

    pub fn with_params(m_cost_kib: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(m_cost_kib, t_cost, p_cost, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn encode(&self, raw: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Returns false for a mismatch and for an unparseable stored value.
    pub fn matches(&self, raw: &str, encoded: &str) -> bool {
        let parsed = match PasswordHash::new(encoded) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored credential is not a valid PHC string: {}", e);
                return false;
            }
        };
        self.argon2.verify_password(raw.as_bytes(), &parsed).is_ok()
    }
}
