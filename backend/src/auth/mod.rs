//! Authentication collaborators for the Google login flow.
//!
//! - Google ID token verification against Google's JWKS
//! - Argon2id placeholder credentials
//! - Store-backed credential validation
//! - Session token issuance

pub mod credentials;
pub mod google;
pub mod password;
pub mod session;

pub use credentials::{Authentication, CredentialError, CredentialValidator, StoreCredentialValidator};
pub use google::{GoogleIdTokenVerifier, IdTokenVerifier, VerifiedClaims, VerifyError};
pub use password::{PasswordEncoder, PasswordError};
pub use session::{SessionClaims, SessionError, SessionIssuer};
