//! Google Login Common Types
//!
//! Shared types used by the login backend and its clients.

pub mod login;
pub mod profile;

pub use login::{ErrorBody, IdTokenRequest, LoginResponse};
pub use profile::UserProfile;
