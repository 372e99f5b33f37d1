pub mod fake_verifier;
pub mod keys;

pub use fake_verifier::{claims, FakeVerifier};

use std::sync::Arc;
use crate::auth::{IdTokenVerifier, PasswordEncoder, SessionIssuer, StoreCredentialValidator};
use crate::config::{Config, CorsConfig, DatabaseConfig, GoogleConfig, LoggingConfig, ServerConfig, SessionConfig};
use crate::login::{LoginService, USER_ROLE_NAME};
use crate::store::AccountStore;
use crate::AppState;

pub const TEST_CLIENT_ID: &str = "test-client.apps.googleusercontent.com";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            login_path: "/google-login".to_string(),
        },
        google: GoogleConfig {
            client_ids: vec![TEST_CLIENT_ID.to_string()],
            issuer: "https://test-issuer".to_string(),
            allowed_issuers: vec![
                "accounts.google.com".to_string(),
                "https://accounts.google.com".to_string(),
            ],
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
            seed_roles: vec![USER_ROLE_NAME.to_string()],
        },
        session: SessionConfig {
            secret: "test-secret-key-for-testing-only".to_string(),
            ttl_hours: 1,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        cors: CorsConfig { origins: "*".to_string() },
    }
}

/// Cheap Argon2 parameters so tests stay fast.
pub fn test_encoder() -> PasswordEncoder {
    PasswordEncoder::with_params(1024, 1, 1).expect("valid test params")
}

/// In-memory store, optionally seeded with the default user role.
pub fn test_store(seed_user_role: bool) -> Arc<AccountStore> {
    let store = AccountStore::new(":memory:").expect("in-memory store");
    if seed_user_role {
        store.ensure_role(USER_ROLE_NAME).expect("seed role");
    }
    Arc::new(store)
}

pub fn test_login_service<V>(verifier: V, seed_user_role: bool) -> (LoginService, Arc<AccountStore>)
where
    V: IdTokenVerifier + 'static,
{
    let config = test_config();
    let store = test_store(seed_user_role);
    let validator = StoreCredentialValidator::new(store.clone(), test_encoder());
    let service = LoginService::new(
        Arc::new(verifier),
        Arc::new(validator),
        store.clone(),
        test_encoder(),
        SessionIssuer::new(&config.session),
    );
    (service, store)
}

pub fn create_test_state<V>(verifier: V, seed_user_role: bool) -> Arc<AppState>
where
    V: IdTokenVerifier + 'static,
{
    let config = test_config();
    let (login, store) = test_login_service(verifier, seed_user_role);
    Arc::new(AppState {
        sessions: SessionIssuer::new(&config.session),
        config,
        store,
        login,
    })
}
