use std::sync::Arc;
use tokio::net::TcpListener;

use google_login_backend::auth::{PasswordEncoder, StoreCredentialValidator};
use google_login_backend::{app, logging, AccountStore, AppState, Config, GoogleIdTokenVerifier, LoginService, SessionIssuer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    logging::init(&config.logging.level);

    tracing::info!("Starting Google login backend");
    if config.google.client_ids.is_empty() {
        tracing::warn!("google.client_ids is empty, every ID token will be rejected");
    }

    // Initialize components
    let store = Arc::new(AccountStore::new(&config.database.url)?);
    for role in &config.database.seed_roles {
        store.ensure_role(role)?;
    }

    let verifier = GoogleIdTokenVerifier::new(&config.google).await?;
    let encoder = PasswordEncoder::new()?;
    let validator = StoreCredentialValidator::new(store.clone(), encoder.clone());
    let sessions = SessionIssuer::new(&config.session);

    let login = LoginService::new(
        Arc::new(verifier),
        Arc::new(validator),
        store.clone(),
        encoder,
        sessions.clone(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        sessions,
        login,
    });

    let app = app(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {} (login endpoint: POST {})", addr, config.server.login_path);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
