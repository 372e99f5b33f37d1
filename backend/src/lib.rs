pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod login;
pub mod models;
pub mod routes;
pub mod store;
pub mod test_util;

pub use auth::{Authentication, GoogleIdTokenVerifier, IdTokenVerifier, SessionIssuer};
pub use config::Config;
pub use error::LoginError;
pub use login::LoginService;
pub use store::AccountStore;

use std::sync::Arc;
use axum::{middleware, Router};
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<AccountStore>,
    pub sessions: SessionIssuer,
    pub login: LoginService,
}

/// Build the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::login::router(state.clone()))
        .merge(routes::me::router(state))
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let expose = [axum::http::header::AUTHORIZATION];
    match config.cors_origins() {
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(expose),
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            tracing::info!("CORS configured for origins: {:?}", origins);
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(expose)
        }
    }
}
