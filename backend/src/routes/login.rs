use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use login_common::LoginResponse;

use crate::auth::session;
use crate::error::LoginError;
use crate::AppState;

/// POST /google-login - exchange a Google ID token for a session token.
///
/// The body is taken as raw bytes so a malformed body is reported as bad
/// credentials rather than as a JSON rejection.
async fn google_login(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, LoginError> {
    let (auth, token) = state.login.login(&body).await?;

    let mut response = Json(LoginResponse {
        username: auth.principal,
    })
    .into_response();
    session::add_token(response.headers_mut(), &token)?;

    Ok(response)
}

pub fn router(state: Arc<AppState>) -> Router {
    let path = state.config.server.login_path.clone();
    Router::new()
        .route(&path, post(google_login))
        .with_state(state)
}
