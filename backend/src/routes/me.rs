use std::sync::Arc;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use login_common::{ErrorBody, UserProfile};

use crate::AppState;

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(ErrorBody::new(message)))
}

/// GET /me - profile of the user owning the bearer session token
async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, ApiError> {
    let claims = state.sessions.authenticate(&headers).map_err(|e| {
        tracing::debug!("Rejected session: {}", e);
        api_error(StatusCode::UNAUTHORIZED, "Unauthorized")
    })?;

    let internal = |e: crate::store::StoreError| {
        tracing::error!("Failed to load profile for {}: {}", claims.sub, e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    let mut user = state.store
        .find_user_by_username(&claims.sub)
        .map_err(internal)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "User not found"))?;

    for role in state.store.roles_for_user(user.id).map_err(internal)? {
        user.add_role(role);
    }

    Ok(Json(user.to_profile()))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/me", get(me))
        .with_state(state)
}
