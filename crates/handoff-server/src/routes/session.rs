//! Session endpoints.

use crate::error::ApiError;
use crate::middleware::session::{CurrentIdentity, extract_session_handle, require_session};
use crate::state::AppState;
use axum::{
    Extension, Json, Router,
    http::{HeaderMap, HeaderValue, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use handoff_session::Identity;
use serde_json::json;
use std::sync::Arc;

pub fn router() -> Router {
    Router::new()
        .route("/auth/logout", post(logout))
        .route(
            "/api/me",
            get(me).route_layer(middleware::from_fn(require_session)),
        )
}

/// Revoke the caller's session and clear the cookie.
pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let revoked = match extract_session_handle(&headers, &state.cookie) {
        Some(handle) => state.sessions.revoke(&handle).await?,
        None => false,
    };

    let mut response = Json(json!({ "revoked": revoked })).into_response();
    let clear = HeaderValue::from_str(&state.cookie.clear())
        .map_err(|_| ApiError::Internal("session cookie is not a valid header value"))?;
    response.headers_mut().insert(header::SET_COOKIE, clear);
    Ok(response)
}

pub async fn me(
    Extension(CurrentIdentity(identity)): Extension<CurrentIdentity>,
) -> Json<Identity> {
    Json(identity)
}
