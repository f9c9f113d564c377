//! Handoff token endpoints, inbound and outbound.

use crate::error::ApiError;
use crate::middleware::session::{CurrentIdentity, require_session};
use crate::redirect;
use crate::state::AppState;
use axum::{
    Extension, Json, Router,
    extract::Query,
    http::{HeaderValue, header},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use handoff_session::IdentityProfile;
use handoff_token::IdentityAssertion;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

pub fn router() -> Router {
    Router::new()
        .route("/auth/sso/callback", get(sso_callback))
        .route(
            "/api/auth/outbound-token",
            post(outbound_token).route_layer(middleware::from_fn(require_session)),
        )
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub token: Option<String>,
    pub return_to: Option<String>,
}

/// Accept a handoff token from the peer platform.
///
/// Every outcome is a redirect: to `return_to` with a session cookie on
/// success, otherwise to the login page with an error code.
pub async fn sso_callback(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let login_path = state.config.server.login_path.as_str();

    let token = params.token.as_deref().map(str::trim).unwrap_or_default();
    if token.is_empty() {
        return redirect::to_login(login_path, "missing_token");
    }

    let assertion = match state.codec.decode(token) {
        Ok(assertion) => assertion,
        Err(e) => {
            tracing::info!(kind = e.kind(), "SSO callback rejected handoff token");
            return redirect::to_login(login_path, e.public_reason());
        }
    };

    let profile = IdentityProfile {
        email: assertion.email,
        first_name: assertion.first_name,
        last_name: assertion.last_name,
        customer_id: assertion.customer_id,
    };
    let identity = match state.identities.upsert(&profile).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create or update identity");
            return redirect::to_login(login_path, "user_creation_failed");
        }
    };

    let handle = match state.sessions.issue(identity.id).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(identity_id = %identity.id, error = %e, "Failed to issue session");
            return redirect::to_login(login_path, "authentication_failed");
        }
    };

    let Ok(set_cookie) = HeaderValue::from_str(&state.cookie.set(&handle)) else {
        tracing::error!("Session cookie is not a valid header value");
        return redirect::to_login(login_path, "authentication_failed");
    };

    let target = redirect::safe_return_to(
        params.return_to.as_deref(),
        &state.config.server.default_return_to,
    );
    tracing::info!(identity_id = %identity.id, session = %handle, "SSO login completed");

    let mut response = Redirect::to(&target).into_response();
    response.headers_mut().insert(header::SET_COOKIE, set_cookie);
    response
}

/// Mint a handoff token for the signed-in identity.
pub async fn outbound_token(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentIdentity(identity)): Extension<CurrentIdentity>,
) -> Result<Json<Value>, ApiError> {
    let assertion = IdentityAssertion {
        first_name: identity.first_name,
        last_name: identity.last_name,
        customer_id: identity.customer_id,
        ..IdentityAssertion::new(identity.email, Utc::now())
    };
    let token = state.codec.encode(&assertion)?;

    let mut body = Map::new();
    if let Some(template) = &state.config.server.outbound_redirect {
        body.insert(
            "redirect_url".to_string(),
            Value::String(redirect::fill_template(template, &token)),
        );
    }
    body.insert("token".to_string(), Value::String(token));

    tracing::info!(identity_id = %identity.id, "Outbound handoff token issued");
    Ok(Json(Value::Object(body)))
}
