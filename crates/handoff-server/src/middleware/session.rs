use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::Request,
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use handoff_session::{Identity, SessionCookie};
use std::sync::Arc;

/// The identity behind an authenticated request.
#[derive(Clone, Debug)]
pub struct CurrentIdentity(pub Identity);

/// Axum middleware resolving the presented session handle to an identity.
///
/// Rejections distinguish "not signed in" from "store down"; see [`ApiError`].
pub async fn require_session(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or(ApiError::Internal("application state missing"))?;

    let handle = extract_session_handle(req.headers(), &state.cookie).unwrap_or_default();
    let identity = state.sessions.authenticate(&handle).await?;

    req.extensions_mut().insert(CurrentIdentity(identity));
    Ok(next.run(req).await)
}

/// Find the session handle: the session cookie first, then a bearer token.
pub fn extract_session_handle(headers: &HeaderMap, cookie: &SessionCookie) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        if let Some(handle) = value.to_str().ok().and_then(|v| cookie.extract(v)) {
            return Some(handle.to_string());
        }
    }

    if let Some(v) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        if let Some(rest) = v.strip_prefix("Bearer ") {
            let rest = rest.trim();
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
    }
    None
}
