//! JSON error responses.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use handoff_session::{AuthError, StoreError};
use handoff_token::TokenError;
use serde_json::json;

/// Errors returned by the JSON endpoints.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Store(StoreError),
    Token(TokenError),
    Internal(&'static str),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        ApiError::Token(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Auth(AuthError::Missing) => (StatusCode::UNAUTHORIZED, "not_authenticated"),
            ApiError::Auth(AuthError::InvalidOrExpired) => {
                (StatusCode::UNAUTHORIZED, "invalid_or_expired_session")
            }
            ApiError::Auth(AuthError::StoreUnavailable(_)) | ApiError::Store(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "session_store_unavailable")
            }
            ApiError::Token(e) => {
                tracing::error!(kind = e.kind(), "Failed to mint handoff token");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            ApiError::Internal(what) => {
                tracing::error!(what, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let mut response = (status, Json(json!({ "error": code }))).into_response();
        if matches!(self, ApiError::Auth(AuthError::Missing)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
