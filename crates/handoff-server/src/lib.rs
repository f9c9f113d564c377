//! # handoff-server
//!
//! Thin HTTP wiring around the handoff token codec and session manager.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /health` | Liveness |
//! | `GET /auth/sso/callback` | Accept an inbound handoff token and start a session |
//! | `POST /auth/logout` | Revoke the caller's session |
//! | `GET /api/me` | The identity behind the caller's session |
//! | `POST /api/auth/outbound-token` | Mint a handoff token for the caller |

pub mod error;
pub mod middleware;
pub mod redirect;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::{Extension, Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .merge(routes::sso::router())
        .merge(routes::session::router())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
