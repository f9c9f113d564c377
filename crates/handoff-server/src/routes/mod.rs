pub mod session;
pub mod sso;

use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
