pub mod auth;
pub mod enrollments;
pub mod events;

use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "message": "Authentication & Event API ready" }))
}
