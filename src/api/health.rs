use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use super::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "fitness-tracker",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage_backend,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
