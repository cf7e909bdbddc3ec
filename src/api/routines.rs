use axum::{
    extract::{Path, State},
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use serde_json::{json, Value};

use super::AppState;
use crate::auth::{jwt_auth_middleware, UserSession};
use crate::errors::{AppError, AppResult};
use crate::models::Level;

/// Routine catalog routes. Browsing is public, the daily recommendation
/// requires a session.
pub fn routine_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/recommended/:level", get(recommended))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/", get(list_all))
        .route("/:level", get(list_for_level))
        .route("/:level/:id", get(routine_detail))
        .merge(protected)
        .with_state(state)
}

async fn list_all(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "routines": state.catalog.as_ref(),
    }))
}

async fn list_for_level(State(state): State<AppState>, Path(level): Path<String>) -> AppResult<Json<Value>> {
    let level: Level = level.parse()?;

    Ok(Json(json!({
        "success": true,
        "level": level,
        "routines": state.catalog.by_level(level),
    })))
}

async fn routine_detail(
    State(state): State<AppState>,
    Path((level, id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let level: Level = level.parse()?;
    let routine = state
        .catalog
        .find(level, &id)
        .ok_or_else(|| AppError::not_found(format!("Routine '{}' not found for level {}", id, level.as_str())))?;

    Ok(Json(json!({
        "success": true,
        "routine": routine,
    })))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, level = %level))]
async fn recommended(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(level): Path<String>,
) -> AppResult<Json<Value>> {
    let level: Level = level.parse()?;
    let recommended = state
        .catalog
        .recommended_for(level, &state.calendar, state.progress.now());

    Ok(Json(json!({
        "success": true,
        "level": level,
        "recommended": recommended,
    })))
}
