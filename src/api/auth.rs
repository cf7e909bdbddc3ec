use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};

use super::AppState;
use crate::auth::{
    jwt_auth_middleware, AuthResponse, LoginRequest, MeResponse, MessageResponse, QuestionnaireRequest,
    RegisterRequest, UpdateProfileRequest, UserEnvelope, UserSession,
};
use crate::errors::AppResult;
use crate::models::{User, UserResponse};

/// Authentication routes
pub fn auth_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(me))
        .route("/questionnaire", put(save_questionnaire))
        .route("/profile", put(update_profile))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}

/// Register a new user
#[tracing::instrument(skip_all)]
async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let Json(request) = payload?;
    let response = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[tracing::instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(request) = payload?;
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn me(State(state): State<AppState>, Extension(session): Extension<UserSession>) -> Json<MeResponse> {
    Json(state.auth.me(&session))
}

/// Store the questionnaire result; the new level re-seeds weekly goals
#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn save_questionnaire(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    payload: Result<Json<QuestionnaireRequest>, JsonRejection>,
) -> AppResult<Json<UserEnvelope>> {
    let Json(request) = payload?;
    let user = state.auth.save_questionnaire(&session, request).await?;
    sync_level(&state, &session, &user).await?;

    Ok(Json(UserEnvelope {
        success: true,
        message: Some("Questionnaire saved".to_string()),
        user: UserResponse::from(&user),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> AppResult<Json<UserEnvelope>> {
    let Json(request) = payload?;
    let user = state.auth.update_profile(&session, request).await?;
    sync_level(&state, &session, &user).await?;

    Ok(Json(UserEnvelope {
        success: true,
        message: None,
        user: UserResponse::from(&user),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn refresh(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(state.auth.refresh(&session)?))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<MessageResponse>> {
    state.auth.logout(&session).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Successfully logged out".to_string(),
    }))
}

async fn sync_level(state: &AppState, session: &UserSession, updated: &User) -> AppResult<()> {
    if updated.activity_level != session.user.activity_level {
        state
            .progress
            .sync_goals_to_level(updated.id, updated.activity_level)
            .await?;
    }
    Ok(())
}
