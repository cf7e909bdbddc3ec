use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Experience, Gender, Level, Objective, User, UserResponse};

/// JWT token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user ID)
    pub email: String, // User email
    pub exp: usize,    // Expiration time
    pub iat: usize,    // Issued at
    pub jti: String,   // JWT ID (for revocation)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub weight_kg: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub objective: Option<Objective>,
    pub activity_level: Option<Level>,
    pub experience: Option<Experience>,
    pub available_days: Option<i32>,
    pub available_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Questionnaire result. `level` falls back to the one derived from `score`.
#[derive(Debug, Deserialize)]
pub struct QuestionnaireRequest {
    pub score: Option<i32>,
    pub level: Option<Level>,
}

/// Partial profile update, absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub weight_kg: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity_level: Option<Level>,
    pub objective: Option<Objective>,
    pub experience: Option<Experience>,
    pub available_days: Option<i32>,
    pub available_minutes: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub success: bool,
    pub user: UserResponse,
    pub recommended_daily_calories: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Authenticated request context, inserted by the auth middleware
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: Uuid,
    pub email: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
    /// User as loaded when the request was authenticated
    pub user: User,
}
