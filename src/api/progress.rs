use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    response::Json,
    routing::{delete, get, post, put},
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::AppState;
use crate::analytics::{MonthlyStats, RoundedPercentages};
use crate::auth::{jwt_auth_middleware, UserSession};
use crate::errors::{AppError, AppResult};
use crate::models::{CompletedRoutineEntry, Level, NewCompletion, NewExercise, NotificationPrefs, WeeklyGoals};
use crate::services::NotificationUpdate;

pub fn progress_routes(state: AppState) -> Router {
    Router::new()
        .route("/weekly", get(weekly_progress))
        .route("/statistics", get(statistics))
        .route("/monthly", get(monthly))
        .route("/routines", post(register_routine))
        .route("/routines/:routine_ref", delete(undo_routine))
        .route("/reset-weekly", post(reset_weekly))
        .route("/reset-all", post(reset_all))
        .route("/goals", put(update_goals))
        .route("/notifications", put(update_notifications))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRoutineRequest {
    pub routine_ref: Option<String>,
    pub routine_name: Option<String>,
    pub level: Option<String>,
    pub total_minutes: Option<u32>,
    pub calories: Option<u32>,
    #[serde(default)]
    pub exercises: Vec<ExerciseInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseInput {
    pub exercise_ref: Option<String>,
    pub exercise_name: Option<String>,
    #[serde(default)]
    pub done: bool,
    pub reps: Option<u32>,
    pub sets: Option<u32>,
    pub weight: Option<f64>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(format!("{} is required", field))),
    }
}

impl RegisterRoutineRequest {
    pub fn into_completion(self) -> AppResult<NewCompletion> {
        let routine_ref = required(self.routine_ref, "routineRef")?;
        let routine_name = required(self.routine_name, "routineName")?;
        let level: Level = required(self.level, "level")?.parse()?;

        let exercises = self
            .exercises
            .into_iter()
            .enumerate()
            .map(|(index, exercise)| -> AppResult<NewExercise> {
                Ok(NewExercise {
                    exercise_ref: required(exercise.exercise_ref, &format!("exercises[{}].exerciseRef", index))?,
                    exercise_name: required(exercise.exercise_name, &format!("exercises[{}].exerciseName", index))?,
                    done: exercise.done,
                    reps: exercise.reps,
                    sets: exercise.sets,
                    weight: exercise.weight,
                    duration_minutes: exercise.duration_minutes,
                    notes: exercise.notes,
                    recorded_at: exercise.recorded_at,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(NewCompletion {
            routine_ref,
            routine_name,
            level,
            total_minutes: self.total_minutes,
            calories: self.calories,
            exercises,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsRequest {
    pub routines_per_week: u32,
    pub minutes_per_week: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsRequest {
    pub daily_reminders: Option<bool>,
    pub reminder_time: Option<String>,
    pub motivational: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekTotals {
    pub routines_completed: u32,
    pub minutes_trained: u64,
    pub calories_burned: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsView {
    pub routines_per_week: u32,
    pub minutes_per_week: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_per_week: Option<u32>,
}

impl GoalsView {
    fn from_goals(goals: &WeeklyGoals, calories_per_week: Option<u32>) -> Self {
        Self {
            routines_per_week: goals.target_routines_per_week,
            minutes_per_week: goals.target_minutes_per_week,
            calories_per_week,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub id: Uuid,
    pub routine_ref: String,
    pub routine_name: String,
    pub level: Level,
    pub total_minutes: u32,
    pub calories: u32,
    pub completed_at: DateTime<Utc>,
}

impl From<CompletedRoutineEntry> for EntrySummary {
    fn from(entry: CompletedRoutineEntry) -> Self {
        Self {
            id: entry.id,
            routine_ref: entry.routine_ref,
            routine_name: entry.routine_name,
            level: entry.level,
            total_minutes: entry.total_minutes,
            calories: entry.calories,
            completed_at: entry.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyResponse {
    pub success: bool,
    pub weekly_progress: WeekTotals,
    pub percentages: RoundedPercentages,
    pub goals: GoalsView,
    pub level: Level,
    pub entries: Vec<EntrySummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsView {
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_routines: u32,
    pub total_exercises: u32,
    pub total_minutes: u64,
    pub total_calories: u64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyResponse {
    pub success: bool,
    pub monthly: MonthlyStats,
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn weekly_progress(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<WeeklyResponse>> {
    let report = state
        .progress
        .weekly_progress(session.user_id, session.user.activity_level)
        .await?;

    Ok(Json(WeeklyResponse {
        success: true,
        weekly_progress: WeekTotals {
            routines_completed: report.week.routines,
            minutes_trained: report.week.minutes,
            calories_burned: report.week.calories,
        },
        percentages: report.percentages.rounded(),
        goals: GoalsView::from_goals(&report.goals, report.calories_per_week),
        level: report.level,
        entries: report.entries.into_iter().map(EntrySummary::from).collect(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn statistics(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<Value>> {
    let stats = state
        .progress
        .statistics(session.user_id, session.user.activity_level)
        .await?;

    let statistics = StatisticsView {
        current_streak: stats.current_streak_days,
        best_streak: stats.best_streak_days,
        total_routines: stats.total_routines,
        total_exercises: stats.total_exercises,
        total_minutes: stats.total_minutes,
        total_calories: stats.total_calories,
    };

    Ok(Json(json!({
        "success": true,
        "statistics": statistics,
    })))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn monthly(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<MonthlyResponse>> {
    let monthly = state
        .progress
        .monthly(session.user_id, session.user.activity_level)
        .await?;

    Ok(Json(MonthlyResponse {
        success: true,
        monthly,
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn register_routine(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    payload: Result<Json<RegisterRoutineRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(request) = payload?;
    let completion = request.into_completion()?;

    if state.catalog.find_any(&completion.routine_ref).is_none() {
        tracing::debug!(routine_ref = %completion.routine_ref, "Registering a routine outside the catalog");
    }

    let registration = state
        .progress
        .register_completion(session.user_id, session.user.activity_level, completion)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Routine registered",
        "entryId": registration.entry.id,
        "progress": {
            "totalRoutines": registration.total_routines,
            "minutesAwarded": registration.entry.total_minutes,
            "caloriesAwarded": registration.entry.calories,
        },
    })))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id, routine_ref = %routine_ref))]
async fn undo_routine(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(routine_ref): Path<String>,
) -> AppResult<Json<Value>> {
    let removed = state
        .progress
        .undo_completion(session.user_id, &routine_ref)
        .await?;

    let message = if removed.is_some() {
        "Routine removed from today's progress"
    } else {
        "No completion of this routine recorded today"
    };

    Ok(Json(json!({
        "success": true,
        "removed": removed.is_some(),
        "message": message,
    })))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn reset_weekly(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<Value>> {
    let removed = state.progress.reset_weekly(session.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "removed": removed,
        "message": "Weekly progress reset",
    })))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn reset_all(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<Value>> {
    state.progress.reset_all(session.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "All progress has been reset",
    })))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn update_goals(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    payload: Result<Json<GoalsRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(request) = payload?;
    let goals = WeeklyGoals {
        target_routines_per_week: request.routines_per_week,
        target_minutes_per_week: request.minutes_per_week,
    };

    let goals = state
        .progress
        .update_goals(session.user_id, session.user.activity_level, goals)
        .await?;

    Ok(Json(json!({
        "success": true,
        "goals": GoalsView::from_goals(&goals, None),
    })))
}

#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
async fn update_notifications(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    payload: Result<Json<NotificationsRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(request) = payload?;
    let update = NotificationUpdate {
        daily_reminders: request.daily_reminders,
        reminder_time: request.reminder_time,
        motivational: request.motivational,
    };

    let notifications: NotificationPrefs = state
        .progress
        .update_notifications(session.user_id, session.user.activity_level, update)
        .await?;

    Ok(Json(json!({
        "success": true,
        "notifications": notifications,
    })))
}
