use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ProgressRepository, StoreError, StoreResult, UserRepository};
use crate::models::{User, UserProgress};

const USER_COLUMNS: &str = "id, name, email, password_hash, activity_level, age, gender, \
     weight_kg, target_weight_kg, height_cm, objective, experience, available_days, \
     available_minutes, questionnaire_completed, questionnaire_score, last_access_at, \
     active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Delete revocations whose token has expired anyway; returns the number removed
    pub async fn prune_revoked_tokens(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn map_unique_violation(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(what.to_string()),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, activity_level, age, gender,
                 weight_kg, target_weight_kg, height_cm, objective, experience, available_days,
                 available_minutes, questionnaire_completed, questionnaire_score, last_access_at,
                 active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                 $18, $19, $20)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.activity_level)
        .bind(user.age)
        .bind(user.gender)
        .bind(user.weight_kg)
        .bind(user.target_weight_kg)
        .bind(user.height_cm)
        .bind(user.objective)
        .bind(user.experience)
        .bind(user.available_days)
        .bind(user.available_minutes)
        .bind(user.questionnaire_completed)
        .bind(user.questionnaire_score)
        .bind(user.last_access_at)
        .bind(user.active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &format!("email {}", user.email)))?;

        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET name = $2, activity_level = $3, age = $4, gender = $5,
                 weight_kg = $6, target_weight_kg = $7, height_cm = $8, objective = $9,
                 experience = $10, available_days = $11, available_minutes = $12,
                 questionnaire_completed = $13, questionnaire_score = $14, active = $15,
                 updated_at = $16
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.activity_level)
        .bind(user.age)
        .bind(user.gender)
        .bind(user.weight_kg)
        .bind(user.target_weight_kg)
        .bind(user.height_cm)
        .bind(user.objective)
        .bind(user.experience)
        .bind(user.available_days)
        .bind(user.available_minutes)
        .bind(user.questionnaire_completed)
        .bind(user.questionnaire_score)
        .bind(user.active)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_access(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_access_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let pruned = self.prune_revoked_tokens().await?;
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned expired token revocations");
        }

        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 FROM revoked_tokens WHERE jti = $1 AND expires_at > NOW()")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }
}

#[async_trait]
impl ProgressRepository for PgStore {
    async fn find_progress(&self, owner_id: Uuid) -> StoreResult<Option<UserProgress>> {
        let row = sqlx::query_as::<_, (Json<UserProgress>, i64)>(
            "SELECT document, version FROM user_progress WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(Json(mut progress), version)| {
            progress.version = version;
            progress
        }))
    }

    async fn insert_progress(&self, progress: &UserProgress) -> StoreResult<i64> {
        let version = sqlx::query_scalar::<_, i64>(
            "INSERT INTO user_progress (owner_id, document, version, updated_at)
             VALUES ($1, $2, 1, $3)
             ON CONFLICT (owner_id) DO NOTHING
             RETURNING version",
        )
        .bind(progress.owner_id)
        .bind(Json(progress))
        .bind(progress.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        version.ok_or(StoreError::Conflict)
    }

    async fn save_progress(&self, progress: &UserProgress) -> StoreResult<i64> {
        let version = sqlx::query_scalar::<_, i64>(
            "UPDATE user_progress
             SET document = $2, version = version + 1, updated_at = $3
             WHERE owner_id = $1 AND version = $4
             RETURNING version",
        )
        .bind(progress.owner_id)
        .bind(Json(progress))
        .bind(progress.updated_at)
        .bind(progress.version)
        .fetch_optional(&self.pool)
        .await?;

        version.ok_or(StoreError::Conflict)
    }
}
