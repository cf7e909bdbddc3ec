//! Persistence for users, revoked tokens and progress documents.
//!
//! Two backends implement the same repository traits: PostgreSQL (progress
//! kept as a JSONB document next to a version column) and an in-memory store
//! used by tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{User, UserProgress};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Compare-and-swap lost against a concurrent writer
    #[error("Version conflict")]
    Conflict,

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Duplicate` when the email is taken
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Overwrite every mutable column of an existing user; `false` when no
    /// such user exists
    async fn update_user(&self, user: &User) -> StoreResult<bool>;

    async fn touch_last_access(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;

    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;

    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool>;
}

/// Versioned progress documents.
///
/// `UserProgress::version` is the optimistic concurrency token: reads return
/// the stored version, writes succeed only if it still matches and hand back
/// the new one.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn find_progress(&self, owner_id: Uuid) -> StoreResult<Option<UserProgress>>;

    /// Create the document. `Conflict` when one already exists for the owner.
    async fn insert_progress(&self, progress: &UserProgress) -> StoreResult<i64>;

    /// Compare-and-swap on `progress.version`
    async fn save_progress(&self, progress: &UserProgress) -> StoreResult<i64>;
}

/// Repository handles shared by the services
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    backend: &'static str,
}

impl Storage {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            progress: store,
            backend: "memory",
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            users: store.clone(),
            progress: store,
            backend: "postgres",
        }
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("backend", &self.backend).finish()
    }
}
