use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProgressRepository, StoreError, StoreResult, UserRepository};
use crate::models::{User, UserProgress};

/// Stored progress document, kept serialized like the JSONB column
#[derive(Debug, Clone)]
struct VersionedDocument {
    json: String,
    version: i64,
}

/// Process-local store. Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    revoked: RwLock<HashMap<String, DateTime<Utc>>>,
    progress: RwLock<HashMap<Uuid, VersionedDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_access(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.last_access_at = at;
        }
        Ok(())
    }

    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut revoked = self.revoked.write().await;
        let now = Utc::now();
        revoked.retain(|_, expiry| *expiry > now);
        revoked.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool> {
        let revoked = self.revoked.read().await;
        Ok(revoked
            .get(jti)
            .map(|expiry| *expiry > Utc::now())
            .unwrap_or(false))
    }
}

#[async_trait]
impl ProgressRepository for MemoryStore {
    async fn find_progress(&self, owner_id: Uuid) -> StoreResult<Option<UserProgress>> {
        let documents = self.progress.read().await;
        match documents.get(&owner_id) {
            Some(stored) => {
                let mut progress: UserProgress = serde_json::from_str(&stored.json)?;
                progress.version = stored.version;
                Ok(Some(progress))
            }
            None => Ok(None),
        }
    }

    async fn insert_progress(&self, progress: &UserProgress) -> StoreResult<i64> {
        let json = serde_json::to_string(progress)?;
        let mut documents = self.progress.write().await;
        if documents.contains_key(&progress.owner_id) {
            return Err(StoreError::Conflict);
        }
        documents.insert(progress.owner_id, VersionedDocument { json, version: 1 });
        Ok(1)
    }

    async fn save_progress(&self, progress: &UserProgress) -> StoreResult<i64> {
        let json = serde_json::to_string(progress)?;
        let mut documents = self.progress.write().await;
        match documents.get_mut(&progress.owner_id) {
            Some(stored) if stored.version == progress.version => {
                stored.json = json;
                stored.version += 1;
                Ok(stored.version)
            }
            _ => Err(StoreError::Conflict),
        }
    }
}
