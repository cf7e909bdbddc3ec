use anyhow::Result;
use axum::{routing::get, Router};
use chrono::Duration;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::auth::auth_routes;
use super::health::health_check;
use super::progress::progress_routes;
use super::routines::routine_routes;
use crate::analytics::{Calendar, StreakCalculator};
use crate::auth::{cors_layer, security_headers_layer, AuthService};
use crate::config::{run_migrations, AppConfig, DatabaseConfig, LevelSettings, StorageBackend};
use crate::services::{Clock, ProgressService, RoutineCatalog, SystemClock};
use crate::storage::Storage;

/// Shared handler state
#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: AuthService,
    pub progress: ProgressService,
    pub catalog: Arc<RoutineCatalog>,
    pub calendar: Calendar,
    pub storage_backend: &'static str,
}

impl AppState {
    pub fn new(
        storage: Storage,
        config: &AppConfig,
        levels: LevelSettings,
        catalog: RoutineCatalog,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let calendar = config.calendar()?;
        let auth = AuthService::new(
            storage.users.clone(),
            &config.jwt_secret,
            Duration::days(config.jwt_expiry_days),
            config.bcrypt_cost,
        );
        let progress = ProgressService::new(
            storage.progress.clone(),
            Arc::new(levels),
            StreakCalculator::new(calendar),
            clock,
        );

        Ok(Self {
            auth,
            progress,
            catalog: Arc::new(catalog),
            calendar,
            storage_backend: storage.backend(),
        })
    }

    /// Build the state from configuration, connecting and migrating the
    /// database for the Postgres backend
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let storage = match config.storage_backend {
            StorageBackend::Postgres => {
                let db_config = DatabaseConfig::from_env()?;
                let pool = db_config.create_pool().await?;
                run_migrations(&pool).await?;
                Storage::postgres(pool)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, data is lost on restart");
                Storage::memory()
            }
        };

        let levels = LevelSettings::load(config.level_settings_path.as_deref())?;
        let catalog = RoutineCatalog::load(config.routine_catalog_path.as_deref())?;

        Self::new(storage, config, levels, catalog, Arc::new(SystemClock))
    }
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state.clone())
        .nest("/api/auth", auth_routes(state.clone()))
        .nest("/api/progress", progress_routes(state.clone()))
        .nest("/api/routines", routine_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security_headers_layer())
                .layer(cors_layer()),
        )
}
