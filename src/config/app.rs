use anyhow::{anyhow, Result};
use std::env;
use std::str::FromStr;

use crate::analytics::Calendar;

/// Where users and progress documents live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("Unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
    pub bcrypt_cost: u32,
    pub utc_offset_minutes: i32,
    pub storage_backend: StorageBackend,
    pub level_settings_path: Option<String>,
    pub routine_catalog_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            jwt_secret: "change-this-secret-in-production".to_string(),
            jwt_expiry_days: 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            utc_offset_minutes: 0,
            storage_backend: StorageBackend::Postgres,
            level_settings_path: None,
            routine_catalog_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let log_level = env::var("LOG_LEVEL").unwrap_or(defaults.log_level);
        let jwt_secret = env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret);
        let jwt_expiry_days = env::var("JWT_EXPIRY_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.jwt_expiry_days);
        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.bcrypt_cost);
        let utc_offset_minutes = env::var("UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.utc_offset_minutes);
        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.storage_backend,
        };

        let config = AppConfig {
            host,
            port,
            environment,
            log_level,
            jwt_secret,
            jwt_expiry_days,
            bcrypt_cost,
            utc_offset_minutes,
            storage_backend,
            level_settings_path: env::var("LEVEL_SETTINGS_PATH").ok(),
            routine_catalog_path: env::var("ROUTINE_CATALOG_PATH").ok(),
        };
        config.calendar()?;

        if config.is_production() && env::var("JWT_SECRET").is_err() {
            tracing::warn!("JWT_SECRET is not set, using the built-in development secret");
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Local calendar for day and week boundaries
    pub fn calendar(&self) -> Result<Calendar> {
        Calendar::from_offset_minutes(self.utc_offset_minutes).ok_or_else(|| {
            anyhow!(
                "UTC_OFFSET_MINUTES must be within ±1439, got {}",
                self.utc_offset_minutes
            )
        })
    }
}
