use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::Level;

/// Per-level defaults for a single session and for the weekly targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProfile {
    pub session_minutes: u32,
    pub session_calories: u32,
    pub weekly_routines: u32,
    pub weekly_minutes: u32,
    pub weekly_calories: u32,
}

/// Level lookup tables consumed by the progress core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSettings {
    pub beginner: LevelProfile,
    pub intermediate: LevelProfile,
    pub advanced: LevelProfile,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            beginner: LevelProfile {
                session_minutes: 30,
                session_calories: 200,
                weekly_routines: 3,
                weekly_minutes: 90,
                weekly_calories: 600,
            },
            intermediate: LevelProfile {
                session_minutes: 45,
                session_calories: 350,
                weekly_routines: 4,
                weekly_minutes: 150,
                weekly_calories: 1000,
            },
            advanced: LevelProfile {
                session_minutes: 60,
                session_calories: 500,
                weekly_routines: 5,
                weekly_minutes: 210,
                weekly_calories: 1400,
            },
        }
    }
}

impl LevelSettings {
    pub fn profile(&self, level: Level) -> &LevelProfile {
        match level {
            Level::Beginner => &self.beginner,
            Level::Intermediate => &self.intermediate,
            Level::Advanced => &self.advanced,
        }
    }

    /// Load settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read level settings from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid level settings in {}", path.display()))
    }

    /// Settings from `path` when given, built-in tables otherwise
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::info!("Loading level settings from {}", path);
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}
