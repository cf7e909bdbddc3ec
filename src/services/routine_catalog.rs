use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analytics::Calendar;
use crate::models::Level;

const BUNDLED_CATALOG: &str = include_str!("../../data/routines.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogExercise {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub level: Level,
    pub estimated_minutes: u32,
    pub estimated_calories: u32,
    pub exercises: Vec<CatalogExercise>,
}

/// Predefined routines grouped by level. Read-only after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineCatalog {
    pub beginner: Vec<Routine>,
    pub intermediate: Vec<Routine>,
    pub advanced: Vec<Routine>,
}

impl RoutineCatalog {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CATALOG).context("Bundled routine catalog is invalid")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: RoutineCatalog = serde_json::from_str(raw)?;
        catalog.check()?;
        Ok(catalog)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read routine catalog from {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid routine catalog in {}", path.display()))
    }

    /// Catalog from `path` when given, the bundled one otherwise
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::info!("Loading routine catalog from {}", path);
                Self::from_file(path)
            }
            None => Self::bundled(),
        }
    }

    /// Every level needs at least one routine, and each routine must sit under its own level
    fn check(&self) -> Result<()> {
        for level in Level::ALL {
            let routines = self.by_level(level);
            if routines.is_empty() {
                anyhow::bail!("No routines defined for level {}", level);
            }
            if let Some(misplaced) = routines.iter().find(|routine| routine.level != level) {
                anyhow::bail!("Routine {} is listed under {} but declares {}", misplaced.id, level, misplaced.level);
            }
        }
        Ok(())
    }

    pub fn by_level(&self, level: Level) -> &[Routine] {
        match level {
            Level::Beginner => &self.beginner,
            Level::Intermediate => &self.intermediate,
            Level::Advanced => &self.advanced,
        }
    }

    pub fn find(&self, level: Level, id: &str) -> Option<&Routine> {
        self.by_level(level).iter().find(|routine| routine.id == id)
    }

    /// Look a routine up by id across all levels
    pub fn find_any(&self, id: &str) -> Option<&Routine> {
        Level::ALL.into_iter().find_map(|level| self.find(level, id))
    }

    /// Routine of the day: rotates through the level's routines by weekday, Sunday first
    pub fn recommended_for(&self, level: Level, calendar: &Calendar, now: DateTime<Utc>) -> Option<&Routine> {
        let routines = self.by_level(level);
        if routines.is_empty() {
            return None;
        }
        let weekday = calendar.day_of(now).weekday().num_days_from_sunday() as usize;
        routines.get(weekday % routines.len())
    }
}
