use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Level;
use crate::analytics::{longest_run, StreakCalculator, Window};
use crate::config::LevelProfile;

/// One exercise inside a completed routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub exercise_ref: String,
    pub exercise_name: String,
    #[serde(default)]
    pub done: bool,
    pub reps: Option<u32>,
    pub sets: Option<u32>,
    pub weight: Option<f64>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// A completed routine in a user's history. Never edited, only removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRoutineEntry {
    pub id: Uuid,
    pub routine_ref: String,
    pub routine_name: String,
    pub level: Level,
    pub total_minutes: u32,
    pub calories: u32,
    #[serde(default)]
    pub exercises: Vec<ExerciseRecord>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyGoals {
    pub target_routines_per_week: u32,
    pub target_minutes_per_week: u32,
}

impl WeeklyGoals {
    pub fn for_profile(profile: &LevelProfile) -> Self {
        Self {
            target_routines_per_week: profile.weekly_routines,
            target_minutes_per_week: profile.weekly_minutes,
        }
    }
}

/// Cached aggregates. Always recomputable from the history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub total_routines: u32,
    pub total_exercises: u32,
    pub total_minutes: u64,
    pub total_calories: u64,
    pub current_streak_days: u32,
    pub best_streak_days: u32,
}

impl DerivedStats {
    /// Aggregates of `history` as seen at `now`
    pub fn from_history(
        history: &[CompletedRoutineEntry],
        streaks: &StreakCalculator,
        now: DateTime<Utc>,
    ) -> Self {
        let days = streaks.active_days(history.iter().map(|entry| entry.completed_at));
        let streak = streaks.summarize(&days, streaks.today(now), longest_run(&days));

        Self {
            total_routines: history.len() as u32,
            total_exercises: history.iter().map(|entry| entry.exercises.len() as u32).sum(),
            total_minutes: history.iter().map(|entry| u64::from(entry.total_minutes)).sum(),
            total_calories: history.iter().map(|entry| u64::from(entry.calories)).sum(),
            current_streak_days: streak.current,
            best_streak_days: streak.best,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPrefs {
    pub daily_reminders: bool,
    pub reminder_time: String,
    pub motivational: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            daily_reminders: true,
            reminder_time: "18:00".to_string(),
            motivational: true,
        }
    }
}

/// Progress document, one per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub owner_id: Uuid,
    #[serde(default)]
    pub history: Vec<CompletedRoutineEntry>,
    pub weekly_goals: WeeklyGoals,
    #[serde(default)]
    pub derived_stats: DerivedStats,
    #[serde(default)]
    pub notification_prefs: NotificationPrefs,
    /// Optimistic concurrency token, 0 until first persisted
    #[serde(default)]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProgress {
    pub fn new(owner_id: Uuid, weekly_goals: WeeklyGoals, now: DateTime<Utc>) -> Self {
        Self {
            owner_id,
            history: Vec::new(),
            weekly_goals,
            derived_stats: DerivedStats::default(),
            notification_prefs: NotificationPrefs::default(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a completed routine and refresh the aggregates
    pub fn register(&mut self, entry: CompletedRoutineEntry, streaks: &StreakCalculator, now: DateTime<Utc>) {
        self.history.push(entry);
        self.recompute(streaks, now);
    }

    /// Remove the most recent entry for `routine_ref` completed today.
    /// Returns `None`, leaving the document untouched, when nothing matches.
    pub fn undo_today(
        &mut self,
        routine_ref: &str,
        streaks: &StreakCalculator,
        now: DateTime<Utc>,
    ) -> Option<CompletedRoutineEntry> {
        let calendar = streaks.calendar();
        let index = self
            .history
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.routine_ref == routine_ref && calendar.is_same_day(entry.completed_at, now))
            .max_by_key(|(index, entry)| (entry.completed_at, *index))
            .map(|(index, _)| index)?;

        let removed = self.history.remove(index);
        self.recompute(streaks, now);
        Some(removed)
    }

    /// Drop this week's entries, keep everything older. Returns the number removed.
    pub fn reset_week(&mut self, streaks: &StreakCalculator, now: DateTime<Utc>) -> usize {
        let week = Window::current_week(streaks.calendar(), now);
        let before = self.history.len();
        self.history.retain(|entry| !week.contains(entry.completed_at));
        let removed = before - self.history.len();

        self.recompute(streaks, now);
        removed
    }

    /// Clear the whole history and zero the aggregates
    pub fn reset_all(&mut self, now: DateTime<Utc>) {
        self.history.clear();
        self.derived_stats = DerivedStats::default();
        self.updated_at = now;
    }

    pub fn recompute(&mut self, streaks: &StreakCalculator, now: DateTime<Utc>) {
        self.derived_stats = DerivedStats::from_history(&self.history, streaks, now);
        self.updated_at = now;
    }
}

/// A validated completion ready to be stamped into an entry
#[derive(Debug, Clone, PartialEq)]
pub struct NewCompletion {
    pub routine_ref: String,
    pub routine_name: String,
    pub level: Level,
    pub total_minutes: Option<u32>,
    pub calories: Option<u32>,
    pub exercises: Vec<NewExercise>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub exercise_ref: String,
    pub exercise_name: String,
    pub done: bool,
    pub reps: Option<u32>,
    pub sets: Option<u32>,
    pub weight: Option<f64>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl NewCompletion {
    /// Build the history entry, filling omitted minutes/calories from the level profile
    pub fn into_entry(self, defaults: &LevelProfile, now: DateTime<Utc>) -> CompletedRoutineEntry {
        CompletedRoutineEntry {
            id: Uuid::new_v4(),
            routine_ref: self.routine_ref,
            routine_name: self.routine_name,
            level: self.level,
            total_minutes: self.total_minutes.unwrap_or(defaults.session_minutes),
            calories: self.calories.unwrap_or(defaults.session_calories),
            exercises: self
                .exercises
                .into_iter()
                .map(|exercise| ExerciseRecord {
                    exercise_ref: exercise.exercise_ref,
                    exercise_name: exercise.exercise_name,
                    done: exercise.done,
                    reps: exercise.reps,
                    sets: exercise.sets,
                    weight: exercise.weight,
                    duration_minutes: exercise.duration_minutes,
                    notes: exercise.notes,
                    recorded_at: exercise.recorded_at.unwrap_or(now),
                })
                .collect(),
            completed_at: now,
        }
    }
}
