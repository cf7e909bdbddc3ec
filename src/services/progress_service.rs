use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::analytics::{
    entries_in, goal_percentages, monthly_stats, rollup, GoalPercentages, MonthlyStats, Rollup,
    StreakCalculator, Window,
};
use crate::config::LevelSettings;
use crate::errors::{AppError, AppResult};
use crate::models::{
    validate_reminder_time, CompletedRoutineEntry, DerivedStats, Level, NewCompletion, NotificationPrefs,
    UserProgress, WeeklyGoals,
};
use crate::services::clock::Clock;
use crate::storage::{ProgressRepository, StoreError};

/// Lost compare-and-swap races tolerated before reporting a conflict
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Current week against the weekly goals
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub level: Level,
    pub week: Rollup,
    pub percentages: GoalPercentages,
    pub goals: WeeklyGoals,
    /// Level calorie target; `None` once the goals were customized
    pub calories_per_week: Option<u32>,
    pub entries: Vec<CompletedRoutineEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub entry: CompletedRoutineEntry,
    pub total_routines: u32,
}

/// Partial notification preference update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationUpdate {
    pub daily_reminders: Option<bool>,
    pub reminder_time: Option<String>,
    pub motivational: Option<bool>,
}

/// Whether a missing progress document is created or reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Missing {
    Create(Level),
    NotFound,
}

/// Progress aggregation over versioned per-user documents.
///
/// Every mutation runs against a copy of the stored document, recomputes the
/// derived statistics and is written back with a compare-and-swap on the
/// document version. A lost race reloads and re-applies the mutation.
#[derive(Clone)]
pub struct ProgressService {
    repo: Arc<dyn ProgressRepository>,
    levels: Arc<LevelSettings>,
    streaks: StreakCalculator,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ProgressService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressService")
            .field("levels", &self.levels)
            .field("streaks", &self.streaks)
            .finish()
    }
}

impl ProgressService {
    pub fn new(
        repo: Arc<dyn ProgressRepository>,
        levels: Arc<LevelSettings>,
        streaks: StreakCalculator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            levels,
            streaks,
            clock,
        }
    }

    pub fn levels(&self) -> &LevelSettings {
        &self.levels
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn weekly_progress(&self, owner_id: Uuid, level: Level) -> AppResult<WeeklyReport> {
        let (progress, now) = self.load(owner_id, level).await?;
        let window = Window::current_week(self.streaks.calendar(), now);
        let week = rollup(&progress.history, window);
        let profile = self.levels.profile(level);
        let calories_per_week =
            (progress.weekly_goals == WeeklyGoals::for_profile(profile)).then_some(profile.weekly_calories);

        Ok(WeeklyReport {
            level,
            week,
            percentages: goal_percentages(&week, &progress.weekly_goals),
            goals: progress.weekly_goals,
            calories_per_week,
            entries: entries_in(&progress.history, window).into_iter().cloned().collect(),
        })
    }

    /// Aggregates recomputed against the current day, so a streak broken
    /// since the last write reads as broken
    pub async fn statistics(&self, owner_id: Uuid, level: Level) -> AppResult<DerivedStats> {
        let (progress, now) = self.load(owner_id, level).await?;
        Ok(DerivedStats::from_history(&progress.history, &self.streaks, now))
    }

    pub async fn monthly(&self, owner_id: Uuid, level: Level) -> AppResult<MonthlyStats> {
        let (progress, now) = self.load(owner_id, level).await?;
        Ok(monthly_stats(&progress.history, now))
    }

    /// Append a completed routine. Omitted minutes and calories come from the
    /// routine level's session defaults.
    pub async fn register_completion(
        &self,
        owner_id: Uuid,
        user_level: Level,
        completion: NewCompletion,
    ) -> AppResult<Registration> {
        let defaults = *self.levels.profile(completion.level);
        let streaks = self.streaks;

        let (progress, entry) = self
            .mutate(owner_id, Missing::Create(user_level), |progress, now| {
                let entry = completion.clone().into_entry(&defaults, now);
                progress.register(entry.clone(), &streaks, now);
                Ok(entry)
            })
            .await?;

        tracing::info!(
            owner_id = %owner_id,
            routine_ref = %entry.routine_ref,
            minutes = entry.total_minutes,
            calories = entry.calories,
            "Routine completion registered"
        );

        Ok(Registration {
            entry,
            total_routines: progress.derived_stats.total_routines,
        })
    }

    /// Remove today's latest completion of `routine_ref`; `None` when there was none
    pub async fn undo_completion(
        &self,
        owner_id: Uuid,
        routine_ref: &str,
    ) -> AppResult<Option<CompletedRoutineEntry>> {
        let streaks = self.streaks;
        let (_, removed) = self
            .mutate(owner_id, Missing::NotFound, |progress, now| {
                Ok(progress.undo_today(routine_ref, &streaks, now))
            })
            .await?;

        match &removed {
            Some(entry) => tracing::info!(owner_id = %owner_id, entry_id = %entry.id, "Routine completion undone"),
            None => tracing::debug!(owner_id = %owner_id, routine_ref, "Nothing to undo today"),
        }

        Ok(removed)
    }

    /// Drop the current week's entries; returns how many were removed
    pub async fn reset_weekly(&self, owner_id: Uuid) -> AppResult<usize> {
        let streaks = self.streaks;
        let (_, removed) = self
            .mutate(owner_id, Missing::NotFound, |progress, now| {
                Ok(progress.reset_week(&streaks, now))
            })
            .await?;

        tracing::info!(owner_id = %owner_id, removed, "Weekly progress reset");
        Ok(removed)
    }

    pub async fn reset_all(&self, owner_id: Uuid) -> AppResult<()> {
        self.mutate(owner_id, Missing::NotFound, |progress, now| {
            progress.reset_all(now);
            Ok(())
        })
        .await?;

        tracing::info!(owner_id = %owner_id, "All progress reset");
        Ok(())
    }

    /// Replace the weekly targets with custom values
    pub async fn update_goals(&self, owner_id: Uuid, level: Level, goals: WeeklyGoals) -> AppResult<WeeklyGoals> {
        if goals.target_routines_per_week == 0 || goals.target_minutes_per_week == 0 {
            return Err(AppError::validation("Weekly goals must be greater than zero"));
        }

        let (progress, _) = self
            .mutate(owner_id, Missing::Create(level), |progress, now| {
                progress.weekly_goals = goals;
                progress.updated_at = now;
                Ok(())
            })
            .await?;

        Ok(progress.weekly_goals)
    }

    pub async fn update_notifications(
        &self,
        owner_id: Uuid,
        level: Level,
        update: NotificationUpdate,
    ) -> AppResult<NotificationPrefs> {
        if let Some(time) = &update.reminder_time {
            validate_reminder_time(time).map_err(|e| AppError::validation(e.to_string()))?;
        }

        let (progress, _) = self
            .mutate(owner_id, Missing::Create(level), |progress, now| {
                let prefs = &mut progress.notification_prefs;
                if let Some(enabled) = update.daily_reminders {
                    prefs.daily_reminders = enabled;
                }
                if let Some(time) = &update.reminder_time {
                    prefs.reminder_time = time.clone();
                }
                if let Some(enabled) = update.motivational {
                    prefs.motivational = enabled;
                }
                progress.updated_at = now;
                Ok(())
            })
            .await?;

        Ok(progress.notification_prefs)
    }

    /// Re-seed weekly goals after the user's level changed. Users without a
    /// progress document are left alone; it is seeded on first use.
    pub async fn sync_goals_to_level(&self, owner_id: Uuid, level: Level) -> AppResult<Option<WeeklyGoals>> {
        let goals = WeeklyGoals::for_profile(self.levels.profile(level));

        match self
            .mutate(owner_id, Missing::NotFound, |progress, now| {
                let changed = progress.weekly_goals != goals;
                if changed {
                    progress.weekly_goals = goals;
                    progress.updated_at = now;
                }
                Ok(changed)
            })
            .await
        {
            Ok((progress, changed)) => {
                if changed {
                    tracing::info!(owner_id = %owner_id, level = %level, "Weekly goals re-seeded");
                }
                Ok(Some(progress.weekly_goals))
            }
            Err(AppError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn fresh(&self, owner_id: Uuid, level: Level, now: DateTime<Utc>) -> UserProgress {
        UserProgress::new(owner_id, WeeklyGoals::for_profile(self.levels.profile(level)), now)
    }

    /// Read the document, creating it with level goals on first access
    async fn load(&self, owner_id: Uuid, level: Level) -> AppResult<(UserProgress, DateTime<Utc>)> {
        self.mutate(owner_id, Missing::Create(level), |_, now| Ok(now))
            .await
    }

    /// Load, apply `apply` to a copy, persist with compare-and-swap.
    ///
    /// Unchanged existing documents are not written back.
    async fn mutate<T, F>(&self, owner_id: Uuid, missing: Missing, mut apply: F) -> AppResult<(UserProgress, T)>
    where
        F: FnMut(&mut UserProgress, DateTime<Utc>) -> AppResult<T>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let now = self.clock.now();

            let (stored, mut progress) = match (self.repo.find_progress(owner_id).await?, missing) {
                (Some(existing), _) => (Some(existing.clone()), existing),
                (None, Missing::Create(level)) => (None, self.fresh(owner_id, level, now)),
                (None, Missing::NotFound) => {
                    return Err(AppError::not_found("No progress found for this user"));
                }
            };

            let outcome = apply(&mut progress, now)?;

            let written = match &stored {
                Some(original) if *original == progress => return Ok((progress, outcome)),
                Some(_) => self.repo.save_progress(&progress).await,
                None => self.repo.insert_progress(&progress).await,
            };

            match written {
                Ok(version) => {
                    progress.version = version;
                    return Ok((progress, outcome));
                }
                Err(StoreError::Conflict) => {
                    tracing::warn!(owner_id = %owner_id, attempt, "Progress write lost a version race, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AppError::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Calendar;
    use crate::services::clock::FixedClock;
    use crate::storage::{MemoryStore, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Loses the first `failures` compare-and-swap writes
    struct RacyRepo {
        inner: MemoryStore,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl ProgressRepository for RacyRepo {
        async fn find_progress(&self, owner_id: Uuid) -> StoreResult<Option<UserProgress>> {
            self.inner.find_progress(owner_id).await
        }

        async fn insert_progress(&self, progress: &UserProgress) -> StoreResult<i64> {
            self.inner.insert_progress(progress).await
        }

        async fn save_progress(&self, progress: &UserProgress) -> StoreResult<i64> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::Conflict);
            }
            self.inner.save_progress(progress).await
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn service_with(repo: Arc<dyn ProgressRepository>) -> ProgressService {
        ProgressService::new(
            repo,
            Arc::new(LevelSettings::default()),
            StreakCalculator::new(Calendar::utc()),
            Arc::new(FixedClock::new(at("2024-03-06T10:00:00Z"))),
        )
    }

    fn completion() -> NewCompletion {
        NewCompletion {
            routine_ref: "monday-cardio".to_string(),
            routine_name: "Monday - Light Cardio".to_string(),
            level: Level::Beginner,
            total_minutes: None,
            calories: None,
            exercises: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_lost_race_is_retried() {
        let repo = Arc::new(RacyRepo {
            inner: MemoryStore::new(),
            failures: AtomicUsize::new(0),
        });
        let service = service_with(repo.clone());
        let owner = Uuid::new_v4();

        service.register_completion(owner, Level::Beginner, completion()).await.unwrap();

        repo.failures.store(2, Ordering::SeqCst);
        let registration = service
            .register_completion(owner, Level::Beginner, completion())
            .await
            .unwrap();
        assert_eq!(registration.total_routines, 2);
    }

    #[tokio::test]
    async fn test_persistent_conflict_surfaces() {
        let repo = Arc::new(RacyRepo {
            inner: MemoryStore::new(),
            failures: AtomicUsize::new(0),
        });
        let service = service_with(repo.clone());
        let owner = Uuid::new_v4();
        service.register_completion(owner, Level::Beginner, completion()).await.unwrap();

        repo.failures.store(MAX_WRITE_ATTEMPTS, Ordering::SeqCst);
        let err = service
            .register_completion(owner, Level::Beginner, completion())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict));

        let stats = service.statistics(owner, Level::Beginner).await.unwrap();
        assert_eq!(stats.total_routines, 1);
    }

    #[tokio::test]
    async fn test_undo_without_document_is_not_found() {
        let service = service_with(Arc::new(MemoryStore::new()));
        let err = service
            .undo_completion(Uuid::new_v4(), "monday-cardio")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_goal_validation_and_level_sync() {
        let service = service_with(Arc::new(MemoryStore::new()));
        let owner = Uuid::new_v4();

        let zero = WeeklyGoals {
            target_routines_per_week: 0,
            target_minutes_per_week: 60,
        };
        assert!(matches!(
            service.update_goals(owner, Level::Beginner, zero).await,
            Err(AppError::Validation(_))
        ));

        assert_eq!(service.sync_goals_to_level(owner, Level::Advanced).await.unwrap(), None);

        service.weekly_progress(owner, Level::Beginner).await.unwrap();
        let goals = service.sync_goals_to_level(owner, Level::Advanced).await.unwrap().unwrap();
        assert_eq!(goals.target_routines_per_week, 5);
        assert_eq!(goals.target_minutes_per_week, 210);
    }
}
