mod common;

use std::sync::Arc;

use chrono::Duration;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use fitness_tracker::analytics::{Calendar, StreakCalculator};
use fitness_tracker::config::LevelSettings;
use fitness_tracker::errors::AppError;
use fitness_tracker::models::{Level, NewCompletion, WeeklyGoals};
use fitness_tracker::services::{FixedClock, ProgressService};
use fitness_tracker::storage::MemoryStore;

fn service_with(calendar: Calendar, clock: Arc<FixedClock>) -> ProgressService {
    ProgressService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(LevelSettings::default()),
        StreakCalculator::new(calendar),
        clock,
    )
}

fn completion(routine_ref: &str, level: Level) -> NewCompletion {
    NewCompletion {
        routine_ref: routine_ref.to_string(),
        routine_name: routine_ref.to_string(),
        level,
        total_minutes: None,
        calories: None,
        exercises: Vec::new(),
    }
}

#[tokio::test]
async fn test_consecutive_days_and_older_gap() {
    let clock = Arc::new(FixedClock::new(common::wednesday() - Duration::days(5)));
    let service = service_with(Calendar::utc(), clock.clone());
    let owner = Uuid::new_v4();

    // D-5, then D-2, D-1, D
    service
        .register_completion(owner, Level::Beginner, completion("monday-cardio", Level::Beginner))
        .await
        .unwrap();
    for day in [2, 1, 0] {
        clock.set(common::wednesday() - Duration::days(day));
        service
            .register_completion(owner, Level::Beginner, completion("monday-cardio", Level::Beginner))
            .await
            .unwrap();
    }

    let stats = service.statistics(owner, Level::Beginner).await.unwrap();
    assert_eq!(stats.current_streak_days, 3);
    assert_eq!(stats.best_streak_days, 3);
    assert_eq!(stats.total_routines, 4);
}

#[tokio::test]
async fn test_streak_survives_until_end_of_next_day() {
    let clock = Arc::new(FixedClock::new(common::wednesday()));
    let service = service_with(Calendar::utc(), clock.clone());
    let owner = Uuid::new_v4();

    service
        .register_completion(owner, Level::Beginner, completion("monday-cardio", Level::Beginner))
        .await
        .unwrap();

    clock.advance(Duration::days(1));
    let stats = service.statistics(owner, Level::Beginner).await.unwrap();
    assert_eq!(stats.current_streak_days, 1);

    clock.advance(Duration::days(1));
    let stats = service.statistics(owner, Level::Beginner).await.unwrap();
    assert_eq!(stats.current_streak_days, 0);
    assert_eq!(stats.best_streak_days, 1);
}

#[tokio::test]
async fn test_days_follow_the_configured_offset() {
    // UTC-5: 03:00Z on the 6th is still the evening of the 5th locally
    let calendar = Calendar::from_offset_minutes(-300).unwrap();
    let clock = Arc::new(FixedClock::new(common::at("2024-03-06T03:00:00Z")));
    let service = service_with(calendar, clock.clone());
    let owner = Uuid::new_v4();

    service
        .register_completion(owner, Level::Beginner, completion("monday-cardio", Level::Beginner))
        .await
        .unwrap();
    clock.set(common::at("2024-03-06T20:00:00Z"));
    service
        .register_completion(owner, Level::Beginner, completion("monday-cardio", Level::Beginner))
        .await
        .unwrap();

    let stats = service.statistics(owner, Level::Beginner).await.unwrap();
    assert_eq!(stats.current_streak_days, 2);

    // Only the local-today entry can be undone
    let removed = service.undo_completion(owner, "monday-cardio").await.unwrap();
    assert_eq!(removed.map(|entry| entry.completed_at), Some(common::at("2024-03-06T20:00:00Z")));
    assert!(service.undo_completion(owner, "monday-cardio").await.unwrap().is_none());
}

#[tokio::test]
async fn test_week_starts_on_local_sunday() {
    let clock = Arc::new(FixedClock::new(common::at("2024-03-02T23:30:00Z")));
    let service = service_with(Calendar::utc(), clock.clone());
    let owner = Uuid::new_v4();

    // Saturday night, previous week
    service
        .register_completion(owner, Level::Beginner, completion("friday-flexibility", Level::Beginner))
        .await
        .unwrap();
    clock.set(common::at("2024-03-03T00:30:00Z"));
    service
        .register_completion(owner, Level::Beginner, completion("monday-cardio", Level::Beginner))
        .await
        .unwrap();

    let report = service.weekly_progress(owner, Level::Beginner).await.unwrap();
    assert_eq!(report.week.routines, 1);
    assert_eq!(report.entries[0].routine_ref, "monday-cardio");
}

#[tokio::test]
async fn test_level_defaults_use_routine_level() {
    let clock = Arc::new(FixedClock::new(common::wednesday()));
    let service = service_with(Calendar::utc(), clock);
    let owner = Uuid::new_v4();

    let registration = service
        .register_completion(owner, Level::Beginner, completion("monday-push", Level::Advanced))
        .await
        .unwrap();
    assert_eq!(registration.entry.total_minutes, 60);
    assert_eq!(registration.entry.calories, 500);

    // Goals are seeded from the user's level, not the routine's
    let report = service.weekly_progress(owner, Level::Beginner).await.unwrap();
    assert_eq!(
        report.goals,
        WeeklyGoals {
            target_routines_per_week: 3,
            target_minutes_per_week: 90,
        }
    );
}

#[tokio::test]
async fn test_explicit_minutes_and_calories_are_kept() {
    let clock = Arc::new(FixedClock::new(common::wednesday()));
    let service = service_with(Calendar::utc(), clock);
    let owner = Uuid::new_v4();

    let mut custom = completion("monday-cardio", Level::Beginner);
    custom.total_minutes = Some(0);
    custom.calories = Some(120);

    let registration = service.register_completion(owner, Level::Beginner, custom).await.unwrap();
    assert_eq!(registration.entry.total_minutes, 0);
    assert_eq!(registration.entry.calories, 120);
}

#[tokio::test]
async fn test_mutations_without_document_are_not_found() {
    let clock = Arc::new(FixedClock::new(common::wednesday()));
    let service = service_with(Calendar::utc(), clock);
    let owner = Uuid::new_v4();

    assert!(matches!(service.reset_weekly(owner).await, Err(AppError::NotFound(_))));
    assert!(matches!(service.reset_all(owner).await, Err(AppError::NotFound(_))));
    assert_eq!(service.sync_goals_to_level(owner, Level::Advanced).await.unwrap(), None);
}

#[tokio::test]
async fn test_calorie_target_only_for_level_goals() {
    let clock = Arc::new(FixedClock::new(common::wednesday()));
    let service = service_with(Calendar::utc(), clock);
    let owner = Uuid::new_v4();

    let report = service.weekly_progress(owner, Level::Intermediate).await.unwrap();
    assert_eq!(report.calories_per_week, Some(1000));

    let custom = WeeklyGoals {
        target_routines_per_week: 2,
        target_minutes_per_week: 60,
    };
    service.update_goals(owner, Level::Intermediate, custom).await.unwrap();

    let report = service.weekly_progress(owner, Level::Intermediate).await.unwrap();
    assert_eq!(report.goals, custom);
    assert_eq!(report.calories_per_week, None);
}
