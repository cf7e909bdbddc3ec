use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use fitness_tracker::analytics::{rollup, Calendar, StreakCalculator, Window, MAX_STREAK_DAYS};
use fitness_tracker::config::LevelSettings;
use fitness_tracker::models::{CompletedRoutineEntry, Level, NewCompletion, UserProgress, WeeklyGoals};

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-06T18:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn entry(routine_ref: &str, completed_at: DateTime<Utc>) -> CompletedRoutineEntry {
    CompletedRoutineEntry {
        id: Uuid::new_v4(),
        routine_ref: routine_ref.to_string(),
        routine_name: routine_ref.to_string(),
        level: Level::Beginner,
        total_minutes: 30,
        calories: 200,
        exercises: Vec::new(),
        completed_at,
    }
}

/// Entries spread over the past `max_minutes`, never after `now()`
fn history(max_minutes: i64) -> impl Strategy<Value = Vec<CompletedRoutineEntry>> {
    prop::collection::vec((0..max_minutes, 0usize..3), 0..40).prop_map(|items| {
        items
            .into_iter()
            .map(|(minutes_ago, routine)| {
                let routine_ref = ["monday-cardio", "wednesday-strength", "friday-flexibility"][routine];
                entry(routine_ref, now() - Duration::minutes(minutes_ago))
            })
            .collect()
    })
}

fn progress_with(history: Vec<CompletedRoutineEntry>, streaks: &StreakCalculator) -> UserProgress {
    let goals = WeeklyGoals {
        target_routines_per_week: 3,
        target_minutes_per_week: 90,
    };
    let mut progress = UserProgress::new(Uuid::new_v4(), goals, now());
    progress.history = history;
    progress.recompute(streaks, now());
    progress
}

proptest! {
    #[test]
    fn streak_never_exceeds_cap_or_active_days(offsets in prop::collection::vec(0i64..800, 0..500)) {
        let streaks = StreakCalculator::new(Calendar::utc());
        let days = streaks.active_days(offsets.iter().map(|days| now() - Duration::days(*days)));
        let current = streaks.current_streak(&days, streaks.today(now()));

        prop_assert!(current as usize <= days.len());
        prop_assert!(current <= MAX_STREAK_DAYS);
    }

    #[test]
    fn rollup_is_stable(entries in history(60 * 24 * 40)) {
        let window = Window::current_week(&Calendar::utc(), now());
        prop_assert_eq!(rollup(&entries, window), rollup(&entries, window));
    }

    #[test]
    fn register_then_undo_restores_document(entries in history(60 * 24 * 20)) {
        let streaks = StreakCalculator::new(Calendar::utc());
        let levels = LevelSettings::default();
        let mut progress = progress_with(entries, &streaks);
        let before_history = progress.history.clone();
        let before_stats = progress.derived_stats;

        let completion = NewCompletion {
            routine_ref: "monday-cardio".to_string(),
            routine_name: "Monday cardio".to_string(),
            level: Level::Beginner,
            total_minutes: None,
            calories: None,
            exercises: Vec::new(),
        };
        let added = completion.into_entry(levels.profile(Level::Beginner), now());
        progress.register(added.clone(), &streaks, now());

        let removed = progress.undo_today("monday-cardio", &streaks, now());

        prop_assert_eq!(removed.map(|e| e.id), Some(added.id));
        prop_assert_eq!(&progress.history, &before_history);
        prop_assert_eq!(progress.derived_stats, before_stats);
    }

    #[test]
    fn weekly_reset_removes_exactly_this_week(entries in history(60 * 24 * 21)) {
        let calendar = Calendar::utc();
        let streaks = StreakCalculator::new(calendar);
        let week = Window::current_week(&calendar, now());
        let mut progress = progress_with(entries.clone(), &streaks);

        let removed = progress.reset_week(&streaks, now());

        let (this_week, older): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(|e| week.contains(e.completed_at));
        prop_assert_eq!(removed, this_week.len());
        prop_assert_eq!(&progress.history, &older);
        prop_assert_eq!(progress.derived_stats.total_routines as usize, older.len());
    }
}
