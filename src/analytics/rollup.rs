use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::Calendar;
use crate::models::{CompletedRoutineEntry, WeeklyGoals};

/// Weeks in a month, for the monthly weekly-average figure
pub const WEEKS_PER_MONTH: f64 = 4.3;

/// Length of the trailing "monthly" window
pub const MONTH_WINDOW_DAYS: i64 = 30;

/// Closed time window `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// From the most recent Sunday local midnight up to `now`
    pub fn current_week(calendar: &Calendar, now: DateTime<Utc>) -> Self {
        Self::new(calendar.week_start(now), now)
    }

    pub fn last_30_days(now: DateTime<Utc>) -> Self {
        Self::new(now - Duration::days(MONTH_WINDOW_DAYS), now)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rollup {
    pub routines: u32,
    pub minutes: u64,
    pub calories: u64,
}

/// Entries whose `completed_at` lies inside the window, in history order
pub fn entries_in(entries: &[CompletedRoutineEntry], window: Window) -> Vec<&CompletedRoutineEntry> {
    entries
        .iter()
        .filter(|entry| window.contains(entry.completed_at))
        .collect()
}

pub fn rollup(entries: &[CompletedRoutineEntry], window: Window) -> Rollup {
    entries
        .iter()
        .filter(|entry| window.contains(entry.completed_at))
        .fold(Rollup::default(), |mut acc, entry| {
            acc.routines += 1;
            acc.minutes += u64::from(entry.total_minutes);
            acc.calories += u64::from(entry.calories);
            acc
        })
}

/// Progress against weekly goals, unrounded
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalPercentages {
    pub routines: f64,
    pub minutes: f64,
    pub overall: f64,
}

impl GoalPercentages {
    /// Integer view for presentation
    pub fn rounded(&self) -> RoundedPercentages {
        RoundedPercentages {
            routines: self.routines.round() as u32,
            minutes: self.minutes.round() as u32,
            overall: self.overall.round() as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundedPercentages {
    pub routines: u32,
    pub minutes: u32,
    pub overall: u32,
}

pub fn goal_percentages(week: &Rollup, goals: &WeeklyGoals) -> GoalPercentages {
    let routines = percentage(f64::from(week.routines), f64::from(goals.target_routines_per_week));
    let minutes = percentage(week.minutes as f64, f64::from(goals.target_minutes_per_week));

    GoalPercentages {
        routines,
        minutes,
        overall: (routines + minutes) / 2.0,
    }
}

fn percentage(actual: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 100.0;
    }
    (actual / target * 100.0).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub routines_completed: u32,
    pub minutes_trained: u64,
    pub calories_burned: u64,
    pub weekly_average: u32,
}

pub fn monthly_stats(entries: &[CompletedRoutineEntry], now: DateTime<Utc>) -> MonthlyStats {
    let month = rollup(entries, Window::last_30_days(now));

    MonthlyStats {
        routines_completed: month.routines,
        minutes_trained: month.minutes,
        calories_burned: month.calories,
        weekly_average: (f64::from(month.routines) / WEEKS_PER_MONTH).round() as u32,
    }
}
