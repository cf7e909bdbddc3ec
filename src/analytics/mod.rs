// Progress analytics: local-day calendar, streaks and windowed rollups

pub mod calendar;
pub mod rollup;
pub mod streak;

pub use calendar::Calendar;
pub use rollup::{
    entries_in, goal_percentages, monthly_stats, rollup, GoalPercentages, MonthlyStats, Rollup,
    RoundedPercentages, Window,
};
pub use streak::{longest_run, StreakCalculator, StreakSummary, MAX_STREAK_DAYS};
