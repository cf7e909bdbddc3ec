use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Calendar;

/// Upper bound on the backward day walk
pub const MAX_STREAK_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current: u32,
    pub best: u32,
}

/// Consecutive-day streak calculator.
///
/// Works on the set of distinct local calendar days that hold at least one
/// completion. The walk starts at "today" and goes backwards one day at a
/// time. A day without completions ends the streak, except today itself: a
/// user who has not trained yet today keeps yesterday's streak.
#[derive(Debug, Clone, Copy)]
pub struct StreakCalculator {
    calendar: Calendar,
    max_days: u32,
}

impl StreakCalculator {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            max_days: MAX_STREAK_DAYS,
        }
    }

    pub fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = max_days;
        self
    }

    pub fn max_days(&self) -> u32 {
        self.max_days
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.calendar.day_of(now)
    }

    /// Distinct local days of a set of timestamps
    pub fn active_days<I>(&self, timestamps: I) -> BTreeSet<NaiveDate>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        timestamps
            .into_iter()
            .map(|at| self.calendar.day_of(at))
            .collect()
    }

    /// Current streak ending at `today`
    pub fn current_streak(&self, days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
        let mut streak = 0;

        for offset in 0..self.max_days {
            let day = today - Duration::days(i64::from(offset));
            if days.contains(&day) {
                streak += 1;
            } else if offset > 0 {
                break;
            }
        }

        streak
    }

    /// Current streak plus `best = max(previous_best, current)`, both within the cap
    pub fn compute<I>(&self, timestamps: I, today: NaiveDate, previous_best: u32) -> StreakSummary
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let days = self.active_days(timestamps);
        self.summarize(&days, today, previous_best)
    }

    pub fn summarize(&self, days: &BTreeSet<NaiveDate>, today: NaiveDate, previous_best: u32) -> StreakSummary {
        let current = self.current_streak(days, today);

        StreakSummary {
            current,
            best: previous_best.max(current).min(self.max_days),
        }
    }
}

/// Longest run of consecutive days anywhere in the set
pub fn longest_run(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        run = match previous {
            Some(prev) if day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }

    longest
}
