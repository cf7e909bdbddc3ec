use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

/// Local-day arithmetic for a fixed UTC offset.
///
/// Completion timestamps are stored in UTC; every "which day was this" or
/// "when did this week start" question goes through a `Calendar` so that the
/// day boundary is the user's local midnight, not UTC midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Calendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Build a calendar from an offset in minutes east of UTC.
    /// Returns `None` when the offset is outside ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar day of a timestamp, time-of-day discarded
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Local midnight of `day`, expressed in UTC
    pub fn start_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let utc_naive = local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc_naive)
    }

    /// Start of the current week. Weeks begin on Sunday at local midnight.
    pub fn week_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.day_of(now);
        let days_since_sunday = i64::from(today.weekday().num_days_from_sunday());
        self.start_of_day(today - Duration::days(days_since_sunday))
    }

    /// Whether `at` falls on the same local day as `now`
    pub fn is_same_day(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.day_of(at) == self.day_of(now)
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}
