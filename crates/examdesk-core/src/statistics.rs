//! Dashboard statistics over timestamped entities.
//!
//! All day and week arithmetic happens in one reference timezone, held by a
//! [`Calendar`]. Weeks are ISO-8601 weeks starting on Monday and are compared
//! by the date they start on, so a week spanning New Year is still one week.
//! Instants whose day or week would fall outside chrono's date range match
//! nothing.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Offset, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::model::{Exam, ExamUser, Question, User};

/// Length of the rolling histogram window in days.
pub const WINDOW_DAYS: usize = 7;

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Day and week boundaries in a fixed reference timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The calendar date of `t` in the reference timezone.
    pub fn local_date(&self, t: DateTime<Utc>) -> Option<NaiveDate> {
        let shift = TimeDelta::seconds(i64::from(self.offset.local_minus_utc()));
        t.naive_utc().checked_add_signed(shift).map(|local| local.date())
    }

    /// The Monday starting the ISO week that contains `t`.
    pub fn week_start(&self, t: DateTime<Utc>) -> Option<NaiveDate> {
        let date = self.local_date(t)?;
        date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
    }

    /// Whether `a` and `b` fall on the same calendar day.
    pub fn is_same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        matches!((self.local_date(a), self.local_date(b)), (Some(x), Some(y)) if x == y)
    }

    /// Whether `a` and `b` fall in the same ISO week.
    pub fn is_same_week(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        matches!((self.week_start(a), self.week_start(b)), (Some(x), Some(y)) if x == y)
    }

    /// Whether `candidate` falls in the ISO week directly before the week of
    /// `reference`.
    pub fn is_last_week(&self, reference: DateTime<Utc>, candidate: DateTime<Utc>) -> bool {
        let following = self
            .week_start(candidate)
            .and_then(|start| start.checked_add_days(Days::new(7)));
        matches!((following, self.week_start(reference)), (Some(x), Some(y)) if x == y)
    }
}

/// Parse a UTC offset such as `+07:00`, `-0530`, `+7`, `Z` or `UTC`.
pub fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }

    let (sign, rest) = match s.as_bytes().first().copied()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    if !rest.is_ascii() {
        return None;
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

/// An entity that can be placed on the calendar.
pub trait Timestamped {
    /// The instant the entity counts at, if known.
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for Exam {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_date
    }
}

impl Timestamped for Question {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_date
    }
}

impl Timestamped for User {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_date
    }
}

/// Attempts count on the day they were finished.
impl Timestamped for ExamUser {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.time_finish
    }
}

impl Timestamped for DateTime<Utc> {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(*self)
    }
}

/// Percentage change from `last` to `current`.
///
/// A zero `last` yields `100.0` if `current` is positive and `0.0` otherwise,
/// never NaN or infinity.
pub fn percent_change(current: u64, last: u64) -> f64 {
    if last == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    (current as f64 - last as f64) / last as f64 * 100.0
}

/// Entity counts for the current and previous ISO week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyChange {
    pub this_week: u64,
    pub last_week: u64,
    pub percent: f64,
}

/// Count entities in the week of `now` and the week before it.
pub fn week_over_week<T: Timestamped>(
    items: &[T],
    calendar: &Calendar,
    now: DateTime<Utc>,
) -> WeeklyChange {
    let mut this_week = 0;
    let mut last_week = 0;
    for t in items.iter().filter_map(Timestamped::timestamp) {
        if calendar.is_same_week(now, t) {
            this_week += 1;
        } else if calendar.is_last_week(now, t) {
            last_week += 1;
        }
    }

    WeeklyChange {
        this_week,
        last_week,
        percent: percent_change(this_week, last_week),
    }
}

/// Count entities on each of the last seven days.
///
/// Index 0 is six days ago and index 6 is the day of `now`. Entities dated
/// after that day, or without a timestamp, are not counted.
pub fn daily_counts<T: Timestamped>(
    items: &[T],
    calendar: &Calendar,
    now: DateTime<Utc>,
) -> [u64; WINDOW_DAYS] {
    let mut counts = [0; WINDOW_DAYS];
    let Some(today) = calendar.local_date(now) else {
        return counts;
    };

    for day in items
        .iter()
        .filter_map(Timestamped::timestamp)
        .filter_map(|t| calendar.local_date(t))
    {
        let age = (today - day).num_days();
        if (0..WINDOW_DAYS as i64).contains(&age) {
            counts[WINDOW_DAYS - 1 - age as usize] += 1;
        }
    }
    counts
}

/// Number of entities dated on the same day as `now`.
pub fn count_today<T: Timestamped>(items: &[T], calendar: &Calendar, now: DateTime<Utc>) -> u64 {
    items
        .iter()
        .filter_map(Timestamped::timestamp)
        .filter(|t| calendar.is_same_day(now, *t))
        .count() as u64
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Total and weekly change for one kind of entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStats {
    /// Every row, deleted ones included.
    pub total: u64,
    pub change: WeeklyChange,
}

impl EntityStats {
    fn compute<T: Timestamped>(items: &[T], calendar: &Calendar, now: DateTime<Utc>) -> Self {
        Self {
            total: items.len() as u64,
            change: week_over_week(items, calendar, now),
        }
    }
}

/// Figures shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub exams: EntityStats,
    pub questions: EntityStats,
    pub accounts: EntityStats,
    pub attempts: EntityStats,
    /// Finished attempts per day, oldest first.
    pub attempts_last_seven_days: [u64; WINDOW_DAYS],
}

impl Dashboard {
    pub fn compute(
        exams: &[Exam],
        questions: &[Question],
        users: &[User],
        attempts: &[ExamUser],
        calendar: &Calendar,
        clock: &dyn Clock,
    ) -> Self {
        let now = clock.now();
        tracing::debug!(%now, offset = %calendar.offset(), "computing dashboard");

        Self {
            generated_at: now,
            exams: EntityStats::compute(exams, calendar, now),
            questions: EntityStats::compute(questions, calendar, now),
            accounts: EntityStats::compute(users, calendar, now),
            attempts: EntityStats::compute(attempts, calendar, now),
            attempts_last_seven_days: daily_counts(attempts, calendar, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::Grade;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn cal() -> Calendar {
        Calendar::utc()
    }

    #[test]
    fn same_day_ignores_time_of_day() {
        let t = at(2026, 10, 14, 9, 30);
        assert!(cal().is_same_day(t, t));
        assert!(cal().is_same_day(t, at(2026, 10, 14, 23, 59)));
        assert!(!cal().is_same_day(t, t + TimeDelta::days(1)));
        assert!(!cal().is_same_day(at(2026, 10, 14, 23, 59), at(2026, 10, 15, 0, 0)));
    }

    #[test]
    fn same_day_uses_reference_offset() {
        // 18:00 UTC on the 14th is already the 15th at +07:00.
        let bangkok = Calendar::with_offset(FixedOffset::east_opt(7 * 3600).unwrap());
        let late = at(2026, 10, 14, 18, 0);
        let next_morning = at(2026, 10, 15, 2, 0);
        assert!(!cal().is_same_day(late, next_morning));
        assert!(bangkok.is_same_day(late, next_morning));
    }

    #[test]
    fn same_week_within_iso_week() {
        // Wednesday 2026-10-14.
        let t = at(2026, 10, 14, 12, 0);
        assert!(cal().is_same_week(t, t + TimeDelta::days(2)));
        assert!(!cal().is_same_week(t, t + TimeDelta::days(7)));
    }

    #[test]
    fn sunday_and_monday_are_different_weeks() {
        let sunday = at(2026, 10, 18, 23, 59);
        let monday = at(2026, 10, 19, 0, 0);
        assert!(!cal().is_same_week(sunday, monday));
        assert!(cal().is_last_week(monday, sunday));
        assert!(cal().is_same_week(at(2026, 10, 12, 0, 0), sunday));
    }

    #[test]
    fn week_rollover_across_new_year() {
        // Thursday 2026-12-31 and Monday 2027-01-04 sit in consecutive weeks;
        // Friday 2027-01-01 shares a week with New Year's Eve.
        let eve = at(2026, 12, 31, 10, 0);
        assert!(cal().is_same_week(eve, at(2027, 1, 1, 10, 0)));
        assert!(cal().is_same_week(eve, at(2027, 1, 3, 23, 0)));
        assert!(!cal().is_same_week(eve, at(2027, 1, 4, 0, 0)));
        assert!(cal().is_last_week(at(2027, 1, 4, 8, 0), eve));
        assert_eq!(cal().week_start(eve), NaiveDate::from_ymd_opt(2026, 12, 28));
    }

    #[test]
    fn last_week_is_exactly_one_week_back() {
        let now = at(2026, 10, 14, 12, 0);
        assert!(cal().is_last_week(now, now - TimeDelta::days(7)));
        assert!(!cal().is_last_week(now, now - TimeDelta::days(14)));
        assert!(!cal().is_last_week(now, now));
        assert!(!cal().is_last_week(now, now + TimeDelta::days(7)));
    }

    #[test]
    fn date_range_limits_match_nothing() {
        let (min, max) = (DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC);
        let east = Calendar::with_offset(FixedOffset::east_opt(7 * 3600).unwrap());
        let west = Calendar::with_offset(FixedOffset::west_opt(7 * 3600).unwrap());

        assert!(cal().is_same_day(max, max));
        assert!(east.local_date(max).is_none());
        assert!(west.local_date(min).is_none());
        assert!(!east.is_same_day(max, max));

        // Neither call may panic, whatever the weekday of the first date.
        let _ = cal().week_start(min);
        assert!(!cal().is_last_week(max, max));
        assert!(!cal().is_last_week(min, max));
        assert!(!west.is_same_week(min, min));

        assert_eq!(daily_counts(&[max, min], &cal(), max), [0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(daily_counts(&[max], &east, max), [0; 7]);
    }

    #[test]
    fn percent_change_handles_zero_last_week() {
        assert_eq!(percent_change(5, 0), 100.0);
        assert_eq!(percent_change(0, 0), 0.0);
        assert_eq!(percent_change(15, 10), 50.0);
        assert_eq!(percent_change(5, 10), -50.0);
        assert!(percent_change(3, 0).is_finite());
    }

    #[test]
    fn week_over_week_counts_both_weeks() {
        let now = at(2026, 10, 14, 12, 0);
        let stamps = vec![
            now,
            now - TimeDelta::days(1),
            now - TimeDelta::days(7),
            now - TimeDelta::days(20),
        ];
        let change = week_over_week(&stamps, &cal(), now);
        assert_eq!(change.this_week, 2);
        assert_eq!(change.last_week, 1);
        assert_eq!(change.percent, 100.0);
    }

    #[test]
    fn histogram_is_oldest_first_with_one_per_day() {
        let now = at(2026, 10, 14, 12, 0);
        let stamps: Vec<_> = (0..7).map(|d| now - TimeDelta::days(d)).collect();
        let counts = daily_counts(&stamps, &cal(), now);
        assert_eq!(counts, [1; 7]);
        assert_eq!(counts.iter().sum::<u64>(), 7);

        let skewed = vec![now, now, now - TimeDelta::days(6)];
        assert_eq!(daily_counts(&skewed, &cal(), now), [1, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn histogram_ignores_future_and_stale_entries() {
        let now = at(2026, 10, 14, 12, 0);
        let stamps = vec![now + TimeDelta::days(1), now - TimeDelta::days(7), now];
        assert_eq!(daily_counts(&stamps, &cal(), now), [0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(count_today(&stamps, &cal(), now), 1);
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("+07:00").unwrap().local_minus_utc(), 25_200);
        assert_eq!(parse_utc_offset("-0530").unwrap().local_minus_utc(), -19_800);
        assert_eq!(parse_utc_offset("+7").unwrap().local_minus_utc(), 25_200);
        assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("07:00").is_none());
        assert!(parse_utc_offset("+25:00").is_none());
        assert!(parse_utc_offset("").is_none());
        assert!(parse_utc_offset("+1é1").is_none());
        assert!(parse_utc_offset("-é").is_none());
    }

    #[test]
    fn dashboard_counts_totals_and_histogram() {
        let now = at(2026, 10, 14, 12, 0);
        let mut users = vec![User::new(1, "alice"), User::new(2, "bob")];
        users[0].created_date = Some(now - TimeDelta::days(1));

        let attempts: Vec<ExamUser> = (0..3)
            .map(|i| ExamUser {
                id: i + 1,
                exam_id: 1,
                course_id: None,
                username: format!("user{i}"),
                is_started: true,
                is_finished: i < 2,
                remaining_time: 0,
                total_point: Grade::Graded(1.0),
                time_finish: (i < 2).then(|| now - TimeDelta::days(i)),
            })
            .collect();

        let dashboard =
            Dashboard::compute(&[], &[], &users, &attempts, &cal(), &FixedClock(now));
        assert_eq!(dashboard.generated_at, now);
        assert_eq!(dashboard.exams.total, 0);
        assert_eq!(dashboard.accounts.total, 2);
        assert_eq!(dashboard.accounts.change.this_week, 1);
        assert_eq!(dashboard.attempts.total, 3);
        assert_eq!(dashboard.attempts.change.this_week, 2);
        assert_eq!(dashboard.attempts_last_seven_days, [0, 0, 0, 0, 0, 1, 1]);
    }
}
