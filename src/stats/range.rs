use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::align_down;

const MINUTE: i64 = 60;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;

/// Named dashboard ranges.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "1y")]
    Year,
}

/// A range resolved against a concrete "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    /// `now` minus the range offset. Aggregates filter from
    /// [`RangeWindow::query_start`], which never precedes this.
    pub start: i64,
    pub now: i64,
    pub bucket_secs: i64,
    pub max_points: usize,
}

impl TimeRange {
    pub const ALL: [TimeRange; 5] = [
        TimeRange::Hour,
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Hour => "1h",
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::Year => "1y",
        }
    }

    /// Lenient parse used by the query surface: unknown names fall back to `1h`.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_else(|err| {
            log::warn!("{err}; using {}", TimeRange::default());
            TimeRange::default()
        })
    }

    pub fn bucket_secs(&self) -> i64 {
        match self {
            TimeRange::Hour | TimeRange::Day => MINUTE,
            TimeRange::Week | TimeRange::Month => HOUR,
            TimeRange::Year => DAY,
        }
    }

    pub fn max_points(&self) -> usize {
        match self {
            TimeRange::Hour => 60,
            TimeRange::Day => 24 * 60,
            TimeRange::Week => 7 * 24,
            TimeRange::Month => 30 * 24,
            TimeRange::Year => 365,
        }
    }

    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeRange::Hour => now - Duration::minutes(60),
            TimeRange::Day => now - Duration::hours(24),
            TimeRange::Week => now - Duration::days(7),
            TimeRange::Month => now - Duration::days(30),
            TimeRange::Year => now
                .checked_sub_months(Months::new(12))
                .unwrap_or_else(|| now - Duration::days(365)),
        }
    }

    pub fn window(&self, now: DateTime<Utc>) -> RangeWindow {
        RangeWindow {
            start: self.start(now).timestamp(),
            now: now.timestamp(),
            bucket_secs: self.bucket_secs(),
            max_points: self.max_points(),
        }
    }
}

impl RangeWindow {
    /// Range length in minutes, never below one.
    pub fn duration_minutes(&self) -> f64 {
        ((self.now - self.start) as f64 / MINUTE as f64).max(1.0)
    }

    /// Range length in days, never below one.
    pub fn duration_days(&self) -> f64 {
        ((self.now - self.start) as f64 / DAY as f64).max(1.0)
    }

    /// Inclusive lower bound for range-scoped aggregates. Minute-wide
    /// series start at their oldest bucket: when `now` sits exactly on a
    /// minute, `start` is itself a bucket the capped series leaves out, and
    /// counting it would make the total disagree with the history.
    pub fn query_start(&self) -> i64 {
        if self.bucket_secs == MINUTE {
            self.buckets_descending().last().unwrap_or(self.start)
        } else {
            self.start
        }
    }

    /// Expected series buckets, newest first, stopping before `start`.
    pub fn buckets_descending(&self) -> impl Iterator<Item = i64> + '_ {
        let newest = align_down(self.now, self.bucket_secs);
        (0..self.max_points as i64)
            .map(move |i| newest - i * self.bucket_secs)
            .take_while(move |ts| *ts >= self.start)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|range| range.as_str() == value)
            .ok_or_else(|| anyhow!("unknown time range '{value}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 15, 42, 30).unwrap()
    }

    #[test]
    fn parses_every_named_range() {
        for range in TimeRange::ALL {
            assert_eq!(range.as_str().parse::<TimeRange>().unwrap(), range);
        }
        assert!("2w".parse::<TimeRange>().is_err());
        assert_eq!(TimeRange::parse_or_default("2w"), TimeRange::Hour);
        assert_eq!(TimeRange::parse_or_default("7d"), TimeRange::Week);
    }

    #[test]
    fn resolution_table() {
        let now = now();
        let cases = [
            (TimeRange::Hour, 3_600, 60, 60),
            (TimeRange::Day, 86_400, 60, 1_440),
            (TimeRange::Week, 7 * 86_400, 3_600, 168),
            (TimeRange::Month, 30 * 86_400, 3_600, 720),
        ];
        for (range, offset, width, points) in cases {
            let window = range.window(now);
            assert_eq!(window.now - window.start, offset, "{range}");
            assert_eq!(window.bucket_secs, width, "{range}");
            assert_eq!(window.max_points, points, "{range}");
        }

        let year = TimeRange::Year.window(now);
        assert_eq!(
            year.start,
            Utc.with_ymd_and_hms(2023, 6, 12, 15, 42, 30).unwrap().timestamp()
        );
        assert_eq!(year.bucket_secs, 86_400);
        assert_eq!(year.max_points, 365);
    }

    #[test]
    fn hour_window_yields_sixty_aligned_buckets() {
        let window = TimeRange::Hour.window(now());
        let buckets: Vec<i64> = window.buckets_descending().collect();
        assert_eq!(buckets.len(), 60);
        assert_eq!(buckets[0], Utc.with_ymd_and_hms(2024, 6, 12, 15, 42, 0).unwrap().timestamp());
        assert!(buckets.iter().all(|ts| ts % 60 == 0 && *ts >= window.start));
    }

    #[test]
    fn year_window_stops_at_start() {
        let window = TimeRange::Year.window(now());
        let buckets: Vec<i64> = window.buckets_descending().collect();
        assert!(buckets.len() <= 365);
        assert!(buckets.iter().all(|ts| *ts >= window.start));
    }

    #[test]
    fn minute_query_start_skips_bucket_outside_series() {
        let on_minute = Utc.with_ymd_and_hms(2024, 6, 12, 15, 42, 0).unwrap();
        let window = TimeRange::Hour.window(on_minute);
        assert_eq!(window.start, on_minute.timestamp() - 3_600);
        assert_eq!(window.query_start(), on_minute.timestamp() - 3_540);

        let mid_minute = TimeRange::Hour.window(now());
        assert_eq!(
            mid_minute.query_start(),
            Utc.with_ymd_and_hms(2024, 6, 12, 14, 43, 0).unwrap().timestamp()
        );

        let week = TimeRange::Week.window(now());
        assert_eq!(week.query_start(), week.start);
    }

    #[test]
    fn durations_never_drop_below_one() {
        let window = RangeWindow {
            start: 100,
            now: 110,
            bucket_secs: 60,
            max_points: 1,
        };
        assert_eq!(window.duration_minutes(), 1.0);
        assert_eq!(window.duration_days(), 1.0);
        assert_eq!(TimeRange::Day.window(now()).duration_minutes(), 1_440.0);
    }
}
