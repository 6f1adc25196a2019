use std::collections::HashMap;

use crate::db::TimePoint;

use super::range::RangeWindow;

/// Expand sparse aggregate rows into a contiguous ascending series: every
/// expected bucket appears exactly once, missing ones with a zero count.
pub fn fill_gaps(window: &RangeWindow, counts: &HashMap<i64, i64>) -> Vec<TimePoint> {
    let mut series: Vec<TimePoint> = window
        .buckets_descending()
        .map(|time| TimePoint {
            time,
            count: counts.get(&time).copied().unwrap_or(0),
        })
        .collect();
    series.reverse();
    series
}

/// Number of distinct calls in an ascending list of in-call minutes: a gap
/// longer than `gap_secs` between neighbours starts a new call.
pub fn count_calls(minutes: &[i64], gap_secs: i64) -> i64 {
    let mut calls = 0;
    let mut previous: Option<i64> = None;
    for &minute in minutes {
        match previous {
            Some(prev) if minute - prev <= gap_secs => {}
            _ => calls += 1,
        }
        previous = Some(minute);
    }
    calls
}
