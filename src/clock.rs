//! Minute-epoch bucketing shared by every writer and reader.

use chrono::{DateTime, Utc};

pub const BUCKET_SECS: i64 = 60;

/// Unix timestamp of the start of the minute containing `now`.
pub fn bucket_of(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(BUCKET_SECS) * BUCKET_SECS
}

pub fn current_bucket() -> i64 {
    bucket_of(Utc::now())
}

/// Align a Unix timestamp down to a multiple of `width_secs`.
pub fn align_down(ts: i64, width_secs: i64) -> i64 {
    ts.div_euclid(width_secs) * width_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn truncates_to_start_of_minute() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 59).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(bucket_of(at), start.timestamp());
        assert_eq!(bucket_of(start), start.timestamp());
    }

    #[test]
    fn sub_second_timing_does_not_move_bucket() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let late = base + chrono::Duration::milliseconds(59_999);
        assert_eq!(bucket_of(base), bucket_of(late));
    }

    #[test]
    fn align_down_handles_wider_buckets() {
        assert_eq!(align_down(7_199, 3_600), 3_600);
        assert_eq!(align_down(86_400 * 3 + 5, 86_400), 86_400 * 3);
    }
}
