use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local, NaiveDate, TimeZone};
use log::error;

pub fn flag(value: bool) -> i64 {
    i64::from(value)
}

/// Unix timestamp of local midnight for a `YYYY-MM-DD` day label as produced
/// by SQLite's `strftime('%Y-%m-%d', minute, 'unixepoch', 'localtime')`.
pub fn local_midnight(day: &str) -> Result<i64> {
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .with_context(|| format!("failed to parse day label '{day}'"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("invalid midnight for {day}"))?;

    // Midnight can be skipped by a DST jump; the first valid instant of the
    // day is one hour later in every zone that does this.
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.timestamp())
        .ok_or_else(|| anyhow!("no local midnight for {day}"))
}

/// Unwrap a best-effort query result, logging and substituting the default
/// on failure so one broken aggregate never blanks the whole report.
pub fn best_effort<T: Default>(result: Result<T>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!("{what} query failed: {err:?}");
            T::default()
        }
    }
}

/// Percent-encode the characters SQLite treats specially inside a `file:` URI.
pub fn file_uri(path: &str, query: &str) -> String {
    let mut uri = String::with_capacity(path.len() + query.len() + 6);
    uri.push_str("file:");
    for ch in path.chars() {
        match ch {
            '%' => uri.push_str("%25"),
            '?' => uri.push_str("%3f"),
            '#' => uri.push_str("%23"),
            _ => uri.push(ch),
        }
    }
    if !query.is_empty() {
        uri.push('?');
        uri.push_str(query);
    }
    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn local_midnight_lands_on_start_of_day() {
        let ts = local_midnight("2024-03-15").expect("parse");
        let dt = Local.timestamp_opt(ts, 0).single().expect("valid");
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(dt.hour() <= 1);
        assert_eq!(dt.minute(), 0);
    }

    #[test]
    fn local_midnight_rejects_garbage() {
        assert!(local_midnight("yesterday").is_err());
    }

    #[test]
    fn best_effort_falls_back_to_default() {
        let failed: Result<i64> = Err(anyhow!("boom"));
        assert_eq!(best_effort(failed, "total"), 0);
        assert_eq!(best_effort(Ok(7i64), "total"), 7);
    }

    #[test]
    fn file_uri_escapes_reserved_characters() {
        assert_eq!(
            file_uri("/data/odd?name#1%.db", "mode=ro"),
            "file:/data/odd%3fname%231%25.db?mode=ro"
        );
    }
}
