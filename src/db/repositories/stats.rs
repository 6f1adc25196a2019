use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::video_calls::total_call_minutes;
use crate::db::{
    helpers::{best_effort, local_midnight},
    Database, KeyCount, KpmStats, MouseMetric, MouseStats, Stats, TimePoint, TypingStats,
};
use crate::stats::{chars_per_backspace, fill_gaps, RangeWindow, TimeRange};

const TOP_KEYS_LIMIT: i64 = 10;
const BACKSPACE_LABEL: &str = "[BACKSPACE]";
const CALENDAR_DAYS: i64 = 365;

fn total_keystrokes(conn: &Connection, start: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(count), 0) FROM all_keystrokes WHERE minute >= ?1",
        params![start],
        |row| row.get(0),
    )?)
}

fn top_keys(conn: &Connection, start: i64) -> Result<Vec<KeyCount>> {
    let mut stmt = conn.prepare(
        "SELECT key_char, SUM(count) AS total
         FROM all_keystrokes
         WHERE minute >= ?1
         GROUP BY key_char
         ORDER BY total DESC, key_char ASC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![start, TOP_KEYS_LIMIT], |row| {
        Ok(KeyCount {
            key: row.get(0)?,
            count: row.get(1)?,
        })
    })?;
    let mut keys = Vec::new();
    for key in rows {
        keys.push(key?);
    }
    Ok(keys)
}

/// Keystroke sums per display bucket. Minute buckets are already aligned;
/// wider ones are re-bucketed by integer division of the minute epoch.
fn bucketed_counts(conn: &Connection, window: &RangeWindow) -> Result<HashMap<i64, i64>> {
    let mut stmt = conn.prepare(
        "SELECT (minute / ?1) * ?1 AS bucket, SUM(count)
         FROM all_keystrokes
         WHERE minute >= ?2
         GROUP BY bucket",
    )?;
    let rows = stmt.query_map(params![window.bucket_secs, window.query_start()], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
    })?;
    let mut counts = HashMap::new();
    for row in rows {
        let (bucket, count) = row?;
        counts.insert(bucket, count);
    }
    Ok(counts)
}

fn calendar(conn: &Connection, start: i64) -> Result<Vec<TimePoint>> {
    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m-%d', minute, 'unixepoch', 'localtime') AS day, SUM(count)
         FROM all_keystrokes
         WHERE minute >= ?1
         GROUP BY day
         ORDER BY day ASC",
    )?;
    let rows = stmt.query_map(params![start], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    let mut days = Vec::new();
    for row in rows {
        let (day, count) = row?;
        days.push(TimePoint {
            time: local_midnight(&day)?,
            count,
        });
    }
    Ok(days)
}

fn mouse_totals(conn: &Connection, start: i64) -> Result<MouseStats> {
    let mut stmt = conn.prepare(
        "SELECT metric_name, SUM(value)
         FROM all_mouse_metrics
         WHERE minute >= ?1
         GROUP BY metric_name",
    )?;
    let rows = stmt.query_map(params![start], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;

    let mut mouse = MouseStats::default();
    for row in rows {
        let (name, value) = row?;
        match MouseMetric::from_name(&name) {
            Some(MouseMetric::ClicksLeft) => mouse.clicks_left = value as i64,
            Some(MouseMetric::ClicksRight) => mouse.clicks_right = value as i64,
            Some(MouseMetric::Scroll) => mouse.scroll = value as i64,
            Some(MouseMetric::Distance) => mouse.distance = value,
            None => {}
        }
    }
    Ok(mouse)
}

/// Highest single-minute keystroke sum, always at minute granularity.
fn max_per_minute(conn: &Connection, start: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(minute_total), 0) FROM (
            SELECT SUM(count) AS minute_total
            FROM all_keystrokes
            WHERE minute >= ?1
            GROUP BY minute
         )",
        params![start],
        |row| row.get(0),
    )?)
}

fn backspaces(conn: &Connection, start: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(count), 0) FROM all_keystrokes WHERE minute >= ?1 AND key_char = ?2",
        params![start, BACKSPACE_LABEL],
        |row| row.get(0),
    )?)
}

/// The `strftime` field (`%H` hour, `%w` weekday) with the most distinct
/// active minutes, where active means a keystroke or an in-call minute.
/// Ties go to the smallest value; -1 when nothing is active.
fn busiest(conn: &Connection, start: i64, field: &str) -> Result<i32> {
    let sql = format!(
        "SELECT CAST(strftime('{field}', minute, 'unixepoch', 'localtime') AS INTEGER) AS slot,
                COUNT(*) AS active_minutes
         FROM (
            SELECT DISTINCT minute FROM all_keystrokes WHERE minute >= ?1
            UNION
            SELECT minute FROM all_video_calls WHERE minute >= ?1 AND in_call = 1
         )
         GROUP BY slot
         ORDER BY active_minutes DESC, slot ASC
         LIMIT 1"
    );
    let slot = conn
        .query_row(&sql, params![start], |row| row.get::<_, i32>(0))
        .optional()?;
    Ok(slot.unwrap_or(-1))
}

fn collect_stats(conn: &Connection, range: TimeRange, now: DateTime<Utc>) -> Stats {
    let window = range.window(now);
    let start = window.query_start();

    let total = best_effort(total_keystrokes(conn, start), "total keystrokes");
    let history_counts = best_effort(bucketed_counts(conn, &window), "history");
    let calendar_start = (now - Duration::days(CALENDAR_DAYS)).timestamp();
    let backspace_count = best_effort(backspaces(conn, start), "backspaces");
    let call_minutes = best_effort(total_call_minutes(conn, start), "call minutes");

    Stats {
        total,
        kpm: KpmStats {
            avg: total as f64 / window.duration_minutes(),
            max: best_effort(max_per_minute(conn, start), "max keys per minute"),
        },
        typing: TypingStats {
            backspaces: backspace_count,
            chars_per_backspace: chars_per_backspace(total, backspace_count),
        },
        top_keys: best_effort(top_keys(conn, start), "top keys"),
        history: fill_gaps(&window, &history_counts),
        calendar: best_effort(calendar(conn, calendar_start), "calendar"),
        mouse: best_effort(mouse_totals(conn, start), "mouse totals"),
        busiest_hour: busiest(conn, start, "%H").unwrap_or_else(|err| {
            log::error!("busiest hour query failed: {err:?}");
            -1
        }),
        busiest_day: busiest(conn, start, "%w").unwrap_or_else(|err| {
            log::error!("busiest day query failed: {err:?}");
            -1
        }),
        avg_call_minutes_per_day: call_minutes as f64 / window.duration_days(),
    }
}

impl Database {
    /// Dashboard report for `range` as seen at `now`. Individual aggregate
    /// failures are logged and leave their field zeroed.
    pub async fn stats(&self, range: TimeRange, now: DateTime<Utc>) -> Result<Stats> {
        self.execute(move |conn| Ok(collect_stats(conn, range, now)))
            .await
    }
}
