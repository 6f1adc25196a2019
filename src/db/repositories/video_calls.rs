use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::{
    helpers::{best_effort, flag, local_midnight},
    AppCallStats, CallObservation, CallStats, Database, HeatmapPoint, TimePoint,
};
use crate::stats::{count_calls, TimeRange};

fn call_minute_totals(conn: &Connection, start: i64) -> Result<(i64, i64, i64)> {
    let totals = conn.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN in_call = 1 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN camera_active = 1 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN microphone_active = 1 THEN 1 ELSE 0 END), 0)
         FROM all_video_calls WHERE minute >= ?1",
        params![start],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    Ok(totals)
}

fn in_call_minutes(conn: &Connection, start: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT minute FROM all_video_calls
         WHERE minute >= ?1 AND in_call = 1
         ORDER BY minute ASC",
    )?;
    let rows = stmt.query_map(params![start], |row| row.get(0))?;
    let mut minutes = Vec::new();
    for minute in rows {
        minutes.push(minute?);
    }
    Ok(minutes)
}

fn app_breakdown(conn: &Connection, start: i64) -> Result<Vec<AppCallStats>> {
    let mut stmt = conn.prepare(
        "SELECT app, COUNT(*) AS minutes
         FROM all_video_calls
         WHERE minute >= ?1 AND in_call = 1 AND app != ''
         GROUP BY app
         ORDER BY minutes DESC, app ASC",
    )?;
    let rows = stmt.query_map(params![start], |row| {
        Ok(AppCallStats {
            app: row.get(0)?,
            minutes: row.get(1)?,
        })
    })?;
    let mut apps = Vec::new();
    for app in rows {
        apps.push(app?);
    }
    Ok(apps)
}

fn daily_call_minutes(conn: &Connection, start: i64) -> Result<Vec<TimePoint>> {
    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m-%d', minute, 'unixepoch', 'localtime') AS day, COUNT(*)
         FROM all_video_calls
         WHERE minute >= ?1 AND in_call = 1
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

/// Range-scoped call heatmap: every recorded minute with its in-call flag.
fn range_call_heatmap(conn: &Connection, start: i64) -> Result<Vec<HeatmapPoint>> {
    let mut stmt = conn.prepare(
        "SELECT minute, in_call FROM all_video_calls WHERE minute >= ?1 ORDER BY minute ASC",
    )?;
    let rows = stmt.query_map(params![start], |row| {
        Ok(HeatmapPoint {
            timestamp: row.get(0)?,
            value: row.get::<_, i64>(1)? as f64,
        })
    })?;
    let mut points = Vec::new();
    for point in rows {
        points.push(point?);
    }
    Ok(points)
}

/// Total in-call minutes since `start`, used by the main stats report.
pub(super) fn total_call_minutes(conn: &Connection, start: i64) -> Result<i64> {
    let (total, _, _) = call_minute_totals(conn, start)?;
    Ok(total)
}

impl Database {
    /// Fold one call-state poll into its minute. Observations outside a
    /// call are ignored; camera and microphone flags only ever go from 0 to
    /// 1 within a minute, and an empty app name never replaces a known one.
    pub async fn record_call_observation(
        &self,
        observation: CallObservation,
        bucket: i64,
    ) -> Result<()> {
        if !observation.in_call {
            return Ok(());
        }

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO video_calls (minute, in_call, camera_active, microphone_active, app)
                 VALUES (?1, 1, ?2, ?3, ?4)
                 ON CONFLICT(minute) DO UPDATE SET
                    in_call = 1,
                    camera_active = MAX(camera_active, excluded.camera_active),
                    microphone_active = MAX(microphone_active, excluded.microphone_active),
                    app = COALESCE(NULLIF(excluded.app, ''), app)",
                params![
                    bucket,
                    flag(observation.camera_active),
                    flag(observation.microphone_active),
                    observation.app,
                ],
            )
            .context("failed to track video call")?;
            Ok(())
        })
        .await
    }

    pub async fn call_stats(
        &self,
        range: TimeRange,
        now: DateTime<Utc>,
        call_gap_secs: i64,
    ) -> Result<CallStats> {
        let start = range.window(now).query_start();
        self.execute(move |conn| {
            let (total_minutes, camera_minutes, microphone_minutes) =
                best_effort(call_minute_totals(conn, start), "call minute totals");
            let minutes = best_effort(in_call_minutes(conn, start), "call clustering");

            Ok(CallStats {
                total_minutes,
                total_calls: count_calls(&minutes, call_gap_secs),
                camera_minutes,
                microphone_minutes,
                app_breakdown: best_effort(app_breakdown(conn, start), "call app breakdown"),
                daily_minutes: best_effort(daily_call_minutes(conn, start), "daily call minutes"),
                heatmap: best_effort(range_call_heatmap(conn, start), "range call heatmap"),
            })
        })
        .await
    }

    /// Full-history heatmap of in-call minutes.
    pub async fn call_heatmap(&self) -> Result<Vec<HeatmapPoint>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT minute, in_call FROM all_video_calls WHERE in_call = 1 ORDER BY minute ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(HeatmapPoint {
                    timestamp: row.get(0)?,
                    value: row.get::<_, i64>(1)? as f64,
                })
            })?;
            let mut points = Vec::new();
            for point in rows {
                points.push(point?);
            }
            Ok(points)
        })
        .await
    }
}
