use std::collections::BTreeMap;

use anyhow::Result;
use rusqlite::Connection;

use crate::db::{Database, HeatmapPoint};

/// Mouse pixels per unit of heatmap intensity.
const DISTANCE_DIVISOR: f64 = 100.0;

fn activity_heatmap(conn: &Connection) -> Result<Vec<HeatmapPoint>> {
    let mut data: BTreeMap<i64, f64> = BTreeMap::new();

    let mut stmt = conn.prepare("SELECT minute, SUM(count) FROM all_keystrokes GROUP BY minute")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?)))?;
    for row in rows {
        let (ts, value) = row?;
        *data.entry(ts).or_default() += value;
    }

    // Keystrokes alone still make a useful map, so a failed distance query
    // only degrades the result.
    match distance_per_minute(conn) {
        Ok(distances) => {
            for (ts, distance) in distances {
                *data.entry(ts).or_default() += distance / DISTANCE_DIVISOR;
            }
        }
        Err(err) => log::error!("heatmap mouse distance query failed: {err:?}"),
    }

    Ok(data
        .into_iter()
        .map(|(timestamp, value)| HeatmapPoint { timestamp, value })
        .collect())
}

fn distance_per_minute(conn: &Connection) -> Result<Vec<(i64, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT minute, SUM(value) FROM all_mouse_metrics
         WHERE metric_name = 'distance'
         GROUP BY minute",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut distances = Vec::new();
    for row in rows {
        distances.push(row?);
    }
    Ok(distances)
}

impl Database {
    /// Full-history activity density: keystrokes plus scaled mouse distance
    /// per minute, ascending by timestamp.
    pub async fn heatmap(&self) -> Result<Vec<HeatmapPoint>> {
        self.execute(|conn| activity_heatmap(conn)).await
    }
}
