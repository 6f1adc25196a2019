use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::db::{Database, MouseMetric};

const ENABLE_LOGS: bool = true;

use crate::log_error;

fn upsert_metric(conn: &Connection, bucket: i64, metric: MouseMetric, delta: f64) -> Result<()> {
    conn.execute(
        "INSERT INTO mouse_metrics (minute, metric_name, value) VALUES (?1, ?2, ?3)
         ON CONFLICT(minute, metric_name) DO UPDATE SET value = value + excluded.value",
        params![bucket, metric.as_str(), delta],
    )
    .with_context(|| format!("failed to flush mouse metric {}", metric.as_str()))?;
    Ok(())
}

impl Database {
    /// Upsert-accumulate a batch of mouse deltas into one bucket.
    ///
    /// Non-positive deltas are skipped. Each metric is written on its own,
    /// so a failing upsert is logged and only that metric's delta is lost.
    /// Returns how many metrics were written.
    pub async fn accumulate_mouse_metrics(
        &self,
        bucket: i64,
        deltas: Vec<(MouseMetric, f64)>,
    ) -> Result<usize> {
        self.execute(move |conn| {
            let mut written = 0;
            for (metric, delta) in deltas {
                if delta <= 0.0 {
                    continue;
                }
                match upsert_metric(conn, bucket, metric, delta) {
                    Ok(()) => written += 1,
                    Err(err) => log_error!("{err:?}"),
                }
            }
            Ok(written)
        })
        .await
    }

    /// Stored value for one metric in one bucket of the local table.
    #[cfg(test)]
    pub async fn mouse_metric_value(&self, metric: MouseMetric, bucket: i64) -> Result<f64> {
        self.execute(move |conn| {
            let value = conn.query_row(
                "SELECT COALESCE(SUM(value), 0.0) FROM mouse_metrics WHERE minute = ?1 AND metric_name = ?2",
                params![bucket, metric.as_str()],
                |row| row.get(0),
            )?;
            Ok(value)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{test_support::open_temp, MouseMetric};

    #[tokio::test]
    async fn accumulates_and_skips_zero_deltas() {
        let (_dir, db) = open_temp("host-a.db");

        let written = db
            .accumulate_mouse_metrics(
                120,
                vec![
                    (MouseMetric::Distance, 12.5),
                    (MouseMetric::ClicksLeft, 2.0),
                    (MouseMetric::Scroll, 0.0),
                ],
            )
            .await
            .expect("first flush");
        assert_eq!(written, 2);

        db.accumulate_mouse_metrics(120, vec![(MouseMetric::Distance, 7.5)])
            .await
            .expect("second flush");

        assert_eq!(db.mouse_metric_value(MouseMetric::Distance, 120).await.unwrap(), 20.0);
        assert_eq!(db.mouse_metric_value(MouseMetric::ClicksLeft, 120).await.unwrap(), 2.0);

        let scroll_rows: i64 = db
            .execute(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM mouse_metrics WHERE metric_name = 'scroll'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(scroll_rows, 0);
    }

    #[tokio::test]
    async fn failing_metric_does_not_drop_the_others() {
        let (_dir, db) = open_temp("host-a.db");
        db.execute(|conn| {
            conn.execute_batch(
                "CREATE TEMP TRIGGER reject_scroll BEFORE INSERT ON main.mouse_metrics
                 WHEN NEW.metric_name = 'scroll'
                 BEGIN SELECT RAISE(ABORT, 'scroll rejected'); END;",
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let written = db
            .accumulate_mouse_metrics(
                180,
                vec![
                    (MouseMetric::Scroll, 4.0),
                    (MouseMetric::Distance, 30.0),
                    (MouseMetric::ClicksRight, 1.0),
                ],
            )
            .await
            .expect("flush");
        assert_eq!(written, 2);
        assert_eq!(db.mouse_metric_value(MouseMetric::Distance, 180).await.unwrap(), 30.0);
        assert_eq!(db.mouse_metric_value(MouseMetric::ClicksRight, 180).await.unwrap(), 1.0);
        assert_eq!(db.mouse_metric_value(MouseMetric::Scroll, 180).await.unwrap(), 0.0);
    }
}
