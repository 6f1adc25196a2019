use anyhow::{Context, Result};
use rusqlite::params;

use crate::db::Database;

impl Database {
    /// Upsert-accumulate one keystroke into `(bucket, label)`.
    pub async fn increment_key(&self, label: &str, bucket: i64) -> Result<()> {
        let label = label.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO keystrokes (minute, key_char, count) VALUES (?1, ?2, 1)
                 ON CONFLICT(minute, key_char) DO UPDATE SET count = count + 1",
                params![bucket, label],
            )
            .with_context(|| format!("failed to persist keystroke '{label}'"))?;
            Ok(())
        })
        .await
    }

    /// Stored count for one key in one bucket of the local table.
    #[cfg(test)]
    pub async fn key_count(&self, label: &str, bucket: i64) -> Result<i64> {
        let label = label.to_string();
        self.execute(move |conn| {
            let count = conn.query_row(
                "SELECT COALESCE(SUM(count), 0) FROM keystrokes WHERE minute = ?1 AND key_char = ?2",
                params![bucket, label],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
    }
}
