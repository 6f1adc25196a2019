use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

pub mod federation;
pub mod helpers;
mod migrations;
pub mod models;
mod repositories;

use migrations::run_migrations;

pub use federation::{PeerSource, ScanReport};
pub use models::{
    AppCallStats, CallObservation, CallStats, HeatmapPoint, KeyCount, KpmStats, MouseMetric,
    MouseStats, Stats, TimePoint, TypingStats,
};

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// Handle to this machine's store.
///
/// The SQLite connection lives on a dedicated thread and every operation is
/// shipped to it as a closure. Attached peers and the temporary union views
/// are connection-scoped, so this thread is the only place they exist; two
/// operations never interleave.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("busygraph-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result = run_migrations(&mut conn)
                    .context("failed to run database migrations")
                    .and_then(|()| {
                        federation::recreate_views(&conn, &[])
                            .context("failed to create federation views")
                    });
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Directory scanned for peer stores.
    pub fn data_dir(&self) -> &Path {
        self.db_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// File name of this machine's own store, excluded from discovery.
    pub fn own_file_name(&self) -> String {
        self.db_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::open_temp;

    #[tokio::test]
    async fn opening_creates_tables_and_views() {
        let (_dir, db) = open_temp("host-a.db");

        let names: Vec<String> = db
            .execute(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table'
                     UNION ALL
                     SELECT name FROM sqlite_temp_master WHERE type = 'view'
                     ORDER BY 1",
                )?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut names = Vec::new();
                for name in rows {
                    names.push(name?);
                }
                Ok(names)
            })
            .await
            .expect("list schema objects");

        for expected in [
            "all_keystrokes",
            "all_mouse_metrics",
            "all_video_calls",
            "keystrokes",
            "mouse_metrics",
            "video_calls",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn exposes_data_dir_and_own_file() {
        let (dir, db) = open_temp("host-a.db");
        assert_eq!(db.data_dir(), dir.path());
        assert_eq!(db.own_file_name(), "host-a.db");
    }

    #[tokio::test]
    async fn reopening_existing_store_is_idempotent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("host-a.db");
        {
            let db = super::Database::new(path.clone()).expect("first open");
            db.increment_key("a", 60).await.expect("write");
        }
        let db = super::Database::new(path).expect("second open");
        let count: i64 = db
            .execute(|conn| {
                Ok(conn.query_row("SELECT SUM(count) FROM keystrokes", [], |row| row.get(0))?)
            })
            .await
            .expect("count");
        assert_eq!(count, 1);
    }
}
