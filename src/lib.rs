pub mod cli;
pub mod clock;
pub mod db;
pub mod input;
pub mod location;
pub mod metrics;
pub mod settings;
pub mod stats;
pub mod tracker;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use db::Database;
use settings::SettingsStore;
use stats::TimeRange;
use tracker::{BackgroundTasks, Tracker};

const ENABLE_LOGS: bool = true;

pub use utils::logging;

/// Open this machine's store in the shared data directory and wrap it in a
/// tracker. Any failure here is fatal: there is no degraded mode without a
/// local store.
pub fn open_tracker(data_dir: Option<PathBuf>) -> Result<(Tracker, SettingsStore)> {
    let data_dir = location::resolve_data_dir(data_dir)?;
    let hostname = location::hostname()?;
    let db_path = location::prepare_store_path(&data_dir, &hostname)?;
    let settings = SettingsStore::new(&data_dir)?;

    let db = Database::new(db_path).context("failed to open local store")?;
    let tracker = Tracker::new(db, settings.settings());
    Ok((tracker, settings))
}

pub async fn run() -> Result<()> {
    logging::init();

    let Cli {
        command,
        data_dir,
        pretty,
    } = Cli::parse();

    let (tracker, settings) = open_tracker(data_dir)?;
    match command {
        Commands::Run => run_daemon(tracker, &settings).await,
        report => print_report(&tracker, report, pretty).await,
    }
}

async fn print_report(tracker: &Tracker, command: Commands, pretty: bool) -> Result<()> {
    // one-shot reports include whatever peers are on disk right now
    tracker.refresh_peers().await;

    match command {
        Commands::Run => Ok(()),
        Commands::Stats { range } => {
            let range = TimeRange::parse_or_default(&range);
            print_json(&tracker.get_stats(range).await, pretty)
        }
        Commands::Heatmap => print_json(&tracker.get_heatmap().await, pretty),
        Commands::Calls { range } => {
            let range = TimeRange::parse_or_default(&range);
            print_json(&tracker.get_call_stats(range).await, pretty)
        }
        Commands::CallHeatmap => print_json(&tracker.get_call_heatmap().await, pretty),
        Commands::Peers => print_json(&tracker.peers().await, pretty),
    }
}

async fn run_daemon(tracker: Tracker, settings: &SettingsStore) -> Result<()> {
    if let Err(err) = settings.persist_if_missing() {
        log_warn!("could not write default settings: {err:?}");
    }

    let initial = tracker.refresh_peers().await;
    log_info!(
        "tracking into {} with {} peer store(s)",
        tracker.database().path().display(),
        initial.active_peers
    );

    let mut tasks = BackgroundTasks::new();
    tasks.start(tracker.clone())?;

    let shutdown = CancellationToken::new();
    let signal_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    log::info!("interrupt received, shutting down");
                    shutdown.cancel();
                }
                Err(err) => log::error!("failed to listen for interrupt: {err}"),
            }
        }
    });

    let stdin = BufReader::new(tokio::io::stdin());
    let ingested = input::ingest(stdin, &tracker, &shutdown).await;
    signal_task.abort();

    tasks.stop().await?;
    let summary = ingested?;

    let snapshot = tracker.metrics_snapshot().await;
    log_info!(
        "stopped after {} events ({} malformed), {} keystrokes, {} flushes, cpu {:.1}%, mem {:.1} MB",
        summary.events,
        summary.malformed,
        snapshot.total_keystrokes(),
        snapshot.flush_count,
        snapshot.system.cpu_percent,
        snapshot.system.memory_mb
    );
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}
