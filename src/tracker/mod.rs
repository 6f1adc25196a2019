//! The tracker facade: the one place capture sources write to and the
//! dashboard layer reads from.

mod controller;
mod mouse;
mod worker;

pub use controller::BackgroundTasks;
pub use mouse::{MouseBuffer, MouseButton, MouseDeltas};

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::clock::current_bucket;
use crate::db::{CallObservation, CallStats, Database, HeatmapPoint, PeerSource, ScanReport, Stats};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::settings::TrackerSettings;
use crate::stats::TimeRange;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

#[derive(Clone)]
pub struct Tracker {
    db: Database,
    mouse: Arc<Mutex<MouseBuffer>>,
    metrics: MetricsCollector,
    settings: TrackerSettings,
}

impl Tracker {
    pub fn new(db: Database, settings: TrackerSettings) -> Self {
        Self {
            db,
            mouse: Arc::new(Mutex::new(MouseBuffer::new())),
            metrics: MetricsCollector::new(),
            settings,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    fn mouse_buffer(&self) -> MutexGuard<'_, MouseBuffer> {
        match self.mouse.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Count one key press in the current minute.
    pub async fn increment_key(&self, label: &str) {
        if label.is_empty() {
            return;
        }
        self.metrics.record_keystroke(label).await;
        if let Err(err) = self.db.increment_key(label, current_bucket()).await {
            log_error!("failed to track key: {err:?}");
        }
    }

    pub fn record_click(&self, button: MouseButton) {
        self.mouse_buffer().record_click(button);
    }

    pub fn record_scroll(&self, amount: i32) {
        self.mouse_buffer().record_scroll(amount);
    }

    pub fn record_move(&self, x: i16, y: i16) {
        self.mouse_buffer().record_move(x, y);
    }

    pub fn reset_cursor(&self) {
        self.mouse_buffer().reset_position();
    }

    /// Drain the mouse buffer into the current minute. Returns how many
    /// metric rows were written; deltas from a failed write are dropped.
    pub async fn flush_mouse(&self) -> usize {
        let deltas = self.mouse_buffer().take();
        if deltas.is_empty() {
            return 0;
        }

        let bucket = current_bucket();
        match self.db.accumulate_mouse_metrics(bucket, deltas.non_zero()).await {
            Ok(written) => {
                log_debug!("flushed {written} mouse metrics into minute {bucket}");
                self.metrics.record_flush(bucket, written).await;
                written
            }
            Err(err) => {
                log_error!("failed to flush mouse metrics: {err:?}");
                0
            }
        }
    }

    pub async fn record_call_observation(&self, observation: CallObservation) {
        if let Err(err) = self
            .db
            .record_call_observation(observation, current_bucket())
            .await
        {
            log_error!("failed to track video call: {err:?}");
        }
    }

    /// Rescan the data directory for peer stores.
    pub async fn refresh_peers(&self) -> ScanReport {
        match self.db.refresh_peers().await {
            Ok(report) => {
                if !report.attached.is_empty() || !report.detached.is_empty() {
                    log_info!(
                        "peers changed: +{:?} -{:?}, {} active",
                        report.attached,
                        report.detached,
                        report.active_peers
                    );
                }
                self.metrics.set_attached_peers(report.active_peers).await;
                report
            }
            Err(err) => {
                log_error!("peer rescan failed: {err:?}");
                ScanReport::default()
            }
        }
    }

    pub async fn get_stats(&self, range: TimeRange) -> Stats {
        match self.db.stats(range, Utc::now()).await {
            Ok(stats) => stats,
            Err(err) => {
                log_error!("stats query failed for {range}: {err:?}");
                Stats::default()
            }
        }
    }

    pub async fn get_heatmap(&self) -> Vec<HeatmapPoint> {
        self.db.heatmap().await.unwrap_or_else(|err| {
            log_error!("heatmap query failed: {err:?}");
            Vec::new()
        })
    }

    pub async fn get_call_stats(&self, range: TimeRange) -> CallStats {
        match self
            .db
            .call_stats(range, Utc::now(), self.settings.call_gap_secs)
            .await
        {
            Ok(stats) => stats,
            Err(err) => {
                log_error!("call stats query failed for {range}: {err:?}");
                CallStats::default()
            }
        }
    }

    pub async fn get_call_heatmap(&self) -> Vec<HeatmapPoint> {
        self.db.call_heatmap().await.unwrap_or_else(|err| {
            log_error!("call heatmap query failed: {err:?}");
            Vec::new()
        })
    }

    pub async fn peers(&self) -> Vec<PeerSource> {
        self.db.peer_sources().await.unwrap_or_else(|err| {
            log_error!("listing peers failed: {err:?}");
            Vec::new()
        })
    }

    pub async fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.get_snapshot().await
    }
}
