mod types;

pub use types::{FlushRecord, MetricsSnapshot, SystemMetrics};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::Mutex;

/// In-process counters exported alongside the store. Nothing here is
/// persisted; a restart starts every counter from zero.
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    keystrokes_total: BTreeMap<String, u64>,
    flush_count: u64,
    last_flush: Option<FlushRecord>,
    attached_peers: usize,
    system: System,
    pid: Pid,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // CPU usage is a delta between refreshes, so take the baseline now
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                keystrokes_total: BTreeMap::new(),
                flush_count: 0,
                last_flush: None,
                attached_peers: 0,
                system,
                pid,
            })),
        }
    }

    pub async fn record_keystroke(&self, key: &str) {
        let mut state = self.inner.lock().await;
        *state.keystrokes_total.entry(key.to_string()).or_default() += 1;
    }

    pub async fn record_flush(&self, bucket: i64, metrics_written: usize) {
        let mut state = self.inner.lock().await;
        state.flush_count += 1;
        state.last_flush = Some(FlushRecord {
            timestamp: Utc::now(),
            bucket,
            metrics_written,
        });
    }

    pub async fn set_attached_peers(&self, count: usize) {
        self.inner.lock().await.attached_peers = count;
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        let system = match state.system.process(pid) {
            Some(process) => SystemMetrics {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            },
            None => SystemMetrics::default(),
        };

        MetricsSnapshot {
            system,
            keystrokes_total: state.keystrokes_total.clone(),
            flush_count: state.flush_count,
            last_flush: state.last_flush.clone(),
            attached_peers: state.attached_peers,
        }
    }

    #[cfg(test)]
    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.keystrokes_total.clear();
        state.flush_count = 0;
        state.last_flush = None;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_keys_per_label() {
        let metrics = MetricsCollector::new();
        metrics.record_keystroke("a").await;
        metrics.record_keystroke("a").await;
        metrics.record_keystroke("[SPACE]").await;

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.keystrokes_total.get("a"), Some(&2));
        assert_eq!(snapshot.keystrokes_total.get("[SPACE]"), Some(&1));
        assert_eq!(snapshot.total_keystrokes(), 3);
    }

    #[tokio::test]
    async fn clones_share_counters_and_reset_clears() {
        let metrics = MetricsCollector::new();
        let clone = metrics.clone();
        clone.record_flush(120, 3).await;
        clone.set_attached_peers(2).await;

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.flush_count, 1);
        assert_eq!(snapshot.attached_peers, 2);
        assert_eq!(snapshot.last_flush.map(|f| f.bucket), Some(120));

        metrics.reset().await;
        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.flush_count, 0);
        assert!(snapshot.last_flush.is_none());
        assert_eq!(snapshot.attached_peers, 2);
    }
}
