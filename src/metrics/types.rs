use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

/// Outcome of one mouse flush, kept for the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushRecord {
    pub timestamp: DateTime<Utc>,
    pub bucket: i64,
    pub metrics_written: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub system: SystemMetrics,
    /// Process-lifetime `keystrokes_total{key}` counter.
    pub keystrokes_total: BTreeMap<String, u64>,
    pub flush_count: u64,
    pub last_flush: Option<FlushRecord>,
    pub attached_peers: usize,
}

impl MetricsSnapshot {
    pub fn total_keystrokes(&self) -> u64 {
        self.keystrokes_total.values().sum()
    }
}
