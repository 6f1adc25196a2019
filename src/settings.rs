use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

pub const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 5;
const DEFAULT_RESCAN_INTERVAL_SECS: u64 = 30;
const DEFAULT_CALL_GAP_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Seconds between mouse buffer flushes.
    pub flush_interval_secs: u64,
    /// Seconds between peer directory scans.
    pub rescan_interval_secs: u64,
    /// Silence longer than this many seconds between in-call minutes starts
    /// a new call.
    pub call_gap_secs: i64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            rescan_interval_secs: DEFAULT_RESCAN_INTERVAL_SECS,
            call_gap_secs: DEFAULT_CALL_GAP_SECS,
        }
    }
}

impl TrackerSettings {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_secs(self.rescan_interval_secs.max(1))
    }

    fn clamped(mut self) -> Self {
        self.flush_interval_secs = self.flush_interval_secs.max(1);
        self.rescan_interval_secs = self.rescan_interval_secs.max(1);
        self.call_gap_secs = self.call_gap_secs.max(1);
        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<TrackerSettings>,
}

impl SettingsStore {
    /// Load `settings.json` from the data directory. A missing or unreadable
    /// file yields defaults.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(SETTINGS_FILE);
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str::<TrackerSettings>(&contents).unwrap_or_else(|err| {
                warn!("ignoring malformed {}: {err}", path.display());
                TrackerSettings::default()
            })
        } else {
            TrackerSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data.clamped()),
        })
    }

    pub fn settings(&self) -> TrackerSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Write the current values out so the file is discoverable and
    /// editable. An existing file is left alone.
    pub fn persist_if_missing(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.persist(&self.settings())
    }

    fn persist(&self, data: &TrackerSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path()).unwrap();
        assert_eq!(store.settings(), TrackerSettings::default());

        store.persist_if_missing().unwrap();
        let written = fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        let parsed: TrackerSettings = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, TrackerSettings::default());
    }

    #[test]
    fn partial_file_fills_defaults_and_clamps_zero() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"flush_interval_secs": 0, "call_gap_secs": 120}"#,
        )
        .unwrap();

        let settings = SettingsStore::new(dir.path()).unwrap().settings();
        assert_eq!(settings.flush_interval_secs, 1);
        assert_eq!(settings.rescan_interval_secs, DEFAULT_RESCAN_INTERVAL_SECS);
        assert_eq!(settings.call_gap_secs, 120);
        assert_eq!(settings.flush_interval(), Duration::from_secs(1));
    }

    #[test]
    fn malformed_file_falls_back_and_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(dir.path()).unwrap();
        assert_eq!(store.settings(), TrackerSettings::default());
        store.persist_if_missing().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }
}
