use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::worker::{flush_loop, rescan_loop};
use super::Tracker;

/// Owns the periodic flush and rescan tasks of a running tracker.
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    tracker: Option<Tracker>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            cancel_token: None,
            tracker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel_token.is_some()
    }

    pub fn start(&mut self, tracker: Tracker) -> Result<()> {
        if self.is_running() {
            bail!("background tasks already running");
        }

        let settings = tracker.settings().clone();
        let cancel_token = CancellationToken::new();

        info!(
            "starting background tasks (flush every {:?}, rescan every {:?})",
            settings.flush_interval(),
            settings.rescan_interval()
        );

        self.handles.push(tokio::spawn(flush_loop(
            tracker.clone(),
            settings.flush_interval(),
            cancel_token.clone(),
        )));
        self.handles.push(tokio::spawn(rescan_loop(
            tracker.clone(),
            settings.rescan_interval(),
            cancel_token.clone(),
        )));

        self.cancel_token = Some(cancel_token);
        self.tracker = Some(tracker);
        Ok(())
    }

    /// Cancel both loops, wait for any in-flight tick to finish, then flush
    /// whatever mouse activity arrived since the last tick.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        for handle in self.handles.drain(..) {
            handle
                .await
                .context("background task failed to join")?;
        }

        if let Some(tracker) = self.tracker.take() {
            tracker.flush_mouse().await;
        }
        Ok(())
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}
