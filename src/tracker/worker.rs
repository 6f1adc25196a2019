use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::Tracker;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Drain the mouse buffer on a fixed cadence until cancelled.
pub async fn flush_loop(tracker: Tracker, period: Duration, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick fires immediately and the buffer is still empty
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let written = tracker.flush_mouse().await;
                if written > 0 {
                    log_debug!("mouse flush wrote {written} metrics");
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("mouse flush loop shutting down");
                break;
            }
        }
    }
}

/// Pick up peer stores that appeared or vanished since the last scan.
pub async fn rescan_loop(tracker: Tracker, period: Duration, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = tracker.refresh_peers().await;
                if !report.skipped.is_empty() {
                    log_debug!("peer rescan skipped {:?}", report.skipped);
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("peer rescan loop shutting down");
                break;
            }
        }
    }
}
