use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use super::{dispatch, InputEvent, VirtualCursor};
use crate::tracker::Tracker;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub events: u64,
    pub malformed: u64,
}

/// Feed newline-delimited JSON events into the tracker until the source
/// reaches end-of-input or `cancel_token` fires. Blank lines are ignored;
/// lines that are not a valid event (bad JSON, invalid UTF-8) are logged
/// and skipped.
pub async fn ingest<R>(
    mut reader: R,
    tracker: &Tracker,
    cancel_token: &CancellationToken,
) -> Result<IngestSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut cursor = VirtualCursor::new();
    let mut summary = IngestSummary::default();

    loop {
        line.clear();
        let read = tokio::select! {
            read = reader.read_until(b'\n', &mut line) => read.context("failed to read input events")?,
            _ = cancel_token.cancelled() => break,
        };
        if read == 0 {
            log_info!("input source closed");
            break;
        }

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<InputEvent>(&line) {
            Ok(event) => {
                dispatch(tracker, &mut cursor, event).await;
                summary.events += 1;
            }
            Err(err) => {
                summary.malformed += 1;
                log_warn!("skipping malformed input event: {err}");
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::open_temp;
    use crate::settings::TrackerSettings;
    use crate::stats::TimeRange;

    #[tokio::test]
    async fn feeds_events_until_eof() {
        let (_dir, db) = open_temp("host-a.db");
        let tracker = Tracker::new(db, TrackerSettings::default());
        let input = concat!(
            "{\"kind\":\"key\",\"label\":\"a\"}\n",
            "\n",
            "{\"kind\":\"key\",\"label\":\"\\b\"}\n",
            "not json\n",
            "{\"kind\":\"key\",\"label\":\"\\u0001\"}\n",
            "{\"kind\":\"relative_move\",\"dx\":3,\"dy\":4}\n",
            "{\"kind\":\"relative_move\",\"dx\":3,\"dy\":4}\n",
            "{\"kind\":\"click\",\"button\":\"left\"}\n",
            "{\"kind\":\"call\",\"in_call\":true,\"app\":\"Zoom\"}\n",
        );

        let summary = ingest(input.as_bytes(), &tracker, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary, IngestSummary { events: 7, malformed: 1 });

        tracker.flush_mouse().await;
        let stats = tracker.get_stats(TimeRange::Hour).await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.typing.backspaces, 1);
        // the first relative move seeds the cursor, the second travels 5px
        assert_eq!(stats.mouse.distance, 5.0);
        assert_eq!(stats.mouse.clicks_left, 1);
        assert_eq!(tracker.get_call_stats(TimeRange::Hour).await.total_minutes, 1);
    }

    #[tokio::test]
    async fn invalid_utf8_lines_are_skipped() {
        let (_dir, db) = open_temp("host-a.db");
        let tracker = Tracker::new(db, TrackerSettings::default());
        let input: &[u8] = b"{\"kind\":\"key\",\"label\":\"a\"}\n\
            \xff\xfe\n\
            {\"kind\":\"key\",\"label\":\"\xff\"}\n\
            {\"kind\":\"key\",\"label\":\"b\"}";

        let summary = ingest(input, &tracker, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary, IngestSummary { events: 2, malformed: 2 });

        let stats = tracker.get_stats(TimeRange::Hour).await;
        assert_eq!(stats.total, 2);
        let keys: Vec<&str> = stats.top_keys.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn stops_when_cancelled() {
        let (_dir, db) = open_temp("host-a.db");
        let tracker = Tracker::new(db, TrackerSettings::default());
        let (_writer, reader) = tokio::io::duplex(64);
        let token = CancellationToken::new();
        token.cancel();

        let summary = ingest(tokio::io::BufReader::new(reader), &tracker, &token)
            .await
            .unwrap();
        assert_eq!(summary.events, 0);
    }
}
