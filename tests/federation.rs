use std::fs;
use std::path::Path;

use busygraph_lib::db::Database;
use busygraph_lib::settings::TrackerSettings;
use busygraph_lib::stats::TimeRange;
use busygraph_lib::tracker::Tracker;

const T: i64 = 1_718_000_040;

async fn write_peer(dir: &Path, file: &str, key: &str, count: usize) {
    let peer = Database::new(dir.join(file)).expect("open peer store");
    for _ in 0..count {
        peer.increment_key(key, T).await.expect("peer write");
    }
}

fn remove_store(dir: &Path, file: &str) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = fs::remove_file(dir.join(format!("{file}{suffix}")));
    }
}

#[tokio::test]
async fn peer_rows_appear_and_disappear_with_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let own = Database::new(dir.path().join("desk.db")).unwrap();
    let tracker = Tracker::new(own, TrackerSettings::default());

    write_peer(dir.path(), "my-laptop.db", "a", 5).await;

    let report = tracker.refresh_peers().await;
    assert_eq!(report.attached, vec!["peer_my_laptop".to_string()]);
    let heatmap = tracker.get_heatmap().await;
    assert_eq!(heatmap.len(), 1);
    assert_eq!(heatmap[0].timestamp, T);
    assert_eq!(heatmap[0].value, 5.0);

    // an unchanged directory leaves views alone
    let report = tracker.refresh_peers().await;
    assert!(report.attached.is_empty());
    assert!(!report.views_rebuilt);

    remove_store(dir.path(), "my-laptop.db");
    let report = tracker.refresh_peers().await;
    assert_eq!(report.detached, vec!["peer_my_laptop".to_string()]);
    assert!(tracker.get_heatmap().await.is_empty());
    assert!(tracker.peers().await.is_empty());
}

#[tokio::test]
async fn conflicting_aliases_attach_only_the_first_file() {
    let dir = tempfile::tempdir().unwrap();
    let own = Database::new(dir.path().join("desk.db")).unwrap();
    let tracker = Tracker::new(own, TrackerSettings::default());

    write_peer(dir.path(), "my-laptop.db", "a", 2).await;
    write_peer(dir.path(), "my_laptop.db", "b", 3).await;

    let report = tracker.refresh_peers().await;
    assert_eq!(report.active_peers, 1);
    assert!(report.skipped.iter().any(|f| f == "my_laptop.db"));

    let peers = tracker.peers().await;
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].filename, "my-laptop.db");
    assert_eq!(tracker.get_heatmap().await[0].value, 2.0);
}

#[tokio::test]
async fn own_and_peer_history_are_summed() {
    let dir = tempfile::tempdir().unwrap();
    let own = Database::new(dir.path().join("desk.db")).unwrap();
    let tracker = Tracker::new(own, TrackerSettings::default());

    tracker.increment_key("x").await;
    tracker.increment_key("x").await;
    {
        let peer = Database::new(dir.path().join("laptop.db")).unwrap();
        let now = busygraph_lib::clock::current_bucket();
        peer.increment_key("x", now).await.unwrap();
    }

    tracker.refresh_peers().await;
    let stats = tracker.get_stats(TimeRange::Hour).await;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.top_keys[0].key, "x");
    assert_eq!(stats.top_keys[0].count, 3);
    assert_eq!(stats.history.iter().map(|p| p.count).sum::<i64>(), 3);
}
