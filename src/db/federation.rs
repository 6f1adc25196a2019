//! Read-side federation of peer stores.
//!
//! Every machine writes only its own `<hostname>.db`. Sibling files that
//! show up in the shared data directory are attached read-only to the one
//! connection, and the temporary `all_*` views are rebuilt as a UNION ALL of
//! the local table and every attached peer whenever that set changes. Which
//! peers are attached is read back from `PRAGMA database_list`, so the
//! connection itself is the only record of federation state.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use super::{helpers::file_uri, Database};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const PEER_ALIAS_PREFIX: &str = "peer_";
pub const LEGACY_DB_FILE: &str = "busygraph.db";
pub const DB_EXTENSION: &str = "db";

struct FederatedTable {
    name: &'static str,
    columns: &'static str,
}

const FEDERATED_TABLES: [FederatedTable; 3] = [
    FederatedTable {
        name: "keystrokes",
        columns: "minute, key_char, count",
    },
    FederatedTable {
        name: "mouse_metrics",
        columns: "minute, metric_name, value",
    },
    FederatedTable {
        name: "video_calls",
        columns: "minute, in_call, camera_active, microphone_active, app",
    },
];

/// A sibling store discovered in the data directory.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PeerSource {
    pub filename: String,
    pub alias: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// What a single rescan changed.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ScanReport {
    /// Aliases attached by this scan.
    pub attached: Vec<String>,
    /// Aliases detached because their file vanished.
    pub detached: Vec<String>,
    /// Filenames that failed to attach, failed schema validation, or lost
    /// an alias conflict.
    pub skipped: Vec<String>,
    pub views_rebuilt: bool,
    pub active_peers: usize,
}

/// Schema alias for a peer file: extension stripped, everything outside
/// `[A-Za-z0-9]` replaced by `_`, prefixed so it can never shadow `main`
/// or `temp`.
pub fn sanitize_alias(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    let mut alias = String::with_capacity(PEER_ALIAS_PREFIX.len() + stem.len());
    alias.push_str(PEER_ALIAS_PREFIX);
    for ch in stem.chars() {
        if ch.is_ascii_alphanumeric() {
            alias.push(ch);
        } else {
            alias.push('_');
        }
    }
    alias
}

/// Peer stores currently present in `data_dir`, keyed by alias.
///
/// Files are visited in name order; when two names sanitize to the same
/// alias the first one keeps it and the rest come back in the second
/// element so the caller can report them.
pub fn discover_peers(
    data_dir: &Path,
    own_file: &str,
) -> Result<(BTreeMap<String, PeerSource>, Vec<String>)> {
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("failed to list data directory {}", data_dir.display()))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log_warn!("Skipping unreadable directory entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        let is_db = path
            .extension()
            .map(|ext| ext == DB_EXTENSION)
            .unwrap_or(false);
        if !is_db || !path.is_file() {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if filename == own_file || filename == LEGACY_DB_FILE {
            continue;
        }
        candidates.push((filename.to_string(), path.clone()));
    }
    candidates.sort();

    let mut peers: BTreeMap<String, PeerSource> = BTreeMap::new();
    let mut conflicts = Vec::new();
    for (filename, path) in candidates {
        let alias = sanitize_alias(&filename);
        if let Some(existing) = peers.get(&alias) {
            log_warn!(
                "Peer {} maps to alias {} already claimed by {}; skipping",
                filename,
                alias,
                existing.filename
            );
            conflicts.push(filename);
            continue;
        }
        peers.insert(
            alias.clone(),
            PeerSource {
                filename,
                alias,
                path,
            },
        );
    }

    Ok((peers, conflicts))
}

/// Peers attached to this connection, keyed by alias, with their file path.
pub fn attached_peers(conn: &Connection) -> Result<BTreeMap<String, PathBuf>> {
    let mut stmt = conn
        .prepare("PRAGMA database_list")
        .context("failed to read database list")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(1)?, row.get::<_, Option<String>>(2)?))
    })?;

    let mut attached = BTreeMap::new();
    for row in rows {
        let (name, file) = row?;
        if name.starts_with(PEER_ALIAS_PREFIX) {
            attached.insert(name, PathBuf::from(file.unwrap_or_default()));
        }
    }
    Ok(attached)
}

fn attach(conn: &Connection, peer: &PeerSource) -> Result<()> {
    let uri = file_uri(&peer.path.to_string_lossy(), "mode=ro");
    conn.execute(
        &format!("ATTACH DATABASE ?1 AS {}", peer.alias),
        [uri.as_str()],
    )
    .with_context(|| format!("failed to attach {}", peer.filename))?;
    Ok(())
}

fn detach(conn: &Connection, alias: &str) -> Result<()> {
    conn.execute_batch(&format!("DETACH DATABASE {alias}"))
        .with_context(|| format!("failed to detach {alias}"))
}

/// Check that every federated table exists under `alias` with the columns
/// the views select. Any error (missing table, renamed column, garbage
/// file, half-written header) is reported as the mismatch reason.
fn validate_schema(conn: &Connection, alias: &str) -> Result<()> {
    for table in &FEDERATED_TABLES {
        conn.prepare(&format!(
            "SELECT {} FROM {}.{} LIMIT 0",
            table.columns, alias, table.name
        ))
        .with_context(|| format!("{alias}.{} does not match the expected schema", table.name))?;
    }
    Ok(())
}

/// Rebuild every `all_*` view over `main` plus the given peer aliases.
pub fn recreate_views(conn: &Connection, aliases: &[String]) -> Result<()> {
    for table in &FEDERATED_TABLES {
        let mut parts = Vec::with_capacity(aliases.len() + 1);
        parts.push(format!("SELECT {} FROM main.{}", table.columns, table.name));
        for alias in aliases {
            parts.push(format!("SELECT {} FROM {}.{}", table.columns, alias, table.name));
        }

        let sql = format!(
            "DROP VIEW IF EXISTS temp.all_{name};
             CREATE TEMP VIEW all_{name} AS {union};",
            name = table.name,
            union = parts.join(" UNION ALL "),
        );
        conn.execute_batch(&sql)
            .with_context(|| format!("failed to create view all_{}", table.name))?;
    }
    Ok(())
}

/// One discovery pass: detach vanished peers, attach new ones, and rebuild
/// the views if anything changed or nothing is attached.
pub fn refresh(conn: &Connection, data_dir: &Path, own_file: &str) -> Result<ScanReport> {
    let (discovered, conflicts) = discover_peers(data_dir, own_file)?;
    let mut report = ScanReport {
        skipped: conflicts,
        ..ScanReport::default()
    };
    let mut changed = false;

    for (alias, file) in attached_peers(conn)? {
        let still_present = discovered
            .get(&alias)
            .map(|peer| file.file_name().map(|name| name == peer.filename.as_str()) == Some(true))
            .unwrap_or(false);
        if still_present {
            continue;
        }
        match detach(conn, &alias) {
            Ok(()) => log_info!("Detached {} ({})", alias, file.display()),
            Err(err) => log_warn!("{err:?}"),
        }
        report.detached.push(alias);
        changed = true;
    }

    let attached = attached_peers(conn)?;
    for (alias, peer) in &discovered {
        if attached.contains_key(alias) {
            continue;
        }
        if let Err(err) = attach(conn, peer) {
            log_warn!("{err:?}");
            report.skipped.push(peer.filename.clone());
            continue;
        }
        if let Err(err) = validate_schema(conn, alias) {
            log_warn!("Detaching {}: {err:#}", peer.filename);
            if let Err(err) = detach(conn, alias) {
                log_warn!("{err:?}");
            }
            report.skipped.push(peer.filename.clone());
            continue;
        }
        log_info!("Attached {} as {}", peer.filename, alias);
        report.attached.push(alias.clone());
        changed = true;
    }

    let aliases: Vec<String> = attached_peers(conn)?.into_keys().collect();
    report.active_peers = aliases.len();
    if changed || aliases.is_empty() {
        recreate_views(conn, &aliases)?;
        report.views_rebuilt = true;
        log_debug!("Rebuilt federation views over {} peer(s)", aliases.len());
    }

    Ok(report)
}

impl Database {
    /// Rescan the data directory and bring attachments and views in line.
    pub async fn refresh_peers(&self) -> Result<ScanReport> {
        let data_dir = self.data_dir().to_path_buf();
        let own_file = self.own_file_name();
        self.execute(move |conn| refresh(conn, &data_dir, &own_file))
            .await
    }

    /// Peers currently visible through the `all_*` views.
    pub async fn peer_sources(&self) -> Result<Vec<PeerSource>> {
        self.execute(|conn| {
            let peers = attached_peers(conn)?
                .into_iter()
                .map(|(alias, path)| PeerSource {
                    filename: path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    alias,
                    path,
                })
                .collect();
            Ok(peers)
        })
        .await
    }
}
