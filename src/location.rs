//! Where this machine's store lives and what it is called.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use sysinfo::System;

use crate::db::federation::{DB_EXTENSION, LEGACY_DB_FILE};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const DATA_DIR_ENV: &str = "BUSYGRAPH_DATA_DIR";
const APP_DIR: &str = "busygraph";
const SIDE_FILE_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// Resolve the shared data directory: explicit override, then
/// `BUSYGRAPH_DATA_DIR`, then `$XDG_DATA_HOME/busygraph`, then
/// `~/.local/share/busygraph`.
pub fn resolve_data_dir(override_dir: Option<PathBuf>) -> Result<PathBuf> {
    choose_data_dir(
        override_dir,
        non_empty_env(DATA_DIR_ENV),
        non_empty_env("XDG_DATA_HOME"),
        dirs::home_dir(),
    )
}

fn non_empty_env(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn choose_data_dir(
    override_dir: Option<PathBuf>,
    env_dir: Option<PathBuf>,
    xdg_data_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(dir) = override_dir.or(env_dir) {
        return Ok(dir);
    }
    if let Some(xdg) = xdg_data_home {
        return Ok(xdg.join(APP_DIR));
    }
    home.map(|home| home.join(".local").join("share").join(APP_DIR))
        .ok_or_else(|| anyhow!("cannot resolve a data directory: no home directory"))
}

/// Hostname used to name this machine's store file.
pub fn hostname() -> Result<String> {
    let name = System::host_name().ok_or_else(|| anyhow!("failed to resolve hostname"))?;
    let name = sanitize_hostname(&name);
    if name.is_empty() {
        return Err(anyhow!("hostname resolved to an empty name"));
    }
    Ok(name)
}

fn sanitize_hostname(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect()
}

pub fn own_db_file_name(hostname: &str) -> String {
    format!("{hostname}.{DB_EXTENSION}")
}

/// Create the data directory, carry a legacy single-machine store over to
/// its per-host name, and return the path of this machine's store.
pub fn prepare_store_path(data_dir: &Path, hostname: &str) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let own = data_dir.join(own_db_file_name(hostname));
    migrate_legacy_store(data_dir, &own)?;
    Ok(own)
}

/// Rename `busygraph.db` to the per-host name when only the legacy file
/// exists. Returns whether a migration happened.
pub fn migrate_legacy_store(data_dir: &Path, own: &Path) -> Result<bool> {
    let legacy = data_dir.join(LEGACY_DB_FILE);
    if !legacy.exists() || own.exists() {
        return Ok(false);
    }

    fs::rename(&legacy, own).with_context(|| {
        format!(
            "failed to migrate legacy store {} to {}",
            legacy.display(),
            own.display()
        )
    })?;
    log_info!("migrated legacy store to {}", own.display());

    for suffix in SIDE_FILE_SUFFIXES {
        let from = with_suffix(&legacy, suffix);
        if !from.exists() {
            continue;
        }
        let to = with_suffix(own, suffix);
        if let Err(err) = fs::rename(&from, &to) {
            log_warn!("failed to migrate {}: {err}", from.display());
        }
    }

    Ok(true)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
