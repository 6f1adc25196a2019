//! Conditional logging macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! High-frequency paths (keystroke upserts, mouse flushes) can be silenced
//! per module without touching the global `RUST_LOG` filter:
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_error, log_info, log_warn};
//!
//! log_info!("attached {} peer stores", count);
//! ```

/// Info logging, only when the calling module sets `ENABLE_LOGS = true`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Warn logging, only when the calling module sets `ENABLE_LOGS = true`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Error logging, only when the calling module sets `ENABLE_LOGS = true`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

/// Debug logging, only when the calling module sets `ENABLE_LOGS = true`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Initialise `env_logger` once for the process.
///
/// `RUST_LOG` wins when set; otherwise the default level is `info`, or
/// `debug` when `BUSYGRAPH_DEBUG` is `1`/`true`.
pub fn init() {
    let debug_mode = std::env::var("BUSYGRAPH_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let default_level = if debug_mode {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    if builder.try_init().is_err() {
        log::debug!("logger already initialised");
    }
}
