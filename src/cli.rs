use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Per-minute keyboard, mouse and call activity tracker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Shared data directory holding every machine's store.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track activity from newline-delimited JSON events on stdin.
    Run,
    /// Keystroke, mouse and call statistics for a range.
    Stats {
        /// One of 1h, 24h, 7d, 30d, 1y; anything else means 1h.
        #[arg(long, short, default_value = "1h")]
        range: String,
    },
    /// Full-history activity density per minute.
    Heatmap,
    /// Video call statistics for a range.
    Calls {
        #[arg(long, short, default_value = "24h")]
        range: String,
    },
    /// Full-history in-call minutes.
    CallHeatmap,
    /// Peer stores currently merged into reads.
    Peers,
}
