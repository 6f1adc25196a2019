use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime;

fn main() -> Result<()> {
    let runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let result = runtime.block_on(busygraph_lib::run());

    // a blocked stdin read must not keep the process alive after Ctrl-C
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}
