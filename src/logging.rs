use anyhow::{anyhow, Context, Result};
use std::{fs::OpenOptions, path::Path, sync::Mutex};
use tracing_subscriber::EnvFilter;

pub(crate) const LOG_ENV: &str = "NEOPET_LOG";

/// stdout belongs to the UI, so log lines go to a file.
pub(crate) fn init(path: &Path, default_filter: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .with_context(|| format!("bad log filter {default_filter:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}
