use atuin_fzf_history::{FilterMode, PumpOutcome, Settings, StreamBridge};
use eyre::{Result, WrapErr};
use tracing::debug;

use super::{aggregator, current_dir};

/// Stream records for `dir_filter` to stdout, as fzf's `reload` expects.
pub async fn run(settings: &Settings, dir_filter: &str, query: &str) -> Result<()> {
    let cwd = current_dir()?;
    let mode = FilterMode::from_name_lossy(dir_filter);

    let entries = aggregator(settings, &cwd)
        .fetch(mode, query)
        .wrap_err("could not start history search")?;

    let outcome = StreamBridge::new(cwd)
        .pump(entries, tokio::io::stdout())
        .await
        .wrap_err("history search failed")?;

    if let PumpOutcome::ReaderClosed { records } = outcome {
        debug!(records, %mode, "reader went away");
    }

    Ok(())
}
