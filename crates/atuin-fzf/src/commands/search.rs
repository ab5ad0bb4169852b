use std::io::Write;

use atuin_fzf_history::{FilterMode, Settings, StreamBridge};
use eyre::{Result, WrapErr};

use super::{aggregator, current_dir, self_exe};
use crate::fzf::{Fzf, Selection};

/// Interactive search: every entry, newest session commands preferred.
pub async fn run(settings: &Settings, query: &str) -> Result<()> {
    let cwd = current_dir()?;
    let mode = FilterMode::All;

    let entries = aggregator(settings, &cwd)
        .fetch(mode, query)
        .wrap_err("could not start history search")?;

    let fzf = Fzf::new(&settings.fzf_path, self_exe(), &settings.fzf_height);
    let selection = fzf
        .select(StreamBridge::new(cwd), entries, query, &mode.to_string())
        .await?;

    if let Selection::Picked(selected) = selection {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(selected.as_bytes())?;
        stdout.flush()?;
    }

    Ok(())
}
