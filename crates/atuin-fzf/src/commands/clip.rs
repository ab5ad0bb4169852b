use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use atuin_fzf_history::Settings;
use eyre::{Result, WrapErr, bail, eyre};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    process::Command,
};
use tracing::debug;

const CANDIDATES: [&str; 2] = ["pbcopy", "clip.exe"];

pub async fn run(settings: &Settings) -> Result<()> {
    let program = clip_command(settings.clip_command.as_deref())?;

    let mut input = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut input)
        .await
        .wrap_err("could not read stdin")?;

    copy(&program, &input).await
}

/// The configured clipboard command, or the first known one on `PATH`.
pub fn clip_command(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(configured) = configured.filter(|c| !c.is_empty()) {
        return Ok(PathBuf::from(configured));
    }

    CANDIDATES
        .iter()
        .find_map(|candidate| which::which(candidate).ok())
        .ok_or_else(|| {
            eyre!("no clipboard command found: set ATUIN_CLIP or install pbcopy/clip.exe")
        })
}

async fn copy(program: &Path, input: &[u8]) -> Result<()> {
    // clip.exe reads piped input as UTF-16LE
    let payload = if is_windows_clip(program) {
        utf8_to_utf16le(input)
    } else {
        input.to_vec()
    };

    debug!(program = %program.display(), bytes = payload.len(), "copying to clipboard");

    let mut child = Command::new(program)
        .stdin(Stdio::piped())
        .spawn()
        .wrap_err_with(|| format!("could not run {}", program.display()))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| eyre!("clipboard stdin was not captured"))?;
    stdin.write_all(&payload).await?;
    drop(stdin);

    let status = child.wait().await?;
    if !status.success() {
        bail!("{} exited with {status}", program.display());
    }

    Ok(())
}

fn is_windows_clip(program: &Path) -> bool {
    program
        .file_name()
        .is_some_and(|name| name.eq_ignore_ascii_case("clip.exe"))
}

/// UTF-16LE with a leading byte order mark. Invalid UTF-8 is replaced.
pub fn utf8_to_utf16le(input: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(input);

    let mut out = Vec::with_capacity(2 + input.len() * 2);
    out.extend_from_slice(&[0xFF, 0xFE]);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}
