use std::{
    io::Write,
    path::{Path, PathBuf},
};

use atuin_fzf_history::{
    AtuinSource, HistoryEntry, HistoryError, HistorySource, PreviewDeduper, QuerySpec, Settings,
    bridge::{SAME_CWD, exit_label},
    entry::UNKNOWN_DIR,
    parse_record,
};
use colored::Colorize;
use directories::BaseDirs;
use eyre::{Result, WrapErr, bail};
use futures::StreamExt;

const RULE: &str = "────────────────────────";

pub async fn run(settings: &Settings, record: &str) -> Result<()> {
    let entry = parse_record(record).wrap_err("could not read the selected record")?;
    let source = AtuinSource::new(&settings.atuin_path);
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());

    // Rendered in full first; the queries' output is written even if one failed.
    let mut buf = Vec::new();
    let rendered = render(
        &source,
        &entry,
        settings.preview_limit,
        home.as_deref(),
        &mut buf,
    )
    .await;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&buf)?;
    stdout.flush()?;

    rendered
}

/// Writes the three preview sections for `entry`.
///
/// Both similar-command queries always run; a failure in one does not hide
/// the other's results.
pub async fn render<S: HistorySource>(
    source: &S,
    entry: &HistoryEntry,
    limit: usize,
    home: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    write_details(entry, home, out)?;

    writeln!(out, "{}", "Recent Similar Commands".bold())?;
    writeln!(out, "{RULE}")?;

    let mut seen = PreviewDeduper::new();
    let mut errors = Vec::new();

    let scopes = [Vec::new(), vec!["--cwd".to_string(), entry.directory.clone()]];
    for extra_args in scopes {
        let spec = QuerySpec::builder()
            .query(entry.command.clone())
            .limit(limit)
            .extra_args(extra_args)
            .build();

        if let Err(e) = write_similar(source, &spec, entry, home, &mut seen, out).await {
            errors.push(e);
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)).wrap_err("could not load similar commands"),
        _ => {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            bail!("could not load similar commands: {joined}")
        }
    }
}

fn write_details(entry: &HistoryEntry, home: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let directory = if entry.directory == UNKNOWN_DIR {
        entry.directory.dimmed().to_string()
    } else {
        shorten_home(&entry.directory, home)
    };

    let exit = if entry.has_unknown_exit() {
        "unknown".dimmed()
    } else if entry.exit == "0" {
        entry.exit.green()
    } else {
        entry.exit.red()
    };

    writeln!(out, "{}", "Command".bold())?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "{}", entry.command)?;
    writeln!(out)?;
    writeln!(out, "{}", "Execution Details".bold())?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "{:<10} {} {}",
        "When:",
        entry.time,
        format!("{} ago", entry.relative_time).cyan()
    )?;
    writeln!(out, "{:<10} {directory}", "Directory:")?;
    writeln!(out, "{:<10} {exit}", "Exit Code:")?;
    writeln!(out, "{:<10} {}", "Duration:", entry.duration)?;
    writeln!(out)?;

    Ok(())
}

async fn write_similar<S: HistorySource>(
    source: &S,
    spec: &QuerySpec,
    selected: &HistoryEntry,
    home: Option<&Path>,
    seen: &mut PreviewDeduper,
    out: &mut impl Write,
) -> Result<(), HistoryError> {
    let mut results = source.query(spec)?;

    while let Some(similar) = results.next().await {
        let similar = similar?;
        if !seen.admit(&similar) {
            continue;
        }

        let directory = if similar.directory == selected.directory {
            SAME_CWD.to_string()
        } else {
            shorten_home(&similar.directory, home)
        };

        let mut header = similar.relative_time.cyan().to_string();
        for part in [directory.dimmed().to_string(), exit_label(&similar.exit)] {
            if !part.is_empty() {
                header.push(' ');
                header.push_str(&part);
            }
        }

        writeln!(out, "{header}\n{}{}", "$ ".bold(), similar.command)?;
    }

    Ok(())
}

/// Replaces a leading home directory with `~`. The unknown directory
/// renders as nothing.
pub fn shorten_home(directory: &str, home: Option<&Path>) -> String {
    if directory == UNKNOWN_DIR {
        return String::new();
    }

    if let Some(home) = home
        && let Ok(rest) = Path::new(directory).strip_prefix(home)
    {
        if rest.as_os_str().is_empty() {
            return "~".to_string();
        }
        return PathBuf::from("~").join(rest).to_string_lossy().into_owned();
    }

    directory.to_string()
}
