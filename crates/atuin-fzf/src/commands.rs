use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use atuin_fzf_history::{AtuinSource, Settings, aggregator::Aggregator};
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub mod actions;
pub mod clip;
pub mod init;
pub mod list;
pub mod preview;
pub mod search;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search history interactively with fzf (the default)
    Search {
        /// Initial query
        #[arg(value_name = "QUERY", trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },

    /// Print history records without fzf (used by fzf's reload binding)
    List {
        /// Directory filter: all, directory, subtree or workspace
        #[arg(long, value_name = "MODE", default_value = "all")]
        dir_filter: String,

        /// Query text
        #[arg(value_name = "QUERY", trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },

    /// Render the fzf preview for a record (used internally)
    Preview {
        /// Record as fzf passes it; it may start with `-` (exit code -1)
        #[arg(value_name = "RECORD", allow_hyphen_values = true)]
        record: String,
    },

    /// Copy stdin to the clipboard (used internally)
    Clip,

    /// Print the fzf action for the next directory filter (used internally)
    FzfActions {
        /// Current fzf prompt, e.g. "all> "
        #[arg(value_name = "PROMPT", allow_hyphen_values = true)]
        prompt: String,
    },

    /// Print shell integration
    Init {
        /// Shell to generate integration for
        #[arg(value_name = "SHELL", default_value = "zsh")]
        shell: String,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let settings = Settings::new().wrap_err("could not load atuin-fzf settings")?;

    let command = cli.command.unwrap_or(Commands::Search { query: Vec::new() });

    if matches!(
        command,
        Commands::Search { .. } | Commands::List { .. } | Commands::Preview { .. }
    ) {
        force_colour(std::env::var_os("NO_COLOR"));
    }

    match command {
        Commands::Search { query } => search::run(&settings, &query.join(" ")).await,
        Commands::List { dir_filter, query } => {
            list::run(&settings, &dir_filter, &query.join(" ")).await
        }
        Commands::Preview { record } => preview::run(&settings, &record).await,
        Commands::Clip => clip::run(&settings).await,
        Commands::FzfActions { prompt } => {
            println!("{}", actions::next_filter_action(&self_exe(), &prompt));
            Ok(())
        }
        Commands::Init { shell } => init::run(&shell),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    // stdout carries records and selections, so logs only ever go to stderr
    let env_filter =
        EnvFilter::from_default_env().add_directive(LevelFilter::from_level(level).into());

    let console_layer = if verbose {
        Some(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(false)
                .with_filter(env_filter),
        )
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry();

    if let Some(console) = console_layer {
        subscriber.with(console).init();
    } else {
        subscriber.init();
    }
}

/// Records and previews always end up behind a pipe and are shown by fzf
/// with `--ansi`, so colour cannot follow whether stdout is a terminal. It is
/// on unless `NO_COLOR` is set to a non-empty value.
pub fn force_colour(no_color: Option<OsString>) {
    let enabled = no_color.is_none_or(|v| v.is_empty());
    colored::control::set_override(enabled);
}

/// Path fzf bindings use to call back into this binary.
pub fn self_exe() -> PathBuf {
    std::env::current_exe()
        .ok()
        .or_else(|| std::env::args_os().next().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("atuin-fzf"))
}

/// `path` quoted for embedding in fzf actions and shell snippets.
pub fn shell_quote(path: &Path) -> String {
    let path = path.to_string_lossy();
    shlex::try_quote(&path)
        .map(|q| q.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Working directory as recorded in history entries.
pub fn current_dir() -> Result<String> {
    let cwd = std::env::current_dir().wrap_err("could not determine the working directory")?;
    Ok(cwd.to_string_lossy().into_owned())
}

pub fn aggregator(settings: &Settings, cwd: &str) -> Aggregator<AtuinSource> {
    Aggregator::new(
        AtuinSource::new(&settings.atuin_path),
        cwd,
        settings.search_limit,
    )
}

/// Serializes tests that depend on the process-wide colour override.
#[cfg(test)]
pub(crate) fn colour_override(enabled: bool) -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, PoisonError};

    static COLOUR: Mutex<()> = Mutex::new(());

    let guard = COLOUR.lock().unwrap_or_else(PoisonError::into_inner);
    colored::control::set_override(enabled);
    guard
}
