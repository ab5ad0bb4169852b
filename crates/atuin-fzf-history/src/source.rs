//! History sources.
//!
//! A source turns a [`QuerySpec`] into a lazy stream of entries. The
//! production source runs `atuin search` and parses its NUL-separated output
//! as it arrives.

use std::{path::PathBuf, pin::Pin, process::Stdio};

use futures::Stream;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use tracing::{Level, debug, instrument, warn};
use typed_builder::TypedBuilder;

use crate::{entry::HistoryEntry, error::HistoryError};

/// Lazily produced history entries.
///
/// An `Err` item is terminal: the stream yields nothing after it.
pub type EntryStream = Pin<Box<dyn Stream<Item = Result<HistoryEntry, HistoryError>> + Send>>;

/// Parameters for a single history query.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct QuerySpec {
    #[builder(setter(into))]
    pub query: String,

    pub limit: usize,

    /// Name of the source-side filter mode, e.g. `session` or `directory`.
    #[builder(default, setter(strip_option, into))]
    pub filter_mode: Option<String>,

    /// Passed through to the source verbatim, before the query text.
    #[builder(default)]
    pub extra_args: Vec<String>,
}

impl QuerySpec {
    /// Arguments for `atuin search`.
    pub fn to_atuin_args(&self) -> Vec<String> {
        let mut args = vec![
            "search".to_string(),
            "--limit".to_string(),
            self.limit.to_string(),
            "--format".to_string(),
            HistoryEntry::atuin_format(),
            "--print0".to_string(),
        ];

        if let Some(mode) = &self.filter_mode {
            args.push("--filter-mode".to_string());
            args.push(mode.clone());
        }

        args.extend(self.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(self.query.clone());
        args
    }
}

pub trait HistorySource: Send + Sync {
    /// Start a query.
    ///
    /// Failing to start is reported here, before any entry exists. Dropping
    /// the returned stream releases whatever backs it.
    fn query(&self, spec: &QuerySpec) -> Result<EntryStream, HistoryError>;
}

/// Runs the `atuin` binary, one child process per query.
#[derive(Debug, Clone)]
pub struct AtuinSource {
    program: PathBuf,
}

impl AtuinSource {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for AtuinSource {
    fn default() -> Self {
        Self::new("atuin")
    }
}

impl HistorySource for AtuinSource {
    #[instrument(skip_all, level = Level::DEBUG, name = "atuin_query", fields(query = %spec.query, filter_mode = ?spec.filter_mode))]
    fn query(&self, spec: &QuerySpec) -> Result<EntryStream, HistoryError> {
        let program = self.program.display().to_string();
        let startup = |source| HistoryError::Startup {
            program: program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(spec.to_atuin_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(startup)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| startup(std::io::Error::other("stdout was not captured")))?;

        debug!(pid = ?child.id(), "started atuin search");

        Ok(Box::pin(async_stream::stream! {
            // Held for the lifetime of the stream; dropping it kills the process.
            let mut child = child;
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();

            loop {
                buf.clear();
                match reader.read_until(b'\0', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        if buf.last() == Some(&b'\0') {
                            buf.pop();
                        }
                        match HistoryEntry::parse_atuin(&String::from_utf8_lossy(&buf)) {
                            Ok(entry) => yield Ok(entry),
                            Err(e) => {
                                yield Err(e);
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(HistoryError::Stream(e));
                        return;
                    }
                }
            }

            // atuin exits non-zero when nothing matched, so the status is informational.
            match child.wait().await {
                Ok(status) if !status.success() => debug!(%status, "atuin search exited"),
                Ok(_) => {}
                Err(e) => warn!("failed to wait for atuin search: {e}"),
            }
        }))
    }
}
