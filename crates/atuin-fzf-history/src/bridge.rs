//! Streaming entries to the selector.
//!
//! Each entry becomes one record: a fixed list of fields joined by
//! [`FIELD_DELIMITER`] and ended by a single NUL. The command is always the
//! last field, so a reader splitting on a fixed number of fields cannot be
//! thrown off by a delimiter inside it.

use std::io;

use colored::Colorize;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{Level, debug, instrument, warn};

use crate::{
    entry::{FIELD_DELIMITER, HistoryEntry, UNKNOWN_EXIT},
    error::HistoryError,
    source::EntryStream,
};

pub const RECORD_TERMINATOR: u8 = b'\0';

/// Shown next to entries recorded in the current directory.
pub const SAME_CWD: &str = "(same cwd)";

/// Number of fields in a selector record.
pub const RECORD_FIELDS: usize = 8;

/// 1-based field numbers, as used in fzf placeholders.
pub mod field {
    pub const EXIT: usize = 1;
    pub const DIRECTORY: usize = 2;
    pub const DURATION: usize = 3;
    pub const TIME: usize = 4;
    pub const RELATIVE_TIME: usize = 5;
    pub const EXIT_LABEL: usize = 6;
    pub const DIR_CONTEXT: usize = 7;
    pub const COMMAND: usize = 8;
}

/// Short label for a failed command; empty for success or an unknown code.
pub fn exit_label(exit: &str) -> String {
    if exit == UNKNOWN_EXIT || exit == "0" {
        return String::new();
    }
    format!("exit {exit}").red().to_string()
}

/// Renders entries as selector records.
#[derive(Debug, Clone)]
pub struct RecordFormatter {
    cwd: String,
}

impl RecordFormatter {
    pub fn new(cwd: impl Into<String>) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn format(&self, entry: &HistoryEntry) -> Vec<u8> {
        let dir_context = if entry.directory == self.cwd {
            SAME_CWD.dimmed().to_string()
        } else {
            String::new()
        };

        let exit_label = exit_label(&entry.exit);
        let fields: [&str; RECORD_FIELDS] = [
            &entry.exit,
            &entry.directory,
            &entry.duration,
            &entry.time,
            &entry.relative_time,
            &exit_label,
            &dir_context,
            &entry.command,
        ];

        let mut record = fields.join(FIELD_DELIMITER).into_bytes();
        record.push(RECORD_TERMINATOR);
        record
    }
}

/// Recover an entry from a record, e.g. the `{}` fzf hands to the preview.
///
/// A trailing terminator is ignored. Everything from the command field on
/// belongs to the command.
pub fn parse_record(record: &str) -> Result<HistoryEntry, HistoryError> {
    let record = record.strip_suffix(char::from(RECORD_TERMINATOR)).unwrap_or(record);
    let parts: Vec<&str> = record.splitn(RECORD_FIELDS, FIELD_DELIMITER).collect();
    let [exit, directory, duration, time, relative_time, _, _, command] = parts[..] else {
        return Err(HistoryError::Format {
            record: record.to_string(),
            found: parts.len(),
            expected: RECORD_FIELDS,
        });
    };

    Ok(HistoryEntry {
        time: time.to_string(),
        relative_time: relative_time.to_string(),
        duration: duration.to_string(),
        exit: exit.to_string(),
        directory: directory.to_string(),
        command: command.to_string(),
    })
}

/// How a pump finished when no upstream error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Every entry was written.
    Exhausted { records: usize },
    /// The reader went away first; production stopped there.
    ReaderClosed { records: usize },
}

impl PumpOutcome {
    pub fn records(&self) -> usize {
        match self {
            Self::Exhausted { records } | Self::ReaderClosed { records } => *records,
        }
    }
}

/// Drives an entry stream into a byte sink, one record per entry.
#[derive(Debug, Clone)]
pub struct StreamBridge {
    formatter: RecordFormatter,
}

impl StreamBridge {
    pub fn new(cwd: impl Into<String>) -> Self {
        Self {
            formatter: RecordFormatter::new(cwd),
        }
    }

    pub fn formatter(&self) -> &RecordFormatter {
        &self.formatter
    }

    /// Write `entries` to `writer` until the stream ends, fails, or the
    /// reader stops accepting data.
    ///
    /// Each record is written and flushed before the next entry is pulled, so
    /// a full pipe holds back the upstream queries. A failed write is how a
    /// departed reader shows up; it ends the pump without an error, and the
    /// upstream stream is dropped on return.
    #[instrument(skip_all, level = Level::DEBUG, name = "stream_bridge")]
    pub async fn pump<W>(&self, entries: EntryStream, writer: W) -> Result<PumpOutcome, HistoryError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut entries = entries;
        let mut writer = writer;
        let mut records = 0;

        while let Some(item) = entries.next().await {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(records, "upstream failed, abandoning output");
                    return Err(e);
                }
            };

            let record = self.formatter.format(&entry);
            if let Err(e) = write_record(&mut writer, &record).await {
                log_write_failure(&e);
                return Ok(PumpOutcome::ReaderClosed { records });
            }
            records += 1;
        }

        if let Err(e) = writer.shutdown().await
            && e.kind() != io::ErrorKind::BrokenPipe
        {
            warn!("failed to close selector input: {e}");
        }

        debug!(records, "history exhausted");
        Ok(PumpOutcome::Exhausted { records })
    }
}

async fn write_record<W: AsyncWrite + Unpin>(writer: &mut W, record: &[u8]) -> io::Result<()> {
    writer.write_all(record).await?;
    writer.flush().await
}

fn log_write_failure(e: &io::Error) {
    match e.kind() {
        io::ErrorKind::BrokenPipe => debug!("selector closed its input"),
        _ => warn!("selector input failed, stopping: {e}"),
    }
}
