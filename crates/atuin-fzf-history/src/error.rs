use std::io;

use thiserror::Error;

/// Failures that can end a history query.
///
/// `Startup` is returned before any entry is produced. The other variants
/// appear as the terminal item of an [`EntryStream`](crate::EntryStream);
/// nothing after them is valid.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to start `{program}`")]
    Startup {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed reading history output")]
    Stream(#[from] io::Error),

    #[error("record {record:?} has {found} fields, expected at least {expected}")]
    Format {
        record: String,
        found: usize,
        expected: usize,
    },
}
