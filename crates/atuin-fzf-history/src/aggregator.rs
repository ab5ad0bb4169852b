use tracing::{Level, debug, instrument};

use crate::{
    dir_filter::filter_by_dir_prefix,
    error::HistoryError,
    filter_mode::FilterMode,
    merge::merge_right,
    source::{EntryStream, HistorySource, QuerySpec},
};

/// Source-side filter mode naming the current shell session.
const SESSION_FILTER: &str = "session";

/// Builds the entry stream for a [`FilterMode`] out of one or more source
/// queries.
pub struct Aggregator<S> {
    source: S,
    cwd: String,
    limit: usize,
}

impl<S: HistorySource> Aggregator<S> {
    /// `cwd` is the directory subtree searches are rooted at. `limit` caps
    /// every individual query.
    pub fn new(source: S, cwd: impl Into<String>, limit: usize) -> Self {
        Self {
            source,
            cwd: cwd.into(),
            limit,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// Start the queries for `mode`.
    ///
    /// Every query is started before this returns, so a failure to launch
    /// any of them is reported here rather than part-way through the stream.
    #[instrument(skip(self), level = Level::DEBUG, fields(cwd = %self.cwd))]
    pub fn fetch(&self, mode: FilterMode, query: &str) -> Result<EntryStream, HistoryError> {
        match mode {
            FilterMode::Directory | FilterMode::Workspace => {
                let spec = QuerySpec::builder()
                    .query(query)
                    .limit(self.limit)
                    .filter_mode(mode.to_string())
                    .build();
                self.source.query(&spec)
            }

            FilterMode::Subtree => {
                let all = self.fetch(FilterMode::All, query)?;
                Ok(filter_by_dir_prefix(all, self.cwd.clone()))
            }

            FilterMode::All => {
                let global = self
                    .source
                    .query(&QuerySpec::builder().query(query).limit(self.limit).build())?;
                let session = self.source.query(
                    &QuerySpec::builder()
                        .query(query)
                        .limit(self.limit)
                        .filter_mode(SESSION_FILTER)
                        .build(),
                )?;

                // The session side is buffered in full by the merge. It is
                // bounded by `self.limit`, which keeps that step finite.
                debug!(limit = self.limit, "merging global and session history");
                Ok(merge_right(global, session))
            }
        }
    }
}
