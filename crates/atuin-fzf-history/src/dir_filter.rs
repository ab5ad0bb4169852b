use futures::StreamExt;

use crate::source::EntryStream;

/// Whether `directory` is `prefix` or lies somewhere beneath it.
///
/// Matching happens on whole path components, so `/home/al` does not
/// contain `/home/alpha`.
pub fn in_subtree(directory: &str, prefix: &str) -> bool {
    directory == prefix
        || directory
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Keep only entries recorded in `prefix` or below it.
///
/// Entries are passed through one at a time. An error is forwarded and ends
/// the stream.
pub fn filter_by_dir_prefix(entries: EntryStream, prefix: impl Into<String>) -> EntryStream {
    let prefix = prefix.into();

    Box::pin(async_stream::stream! {
        let mut entries = entries;
        while let Some(item) = entries.next().await {
            match item {
                Ok(entry) if in_subtree(&entry.directory, &prefix) => yield Ok(entry),
                Ok(_) => {}
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    })
}
