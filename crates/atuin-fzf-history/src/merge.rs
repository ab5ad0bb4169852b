use std::collections::HashSet;

use futures::StreamExt;
use tracing::trace;

use crate::source::EntryStream;

/// Merge two streams, resolving duplicates in favour of `right`.
///
/// Entries of `left` that also appear in `right` are dropped. The surviving
/// `left` entries come first, in their original order, followed by all of
/// `right` in its original order.
///
/// `right` is drained into memory before the first `left` entry is pulled,
/// since whether a `left` entry survives depends on all of `right`. Callers
/// must bound `right` (the query limit does this); an unbounded `right`
/// makes this step unbounded too.
///
/// An error from either side is passed on as the final item, and neither
/// side is pulled again. Dropping the merged stream drops both inputs.
pub fn merge_right(left: EntryStream, right: EntryStream) -> EntryStream {
    Box::pin(async_stream::stream! {
        let mut left = left;
        let mut right = right;

        let mut buffered = Vec::new();
        let mut seen = HashSet::new();
        while let Some(item) = right.next().await {
            match item {
                Ok(entry) => {
                    seen.insert(entry.clone());
                    buffered.push(entry);
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
        drop(right);

        trace!(buffered = buffered.len(), "right side drained");

        while let Some(item) = left.next().await {
            match item {
                Ok(entry) if seen.contains(&entry) => {}
                Ok(entry) => yield Ok(entry),
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
        drop(left);

        for entry in buffered {
            yield Ok(entry);
        }
    })
}
