use std::collections::HashSet;

use crate::entry::HistoryEntry;

/// Remembers entries already shown in a preview.
///
/// The preview lists similar commands from more than one query, and the same
/// execution can come back from each of them with a slightly different
/// relative time. Entries are compared with that field blanked.
#[derive(Debug, Default)]
pub struct PreviewDeduper {
    seen: HashSet<HistoryEntry>,
}

impl PreviewDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a logical entry is offered.
    pub fn admit(&mut self, entry: &HistoryEntry) -> bool {
        self.seen.insert(entry.without_relative_time())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
