//! History pipeline for atuin-fzf.
//!
//! Entries are pulled lazily from one or more `atuin search` processes,
//! merged or filtered according to the requested [`FilterMode`], and finally
//! streamed to the selector as delimiter-separated records.

pub mod aggregator;
pub mod bridge;
pub mod dir_filter;
pub mod entry;
pub mod error;
pub mod filter_mode;
pub mod merge;
pub mod preview;
pub mod settings;
pub mod source;

// Re-export the pipeline stages for convenience
pub use aggregator::Aggregator;
pub use bridge::{PumpOutcome, RecordFormatter, StreamBridge, parse_record};
pub use dir_filter::filter_by_dir_prefix;
pub use entry::HistoryEntry;
pub use error::HistoryError;
pub use filter_mode::FilterMode;
pub use merge::merge_right;
pub use preview::PreviewDeduper;
pub use settings::Settings;
pub use source::{AtuinSource, EntryStream, HistorySource, QuerySpec};
