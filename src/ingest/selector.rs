// src/ingest/selector.rs
use crate::ingest::types::FeedEntry;

/// Leading entries every feed carries that are not recipes (pinned/meta posts).
pub const SKIP_LEADING_ENTRIES: usize = 2;

/// Drop the first `skip` entries. Shorter feeds yield nothing instead of failing.
pub fn select_entries(entries: Vec<FeedEntry>, skip: usize) -> Vec<FeedEntry> {
    entries.into_iter().skip(skip).collect()
}
