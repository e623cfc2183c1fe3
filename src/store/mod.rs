pub mod jsonl;

pub use jsonl::JsonlStore;

use anyhow::Result;
use std::collections::HashSet;

/// Set of local record identifiers. Only membership and set algebra are
/// needed; no ordering is required.
pub type RecordSet = HashSet<u32>;

/// Narrow interface over the local bibliographic store.
///
/// The real store lives behind an external query engine; any client that
/// honors this contract can be substituted.
pub trait RecordStore {
    /// Record ids whose stored field `tag` contains exactly `value`
    fn search_pattern(&self, tag: &str, value: &str) -> Result<RecordSet>;

    /// The universe of records eligible for matching this run
    fn eligible_records(&self) -> Result<RecordSet>;

    /// Stored values of `tag` for one record (empty if the record or the
    /// field is absent)
    fn field_values(&self, recid: u32, tag: &str) -> Result<Vec<String>>;
}
