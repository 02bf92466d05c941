//! The merged view over all currently enabled packs.

use ctk_pack::{ContentType, PackRecord};
use std::collections::BTreeMap;

/// Records grouped by content type, in application order: pack-enable order
/// first, then document order within each pack.
pub type RecordsByType = BTreeMap<ContentType, Vec<PackRecord>>;

/// Derived, ephemeral union of the enabled packs' contributions.
///
/// Recomputed in full on every pack-state change and never persisted; it
/// is always derivable from the pack store plus the baseline snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedContext {
    /// Explicit allowlist grants declared by enabled packs.
    pub allowlist_additions: BTreeMap<ContentType, Vec<String>>,
    /// Entity changes contributed by enabled packs.
    pub records_by_type: RecordsByType,
}

impl MergedContext {
    pub fn is_empty(&self) -> bool {
        self.allowlist_additions.is_empty() && self.records_by_type.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.records_by_type.values().map(Vec::len).sum()
    }
}
