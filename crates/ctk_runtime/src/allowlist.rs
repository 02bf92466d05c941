//! The allowlist/blocklist store gating which entities are shown.
//!
//! Governance is tagged per content type: a type with no gate is
//! *unrestricted* (everything allowed, the deliberate fail-open for
//! categories without governance data), while a [`Gate::Restricted`] set
//! allows exactly its members, including the empty set ("everything of this
//! type is blocked", used for subclasses under the baseline ruleset). The
//! blocklist is informational; the allowlist is the authoritative gate.
//!
//! Every operation here is infallible. This store sits on the page-render
//! hot path, so malformed input degrades to pass-through, never an error.

use ctk_pack::{trimmed_id, ContentType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Governance state for one content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// No governance data: every identifier of this type is allowed.
    Unrestricted,
    /// Only the listed identifiers are allowed. An empty set blocks the
    /// whole type.
    Restricted(BTreeSet<String>),
}

impl Gate {
    pub fn allows(&self, id: &str) -> bool {
        match self {
            Gate::Unrestricted => true,
            Gate::Restricted(ids) => ids.contains(id),
        }
    }
}

/// The generated baseline governance artifact: per-type permitted and
/// forbidden identifier lists, loaded before the gating runtime starts.
///
/// A type *present* with an empty array is governed-and-empty (fail-closed);
/// a type *absent* is ungoverned (fail-open).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineGovernance {
    #[serde(default)]
    pub allowlist: BTreeMap<ContentType, Vec<String>>,
    #[serde(default)]
    pub blocklist: BTreeMap<ContentType, Vec<String>>,
}

/// Working allowlist/blocklist state, resettable to its baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct AllowlistStore {
    gates: BTreeMap<ContentType, Gate>,
    blocklist: BTreeMap<ContentType, BTreeSet<String>>,
    baseline: BaselineGovernance,
}

impl AllowlistStore {
    pub fn new(baseline: BaselineGovernance) -> Self {
        let mut store = Self {
            gates: BTreeMap::new(),
            blocklist: BTreeMap::new(),
            baseline,
        };
        store.reset_to_baseline();
        store
    }

    /// Point query. Empty/whitespace identifiers are never matched and are
    /// always allowed; types without a gate are always allowed.
    pub fn is_allowed(&self, content_type: &ContentType, id: &str) -> bool {
        let Some(id) = trimmed_id(id) else {
            return true;
        };
        match self.gates.get(content_type) {
            None => true,
            Some(gate) => gate.allows(id),
        }
    }

    /// Informational blocklist lookup; never consulted by the gate itself.
    pub fn is_blocked(&self, content_type: &ContentType, id: &str) -> bool {
        let Some(id) = trimmed_id(id) else {
            return false;
        };
        self.blocklist
            .get(content_type)
            .is_some_and(|ids| ids.contains(id))
    }

    /// Whether the type has governance data at all.
    pub fn is_governed(&self, content_type: &ContentType) -> bool {
        self.gates.contains_key(content_type)
    }

    /// Retain only allowed entries of an ordered sequence, in place.
    /// A no-op when the type is ungoverned. Entries whose selector yields
    /// no identifier are kept.
    pub fn filter_vec<T, F>(&self, content_type: &ContentType, items: &mut Vec<T>, id_of: F)
    where
        F: Fn(&T) -> Option<String>,
    {
        if !self.is_governed(content_type) {
            return;
        }
        items.retain(|item| match id_of(item) {
            Some(id) => self.is_allowed(content_type, &id),
            None => true,
        });
    }

    /// Retain only allowed entries of a name-keyed map, in place. The
    /// selector sees the key and value and yields the identifier to gate on
    /// (which may be a composite built from the key).
    pub fn filter_map<V, F>(
        &self,
        content_type: &ContentType,
        entries: &mut BTreeMap<String, V>,
        id_of: F,
    ) where
        F: Fn(&str, &V) -> Option<String>,
    {
        if !self.is_governed(content_type) {
            return;
        }
        entries.retain(|key, value| match id_of(key, value) {
            Some(id) => self.is_allowed(content_type, &id),
            None => true,
        });
    }

    /// Union identifiers into the allow-sets, creating a restricted gate
    /// for a previously ungoverned type. Never removes. Merging into an
    /// explicitly unrestricted gate is a no-op (nothing to widen).
    pub fn merge_additions(&mut self, additions: &BTreeMap<ContentType, Vec<String>>) {
        for (content_type, ids) in additions {
            let gate = self
                .gates
                .entry(content_type.clone())
                .or_insert_with(|| Gate::Restricted(BTreeSet::new()));
            if let Gate::Restricted(set) = gate {
                set.extend(ids.iter().filter_map(|id| trimmed_id(id)).map(String::from));
            }
        }
    }

    /// Drop all merged additions and repopulate from the baseline
    /// governance data. Run before every re-filter cycle so a disabled
    /// pack leaves no stale entries behind.
    pub fn reset_to_baseline(&mut self) {
        self.gates = self
            .baseline
            .allowlist
            .iter()
            .map(|(content_type, ids)| {
                let set = ids
                    .iter()
                    .filter_map(|id| trimmed_id(id))
                    .map(String::from)
                    .collect();
                (content_type.clone(), Gate::Restricted(set))
            })
            .collect();
        self.blocklist = self
            .baseline
            .blocklist
            .iter()
            .map(|(content_type, ids)| {
                let set = ids
                    .iter()
                    .filter_map(|id| trimmed_id(id))
                    .map(String::from)
                    .collect();
                (content_type.clone(), set)
            })
            .collect();
    }

    /// Current allowed identifiers for a governed type, order-stable.
    /// `None` for ungoverned types.
    pub fn allowed_ids(&self, content_type: &ContentType) -> Option<Vec<String>> {
        match self.gates.get(content_type)? {
            Gate::Unrestricted => None,
            Gate::Restricted(ids) => Some(ids.iter().cloned().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell() -> ContentType {
        ContentType::from("spell")
    }

    fn subclass() -> ContentType {
        ContentType::from("subclass")
    }

    fn store_with(allowlist: &[(&str, &[&str])]) -> AllowlistStore {
        let governance = BaselineGovernance {
            allowlist: allowlist
                .iter()
                .map(|(content_type, ids)| {
                    (
                        ContentType::from(*content_type),
                        ids.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
            blocklist: BTreeMap::new(),
        };
        AllowlistStore::new(governance)
    }

    #[test]
    fn test_ungoverned_type_is_fail_open() {
        let store = store_with(&[]);
        assert!(store.is_allowed(&spell(), "Hex"));
        assert!(store.is_allowed(&spell(), ""));
        assert!(store.is_allowed(&ContentType::from("vehicle"), "Rowboat"));
    }

    #[test]
    fn test_governed_empty_type_is_fail_closed() {
        let store = store_with(&[("subclass", &[])]);
        assert!(!store.is_allowed(&subclass(), "Fighter:Echo Knight"));
        assert!(!store.is_allowed(&subclass(), "x"));
        // Empty identifier is "no id", always allowed.
        assert!(store.is_allowed(&subclass(), "   "));
    }

    #[test]
    fn test_membership() {
        let store = store_with(&[("spell", &["Fireball"])]);
        assert!(store.is_allowed(&spell(), "Fireball"));
        assert!(store.is_allowed(&spell(), "  Fireball "));
        assert!(!store.is_allowed(&spell(), "Hex"));
    }

    #[test]
    fn test_merge_additions_unions_without_duplicates() {
        let mut store = store_with(&[("spell", &["Fireball"])]);
        let additions: BTreeMap<ContentType, Vec<String>> =
            [(spell(), vec!["Hex".to_string(), "Hex".to_string()])]
                .into_iter()
                .collect();

        store.merge_additions(&additions);
        store.merge_additions(&additions);

        assert_eq!(
            store.allowed_ids(&spell()).unwrap(),
            vec!["Fireball".to_string(), "Hex".to_string()]
        );
    }

    #[test]
    fn test_merge_additions_creates_gate_for_new_type() {
        let mut store = store_with(&[]);
        let additions: BTreeMap<ContentType, Vec<String>> =
            [(subclass(), vec!["Fighter:Echo Knight".to_string()])]
                .into_iter()
                .collect();
        store.merge_additions(&additions);

        assert!(store.is_governed(&subclass()));
        assert!(store.is_allowed(&subclass(), "Fighter:Echo Knight"));
        assert!(!store.is_allowed(&subclass(), "Fighter:Champion"));
    }

    #[test]
    fn test_reset_to_baseline_discards_additions() {
        let mut store = store_with(&[("spell", &["Fireball"])]);
        let additions: BTreeMap<ContentType, Vec<String>> =
            [(spell(), vec!["Hex".to_string()])].into_iter().collect();
        store.merge_additions(&additions);
        assert!(store.is_allowed(&spell(), "Hex"));

        store.reset_to_baseline();
        assert!(!store.is_allowed(&spell(), "Hex"));
        assert!(store.is_allowed(&spell(), "Fireball"));
    }

    #[test]
    fn test_filter_vec_governed_and_ungoverned() {
        let store = store_with(&[("spell", &["Fireball"])]);

        let mut spells = vec!["Fireball".to_string(), "Hex".to_string()];
        store.filter_vec(&spell(), &mut spells, |s| Some(s.clone()));
        assert_eq!(spells, vec!["Fireball".to_string()]);

        let mut feats = vec!["Alert".to_string(), "Lucky".to_string()];
        store.filter_vec(&ContentType::from("feat"), &mut feats, |s| Some(s.clone()));
        assert_eq!(feats.len(), 2);
    }

    #[test]
    fn test_filter_vec_keeps_entries_without_id() {
        let store = store_with(&[("spell", &["Fireball"])]);
        let mut items: Vec<Option<String>> = vec![Some("Hex".to_string()), None];
        store.filter_vec(&spell(), &mut items, |s| s.clone());
        assert_eq!(items, vec![None]);
    }

    #[test]
    fn test_filter_map_with_composite_ids() {
        let store = store_with(&[("subclass", &["Fighter:Champion"])]);
        let mut options: BTreeMap<String, u32> =
            [("Champion".to_string(), 1), ("Echo Knight".to_string(), 2)]
                .into_iter()
                .collect();

        store.filter_map(&subclass(), &mut options, |name, _| {
            Some(format!("Fighter:{}", name))
        });

        assert_eq!(options.len(), 1);
        assert!(options.contains_key("Champion"));
    }

    #[test]
    fn test_blocklist_is_informational() {
        let governance = BaselineGovernance {
            allowlist: BTreeMap::new(),
            blocklist: [(ContentType::from("spell"), vec!["Wish".to_string()])]
                .into_iter()
                .collect(),
        };
        let store = AllowlistStore::new(governance);

        assert!(store.is_blocked(&spell(), "Wish"));
        assert!(!store.is_blocked(&spell(), "Hex"));
        // The blocklist never gates: spell type is ungoverned here.
        assert!(store.is_allowed(&spell(), "Wish"));
    }
}
