//! Baseline snapshot of the factory game data.
//!
//! Captured once before any pack is applied, the snapshot is the replay
//! anchor for every gating cycle: the merge engine always starts from a
//! clone of it, never from the mutated live tables. It is the single
//! capture/restore authority: both the overlay merge and the gating prune
//! restore from here.
//!
//! The gating runtime can initialize before asynchronously loaded rule data
//! has populated the tables, so an early capture may be empty. The
//! staleness heuristic in [`get_or_refresh`](BaselineSnapshot::get_or_refresh)
//! recaptures once real data appears: a stored snapshot with an empty spell
//! list is replaced when the live spell list is non-empty.

use crate::tables::LiveDataTables;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineSnapshot {
    tables: LiveDataTables,
}

impl BaselineSnapshot {
    /// Deep-copy the live tables. Safe on empty or partially loaded data;
    /// an empty capture is simply replaced later by the staleness check.
    pub fn capture(live: &LiveDataTables) -> Self {
        Self {
            tables: live.clone(),
        }
    }

    pub fn tables(&self) -> &LiveDataTables {
        &self.tables
    }

    /// The ordering hazard check: captured before the spell table was
    /// populated, while the live table now has data.
    pub fn is_stale_against(&self, live: &LiveDataTables) -> bool {
        self.tables.spells.is_empty() && !live.spells.is_empty()
    }

    /// Return the cached capture, recapturing first if the staleness
    /// heuristic fires.
    pub fn get_or_refresh(&mut self, live: &LiveDataTables) -> &LiveDataTables {
        if self.is_stale_against(live) {
            tracing::info!("baseline snapshot was captured before data load, recapturing");
            self.tables = live.clone();
        }
        &self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spell(title: &str) -> crate::tables::Entity {
        json!({ "title": title }).as_object().unwrap().clone()
    }

    #[test]
    fn test_capture_of_empty_tables_is_not_an_error() {
        let snapshot = BaselineSnapshot::capture(&LiveDataTables::default());
        assert!(snapshot.tables().is_empty());
    }

    #[test]
    fn test_refresh_fires_when_data_appears() {
        let mut snapshot = BaselineSnapshot::capture(&LiveDataTables::default());

        let mut live = LiveDataTables::default();
        live.spells.push(spell("Hex"));

        assert!(snapshot.is_stale_against(&live));
        let refreshed = snapshot.get_or_refresh(&live);
        assert_eq!(refreshed.spells.len(), 1);
        assert!(!snapshot.is_stale_against(&live));
    }

    #[test]
    fn test_populated_capture_is_kept() {
        let mut original = LiveDataTables::default();
        original.spells.push(spell("Hex"));
        let mut snapshot = BaselineSnapshot::capture(&original);

        // Live tables mutate (e.g. pruned to a different spell set); the
        // snapshot must not chase them.
        let mut live = original.clone();
        live.spells.push(spell("Bane"));

        assert!(!snapshot.is_stale_against(&live));
        assert_eq!(snapshot.get_or_refresh(&live).spells.len(), 1);
    }
}
