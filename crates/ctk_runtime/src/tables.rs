//! The live, in-memory game data tables.
//!
//! [`LiveDataTables`] is the working copy of the rule data the rest of the
//! application reads: the ordered spell list plus name-keyed maps for
//! classes, subclasses, feats, backgrounds, and the class-derived equipment
//! tables. It is plain data with a single writer: the overlay merge engine
//! rebuilds it wholesale each gating cycle, and readers take it through
//! [`GatingRuntime::tables`](crate::GatingRuntime::tables). No other code
//! path mutates it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A game entity in wire shape: an open JSON map.
pub type Entity = serde_json::Map<String, Value>;

/// Subclass choice level used when a pack record creates a class's subclass
/// container without specifying one.
pub const DEFAULT_SUBCLASS_SELECTION_LEVEL: u8 = 3;

/// A class's subclass container: the level at which the subclass is chosen
/// and the available options keyed by subclass name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubclassGroup {
    pub selection_level: u8,
    pub options: BTreeMap<String, Entity>,
}

impl Default for SubclassGroup {
    fn default() -> Self {
        Self {
            selection_level: DEFAULT_SUBCLASS_SELECTION_LEVEL,
            options: BTreeMap::new(),
        }
    }
}

impl SubclassGroup {
    pub fn new(selection_level: u8) -> Self {
        Self {
            selection_level,
            options: BTreeMap::new(),
        }
    }
}

/// The full set of mutable rule-data tables.
///
/// `spells` is an ordered sequence matched by normalized title; everything
/// else is keyed by entity name. `equipment_choices` and
/// `default_equipment` are keyed by class name, extracted from class
/// payloads during normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveDataTables {
    pub spells: Vec<Entity>,
    pub classes: BTreeMap<String, Entity>,
    pub subclasses: BTreeMap<String, SubclassGroup>,
    pub feats: BTreeMap<String, Entity>,
    pub backgrounds: BTreeMap<String, Entity>,
    pub equipment_choices: BTreeMap<String, Entity>,
    pub default_equipment: BTreeMap<String, Entity>,
}

impl LiveDataTables {
    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
            && self.classes.is_empty()
            && self.subclasses.is_empty()
            && self.feats.is_empty()
            && self.backgrounds.is_empty()
            && self.equipment_choices.is_empty()
            && self.default_equipment.is_empty()
    }
}

/// Title match key for the spell list: trimmed, lowercased.
pub fn normalized_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Read a spell entity's title field, if it has one.
pub fn spell_title(spell: &Entity) -> Option<&str> {
    spell.get("title").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_subclass_group_selection_level() {
        assert_eq!(SubclassGroup::default().selection_level, 3);
    }

    #[test]
    fn test_normalized_title() {
        assert_eq!(normalized_title("  Magic Missile "), "magic missile");
    }

    #[test]
    fn test_tables_roundtrip() {
        let mut tables = LiveDataTables::default();
        let spell = json!({ "title": "Hex", "level": 1 });
        tables.spells.push(spell.as_object().unwrap().clone());
        tables
            .subclasses
            .insert("Fighter".to_string(), SubclassGroup::new(3));

        let text = serde_json::to_string(&tables).unwrap();
        let parsed: LiveDataTables = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, tables);
        assert_eq!(spell_title(&parsed.spells[0]), Some("Hex"));
    }
}
