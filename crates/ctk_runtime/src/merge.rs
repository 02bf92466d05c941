//! The overlay merge engine.
//!
//! Rebuilds the live data tables from the baseline snapshot plus the
//! enabled packs' records, and derives the allowlist grants those records
//! imply.
//!
//! # Merge algorithm
//!
//! 1. Start from a deep clone of the baseline tables; the baseline itself
//!    is never mutated, so every cycle replays from the same anchor.
//! 2. Process content types in a fixed order (spell, class, subclass, feat,
//!    background); class-derived equipment tables are handled during class
//!    processing because their identifiers derive from class ids. Within a
//!    type, records apply in the order supplied; later records win.
//! 3. `remove` deletes by normalized-title scan (spells) or map key
//!    (everything else); removing a missing id is a no-op.
//! 4. `add`/`replace` normalize the payload to the canonical entity shape,
//!    then insert, or shallow-merge onto an existing entry so a
//!    partial-update pack doesn't wipe fields the baseline already had.
//! 5. Records of types without a table (races, metamagic, ...) contribute
//!    allowlist grants only.

use crate::context::{MergedContext, RecordsByType};
use crate::snapshot::BaselineSnapshot;
use crate::tables::{
    normalized_title, spell_title, Entity, LiveDataTables, SubclassGroup,
    DEFAULT_SUBCLASS_SELECTION_LEVEL,
};
use ctk_pack::{
    split_composite_id, trimmed_id, ContentType, PackRecord, RecordOperation, WellKnownContentType,
};
use itertools::Itertools;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const TYPE_PROCESS_ORDER: [WellKnownContentType; 5] = [
    WellKnownContentType::Spell,
    WellKnownContentType::Class,
    WellKnownContentType::Subclass,
    WellKnownContentType::Feat,
    WellKnownContentType::Background,
];

/// Rebuild live tables from the baseline with the given records applied.
pub fn apply_records(baseline: &BaselineSnapshot, records: &RecordsByType) -> LiveDataTables {
    let mut tables = baseline.tables().clone();
    apply_records_to(&mut tables, records);
    tables
}

/// Apply records onto already-materialized tables, in place.
pub fn apply_records_to(tables: &mut LiveDataTables, records: &RecordsByType) {
    for tag in TYPE_PROCESS_ORDER {
        let Some(entries) = records.get(&ContentType::Known(tag)) else {
            continue;
        };
        for record in entries {
            match tag {
                WellKnownContentType::Spell => apply_spell_record(tables, record),
                WellKnownContentType::Class => apply_class_record(tables, record),
                WellKnownContentType::Subclass => apply_subclass_record(tables, record),
                WellKnownContentType::Feat => apply_feat_record(tables, record),
                WellKnownContentType::Background => apply_background_record(tables, record),
                _ => unreachable!("not in the process order"),
            }
        }
    }
}

/// Allowlist grants implied by a context: the explicit pack-declared
/// additions plus one grant per `add`/`replace` record (a pack that adds an
/// entity implicitly allows it; a class add also allows its three derived
/// sub-resource keys). `remove` records grant nothing. Output ids are
/// deduplicated, first occurrence wins the position.
pub fn collect_allowlist_additions(context: &MergedContext) -> BTreeMap<ContentType, Vec<String>> {
    let mut additions = context.allowlist_additions.clone();

    for (content_type, records) in &context.records_by_type {
        for record in records {
            if record.operation == RecordOperation::Remove {
                continue;
            }
            let Some(id) = trimmed_id(&record.id) else {
                continue;
            };
            additions
                .entry(content_type.clone())
                .or_default()
                .push(id.to_string());

            if *content_type == ContentType::Known(WellKnownContentType::Class) {
                for (derived_type, key) in derived_class_allowances(id) {
                    additions.entry(derived_type).or_default().push(key);
                }
            }
        }
    }

    for ids in additions.values_mut() {
        *ids = ids.drain(..).unique().collect();
    }
    additions
}

/// The three class-derived sub-resource allowlist keys for a class id.
pub fn derived_class_allowances(class_id: &str) -> [(ContentType, String); 3] {
    [
        (
            ContentType::Known(WellKnownContentType::ClassStartingGold),
            format!("class-starting-gold:{}", class_id),
        ),
        (
            ContentType::Known(WellKnownContentType::ClassEquipmentChoice),
            format!("class-equip-choice:{}", class_id),
        ),
        (
            ContentType::Known(WellKnownContentType::ClassEquipmentDefault),
            format!("class-equip-default:{}", class_id),
        ),
    ]
}

/// Derived sub-resource grants for every surviving class id, recomputed
/// after each cycle so removed classes leave no derived residue.
pub fn derived_allowances_for<'a>(
    class_ids: impl Iterator<Item = &'a String>,
) -> BTreeMap<ContentType, Vec<String>> {
    let mut additions: BTreeMap<ContentType, Vec<String>> = BTreeMap::new();
    for class_id in class_ids {
        for (derived_type, key) in derived_class_allowances(class_id) {
            additions.entry(derived_type).or_default().push(key);
        }
    }
    additions
}

fn shallow_merge(existing: &mut Entity, incoming: Entity) {
    for (key, value) in incoming {
        existing.insert(key, value);
    }
}

fn upsert(table: &mut BTreeMap<String, Entity>, id: &str, incoming: Entity) {
    match table.get_mut(id) {
        Some(existing) => shallow_merge(existing, incoming),
        None => {
            table.insert(id.to_string(), incoming);
        }
    }
}

fn apply_spell_record(tables: &mut LiveDataTables, record: &PackRecord) {
    let Some(id) = trimmed_id(&record.id) else {
        return;
    };
    let target = normalized_title(id);
    let position = tables
        .spells
        .iter()
        .position(|spell| spell_title(spell).map(|t| normalized_title(t)) == Some(target.clone()));

    match record.operation {
        RecordOperation::Remove => {
            if let Some(index) = position {
                tables.spells.remove(index);
            }
        }
        RecordOperation::Add | RecordOperation::Replace => {
            let incoming = normalize_spell(id, record.payload.clone().unwrap_or_default());
            match position {
                Some(index) => shallow_merge(&mut tables.spells[index], incoming),
                None => tables.spells.push(incoming),
            }
        }
    }
}

fn apply_class_record(tables: &mut LiveDataTables, record: &PackRecord) {
    let Some(id) = trimmed_id(&record.id) else {
        return;
    };
    match record.operation {
        RecordOperation::Remove => {
            tables.classes.remove(id);
            tables.equipment_choices.remove(id);
            tables.default_equipment.remove(id);
        }
        RecordOperation::Add | RecordOperation::Replace => {
            let normalized = normalize_class(id, record.payload.clone().unwrap_or_default());
            upsert(&mut tables.classes, id, normalized.entity);
            if let Some(choices) = normalized.equipment_choices {
                upsert(&mut tables.equipment_choices, id, choices);
            }
            if let Some(default) = normalized.default_equipment {
                upsert(&mut tables.default_equipment, id, default);
            }
        }
    }
}

fn apply_subclass_record(tables: &mut LiveDataTables, record: &PackRecord) {
    let Some(raw_id) = trimmed_id(&record.id) else {
        return;
    };
    let payload = record.payload.clone().unwrap_or_default();

    let (scope, name) = split_composite_id(raw_id);
    let class_name = scope.map(String::from).or_else(|| {
        payload
            .get("parentClass")
            .and_then(Value::as_str)
            .and_then(trimmed_id)
            .map(String::from)
    });
    let Some(class_name) = class_name else {
        return;
    };
    if name.is_empty() {
        return;
    }

    match record.operation {
        RecordOperation::Remove => {
            if let Some(group) = tables.subclasses.get_mut(&class_name) {
                group.options.remove(name);
            }
        }
        RecordOperation::Add | RecordOperation::Replace => {
            let selection_level = payload
                .get("selectionLevel")
                .and_then(Value::as_u64)
                .map(|level| level as u8);
            let group = tables
                .subclasses
                .entry(class_name)
                .or_insert_with(|| {
                    SubclassGroup::new(selection_level.unwrap_or(DEFAULT_SUBCLASS_SELECTION_LEVEL))
                });
            let incoming = normalize_subclass(name, payload);
            match group.options.get_mut(name) {
                Some(existing) => shallow_merge(existing, incoming),
                None => {
                    group.options.insert(name.to_string(), incoming);
                }
            }
        }
    }
}

fn apply_feat_record(tables: &mut LiveDataTables, record: &PackRecord) {
    let Some(id) = trimmed_id(&record.id) else {
        return;
    };
    match record.operation {
        RecordOperation::Remove => {
            tables.feats.remove(id);
        }
        RecordOperation::Add | RecordOperation::Replace => {
            upsert(&mut tables.feats, id, record.payload.clone().unwrap_or_default());
        }
    }
}

fn apply_background_record(tables: &mut LiveDataTables, record: &PackRecord) {
    let Some(id) = trimmed_id(&record.id) else {
        return;
    };
    match record.operation {
        RecordOperation::Remove => {
            tables.backgrounds.remove(id);
        }
        RecordOperation::Add | RecordOperation::Replace => {
            let incoming = normalize_background(record.payload.clone().unwrap_or_default());
            upsert(&mut tables.backgrounds, id, incoming);
        }
    }
}

/// Canonicalize a spell payload: collapse casting-time synonyms, fall back
/// the body text, clean the class list, default the title from the id.
fn normalize_spell(id: &str, mut payload: Entity) -> Entity {
    let mut casting = None;
    for key in ["casting_time", "castingTime", "casting"] {
        if let Some(value) = payload.remove(key) {
            casting.get_or_insert(value);
        }
    }
    if let Some(value) = casting {
        payload.insert("castingTime".to_string(), value);
    }

    if !payload.contains_key("body") {
        let body = ["description", "summary"]
            .iter()
            .filter_map(|key| payload.get(*key).cloned())
            .next();
        if let Some(value) = body {
            payload.insert("body".to_string(), value);
        }
    }
    payload.remove("description");
    payload.remove("summary");

    if let Some(Value::Array(classes)) = payload.get("classes") {
        let cleaned: Vec<Value> = classes
            .iter()
            .filter_map(Value::as_str)
            .filter_map(trimmed_id)
            .map(|name| Value::String(name.to_string()))
            .collect();
        payload.insert("classes".to_string(), Value::Array(cleaned));
    }

    let has_title = payload
        .get("title")
        .and_then(Value::as_str)
        .and_then(trimmed_id)
        .is_some();
    if !has_title {
        payload.insert("title".to_string(), Value::String(id.to_string()));
    }

    payload
}

struct NormalizedClass {
    entity: Entity,
    equipment_choices: Option<Entity>,
    default_equipment: Option<Entity>,
}

/// Canonicalize a class payload: numeric hit die, list-shaped primary
/// ability, level-keyed feature map, and the equipment sub-objects pulled
/// out into their own derived tables.
fn normalize_class(id: &str, mut payload: Entity) -> NormalizedClass {
    if let Some(hit_dice) = payload.remove("hitDice") {
        let parsed = match &hit_dice {
            Value::String(text) => text
                .trim()
                .trim_start_matches(['d', 'D'])
                .parse::<u64>()
                .ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        };
        if let Some(sides) = parsed {
            payload.insert("hitDie".to_string(), Value::Number(sides.into()));
        }
    }

    if let Some(primary) = payload.remove("primaryAbility") {
        let as_list = match primary {
            Value::String(ability) => Value::Array(vec![Value::String(ability)]),
            other => other,
        };
        payload.insert("primaryAbility".to_string(), as_list);
    }

    if let Some(by_level) = payload.remove("featuresByLevel") {
        payload.insert("features".to_string(), canonicalize_features(by_level));
    }

    let has_name = payload
        .get("name")
        .and_then(Value::as_str)
        .and_then(trimmed_id)
        .is_some();
    if !has_name {
        payload.insert("name".to_string(), Value::String(id.to_string()));
    }

    let equipment_choices = payload
        .remove("equipmentChoices")
        .and_then(|value| value.as_object().cloned());
    let default_equipment = payload
        .remove("defaultEquipment")
        .and_then(|value| value.as_object().cloned());

    NormalizedClass {
        entity: payload,
        equipment_choices,
        default_equipment,
    }
}

/// Canonicalize a subclass payload: feature map like classes, container
/// fields stripped (they live on the group), name defaulted from the
/// subclass portion of the composite id.
fn normalize_subclass(name: &str, mut payload: Entity) -> Entity {
    payload.remove("parentClass");
    payload.remove("selectionLevel");

    if let Some(by_level) = payload.remove("featuresByLevel") {
        payload.insert("features".to_string(), canonicalize_features(by_level));
    }

    let has_name = payload
        .get("name")
        .and_then(Value::as_str)
        .and_then(trimmed_id)
        .is_some();
    if !has_name {
        payload.insert("name".to_string(), Value::String(name.to_string()));
    }

    payload
}

/// `featuresByLevel` to the canonical integer-keyed `features` map with
/// list-of-string values. Scalar values become one-element lists; keys that
/// don't parse as levels are dropped.
fn canonicalize_features(by_level: Value) -> Value {
    let mut features = Map::new();
    let Some(entries) = by_level.as_object() else {
        return Value::Object(features);
    };

    for (level, value) in entries {
        let Ok(level) = level.trim().parse::<u32>() else {
            continue;
        };
        let names: Vec<Value> = match value {
            Value::String(name) => vec![Value::String(name.clone())],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|name| Value::String(name.to_string()))
                .collect(),
            _ => continue,
        };
        features.insert(level.to_string(), Value::Array(names));
    }

    Value::Object(features)
}

/// Canonicalize a background payload: each equipment entry becomes a
/// `{name, quantity, notes}` object. Object entries pass through untouched.
fn normalize_background(mut payload: Entity) -> Entity {
    if let Some(Value::Array(equipment)) = payload.get("equipment") {
        let normalized: Vec<Value> = equipment
            .iter()
            .map(|entry| match entry {
                Value::String(text) => parse_equipment_entry(text),
                other => other.clone(),
            })
            .collect();
        payload.insert("equipment".to_string(), Value::Array(normalized));
    }
    payload
}

/// Parse a textual equipment entry.
///
/// Two recognized shapes: `"Name xN (notes)"` and `"Name (notes)"`.
/// Anything else keeps the whole trimmed string as the name with quantity 1.
pub fn parse_equipment_entry(raw: &str) -> Value {
    let trimmed = raw.trim();

    if let (Some(open), true) = (trimmed.find('('), trimmed.ends_with(')')) {
        let notes = trimmed[open + 1..trimmed.len() - 1].trim();
        let head = trimmed[..open].trim();
        if !head.is_empty() {
            if let Some((name, quantity)) = split_quantity_suffix(head) {
                return equipment_object(name, quantity, notes);
            }
            return equipment_object(head, 1, notes);
        }
    }

    equipment_object(trimmed, 1, "")
}

fn split_quantity_suffix(head: &str) -> Option<(&str, u64)> {
    let (name, last) = head.rsplit_once(char::is_whitespace)?;
    let digits = last.strip_prefix('x')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((name.trim_end(), digits.parse().ok()?))
}

fn equipment_object(name: &str, quantity: u64, notes: &str) -> Value {
    let mut object = Map::new();
    object.insert("name".to_string(), Value::String(name.to_string()));
    object.insert("quantity".to_string(), Value::Number(quantity.into()));
    object.insert("notes".to_string(), Value::String(notes.to_string()));
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(value: Value) -> Entity {
        value.as_object().unwrap().clone()
    }

    fn record(
        content_type: &str,
        id: &str,
        operation: RecordOperation,
        payload: Option<Value>,
    ) -> PackRecord {
        PackRecord {
            content_type: ContentType::from(content_type),
            id: id.to_string(),
            operation,
            payload: payload.map(entity),
        }
    }

    fn by_type(records: Vec<PackRecord>) -> RecordsByType {
        let mut grouped = RecordsByType::new();
        for r in records {
            grouped.entry(r.content_type.clone()).or_default().push(r);
        }
        grouped
    }

    fn baseline_with_spell(title: &str) -> BaselineSnapshot {
        let mut tables = LiveDataTables::default();
        tables.spells.push(entity(json!({ "title": title, "level": 3 })));
        BaselineSnapshot::capture(&tables)
    }

    #[test]
    fn test_apply_is_idempotent() {
        let baseline = baseline_with_spell("Fireball");
        let records = by_type(vec![
            record("spell", "Hex", RecordOperation::Add, Some(json!({ "level": 1 }))),
            record("spell", "Fireball", RecordOperation::Replace, Some(json!({ "level": 4 }))),
            record("feat", "Alert", RecordOperation::Add, Some(json!({}))),
        ]);

        let first = apply_records(&baseline, &records);
        let second = apply_records(&baseline, &records);
        assert_eq!(first, second);
    }

    #[test]
    fn test_add_then_remove_round_trip() {
        let baseline = baseline_with_spell("Fireball");
        let records = by_type(vec![
            record("spell", "Hex", RecordOperation::Add, Some(json!({ "level": 1 }))),
            record("spell", "Hex", RecordOperation::Remove, None),
        ]);

        let result = apply_records(&baseline, &records);
        assert_eq!(result, *baseline.tables());
    }

    #[test]
    fn test_remove_of_missing_id_is_a_no_op() {
        let baseline = baseline_with_spell("Fireball");
        let records = by_type(vec![
            record("spell", "Nonexistent", RecordOperation::Remove, None),
            record("class", "Nonexistent", RecordOperation::Remove, None),
        ]);

        assert_eq!(apply_records(&baseline, &records), *baseline.tables());
    }

    #[test]
    fn test_replace_shallow_merges_onto_baseline_entry() {
        let baseline = baseline_with_spell("Fireball");
        let records = by_type(vec![record(
            "spell",
            "fireball",
            RecordOperation::Replace,
            Some(json!({ "castingTime": "1 action" })),
        )]);

        let result = apply_records(&baseline, &records);
        assert_eq!(result.spells.len(), 1);
        // Partial update keeps the baseline's fields.
        assert_eq!(result.spells[0]["level"], json!(3));
        assert_eq!(result.spells[0]["castingTime"], json!("1 action"));
    }

    #[test]
    fn test_spell_normalization() {
        let spell = normalize_spell(
            "Hex",
            entity(json!({
                "casting": "1 bonus action",
                "description": "A curse.",
                "classes": [" Warlock ", "", "Wizard"]
            })),
        );

        assert_eq!(spell["castingTime"], json!("1 bonus action"));
        assert_eq!(spell["body"], json!("A curse."));
        assert!(!spell.contains_key("description"));
        assert_eq!(spell["classes"], json!(["Warlock", "Wizard"]));
        assert_eq!(spell["title"], json!("Hex"));
    }

    #[test]
    fn test_class_normalization() {
        let records = by_type(vec![record(
            "class",
            "Artificer",
            RecordOperation::Add,
            Some(json!({
                "hitDice": "d8",
                "primaryAbility": "Int",
                "featuresByLevel": { "1": "Magical Tinkering", "2": ["Infuse Item"], "x": "dropped" },
                "equipmentChoices": { "a": ["any simple weapon"] },
                "defaultEquipment": { "items": ["light crossbow"] }
            })),
        )]);

        let result = apply_records(&BaselineSnapshot::default(), &records);
        let class = &result.classes["Artificer"];

        assert_eq!(class["hitDie"], json!(8));
        assert_eq!(class["primaryAbility"], json!(["Int"]));
        assert_eq!(
            class["features"],
            json!({ "1": ["Magical Tinkering"], "2": ["Infuse Item"] })
        );
        assert_eq!(class["name"], json!("Artificer"));
        assert!(!class.contains_key("equipmentChoices"));
        assert_eq!(
            result.equipment_choices["Artificer"]["a"],
            json!(["any simple weapon"])
        );
        assert_eq!(
            result.default_equipment["Artificer"]["items"],
            json!(["light crossbow"])
        );
    }

    #[test]
    fn test_class_remove_drops_derived_tables() {
        let add = by_type(vec![record(
            "class",
            "Artificer",
            RecordOperation::Add,
            Some(json!({ "hitDice": "d8", "equipmentChoices": { "a": [] } })),
        )]);
        let baseline = BaselineSnapshot::capture(&apply_records(&BaselineSnapshot::default(), &add));

        let remove = by_type(vec![record("class", "Artificer", RecordOperation::Remove, None)]);
        let result = apply_records(&baseline, &remove);

        assert!(result.classes.is_empty());
        assert!(result.equipment_choices.is_empty());
    }

    #[test]
    fn test_subclass_composite_key_creates_group() {
        let records = by_type(vec![record(
            "subclass",
            "Fighter:Echo Knight",
            RecordOperation::Add,
            Some(json!({})),
        )]);

        let result = apply_records(&BaselineSnapshot::default(), &records);
        let group = &result.subclasses["Fighter"];
        assert_eq!(group.selection_level, 3);
        assert_eq!(group.options["Echo Knight"]["name"], json!("Echo Knight"));
    }

    #[test]
    fn test_subclass_group_from_payload_fields() {
        let records = by_type(vec![record(
            "subclass",
            "Echo Knight",
            RecordOperation::Add,
            Some(json!({ "parentClass": "Fighter", "selectionLevel": 1 })),
        )]);

        let result = apply_records(&BaselineSnapshot::default(), &records);
        let group = &result.subclasses["Fighter"];
        assert_eq!(group.selection_level, 1);
        let option = &group.options["Echo Knight"];
        assert!(!option.contains_key("parentClass"));
        assert!(!option.contains_key("selectionLevel"));
    }

    #[test]
    fn test_subclass_remove_is_scoped_to_its_class() {
        let add = by_type(vec![
            record("subclass", "Fighter:Champion", RecordOperation::Add, Some(json!({}))),
            record("subclass", "Paladin:Champion", RecordOperation::Add, Some(json!({}))),
        ]);
        let baseline = BaselineSnapshot::capture(&apply_records(&BaselineSnapshot::default(), &add));

        let remove = by_type(vec![record(
            "subclass",
            "Fighter:Champion",
            RecordOperation::Remove,
            None,
        )]);
        let result = apply_records(&baseline, &remove);

        assert!(result.subclasses["Fighter"].options.is_empty());
        assert_eq!(result.subclasses["Paladin"].options.len(), 1);
    }

    #[test]
    fn test_background_equipment_parsing() {
        assert_eq!(
            parse_equipment_entry("Backpack x2 (worn)"),
            json!({ "name": "Backpack", "quantity": 2, "notes": "worn" })
        );
        assert_eq!(
            parse_equipment_entry("Holy Symbol"),
            json!({ "name": "Holy Symbol", "quantity": 1, "notes": "" })
        );
        assert_eq!(
            parse_equipment_entry("Ink Pen (fine tip)"),
            json!({ "name": "Ink Pen", "quantity": 1, "notes": "fine tip" })
        );
        assert_eq!(
            parse_equipment_entry("Rope x3"),
            json!({ "name": "Rope x3", "quantity": 1, "notes": "" })
        );
    }

    #[test]
    fn test_background_record_normalizes_equipment() {
        let records = by_type(vec![record(
            "background",
            "Acolyte",
            RecordOperation::Add,
            Some(json!({
                "equipment": [
                    "Holy Symbol",
                    "Incense x5 (stick)",
                    { "name": "Vestments", "quantity": 1, "notes": "" }
                ]
            })),
        )]);

        let result = apply_records(&BaselineSnapshot::default(), &records);
        let equipment = result.backgrounds["Acolyte"]["equipment"].as_array().unwrap();
        assert_eq!(equipment[0]["quantity"], json!(1));
        assert_eq!(equipment[1], json!({ "name": "Incense", "quantity": 5, "notes": "stick" }));
        assert_eq!(equipment[2]["name"], json!("Vestments"));
    }

    #[test]
    fn test_implicit_allowances_from_records() {
        let mut context = MergedContext::default();
        context.records_by_type = by_type(vec![
            record("spell", "Hex", RecordOperation::Add, Some(json!({}))),
            record("spell", "Bane", RecordOperation::Remove, None),
            record("class", "Artificer", RecordOperation::Add, Some(json!({}))),
        ]);

        let additions = collect_allowlist_additions(&context);

        assert_eq!(additions[&ContentType::from("spell")], vec!["Hex".to_string()]);
        assert_eq!(
            additions[&ContentType::from("class")],
            vec!["Artificer".to_string()]
        );
        assert_eq!(
            additions[&ContentType::from("class-equipment-choice")],
            vec!["class-equip-choice:Artificer".to_string()]
        );
        assert_eq!(
            additions[&ContentType::from("class-starting-gold")],
            vec!["class-starting-gold:Artificer".to_string()]
        );
        assert_eq!(
            additions[&ContentType::from("class-equipment-default")],
            vec!["class-equip-default:Artificer".to_string()]
        );
    }

    #[test]
    fn test_explicit_and_implicit_additions_deduplicate() {
        let mut context = MergedContext::default();
        context
            .allowlist_additions
            .insert(ContentType::from("spell"), vec!["Hex".to_string()]);
        context.records_by_type = by_type(vec![record(
            "spell",
            "Hex",
            RecordOperation::Add,
            Some(json!({})),
        )]);

        let additions = collect_allowlist_additions(&context);
        assert_eq!(additions[&ContentType::from("spell")], vec!["Hex".to_string()]);
    }

    proptest::proptest! {
        #[test]
        fn test_apply_twice_always_matches_apply_once(level in 0u32..10, count in 1usize..8) {
            let baseline = baseline_with_spell("Fireball");
            let records = by_type(
                (0..count)
                    .map(|i| {
                        record(
                            "spell",
                            &format!("Spell {}", i),
                            RecordOperation::Add,
                            Some(json!({ "level": level })),
                        )
                    })
                    .collect(),
            );

            let once = apply_records(&baseline, &records);
            let twice = apply_records(&BaselineSnapshot::capture(&once), &records);
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
