//! Dry validation of candidate pack documents.
//!
//! The validator works on raw JSON values rather than the typed model so it
//! can report every problem in one pass: a bad record at index 2 doesn't
//! hide a bad record at index 5, and a malformed `allowlist` doesn't stop
//! metadata checks. Nothing here touches storage or the live game tables.

use crate::pack::{trimmed_id, ContentType};
use serde_json::Value;

const KNOWN_TOP_LEVEL_FIELDS: [&str; 4] = ["metadata", "allowlist", "records", "notes"];
const REQUIRED_METADATA_FIELDS: [&str; 5] = ["id", "name", "version", "license", "toolVersion"];

/// Itemized validation report. A pack is importable when `errors` is empty;
/// warnings never block an import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl PackValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate raw pack text. A JSON parse failure becomes a single error;
/// the parse exception never escapes.
pub fn validate_text(raw: &str) -> PackValidation {
    match serde_json::from_str::<Value>(raw) {
        Ok(doc) => validate_value(&doc),
        Err(e) => PackValidation {
            errors: vec![format!("invalid JSON: {}", e)],
            warnings: Vec::new(),
        },
    }
}

/// Validate a parsed pack document.
pub fn validate_value(doc: &Value) -> PackValidation {
    let mut report = PackValidation::default();

    let Some(root) = doc.as_object() else {
        report.errors.push("pack document must be an object".to_string());
        return report;
    };

    for field in root.keys() {
        if !KNOWN_TOP_LEVEL_FIELDS.contains(&field.as_str()) {
            report
                .warnings
                .push(format!("unrecognized field `{}` ignored", field));
        }
    }

    validate_metadata(root.get("metadata"), &mut report);

    if let Some(allowlist) = root.get("allowlist") {
        validate_allowlist(allowlist, &mut report);
    }

    if let Some(records) = root.get("records") {
        match records.as_array() {
            Some(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    validate_record(index, entry, &mut report);
                }
            }
            None => report.errors.push("records must be an array".to_string()),
        }
    }

    report
}

fn validate_metadata(metadata: Option<&Value>, report: &mut PackValidation) {
    let Some(metadata) = metadata else {
        report.errors.push("metadata is required".to_string());
        return;
    };
    let Some(fields) = metadata.as_object() else {
        report.errors.push("metadata must be an object".to_string());
        return;
    };

    for field in REQUIRED_METADATA_FIELDS {
        let present = fields
            .get(field)
            .and_then(Value::as_str)
            .and_then(trimmed_id)
            .is_some();
        if !present {
            report
                .errors
                .push(format!("metadata.{} is required", field));
        }
    }

    if let Some(id) = fields.get("id").and_then(Value::as_str).and_then(trimmed_id) {
        if !is_reverse_domain_id(id) {
            report.errors.push(format!(
                "metadata.id `{}` must be a reverse-domain identifier \
                 (lowercase alphanumerics, `.`, `_`, `-`)",
                id
            ));
        }
    }

    for field in ["version", "toolVersion"] {
        if let Some(version) = fields
            .get(field)
            .and_then(Value::as_str)
            .and_then(trimmed_id)
        {
            if !is_release_version(version) {
                report.errors.push(format!(
                    "metadata.{} `{}` must be MAJOR.MINOR.PATCH",
                    field, version
                ));
            }
        }
    }
}

fn validate_allowlist(allowlist: &Value, report: &mut PackValidation) {
    let Some(entries) = allowlist.as_object() else {
        report
            .errors
            .push("allowlist must be an object mapping content types to id arrays".to_string());
        return;
    };

    for (content_type, ids) in entries {
        let Some(ids) = ids.as_array() else {
            report.errors.push(format!(
                "allowlist.{} must be an array of identifiers",
                content_type
            ));
            continue;
        };
        for id in ids {
            let usable = id.as_str().and_then(trimmed_id).is_some();
            if !usable {
                report.errors.push(format!(
                    "allowlist.{} entries must be non-empty strings",
                    content_type
                ));
                break;
            }
        }
    }
}

fn validate_record(index: usize, record: &Value, report: &mut PackValidation) {
    let Some(fields) = record.as_object() else {
        report
            .errors
            .push(format!("records[{}] must be an object", index));
        return;
    };

    match fields.get("type").and_then(Value::as_str).and_then(trimmed_id) {
        Some(raw) => {
            if !ContentType::from(raw).is_recognized() {
                report.errors.push(format!(
                    "records[{}].type `{}` is not a recognized content type",
                    index, raw
                ));
            }
        }
        None => report
            .errors
            .push(format!("records[{}].type is required", index)),
    }

    if fields
        .get("id")
        .and_then(Value::as_str)
        .and_then(trimmed_id)
        .is_none()
    {
        report
            .errors
            .push(format!("records[{}].id is required", index));
    }

    let operation = fields
        .get("operation")
        .and_then(Value::as_str)
        .and_then(trimmed_id);
    match operation {
        Some("add") | Some("replace") => {
            match fields.get("payload") {
                Some(payload) if payload.is_object() => {}
                Some(_) => report
                    .errors
                    .push(format!("records[{}].payload must be an object", index)),
                None => report.errors.push(format!(
                    "records[{}].payload is required for add/replace",
                    index
                )),
            }
        }
        Some("remove") => {
            if fields.contains_key("payload") {
                report
                    .warnings
                    .push(format!("records[{}].payload is ignored for remove", index));
            }
        }
        Some(other) => report.errors.push(format!(
            "records[{}].operation `{}` must be one of add, replace, remove",
            index, other
        )),
        None => report
            .errors
            .push(format!("records[{}].operation is required", index)),
    }
}

/// Reverse-domain identifier grammar: dot-separated segments of lowercase
/// alphanumerics, `_`, and `-`, with no segment empty and no segment
/// starting or ending with a separator character.
fn is_reverse_domain_id(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
                && !segment.starts_with(['-', '_'])
                && !segment.ends_with(['-', '_'])
        })
}

/// Exactly `MAJOR.MINOR.PATCH`: a semver release with no pre-release or
/// build suffix.
fn is_release_version(s: &str) -> bool {
    match semver::Version::parse(s) {
        Ok(version) => version.pre.is_empty() && version.build.is_empty(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_metadata() -> Value {
        json!({
            "id": "com.example.test-pack",
            "name": "Test Pack",
            "version": "1.0.0",
            "license": "MIT",
            "toolVersion": "2.0.0"
        })
    }

    #[test]
    fn test_missing_metadata_is_the_only_error() {
        let report = validate_value(&json!({ "records": [] }));
        assert_eq!(report.errors, vec!["metadata is required".to_string()]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_bad_id_reports_reverse_domain_without_version_error() {
        let report = validate_value(&json!({
            "metadata": {
                "id": "Bad ID With Spaces",
                "name": "X",
                "version": "1.0.0",
                "license": "MIT",
                "toolVersion": "2.0.0"
            }
        }));

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("reverse-domain"));
        assert!(!report.errors.iter().any(|e| e.contains("MAJOR.MINOR.PATCH")));
    }

    #[test]
    fn test_valid_pack_passes() {
        let report = validate_value(&json!({
            "metadata": valid_metadata(),
            "allowlist": { "spell": ["Hex"] },
            "records": [
                { "type": "spell", "id": "Hex", "operation": "add", "payload": {} },
                { "type": "spell", "id": "Bane", "operation": "remove" }
            ],
            "notes": "n"
        }));

        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_invalid_json_is_one_error() {
        let report = validate_text("{ not json");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("invalid JSON"));
    }

    #[test]
    fn test_prerelease_version_rejected() {
        let mut metadata = valid_metadata();
        metadata["version"] = json!("1.0.0-beta.1");
        let report = validate_value(&json!({ "metadata": metadata }));

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("metadata.version"));
    }

    #[test]
    fn test_record_errors_are_indexed_and_independent() {
        let report = validate_value(&json!({
            "metadata": valid_metadata(),
            "records": [
                { "type": "spell", "id": "Hex", "operation": "add", "payload": {} },
                { "type": "spell", "operation": "add", "payload": {} },
                { "type": "gadget", "id": "Widget", "operation": "add", "payload": {} },
                { "type": "spell", "id": "Hex", "operation": "upsert", "payload": {} }
            ]
        }));

        assert!(report.errors.contains(&"records[1].id is required".to_string()));
        assert!(report
            .errors
            .iter()
            .any(|e| e.starts_with("records[2].type") && e.contains("gadget")));
        assert!(report
            .errors
            .iter()
            .any(|e| e.starts_with("records[3].operation")));
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn test_payload_required_for_add() {
        let report = validate_value(&json!({
            "metadata": valid_metadata(),
            "records": [{ "type": "spell", "id": "Hex", "operation": "add" }]
        }));

        assert_eq!(
            report.errors,
            vec!["records[0].payload is required for add/replace".to_string()]
        );
    }

    #[test]
    fn test_payload_on_remove_is_tolerated_with_warning() {
        let report = validate_value(&json!({
            "metadata": valid_metadata(),
            "records": [{ "type": "spell", "id": "Hex", "operation": "remove", "payload": {} }]
        }));

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("records[0].payload"));
    }

    #[test]
    fn test_allowlist_must_be_object_of_string_arrays() {
        let report = validate_value(&json!({
            "metadata": valid_metadata(),
            "allowlist": ["spell"]
        }));
        assert!(report.errors.iter().any(|e| e.starts_with("allowlist must be")));

        let report = validate_value(&json!({
            "metadata": valid_metadata(),
            "allowlist": { "spell": ["Hex", ""] }
        }));
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("allowlist.spell entries")));
    }

    #[test]
    fn test_unknown_top_level_field_warns() {
        let report = validate_value(&json!({
            "metadata": valid_metadata(),
            "futureField": true
        }));

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("futureField"));
    }

    proptest::proptest! {
        #[test]
        fn test_generated_reverse_domain_ids_accepted(
            id in "[a-z0-9][a-z0-9_-]{0,6}[a-z0-9](\\.[a-z0-9][a-z0-9_-]{0,6}[a-z0-9]){0,3}"
        ) {
            proptest::prop_assert!(is_reverse_domain_id(&id));
        }

        #[test]
        fn test_release_versions_accepted(major in 0u32..100, minor in 0u32..100, patch in 0u32..100) {
            proptest::prop_assert!(is_release_version(&format!("{}.{}.{}", major, minor, patch)));
        }
    }

    #[test]
    fn test_reverse_domain_grammar() {
        assert!(is_reverse_domain_id("com.example.my-pack"));
        assert!(is_reverse_domain_id("pack_1"));
        assert!(!is_reverse_domain_id(""));
        assert!(!is_reverse_domain_id("com..example"));
        assert!(!is_reverse_domain_id(".example"));
        assert!(!is_reverse_domain_id("com.-example"));
        assert!(!is_reverse_domain_id("com.example-"));
        assert!(!is_reverse_domain_id("Com.Example"));
        assert!(!is_reverse_domain_id("has space"));
    }
}
