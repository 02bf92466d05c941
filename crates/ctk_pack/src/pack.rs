use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

fn serde_fmt<T: Serialize>(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let json = serde_json::to_string(value).map_err(|_| fmt::Error)?;
    let s: String = serde_json::from_str(&json).map_err(|_| fmt::Error)?;
    f.write_str(&s)
}

/// Content categories with governance data in the baseline ruleset.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum WellKnownContentType {
    Spell,
    Class,
    Subclass,
    Feat,
    Background,
    Race,
    Subrace,
    FightingStyle,
    PactBoon,
    EldritchInvocation,
    Metamagic,
    Beast,
    ClassResource,
    ClassEquipmentChoice,
    ClassEquipmentDefault,
    ClassStartingGold,
    ArtificerInfusion,
}

/// A content category tag, either a recognized category or a custom string.
///
/// The set is deliberately open-ended: packs may carry categories this
/// toolkit version doesn't know about. Unrecognized categories are never
/// gated (the allowlist store treats them as unrestricted), so a pack
/// written against a newer toolkit degrades gracefully.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    Known(WellKnownContentType),
    Custom(String),
}

impl ContentType {
    /// Whether this is a category the toolkit recognizes.
    pub fn is_recognized(&self) -> bool {
        matches!(self, ContentType::Known(_))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Known(tag) => serde_fmt(tag, f),
            ContentType::Custom(s) => f.write_str(s),
        }
    }
}

impl From<String> for ContentType {
    fn from(s: String) -> Self {
        serde_json::from_value(Value::String(s.clone()))
            .map(ContentType::Known)
            .unwrap_or(ContentType::Custom(s))
    }
}

impl From<&str> for ContentType {
    fn from(s: &str) -> Self {
        ContentType::from(s.to_string())
    }
}

impl From<WellKnownContentType> for ContentType {
    fn from(tag: WellKnownContentType) -> Self {
        ContentType::Known(tag)
    }
}

impl From<ContentType> for String {
    fn from(tag: ContentType) -> Self {
        tag.to_string()
    }
}

/// What a record does to the entity it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOperation {
    Add,
    Replace,
    Remove,
}

/// Freeform entity payload, kept as an open JSON map.
///
/// Pack authors describe entities in the toolkit's wire shape; the runtime
/// normalizes synonyms and derived fields when records are applied, not here.
pub type Payload = Map<String, Value>;

/// One change to the game data: add, replace, or remove an entity.
///
/// Records are idempotent when replayed in the same order; removing an
/// entity that doesn't exist is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackRecord {
    /// Content category of the target entity.
    #[serde(rename = "type")]
    pub content_type: ContentType,

    /// Entity identifier, scoped within the content type.
    ///
    /// Composite keys use colons: `Fighter:Echo Knight` for subclasses,
    /// `class-resource:Monk:Ki Points` for class resources.
    pub id: String,

    pub operation: RecordOperation,

    /// Entity body; required for add/replace, absent for remove.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

/// Pack identity and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackMetadata {
    /// Reverse-domain identifier, e.g. `com.example.homebrew-spells`.
    /// Storage identity: re-importing the same id updates the stored pack.
    pub id: String,

    /// Display name shown in the pack manager UI.
    pub name: String,

    /// Pack version, `MAJOR.MINOR.PATCH`.
    pub version: String,

    /// License the pack's content is distributed under.
    pub license: String,

    /// Toolkit version the pack was authored against, `MAJOR.MINOR.PATCH`.
    pub tool_version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

/// An externally authored content pack document.
///
/// Unknown top-level fields are ignored on import so that packs written for
/// newer toolkit versions still load (the validator reports them as
/// warnings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPack {
    pub metadata: PackMetadata,

    /// Identifiers this pack grants on top of the baseline allowlist,
    /// keyed by content type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub allowlist: BTreeMap<ContentType, Vec<String>>,

    /// Ordered entity changes; applied in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<PackRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ContentPack {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Trim an identifier, returning `None` for empty/whitespace-only input.
///
/// Entities without a usable identifier are never matched by the gate:
/// they are neither blocked nor filtered.
pub fn trimmed_id(id: &str) -> Option<&str> {
    let trimmed = id.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Split a colon-delimited composite identifier at the first colon.
///
/// `"Fighter:Echo Knight"` becomes `(Some("Fighter"), "Echo Knight")`;
/// an id without a colon has no scope part. Both parts are trimmed.
pub fn split_composite_id(id: &str) -> (Option<&str>, &str) {
    match id.split_once(':') {
        Some((scope, rest)) => (trimmed_id(scope), rest.trim()),
        None => (None, id.trim()),
    }
}
