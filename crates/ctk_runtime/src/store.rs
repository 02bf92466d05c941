//! The durable collection of imported content packs.
//!
//! The store owns every imported pack (persisted identity, enabled flag,
//! content hash) and publishes a freshly merged context to subscribers on
//! every state change. Import never trusts the raw text: it is validated,
//! hashed, and stored in canonical form, keyed by `metadata.id`
//! (re-importing the same id updates the stored pack in place).
//!
//! Persistence failures degrade: the in-memory state stays authoritative
//! for the session and the outcome carries a warning that changes may not
//! survive a reload.

use crate::context::MergedContext;
use crate::error::Error;
use crate::storage::KeyValueStorage;
use chrono::{DateTime, Utc};
use ctk_pack::{content_hash, to_canonical_json, validate_text, ContentPack, PackMetadata};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Storage key the serialized pack index lives under.
pub const PACK_STORE_KEY: &str = "content-packs";

const STORE_SCHEMA_VERSION: u32 = 1;

/// One stored pack with its import bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackEntry {
    pub pack: ContentPack,
    pub enabled: bool,
    pub sha256: String,
    pub warnings: Vec<String>,
    pub imported_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

impl PackEntry {
    pub fn id(&self) -> &str {
        &self.pack.metadata.id
    }

    pub fn record_count(&self) -> usize {
        self.pack.record_count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredIndex {
    version: u32,
    packs: Vec<PackEntry>,
}

/// Aggregate counters shown in the pack manager UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackSummary {
    pub pack_count: usize,
    pub enabled_count: usize,
    pub record_count: usize,
}

/// One pack as rendered in the manager list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackOverview {
    pub id: String,
    pub name: String,
    pub version: String,
    pub license: String,
    pub enabled: bool,
    pub sha256: String,
    pub record_count: usize,
    pub warnings: Vec<String>,
}

/// Payload delivered to subscribers on every state change.
#[derive(Debug, Clone)]
pub struct PackUpdate {
    pub summary: PackSummary,
    pub packs: Vec<PackOverview>,
    pub context: MergedContext,
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Where the text came from (file name, drop target), for diagnostics.
    pub source_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub success: bool,
    pub pack_id: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportOutcome {
    pub success: bool,
    pub text: Option<String>,
    pub metadata: Option<PackMetadata>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MutateOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

type Subscriber = Arc<dyn Fn(&PackUpdate) + Send + Sync>;

pub struct PackStore {
    packs: Vec<PackEntry>,
    storage: Box<dyn KeyValueStorage>,
    subscribers: Vec<(Uuid, Subscriber)>,
}

impl PackStore {
    /// Load the persisted index through the storage adapter. A missing or
    /// unreadable index starts the session empty rather than failing.
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        let packs = match storage.get(PACK_STORE_KEY) {
            Ok(Some(text)) => match serde_json::from_str::<StoredIndex>(&text) {
                Ok(index) => index.packs,
                Err(e) => {
                    tracing::warn!("stored pack index is unreadable, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("pack storage unavailable, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            packs,
            storage,
            subscribers: Vec::new(),
        }
    }

    pub fn packs(&self) -> &[PackEntry] {
        &self.packs
    }

    pub fn get(&self, id: &str) -> Option<&PackEntry> {
        self.packs.iter().find(|entry| entry.id() == id)
    }

    /// Parse, validate, hash, and store a pack. Keyed by `metadata.id`:
    /// a re-import updates the stored pack and keeps its enabled flag;
    /// a first import is enabled by default.
    pub fn import_pack(&mut self, raw: &str, options: ImportOptions) -> ImportOutcome {
        let report = validate_text(raw);
        if !report.is_valid() {
            return ImportOutcome {
                success: false,
                pack_id: None,
                errors: report.errors,
                warnings: report.warnings,
            };
        }

        let pack: ContentPack = match serde_json::from_str(raw) {
            Ok(pack) => pack,
            Err(e) => {
                return ImportOutcome {
                    success: false,
                    errors: vec![format!("invalid pack document: {}", e)],
                    warnings: report.warnings,
                    ..Default::default()
                };
            }
        };

        let sha256 = match content_hash(&pack) {
            Ok(hash) => hash,
            Err(e) => {
                return ImportOutcome {
                    success: false,
                    errors: vec![format!("failed to hash pack: {}", e)],
                    warnings: report.warnings,
                    ..Default::default()
                };
            }
        };

        let pack_id = pack.metadata.id.clone();
        let mut warnings = report.warnings;

        match self.packs.iter_mut().find(|entry| entry.id() == pack_id) {
            Some(entry) => {
                tracing::info!(pack_id = %pack_id, "updating stored pack");
                entry.pack = pack;
                entry.sha256 = sha256;
                entry.warnings = warnings.clone();
                entry.source_name = options.source_name;
                entry.imported_at = Utc::now();
            }
            None => {
                tracing::info!(pack_id = %pack_id, "importing new pack");
                self.packs.push(PackEntry {
                    pack,
                    enabled: true,
                    sha256,
                    warnings: warnings.clone(),
                    imported_at: Utc::now(),
                    source_name: options.source_name,
                });
            }
        }

        self.persist(&mut warnings);
        self.publish();

        ImportOutcome {
            success: true,
            pack_id: Some(pack_id),
            errors: Vec::new(),
            warnings,
        }
    }

    /// Serialize a stored pack back to its canonical JSON text.
    pub fn export_pack(&self, id: &str, pretty: bool) -> ExportOutcome {
        let Some(entry) = self.get(id) else {
            return ExportOutcome {
                error: Some(Error::PackNotFound(id.to_string()).to_string()),
                ..Default::default()
            };
        };
        match to_canonical_json(&entry.pack, pretty) {
            Ok(text) => ExportOutcome {
                success: true,
                text: Some(text),
                metadata: Some(entry.pack.metadata.clone()),
                error: None,
            },
            Err(e) => ExportOutcome {
                error: Some(format!("failed to serialize pack: {}", e)),
                ..Default::default()
            },
        }
    }

    /// Flip a pack's enabled flag and republish. Newly enabled packs move
    /// to the end of the order, so the most recent enablement wins record
    /// conflicts.
    pub fn toggle_pack(&mut self, id: &str, enabled: bool) -> MutateOutcome {
        let Some(position) = self.packs.iter().position(|entry| entry.id() == id) else {
            return not_found(id);
        };

        if enabled && !self.packs[position].enabled {
            let mut entry = self.packs.remove(position);
            entry.enabled = true;
            self.packs.push(entry);
        } else {
            self.packs[position].enabled = enabled;
        }

        let mut outcome = MutateOutcome {
            success: true,
            ..Default::default()
        };
        self.persist(&mut outcome.warnings);
        self.publish();
        outcome
    }

    /// Delete a stored pack and republish.
    pub fn remove_pack(&mut self, id: &str) -> MutateOutcome {
        let Some(position) = self.packs.iter().position(|entry| entry.id() == id) else {
            return not_found(id);
        };
        self.packs.remove(position);

        let mut outcome = MutateOutcome {
            success: true,
            ..Default::default()
        };
        self.persist(&mut outcome.warnings);
        self.publish();
        outcome
    }

    /// Remove every pack and republish.
    pub fn clear_all(&mut self) -> MutateOutcome {
        self.packs.clear();

        let mut outcome = MutateOutcome {
            success: true,
            ..Default::default()
        };
        if let Err(e) = self.storage.remove(PACK_STORE_KEY) {
            tracing::warn!("failed to clear pack storage: {}", e);
            outcome
                .warnings
                .push(format!("pack changes may not survive a reload: {}", e));
        }
        self.publish();
        outcome
    }

    /// Register a listener for state changes. With `immediate`, it is
    /// invoked once synchronously with the current state.
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&PackUpdate) + Send + Sync + 'static,
        immediate: bool,
    ) -> Uuid {
        let token = Uuid::new_v4();
        let callback: Subscriber = Arc::new(callback);
        if immediate {
            callback(&self.current_update());
        }
        self.subscribers.push((token, callback));
        token
    }

    pub fn unsubscribe(&mut self, token: Uuid) {
        self.subscribers.retain(|(existing, _)| *existing != token);
    }

    /// The merged view over enabled packs only, in store order (which is
    /// enable order; see [`toggle_pack`](Self::toggle_pack)).
    pub fn merged_context(&self) -> MergedContext {
        let mut context = MergedContext::default();
        for entry in self.packs.iter().filter(|entry| entry.enabled) {
            for (content_type, ids) in &entry.pack.allowlist {
                context
                    .allowlist_additions
                    .entry(content_type.clone())
                    .or_default()
                    .extend(ids.iter().cloned());
            }
            for record in &entry.pack.records {
                context
                    .records_by_type
                    .entry(record.content_type.clone())
                    .or_default()
                    .push(record.clone());
            }
        }
        context
    }

    pub fn summary(&self) -> PackSummary {
        PackSummary {
            pack_count: self.packs.len(),
            enabled_count: self.packs.iter().filter(|entry| entry.enabled).count(),
            record_count: self.packs.iter().map(PackEntry::record_count).sum(),
        }
    }

    fn overviews(&self) -> Vec<PackOverview> {
        self.packs
            .iter()
            .map(|entry| PackOverview {
                id: entry.id().to_string(),
                name: entry.pack.metadata.name.clone(),
                version: entry.pack.metadata.version.clone(),
                license: entry.pack.metadata.license.clone(),
                enabled: entry.enabled,
                sha256: entry.sha256.clone(),
                record_count: entry.record_count(),
                warnings: entry.warnings.clone(),
            })
            .collect()
    }

    fn current_update(&self) -> PackUpdate {
        PackUpdate {
            summary: self.summary(),
            packs: self.overviews(),
            context: self.merged_context(),
        }
    }

    fn persist(&self, warnings: &mut Vec<String>) {
        let index = StoredIndex {
            version: STORE_SCHEMA_VERSION,
            packs: self.packs.clone(),
        };
        let result = serde_json::to_string_pretty(&index)
            .map_err(Error::from)
            .and_then(|text| self.storage.set(PACK_STORE_KEY, &text));
        if let Err(e) = result {
            tracing::warn!("failed to persist pack index: {}", e);
            warnings.push(format!("pack changes may not survive a reload: {}", e));
        }
    }

    fn publish(&self) {
        let update = self.current_update();
        for (_, subscriber) in &self.subscribers {
            subscriber(&update);
        }
    }
}

fn not_found(id: &str) -> MutateOutcome {
    MutateOutcome {
        success: false,
        error: Some(Error::PackNotFound(id.to_string()).to_string()),
        warnings: Vec::new(),
    }
}
