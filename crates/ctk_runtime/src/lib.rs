//! SRD content gating and content pack runtime for the campaign toolkit.
//!
//! This crate keeps the toolkit's live game data legally clean by default
//! and privately extensible: only SRD-licensed content is shown unless the
//! user imports content packs of their own, and disabling a pack reverts
//! the world cleanly. It provides:
//!
//! - **Allowlist store**: per-type gates over entity identifiers, fail-open
//!   for ungoverned categories
//! - **Baseline snapshot**: the replay anchor captured before any pack
//!   applies, tolerant of late-loading rule data
//! - **Overlay merge engine**: deterministic rebuild of the live tables
//!   from baseline + enabled pack records
//! - **Pack store**: durable import/export/enable/disable/remove with a
//!   published merged context
//! - **Gating runtime**: the ordered cycle reconciling allowlist, tables,
//!   and registered UI nodes, with completion signaling
//!
//! # Example
//!
//! ```
//! use ctk_runtime::{
//!     BaselineGovernance, GatingRuntime, ImportOptions, LiveDataTables, MemoryStorage, PackStore,
//! };
//! use std::sync::{Arc, Mutex};
//!
//! let mut store = PackStore::new(Box::new(MemoryStorage::default()));
//! let runtime = Arc::new(Mutex::new(GatingRuntime::new(
//!     BaselineGovernance::default(),
//!     LiveDataTables::default(),
//! )));
//!
//! // Every pack-state change drives a gating cycle.
//! let sink = runtime.clone();
//! store.subscribe(move |update| sink.lock().unwrap().apply_update(update), true);
//!
//! let outcome = store.import_pack(
//!     r#"{
//!         "metadata": {
//!             "id": "com.example.hexes",
//!             "name": "Hexes",
//!             "version": "1.0.0",
//!             "license": "MIT",
//!             "toolVersion": "2.0.0"
//!         },
//!         "records": [
//!             { "type": "spell", "id": "Hex", "operation": "add", "payload": { "level": 1 } }
//!         ]
//!     }"#,
//!     ImportOptions::default(),
//! );
//! assert!(outcome.success);
//! assert_eq!(runtime.lock().unwrap().tables().spells.len(), 1);
//! ```

pub mod allowlist;
pub mod context;
pub mod error;
pub mod gating;
pub mod merge;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod tables;

// Re-export main types
pub use allowlist::{AllowlistStore, BaselineGovernance, Gate};
pub use context::{MergedContext, RecordsByType};
pub use error::{Error, Result};
pub use gating::{parse_blocked_when, GatedNode, GatingEvent, GatingRuntime, Visibility};
pub use snapshot::BaselineSnapshot;
pub use storage::{FsStorage, KeyValueStorage, MemoryStorage};
pub use store::{
    ExportOutcome, ImportOptions, ImportOutcome, MutateOutcome, PackEntry, PackOverview,
    PackStore, PackSummary, PackUpdate, PACK_STORE_KEY,
};
pub use tables::{Entity, LiveDataTables, SubclassGroup};
