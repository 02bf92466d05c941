//! Gating synchronization: the cycle that keeps the allowlist, the live
//! tables, and registered UI nodes consistent with the enabled packs.
//!
//! # Cycle algorithm
//!
//! Each pack-state change runs one strictly ordered cycle:
//!
//! 1. Reset the allowlist store to its baseline governance data.
//! 2. Merge in the enabled packs' grants: explicit allowlist additions
//!    plus the allowances implied by their add/replace records.
//! 3. Restore the live tables from the baseline snapshot (recapturing it
//!    first if it was taken before rule data finished loading) and apply
//!    the enabled records.
//! 4. Prune the rebuilt tables against the merged allowlist, then
//!    recompute the class-derived sub-resource grants from the surviving
//!    class ids.
//! 5. Swap the rebuilt tables in as the live state in one assignment, so
//!    no reader observes a half-updated table set.
//! 6. Re-evaluate every registered gated node and emit
//!    [`GatingEvent::SrdFiltered`]; consumers must wait for it before
//!    reading the live tables.
//!
//! Cycles are serialized by a busy flag: a cycle requested while one is in
//! flight is queued and runs afterwards. Each cycle recomputes from
//! scratch, so the latest queued context fully supersedes older ones.
//!
//! Gated nodes are an explicit registry rather than a DOM observer: hosts
//! register each conditionally-visible element with its `blockedWhen`
//! requirement list, and newly registered nodes are evaluated against the
//! current allowlist before they are first shown.

use crate::allowlist::{AllowlistStore, BaselineGovernance};
use crate::context::MergedContext;
use crate::merge;
use crate::snapshot::BaselineSnapshot;
use crate::store::PackUpdate;
use crate::tables::{spell_title, LiveDataTables};
use ctk_pack::{ContentType, WellKnownContentType};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Visibility state of a gated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// A markup node registered for conditional visibility.
///
/// The node is hidden the moment *any* requirement is disallowed and
/// restored when all requirements are allowed again. Hiding a choice-style
/// control also clears its selection and emits a change notification.
#[derive(Debug, Clone)]
pub struct GatedNode {
    pub id: String,
    pub requirements: Vec<(ContentType, String)>,
    pub visibility: Visibility,
    pub is_choice: bool,
    pub selection: Option<String>,
}

/// Signals produced by the gating runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum GatingEvent {
    /// A pack-state change is being applied; carries the merged allowlist
    /// grants and the context. Tables are not yet consistent; wait for
    /// [`GatingEvent::SrdFiltered`] before reading them.
    PacksApplied {
        allowlist: BTreeMap<ContentType, Vec<String>>,
        context: MergedContext,
    },
    /// A choice control lost its selection because a requirement became
    /// disallowed.
    SelectionCleared { node_id: String },
    /// The cycle finished: allowlist, tables, and nodes are consistent.
    SrdFiltered,
}

type EventCallback = Arc<dyn Fn(&GatingEvent) + Send + Sync>;

/// Parse a `blockedWhen` declaration: a comma-separated list of `type:id`
/// requirement pairs. Malformed entries (no colon, empty type) degrade to
/// no requirement rather than erroring.
pub fn parse_blocked_when(declaration: &str) -> Vec<(ContentType, String)> {
    declaration
        .split(',')
        .filter_map(|requirement| {
            let (content_type, id) = requirement.trim().split_once(':')?;
            let content_type = content_type.trim();
            if content_type.is_empty() {
                return None;
            }
            Some((ContentType::from(content_type), id.trim().to_string()))
        })
        .collect()
}

pub struct GatingRuntime {
    allowlist: AllowlistStore,
    live: LiveDataTables,
    baseline: BaselineSnapshot,
    nodes: Vec<GatedNode>,
    listeners: Vec<(Uuid, EventCallback)>,
    busy: bool,
    pending: Option<MergedContext>,
}

impl GatingRuntime {
    /// Build the runtime over the baseline governance artifact and the
    /// factory rule data. The factory tables may still be empty if rule
    /// data loads asynchronously; the baseline snapshot recaptures on the
    /// first cycle after real data appears.
    pub fn new(governance: BaselineGovernance, factory: LiveDataTables) -> Self {
        let baseline = BaselineSnapshot::capture(&factory);
        Self {
            allowlist: AllowlistStore::new(governance),
            live: factory,
            baseline,
            nodes: Vec::new(),
            listeners: Vec::new(),
            busy: false,
            pending: None,
        }
    }

    /// Replace the live tables with freshly loaded factory data. This is
    /// the one sanctioned write path outside the cycle, for the host that
    /// finishes loading rule data after the runtime initialized.
    pub fn load_tables(&mut self, tables: LiveDataTables) {
        self.live = tables;
    }

    /// Current consistent view of the rule data.
    pub fn tables(&self) -> &LiveDataTables {
        &self.live
    }

    pub fn allowlist(&self) -> &AllowlistStore {
        &self.allowlist
    }

    pub fn node(&self, id: &str) -> Option<&GatedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Register a conditionally-visible node. It is evaluated against the
    /// current allowlist immediately, before it is ever shown.
    pub fn register_node(
        &mut self,
        id: impl Into<String>,
        blocked_when: &str,
        is_choice: bool,
        selection: Option<String>,
    ) {
        self.nodes.push(GatedNode {
            id: id.into(),
            requirements: parse_blocked_when(blocked_when),
            visibility: Visibility::Visible,
            is_choice,
            selection,
        });
        let index = self.nodes.len() - 1;
        let events = self.evaluate_nodes(index..self.nodes.len());
        self.emit_all(events);
    }

    pub fn remove_node(&mut self, id: &str) {
        self.nodes.retain(|node| node.id != id);
    }

    /// Record a user selection on a choice node. Ignored while the node is
    /// hidden.
    pub fn select(&mut self, node_id: &str, value: impl Into<String>) {
        if let Some(node) = self
            .nodes
            .iter_mut()
            .find(|node| node.id == node_id && node.visibility == Visibility::Visible)
        {
            node.selection = Some(value.into());
        }
    }

    /// Re-evaluate every registered node against the current allowlist.
    pub fn sync_nodes(&mut self) {
        let events = self.evaluate_nodes(0..self.nodes.len());
        self.emit_all(events);
    }

    /// Listen for gating signals.
    pub fn subscribe(&mut self, callback: impl Fn(&GatingEvent) + Send + Sync + 'static) -> Uuid {
        let token = Uuid::new_v4();
        self.listeners.push((token, Arc::new(callback)));
        token
    }

    pub fn unsubscribe(&mut self, token: Uuid) {
        self.listeners.retain(|(existing, _)| *existing != token);
    }

    /// Convenience wiring for pack store subscribers.
    pub fn apply_update(&mut self, update: &PackUpdate) {
        self.apply_cycle(&update.context);
    }

    /// Run one gating cycle for the given merged context. Re-entrant calls
    /// are queued and run after the in-flight cycle; the queued context is
    /// replaced by newer ones (latest wins).
    pub fn apply_cycle(&mut self, context: &MergedContext) {
        if self.busy {
            tracing::debug!("gating cycle already in flight, queueing");
            self.pending = Some(context.clone());
            return;
        }

        self.busy = true;
        let mut next = Some(context.clone());
        while let Some(context) = next.take() {
            self.run_cycle(&context);
            next = self.pending.take();
        }
        self.busy = false;
    }

    fn run_cycle(&mut self, context: &MergedContext) {
        tracing::debug!(records = context.record_count(), "running gating cycle");

        self.allowlist.reset_to_baseline();
        let additions = merge::collect_allowlist_additions(context);
        self.allowlist.merge_additions(&additions);
        self.emit(&GatingEvent::PacksApplied {
            allowlist: additions,
            context: context.clone(),
        });

        self.baseline.get_or_refresh(&self.live);
        let mut rebuilt = merge::apply_records(&self.baseline, &context.records_by_type);

        prune_tables(&self.allowlist, &mut rebuilt);

        let derived = merge::derived_allowances_for(rebuilt.classes.keys());
        self.allowlist.merge_additions(&derived);

        // Single assignment: readers never see a half-updated table set.
        self.live = rebuilt;

        let events = self.evaluate_nodes(0..self.nodes.len());
        self.emit_all(events);
        self.emit(&GatingEvent::SrdFiltered);
    }

    fn evaluate_nodes(&mut self, range: std::ops::Range<usize>) -> Vec<GatingEvent> {
        let mut events = Vec::new();
        let allowlist = &self.allowlist;
        for node in &mut self.nodes[range] {
            let allowed = node
                .requirements
                .iter()
                .all(|(content_type, id)| allowlist.is_allowed(content_type, id));

            if allowed {
                node.visibility = Visibility::Visible;
            } else {
                node.visibility = Visibility::Hidden;
                if node.is_choice && node.selection.take().is_some() {
                    events.push(GatingEvent::SelectionCleared {
                        node_id: node.id.clone(),
                    });
                }
            }
        }
        events
    }

    fn emit(&self, event: &GatingEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    fn emit_all(&self, events: Vec<GatingEvent>) {
        for event in &events {
            self.emit(event);
        }
    }
}

/// Delete disallowed entries from the rebuilt tables. Subclass options
/// gate on their `Class:Name` composite key; the class-keyed tables
/// (subclass groups, equipment rows) follow the class gate.
fn prune_tables(allowlist: &AllowlistStore, tables: &mut LiveDataTables) {
    let spell = ContentType::Known(WellKnownContentType::Spell);
    let class = ContentType::Known(WellKnownContentType::Class);
    let subclass = ContentType::Known(WellKnownContentType::Subclass);
    let feat = ContentType::Known(WellKnownContentType::Feat);
    let background = ContentType::Known(WellKnownContentType::Background);

    allowlist.filter_vec(&spell, &mut tables.spells, |entity| {
        spell_title(entity).map(String::from)
    });
    allowlist.filter_map(&class, &mut tables.classes, |name, _| {
        Some(name.to_string())
    });
    allowlist.filter_map(&class, &mut tables.subclasses, |name, _| {
        Some(name.to_string())
    });
    if allowlist.is_governed(&subclass) {
        for (class_name, group) in tables.subclasses.iter_mut() {
            group
                .options
                .retain(|name, _| allowlist.is_allowed(&subclass, &format!("{}:{}", class_name, name)));
        }
    }
    allowlist.filter_map(&feat, &mut tables.feats, |name, _| Some(name.to_string()));
    allowlist.filter_map(&background, &mut tables.backgrounds, |name, _| {
        Some(name.to_string())
    });
    allowlist.filter_map(&class, &mut tables.equipment_choices, |name, _| {
        Some(name.to_string())
    });
    allowlist.filter_map(&class, &mut tables.default_equipment, |name, _| {
        Some(name.to_string())
    });
}
