//! Merge defaults with overrides, and reduce edited snapshots back to minimal overrides.
//!
//! Nothing here is cached: every call recomputes the effective preset from the
//! catalog and the override store.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::gear::{ItemId, Role, Slot, Tier};
use crate::overrides::{OverrideError, OverrideKey, OverrideStore};
use crate::preset::{Preset, PresetCatalog};

/// Effective preset or in-session working copy for one (role, tier).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSnapshot {
    pub cost: u32,
    pub slots: BTreeMap<Slot, ItemId>,
}

impl PresetSnapshot {
    #[must_use]
    pub fn item(&self, slot: Slot) -> Option<&ItemId> {
        self.slots.get(&slot)
    }

    /// Replace the item in a slot, returning the previous one.
    pub fn set_item(&mut self, slot: Slot, id: ItemId) -> Option<ItemId> {
        self.slots.insert(slot, id)
    }

    /// Human-readable slot listing used by the editor menu.
    #[must_use]
    pub fn slot_summary(&self) -> String {
        if self.slots.is_empty() {
            return "Slots: (none)\n".to_string();
        }
        let mut lines = String::from("Slots:\n");
        for (slot, id) in &self.slots {
            lines.push_str(&format!(" - {slot}: {id}\n"));
        }
        lines
    }
}

impl From<&Preset> for PresetSnapshot {
    fn from(preset: &Preset) -> Self {
        Self {
            cost: preset.cost,
            slots: preset.slots.clone(),
        }
    }
}

/// Keys touched by a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub written: Vec<OverrideKey>,
    pub cleared: Vec<OverrideKey>,
}

impl CommitSummary {
    /// True when the snapshot matched the defaults exactly.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.written.is_empty()
    }
}

/// Materialize the effective preset for (role, tier) on top of `default`.
///
/// Every default slot takes its non-empty override if one exists. Overrides for
/// slots the default leaves out are user-introduced slots and are included too.
#[must_use]
pub fn capture_snapshot(
    store: &OverrideStore,
    role: Role,
    tier: Tier,
    default: &Preset,
) -> PresetSnapshot {
    let mut snapshot = PresetSnapshot::from(default);
    for (slot, id) in store.items_for(role, tier) {
        if id.trim().is_empty() {
            continue;
        }
        snapshot.slots.insert(slot, ItemId::new(id));
    }
    if let Some(cost) = store.get_cost(role, tier) {
        snapshot.cost = cost;
    }
    snapshot
}

/// Reduce `snapshot` to the minimal override set relative to `default`.
///
/// Fields equal to their default are cleared, differing fields are written, and
/// slots with no default are always written. A user-introduced slot that was
/// dropped from the snapshot has its override cleared. Default slots missing
/// from the snapshot are left alone.
///
/// # Errors
///
/// Returns [`OverrideError::EmptyItemId`] if any snapshot slot is blank; the
/// store is not modified in that case.
pub fn commit_snapshot(
    store: &mut OverrideStore,
    role: Role,
    tier: Tier,
    default: &Preset,
    snapshot: &PresetSnapshot,
) -> Result<CommitSummary, OverrideError> {
    if let Some((slot, _)) = snapshot.slots.iter().find(|(_, id)| id.is_blank()) {
        return Err(OverrideError::EmptyItemId {
            role,
            tier,
            slot: *slot,
        });
    }

    let mut summary = CommitSummary::default();
    let cost_key = OverrideKey::cost(role, tier);
    if snapshot.cost == default.cost {
        if store.clear_cost(role, tier) {
            summary.cleared.push(cost_key);
        }
    } else {
        store.set_cost(role, tier, i64::from(snapshot.cost));
        summary.written.push(cost_key);
    }

    for (slot, id) in &snapshot.slots {
        let key = OverrideKey::item(role, tier, *slot);
        match default.item(*slot) {
            Some(default_id) if default_id.as_str() == id.as_str() => {
                if store.clear_item(role, tier, *slot) {
                    summary.cleared.push(key);
                }
            }
            _ => {
                store.set_item(role, tier, *slot, id)?;
                summary.written.push(key);
            }
        }
    }

    let orphaned: Vec<Slot> = store
        .items_for(role, tier)
        .map(|(slot, _)| slot)
        .filter(|slot| default.item(*slot).is_none() && !snapshot.slots.contains_key(slot))
        .collect();
    for slot in orphaned {
        store.clear_item(role, tier, slot);
        summary.cleared.push(OverrideKey::item(role, tier, slot));
    }

    log::debug!(
        "committed {role} tier {tier}: {} written, {} cleared",
        summary.written.len(),
        summary.cleared.len()
    );
    Ok(summary)
}

/// Effective preset for (role, tier), or `None` when the catalog has no entry.
#[must_use]
pub fn effective_preset(
    catalog: &PresetCatalog,
    store: &OverrideStore,
    role: Role,
    tier: Tier,
) -> Option<PresetSnapshot> {
    catalog
        .lookup(role, tier)
        .map(|default| capture_snapshot(store, role, tier, default))
}

/// Effective cost for (role, tier), or `None` when the catalog has no entry.
#[must_use]
pub fn effective_cost(
    catalog: &PresetCatalog,
    store: &OverrideStore,
    role: Role,
    tier: Tier,
) -> Option<u32> {
    catalog
        .lookup(role, tier)
        .map(|default| store.get_cost(role, tier).unwrap_or(default.cost))
}
