use anyhow::{Context, Result};
use companion_gear::{
    ItemId, OverrideStore, PresetCatalog, PresetSnapshot, Role, Slot, TIERS, capture_snapshot,
    commit_snapshot, effective_cost, effective_preset,
};

use super::ScenarioCtx;

fn every_pair() -> impl Iterator<Item = (Role, u8)> {
    Role::ALL
        .into_iter()
        .flat_map(|role| TIERS.into_iter().map(move |tier| (role, tier)))
}

fn effective_all(catalog: &PresetCatalog, store: &OverrideStore) -> Vec<Option<PresetSnapshot>> {
    every_pair()
        .map(|(role, tier)| effective_preset(catalog, store, role, tier))
        .collect()
}

/// Capture and commit every pair without touching the snapshot.
fn commit_every_pair(catalog: &PresetCatalog, store: &mut OverrideStore) -> Result<usize> {
    let mut written = 0;
    for (role, tier) in every_pair() {
        let Some(default) = catalog.lookup(role, tier) else {
            continue;
        };
        let snapshot = capture_snapshot(store, role, tier, default);
        let summary = commit_snapshot(store, role, tier, default, &snapshot)
            .with_context(|| format!("commit {role} tier {tier}"))?;
        written += summary.written.len();
    }
    Ok(written)
}

pub fn default_presets(ctx: &ScenarioCtx) -> Result<()> {
    let store = OverrideStore::new();
    for (role, tier, default) in ctx.catalog.entries() {
        let snapshot = capture_snapshot(&store, role, tier, default);
        anyhow::ensure!(
            snapshot == PresetSnapshot::from(default),
            "{role} tier {tier}: empty store should yield the catalog default"
        );
    }
    Ok(())
}

pub fn override_capture(ctx: &ScenarioCtx) -> Result<()> {
    for (role, tier, default) in ctx.catalog.entries() {
        for slot in Slot::EDITABLE {
            let mut store = ctx.overrides.clone();
            store.set_item(role, tier, slot, &ItemId::new("X"))?;
            let snapshot = capture_snapshot(&store, role, tier, default);
            anyhow::ensure!(
                snapshot.item(slot).map(ItemId::as_str) == Some("X"),
                "{role} tier {tier} {slot}: override missing from capture"
            );
        }
    }
    Ok(())
}

/// A commit round never changes what the player would buy, and a second
/// round finds nothing left to normalize.
pub fn no_op_commit(ctx: &ScenarioCtx) -> Result<()> {
    let mut seeded = OverrideStore::new();
    seeded.set_cost(Role::Lancer, 3, 1);
    seeded.set_item(Role::Infantry, 2, Slot::Cape, &ItemId::new("battania_cloak"))?;
    seeded.set_item(Role::Archer, 3, Slot::Horse, &ItemId::new("aserai_horse"))?;
    let before = seeded.clone();
    commit_every_pair(ctx.catalog, &mut seeded)?;
    anyhow::ensure!(seeded == before, "minimal store changed after an unedited commit");

    let mut store = ctx.overrides.clone();
    let effective_before = effective_all(ctx.catalog, &store);
    commit_every_pair(ctx.catalog, &mut store)?;
    anyhow::ensure!(
        effective_all(ctx.catalog, &store) == effective_before,
        "commit changed an effective preset"
    );

    let normalized = store.clone();
    commit_every_pair(ctx.catalog, &mut store)?;
    anyhow::ensure!(store == normalized, "second commit round changed the store");
    Ok(())
}

pub fn minimal_diff(ctx: &ScenarioCtx) -> Result<()> {
    let (role, tier) = (Role::Infantry, 1);
    let default = ctx
        .catalog
        .lookup(role, tier)
        .context("infantry tier 1 should exist")?;
    let default_body = default
        .item(Slot::Body)
        .cloned()
        .context("infantry tier 1 should have body armor")?;

    let mut store = OverrideStore::new();
    store.set_cost(role, tier, i64::from(default.cost) + 500);
    store.set_item(role, tier, Slot::Body, &ItemId::new("northern_padded_gambeson"))?;

    let mut snapshot = capture_snapshot(&store, role, tier, default);
    snapshot.cost = default.cost;
    snapshot.set_item(Slot::Body, default_body);
    let summary = commit_snapshot(&mut store, role, tier, default, &snapshot)?;

    anyhow::ensure!(summary.is_pristine(), "nothing should be written");
    anyhow::ensure!(summary.cleared.len() == 2, "cleared {:?}", summary.cleared);
    anyhow::ensure!(store.is_empty(), "store should be empty after reverting every edit");
    Ok(())
}

pub fn reset_all(_ctx: &ScenarioCtx) -> Result<()> {
    let mut store = OverrideStore::new();
    for (role, tier) in every_pair() {
        store.set_cost(role, tier, 7);
        store.set_item(role, tier, Slot::Head, &ItemId::new("leather_cap"))?;
        store.set_item(role, tier, Slot::Weapon3, &ItemId::new("vlandian_banner"))?;
    }

    let removed = store.reset_all(Role::Archer, 2);
    anyhow::ensure!(removed == 3, "expected 3 removed keys, got {removed}");
    for (role, tier) in every_pair() {
        let gone = role == Role::Archer && tier == 2;
        anyhow::ensure!(
            store.get_cost(role, tier).is_none() == gone,
            "{role} tier {tier}: cost override state is wrong"
        );
        for slot in [Slot::Head, Slot::Weapon3] {
            anyhow::ensure!(
                store.get_item(role, tier, slot).is_none() == gone,
                "{role} tier {tier} {slot}: item override state is wrong"
            );
        }
    }
    Ok(())
}

pub fn archer_cost(ctx: &ScenarioCtx) -> Result<()> {
    let default = ctx
        .catalog
        .lookup(Role::Archer, 1)
        .context("archer tier 1 should exist")?;

    let mut store = OverrideStore::new();
    store.set_cost(Role::Archer, 1, i64::from(default.cost) + 500);
    let mut snapshot = capture_snapshot(&store, Role::Archer, 1, default);
    anyhow::ensure!(
        snapshot.cost == default.cost + 500,
        "capture should show the overridden cost, got {}",
        snapshot.cost
    );

    snapshot.cost = default.cost;
    commit_snapshot(&mut store, Role::Archer, 1, default, &snapshot)?;
    anyhow::ensure!(
        store.get_cost(Role::Archer, 1).is_none(),
        "cost equal to default should clear the override"
    );
    anyhow::ensure!(
        effective_cost(ctx.catalog, &store, Role::Archer, 1) == Some(default.cost),
        "effective cost should fall back to the default"
    );
    Ok(())
}
