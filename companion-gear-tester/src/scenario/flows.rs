use anyhow::{Context, Result};
use companion_gear::sandbox::{MemoryCompanion, MemoryHost, ScreenAction};
use companion_gear::{
    Companion, DialogStep, EditorContext, EditorState, EquipmentKind, EquippedItem, ItemId,
    ItemRoster, OverrideStore, PlayerOutfit, PresetEditor, Role, Slot, SlotCategory, Treasury,
    UpgradeDialog, UpgradeError, apply_upgrade, effective_cost,
};

use super::ScenarioCtx;

fn veteran() -> MemoryCompanion {
    MemoryCompanion::recruited("Ira")
        .wearing(Slot::Head, EquippedItem::new("leather_cap"))
        .wearing(Slot::Horse, EquippedItem::new("sumpter_horse"))
}

pub fn insufficient_gold(ctx: &ScenarioCtx) -> Result<()> {
    let store = OverrideStore::new();
    let cost = effective_cost(ctx.catalog, &store, Role::Archer, 1)
        .context("archer tier 1 should exist")?;
    anyhow::ensure!(cost > 0, "archer tier 1 should not be free");

    let mut host = MemoryHost::stocked(cost - 1);
    let mut target = veteran();
    let before = target.clone();
    match apply_upgrade(ctx.catalog, &store, &mut host, &mut target, Role::Archer, 1) {
        Err(UpgradeError::InsufficientFunds { .. }) => {}
        Err(other) => anyhow::bail!("expected insufficient funds, got {other}"),
        Ok(receipt) => anyhow::bail!("purchase went through for {} gold", receipt.cost),
    }
    anyhow::ensure!(host.gold() == cost - 1, "gold changed to {}", host.gold());
    anyhow::ensure!(target == before, "target equipment changed");
    anyhow::ensure!(host.held("leather_cap") == 0, "old gear moved to the roster");
    Ok(())
}

pub fn unknown_item(ctx: &ScenarioCtx) -> Result<()> {
    let mut store = OverrideStore::new();
    store.set_item(Role::Archer, 1, Slot::Leg, &ItemId::new("zzz_nonexistent"))?;
    let mut host = MemoryHost::stocked(100_000);
    let mut target = veteran();
    let before = target.clone();

    let err = apply_upgrade(ctx.catalog, &store, &mut host, &mut target, Role::Archer, 1)
        .err()
        .context("purchase with an unknown item should fail")?;
    let missing_leg = matches!(
        &err,
        UpgradeError::ItemNotFound { slot: Slot::Leg, item_id } if item_id == "zzz_nonexistent"
    );
    anyhow::ensure!(missing_leg, "unexpected error: {err}");
    anyhow::ensure!(host.gold() == 100_000, "gold was charged");
    anyhow::ensure!(target == before, "target equipment changed");
    Ok(())
}

pub fn editor_session(ctx: &ScenarioCtx) -> Result<()> {
    let mut store = OverrideStore::new();
    let mut host = MemoryHost::stocked(0);
    let mut editor = PresetEditor::new();
    let mut session = EditorContext::new(ctx.catalog, &mut store, &mut host);

    editor.choose_role(Role::Archer)?;
    editor.choose_tier(&mut session, 1)?;
    editor.open_cost_prompt()?;
    editor.submit_price(&mut session, "4500")?;
    editor.open_category(SlotCategory::Horse)?;
    editor.enter_item_id(&mut session, Slot::Horse, "aserai_horse")?;
    anyhow::ensure!(session.store.is_empty(), "edits leaked before save");
    editor.back()?;
    let summary = editor.save(&mut session)?;
    anyhow::ensure!(summary.written.len() == 2, "wrote {:?}", summary.written);
    anyhow::ensure!(
        editor.state() == EditorState::TierSelect { role: Role::Archer },
        "save should return to the tier menu, at {}",
        editor.state().name()
    );

    let saved = session.store.clone();
    editor.choose_tier(&mut session, 1)?;
    editor.open_cost_prompt()?;
    editor.submit_price(&mut session, "1")?;
    editor.back()?;
    editor.discard()?;
    anyhow::ensure!(*session.store == saved, "discard modified the store");

    anyhow::ensure!(store.get_cost(Role::Archer, 1) == Some(4500), "cost not saved");
    anyhow::ensure!(
        store.get_item(Role::Archer, 1, Slot::Horse) == Some("aserai_horse"),
        "horse not saved"
    );
    anyhow::ensure!(
        host.messages().iter().any(|m| m == "[CGU] Preset saved."),
        "save was not announced"
    );
    Ok(())
}

pub fn picker_rollback(ctx: &ScenarioCtx) -> Result<()> {
    let mut store = OverrideStore::new();
    let mut host = MemoryHost::stocked(0);
    host.hold("default_arrows", 12);
    host.equip_player(EquipmentKind::Battle, Slot::Weapon0, EquippedItem::new("noble_bow"));
    host.script_screen(vec![ScreenAction::Take {
        item: ItemId::new("sturgian_crossbow"),
    }]);
    let roster_before = host.counts();
    let battle_before = host.equipment(EquipmentKind::Battle);
    let civilian_before = host.equipment(EquipmentKind::Civilian);

    let mut editor = PresetEditor::new();
    let mut session = EditorContext::new(ctx.catalog, &mut store, &mut host);
    editor.choose_role(Role::Archer)?;
    editor.choose_tier(&mut session, 1)?;
    editor.open_category(SlotCategory::Weapon)?;
    let outcome = editor.pick_slot(&mut session, Slot::Weapon3)?;
    anyhow::ensure!(
        outcome.selected.as_ref().map(ItemId::as_str) == Some("sturgian_crossbow"),
        "picked {:?}",
        outcome.selected
    );
    anyhow::ensure!(
        outcome.rollback_warnings.is_empty(),
        "rollback warnings: {:?}",
        outcome.rollback_warnings
    );
    let working = editor.working().context("edit menu should hold a snapshot")?;
    anyhow::ensure!(
        working.item(Slot::Weapon3).map(ItemId::as_str) == Some("sturgian_crossbow"),
        "pick did not land in the snapshot"
    );

    anyhow::ensure!(host.counts() == roster_before, "roster changed");
    anyhow::ensure!(
        host.equipment(EquipmentKind::Battle) == battle_before,
        "battle equipment changed"
    );
    anyhow::ensure!(
        host.equipment(EquipmentKind::Civilian) == civilian_before,
        "civilian equipment changed"
    );
    anyhow::ensure!(store.is_empty(), "picking wrote overrides");
    Ok(())
}

pub fn companion_dialog(ctx: &ScenarioCtx) -> Result<()> {
    let mut target = MemoryCompanion::recruited("Ira");
    let mut dialog = UpgradeDialog::open(&target).context("dialog should open for a companion")?;
    dialog.choose_role(Role::Lancer)?;

    let options = dialog.tier_options(ctx.catalog, &ctx.overrides);
    anyhow::ensure!(options.len() == 3, "expected 3 tiers, got {}", options.len());
    anyhow::ensure!(
        options.iter().all(|option| option.is_available()),
        "every lancer tier should be purchasable"
    );

    let cost = effective_cost(ctx.catalog, &ctx.overrides, Role::Lancer, 2)
        .context("lancer tier 2 should exist")?;
    let mut host = MemoryHost::stocked(cost);
    let receipt = dialog.choose_tier(ctx.catalog, &ctx.overrides, &mut host, &mut target, 2)?;
    anyhow::ensure!(dialog.step() == DialogStep::Finished, "dialog should be finished");
    anyhow::ensure!(receipt.cost == cost, "charged {} instead of {cost}", receipt.cost);
    anyhow::ensure!(host.gold() == 0, "gold left: {}", host.gold());
    anyhow::ensure!(
        target.battle_equipment().get(Slot::Horse).is_some(),
        "lancer tier 2 should come with a horse"
    );
    anyhow::ensure!(
        host.messages().last().map(String::as_str) == Some(receipt.message().as_str()),
        "receipt was not announced"
    );

    let stranger = MemoryCompanion::stranger("Bandit");
    anyhow::ensure!(
        UpgradeDialog::open(&stranger).is_none(),
        "dialog should not open for strangers"
    );
    Ok(())
}
