use anyhow::{Context, Result};
use companion_gear::sandbox::{MemoryCompanion, MemoryHost};
use companion_gear::{ItemCatalog, Role, TIERS, Treasury, apply_upgrade, effective_preset};

use super::ScenarioCtx;

/// Every preset resolves against the sandbox items and one purchase goes through.
pub fn smoke(ctx: &ScenarioCtx) -> Result<()> {
    anyhow::ensure!(
        ctx.catalog.len() == Role::ALL.len() * TIERS.len(),
        "catalog should hold one preset per role and tier, found {}",
        ctx.catalog.len()
    );

    let host = MemoryHost::stocked(0);
    for (role, tier, preset) in ctx.catalog.entries() {
        anyhow::ensure!(preset.cost > 0, "{role} tier {tier} should cost gold");
        for (slot, id) in &preset.slots {
            let record = host
                .lookup_item(id.as_str())
                .with_context(|| format!("{role} tier {tier} {slot}: unknown item '{id}'"))?;
            anyhow::ensure!(
                slot.accepts(record.item_type),
                "{role} tier {tier}: '{id}' does not fit {slot}"
            );
        }
    }

    let mut host = MemoryHost::stocked(50_000);
    let mut target = MemoryCompanion::recruited("Smoke");
    let expected = effective_preset(ctx.catalog, &ctx.overrides, Role::Archer, 1)
        .context("archer tier 1 should exist")?;
    host.set_gold(expected.cost);
    let receipt = apply_upgrade(
        ctx.catalog,
        &ctx.overrides,
        &mut host,
        &mut target,
        Role::Archer,
        1,
    )
    .context("archer tier 1 purchase")?;
    anyhow::ensure!(receipt.cost == expected.cost, "charged {} gold", receipt.cost);
    anyhow::ensure!(host.gold() == 0, "gold left over: {}", host.gold());
    Ok(())
}
