//! Buying a tier of gear for a companion.
//!
//! `quote_upgrade` performs every check and id resolution without side effects;
//! `apply_upgrade` only mutates once the quote has succeeded.
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::gear::{ItemId, Role, Slot, Tier};
use crate::host::{Companion, EquippedItem, ItemCatalog, ItemRecord, Treasury, UpgradeHost};
use crate::overlay::effective_preset;
use crate::overrides::OverrideStore;
use crate::preset::PresetCatalog;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeError {
    #[error("{name} is not one of your companions.")]
    NotEligible { name: String },
    #[error("[CGU] Missing preset.")]
    MissingPreset { role: Role, tier: Tier },
    #[error("Not enough gold.")]
    InsufficientFunds { required: u32, available: u32 },
    #[error("[CGU] Item not found: '{item_id}'. Check the ID (vanilla/War Sails/mods).")]
    ItemNotFound { slot: Slot, item_id: String },
}

/// Fully resolved upgrade, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeQuote {
    pub role: Role,
    pub tier: Tier,
    pub cost: u32,
    pub items: BTreeMap<Slot, ItemRecord>,
}

/// What an applied upgrade did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeReceipt {
    pub target: String,
    pub role: Role,
    pub tier: Tier,
    pub cost: u32,
    /// Replaced items moved into the party roster.
    pub transferred: Vec<ItemId>,
    /// Replaced items that could not be moved.
    pub warnings: Vec<String>,
}

impl UpgradeReceipt {
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "{}: equipment updated (Tier {}) for {} gold.",
            self.target, self.tier, self.cost
        )
    }
}

/// True for player companions and members of the player clan.
#[must_use]
pub fn is_eligible<C: Companion + ?Sized>(target: &C) -> bool {
    target.is_player_companion() || target.in_player_clan()
}

/// Check eligibility, preset, gold and every item id.
///
/// # Errors
///
/// Returns the first failing check in that order. Nothing is mutated.
pub fn quote_upgrade<H, C>(
    catalog: &PresetCatalog,
    store: &OverrideStore,
    host: &H,
    target: &C,
    role: Role,
    tier: Tier,
) -> Result<UpgradeQuote, UpgradeError>
where
    H: ItemCatalog + Treasury + ?Sized,
    C: Companion + ?Sized,
{
    if !is_eligible(target) {
        return Err(UpgradeError::NotEligible {
            name: target.name().to_string(),
        });
    }
    let preset = effective_preset(catalog, store, role, tier)
        .ok_or(UpgradeError::MissingPreset { role, tier })?;

    let available = host.gold();
    if available < preset.cost {
        return Err(UpgradeError::InsufficientFunds {
            required: preset.cost,
            available,
        });
    }

    let items = preset
        .slots
        .iter()
        .map(|(slot, id)| {
            host.lookup_item(id.as_str())
                .map(|record| (*slot, record))
                .ok_or_else(|| UpgradeError::ItemNotFound {
                    slot: *slot,
                    item_id: id.to_string(),
                })
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(UpgradeQuote {
        role,
        tier,
        cost: preset.cost,
        items,
    })
}

/// Re-equip `target` with the effective preset and charge its cost.
///
/// Replaced items that are not quest-bound go to the party roster first. A
/// roster failure only produces a warning.
///
/// # Errors
///
/// Any [`quote_upgrade`] failure; gold, roster and equipment are untouched.
pub fn apply_upgrade<H, C>(
    catalog: &PresetCatalog,
    store: &OverrideStore,
    host: &mut H,
    target: &mut C,
    role: Role,
    tier: Tier,
) -> Result<UpgradeReceipt, UpgradeError>
where
    H: UpgradeHost + ?Sized,
    C: Companion + ?Sized,
{
    let quote = quote_upgrade(catalog, store, &*host, &*target, role, tier)?;

    let current = target.battle_equipment();
    let mut equipment = current.clone();
    let mut transferred = Vec::new();
    let mut warnings = Vec::new();

    for (slot, record) in &quote.items {
        if let Some(old) = current.get(*slot).filter(|old| !old.quest && !old.id.is_blank()) {
            match host.add_to_counts(&old.id, 1) {
                Ok(()) => transferred.push(old.id.clone()),
                Err(err) => {
                    log::warn!("old item in {slot} was not transferred: {err}");
                    let warning =
                        format!("[CGU] Unable to transfer the old item from slot {slot}: {err}");
                    host.notify(&warning);
                    warnings.push(warning);
                }
            }
        }
        equipment.set(
            *slot,
            Some(EquippedItem {
                id: record.id.clone(),
                quest: false,
            }),
        );
    }

    host.debit(quote.cost);
    target.assign_battle_equipment(equipment);

    let receipt = UpgradeReceipt {
        target: target.name().to_string(),
        role,
        tier,
        cost: quote.cost,
        transferred,
        warnings,
    };
    log::info!(
        "upgraded {} to {role} tier {tier} for {} gold",
        receipt.target,
        receipt.cost
    );
    host.notify(&receipt.message());
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{MemoryCompanion, MemoryHost};

    #[test]
    fn quote_checks_run_in_order() {
        let catalog = PresetCatalog::builtin();
        let store = OverrideStore::new();
        let host = MemoryHost::stocked(100);

        let stranger = MemoryCompanion::stranger("Bandit");
        assert!(matches!(
            quote_upgrade(catalog, &store, &host, &stranger, Role::Lancer, 9),
            Err(UpgradeError::NotEligible { .. })
        ));

        let ally = MemoryCompanion::recruited("Ira");
        assert!(matches!(
            quote_upgrade(catalog, &store, &host, &ally, Role::Lancer, 9),
            Err(UpgradeError::MissingPreset { tier: 9, .. })
        ));
        assert_eq!(
            quote_upgrade(catalog, &store, &host, &ally, Role::Lancer, 1),
            Err(UpgradeError::InsufficientFunds {
                required: 6000,
                available: 100
            })
        );
    }

    #[test]
    fn clan_members_are_eligible_without_companion_flag() {
        let mut kin = MemoryCompanion::stranger("Cousin");
        kin.player_clan = true;
        assert!(is_eligible(&kin));
    }

    #[test]
    fn quote_resolves_every_slot() {
        let catalog = PresetCatalog::builtin();
        let store = OverrideStore::new();
        let host = MemoryHost::stocked(30_000);
        let ally = MemoryCompanion::recruited("Ira");
        let quote = quote_upgrade(catalog, &store, &host, &ally, Role::Infantry, 3).unwrap();
        let preset = catalog.lookup(Role::Infantry, 3).unwrap();
        assert_eq!(quote.cost, preset.cost);
        assert_eq!(quote.items.len(), preset.slots.len());
    }

    #[test]
    fn receipt_message_matches_notification() {
        let receipt = UpgradeReceipt {
            target: "Ira".to_string(),
            role: Role::Archer,
            tier: 2,
            cost: 8000,
            transferred: Vec::new(),
            warnings: Vec::new(),
        };
        assert_eq!(receipt.message(), "Ira: equipment updated (Tier 2) for 8000 gold.");
        assert_eq!(
            UpgradeError::ItemNotFound {
                slot: Slot::Head,
                item_id: "zzz_nonexistent".to_string()
            }
            .to_string(),
            "[CGU] Item not found: 'zzz_nonexistent'. Check the ID (vanilla/War Sails/mods)."
        );
    }
}
