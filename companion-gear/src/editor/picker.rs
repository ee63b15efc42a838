//! Item selection through the host inventory screen.
//!
//! Browsing must not create, destroy or equip anything. The party roster and
//! both player outfits are captured before the screen opens and restored after
//! it closes; only the detected item id survives.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

use crate::gear::{ItemId, PickerGroup, Slot};
use crate::host::{
    EquipmentKind, Equipment, InventoryScreen, ItemCatalog, ItemRecord, ItemRoster, PlayerOutfit,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    #[error("No items available for slot {slot}.")]
    NoCandidates { slot: Slot },
}

/// Result of one trip through the inventory screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickOutcome {
    pub selected: Option<ItemId>,
    /// Roster changes that could not be undone.
    pub rollback_warnings: Vec<String>,
}

/// Sorted candidate lists, built once per picker group for the session.
#[derive(Debug, Clone, Default)]
pub struct CandidateCache {
    groups: HashMap<PickerGroup, Vec<ItemRecord>>,
}

impl CandidateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items that fit `slot`, sorted by name then id, ignoring case.
    pub fn candidates<C>(&mut self, catalog: &C, slot: Slot) -> &[ItemRecord]
    where
        C: ItemCatalog + ?Sized,
    {
        self.groups.entry(slot.picker_group()).or_insert_with(|| {
            let mut items: Vec<ItemRecord> = catalog
                .all_items()
                .into_iter()
                .filter(|item| !item.id.is_blank() && slot.accepts(item.item_type))
                .collect();
            items.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then_with(|| a.id.as_str().to_lowercase().cmp(&b.id.as_str().to_lowercase()))
            });
            log::debug!(
                "cached {} candidates for {:?}",
                items.len(),
                slot.picker_group()
            );
            items
        })
    }

    #[must_use]
    pub fn is_cached(&self, group: PickerGroup) -> bool {
        self.groups.contains_key(&group)
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

/// Offer the candidates for `slot` and report which one the player chose.
///
/// # Errors
///
/// Returns [`PickerError::NoCandidates`] when the catalog has nothing that fits
/// the slot; the screen is not opened in that case.
pub fn pick_item<H>(
    cache: &mut CandidateCache,
    host: &mut H,
    slot: Slot,
) -> Result<PickOutcome, PickerError>
where
    H: ItemCatalog + ItemRoster + PlayerOutfit + InventoryScreen + ?Sized,
{
    let offered = cache.candidates(&*host, slot);
    if offered.is_empty() {
        return Err(PickerError::NoCandidates { slot });
    }

    let roster_before = host.counts();
    let battle_before = host.equipment(EquipmentKind::Battle);
    let civilian_before = host.equipment(EquipmentKind::Civilian);

    host.receive_items(&format!("CGU - Pick {slot}"), offered);

    let selected = detect_selection(&*host, slot, &roster_before, &battle_before);

    restore_outfit(host, EquipmentKind::Battle, &battle_before);
    restore_outfit(host, EquipmentKind::Civilian, &civilian_before);
    let rollback_warnings = restore_roster(host, &roster_before);

    Ok(PickOutcome {
        selected,
        rollback_warnings,
    })
}

fn detect_selection<H>(
    host: &H,
    slot: Slot,
    roster_before: &BTreeMap<ItemId, u32>,
    battle_before: &Equipment,
) -> Option<ItemId>
where
    H: ItemCatalog + ItemRoster + PlayerOutfit + ?Sized,
{
    let fits = |id: &ItemId| {
        host.lookup_item(id.as_str())
            .is_some_and(|item| slot.accepts(item.item_type))
    };

    let taken = host.counts().into_iter().find(|(id, count)| {
        *count > roster_before.get(id).copied().unwrap_or(0) && fits(id)
    });
    if let Some((id, _)) = taken {
        return Some(id);
    }

    let before = battle_before.get(slot).map(|item| &item.id);
    let after = host.equipment(EquipmentKind::Battle).get(slot).map(|item| item.id.clone());
    after.filter(|id| Some(id) != before && !id.is_blank() && fits(id))
}

fn restore_outfit<H>(host: &mut H, kind: EquipmentKind, before: &Equipment)
where
    H: PlayerOutfit + ?Sized,
{
    for slot in Slot::EDITABLE {
        host.set_slot(kind, slot, before.get(slot).cloned());
    }
}

fn restore_roster<H>(host: &mut H, before: &BTreeMap<ItemId, u32>) -> Vec<String>
where
    H: ItemRoster + ?Sized,
{
    let now = host.counts();
    let ids: BTreeSet<&ItemId> = before.keys().chain(now.keys()).collect();
    let mut warnings = Vec::new();
    for id in ids {
        let was = i64::from(before.get(id).copied().unwrap_or(0));
        let is = i64::from(now.get(id).copied().unwrap_or(0));
        let diff = is - was;
        if diff == 0 {
            continue;
        }
        if let Err(err) = host.add_to_counts(id, -diff) {
            log::warn!("could not roll back roster entry {id}: {err}");
            warnings.push(format!("Could not restore {id}: {err}"));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gear::ItemType;
    use crate::host::EquippedItem;
    use crate::sandbox::{MemoryHost, ScreenAction};

    fn host() -> MemoryHost {
        MemoryHost::new(0)
            .with_item("b_helm", "Bascinet", ItemType::HeadArmor)
            .with_item("a_helm", "bascinet", ItemType::HeadArmor)
            .with_item("c_helm", "Arming Cap", ItemType::HeadArmor)
            .with_item("long_bow", "Long Bow", ItemType::Bow)
            .with_item("pitchfork", "Pitchfork", ItemType::Polearm)
            .with_item("grain", "Grain", ItemType::Goods)
    }

    #[test]
    fn candidates_are_filtered_sorted_and_cached() {
        let mut cache = CandidateCache::new();
        let mut host = host();
        let ids: Vec<&str> = cache
            .candidates(&host, Slot::Head)
            .iter()
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(ids, ["c_helm", "a_helm", "b_helm"]);
        assert!(cache.is_cached(PickerGroup::HeadArmor));

        host.register_item(ItemRecord::new("d_helm", "Zweihelm", ItemType::HeadArmor));
        assert_eq!(cache.candidates(&host, Slot::Head).len(), 3);

        let weapons = cache.candidates(&host, Slot::Weapon3).len();
        assert_eq!(weapons, 2);
        assert!(cache.is_cached(PickerGroup::WeaponOrAmmo));
        cache.clear();
        assert!(!cache.is_cached(PickerGroup::HeadArmor));
    }

    #[test]
    fn taking_an_item_selects_it_and_rolls_back_the_roster() {
        let mut cache = CandidateCache::new();
        let mut host = host();
        host.hold("grain", 4);
        host.script_screen(vec![
            ScreenAction::Take {
                item: ItemId::new("long_bow"),
            },
            ScreenAction::Discard {
                item: ItemId::new("grain"),
            },
        ]);

        let outcome = pick_item(&mut cache, &mut host, Slot::Weapon1).unwrap();
        assert_eq!(outcome.selected, Some(ItemId::new("long_bow")));
        assert!(outcome.rollback_warnings.is_empty());
        assert_eq!(host.held("long_bow"), 0);
        assert_eq!(host.held("grain"), 4);
        assert_eq!(host.screens(), ["CGU - Pick Weapon1".to_string()]);
    }

    #[test]
    fn equipping_directly_is_detected_and_undone() {
        let mut cache = CandidateCache::new();
        let mut host = host();
        host.equip_player(EquipmentKind::Battle, Slot::Head, EquippedItem::new("c_helm"));
        host.script_screen(vec![
            ScreenAction::Equip {
                kind: EquipmentKind::Battle,
                slot: Slot::Head,
                item: ItemId::new("b_helm"),
            },
            ScreenAction::Equip {
                kind: EquipmentKind::Civilian,
                slot: Slot::Head,
                item: ItemId::new("a_helm"),
            },
        ]);

        let outcome = pick_item(&mut cache, &mut host, Slot::Head).unwrap();
        assert_eq!(outcome.selected, Some(ItemId::new("b_helm")));
        assert_eq!(
            host.equipment(EquipmentKind::Battle)
                .get(Slot::Head)
                .map(|item| item.id.as_str()),
            Some("c_helm")
        );
        assert!(host.equipment(EquipmentKind::Civilian).is_empty());
    }

    #[test]
    fn wrong_type_or_no_action_selects_nothing() {
        let mut cache = CandidateCache::new();
        let mut host = host();
        host.script_screen(vec![ScreenAction::Equip {
            kind: EquipmentKind::Battle,
            slot: Slot::Head,
            item: ItemId::new("pitchfork"),
        }]);
        let outcome = pick_item(&mut cache, &mut host, Slot::Head).unwrap();
        assert_eq!(outcome.selected, None);

        let outcome = pick_item(&mut cache, &mut host, Slot::Head).unwrap();
        assert_eq!(outcome, PickOutcome::default());
    }

    #[test]
    fn failed_rollback_is_reported() {
        let mut cache = CandidateCache::new();
        let mut host = host();
        host.refuse_roster_changes("a_helm");
        host.script_screen(vec![ScreenAction::Take {
            item: ItemId::new("a_helm"),
        }]);

        let outcome = pick_item(&mut cache, &mut host, Slot::Head).unwrap();
        assert_eq!(outcome.selected, Some(ItemId::new("a_helm")));
        assert_eq!(outcome.rollback_warnings.len(), 1);
        assert!(outcome.rollback_warnings[0].contains("a_helm"));
        assert_eq!(host.held("a_helm"), 1);
    }

    #[test]
    fn empty_group_is_an_error() {
        let mut cache = CandidateCache::new();
        let mut host = host();
        assert_eq!(
            pick_item(&mut cache, &mut host, Slot::HorseHarness),
            Err(PickerError::NoCandidates {
                slot: Slot::HorseHarness
            })
        );
        assert!(host.screens().is_empty());
    }
}
