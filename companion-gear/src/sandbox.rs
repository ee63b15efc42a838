//! In-memory host used by tests and the scenario runner.
//!
//! Only compiled for unit tests or with the `sandbox` feature.
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::OnceLock;

use crate::gear::{ItemId, ItemType, Slot};
use crate::host::{
    Companion, EquipmentKind, Equipment, EquippedItem, InventoryScreen, ItemCatalog, ItemRecord,
    ItemRoster, Notifier, PlayerOutfit, RosterError, Treasury,
};

#[derive(Debug, Deserialize)]
struct ItemFile {
    items: Vec<ItemRecord>,
}

/// Items matching every id in the shipped presets, plus a few extras.
#[must_use]
pub fn stock_items() -> &'static [ItemRecord] {
    static ITEMS: OnceLock<Vec<ItemRecord>> = OnceLock::new();
    ITEMS.get_or_init(|| {
        serde_json::from_str::<ItemFile>(include_str!("../assets/sandbox_items.json"))
            .expect("valid sandbox item list")
            .items
    })
}

/// One thing the scripted player does while an inventory screen is open.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScreenAction {
    /// Move one offered item into the party roster.
    Take { item: ItemId },
    /// Equip an item straight onto the player.
    Equip {
        kind: EquipmentKind,
        slot: Slot,
        item: ItemId,
    },
    /// Drop one unit of a held item.
    Discard { item: ItemId },
}

/// Host with gold, roster, player outfits, item catalog and a scripted inventory screen.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    items: BTreeMap<ItemId, ItemRecord>,
    gold: u32,
    roster: BTreeMap<ItemId, u32>,
    battle: Equipment,
    civilian: Equipment,
    script: VecDeque<Vec<ScreenAction>>,
    refused: BTreeSet<ItemId>,
    messages: Vec<String>,
    screens: Vec<String>,
}

impl MemoryHost {
    #[must_use]
    pub fn new(gold: u32) -> Self {
        Self {
            gold,
            ..Self::default()
        }
    }

    /// Host stocked with [`stock_items`].
    #[must_use]
    pub fn stocked(gold: u32) -> Self {
        let mut host = Self::new(gold);
        for record in stock_items() {
            host.register_item(record.clone());
        }
        host
    }

    pub fn register_item(&mut self, record: ItemRecord) {
        self.items.insert(record.id.clone(), record);
    }

    #[must_use]
    pub fn with_item(mut self, id: &str, name: &str, item_type: ItemType) -> Self {
        self.register_item(ItemRecord::new(id, name, item_type));
        self
    }

    pub fn remove_item(&mut self, id: &str) -> Option<ItemRecord> {
        self.items.remove(&ItemId::new(id))
    }

    pub const fn set_gold(&mut self, gold: u32) {
        self.gold = gold;
    }

    pub fn hold(&mut self, id: &str, count: u32) {
        if count == 0 {
            self.roster.remove(&ItemId::new(id));
        } else {
            self.roster.insert(ItemId::new(id), count);
        }
    }

    pub fn equip_player(&mut self, kind: EquipmentKind, slot: Slot, item: EquippedItem) {
        self.outfit_mut(kind).set(slot, Some(item));
    }

    /// Queue what the player does during the next inventory screen.
    pub fn script_screen(&mut self, actions: Vec<ScreenAction>) {
        self.script.push_back(actions);
    }

    /// Make every roster change for `id` fail.
    pub fn refuse_roster_changes(&mut self, id: &str) {
        self.refused.insert(ItemId::new(id));
    }

    #[must_use]
    pub fn held(&self, id: &str) -> u32 {
        self.roster.get(&ItemId::new(id)).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Titles of every inventory screen opened so far.
    #[must_use]
    pub fn screens(&self) -> &[String] {
        &self.screens
    }

    const fn outfit_mut(&mut self, kind: EquipmentKind) -> &mut Equipment {
        match kind {
            EquipmentKind::Battle => &mut self.battle,
            EquipmentKind::Civilian => &mut self.civilian,
        }
    }

    fn adjust(&mut self, id: &ItemId, delta: i64) -> Result<(), RosterError> {
        let current = self.held(id.as_str());
        let next = i64::from(current) + delta;
        if next < 0 {
            return Err(RosterError::Underflow {
                item_id: id.clone(),
                requested: u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX),
                available: current,
            });
        }
        let next = u32::try_from(next).map_err(|_| RosterError::Rejected {
            item_id: id.clone(),
            reason: "stack limit reached".to_string(),
        })?;
        self.hold(id.as_str(), next);
        Ok(())
    }

    fn run_action(&mut self, action: &ScreenAction, offered: &[ItemRecord]) {
        match action {
            ScreenAction::Take { item } => {
                if offered.iter().any(|record| &record.id == item)
                    && let Err(err) = self.adjust(item, 1)
                {
                    log::debug!("scripted take of {item} ignored: {err}");
                }
            }
            ScreenAction::Equip { kind, slot, item } => {
                self.outfit_mut(*kind).set(
                    *slot,
                    Some(EquippedItem {
                        id: item.clone(),
                        quest: false,
                    }),
                );
            }
            ScreenAction::Discard { item } => {
                if let Err(err) = self.adjust(item, -1) {
                    log::debug!("scripted discard of {item} ignored: {err}");
                }
            }
        }
    }
}

impl ItemCatalog for MemoryHost {
    fn lookup_item(&self, id: &str) -> Option<ItemRecord> {
        self.items.get(&ItemId::new(id)).cloned()
    }

    fn all_items(&self) -> Vec<ItemRecord> {
        self.items.values().cloned().collect()
    }
}

impl Treasury for MemoryHost {
    fn gold(&self) -> u32 {
        self.gold
    }

    fn debit(&mut self, amount: u32) {
        self.gold = self.gold.saturating_sub(amount);
    }
}

impl ItemRoster for MemoryHost {
    fn counts(&self) -> BTreeMap<ItemId, u32> {
        self.roster.clone()
    }

    fn add_to_counts(&mut self, id: &ItemId, delta: i64) -> Result<(), RosterError> {
        if self.refused.contains(id) {
            return Err(RosterError::Rejected {
                item_id: id.clone(),
                reason: "roster is locked".to_string(),
            });
        }
        self.adjust(id, delta)
    }
}

impl PlayerOutfit for MemoryHost {
    fn equipment(&self, kind: EquipmentKind) -> Equipment {
        match kind {
            EquipmentKind::Battle => self.battle.clone(),
            EquipmentKind::Civilian => self.civilian.clone(),
        }
    }

    fn set_slot(&mut self, kind: EquipmentKind, slot: Slot, item: Option<EquippedItem>) {
        self.outfit_mut(kind).set(slot, item);
    }
}

impl InventoryScreen for MemoryHost {
    fn receive_items(&mut self, title: &str, offered: &[ItemRecord]) {
        self.screens.push(title.to_string());
        let actions = self.script.pop_front().unwrap_or_default();
        for action in &actions {
            self.run_action(action, offered);
        }
    }
}

impl Notifier for MemoryHost {
    fn notify(&mut self, message: &str) {
        log::debug!("notify: {message}");
        self.messages.push(message.to_string());
    }
}

/// Companion stand-in with an owned battle outfit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCompanion {
    pub name: String,
    pub player_companion: bool,
    pub player_clan: bool,
    pub equipment: Equipment,
}

impl MemoryCompanion {
    /// A companion recruited into the player's clan.
    #[must_use]
    pub fn recruited(name: &str) -> Self {
        Self {
            name: name.to_string(),
            player_companion: true,
            player_clan: true,
            equipment: Equipment::new(),
        }
    }

    /// Someone with no ties to the player.
    #[must_use]
    pub fn stranger(name: &str) -> Self {
        Self {
            name: name.to_string(),
            player_companion: false,
            player_clan: false,
            equipment: Equipment::new(),
        }
    }

    #[must_use]
    pub fn wearing(mut self, slot: Slot, item: EquippedItem) -> Self {
        self.equipment.set(slot, Some(item));
        self
    }
}

impl Companion for MemoryCompanion {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_player_companion(&self) -> bool {
        self.player_companion
    }

    fn in_player_clan(&self) -> bool {
        self.player_clan
    }

    fn battle_equipment(&self) -> Equipment {
        self.equipment.clone()
    }

    fn assign_battle_equipment(&mut self, equipment: Equipment) {
        self.equipment = equipment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetCatalog;

    #[test]
    fn stock_items_cover_every_shipped_preset_id() {
        let host = MemoryHost::stocked(0);
        for (role, tier, preset) in PresetCatalog::builtin().entries() {
            for (slot, id) in &preset.slots {
                let record = host
                    .lookup_item(id.as_str())
                    .unwrap_or_else(|| panic!("{role} tier {tier} {slot}: {id} missing"));
                assert!(slot.accepts(record.item_type), "{id} does not fit {slot}");
            }
        }
    }

    #[test]
    fn roster_rejects_underflow_and_locked_ids() {
        let mut host = MemoryHost::new(0);
        host.hold("grain", 1);
        let grain = ItemId::new("grain");
        host.add_to_counts(&grain, -1).unwrap();
        assert_eq!(host.held("grain"), 0);
        assert!(host.counts().is_empty());
        assert!(matches!(
            host.add_to_counts(&grain, -1),
            Err(RosterError::Underflow { available: 0, .. })
        ));

        host.refuse_roster_changes("grain");
        assert!(matches!(
            host.add_to_counts(&grain, 1),
            Err(RosterError::Rejected { .. })
        ));
    }

    #[test]
    fn scripted_screen_only_hands_out_offered_items() {
        let mut host = MemoryHost::stocked(0);
        host.script_screen(vec![
            ScreenAction::Take {
                item: ItemId::new("noble_bow"),
            },
            ScreenAction::Take {
                item: ItemId::new("hardwood"),
            },
        ]);
        let offered = vec![host.lookup_item("noble_bow").unwrap()];
        host.receive_items("Pick", &offered);
        assert_eq!(host.held("noble_bow"), 1);
        assert_eq!(host.held("hardwood"), 0);
        assert_eq!(host.screens(), ["Pick".to_string()]);

        host.receive_items("Again", &offered);
        assert_eq!(host.held("noble_bow"), 1);
    }

    #[test]
    fn scripted_actions_that_cannot_apply_are_skipped() {
        let mut host = MemoryHost::stocked(0);
        host.hold("noble_bow", u32::MAX);
        host.hold("leather_cap", 1);
        host.script_screen(vec![
            ScreenAction::Discard {
                item: ItemId::new("sumpter_horse"),
            },
            ScreenAction::Take {
                item: ItemId::new("noble_bow"),
            },
            ScreenAction::Discard {
                item: ItemId::new("leather_cap"),
            },
        ]);
        let offered = vec![host.lookup_item("noble_bow").unwrap()];
        host.receive_items("Pick", &offered);

        assert_eq!(host.held("sumpter_horse"), 0);
        assert_eq!(host.held("noble_bow"), u32::MAX);
        assert_eq!(host.held("leather_cap"), 0);
    }

    #[test]
    fn debit_never_goes_negative() {
        let mut host = MemoryHost::new(100);
        host.debit(250);
        assert_eq!(host.gold(), 0);
    }
}
