//! Capabilities the surrounding game provides.
//!
//! The engine never reaches for global state: every item lookup, gold change,
//! roster edit and equipment write goes through one of these traits.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::gear::{ItemId, ItemType, Slot};

/// Catalog entry for a single host item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    pub item_type: ItemType,
}

impl ItemRecord {
    #[must_use]
    pub fn new(id: &str, name: &str, item_type: ItemType) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.to_string(),
            item_type,
        }
    }
}

/// Item sitting in an equipment slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedItem {
    pub id: ItemId,
    /// Quest-bound items never leave their slot through an upgrade.
    #[serde(default)]
    pub quest: bool,
}

impl EquippedItem {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: ItemId::new(id),
            quest: false,
        }
    }

    #[must_use]
    pub fn quest(id: &str) -> Self {
        Self {
            id: ItemId::new(id),
            quest: true,
        }
    }
}

/// Whole equipment set of one actor. Cloning it yields an independent copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    slots: BTreeMap<Slot, EquippedItem>,
}

impl Equipment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<&EquippedItem> {
        self.slots.get(&slot)
    }

    /// Write or empty a slot.
    pub fn set(&mut self, slot: Slot, item: Option<EquippedItem>) {
        match item {
            Some(item) => {
                self.slots.insert(slot, item);
            }
            None => {
                self.slots.remove(&slot);
            }
        }
    }

    #[must_use]
    pub fn with(mut self, slot: Slot, item: EquippedItem) -> Self {
        self.slots.insert(slot, item);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &EquippedItem)> {
        self.slots.iter().map(|(slot, item)| (*slot, item))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Which of the player's two outfits a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    Battle,
    Civilian,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("cannot remove {requested} of '{item_id}', only {available} held")]
    Underflow {
        item_id: ItemId,
        requested: u32,
        available: u32,
    },
    #[error("roster refused '{item_id}': {reason}")]
    Rejected { item_id: ItemId, reason: String },
}

pub trait ItemCatalog {
    fn lookup_item(&self, id: &str) -> Option<ItemRecord>;

    /// Every item known to the host, in any order.
    fn all_items(&self) -> Vec<ItemRecord>;
}

pub trait Treasury {
    fn gold(&self) -> u32;

    /// Remove gold from the acting party. Callers check the balance first.
    fn debit(&mut self, amount: u32);
}

/// Shared inventory of the acting party.
pub trait ItemRoster {
    /// Held count per item id; ids with a zero count are omitted.
    fn counts(&self) -> BTreeMap<ItemId, u32>;

    /// Adjust the count of one item by `delta`.
    ///
    /// # Errors
    ///
    /// Returns an error when the host refuses the change.
    fn add_to_counts(&mut self, id: &ItemId, delta: i64) -> Result<(), RosterError>;
}

/// The player's own battle and civilian outfits.
pub trait PlayerOutfit {
    fn equipment(&self, kind: EquipmentKind) -> Equipment;
    fn set_slot(&mut self, kind: EquipmentKind, slot: Slot, item: Option<EquippedItem>);
}

/// Blocking "receive items" inventory screen.
///
/// The host shows `offered` on the far side and returns once the player closes
/// the screen. Anything the player moved or equipped meanwhile is visible through
/// [`ItemRoster`] and [`PlayerOutfit`].
pub trait InventoryScreen {
    fn receive_items(&mut self, title: &str, offered: &[ItemRecord]);
}

pub trait Notifier {
    fn notify(&mut self, message: &str);
}

/// Actor whose gear gets replaced by an upgrade.
pub trait Companion {
    fn name(&self) -> &str;
    fn is_player_companion(&self) -> bool;
    fn in_player_clan(&self) -> bool;
    fn battle_equipment(&self) -> Equipment;
    fn assign_battle_equipment(&mut self, equipment: Equipment);
}

/// Everything the preset editor touches.
pub trait EditorHost: ItemCatalog + ItemRoster + PlayerOutfit + InventoryScreen + Notifier {}

impl<T> EditorHost for T where
    T: ItemCatalog + ItemRoster + PlayerOutfit + InventoryScreen + Notifier
{
}

/// Everything an upgrade purchase touches, besides the target itself.
pub trait UpgradeHost: ItemCatalog + Treasury + ItemRoster + Notifier {}

impl<T> UpgradeHost for T where T: ItemCatalog + Treasury + ItemRoster + Notifier {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equipment_clone_is_independent() {
        let original = Equipment::new().with(Slot::Head, EquippedItem::new("cap"));
        let mut copy = original.clone();
        copy.set(Slot::Head, Some(EquippedItem::new("helm")));
        copy.set(Slot::Body, Some(EquippedItem::quest("relic_mail")));
        assert_eq!(original.get(Slot::Head).map(|i| i.id.as_str()), Some("cap"));
        assert!(original.get(Slot::Body).is_none());

        copy.set(Slot::Body, None);
        assert_eq!(copy.iter().count(), 1);
    }

    #[test]
    fn equipped_item_defaults_to_non_quest() {
        let parsed: EquippedItem = serde_json::from_str(r#"{"id": "noble_bow"}"#).unwrap();
        assert!(!parsed.quest);
        assert!(EquippedItem::quest("banner_of_calradia").quest);
    }
}
