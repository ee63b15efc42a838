//! Roles, tiers, equipment slots, and item type tags shared across the crate.
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::fmt;

/// Upgrade tier. Tiers 1 through 3 are shipped; other values simply miss the catalog.
pub type Tier = u8;

/// Tiers offered by the dialog and editor menus.
pub const TIERS: [Tier; 3] = [1, 2, 3];

/// Combat archetype selecting a preset family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Infantry,
    Archer,
    Lancer,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Infantry, Self::Archer, Self::Lancer];

    /// Stable integer tag used in persisted override keys.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Infantry => 0,
            Self::Archer => 1,
            Self::Lancer => 2,
        }
    }

    #[must_use]
    pub const fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Infantry),
            1 => Some(Self::Archer),
            2 => Some(Self::Lancer),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Infantry => "Infantry",
            Self::Archer => "Archer",
            Self::Lancer => "Lancer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Equipment attachment point. Discriminants match the host's equipment indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Weapon0,
    Weapon1,
    Weapon2,
    Weapon3,
    Head,
    Body,
    Leg,
    Gloves,
    Cape,
    Horse,
    HorseHarness,
}

impl Slot {
    /// Every slot the editor can touch, in menu order.
    pub const EDITABLE: [Self; 11] = [
        Self::Head,
        Self::Body,
        Self::Cape,
        Self::Gloves,
        Self::Leg,
        Self::Weapon0,
        Self::Weapon1,
        Self::Weapon2,
        Self::Weapon3,
        Self::Horse,
        Self::HorseHarness,
    ];

    /// Host equipment index, used as the slot component of override keys.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Weapon0 => 0,
            Self::Weapon1 => 1,
            Self::Weapon2 => 2,
            Self::Weapon3 => 3,
            Self::Head => 5,
            Self::Body => 6,
            Self::Leg => 7,
            Self::Gloves => 8,
            Self::Cape => 9,
            Self::Horse => 10,
            Self::HorseHarness => 11,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Weapon0),
            1 => Some(Self::Weapon1),
            2 => Some(Self::Weapon2),
            3 => Some(Self::Weapon3),
            5 => Some(Self::Head),
            6 => Some(Self::Body),
            7 => Some(Self::Leg),
            8 => Some(Self::Gloves),
            9 => Some(Self::Cape),
            10 => Some(Self::Horse),
            11 => Some(Self::HorseHarness),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weapon0 => "Weapon0",
            Self::Weapon1 => "Weapon1",
            Self::Weapon2 => "Weapon2",
            Self::Weapon3 => "Weapon3",
            Self::Head => "Head",
            Self::Body => "Body",
            Self::Leg => "Leg",
            Self::Gloves => "Gloves",
            Self::Cape => "Cape",
            Self::Horse => "Horse",
            Self::HorseHarness => "HorseHarness",
        }
    }

    #[must_use]
    pub const fn category(self) -> SlotCategory {
        match self {
            Self::Head | Self::Body | Self::Cape | Self::Gloves | Self::Leg => SlotCategory::Armor,
            Self::Weapon0 | Self::Weapon1 | Self::Weapon2 | Self::Weapon3 => SlotCategory::Weapon,
            Self::Horse | Self::HorseHarness => SlotCategory::Horse,
        }
    }

    /// Candidate-cache bucket; all weapon slots share one list.
    #[must_use]
    pub const fn picker_group(self) -> PickerGroup {
        match self {
            Self::Head => PickerGroup::HeadArmor,
            Self::Body => PickerGroup::BodyArmor,
            Self::Cape => PickerGroup::Cape,
            Self::Gloves => PickerGroup::Gloves,
            Self::Leg => PickerGroup::LegArmor,
            Self::Horse => PickerGroup::Horse,
            Self::HorseHarness => PickerGroup::HorseHarness,
            Self::Weapon0 | Self::Weapon1 | Self::Weapon2 | Self::Weapon3 => {
                PickerGroup::WeaponOrAmmo
            }
        }
    }

    /// Item types the host accepts in this slot.
    #[must_use]
    pub fn allowed_item_types(self) -> SmallVec<[ItemType; 10]> {
        match self {
            Self::Head => smallvec![ItemType::HeadArmor],
            Self::Body => smallvec![ItemType::BodyArmor],
            Self::Cape => smallvec![ItemType::Cape],
            Self::Gloves => smallvec![ItemType::HandArmor],
            Self::Leg => smallvec![ItemType::LegArmor],
            Self::Horse => smallvec![ItemType::Horse],
            Self::HorseHarness => smallvec![ItemType::HorseHarness],
            Self::Weapon0 | Self::Weapon1 | Self::Weapon2 | Self::Weapon3 => SmallVec::from_buf([
                ItemType::OneHandedWeapon,
                ItemType::TwoHandedWeapon,
                ItemType::Polearm,
                ItemType::Bow,
                ItemType::Crossbow,
                ItemType::Thrown,
                ItemType::Shield,
                ItemType::Arrows,
                ItemType::Bolts,
                ItemType::Banner,
            ]),
        }
    }

    #[must_use]
    pub fn accepts(self, item_type: ItemType) -> bool {
        self.allowed_item_types().contains(&item_type)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Editor sub-menu grouping of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    Armor,
    Weapon,
    Horse,
}

impl SlotCategory {
    pub const ALL: [Self; 3] = [Self::Armor, Self::Weapon, Self::Horse];

    #[must_use]
    pub const fn slots(self) -> &'static [Slot] {
        match self {
            Self::Armor => &[Slot::Head, Slot::Body, Slot::Cape, Slot::Gloves, Slot::Leg],
            Self::Weapon => &[Slot::Weapon0, Slot::Weapon1, Slot::Weapon2, Slot::Weapon3],
            Self::Horse => &[Slot::Horse, Slot::HorseHarness],
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Armor => "Armors",
            Self::Weapon => "Weapons",
            Self::Horse => "Horse",
        }
    }
}

/// Host item type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    HeadArmor,
    BodyArmor,
    Cape,
    HandArmor,
    LegArmor,
    Horse,
    HorseHarness,
    OneHandedWeapon,
    TwoHandedWeapon,
    Polearm,
    Bow,
    Crossbow,
    Thrown,
    Shield,
    Arrows,
    Bolts,
    Banner,
    Goods,
}

/// Bucket used to cache candidate lists for the inventory picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickerGroup {
    HeadArmor,
    BodyArmor,
    Cape,
    Gloves,
    LegArmor,
    WeaponOrAmmo,
    Horse,
    HorseHarness,
}

/// Host item identifier. Compared ordinally.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordinals_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_ordinal(role.ordinal()), Some(role));
        }
        assert_eq!(Role::from_ordinal(3), None);
    }

    #[test]
    fn slot_codes_roundtrip_and_skip_extra_weapon_index() {
        for slot in Slot::EDITABLE {
            assert_eq!(Slot::from_code(slot.code()), Some(slot));
        }
        assert_eq!(Slot::from_code(4), None);
        assert_eq!(Slot::from_code(12), None);
    }

    #[test]
    fn categories_partition_editable_slots() {
        let mut covered: Vec<Slot> = SlotCategory::ALL
            .iter()
            .flat_map(|category| category.slots().iter().copied())
            .collect();
        covered.sort();
        let mut editable = Slot::EDITABLE.to_vec();
        editable.sort();
        assert_eq!(covered, editable);
        for slot in Slot::EDITABLE {
            assert!(slot.category().slots().contains(&slot));
        }
    }

    #[test]
    fn weapon_slots_share_a_picker_group_and_filter() {
        assert_eq!(Slot::Weapon0.picker_group(), Slot::Weapon3.picker_group());
        assert!(Slot::Weapon2.accepts(ItemType::Shield));
        assert!(Slot::Weapon1.accepts(ItemType::Arrows));
        assert!(!Slot::Weapon1.accepts(ItemType::HeadArmor));
        assert!(Slot::Gloves.accepts(ItemType::HandArmor));
        assert!(!Slot::Head.accepts(ItemType::Goods));
    }

    #[test]
    fn blank_item_ids_are_detected() {
        assert!(ItemId::new("   ").is_blank());
        assert!(!ItemId::new("noble_bow").is_blank());
    }
}
