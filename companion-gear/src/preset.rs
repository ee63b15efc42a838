//! Default gear presets keyed by role and tier.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::gear::{ItemId, Role, Slot, Tier};

/// A price plus per-slot item assignments. Slots left out are untouched when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub cost: u32,
    #[serde(default)]
    pub slots: BTreeMap<Slot, ItemId>,
}

impl Preset {
    #[must_use]
    pub const fn new(cost: u32, slots: BTreeMap<Slot, ItemId>) -> Self {
        Self { cost, slots }
    }

    /// Default item for a slot, if the preset assigns one.
    #[must_use]
    pub fn item(&self, slot: Slot) -> Option<&ItemId> {
        self.slots.get(&slot)
    }
}

/// One catalog row as stored in the preset asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetEntry {
    pub role: Role,
    pub tier: Tier,
    pub cost: u32,
    #[serde(default)]
    pub slots: BTreeMap<Slot, ItemId>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    presets: Vec<PresetEntry>,
}

/// Errors raised when a preset catalog is malformed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate preset for {role} tier {tier}")]
    DuplicateEntry { role: Role, tier: Tier },
    #[error("preset {role} tier {tier} has an empty item id in slot {slot}")]
    EmptyItemId { role: Role, tier: Tier, slot: Slot },
    #[error("preset {role} uses tier 0; tiers start at 1")]
    ZeroTier { role: Role },
    #[error("preset catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Immutable mapping of (role, tier) to its default preset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetCatalog {
    presets: BTreeMap<(Role, Tier), Preset>,
}

impl PresetCatalog {
    /// Build a catalog from rows, rejecting duplicates, tier 0 and empty item ids.
    ///
    /// # Errors
    ///
    /// Returns an error when two rows share a (role, tier), a row uses tier 0,
    /// or a slot has a blank item id.
    pub fn new(entries: Vec<PresetEntry>) -> Result<Self, CatalogError> {
        let mut presets = BTreeMap::new();
        for entry in entries {
            if entry.tier == 0 {
                return Err(CatalogError::ZeroTier { role: entry.role });
            }
            if let Some((slot, _)) = entry.slots.iter().find(|(_, id)| id.is_blank()) {
                return Err(CatalogError::EmptyItemId {
                    role: entry.role,
                    tier: entry.tier,
                    slot: *slot,
                });
            }
            let key = (entry.role, entry.tier);
            if presets.contains_key(&key) {
                return Err(CatalogError::DuplicateEntry {
                    role: entry.role,
                    tier: entry.tier,
                });
            }
            presets.insert(key, Preset::new(entry.cost, entry.slots));
        }
        Ok(Self { presets })
    }

    /// Parse a catalog from its JSON asset form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails catalog validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.presets)
    }

    /// Catalog shipped with the crate.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static CATALOG: OnceLock<PresetCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            Self::from_json(include_str!("../assets/presets.json"))
                .expect("valid builtin preset catalog")
        })
    }

    #[must_use]
    pub fn lookup(&self, role: Role, tier: Tier) -> Option<&Preset> {
        self.presets.get(&(role, tier))
    }

    /// Tiers defined for a role, ascending.
    #[must_use]
    pub fn tiers_for(&self, role: Role) -> Vec<Tier> {
        self.presets
            .keys()
            .filter(|(r, _)| *r == role)
            .map(|(_, tier)| *tier)
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (Role, Tier, &Preset)> {
        self.presets
            .iter()
            .map(|((role, tier), preset)| (*role, *tier, preset))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
