//! Persisted user overrides layered on top of the default presets.
//!
//! Only two flat maps cross the savegame boundary: integer costs keyed by
//! `"<role>:<tier>"` and item ids keyed by `"<role>:<tier>:<slot>"`, where every
//! component is an integer tag. A key present means "differs from default";
//! a missing key means "use default". Keys that no longer parse are kept as-is
//! but never read.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::gear::{ItemId, Role, Slot, Tier};

/// Savegame key holding the cost override map.
pub const COST_OVERRIDES_KEY: &str = "_cgu_override_costs_v1";
/// Savegame key holding the item override map.
pub const ITEM_OVERRIDES_KEY: &str = "_cgu_override_slots_v1";

/// Typed form of a persisted override key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideKey {
    Cost { role: Role, tier: Tier },
    Item { role: Role, tier: Tier, slot: Slot },
}

impl OverrideKey {
    #[must_use]
    pub const fn cost(role: Role, tier: Tier) -> Self {
        Self::Cost { role, tier }
    }

    #[must_use]
    pub const fn item(role: Role, tier: Tier, slot: Slot) -> Self {
        Self::Item { role, tier, slot }
    }

    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::Cost { role, .. } | Self::Item { role, .. } => role,
        }
    }

    #[must_use]
    pub const fn tier(self) -> Tier {
        match self {
            Self::Cost { tier, .. } | Self::Item { tier, .. } => tier,
        }
    }

    #[must_use]
    pub fn encode(self) -> String {
        match self {
            Self::Cost { role, tier } => format!("{}:{tier}", role.ordinal()),
            Self::Item { role, tier, slot } => {
                format!("{}:{tier}:{}", role.ordinal(), slot.code())
            }
        }
    }

    /// Parse a persisted key; malformed keys yield `None`.
    ///
    /// Only the exact output of [`encode`](Self::encode) is accepted, so
    /// `"1:01"` or `"1:1:+5"` are malformed rather than aliases.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(':');
        let role = Role::from_ordinal(parts.next()?.parse().ok()?)?;
        let tier: Tier = parts.next()?.parse().ok()?;
        if tier == 0 {
            return None;
        }
        let key = match parts.next() {
            None => Self::Cost { role, tier },
            Some(slot_part) => {
                let slot = Slot::from_code(slot_part.parse().ok()?)?;
                if parts.next().is_some() {
                    return None;
                }
                Self::Item { role, tier, slot }
            }
        };
        (key.encode() == raw).then_some(key)
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for OverrideKey {
    type Err = OverrideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| OverrideError::MalformedKey(s.to_string()))
    }
}

/// Errors raised by override mutations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OverrideError {
    #[error("item override for {role} tier {tier} slot {slot} must be a non-empty id")]
    EmptyItemId { role: Role, tier: Tier, slot: Slot },
    #[error("override key '{0}' is malformed")]
    MalformedKey(String),
}

/// The only mutable persisted state: cost and item overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideStore {
    #[serde(rename = "_cgu_override_costs_v1", default)]
    costs: BTreeMap<String, i64>,
    #[serde(rename = "_cgu_override_slots_v1", default)]
    items: BTreeMap<String, String>,
}

impl OverrideStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            costs: BTreeMap::new(),
            items: BTreeMap::new(),
        }
    }

    /// Adopt the two maps as handed over by the host save system.
    #[must_use]
    pub const fn from_parts(costs: BTreeMap<String, i64>, items: BTreeMap<String, String>) -> Self {
        Self { costs, items }
    }

    #[must_use]
    pub fn into_parts(self) -> (BTreeMap<String, i64>, BTreeMap<String, String>) {
        (self.costs, self.items)
    }

    #[must_use]
    pub const fn raw_costs(&self) -> &BTreeMap<String, i64> {
        &self.costs
    }

    #[must_use]
    pub const fn raw_items(&self) -> &BTreeMap<String, String> {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.costs.is_empty() && self.items.is_empty()
    }

    #[must_use]
    pub fn get_cost(&self, role: Role, tier: Tier) -> Option<u32> {
        self.costs
            .get(&OverrideKey::cost(role, tier).encode())
            .map(|value| u32::try_from((*value).max(0)).unwrap_or(u32::MAX))
    }

    /// Store a cost override, clamping negatives to zero.
    pub fn set_cost(&mut self, role: Role, tier: Tier, value: i64) {
        self.costs
            .insert(OverrideKey::cost(role, tier).encode(), value.max(0));
    }

    pub fn clear_cost(&mut self, role: Role, tier: Tier) -> bool {
        self.costs
            .remove(&OverrideKey::cost(role, tier).encode())
            .is_some()
    }

    #[must_use]
    pub fn get_item(&self, role: Role, tier: Tier, slot: Slot) -> Option<&str> {
        self.items
            .get(&OverrideKey::item(role, tier, slot).encode())
            .map(String::as_str)
    }

    /// Store an item override.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::EmptyItemId`] when the id is empty or whitespace.
    pub fn set_item(
        &mut self,
        role: Role,
        tier: Tier,
        slot: Slot,
        id: &ItemId,
    ) -> Result<(), OverrideError> {
        if id.is_blank() {
            return Err(OverrideError::EmptyItemId { role, tier, slot });
        }
        self.items.insert(
            OverrideKey::item(role, tier, slot).encode(),
            id.as_str().to_string(),
        );
        Ok(())
    }

    pub fn clear_item(&mut self, role: Role, tier: Tier, slot: Slot) -> bool {
        self.items
            .remove(&OverrideKey::item(role, tier, slot).encode())
            .is_some()
    }

    /// Drop the cost override and every item override under `role:tier:`.
    /// Returns how many entries were removed.
    pub fn reset_all(&mut self, role: Role, tier: Tier) -> usize {
        let mut removed = usize::from(self.clear_cost(role, tier));
        let prefix = format!("{}:", OverrideKey::cost(role, tier).encode());
        let before = self.items.len();
        self.items.retain(|key, _| !key.starts_with(&prefix));
        removed += before - self.items.len();
        removed
    }

    /// Parsed cost overrides; malformed keys are skipped.
    pub fn cost_entries(&self) -> impl Iterator<Item = (Role, Tier, u32)> + '_ {
        self.costs.iter().filter_map(|(raw, value)| {
            match OverrideKey::parse(raw) {
                Some(OverrideKey::Cost { role, tier }) => Some((
                    role,
                    tier,
                    u32::try_from((*value).max(0)).unwrap_or(u32::MAX),
                )),
                _ => {
                    log::debug!("ignoring malformed cost override key '{raw}'");
                    None
                }
            }
        })
    }

    /// Parsed item overrides; malformed keys are skipped.
    pub fn item_entries(&self) -> impl Iterator<Item = (Role, Tier, Slot, &str)> + '_ {
        self.items.iter().filter_map(|(raw, value)| {
            match OverrideKey::parse(raw) {
                Some(OverrideKey::Item { role, tier, slot }) => {
                    Some((role, tier, slot, value.as_str()))
                }
                _ => {
                    log::debug!("ignoring malformed item override key '{raw}'");
                    None
                }
            }
        })
    }

    /// Item overrides recorded for one (role, tier).
    pub fn items_for(&self, role: Role, tier: Tier) -> impl Iterator<Item = (Slot, &str)> + '_ {
        self.item_entries()
            .filter(move |(r, t, _, _)| *r == role && *t == tier)
            .map(|(_, _, slot, id)| (slot, id))
    }

    /// Keys in either map that do not parse into the expected shape.
    #[must_use]
    pub fn malformed_keys(&self) -> Vec<&str> {
        let costs = self
            .costs
            .keys()
            .filter(|raw| !matches!(OverrideKey::parse(raw), Some(OverrideKey::Cost { .. })));
        let items = self
            .items
            .keys()
            .filter(|raw| !matches!(OverrideKey::parse(raw), Some(OverrideKey::Item { .. })));
        costs.chain(items).map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_use_integer_tags() {
        assert_eq!(OverrideKey::cost(Role::Archer, 1).encode(), "1:1");
        assert_eq!(
            OverrideKey::item(Role::Lancer, 3, Slot::HorseHarness).encode(),
            "2:3:11"
        );
        assert_eq!(OverrideKey::item(Role::Infantry, 2, Slot::Head).to_string(), "0:2:5");
    }

    #[test]
    fn keys_parse_back() {
        for role in Role::ALL {
            for slot in Slot::EDITABLE {
                let key = OverrideKey::item(role, 2, slot);
                assert_eq!(OverrideKey::parse(&key.encode()), Some(key));
            }
            let cost = OverrideKey::cost(role, 3);
            assert_eq!(cost.encode().parse::<OverrideKey>(), Ok(cost));
        }
    }

    #[test]
    fn malformed_keys_are_absent() {
        for raw in [
            "", "1", "x:1", "1:y", "9:1", "1:0", "1:1:4", "1:1:99", "1:1:5:0", "Archer:1:cost",
            "1:1:",
        ] {
            assert_eq!(OverrideKey::parse(raw), None, "{raw}");
        }
        assert!(matches!(
            "bad".parse::<OverrideKey>(),
            Err(OverrideError::MalformedKey(_))
        ));
    }

    #[test]
    fn non_canonical_keys_are_malformed() {
        for raw in ["1:01", "01:1", "1:+1", "1:1:05", "1:1:+5", "+1:1:5", " 1:1"] {
            assert_eq!(OverrideKey::parse(raw), None, "{raw}");
        }

        let store = OverrideStore::from_parts(
            BTreeMap::from([("1:01".to_string(), 9999)]),
            BTreeMap::from([("1:1:05".to_string(), "leather_cap".to_string())]),
        );
        let mut malformed = store.malformed_keys();
        malformed.sort_unstable();
        assert_eq!(malformed, vec!["1:01", "1:1:05"]);
        assert_eq!(store.cost_entries().count(), 0);
        assert_eq!(store.item_entries().count(), 0);
        assert_eq!(store.items_for(Role::Archer, 1).count(), 0);
    }

    #[test]
    fn cost_is_clamped_and_clearable() {
        let mut store = OverrideStore::new();
        store.set_cost(Role::Archer, 1, -50);
        assert_eq!(store.get_cost(Role::Archer, 1), Some(0));
        store.set_cost(Role::Archer, 1, 3500);
        assert_eq!(store.get_cost(Role::Archer, 1), Some(3500));
        assert!(store.clear_cost(Role::Archer, 1));
        assert_eq!(store.get_cost(Role::Archer, 1), None);
        assert!(!store.clear_cost(Role::Archer, 1));
    }

    #[test]
    fn empty_item_ids_are_rejected() {
        let mut store = OverrideStore::new();
        let err = store
            .set_item(Role::Infantry, 1, Slot::Body, &ItemId::new(""))
            .expect_err("empty id rejected");
        assert_eq!(
            err,
            OverrideError::EmptyItemId {
                role: Role::Infantry,
                tier: 1,
                slot: Slot::Body
            }
        );
        assert!(store.is_empty());
    }

    #[test]
    fn reset_all_only_touches_matching_prefix() {
        let mut store = OverrideStore::new();
        store.set_cost(Role::Archer, 1, 10);
        store.set_cost(Role::Archer, 2, 20);
        store
            .set_item(Role::Archer, 1, Slot::Head, &ItemId::new("a"))
            .unwrap();
        store
            .set_item(Role::Archer, 1, Slot::Weapon0, &ItemId::new("b"))
            .unwrap();
        store
            .set_item(Role::Archer, 2, Slot::Head, &ItemId::new("c"))
            .unwrap();
        store
            .set_item(Role::Lancer, 1, Slot::Head, &ItemId::new("d"))
            .unwrap();

        assert_eq!(store.reset_all(Role::Archer, 1), 3);
        assert_eq!(store.get_cost(Role::Archer, 1), None);
        assert_eq!(store.get_item(Role::Archer, 1, Slot::Head), None);
        assert_eq!(store.get_cost(Role::Archer, 2), Some(20));
        assert_eq!(store.get_item(Role::Archer, 2, Slot::Head), Some("c"));
        assert_eq!(store.get_item(Role::Lancer, 1, Slot::Head), Some("d"));
    }

    #[test]
    fn reset_does_not_confuse_tier_one_with_tier_eleven() {
        let mut store = OverrideStore::new();
        store
            .set_item(Role::Archer, 11, Slot::Head, &ItemId::new("keep"))
            .unwrap();
        store
            .set_item(Role::Archer, 1, Slot::Head, &ItemId::new("drop"))
            .unwrap();
        assert_eq!(store.reset_all(Role::Archer, 1), 1);
        assert_eq!(store.get_item(Role::Archer, 11, Slot::Head), Some("keep"));
    }

    #[test]
    fn persisted_form_uses_fixed_keys_and_tolerates_garbage() {
        let json = r#"{
            "_cgu_override_costs_v1": {"1:1": 3500, "junk": 7},
            "_cgu_override_slots_v1": {"1:1:5": "noble_helmet", "1:1:42": "x"}
        }"#;
        let store: OverrideStore = serde_json::from_str(json).unwrap();
        assert_eq!(store.get_cost(Role::Archer, 1), Some(3500));
        assert_eq!(store.cost_entries().count(), 1);
        assert_eq!(store.item_entries().count(), 1);
        let mut malformed = store.malformed_keys();
        malformed.sort_unstable();
        assert_eq!(malformed, vec!["1:1:42", "junk"]);

        let saved = serde_json::to_value(&store).unwrap();
        assert!(saved.get(COST_OVERRIDES_KEY).is_some());
        assert_eq!(saved[ITEM_OVERRIDES_KEY]["1:1:42"], "x");

        let empty: OverrideStore = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
