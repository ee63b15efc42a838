//! Companion Gear Upgrades
//!
//! Host-agnostic core for buying tiered gear presets for companions and for
//! editing those presets in game. Default presets are static; user edits are
//! stored as a minimal set of overrides keyed by role, tier and slot.

pub mod dialog;
pub mod editor;
pub mod gear;
pub mod host;
pub mod overlay;
pub mod overrides;
pub mod preset;
#[cfg(any(test, feature = "sandbox"))]
pub mod sandbox;
pub mod upgrade;

// Re-export commonly used types
pub use dialog::{DialogError, DialogStep, UpgradeDialog};
pub use editor::{
    CandidateCache, EditorContext, EditorError, EditorState, PickOutcome, PickerError,
    PresetEditor, PriceInputError, TierOption, parse_price, tier_options,
};
pub use gear::{ItemId, ItemType, PickerGroup, Role, Slot, SlotCategory, TIERS, Tier};
pub use host::{
    Companion, EditorHost, Equipment, EquipmentKind, EquippedItem, InventoryScreen, ItemCatalog,
    ItemRecord, ItemRoster, Notifier, PlayerOutfit, RosterError, Treasury, UpgradeHost,
};
pub use overlay::{
    CommitSummary, PresetSnapshot, capture_snapshot, commit_snapshot, effective_cost,
    effective_preset,
};
pub use overrides::{
    COST_OVERRIDES_KEY, ITEM_OVERRIDES_KEY, OverrideError, OverrideKey, OverrideStore,
};
pub use preset::{CatalogError, Preset, PresetCatalog, PresetEntry};
pub use upgrade::{
    UpgradeError, UpgradeQuote, UpgradeReceipt, apply_upgrade, is_eligible, quote_upgrade,
};

use std::convert::Infallible;

/// Trait for abstracting where default presets come from
/// Hosts that ship their own preset table provide this
pub trait PresetSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the default preset catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or fails validation.
    fn load_presets(&self) -> Result<PresetCatalog, Self::Error>;
}

/// Presets embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPresets;

impl PresetSource for BuiltinPresets {
    type Error = Infallible;

    fn load_presets(&self) -> Result<PresetCatalog, Self::Error> {
        Ok(PresetCatalog::builtin().clone())
    }
}

/// Presets parsed from a JSON document at load time.
#[derive(Debug, Clone)]
pub struct JsonPresets(pub String);

impl PresetSource for JsonPresets {
    type Error = CatalogError;

    fn load_presets(&self) -> Result<PresetCatalog, Self::Error> {
        PresetCatalog::from_json(&self.0)
    }
}

/// Trait for abstracting override persistence
/// The host's savegame sync should provide this
pub trait OverrideStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load persisted overrides, `None` when nothing was saved yet
    ///
    /// # Errors
    ///
    /// Returns an error if the saved overrides cannot be read.
    fn load_overrides(&self) -> Result<Option<OverrideStore>, Self::Error>;

    /// Persist overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the overrides cannot be written.
    fn save_overrides(&self, overrides: &OverrideStore) -> Result<(), Self::Error>;
}

/// Preset catalog plus the loaded overrides and their storage
pub struct GearUpgrades<S>
where
    S: OverrideStorage,
{
    catalog: PresetCatalog,
    overrides: OverrideStore,
    storage: S,
}

impl<S> GearUpgrades<S>
where
    S: OverrideStorage,
{
    /// Create an engine with no overrides loaded
    pub const fn new(catalog: PresetCatalog, storage: S) -> Self {
        Self {
            catalog,
            overrides: OverrideStore::new(),
            storage,
        }
    }

    /// Build the catalog from `source` and pull overrides from `storage`
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or the saved overrides cannot be loaded.
    pub fn load<P>(source: &P, storage: S) -> Result<Self, anyhow::Error>
    where
        P: PresetSource,
        P::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let catalog = source.load_presets().map_err(Into::into)?;
        let mut engine = Self::new(catalog, storage);
        engine.reload()?;
        Ok(engine)
    }

    /// Replace in-memory overrides with the persisted ones
    ///
    /// # Errors
    ///
    /// Returns an error if the saved overrides cannot be loaded.
    pub fn reload(&mut self) -> Result<(), anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        self.overrides = self
            .storage
            .load_overrides()
            .map_err(Into::into)?
            .unwrap_or_default();
        let malformed = self.overrides.malformed_keys().len();
        if malformed > 0 {
            log::debug!("ignoring {malformed} unreadable override keys");
        }
        Ok(())
    }

    /// Persist the current overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the overrides cannot be saved.
    pub fn save(&self) -> Result<(), S::Error> {
        self.storage.save_overrides(&self.overrides)
    }

    #[must_use]
    pub const fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    pub const fn overrides_mut(&mut self) -> &mut OverrideStore {
        &mut self.overrides
    }

    #[must_use]
    pub fn effective_preset(&self, role: Role, tier: Tier) -> Option<PresetSnapshot> {
        effective_preset(&self.catalog, &self.overrides, role, tier)
    }

    /// Borrow catalog, overrides and `host` for an editor session
    pub fn editor_context<'a, H>(&'a mut self, host: &'a mut H) -> EditorContext<'a, H>
    where
        H: EditorHost + ?Sized,
    {
        EditorContext::new(&self.catalog, &mut self.overrides, host)
    }

    /// Buy `tier` of `role` for `target`
    ///
    /// # Errors
    ///
    /// Returns an error if the purchase is refused; nothing is changed then.
    pub fn apply_tier<H, C>(
        &self,
        host: &mut H,
        target: &mut C,
        role: Role,
        tier: Tier,
    ) -> Result<UpgradeReceipt, UpgradeError>
    where
        H: UpgradeHost + ?Sized,
        C: Companion + ?Sized,
    {
        apply_upgrade(&self.catalog, &self.overrides, host, target, role, tier)
    }
}
