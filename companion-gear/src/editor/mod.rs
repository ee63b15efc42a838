//! Interactive preset editor.
//!
//! The flow is role, then tier, then an edit menu with price and slot
//! categories, then save or cancel. One working snapshot exists while the edit
//! menu is open; the override store only changes when the session is saved.
pub mod picker;

use serde::Serialize;
use thiserror::Error;

use crate::gear::{ItemId, Role, Slot, SlotCategory, Tier};
use crate::host::EditorHost;
use crate::overlay::{CommitSummary, PresetSnapshot, capture_snapshot, commit_snapshot};
use crate::overrides::{OverrideError, OverrideStore};
use crate::preset::PresetCatalog;

pub use picker::{CandidateCache, PickOutcome, PickerError, pick_item};

const NO_SELECTION: &str = concat!(
    "[CGU] No item selected. Move one item from the left to your ",
    "inventory/equipment, then press Done.",
);

/// Everything a transition may read or write.
pub struct EditorContext<'a, H: ?Sized> {
    pub catalog: &'a PresetCatalog,
    pub store: &'a mut OverrideStore,
    pub host: &'a mut H,
}

impl<'a, H: ?Sized> EditorContext<'a, H> {
    pub const fn new(
        catalog: &'a PresetCatalog,
        store: &'a mut OverrideStore,
        host: &'a mut H,
    ) -> Self {
        Self {
            catalog,
            store,
            host,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditorState {
    RoleSelect,
    TierSelect { role: Role },
    EditMenu { role: Role, tier: Tier },
    CostPrompt { role: Role, tier: Tier },
    Category {
        role: Role,
        tier: Tier,
        category: SlotCategory,
    },
    SaveCancelPrompt { role: Role, tier: Tier },
    Closed,
}

impl EditorState {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RoleSelect => "role select",
            Self::TierSelect { .. } => "tier select",
            Self::EditMenu { .. } => "edit menu",
            Self::CostPrompt { .. } => "cost prompt",
            Self::Category { .. } => "category",
            Self::SaveCancelPrompt { .. } => "save/cancel prompt",
            Self::Closed => "closed",
        }
    }
}

/// Price entry rejected by the cost prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PriceInputError {
    #[error("Please enter a number.")]
    Empty,
    #[error("Please enter a valid integer number.")]
    NotInteger,
    #[error("Price must be 0 or higher.")]
    Negative,
}

/// Parse a price typed into the cost prompt.
///
/// # Errors
///
/// Returns the validation message for blank, non-integer or negative input.
pub fn parse_price(text: &str) -> Result<u32, PriceInputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PriceInputError::Empty);
    }
    let value: i64 = trimmed.parse().map_err(|_| PriceInputError::NotInteger)?;
    if value < 0 {
        return Err(PriceInputError::Negative);
    }
    u32::try_from(value).map_err(|_| PriceInputError::NotInteger)
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("cannot {action} from the {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
    #[error("Missing preset for {role} tier {tier}.")]
    MissingPreset { role: Role, tier: Tier },
    #[error(transparent)]
    Price(#[from] PriceInputError),
    #[error("Item not found: '{item_id}'.")]
    ItemNotFound { slot: Slot, item_id: String },
    #[error("'{item_id}' cannot be placed in slot {slot}.")]
    WrongItemType { slot: Slot, item_id: String },
    #[error("slot {slot} is not part of {category:?}")]
    SlotNotInCategory { slot: Slot, category: SlotCategory },
    #[error(transparent)]
    Picker(#[from] PickerError),
    #[error(transparent)]
    Commit(#[from] OverrideError),
}

/// One line of the tier menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierOption {
    pub tier: Tier,
    /// Effective cost, absent when the catalog has no preset.
    pub cost: Option<u32>,
    pub label: String,
}

impl TierOption {
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.cost.is_some()
    }
}

/// Tier menu lines for `role`, each labelled with its effective cost.
#[must_use]
pub fn tier_options(catalog: &PresetCatalog, store: &OverrideStore, role: Role) -> Vec<TierOption> {
    crate::gear::TIERS
        .iter()
        .map(|&tier| {
            let cost = crate::overlay::effective_cost(catalog, store, role, tier);
            let shown = cost.map_or_else(|| "-".to_string(), |cost| cost.to_string());
            TierOption {
                tier,
                cost,
                label: format!("Tier {tier} ({shown} gold)"),
            }
        })
        .collect()
}

/// Preset editor session.
#[derive(Debug, Clone)]
pub struct PresetEditor {
    state: EditorState,
    working: Option<PresetSnapshot>,
    candidates: CandidateCache,
}

impl Default for PresetEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetEditor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: EditorState::RoleSelect,
            working: None,
            candidates: CandidateCache::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> EditorState {
        self.state
    }

    /// Working snapshot, present from the edit menu until save or discard.
    #[must_use]
    pub const fn working(&self) -> Option<&PresetSnapshot> {
        self.working.as_ref()
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, EditorState::Closed)
    }

    fn invalid(&self, action: &'static str) -> EditorError {
        EditorError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    pub fn choose_role(&mut self, role: Role) -> Result<(), EditorError> {
        match self.state {
            EditorState::RoleSelect => {
                self.state = EditorState::TierSelect { role };
                Ok(())
            }
            _ => Err(self.invalid("choose a role")),
        }
    }

    /// Open the edit menu for `tier`, capturing a fresh working snapshot.
    ///
    /// # Errors
    ///
    /// Fails outside the tier menu, or when the catalog has no such preset; the
    /// editor stays on the tier menu in the latter case.
    pub fn choose_tier<H>(
        &mut self,
        ctx: &mut EditorContext<'_, H>,
        tier: Tier,
    ) -> Result<(), EditorError>
    where
        H: EditorHost + ?Sized,
    {
        let EditorState::TierSelect { role } = self.state else {
            return Err(self.invalid("choose a tier"));
        };
        let Some(default) = ctx.catalog.lookup(role, tier) else {
            ctx.host.notify("[CGU] Missing preset.");
            return Err(EditorError::MissingPreset { role, tier });
        };
        self.working = Some(capture_snapshot(ctx.store, role, tier, default));
        self.state = EditorState::EditMenu { role, tier };
        Ok(())
    }

    /// Text shown above the edit menu.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        let (role, tier) = self.session()?;
        let working = self.working.as_ref()?;
        Some(format!(
            "Role: {role} | Tier: {tier} | Cost: {}\n{}Exit -> Save / Cancel",
            working.cost,
            working.slot_summary()
        ))
    }

    const fn session(&self) -> Option<(Role, Tier)> {
        match self.state {
            EditorState::EditMenu { role, tier }
            | EditorState::CostPrompt { role, tier }
            | EditorState::Category { role, tier, .. }
            | EditorState::SaveCancelPrompt { role, tier } => Some((role, tier)),
            _ => None,
        }
    }

    pub fn open_cost_prompt(&mut self) -> Result<(), EditorError> {
        match self.state {
            EditorState::EditMenu { role, tier } => {
                self.state = EditorState::CostPrompt { role, tier };
                Ok(())
            }
            _ => Err(self.invalid("set the price")),
        }
    }

    /// Apply a typed price and return to the edit menu.
    ///
    /// # Errors
    ///
    /// Invalid input is reported to the host and returned; the editor still goes
    /// back to the edit menu with the snapshot untouched.
    pub fn submit_price<H>(
        &mut self,
        ctx: &mut EditorContext<'_, H>,
        text: &str,
    ) -> Result<u32, EditorError>
    where
        H: EditorHost + ?Sized,
    {
        let EditorState::CostPrompt { role, tier } = self.state else {
            return Err(self.invalid("submit a price"));
        };
        self.state = EditorState::EditMenu { role, tier };
        match parse_price(text) {
            Ok(value) => {
                if let Some(working) = self.working.as_mut() {
                    working.cost = value;
                }
                Ok(value)
            }
            Err(err) => {
                ctx.host.notify(&format!("[CGU] {err}"));
                Err(err.into())
            }
        }
    }

    pub fn open_category(&mut self, category: SlotCategory) -> Result<(), EditorError> {
        match self.state {
            EditorState::EditMenu { role, tier } => {
                self.state = EditorState::Category {
                    role,
                    tier,
                    category,
                };
                Ok(())
            }
            _ => Err(self.invalid("open a slot category")),
        }
    }

    fn category_slot(&self, slot: Slot, action: &'static str) -> Result<(Role, Tier), EditorError> {
        let EditorState::Category {
            role,
            tier,
            category,
        } = self.state
        else {
            return Err(self.invalid(action));
        };
        if !category.slots().contains(&slot) {
            return Err(EditorError::SlotNotInCategory { slot, category });
        }
        Ok((role, tier))
    }

    /// Browse the inventory screen for `slot` and store the chosen item.
    ///
    /// Returns to the edit menu whether or not something was picked.
    ///
    /// # Errors
    ///
    /// Fails outside a category menu, for a slot of another category, or when
    /// no item fits the slot.
    pub fn pick_slot<H>(
        &mut self,
        ctx: &mut EditorContext<'_, H>,
        slot: Slot,
    ) -> Result<PickOutcome, EditorError>
    where
        H: EditorHost + ?Sized,
    {
        let (role, tier) = self.category_slot(slot, "pick an item")?;
        self.state = EditorState::EditMenu { role, tier };
        let outcome = match pick_item(&mut self.candidates, &mut *ctx.host, slot) {
            Ok(outcome) => outcome,
            Err(err) => {
                ctx.host.notify(&format!("[CGU] {err}"));
                return Err(err.into());
            }
        };
        for warning in &outcome.rollback_warnings {
            ctx.host.notify(&format!("[CGU] {warning}"));
        }
        match (&outcome.selected, self.working.as_mut()) {
            (Some(id), Some(working)) => {
                working.set_item(slot, id.clone());
            }
            _ => ctx.host.notify(NO_SELECTION),
        }
        Ok(outcome)
    }

    /// Type an item id for `slot` instead of browsing.
    ///
    /// A blank entry reverts the slot to the catalog default, or drops it when
    /// the default has nothing there.
    ///
    /// # Errors
    ///
    /// Fails for unknown ids and items of the wrong type; the snapshot is left
    /// unchanged and the editor returns to the edit menu.
    pub fn enter_item_id<H>(
        &mut self,
        ctx: &mut EditorContext<'_, H>,
        slot: Slot,
        text: &str,
    ) -> Result<Option<ItemId>, EditorError>
    where
        H: EditorHost + ?Sized,
    {
        let (role, tier) = self.category_slot(slot, "enter an item id")?;
        self.state = EditorState::EditMenu { role, tier };
        let id = text.trim();

        if id.is_empty() {
            let default = ctx
                .catalog
                .lookup(role, tier)
                .and_then(|preset| preset.item(slot))
                .cloned();
            if let Some(working) = self.working.as_mut() {
                match &default {
                    Some(default_id) => {
                        working.set_item(slot, default_id.clone());
                    }
                    None => {
                        working.slots.remove(&slot);
                    }
                }
            }
            return Ok(default);
        }

        let result = match ctx.host.lookup_item(id) {
            None => Err(EditorError::ItemNotFound {
                slot,
                item_id: id.to_string(),
            }),
            Some(item) if !slot.accepts(item.item_type) => Err(EditorError::WrongItemType {
                slot,
                item_id: id.to_string(),
            }),
            Some(item) => Ok(item.id),
        };
        match result {
            Ok(item_id) => {
                if let Some(working) = self.working.as_mut() {
                    working.set_item(slot, item_id.clone());
                }
                Ok(Some(item_id))
            }
            Err(err) => {
                ctx.host.notify(&format!("[CGU] {err}"));
                Err(err)
            }
        }
    }

    /// Throw away in-session edits and recapture from the saved overrides.
    ///
    /// # Errors
    ///
    /// Fails outside the edit menu or if the preset disappeared from the catalog.
    pub fn reset<H>(&mut self, ctx: &mut EditorContext<'_, H>) -> Result<(), EditorError>
    where
        H: EditorHost + ?Sized,
    {
        let EditorState::EditMenu { role, tier } = self.state else {
            return Err(self.invalid("reset the tier"));
        };
        let Some(default) = ctx.catalog.lookup(role, tier) else {
            ctx.host.notify("[CGU] Missing preset.");
            return Err(EditorError::MissingPreset { role, tier });
        };
        self.working = Some(capture_snapshot(ctx.store, role, tier, default));
        Ok(())
    }

    /// Step back one menu. Leaving the edit menu asks whether to save.
    pub fn back(&mut self) -> Result<(), EditorError> {
        self.state = match self.state {
            EditorState::RoleSelect => EditorState::Closed,
            EditorState::TierSelect { .. } => EditorState::RoleSelect,
            EditorState::EditMenu { role, tier } => EditorState::SaveCancelPrompt { role, tier },
            EditorState::CostPrompt { role, tier } | EditorState::Category { role, tier, .. } => {
                EditorState::EditMenu { role, tier }
            }
            EditorState::SaveCancelPrompt { .. } | EditorState::Closed => {
                return Err(self.invalid("go back"));
            }
        };
        Ok(())
    }

    /// Commit the working snapshot as minimal overrides and return to the tier menu.
    ///
    /// # Errors
    ///
    /// Fails outside the save prompt, when the preset is gone, or when the
    /// snapshot holds a blank item id. The store is untouched on failure.
    pub fn save<H>(&mut self, ctx: &mut EditorContext<'_, H>) -> Result<CommitSummary, EditorError>
    where
        H: EditorHost + ?Sized,
    {
        let EditorState::SaveCancelPrompt { role, tier } = self.state else {
            return Err(self.invalid("save"));
        };
        let Some(default) = ctx.catalog.lookup(role, tier) else {
            ctx.host.notify("[CGU] Missing preset.");
            return Err(EditorError::MissingPreset { role, tier });
        };
        let summary = match self.working.as_ref() {
            Some(working) => commit_snapshot(ctx.store, role, tier, default, working)?,
            None => CommitSummary::default(),
        };
        log::info!(
            "saved {role} tier {tier} preset ({} overrides written)",
            summary.written.len()
        );
        ctx.host.notify("[CGU] Preset saved.");
        self.working = None;
        self.state = EditorState::TierSelect { role };
        Ok(summary)
    }

    /// Drop the working snapshot and return to the tier menu.
    pub fn discard(&mut self) -> Result<(), EditorError> {
        let EditorState::SaveCancelPrompt { role, .. } = self.state else {
            return Err(self.invalid("discard"));
        };
        self.working = None;
        self.state = EditorState::TierSelect { role };
        Ok(())
    }
}
