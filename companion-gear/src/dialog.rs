//! Conversation flow for buying an upgrade: pick a role, then a tier.
use serde::Serialize;
use thiserror::Error;

use crate::editor::{TierOption, tier_options};
use crate::gear::{Role, Tier};
use crate::host::{Companion, UpgradeHost};
use crate::overrides::OverrideStore;
use crate::preset::PresetCatalog;
use crate::upgrade::{UpgradeError, UpgradeReceipt, apply_upgrade};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum DialogStep {
    RoleMenu,
    TierMenu { role: Role },
    Finished,
}

#[derive(Debug, Error)]
pub enum DialogError {
    #[error("the dialog is not waiting for a {expected}")]
    UnexpectedChoice { expected: &'static str },
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
}

/// Player-facing label for each role option.
#[must_use]
pub const fn role_label(role: Role) -> &'static str {
    match role {
        Role::Infantry => "Soldier (infantry)",
        Role::Archer => "Archer",
        Role::Lancer => "Lancer (cavalry)",
    }
}

/// Upgrade conversation with one companion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeDialog {
    step: DialogStep,
}

impl UpgradeDialog {
    /// The upgrade line is only offered to player companions.
    #[must_use]
    pub fn is_available<C: Companion + ?Sized>(target: &C) -> bool {
        target.is_player_companion()
    }

    #[must_use]
    pub fn open<C: Companion + ?Sized>(target: &C) -> Option<Self> {
        Self::is_available(target).then_some(Self {
            step: DialogStep::RoleMenu,
        })
    }

    #[must_use]
    pub const fn step(&self) -> DialogStep {
        self.step
    }

    #[must_use]
    pub fn role_options() -> Vec<(Role, &'static str)> {
        Role::ALL.iter().map(|&role| (role, role_label(role))).collect()
    }

    pub fn choose_role(&mut self, role: Role) -> Result<(), DialogError> {
        if self.step != DialogStep::RoleMenu {
            return Err(DialogError::UnexpectedChoice { expected: "role" });
        }
        self.step = DialogStep::TierMenu { role };
        Ok(())
    }

    /// Tier lines for the selected role; unavailable tiers are hidden by the host.
    #[must_use]
    pub fn tier_options(&self, catalog: &PresetCatalog, store: &OverrideStore) -> Vec<TierOption> {
        match self.step {
            DialogStep::TierMenu { role } => tier_options(catalog, store, role),
            _ => Vec::new(),
        }
    }

    /// Buy `tier` for the selected role and end the conversation branch.
    ///
    /// Failures are reported to the host and the dialog still finishes.
    ///
    /// # Errors
    ///
    /// Fails when no role was chosen, or with the [`UpgradeError`] that stopped
    /// the purchase.
    pub fn choose_tier<H, C>(
        &mut self,
        catalog: &PresetCatalog,
        store: &OverrideStore,
        host: &mut H,
        target: &mut C,
        tier: Tier,
    ) -> Result<UpgradeReceipt, DialogError>
    where
        H: UpgradeHost + ?Sized,
        C: Companion + ?Sized,
    {
        let DialogStep::TierMenu { role } = self.step else {
            return Err(DialogError::UnexpectedChoice { expected: "tier" });
        };
        self.step = DialogStep::Finished;
        apply_upgrade(catalog, store, &mut *host, &mut *target, role, tier).map_err(|err| {
            host.notify(&err.to_string());
            DialogError::from(err)
        })
    }

    /// Back from the tier menu returns to roles; back from roles ends the branch.
    pub fn back(&mut self) {
        self.step = match self.step {
            DialogStep::TierMenu { .. } => DialogStep::RoleMenu,
            DialogStep::RoleMenu | DialogStep::Finished => DialogStep::Finished,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{MemoryCompanion, MemoryHost};

    #[test]
    fn only_player_companions_get_the_dialog() {
        assert!(UpgradeDialog::open(&MemoryCompanion::stranger("Bandit")).is_none());
        let dialog = UpgradeDialog::open(&MemoryCompanion::recruited("Ira")).unwrap();
        assert_eq!(dialog.step(), DialogStep::RoleMenu);
    }

    #[test]
    fn back_walks_up_the_menus() {
        let mut dialog = UpgradeDialog::open(&MemoryCompanion::recruited("Ira")).unwrap();
        dialog.choose_role(Role::Archer).unwrap();
        assert!(dialog.choose_role(Role::Lancer).is_err());
        dialog.back();
        assert_eq!(dialog.step(), DialogStep::RoleMenu);
        dialog.back();
        assert_eq!(dialog.step(), DialogStep::Finished);
    }

    #[test]
    fn failed_purchase_notifies_and_finishes() {
        let catalog = PresetCatalog::builtin();
        let store = OverrideStore::new();
        let mut host = MemoryHost::stocked(2000);
        let mut ira = MemoryCompanion::recruited("Ira");
        let mut dialog = UpgradeDialog::open(&ira).unwrap();
        assert!(dialog.tier_options(catalog, &store).is_empty());

        dialog.choose_role(Role::Archer).unwrap();
        let labels: Vec<String> = dialog
            .tier_options(catalog, &store)
            .into_iter()
            .map(|option| option.label)
            .collect();
        assert_eq!(labels[0], "Tier 1 (3000 gold)");

        let err = dialog
            .choose_tier(catalog, &store, &mut host, &mut ira, 1)
            .expect_err("not enough gold");
        assert!(matches!(
            err,
            DialogError::Upgrade(UpgradeError::InsufficientFunds { .. })
        ));
        assert_eq!(dialog.step(), DialogStep::Finished);
        assert_eq!(host.messages(), ["Not enough gold.".to_string()]);
    }

    #[test]
    fn role_labels_match_menu() {
        let labels: Vec<&str> = UpgradeDialog::role_options()
            .into_iter()
            .map(|(_, label)| label)
            .collect();
        assert_eq!(labels, ["Soldier (infantry)", "Archer", "Lancer (cavalry)"]);
    }
}
