use anyhow::Result;
use companion_gear::{OverrideStore, PresetCatalog};

pub mod catalog;
pub mod flows;
pub mod smoke;

/// Shared inputs for every scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioCtx {
    pub catalog: &'static PresetCatalog,
    /// Overrides loaded with `--overrides`, empty otherwise.
    pub overrides: OverrideStore,
}

impl ScenarioCtx {
    pub const fn new(catalog: &'static PresetCatalog, overrides: OverrideStore) -> Self {
        Self { catalog, overrides }
    }
}

pub type ScenarioFn = fn(&ScenarioCtx) -> Result<()>;

#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub key: &'static str,
    pub name: &'static str,
    pub run: ScenarioFn,
}

impl Scenario {
    pub const fn new(key: &'static str, name: &'static str, run: ScenarioFn) -> Self {
        Self { key, name, run }
    }
}

const SCENARIOS: &[Scenario] = &[
    Scenario::new("smoke", "Smoke Test", smoke::smoke),
    Scenario::new(
        "default-presets",
        "Empty Store Yields Catalog Defaults",
        catalog::default_presets,
    ),
    Scenario::new(
        "override-capture",
        "Item Overrides Appear In Capture",
        catalog::override_capture,
    ),
    Scenario::new(
        "no-op-commit",
        "Unedited Commit Leaves Store Unchanged",
        catalog::no_op_commit,
    ),
    Scenario::new(
        "minimal-diff",
        "Edits Back To Default Clear Overrides",
        catalog::minimal_diff,
    ),
    Scenario::new("reset-all", "Reset All Clears One Pair", catalog::reset_all),
    Scenario::new(
        "archer-cost",
        "Archer Tier 1 Cost Round Trip",
        catalog::archer_cost,
    ),
    Scenario::new(
        "insufficient-gold",
        "Insufficient Gold Refuses Upgrade",
        flows::insufficient_gold,
    ),
    Scenario::new(
        "unknown-item",
        "Unknown Item Aborts Upgrade",
        flows::unknown_item,
    ),
    Scenario::new(
        "editor-session",
        "Editor Save And Discard",
        flows::editor_session,
    ),
    Scenario::new(
        "picker-rollback",
        "Picker Leaves No Side Effects",
        flows::picker_rollback,
    ),
    Scenario::new(
        "companion-dialog",
        "Companion Dialog Purchase",
        flows::companion_dialog,
    ),
];

pub fn get_scenario(name: &str) -> Option<Scenario> {
    let key = match name.to_lowercase().as_str() {
        "defaults" => "default-presets",
        "capture" => "override-capture",
        "no-op" | "noop" => "no-op-commit",
        "diff" => "minimal-diff",
        "reset" => "reset-all",
        "gold" => "insufficient-gold",
        "editor" => "editor-session",
        "picker" => "picker-rollback",
        "dialog" => "companion-dialog",
        other => return SCENARIOS.iter().find(|s| s.key == other).copied(),
    };
    SCENARIOS.iter().find(|s| s.key == key).copied()
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.iter().map(|s| (s.key, s.name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = list_scenarios().into_iter().map(|(key, _)| key).collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn aliases_resolve_to_catalog_entries() {
        assert_eq!(get_scenario("picker").map(|s| s.key), Some("picker-rollback"));
        assert_eq!(get_scenario("SMOKE").map(|s| s.key), Some("smoke"));
        assert!(get_scenario("nope").is_none());
    }

    #[test]
    fn every_scenario_passes_on_builtin_data() {
        let ctx = ScenarioCtx::new(PresetCatalog::builtin(), OverrideStore::new());
        for scenario in SCENARIOS {
            if let Err(err) = (scenario.run)(&ctx) {
                panic!("{} failed: {err:#}", scenario.key);
            }
        }
    }
}
