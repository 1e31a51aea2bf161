use crate::logic::checks::{self, CheckFn};

/// A named invariant swept over seeded random sheets.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub check: CheckFn,
}

impl TestScenario {
    #[must_use]
    pub fn new(name: impl Into<String>, check: CheckFn) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

const SCENARIOS: &[(&str, &str, CheckFn)] = &[
    ("smoke", "Smoke Test", checks::check_smoke),
    ("ledger", "Ledger Totals", checks::check_ledger_totals),
    (
        "competences",
        "Competence Rule Application",
        checks::check_competence_rules,
    ),
    ("rupture", "Rupture Normalization", checks::check_rupture),
    ("status", "Status Dose Clamping", checks::check_status_doses),
    (
        "origins",
        "Origin Classification",
        checks::check_origin_classification,
    ),
    ("catalogue", "Catalogue Totals", checks::check_catalogue_totals),
    ("shields", "Shield Toggle", checks::check_shields),
];

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = name.trim().to_lowercase();
    let key = match key.as_str() {
        "stats" | "totals" => "ledger",
        "skills" | "rules" => "competences",
        "inventory" | "shopping" => "catalogue",
        other => other,
    };
    SCENARIOS
        .iter()
        .find(|(id, _, _)| *id == key)
        .map(|(_, label, check)| TestScenario::new(*label, *check))
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.iter().map(|(id, label, _)| (*id, *label)).collect()
}
