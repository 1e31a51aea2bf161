//! Centralized reference constants for Grimoire rules resolution.
//!
//! Values here come from the rulebook and the reference catalog conventions.
//! Keeping them together means rules can only be adjusted via reviewed code
//! changes rather than through external JSON assets.

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_COMPETENCES: &str = "grimoire::competences";
pub(crate) const LOG_TARGET_CATALOG: &str = "grimoire::catalog";
pub(crate) const LOG_TARGET_SHEET: &str = "grimoire::sheet";
pub(crate) const LOG_TARGET_ENGINE: &str = "grimoire::engine";

// Status effects -----------------------------------------------------------
/// Highest dose any status effect can reach.
pub const MAX_DOSE: i32 = 10;
/// Number of entries in every dose table (dose 0 through `MAX_DOSE`).
pub const DOSE_LEVELS: usize = 11;

// Competences --------------------------------------------------------------
/// Prefix marking a competence `source` as owned by a rule.
pub const SYSTEM_SOURCE_PREFIX: &str = "system:";
/// Bare source tags written by older sheets before the prefix existed.
pub(crate) const LEGACY_SYSTEM_TAGS: &[&str] = &["les_yeux"];
pub(crate) const SYSTEM_ID_SEED: u64 = 0x6772_696d_6f69_7265;
/// Passes over the rule set before giving up on reaching a fixed point.
pub const MAX_RULE_PASSES: usize = 8;

// Inventory ----------------------------------------------------------------
/// Highest rupture upper bound reachable through modifiers.
pub const DEFAULT_RUPTURE_CAP: i32 = 6;
pub(crate) const RUPTURE_NONE: &str = "Non";
pub(crate) const RUPTURE_NONE_SPELLINGS: &[&str] = &["non", "aucune", ""];
pub(crate) const BEVERAGE_CATEGORY_WEIGHT_G: f64 = 250.0;
pub(crate) const BOTTOMLESS_WINESKIN_NAME: &str = "Outre d'abondance (enchantée)";
pub(crate) const BOTTOMLESS_WINESKIN_WEIGHT_G: f64 = 12.5;
/// Category hidden from the shopping-list picker.
pub const BARE_HANDS_CATEGORY: &str = "Mains_nues";
/// Group label for catalogue lines whose reference vanished.
pub const UNKNOWN_CATEGORY_LABEL: &str = "Autre";

// Sheet --------------------------------------------------------------------
/// Natural Adresse above which a permanent AT/PRD bonus is offered.
pub const ADRESSE_BONUS_THRESHOLD: i32 = 12;
pub(crate) const SHIELD_MARKER: &str = "bouclier";
pub(crate) const FLOOR_LABEL: &str = "Plancher";
