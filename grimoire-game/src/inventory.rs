//! Inventory metrics: item weight, rupture ranges and the shopping-list
//! ("catalogue") totals.
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use crate::catalog::{EquipmentCategory, RefEquipment, ReferenceCatalog};
use crate::constants::{
    BEVERAGE_CATEGORY_WEIGHT_G, BOTTOMLESS_WINESKIN_NAME, BOTTOMLESS_WINESKIN_WEIGHT_G,
    DEFAULT_RUPTURE_CAP, LOG_TARGET_CATALOG, RUPTURE_NONE, RUPTURE_NONE_SPELLINGS,
    UNKNOWN_CATEGORY_LABEL,
};
use crate::data::RulesDataError;
use crate::numbers::{lenient_i32, next_sequential_id, value_to_bool, value_to_f64};

// ---------------------------------------------------------------------------
// Weight
// ---------------------------------------------------------------------------

struct WeightOverride {
    category: EquipmentCategory,
    grams: f64,
    exceptions: &'static [(&'static str, f64)],
}

fn weight_overrides() -> &'static [WeightOverride] {
    static OVERRIDES: OnceLock<Vec<WeightOverride>> = OnceLock::new();
    OVERRIDES.get_or_init(|| {
        vec![WeightOverride {
            category: EquipmentCategory::Boissons,
            grams: BEVERAGE_CATEGORY_WEIGHT_G,
            exceptions: &[(BOTTOMLESS_WINESKIN_NAME, BOTTOMLESS_WINESKIN_WEIGHT_G)],
        }]
    })
}

/// Weight in grams: named exception, then category default, then stored weight.
#[must_use]
pub fn weight_of(item: &RefEquipment) -> f64 {
    let Some(rule) = weight_overrides()
        .iter()
        .find(|rule| rule.category == item.category)
    else {
        return if item.weight.is_finite() { item.weight } else { 0.0 };
    };
    rule.exceptions
        .iter()
        .find(|(name, _)| *name == item.name)
        .map_or(rule.grams, |(_, grams)| *grams)
}

// ---------------------------------------------------------------------------
// Rupture
// ---------------------------------------------------------------------------

fn rupture_separator() -> Option<&'static Regex> {
    static SEPARATOR: OnceLock<Option<Regex>> = OnceLock::new();
    SEPARATOR
        .get_or_init(|| Regex::new("à|to|-|/").ok())
        .as_ref()
}

/// Upper bound of a rupture string: `"Non"` → 0, `"3"` → 3, `"1 à 4"` → 4.
#[must_use]
pub fn normalize_rupture(rupture: &str) -> i32 {
    let lowered = rupture.trim().to_lowercase();
    if RUPTURE_NONE_SPELLINGS.contains(&lowered.as_str()) {
        return 0;
    }
    let last = rupture_separator()
        .and_then(|re| re.split(&lowered).last())
        .unwrap_or(lowered.as_str());
    lenient_i32(last.trim())
}

/// Render a rupture upper bound in canonical form.
#[must_use]
pub fn format_rupture(max: i32) -> String {
    match max {
        i32::MIN..=0 => RUPTURE_NONE.to_string(),
        1 => "1".to_string(),
        _ => format!("1à{max}"),
    }
}

/// Rupture after a player-chosen modifier.
#[must_use]
pub fn apply_rupture_modifier(base: &str, modifier: i32) -> String {
    format_rupture(normalize_rupture(base).saturating_add(modifier))
}

/// Modifier choices keeping the upper bound at or below `cap`.
#[must_use]
pub fn available_modifier_options(base: &str, cap: i32) -> Vec<i32> {
    let base = normalize_rupture(base);
    if base >= cap {
        return vec![0];
    }
    (0..=cap.saturating_sub(base)).collect()
}

/// [`available_modifier_options`] with the rulebook cap.
#[must_use]
pub fn default_modifier_options(base: &str) -> Vec<i32> {
    available_modifier_options(base, DEFAULT_RUPTURE_CAP)
}

// ---------------------------------------------------------------------------
// Catalogue (shopping list)
// ---------------------------------------------------------------------------

/// Price multiplier for how hard an item is to find.
///
/// Stored sheets may carry multipliers outside the four known ones. Those
/// read back as [`Rarity::Normal`]; use [`Rarity::try_from`] to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "f64")]
pub enum Rarity {
    Half,
    #[default]
    Normal,
    OneAndHalf,
    Double,
}

impl Rarity {
    pub const ALL: [Self; 4] = [Self::Half, Self::Normal, Self::OneAndHalf, Self::Double];

    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Half => 0.5,
            Self::Normal => 1.0,
            Self::OneAndHalf => 1.5,
            Self::Double => 2.0,
        }
    }
}

impl TryFrom<f64> for Rarity {
    type Error = RulesDataError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|rarity| (rarity.multiplier() - value).abs() < f64::EPSILON)
            .ok_or(RulesDataError::InvalidRarity(value))
    }
}

impl From<Rarity> for f64 {
    fn from(value: Rarity) -> Self {
        value.multiplier()
    }
}

impl<'de> Deserialize<'de> for Rarity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        if raw.is_null() {
            return Ok(Self::Normal);
        }
        Ok(Self::try_from(value_to_f64(&raw)).unwrap_or_else(|err| {
            log::warn!(target: LOG_TARGET_CATALOG, "{err}, using normal rarity");
            Self::Normal
        }))
    }
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = crate::numbers::deserialize_lenient_i32(deserializer)?;
    Ok(u32::try_from(raw.max(1)).unwrap_or(1))
}

const fn default_quantity() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}

fn deserialize_included<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_bool(&Value::deserialize(deserializer)?).unwrap_or(true))
}

/// One entry of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueLine {
    #[serde(default)]
    pub uid: String,
    #[serde(
        rename = "refId",
        default,
        deserialize_with = "crate::numbers::deserialize_lenient_i64"
    )]
    pub ref_id: i64,
    #[serde(
        rename = "quantite",
        default = "default_quantity",
        deserialize_with = "deserialize_quantity"
    )]
    pub quantity: u32,
    #[serde(rename = "rarete", default)]
    pub rarity: Rarity,
    #[serde(
        rename = "is_included",
        default = "default_true",
        deserialize_with = "deserialize_included"
    )]
    pub included: bool,
    #[serde(
        rename = "is_condensed",
        default,
        deserialize_with = "crate::numbers::deserialize_lenient_bool"
    )]
    pub condensed: bool,
}

/// Sums over included lines.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CatalogueTotals {
    pub total_price: f64,
    /// Grams.
    pub total_weight: f64,
}

/// Per-line amounts shown next to each row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LineTotals {
    pub price: f64,
    pub unit_weight: f64,
    pub weight: f64,
}

/// Amounts for one line; `None` when its reference item is gone.
#[must_use]
pub fn line_totals(line: &CatalogueLine, catalog: &ReferenceCatalog) -> Option<LineTotals> {
    let item = catalog.get(line.ref_id)?;
    let quantity = f64::from(line.quantity);
    let unit_weight = weight_of(item);
    Some(LineTotals {
        price: item.price * line.rarity.multiplier() * quantity,
        unit_weight,
        weight: unit_weight * quantity,
    })
}

/// Price and weight of the included lines. Lines whose reference vanished
/// count for nothing.
#[must_use]
pub fn aggregate_catalogue(lines: &[CatalogueLine], catalog: &ReferenceCatalog) -> CatalogueTotals {
    lines
        .iter()
        .filter(|line| line.included)
        .filter_map(|line| line_totals(line, catalog))
        .fold(CatalogueTotals::default(), |acc, line| CatalogueTotals {
            total_price: acc.total_price + line.price,
            total_weight: acc.total_weight + line.weight,
        })
}

/// Append a line for `ref_id` with quantity 1 and normal rarity.
#[must_use]
pub fn add_line(lines: &[CatalogueLine], ref_id: i64, condensed: bool) -> Vec<CatalogueLine> {
    let uid = next_sequential_id("ligne", lines.iter().map(|line| line.uid.as_str()));
    let mut next = lines.to_vec();
    next.push(CatalogueLine {
        uid,
        ref_id,
        quantity: 1,
        rarity: Rarity::Normal,
        included: true,
        condensed,
    });
    next
}

/// Partial edit of a line; `None` fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineUpdate {
    pub quantity: Option<u32>,
    pub rarity: Option<Rarity>,
    pub included: Option<bool>,
    pub condensed: Option<bool>,
}

/// Apply `update` to the line with `uid`. Quantities are floored at 1.
#[must_use]
pub fn update_line(lines: &[CatalogueLine], uid: &str, update: LineUpdate) -> Vec<CatalogueLine> {
    lines
        .iter()
        .map(|line| {
            if line.uid != uid {
                return line.clone();
            }
            CatalogueLine {
                quantity: update.quantity.map_or(line.quantity, |q| q.max(1)),
                rarity: update.rarity.unwrap_or(line.rarity),
                included: update.included.unwrap_or(line.included),
                condensed: update.condensed.unwrap_or(line.condensed),
                ..line.clone()
            }
        })
        .collect()
}

/// Set a quantity typed by the player; anything below 1 becomes 1.
#[must_use]
pub fn set_quantity(lines: &[CatalogueLine], uid: &str, quantity: i32) -> Vec<CatalogueLine> {
    let quantity = u32::try_from(quantity.max(1)).unwrap_or(1);
    update_line(
        lines,
        uid,
        LineUpdate {
            quantity: Some(quantity),
            ..LineUpdate::default()
        },
    )
}

#[must_use]
pub fn remove_line(lines: &[CatalogueLine], uid: &str) -> Vec<CatalogueLine> {
    lines.iter().filter(|line| line.uid != uid).cloned().collect()
}

/// Toggle the condensed view on every line at once.
#[must_use]
pub fn set_all_condensed(lines: &[CatalogueLine], condensed: bool) -> Vec<CatalogueLine> {
    lines
        .iter()
        .map(|line| CatalogueLine {
            condensed,
            ..line.clone()
        })
        .collect()
}

/// Lines grouped by category name in first-appearance order.
#[must_use]
pub fn group_by_category<'a>(
    lines: &'a [CatalogueLine],
    catalog: &ReferenceCatalog,
) -> Vec<(String, Vec<&'a CatalogueLine>)> {
    let mut groups: Vec<(String, Vec<&CatalogueLine>)> = Vec::new();
    for line in lines {
        let name = catalog
            .get(line.ref_id)
            .map_or(UNKNOWN_CATEGORY_LABEL, |item| item.category.as_str());
        match groups.iter_mut().find(|(group, _)| group == name) {
            Some((_, members)) => members.push(line),
            None => groups.push((name.to_string(), vec![line])),
        }
    }
    groups
}

/// Integers print bare, everything else with two decimals.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.is_finite() {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RawRefRecord;
    use serde_json::json;

    fn catalog() -> ReferenceCatalog {
        let records: Vec<RawRefRecord> = serde_json::from_value(json!([
            {"id": 1, "category": "Armes", "nom": "Épée", "prix_info": {"prix": 10}, "details": {"poids": 1200}},
            {"id": 2, "category": "Boissons", "nom": "Bière", "prix_info": {"prix": 100}, "details": {"poids": 900}},
            {"id": 3, "category": "Boissons", "nom": "Outre d'abondance (enchantée)", "prix_info": {"prix": 2.5}},
            {"id": 4, "category": "Sacs", "nom": "Sac", "details": {"poids": "350g"}}
        ]))
        .unwrap();
        ReferenceCatalog::from_records(records)
    }

    #[test]
    fn beverage_weights_are_overridden() {
        let catalog = catalog();
        assert!((weight_of(catalog.get(1).unwrap()) - 1200.0).abs() < f64::EPSILON);
        assert!((weight_of(catalog.get(2).unwrap()) - 250.0).abs() < f64::EPSILON);
        assert!((weight_of(catalog.get(3).unwrap()) - 12.5).abs() < f64::EPSILON);
        assert!((weight_of(catalog.get(4).unwrap()) - 350.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rupture_normalization() {
        assert_eq!(normalize_rupture("Non"), 0);
        assert_eq!(normalize_rupture(" AUCUNE "), 0);
        assert_eq!(normalize_rupture(""), 0);
        assert_eq!(normalize_rupture("3"), 3);
        assert_eq!(normalize_rupture("1à3"), 3);
        assert_eq!(normalize_rupture("1 À 5"), 5);
        assert_eq!(normalize_rupture("1-2"), 2);
        assert_eq!(normalize_rupture("1/4"), 4);
        assert_eq!(normalize_rupture("1 to 6"), 6);
        assert_eq!(normalize_rupture("fragile"), 0);
    }

    #[test]
    fn rupture_modifier_renders_canonical_form() {
        assert_eq!(apply_rupture_modifier("1à3", 1), "1à4");
        assert_eq!(apply_rupture_modifier("Non", 2), "1à2");
        assert_eq!(apply_rupture_modifier("Non", 1), "1");
        assert_eq!(apply_rupture_modifier("1à2", -5), "Non");
        assert_eq!(apply_rupture_modifier("1 - 3", 0), "1à3");
    }

    #[test]
    fn modifier_options_respect_the_cap() {
        assert_eq!(default_modifier_options("1à4"), [0, 1, 2]);
        assert_eq!(default_modifier_options("Non"), [0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(default_modifier_options("1à6"), [0]);
        assert_eq!(available_modifier_options("1à9", 6), [0]);
    }

    #[test]
    fn rarity_only_accepts_the_four_multipliers() {
        let line: CatalogueLine =
            serde_json::from_str(r#"{"uid": "a", "refId": 1, "rarete": 1.5}"#).unwrap();
        assert_eq!(line.rarity, Rarity::OneAndHalf);
        assert_eq!(line.quantity, 1);
        assert!(line.included);
        assert!(Rarity::try_from(3.0).is_err());
        assert_eq!(Rarity::try_from(2.0).unwrap(), Rarity::Double);
    }

    #[test]
    fn unknown_rarity_reads_as_normal() {
        for raw in [r#""rarete": 3"#, r#""rarete": 1.25"#, r#""rarete": null"#] {
            let line: CatalogueLine =
                serde_json::from_str(&format!(r#"{{"uid": "a", "refId": 1, {raw}}}"#)).unwrap();
            assert_eq!(line.rarity, Rarity::Normal, "{raw}");
        }
        let line: CatalogueLine =
            serde_json::from_str(r#"{"uid": "a", "refId": 1, "rarete": "0.5"}"#).unwrap();
        assert_eq!(line.rarity, Rarity::Half);
    }

    #[test]
    fn line_flags_tolerate_nulls_and_numbers() {
        let line: CatalogueLine = serde_json::from_str(
            r#"{"uid": "a", "is_included": null, "is_condensed": 1, "quantite": null}"#,
        )
        .unwrap();
        assert_eq!(line.ref_id, 0);
        assert!(line.included);
        assert!(line.condensed);
        assert_eq!(line.quantity, 1);

        let line: CatalogueLine =
            serde_json::from_str(r#"{"refId": 2, "is_included": "false", "is_condensed": null}"#)
                .unwrap();
        assert!(!line.included);
        assert!(!line.condensed);
    }

    #[test]
    fn totals_skip_excluded_and_missing_lines() {
        let catalog = catalog();
        let lines = add_line(&add_line(&add_line(&[], 1, false), 2, false), 99, false);
        let lines = update_line(
            &lines,
            "ligne-1",
            LineUpdate {
                quantity: Some(2),
                rarity: Some(Rarity::OneAndHalf),
                ..LineUpdate::default()
            },
        );
        let lines = update_line(
            &lines,
            "ligne-2",
            LineUpdate {
                included: Some(false),
                ..LineUpdate::default()
            },
        );
        let totals = aggregate_catalogue(&lines, &catalog);
        assert!((totals.total_price - 30.0).abs() < f64::EPSILON);
        assert!((totals.total_weight - 2400.0).abs() < f64::EPSILON);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn line_edits_return_new_lists() {
        let lines = add_line(&[], 4, true);
        assert_eq!(lines[0].uid, "ligne-1");
        assert!(lines[0].condensed);
        assert_eq!(set_quantity(&lines, "ligne-1", -3)[0].quantity, 1);
        assert_eq!(set_quantity(&lines, "ligne-1", 5)[0].quantity, 5);
        assert!(!set_all_condensed(&lines, false)[0].condensed);
        assert!(remove_line(&lines, "ligne-1").is_empty());
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let catalog = catalog();
        let lines = [1, 99, 2, 3, 1]
            .into_iter()
            .fold(Vec::new(), |acc, id| add_line(&acc, id, false));
        let groups = group_by_category(&lines, &catalog);
        let names: Vec<_> = groups.iter().map(|(name, members)| (name.as_str(), members.len())).collect();
        assert_eq!(names, [("Armes", 2), ("Autre", 1), ("Boissons", 2)]);
    }

    #[test]
    fn amounts_format_like_prices() {
        assert_eq!(format_amount(30.0), "30");
        assert_eq!(format_amount(12.5), "12.50");
        assert_eq!(format_amount(0.126), "0.13");
    }
}
