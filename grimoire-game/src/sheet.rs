//! Character sheet resolution.
//!
//! Every derived number on the sheet is resolved here as a [`StatDetail`],
//! combining the entered base, equipped reference items, racial modifiers
//! and temporary status effects. Temporary ("Add.") columns stay separate
//! and are only added for display.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::attributes::{Attribute, AttributeVector, DerivedStat};
use crate::catalog::{Characteristics, Protections, RefEquipment, ReferenceCatalog};
use crate::competences::Competence;
use crate::constants::{ADRESSE_BONUS_THRESHOLD, LOG_TARGET_SHEET, SHIELD_MARKER};
use crate::inventory::CatalogueLine;
use crate::ledger::{Ledger, StatDetail};
use crate::numbers::{
    deserialize_lenient_bool, deserialize_lenient_i32, deserialize_lenient_i64, null_as_default,
};
use crate::origin::{Archetype, RacialTable, classify};
use crate::status::{CharacterStatus, state_malus_contributions, status_contributions};

/// Entered base value plus the temporary adjustment column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValuePair {
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub base: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub temp: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Defenses {
    #[serde(default)]
    pub naturelle: ValuePair,
    #[serde(default)]
    pub solide: ValuePair,
    #[serde(default)]
    pub speciale: ValuePair,
    #[serde(default)]
    pub magique: ValuePair,
    /// Shields only protect while raised.
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub bouclier_actif: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Movement {
    #[serde(default)]
    pub marche: ValuePair,
    #[serde(default)]
    pub course: ValuePair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MagicStealth {
    #[serde(default)]
    pub magie_physique: ValuePair,
    #[serde(default)]
    pub magie_psychique: ValuePair,
    #[serde(default)]
    pub resistance_magique: ValuePair,
    #[serde(default)]
    pub discretion: ValuePair,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nom: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub origine: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metier: String,
    /// Fields the engine does not read (level, experience, ...), kept for saving.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A reference item worn or carried in hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedItem {
    #[serde(rename = "refId", default, deserialize_with = "deserialize_lenient_i64")]
    pub ref_id: i64,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub modif_rupture: i32,
}

/// Permanent bonus chosen once natural Adresse exceeds the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdresseBonus {
    #[serde(rename = "AT")]
    Attaque,
    #[serde(rename = "PRD")]
    Parade,
}

impl AdresseBonus {
    #[must_use]
    pub const fn attribute(self) -> Attribute {
        match self {
            Self::Attaque => Attribute::Attaque,
            Self::Parade => Attribute::Parade,
        }
    }
}

/// Anything but `"AT"` or `"PRD"` reads as "not chosen yet".
fn deserialize_adresse_bonus<'de, D>(deserializer: D) -> Result<Option<AdresseBonus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    Ok(AdresseBonus::deserialize(&raw).map_or_else(
        |_| {
            log::warn!(target: LOG_TARGET_SHEET, "ignoring adresse bonus {raw}");
            None
        },
        Some,
    ))
}

/// The character document as persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharacterSheet {
    #[serde(default)]
    pub identity: Option<Identity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub caracteristiques: AttributeVector,
    #[serde(default, deserialize_with = "null_as_default")]
    pub defenses: Defenses,
    #[serde(default, deserialize_with = "null_as_default")]
    pub movement: Movement,
    #[serde(default, rename = "magic", deserialize_with = "null_as_default")]
    pub magie: MagicStealth,
    #[serde(default, deserialize_with = "null_as_default")]
    pub equipement: Vec<EquippedItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: CharacterStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub competences: Vec<Competence>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub catalogue: Vec<CatalogueLine>,
    #[serde(default, deserialize_with = "deserialize_adresse_bonus")]
    pub adresse_bonus: Option<AdresseBonus>,
    /// Sections owned by other parts of the app (vitals, notes, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CharacterSheet {
    /// Archetype selected by the free-text origin; `humain` without identity.
    #[must_use]
    pub fn archetype(&self) -> Archetype {
        self.identity
            .as_ref()
            .map_or_else(Archetype::default, |identity| classify(&identity.origine))
    }
}

/// Reference data a sheet resolves against.
#[derive(Debug, Clone, Copy)]
pub struct SheetContext<'a> {
    pub catalog: &'a ReferenceCatalog,
    pub racial: &'a RacialTable,
}

impl<'a> SheetContext<'a> {
    #[must_use]
    pub const fn new(catalog: &'a ReferenceCatalog, racial: &'a RacialTable) -> Self {
        Self { catalog, racial }
    }
}

/// Equipped items present in the catalog, in equipment order.
pub fn equipped_items<'a>(
    sheet: &'a CharacterSheet,
    catalog: &'a ReferenceCatalog,
) -> impl Iterator<Item = (&'a EquippedItem, &'a RefEquipment)> + 'a {
    sheet.equipement.iter().filter_map(move |slot| {
        let item = catalog.get(slot.ref_id);
        if item.is_none() {
            log::trace!(
                target: LOG_TARGET_SHEET,
                "equipped reference {} not in catalog, skipped",
                slot.ref_id
            );
        }
        item.map(|item| (slot, item))
    })
}

fn is_shield(item: &RefEquipment) -> bool {
    item.name.to_lowercase().contains(SHIELD_MARKER)
}

fn push_equipment<F>(ledger: &mut Ledger, sheet: &CharacterSheet, ctx: &SheetContext<'_>, value: F)
where
    F: Fn(&RefEquipment) -> i32,
{
    for (_, item) in equipped_items(sheet, ctx.catalog) {
        ledger.push_nonzero(item.name.clone(), value(item));
    }
}

fn characteristic_of(item: &RefEquipment, pick: fn(&Characteristics) -> i32) -> i32 {
    item.characteristics().map_or(0, pick)
}

fn push_racial(ledger: &mut Ledger, archetype: Archetype, ctx: &SheetContext<'_>, stat: DerivedStat) {
    ledger.extend(ctx.racial.stat_contribution(archetype, stat));
}

/// The four protection ratings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DefenseBreakdown {
    pub naturelle: StatDetail,
    pub solide: StatDetail,
    pub speciale: StatDetail,
    pub magique: StatDetail,
}

fn armour_rating(
    sheet: &CharacterSheet,
    ctx: &SheetContext<'_>,
    stat: DerivedStat,
    pick: fn(&Protections) -> i32,
) -> StatDetail {
    let mut ledger = Ledger::new(0).with_formula(format!("{} = équipement + origine", stat.label()));
    for (_, item) in equipped_items(sheet, ctx.catalog) {
        if is_shield(item) && !sheet.defenses.bouclier_actif {
            continue;
        }
        ledger.push_nonzero(item.name.clone(), item.protections().map_or(0, pick));
    }
    push_racial(&mut ledger, sheet.archetype(), ctx, stat);
    ledger.finish()
}

#[must_use]
pub fn compute_defenses(sheet: &CharacterSheet, ctx: &SheetContext<'_>) -> DefenseBreakdown {
    let mut naturelle = Ledger::new(sheet.defenses.naturelle.base)
        .with_formula("Protection naturelle = base + origine");
    push_racial(
        &mut naturelle,
        sheet.archetype(),
        ctx,
        DerivedStat::ProtectionNaturelle,
    );
    DefenseBreakdown {
        naturelle: naturelle.finish(),
        solide: armour_rating(sheet, ctx, DerivedStat::ProtectionSolide, |p| p.pr_sol),
        speciale: armour_rating(sheet, ctx, DerivedStat::ProtectionSpeciale, |p| p.pr_spe),
        magique: armour_rating(sheet, ctx, DerivedStat::ProtectionMagique, |p| p.pr_mag),
    }
}

/// Sum of the four ratings, each with its temporary column.
#[must_use]
pub fn total_protection(sheet: &CharacterSheet, defenses: &DefenseBreakdown) -> i32 {
    let d = &sheet.defenses;
    [
        defenses.naturelle.total_with_temp(d.naturelle.temp),
        defenses.solide.total_with_temp(d.solide.temp),
        defenses.speciale.total_with_temp(d.speciale.temp),
        defenses.magique.total_with_temp(d.magique.temp),
    ]
    .into_iter()
    .fold(0i32, i32::saturating_add)
}

fn entered_stat(
    sheet: &CharacterSheet,
    ctx: &SheetContext<'_>,
    stat: DerivedStat,
    base: i32,
    pick: fn(&Characteristics) -> i32,
) -> StatDetail {
    let mut ledger =
        Ledger::new(base).with_formula(format!("{} = base + équipement + origine", stat.label()));
    push_equipment(&mut ledger, sheet, ctx, |item| characteristic_of(item, pick));
    push_racial(&mut ledger, sheet.archetype(), ctx, stat);
    ledger.finish()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MovementBreakdown {
    pub marche: StatDetail,
    pub course: StatDetail,
}

/// Walking and running speed; equipment `mvt` applies to both.
#[must_use]
pub fn compute_movement(sheet: &CharacterSheet, ctx: &SheetContext<'_>) -> MovementBreakdown {
    let mvt = |c: &Characteristics| c.mvt;
    MovementBreakdown {
        marche: entered_stat(sheet, ctx, DerivedStat::Marche, sheet.movement.marche.base, mvt),
        course: entered_stat(sheet, ctx, DerivedStat::Course, sheet.movement.course.base, mvt),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MagicBreakdown {
    pub magie_physique: StatDetail,
    pub magie_psychique: StatDetail,
    pub resistance_magique: StatDetail,
}

#[must_use]
pub fn compute_magic(sheet: &CharacterSheet, ctx: &SheetContext<'_>) -> MagicBreakdown {
    let m = &sheet.magie;
    MagicBreakdown {
        magie_physique: entered_stat(
            sheet,
            ctx,
            DerivedStat::MagiePhysique,
            m.magie_physique.base,
            |c| c.mag_phy,
        ),
        magie_psychique: entered_stat(
            sheet,
            ctx,
            DerivedStat::MagiePsychique,
            m.magie_psychique.base,
            |c| c.mag_psy,
        ),
        resistance_magique: entered_stat(
            sheet,
            ctx,
            DerivedStat::ResistanceMagique,
            m.resistance_magique.base,
            |c| c.rm,
        ),
    }
}

#[must_use]
pub fn compute_discretion(sheet: &CharacterSheet, ctx: &SheetContext<'_>) -> StatDetail {
    entered_stat(
        sheet,
        ctx,
        DerivedStat::Discretion,
        sheet.magie.discretion.base,
        |c| c.discretion,
    )
}

fn characteristic_ledger(sheet: &CharacterSheet, ctx: &SheetContext<'_>, attribute: Attribute) -> Ledger {
    let mut ledger = Ledger::new(sheet.caracteristiques.get(attribute)).with_formula(format!(
        "{} = base + équipement + origine + états",
        attribute.label()
    ));
    push_equipment(&mut ledger, sheet, ctx, |item| {
        item.characteristics()
            .map_or(0, |c| c.attribute(attribute))
    });
    ledger.extend(ctx.racial.attribute_contribution(sheet.archetype(), attribute));
    ledger.extend(status_contributions(&sheet.status, attribute));
    if sheet
        .adresse_bonus
        .is_some_and(|bonus| bonus.attribute() == attribute)
    {
        ledger.push("Bonus d'adresse", 1);
    }
    ledger
}

/// Effective value of one attribute.
#[must_use]
pub fn compute_characteristic(
    sheet: &CharacterSheet,
    ctx: &SheetContext<'_>,
    attribute: Attribute,
) -> StatDetail {
    characteristic_ledger(sheet, ctx, attribute).finish()
}

/// Dodge after state maluses; never below zero.
#[must_use]
pub fn compute_esquive(sheet: &CharacterSheet, ctx: &SheetContext<'_>) -> StatDetail {
    let mut ledger = characteristic_ledger(sheet, ctx, Attribute::Esquive)
        .with_formula("Esquive = naturelle + équipement + états - malus d'état (min. 0)");
    ledger.extend(state_malus_contributions(&sheet.status));
    ledger.finish().floor_at(0)
}

/// Weapon damage bonus granted by the current status effects.
#[must_use]
pub fn compute_weapon_damage_bonus(sheet: &CharacterSheet) -> StatDetail {
    let mut ledger = Ledger::new(0).with_formula("Dégâts d'arme = états");
    ledger.extend(status_contributions(&sheet.status, Attribute::Pi));
    ledger.finish()
}

/// Whether the player still has to pick the permanent AT/PRD bonus.
#[must_use]
pub fn adresse_bonus_pending(sheet: &CharacterSheet) -> bool {
    sheet.caracteristiques.adresse > ADRESSE_BONUS_THRESHOLD && sheet.adresse_bonus.is_none()
}
