//! Temporary status effects: dose-indexed intoxication tables and flat maluses.
//!
//! The tables are transcribed from the rulebook as opaque reference data.
//! Neighbouring doses that look alike (or oddly different, as in the strong
//! alcohol rows 8 and 9) are kept verbatim rather than "corrected".
use serde::{Deserialize, Serialize};

use crate::attributes::{Attribute, AttributeVector};
use crate::constants::{DOSE_LEVELS, MAX_DOSE};
use crate::ledger::Contribution;
use crate::numbers::deserialize_lenient_i32;

/// Dose table type; the array length enforces one entry per dose level.
pub type DoseTable = [AttributeVector; DOSE_LEVELS];

const Z: AttributeVector = AttributeVector::ZERO;

#[allow(clippy::too_many_arguments)]
const fn r(
    cou: i32,
    int: i32,
    cha: i32,
    ad: i32,
    fo: i32,
    per: i32,
    es: i32,
    at: i32,
    prd: i32,
    pi: i32,
) -> AttributeVector {
    AttributeVector::row(cou, int, cha, ad, fo, per, es, at, prd, pi)
}

//                         COU INT CHA  AD  FO PER  ES  AT PRD  PI
static LIGHT_ALCOHOL: DoseTable = [
    Z,
    Z,
    Z,
    Z,
    Z,
    r(1, -1, 0, 0, 0, -1, 0, 0, 0, 0),
    r(1, -1, 0, -1, 0, -1, 0, 1, 0, 0),
    r(2, -2, -1, -2, 0, -2, 0, 1, 0, 0),
    r(2, -2, -2, -2, 1, -2, 0, 1, 0, 0),
    r(3, -3, -3, -3, 2, -3, 0, 2, -2, -2),
    r(3, -3, -4, -3, 2, -3, 0, 2, -2, -2),
];

static STRONG_ALCOHOL: DoseTable = [
    Z,
    Z,
    Z,
    r(0, -1, 0, -1, 0, -1, 0, 0, 0, 0),
    r(1, -1, -1, -2, 0, -1, 0, 0, 0, 0),
    r(1, -2, -1, -2, 1, -2, 0, -1, -1, 0),
    r(2, -2, -2, -3, 2, -2, 0, 1, -2, -2),
    r(2, -3, -2, -3, 2, -3, 0, 1, -2, -2),
    r(3, -3, -3, -3, 3, -3, 0, 2, -3, -3),
    r(3, -3, -4, -3, 3, -3, 0, 2, -3, 1),
    r(3, -3, -5, -3, 3, -3, 0, 2, -3, 2),
];

static HANGOVER: DoseTable = [
    Z,
    Z,
    Z,
    Z,
    r(0, -1, 0, 0, 0, -1, 0, 0, 0, 0),
    r(0, -1, 0, 0, 0, -1, 0, 0, 0, 0),
    r(0, -1, -1, 0, 0, -1, 0, 0, 0, 0),
    r(0, -1, -1, 0, 0, -1, 0, 0, 0, 0),
    r(0, -2, -1, -1, 0, -2, 0, -1, -1, 0),
    r(0, -2, -2, -1, 0, -2, 0, -1, -1, 0),
    r(0, -2, -3, -2, 0, -2, -1, -1, -1, 0),
];

/// Dose-tracked status effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    Leger,
    Fort,
    GueuleDeBois,
}

impl EffectType {
    pub const ALL: [Self; 3] = [Self::Leger, Self::Fort, Self::GueuleDeBois];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Leger => "leger",
            Self::Fort => "fort",
            Self::GueuleDeBois => "gueule_de_bois",
        }
    }

    /// Label used for ledger contributions.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Leger => "Alcool léger",
            Self::Fort => "Alcool fort",
            Self::GueuleDeBois => "Gueule de bois",
        }
    }

    #[must_use]
    pub fn table(self) -> &'static DoseTable {
        match self {
            Self::Leger => &LIGHT_ALCOHOL,
            Self::Fort => &STRONG_ALCOHOL,
            Self::GueuleDeBois => &HANGOVER,
        }
    }
}

/// Clamp any player-entered dose into the table range.
#[must_use]
pub fn clamp_dose(dose: i32) -> usize {
    usize::try_from(dose.clamp(0, MAX_DOSE)).unwrap_or(0)
}

/// Attribute deltas for one effect at the given dose.
#[must_use]
pub fn modifiers(effect: EffectType, dose: i32) -> AttributeVector {
    effect.table()[clamp_dose(dose)]
}

/// Current alcohol doses as stored on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlcoholDoses {
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub leger: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub fort: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub gueule_de_bois: i32,
}

impl AlcoholDoses {
    #[must_use]
    pub const fn dose(&self, effect: EffectType) -> i32 {
        match effect {
            EffectType::Leger => self.leger,
            EffectType::Fort => self.fort,
            EffectType::GueuleDeBois => self.gueule_de_bois,
        }
    }
}

/// Temporary condition of a character.
///
/// Flat maluses are positive numbers subtracted from dodge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterStatus {
    #[serde(default, deserialize_with = "crate::numbers::null_as_default")]
    pub alcohol: AlcoholDoses,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub fatigue: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub drogue: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub blessure_tete: i32,
}

/// Per-effect modifier vectors for a status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusModifiers {
    pub leger: AttributeVector,
    pub fort: AttributeVector,
    pub gueule_de_bois: AttributeVector,
}

impl StatusModifiers {
    #[must_use]
    pub const fn get(&self, effect: EffectType) -> AttributeVector {
        match effect {
            EffectType::Leger => self.leger,
            EffectType::Fort => self.fort,
            EffectType::GueuleDeBois => self.gueule_de_bois,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (EffectType, AttributeVector)> + '_ {
        EffectType::ALL.into_iter().map(|effect| (effect, self.get(effect)))
    }

    /// Combined deltas of every active effect.
    #[must_use]
    pub fn combined(&self) -> AttributeVector {
        self.leger + self.fort + self.gueule_de_bois
    }
}

#[must_use]
pub fn all_modifiers(status: &CharacterStatus) -> StatusModifiers {
    let dose_of = |effect| modifiers(effect, status.alcohol.dose(effect));
    StatusModifiers {
        leger: dose_of(EffectType::Leger),
        fort: dose_of(EffectType::Fort),
        gueule_de_bois: dose_of(EffectType::GueuleDeBois),
    }
}

/// One labelled contribution per active effect that moves `attribute`.
#[must_use]
pub fn status_contributions(status: &CharacterStatus, attribute: Attribute) -> Vec<Contribution> {
    all_modifiers(status)
        .iter()
        .filter_map(|(effect, mods)| {
            let value = mods.get(attribute);
            (value != 0).then(|| Contribution::new(effect.label(), value))
        })
        .collect()
}

/// Flat state maluses (fatigue, drugs, head wound) as negative contributions.
#[must_use]
pub fn state_malus_contributions(status: &CharacterStatus) -> Vec<Contribution> {
    [
        ("Fatigue", status.fatigue),
        ("Drogue", status.drogue),
        ("Blessure à la tête", status.blessure_tete),
    ]
    .into_iter()
    .filter(|(_, malus)| *malus != 0)
    .map(|(label, malus)| Contribution::new(label, malus.saturating_neg()))
    .collect()
}
