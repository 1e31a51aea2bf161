//! Origin classification and racial modifiers.
//!
//! Origins are free text on the sheet ("Demi-elfe (h)", "Naine de la mafia").
//! They are folded onto a small set of archetypes, which in turn select a
//! racial modifier row.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::attributes::{Attribute, AttributeVector, DerivedStat};
use crate::data::RulesDataError;
use crate::ledger::Contribution;
use crate::numbers::deserialize_lenient_i32;

/// Canonical racial archetypes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Archetype {
    #[default]
    #[serde(rename = "humain")]
    Humain,
    #[serde(rename = "elfe")]
    Elfe,
    #[serde(rename = "elfe_noir")]
    ElfeNoir,
    #[serde(rename = "nain")]
    Nain,
    #[serde(rename = "gnome")]
    Gnome,
    #[serde(rename = "semi-homme")]
    SemiHomme,
    #[serde(rename = "barbare")]
    Barbare,
    #[serde(rename = "peau-verte")]
    PeauVerte,
}

impl Archetype {
    pub const ALL: [Self; 8] = [
        Self::Humain,
        Self::Elfe,
        Self::ElfeNoir,
        Self::Nain,
        Self::Gnome,
        Self::SemiHomme,
        Self::Barbare,
        Self::PeauVerte,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Humain => "humain",
            Self::Elfe => "elfe",
            Self::ElfeNoir => "elfe_noir",
            Self::Nain => "nain",
            Self::Gnome => "gnome",
            Self::SemiHomme => "semi-homme",
            Self::Barbare => "barbare",
            Self::PeauVerte => "peau-verte",
        }
    }

    /// Label used for racial ledger contributions.
    #[must_use]
    pub fn contribution_label(self) -> String {
        format!("Origine ({})", self.key())
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Archetype {
    type Err = RulesDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|archetype| archetype.key() == s)
            .ok_or_else(|| RulesDataError::UnknownArchetype(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Contains(&'static str),
    Exact(&'static str),
}

impl Pattern {
    fn matches(self, normalized: &str) -> bool {
        match self {
            Self::Contains(needle) => normalized.contains(needle),
            Self::Exact(whole) => normalized == whole,
        }
    }
}

use Pattern::{Contains as C, Exact as E};

/// Ordered: some needles are substrings of later ones ("elfe noir" vs "elfe").
const ORIGIN_RULES: &[(Archetype, &[Pattern])] = &[
    (
        Archetype::Barbare,
        &[
            C("barbare"),
            C("amazone syldérienne"),
            C("loup-garou"),
            C("minotaure"),
            C("homme-bête (canin)"),
            C("femme-bête (canin)"),
        ],
    ),
    (
        Archetype::Humain,
        &[
            C("humain"),
            C("humaine"),
            C("demi-elfe (h)"),
            C("demie-elfe (h)"),
            C("demi-orque (h)"),
            C("demie-orque (h)"),
            C("vampire"),
            C("squelette sentient"),
            C("galéanthrope"),
            C("wukong"),
            C("nelfe"),
        ],
    ),
    (
        Archetype::ElfeNoir,
        &[
            C("elfe noir"),
            C("incube"),
            C("succube"),
            C("drac"),
            C("draque"),
            C("kitsune"),
            C("naga"),
        ],
    ),
    (
        Archetype::Elfe,
        &[
            C("elfe sylvain"),
            C("haut elfe"),
            C("haute elfe"),
            E("elfe"),
            C("demi-elfe (e)"),
            C("demie-elfe (e)"),
            C("homme-lézard"),
            C("femme-lézard"),
            C("fée"),
        ],
    ),
    (
        Archetype::PeauVerte,
        &[
            C("orque"),
            C("demi-orque (o)"),
            C("demie-orque (o)"),
            C("ogre"),
            C("ogresse"),
            C("gobelin"),
            C("gobeline"),
            C("murloc"),
            C("troll"),
            C("skaven"),
            C("changelin"),
            C("changeline"),
            C("homme-légume"),
            C("femme-légume"),
            C("demi-démon"),
            C("demie-démone"),
            C("homme-bête (caprin)"),
            C("femme-bête (caprin)"),
            C("homme-bête (bovin/porcin)"),
            C("femme-bête (bovin/porcin)"),
        ],
    ),
    (
        Archetype::Nain,
        &[
            C("nain"),
            C("naine"),
            C("harpie"),
            C("profond"),
            C("profonde"),
        ],
    ),
    (Archetype::Gnome, &[C("gnôme"), C("kobold"), C("tengu")]),
    (Archetype::SemiHomme, &[C("hobbit")]),
];

/// Classify a free-text origin. Unknown or empty text is `humain`.
#[must_use]
pub fn classify(origin: &str) -> Archetype {
    let normalized = origin.trim().to_lowercase();
    if normalized.is_empty() {
        return Archetype::default();
    }
    ORIGIN_RULES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| p.matches(&normalized)))
        .map_or_else(Archetype::default, |(archetype, _)| *archetype)
}

/// Racial deltas for one archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RacialModifiers {
    #[serde(flatten)]
    pub attributes: AttributeVector,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub protection_naturelle: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub protection_solide: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub protection_speciale: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub protection_magique: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub marche: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub course: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub magie_physique: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub magie_psychique: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub resistance_magique: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub discretion: i32,
}

impl RacialModifiers {
    #[must_use]
    pub const fn get(&self, stat: DerivedStat) -> i32 {
        match stat {
            DerivedStat::ProtectionNaturelle => self.protection_naturelle,
            DerivedStat::ProtectionSolide => self.protection_solide,
            DerivedStat::ProtectionSpeciale => self.protection_speciale,
            DerivedStat::ProtectionMagique => self.protection_magique,
            DerivedStat::Marche => self.marche,
            DerivedStat::Course => self.course,
            DerivedStat::MagiePhysique => self.magie_physique,
            DerivedStat::MagiePsychique => self.magie_psychique,
            DerivedStat::ResistanceMagique => self.resistance_magique,
            DerivedStat::Discretion => self.discretion,
        }
    }
}

/// Archetype → racial modifiers. Archetypes without a row contribute nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RacialTable {
    rows: HashMap<Archetype, RacialModifiers>,
}

impl RacialTable {
    /// Parse a racial table keyed by archetype key.
    ///
    /// # Errors
    ///
    /// Returns [`RulesDataError::Parse`] for malformed JSON and
    /// [`RulesDataError::UnknownArchetype`] for keys outside the closed set.
    pub fn from_json(json: &str) -> Result<Self, RulesDataError> {
        let raw: HashMap<String, RacialModifiers> =
            serde_json::from_str(json).map_err(|err| RulesDataError::parse("racial table", err))?;
        raw.into_iter()
            .map(|(key, mods)| Ok((key.parse::<Archetype>()?, mods)))
            .collect::<Result<HashMap<_, _>, RulesDataError>>()
            .map(|rows| Self { rows })
    }

    #[must_use]
    pub fn with_row(mut self, archetype: Archetype, modifiers: RacialModifiers) -> Self {
        self.rows.insert(archetype, modifiers);
        self
    }

    #[must_use]
    pub fn get(&self, archetype: Archetype) -> Option<&RacialModifiers> {
        self.rows.get(&archetype)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Racial contribution to an attribute, if any.
    #[must_use]
    pub fn attribute_contribution(
        &self,
        archetype: Archetype,
        attribute: Attribute,
    ) -> Option<Contribution> {
        let value = self.get(archetype)?.attributes.get(attribute);
        (value != 0).then(|| Contribution::new(archetype.contribution_label(), value))
    }

    /// Racial contribution to a derived stat, if any.
    #[must_use]
    pub fn stat_contribution(&self, archetype: Archetype, stat: DerivedStat) -> Option<Contribution> {
        let value = self.get(archetype)?.get(stat);
        (value != 0).then(|| Contribution::new(archetype.contribution_label(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_elves_are_checked_before_elves() {
        assert_eq!(classify("Elfe noir"), Archetype::ElfeNoir);
        assert_eq!(classify("  ELFE  "), Archetype::Elfe);
        assert_eq!(classify("Haute elfe"), Archetype::Elfe);
        assert_eq!(classify("Demi-elfe (e)"), Archetype::Elfe);
    }

    #[test]
    fn first_matching_rule_wins() {
        assert_eq!(classify("Demi-elfe (h)"), Archetype::Humain);
        assert_eq!(classify("Demi-orque (h)"), Archetype::Humain);
        assert_eq!(classify("Demi-orque (o)"), Archetype::PeauVerte);
        assert_eq!(classify("Amazone syldérienne"), Archetype::Barbare);
        assert_eq!(classify("Naine de la mafia"), Archetype::Nain);
        assert_eq!(classify("Gnôme des forêts du nord"), Archetype::Gnome);
        assert_eq!(classify("Hobbit"), Archetype::SemiHomme);
    }

    #[test]
    fn bare_elf_is_exact_only() {
        // "elfe" alone is exact; longer unknown elf spellings fall through.
        assert_eq!(classify("elfe des glaces"), Archetype::Humain);
    }

    #[test]
    fn unknown_and_empty_default_to_human() {
        assert_eq!(classify(""), Archetype::Humain);
        assert_eq!(classify("   "), Archetype::Humain);
        assert_eq!(classify("Martien"), Archetype::Humain);
    }

    #[test]
    fn keys_round_trip_through_from_str() {
        for archetype in Archetype::ALL {
            assert_eq!(archetype.key().parse::<Archetype>().unwrap(), archetype);
            let json = serde_json::to_string(&archetype).unwrap();
            assert_eq!(json, format!("\"{archetype}\""));
        }
        assert!(matches!(
            "orc".parse::<Archetype>(),
            Err(RulesDataError::UnknownArchetype(_))
        ));
    }

    #[test]
    fn racial_table_rejects_unknown_keys() {
        let err = RacialTable::from_json(r#"{"martien": {"force": 1}}"#).unwrap_err();
        assert!(matches!(err, RulesDataError::UnknownArchetype(key) if key == "martien"));
    }

    #[test]
    fn racial_rows_feed_labelled_contributions() {
        let table =
            RacialTable::from_json(r#"{"nain": {"force": 1, "protection_naturelle": "1", "marche": -2}}"#)
                .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.attribute_contribution(Archetype::Nain, Attribute::Force),
            Some(Contribution::new("Origine (nain)", 1))
        );
        assert_eq!(
            table
                .stat_contribution(Archetype::Nain, DerivedStat::Marche)
                .map(|c| c.value),
            Some(-2)
        );
        assert!(table
            .stat_contribution(Archetype::Nain, DerivedStat::Course)
            .is_none());
        assert!(table
            .attribute_contribution(Archetype::Elfe, Attribute::Force)
            .is_none());
    }
}
