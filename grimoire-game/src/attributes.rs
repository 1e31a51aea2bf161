//! Character attributes and the fixed-width delta vector over them.
use serde::{Deserialize, Serialize};
use std::ops::Add;

use crate::numbers::deserialize_lenient_i32;

/// Attributes touched by status effects and equipment bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Courage,
    Intelligence,
    Charisme,
    Adresse,
    Force,
    Perception,
    Esquive,
    Attaque,
    Parade,
    /// Weapon damage bonus ("points d'impact").
    Pi,
}

impl Attribute {
    pub const ALL: [Self; 10] = [
        Self::Courage,
        Self::Intelligence,
        Self::Charisme,
        Self::Adresse,
        Self::Force,
        Self::Perception,
        Self::Esquive,
        Self::Attaque,
        Self::Parade,
        Self::Pi,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Courage => "courage",
            Self::Intelligence => "intelligence",
            Self::Charisme => "charisme",
            Self::Adresse => "adresse",
            Self::Force => "force",
            Self::Perception => "perception",
            Self::Esquive => "esquive",
            Self::Attaque => "attaque",
            Self::Parade => "parade",
            Self::Pi => "pi",
        }
    }

    /// Rulebook column header.
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Courage => "COU",
            Self::Intelligence => "INT",
            Self::Charisme => "CHA",
            Self::Adresse => "AD",
            Self::Force => "FO",
            Self::Perception => "PER",
            Self::Esquive => "ES",
            Self::Attaque => "AT",
            Self::Parade => "PRD",
            Self::Pi => "PI",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Courage => "Courage",
            Self::Intelligence => "Intelligence",
            Self::Charisme => "Charisme",
            Self::Adresse => "Adresse",
            Self::Force => "Force",
            Self::Perception => "Perception",
            Self::Esquive => "Esquive",
            Self::Attaque => "Attaque",
            Self::Parade => "Parade",
            Self::Pi => "Dégâts d'arme",
        }
    }
}

/// One value per [`Attribute`]; used both for base scores and for deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AttributeVector {
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub courage: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub intelligence: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub charisme: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub adresse: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub force: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub perception: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub esquive: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub attaque: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub parade: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub pi: i32,
}

impl AttributeVector {
    pub const ZERO: Self = Self::row(0, 0, 0, 0, 0, 0, 0, 0, 0, 0);

    /// Build a vector in rulebook column order: COU INT CHA AD FO PER ES AT PRD PI.
    #[allow(clippy::too_many_arguments, clippy::many_single_char_names)]
    #[must_use]
    pub const fn row(
        courage: i32,
        intelligence: i32,
        charisme: i32,
        adresse: i32,
        force: i32,
        perception: i32,
        esquive: i32,
        attaque: i32,
        parade: i32,
        pi: i32,
    ) -> Self {
        Self {
            courage,
            intelligence,
            charisme,
            adresse,
            force,
            perception,
            esquive,
            attaque,
            parade,
            pi,
        }
    }

    #[must_use]
    pub const fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Courage => self.courage,
            Attribute::Intelligence => self.intelligence,
            Attribute::Charisme => self.charisme,
            Attribute::Adresse => self.adresse,
            Attribute::Force => self.force,
            Attribute::Perception => self.perception,
            Attribute::Esquive => self.esquive,
            Attribute::Attaque => self.attaque,
            Attribute::Parade => self.parade,
            Attribute::Pi => self.pi,
        }
    }

    #[must_use]
    pub const fn with(mut self, attribute: Attribute, value: i32) -> Self {
        match attribute {
            Attribute::Courage => self.courage = value,
            Attribute::Intelligence => self.intelligence = value,
            Attribute::Charisme => self.charisme = value,
            Attribute::Adresse => self.adresse = value,
            Attribute::Force => self.force = value,
            Attribute::Perception => self.perception = value,
            Attribute::Esquive => self.esquive = value,
            Attribute::Attaque => self.attaque = value,
            Attribute::Parade => self.parade = value,
            Attribute::Pi => self.pi = value,
        }
        self
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, i32)> + '_ {
        Attribute::ALL.into_iter().map(|attr| (attr, self.get(attr)))
    }

    pub fn non_zero(&self) -> impl Iterator<Item = (Attribute, i32)> + '_ {
        self.iter().filter(|(_, value)| *value != 0)
    }
}

impl Add for AttributeVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Attribute::ALL.into_iter().fold(self, |acc, attr| {
            acc.with(attr, acc.get(attr).saturating_add(rhs.get(attr)))
        })
    }
}

/// Stats computed on the sheet rather than rolled as attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedStat {
    ProtectionNaturelle,
    ProtectionSolide,
    ProtectionSpeciale,
    ProtectionMagique,
    Marche,
    Course,
    MagiePhysique,
    MagiePsychique,
    ResistanceMagique,
    Discretion,
}

impl DerivedStat {
    pub const ALL: [Self; 10] = [
        Self::ProtectionNaturelle,
        Self::ProtectionSolide,
        Self::ProtectionSpeciale,
        Self::ProtectionMagique,
        Self::Marche,
        Self::Course,
        Self::MagiePhysique,
        Self::MagiePsychique,
        Self::ResistanceMagique,
        Self::Discretion,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProtectionNaturelle => "Protection naturelle",
            Self::ProtectionSolide => "Protection solide",
            Self::ProtectionSpeciale => "Protection spéciale",
            Self::ProtectionMagique => "Protection magique",
            Self::Marche => "Marche",
            Self::Course => "Course",
            Self::MagiePhysique => "Magie physique",
            Self::MagiePsychique => "Magie psychique",
            Self::ResistanceMagique => "Résistance magique",
            Self::Discretion => "Discrétion",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_follows_rulebook_columns() {
        let v = AttributeVector::row(1, -1, 0, 0, 0, -1, 0, 0, 0, 0);
        assert_eq!(v.get(Attribute::Courage), 1);
        assert_eq!(v.get(Attribute::Intelligence), -1);
        assert_eq!(v.get(Attribute::Perception), -1);
        let shown: Vec<_> = v.non_zero().map(|(a, _)| a.abbreviation()).collect();
        assert_eq!(shown, ["COU", "INT", "PER"]);
    }

    #[test]
    fn addition_is_fieldwise() {
        let a = AttributeVector::ZERO.with(Attribute::Force, 2);
        let b = AttributeVector::ZERO
            .with(Attribute::Force, -1)
            .with(Attribute::Pi, 3);
        let sum = a + b;
        assert_eq!(sum.force, 1);
        assert_eq!(sum.pi, 3);
        assert!(AttributeVector::default().is_zero());
    }

    #[test]
    fn keys_match_serde_names() {
        for attr in Attribute::ALL {
            let json = serde_json::to_string(&attr).unwrap();
            assert_eq!(json, format!("\"{}\"", attr.key()));
        }
    }

    #[test]
    fn vector_deserializes_leniently() {
        let v: AttributeVector =
            serde_json::from_str(r#"{"courage": "12", "adresse": 13.0, "force": null}"#).unwrap();
        assert_eq!(v.courage, 12);
        assert_eq!(v.adresse, 13);
        assert_eq!(v.force, 0);
    }
}
