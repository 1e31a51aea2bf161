//! Equipment reference catalog.
//!
//! The persistence layer stores every reference item as one nested record
//! whose meaningful sections depend on the category. Records are flattened
//! here into [`RefEquipment`] with a per-category [`ItemDetails`] variant, and
//! [`schema`] gives the ordered field list each category presents.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::attributes::{Attribute, AttributeVector};
use crate::constants::LOG_TARGET_CATALOG;
use crate::data::RulesDataError;
use crate::numbers::{
    deserialize_lenient_f64, deserialize_lenient_i32, deserialize_lenient_i64,
    deserialize_lenient_string, null_as_default,
};

/// Persisted equipment categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EquipmentCategory {
    Accessoires,
    Armes,
    ArmesDeJet,
    Boissons,
    Bouffes,
    Ingredients,
    MainsNues,
    Munitions,
    ObjetsMagiques,
    ObjetsSpeciaux,
    Outils,
    Pieges,
    Potions,
    Protections,
    Sacoches,
    Sacs,
    /// Anything else; presented with the default schema.
    Other(String),
}

impl EquipmentCategory {
    pub const KNOWN: [Self; 16] = [
        Self::Accessoires,
        Self::Armes,
        Self::ArmesDeJet,
        Self::Boissons,
        Self::Bouffes,
        Self::Ingredients,
        Self::MainsNues,
        Self::Munitions,
        Self::ObjetsMagiques,
        Self::ObjetsSpeciaux,
        Self::Outils,
        Self::Pieges,
        Self::Potions,
        Self::Protections,
        Self::Sacoches,
        Self::Sacs,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Accessoires => "Accessoires",
            Self::Armes => "Armes",
            Self::ArmesDeJet => "Armes_de_jet",
            Self::Boissons => "Boissons",
            Self::Bouffes => "Bouffes",
            Self::Ingredients => "Ingredients",
            Self::MainsNues => "Mains_nues",
            Self::Munitions => "Munitions",
            Self::ObjetsMagiques => "Objets_magiques",
            Self::ObjetsSpeciaux => "Objets_speciaux",
            Self::Outils => "Outils",
            Self::Pieges => "Pieges",
            Self::Potions => "Potions",
            Self::Protections => "Protections",
            Self::Sacoches => "Sacoches",
            Self::Sacs => "Sacs",
            Self::Other(name) => name,
        }
    }
}

impl FromStr for EquipmentCategory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::KNOWN
            .into_iter()
            .find(|known| known.as_str() == s)
            .unwrap_or_else(|| Self::Other(s.to_string())))
    }
}

impl From<String> for EquipmentCategory {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl From<EquipmentCategory> for String {
    fn from(value: EquipmentCategory) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Field schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    TextArea,
}

/// One presented column of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn field(key: &'static str, label: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { key, label, kind }
}

use FieldKind::{Number as N, Text as T, TextArea as A};

const COMMON: &[FieldDef] = &[
    field("niveau", "Niveau", N),
    field("restriction", "Restriction", T),
    field("origine_rarete", "Origine/Rareté", T),
    field("type", "Type", T),
    field("aura", "Aura", T),
];

const CRAFT: &[FieldDef] = &[
    field("composants", "Composants", A),
    field("outils", "Outils", T),
    field("qualifications", "Qualifications", T),
    field("difficulte", "Difficulté", N),
    field("temps_de_confection", "Temps", T),
    field("confection", "Confection", A),
    field("xp_confection", "XP Conf.", N),
    field("xp_reparation", "XP Rép.", N),
];

const CARACS: &[FieldDef] = &[
    field("courage", "Courage", N),
    field("intelligence", "Intelligence", N),
    field("charisme", "Charisme", N),
    field("adresse", "Adresse", N),
    field("force", "Force", N),
    field("perception", "Perception", N),
    field("esquive", "Esquive", N),
    field("attaque", "Attaque", N),
    field("parade", "Parade", N),
    field("mag_psy", "Magie Psy", N),
    field("mag_phy", "Magie Phy", N),
    field("rm", "RM", N),
    field("mvt", "Mvt", N),
    field("discretion", "Discrétion", N),
];

const RESIST: &[FieldDef] = &[
    field("pr_sol", "PR Sol", N),
    field("pr_spe", "PR Spé", N),
    field("pr_mag", "PR Mag", N),
];

const ENV: &[FieldDef] = &[
    field("pluie", "Pluie", N),
    field("froid", "Froid", N),
    field("chaleur", "Chaleur", N),
];

const PRICE: &[FieldDef] = &[field("prix", "Prix", N), field("monnaie", "Monnaie", T)];
const EFFECT: FieldDef = field("effet", "Effet", A);
const RUPTURE: FieldDef = field("rupture", "Rupture", T);
const WEIGHT: FieldDef = field("poids", "Poids (g)", N);
const HANDS: FieldDef = field("mains", "Mains", T);
const DAMAGE: FieldDef = field("degats", "Dégâts", T);
const PI: FieldDef = field("pi", "PI", N);

/// Melee weapons only list the attributes up to Attaque.
const WEAPON_CARACS: &[FieldDef] = CARACS.split_at(8).0;

fn join(parts: &[&[FieldDef]]) -> Vec<FieldDef> {
    parts.concat()
}

fn build_schemas() -> HashMap<&'static str, Vec<FieldDef>> {
    let melee = join(&[
        COMMON,
        &[HANDS],
        PRICE,
        &[DAMAGE, PI],
        WEAPON_CARACS,
        &[EFFECT, RUPTURE, WEIGHT],
        CRAFT,
    ]);
    let tool = join(&[COMMON.split_at(3).0, PRICE, &[EFFECT, RUPTURE, WEIGHT], CRAFT]);
    let priced = |extra: &[FieldDef], craft: &[FieldDef]| join(&[PRICE, &[EFFECT], extra, craft]);

    let mut schemas = HashMap::new();
    schemas.insert(
        "Accessoires",
        join(&[
            COMMON,
            PRICE,
            RESIST,
            &[PI],
            CARACS,
            ENV,
            &[EFFECT, RUPTURE, WEIGHT],
            CRAFT,
        ]),
    );
    schemas.insert("Armes", melee.clone());
    schemas.insert(
        "Armes_de_jet",
        join(&[
            COMMON,
            &[field("portee", "Portée", T)],
            PRICE,
            &[DAMAGE, PI, EFFECT, RUPTURE, WEIGHT],
            CRAFT,
        ]),
    );
    schemas.insert("Boissons", priced(&[], &[]));
    schemas.insert(
        "Bouffes",
        priced(&[field("peremption", "Peremption", T), WEIGHT], CRAFT.split_at(7).0),
    );
    schemas.insert(
        "Ingredients",
        priced(&[WEIGHT, field("recolte", "Récolte", T)], &[]),
    );
    schemas.insert("Mains_nues", melee);
    schemas.insert(
        "Munitions",
        join(&[COMMON.split_at(3).0, PRICE, &[EFFECT, RUPTURE], CRAFT]),
    );
    schemas.insert(
        "Objets_magiques",
        join(&[
            &[
                field("restriction", "Restriction", T),
                field("charge", "Charge", N),
            ],
            PRICE,
            &[EFFECT, WEIGHT],
            CRAFT,
        ]),
    );
    schemas.insert("Objets_speciaux", priced(&[RUPTURE, WEIGHT], CRAFT));
    schemas.insert("Outils", tool.clone());
    schemas.insert("Pieges", tool);
    schemas.insert(
        "Potions",
        join(&[
            COMMON.split_at(4).0,
            &[field("contenant", "Contenant", T)],
            PRICE,
            &[EFFECT, WEIGHT],
            CRAFT,
        ]),
    );
    schemas.insert(
        "Protections",
        join(&[
            COMMON,
            &[field("matiere", "Matière", T)],
            PRICE,
            RESIST,
            CARACS,
            ENV,
            &[field("couvre", "Couvre", T), EFFECT, RUPTURE, WEIGHT],
            CRAFT,
        ]),
    );
    schemas.insert(
        "Sacoches",
        priced(&[field("places", "Places", N), RUPTURE, WEIGHT], CRAFT),
    );
    schemas.insert(
        "Sacs",
        priced(&[field("capacite", "Capacité", N), RUPTURE, WEIGHT], CRAFT),
    );
    schemas
}

fn default_schema() -> &'static [FieldDef] {
    static DEFAULT: OnceLock<Vec<FieldDef>> = OnceLock::new();
    DEFAULT.get_or_init(|| {
        join(&[
            COMMON,
            &[HANDS],
            PRICE,
            &[DAMAGE, PI],
            CARACS,
            &[EFFECT, RUPTURE, WEIGHT],
            CRAFT,
        ])
    })
}

/// Ordered presentation fields of a category; unknown categories get the default set.
#[must_use]
pub fn schema(category: &EquipmentCategory) -> &'static [FieldDef] {
    static SCHEMAS: OnceLock<HashMap<&'static str, Vec<FieldDef>>> = OnceLock::new();
    SCHEMAS
        .get_or_init(build_schemas)
        .get(category.as_str())
        .map_or_else(default_schema, Vec::as_slice)
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// Attribute and magic bonuses granted while an item is equipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Characteristics {
    #[serde(flatten)]
    pub attributes: AttributeVector,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub mag_psy: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub mag_phy: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub rm: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub mvt: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub discretion: i32,
}

impl Characteristics {
    #[must_use]
    pub const fn attribute(&self, attribute: Attribute) -> i32 {
        self.attributes.get(attribute)
    }
}

/// Protection ratings and environmental resistances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Protections {
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub pr_sol: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub pr_spe: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub pr_mag: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub pluie: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub froid: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub chaleur: i32,
}

/// Crafting metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Craft {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub composants: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub outils: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub qualifications: String,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub difficulte: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub temps_de_confection: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub confection: String,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub xp_confection: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub xp_reparation: i32,
}

/// Level, restriction and provenance shared by most gear.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommonInfo {
    pub level: i32,
    pub restriction: String,
    pub origin_rarity: String,
    pub kind: String,
    pub aura: String,
}

/// Category-specific part of a reference item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ItemDetails {
    Weapon {
        common: CommonInfo,
        hands: String,
        damage: String,
        pi: i32,
        characteristics: Characteristics,
        craft: Craft,
    },
    ThrownWeapon {
        common: CommonInfo,
        range: String,
        damage: String,
        pi: i32,
        craft: Craft,
    },
    Protection {
        common: CommonInfo,
        material: String,
        covers: String,
        protections: Protections,
        characteristics: Characteristics,
        craft: Craft,
    },
    Accessory {
        common: CommonInfo,
        pi: i32,
        protections: Protections,
        characteristics: Characteristics,
        craft: Craft,
    },
    Drink,
    Food {
        expiry: String,
        craft: Craft,
    },
    Ingredient {
        harvest: String,
    },
    Ammunition {
        common: CommonInfo,
        craft: Craft,
    },
    MagicObject {
        restriction: String,
        charges: i32,
        craft: Craft,
    },
    Potion {
        common: CommonInfo,
        container: String,
        craft: Craft,
    },
    Container {
        capacity: i32,
        craft: Craft,
    },
    Tool {
        common: CommonInfo,
        craft: Craft,
    },
    Generic {
        common: CommonInfo,
        hands: String,
        damage: String,
        pi: i32,
        characteristics: Characteristics,
        craft: Craft,
    },
}

/// A flattened reference item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefEquipment {
    pub id: i64,
    pub ref_id: i64,
    pub category: EquipmentCategory,
    pub name: String,
    pub price: f64,
    pub currency: String,
    /// Stored weight in grams, before category overrides.
    pub weight: f64,
    pub rupture: String,
    pub effect: String,
    pub details: ItemDetails,
}

impl RefEquipment {
    #[must_use]
    pub const fn characteristics(&self) -> Option<&Characteristics> {
        match &self.details {
            ItemDetails::Weapon {
                characteristics, ..
            }
            | ItemDetails::Protection {
                characteristics, ..
            }
            | ItemDetails::Accessory {
                characteristics, ..
            }
            | ItemDetails::Generic {
                characteristics, ..
            } => Some(characteristics),
            _ => None,
        }
    }

    #[must_use]
    pub const fn protections(&self) -> Option<&Protections> {
        match &self.details {
            ItemDetails::Protection { protections, .. }
            | ItemDetails::Accessory { protections, .. } => Some(protections),
            _ => None,
        }
    }

    /// Weapon damage bonus printed on the item.
    #[must_use]
    pub const fn pi(&self) -> i32 {
        match &self.details {
            ItemDetails::Weapon { pi, .. }
            | ItemDetails::ThrownWeapon { pi, .. }
            | ItemDetails::Accessory { pi, .. }
            | ItemDetails::Generic { pi, .. } => *pi,
            _ => 0,
        }
    }

    /// Flatten a persisted record into its typed form.
    #[must_use]
    pub fn from_record(record: RawRefRecord) -> Self {
        let RawRefRecord {
            id,
            ref_id,
            category,
            nom,
            degats,
            caracteristiques,
            protections,
            prix_info,
            craft,
            details,
        } = record;
        let common = CommonInfo {
            level: details.niveau,
            restriction: details.restriction.clone(),
            origin_rarity: details.origine_rarete.clone(),
            kind: details.kind.clone(),
            aura: details.aura.clone(),
        };
        let item_details = match &category {
            EquipmentCategory::Armes | EquipmentCategory::MainsNues => ItemDetails::Weapon {
                common,
                hands: details.mains.clone(),
                damage: degats.degats,
                pi: degats.pi,
                characteristics: caracteristiques,
                craft,
            },
            EquipmentCategory::ArmesDeJet => ItemDetails::ThrownWeapon {
                common,
                range: details.portee.clone(),
                damage: degats.degats,
                pi: degats.pi,
                craft,
            },
            EquipmentCategory::Protections => ItemDetails::Protection {
                common,
                material: details.matiere.clone(),
                covers: details.couvre.clone(),
                protections,
                characteristics: caracteristiques,
                craft,
            },
            EquipmentCategory::Accessoires => ItemDetails::Accessory {
                common,
                pi: degats.pi,
                protections,
                characteristics: caracteristiques,
                craft,
            },
            EquipmentCategory::Boissons => ItemDetails::Drink,
            EquipmentCategory::Bouffes => ItemDetails::Food {
                expiry: details.peremption.clone(),
                craft,
            },
            EquipmentCategory::Ingredients => ItemDetails::Ingredient {
                harvest: details.recolte.clone(),
            },
            EquipmentCategory::Munitions => ItemDetails::Ammunition { common, craft },
            EquipmentCategory::ObjetsMagiques => ItemDetails::MagicObject {
                restriction: details.restriction.clone(),
                charges: details.charge,
                craft,
            },
            EquipmentCategory::Potions => ItemDetails::Potion {
                common,
                container: details.contenant.clone(),
                craft,
            },
            EquipmentCategory::Sacoches => ItemDetails::Container {
                capacity: details.places,
                craft,
            },
            EquipmentCategory::Sacs => ItemDetails::Container {
                capacity: details.capacite,
                craft,
            },
            EquipmentCategory::Outils
            | EquipmentCategory::Pieges
            | EquipmentCategory::ObjetsSpeciaux => ItemDetails::Tool { common, craft },
            EquipmentCategory::Other(_) => ItemDetails::Generic {
                common,
                hands: details.mains.clone(),
                damage: degats.degats,
                pi: degats.pi,
                characteristics: caracteristiques,
                craft,
            },
        };
        Self {
            id,
            ref_id,
            category,
            name: nom,
            price: prix_info.prix,
            currency: prix_info.monnaie,
            weight: details.poids,
            rupture: details.rupture,
            effect: details.effet,
            details: item_details,
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted record shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDamage {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub degats: String,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub pi: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPrice {
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub prix: f64,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub monnaie: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDetails {
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub niveau: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub restriction: String,
    #[serde(
        default,
        rename = "origine/rarete",
        alias = "origine_rarete",
        deserialize_with = "deserialize_lenient_string"
    )]
    pub origine_rarete: String,
    #[serde(default, rename = "type", deserialize_with = "deserialize_lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub contenant: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub portee: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub aura: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub mains: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub matiere: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub couvre: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub effet: String,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub charge: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub capacite: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub places: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub poids: f64,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub rupture: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub recolte: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub peremption: String,
}

/// Reference item as stored by the persistence layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRefRecord {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub ref_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: EquipmentCategory,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub nom: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub degats: RawDamage,
    #[serde(default, deserialize_with = "null_as_default")]
    pub caracteristiques: Characteristics,
    #[serde(default, deserialize_with = "null_as_default")]
    pub protections: Protections,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prix_info: RawPrice,
    #[serde(default, deserialize_with = "null_as_default")]
    pub craft: Craft,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: RawDetails,
}

impl Default for EquipmentCategory {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// In-memory reference catalog, indexed by item id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceCatalog {
    items: Vec<RefEquipment>,
    index: HashMap<i64, usize>,
}

impl ReferenceCatalog {
    #[must_use]
    pub fn from_items(items: Vec<RefEquipment>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id, position))
            .collect();
        Self { items, index }
    }

    #[must_use]
    pub fn from_records(records: Vec<RawRefRecord>) -> Self {
        Self::from_items(records.into_iter().map(RefEquipment::from_record).collect())
    }

    /// Parse an array of persisted records. Entries that are not objects are
    /// dropped with a warning; the array itself must be valid JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RulesDataError::Parse`] when the document is not a JSON array.
    pub fn from_json(json: &str) -> Result<Self, RulesDataError> {
        let values: Vec<Value> = serde_json::from_str(json)
            .map_err(|err| RulesDataError::parse("reference catalog", err))?;
        Ok(Self::from_records(parse_records(values)))
    }

    /// Replace every entry, as when the owning context signals a reload.
    pub fn reload(&mut self, records: Vec<RawRefRecord>) {
        let previous = self.items.len();
        *self = Self::from_records(records);
        log::debug!(
            target: LOG_TARGET_CATALOG,
            "catalog reloaded: {previous} -> {} items",
            self.items.len()
        );
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<&RefEquipment> {
        self.index.get(&id).and_then(|&pos| self.items.get(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefEquipment> {
        self.items.iter()
    }

    /// Items outside `category`, e.g. the shopping-list picker hiding bare hands.
    pub fn excluding<'a>(
        &'a self,
        category: &'a EquipmentCategory,
    ) -> impl Iterator<Item = &'a RefEquipment> + 'a {
        self.items.iter().filter(move |item| &item.category != category)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Decode persisted records one by one, dropping malformed entries.
#[must_use]
pub fn parse_records(values: Vec<Value>) -> Vec<RawRefRecord> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                log::warn!(
                    target: LOG_TARGET_CATALOG,
                    "dropping malformed reference record #{position}: {err}"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RefEquipment {
        RefEquipment::from_record(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn categories_round_trip_their_persisted_names() {
        for category in EquipmentCategory::KNOWN {
            let parsed: EquipmentCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
        let other: EquipmentCategory = "Compétences".parse().unwrap();
        assert_eq!(other, EquipmentCategory::Other("Compétences".into()));
        assert_eq!(serde_json::to_value(&other).unwrap(), json!("Compétences"));
    }

    #[test]
    fn schemas_follow_category_layout() {
        let weapons = schema(&EquipmentCategory::Armes);
        let keys: Vec<_> = weapons.iter().map(|f| f.key).collect();
        assert_eq!(&keys[..6], ["niveau", "restriction", "origine_rarete", "type", "aura", "mains"]);
        assert!(keys.contains(&"attaque"));
        assert!(!keys.contains(&"parade"));

        let drinks: Vec<_> = schema(&EquipmentCategory::Boissons).iter().map(|f| f.key).collect();
        assert_eq!(drinks, ["prix", "monnaie", "effet"]);

        let food = schema(&EquipmentCategory::Bouffes);
        assert_eq!(food.last().map(|f| f.key), Some("xp_confection"));

        let unknown = schema(&EquipmentCategory::Other("Compétences".into()));
        assert!(unknown.iter().any(|f| f.key == "parade"));
        assert_eq!(unknown.len(), default_schema().len());
    }

    #[test]
    fn protection_records_flatten_nested_sections() {
        let item = record(json!({
            "id": 7,
            "ref_id": "12",
            "category": "Protections",
            "nom": "Cuirasse de cuir",
            "protections": {"pr_sol": 2, "pr_spe": "1", "froid": 1},
            "caracteristiques": {"adresse": -1, "mvt": -1},
            "prix_info": {"prix": "35", "monnaie": "PO"},
            "details": {"poids": "4000", "rupture": "1à3", "origine/rarete": "Commun", "matiere": "Cuir"}
        }));
        assert_eq!(item.ref_id, 12);
        assert!((item.price - 35.0).abs() < f64::EPSILON);
        assert!((item.weight - 4000.0).abs() < f64::EPSILON);
        assert_eq!(item.rupture, "1à3");
        assert_eq!(item.protections().map(|p| p.pr_spe), Some(1));
        assert_eq!(item.characteristics().map(|c| c.mvt), Some(-1));
        match &item.details {
            ItemDetails::Protection { common, material, .. } => {
                assert_eq!(common.origin_rarity, "Commun");
                assert_eq!(material, "Cuir");
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn missing_sections_default_to_zero() {
        let item = record(json!({"id": 1, "category": "Armes", "nom": "Bâton", "details": null}));
        assert!(item.weight.abs() < f64::EPSILON);
        assert_eq!(item.pi(), 0);
        assert!(item.protections().is_none());
        assert!(item.characteristics().is_some());
    }

    #[test]
    fn catalog_lookup_exclusion_and_reload() {
        let json = r#"[
            {"id": 1, "category": "Mains_nues", "nom": "Poing"},
            {"id": 2, "category": "Sacs", "nom": "Sac à dos", "details": {"capacite": 20}},
            42
        ]"#;
        let mut catalog = ReferenceCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(2).map(|i| i.name.as_str()), Some("Sac à dos"));
        let shown: Vec<_> = catalog
            .excluding(&EquipmentCategory::MainsNues)
            .map(|i| i.id)
            .collect();
        assert_eq!(shown, [2]);

        catalog.reload(Vec::new());
        assert!(catalog.is_empty());
        assert!(catalog.get(2).is_none());
    }
}
