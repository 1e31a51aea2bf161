use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use grimoire_game::data::reference_competences_from_json;
use grimoire_game::{
    Archetype, Attribute, CharacterSheet, CharacterStorage, DataLoader, GameRules, RacialTable,
    ReferenceCatalog, ReferenceCompetence, SheetEngine,
};

const CATALOG: &str = include_str!("../../assets/data/catalog.json");
const RULES: &str = include_str!("../../assets/data/rules.json");
const COMPETENCES: &str = include_str!("../../assets/data/competences.json");
const RACIAL: &str = include_str!("../../assets/data/racial.json");
const GURDIL: &str = include_str!("../../assets/data/sheets/gurdil.json");

struct AssetLoader;

impl DataLoader for AssetLoader {
    type Error = grimoire_game::RulesDataError;

    fn load_catalog(&self) -> Result<ReferenceCatalog, Self::Error> {
        ReferenceCatalog::from_json(CATALOG)
    }

    fn load_game_rules(&self) -> Result<GameRules, Self::Error> {
        GameRules::from_json(RULES)
    }

    fn load_reference_competences(&self) -> Result<Vec<ReferenceCompetence>, Self::Error> {
        reference_competences_from_json(COMPETENCES)
    }

    fn load_racial_table(&self) -> Result<RacialTable, Self::Error> {
        RacialTable::from_json(RACIAL)
    }
}

#[derive(Clone, Default)]
struct MemoryStorage {
    sheets: Rc<RefCell<HashMap<String, CharacterSheet>>>,
}

impl CharacterStorage for MemoryStorage {
    type Error = Infallible;

    fn save_character(&self, id: &str, sheet: &CharacterSheet) -> Result<(), Self::Error> {
        self.sheets
            .borrow_mut()
            .insert(id.to_string(), sheet.clone());
        Ok(())
    }

    fn load_character(&self, id: &str) -> Result<Option<CharacterSheet>, Self::Error> {
        Ok(self.sheets.borrow().get(id).cloned())
    }

    fn delete_character(&self, id: &str) -> Result<(), Self::Error> {
        self.sheets.borrow_mut().remove(id);
        Ok(())
    }
}

fn engine() -> SheetEngine<AssetLoader, MemoryStorage> {
    SheetEngine::new(AssetLoader, MemoryStorage::default()).expect("fixtures load")
}

fn gurdil() -> CharacterSheet {
    serde_json::from_str(GURDIL).expect("sample sheet parses")
}

#[test]
fn sample_sheet_defenses_and_movement() {
    let snapshot = engine().snapshot(&gurdil());
    assert_eq!(snapshot.archetype, Archetype::Nain);

    assert_eq!(snapshot.defenses.naturelle.total, 2);
    assert_eq!(snapshot.defenses.solide.total, 6);
    assert_eq!(snapshot.defenses.speciale.total, 1);
    assert_eq!(snapshot.defenses.magique.total, 1);
    assert_eq!(snapshot.total_protection, 11);

    assert_eq!(snapshot.movement.marche.total, 5);
    assert_eq!(snapshot.movement.course.total, 9);
    let labels: Vec<_> = snapshot
        .movement
        .marche
        .components
        .iter()
        .map(|c| c.label.as_str())
        .collect();
    assert_eq!(labels, ["Cotte de mailles", "Origine (nain)"]);
}

#[test]
fn sample_sheet_magic_and_characteristics() {
    let snapshot = engine().snapshot(&gurdil());
    assert_eq!(snapshot.magic.resistance_magique.total, 13);
    assert_eq!(snapshot.magic.magie_psychique.total, 1);
    assert_eq!(snapshot.magic.magie_physique.total, 0);
    assert_eq!(snapshot.discretion.total, 5);

    let total = |attr: Attribute| snapshot.characteristics[&attr].total;
    assert_eq!(total(Attribute::Adresse), 11);
    assert_eq!(total(Attribute::Attaque), 12);
    assert_eq!(total(Attribute::Force), 14);
    assert_eq!(total(Attribute::Courage), 12);
    assert!(!snapshot.characteristics.contains_key(&Attribute::Esquive));

    assert_eq!(snapshot.esquive.total, 6);
    assert_eq!(snapshot.weapon_damage_bonus.total, 0);
    assert!(snapshot.adresse_bonus_pending);
    assert!(snapshot.status_modifiers.combined().is_zero());
}

#[test]
fn sample_sheet_equipment_and_catalogue() {
    let snapshot = engine().snapshot(&gurdil());
    let ruptures: Vec<_> = snapshot
        .equipment
        .iter()
        .map(|view| view.rupture.as_str())
        .collect();
    assert_eq!(ruptures, ["1à4", "1à2", "1à6", "Non"]);
    assert_eq!(snapshot.equipment[0].rupture_options, [0, 1, 2, 3]);
    assert_eq!(snapshot.equipment[2].rupture_options, [0, 1, 2]);
    assert_eq!(snapshot.equipment[3].rupture_options.len(), 7);
    assert!((snapshot.equipment[1].weight - 9000.0).abs() < f64::EPSILON);

    assert!((snapshot.catalogue_totals.total_price - 182.0).abs() < 1e-9);
    assert!((snapshot.catalogue_totals.total_weight - 1012.5).abs() < 1e-9);
}

#[test]
fn sample_sheet_gains_rule_competences() {
    let snapshot = engine().snapshot(&gurdil());
    let names: Vec<_> = snapshot
        .competences
        .iter()
        .map(|c| (c.name.as_str(), c.is_system()))
        .collect();
    assert_eq!(
        names,
        [
            ("Radin", false),
            ("Les yeux révolver", false),
            ("Terrifiant I", true)
        ]
    );
    assert_eq!(
        snapshot.competences[2].description,
        "Les adversaires faibles hésitent à attaquer."
    );
}

#[test]
fn mandated_job_skill_upgrades_the_grant() {
    let engine = engine();
    let mut sheet = gurdil();
    if let Some(identity) = sheet.identity.as_mut() {
        identity.metier = "Bourrelle".to_string();
    }
    let applied = engine.apply_competence_rules(&sheet);
    let system: Vec<_> = applied
        .competences
        .iter()
        .filter(|c| c.is_system())
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(system, ["Terrifiant II"]);
    assert!(applied.competences.last().and_then(|c| c.table.as_ref()).is_some());
}

#[test]
fn saved_sheets_persist_system_tags() {
    let engine = engine();
    engine.save_character("gurdil", &gurdil()).unwrap();
    let snapshot = engine
        .load_snapshot("gurdil")
        .unwrap()
        .expect("saved sheet");
    let json = serde_json::to_value(&snapshot.competences).unwrap();
    assert_eq!(json[2]["source"], "system:les_yeux");
    assert!(json[0].get("source").is_none());

    engine.delete_character("gurdil").unwrap();
    assert!(engine.load_snapshot("gurdil").unwrap().is_none());
}

#[test]
fn unknown_sections_survive_rule_application() {
    let mut raw: serde_json::Value = serde_json::from_str(GURDIL).unwrap();
    raw["vitals"] = serde_json::json!({"pv": 32, "pa": 0});
    raw["identity"]["niveau"] = 3.into();
    raw["competences"][0]["source"] = "objet:anneau".into();
    raw["competences"][1]["favori"] = true.into();
    let sheet: CharacterSheet = serde_json::from_value(raw.clone()).unwrap();

    let written = serde_json::to_value(engine().apply_competence_rules(&sheet)).unwrap();
    assert_eq!(written["vitals"], raw["vitals"]);
    assert_eq!(written["identity"]["niveau"], 3);
    assert_eq!(written["identity"]["nom"], "Gurdil");
    assert_eq!(written["competences"][0]["source"], "objet:anneau");
    assert_eq!(written["competences"][1]["favori"], true);
    assert_eq!(written["competences"][2]["source"], "system:les_yeux");

    let reread: CharacterSheet = serde_json::from_value(written).unwrap();
    assert_eq!(reread.extra, sheet.extra);
    assert!(!reread.competences[0].is_system());
}

#[test]
fn recompute_is_deterministic() {
    let engine = engine();
    let sheet = gurdil();
    let first = serde_json::to_string(&engine.snapshot(&sheet)).unwrap();
    let second = serde_json::to_string(&engine.snapshot(&sheet)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn partial_sheet_still_resolves() {
    let sheet: CharacterSheet = serde_json::from_str(
        r#"{
            "identity": {"nom": null, "origine": "  OGRESSE  ", "metier": null},
            "caracteristiques": {"esquive": "abc", "adresse": 14.7},
            "movement": null,
            "status": {"alcohol": null, "fatigue": "3 points", "drogue": -2},
            "equipement": [{"refId": "2", "modif_rupture": "beaucoup"}],
            "catalogue": [{"refId": 1, "quantite": 0}]
        }"#,
    )
    .unwrap();
    let snapshot = engine().snapshot(&sheet);
    assert_eq!(snapshot.archetype, Archetype::PeauVerte);
    assert_eq!(snapshot.characteristics[&Attribute::Adresse].total, 14 - 1);
    assert_eq!(snapshot.equipment[0].rupture, "1à2");
    // 0 - 2 (cotte) - 1 (origine) - 3 (fatigue) + 2 (drogue) floored to 0
    assert_eq!(snapshot.esquive.total, 0);
    assert_eq!(
        snapshot.esquive.total,
        snapshot.esquive.base + snapshot.esquive.sum_components()
    );
    assert!((snapshot.catalogue_totals.total_price - 90.0).abs() < 1e-9);
}
