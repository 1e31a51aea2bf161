use grimoire_game::data::OriginEntry;
use grimoire_game::{
    Attribute, CatalogueLine, CharacterContext, Competence, EffectType, GameRules, Identity,
    Rarity, ReferenceCatalog, aggregate_catalogue, apply_rules, apply_rupture_modifier, modifiers,
};
use serde_json::json;

fn trigger() -> Competence {
    Competence {
        id: "comp-1".into(),
        name: "Les yeux révolver".into(),
        ..Competence::default()
    }
}

fn system_names(skills: &[Competence]) -> Vec<&str> {
    skills
        .iter()
        .filter(|s| s.is_system())
        .map(|s| s.name.as_str())
        .collect()
}

#[test]
fn every_table_has_eleven_doses_starting_neutral() {
    for effect in EffectType::ALL {
        assert_eq!(effect.table().len(), 11);
        assert!(effect.table()[0].is_zero());
    }
}

#[test]
fn light_alcohol_dose_five_vector() {
    let mods = modifiers(EffectType::Leger, 5);
    for attribute in Attribute::ALL {
        let expected = match attribute {
            Attribute::Courage => 1,
            Attribute::Intelligence | Attribute::Perception => -1,
            _ => 0,
        };
        assert_eq!(mods.get(attribute), expected, "{}", attribute.key());
    }
}

#[test]
fn rupture_modifier_examples() {
    assert_eq!(apply_rupture_modifier("1à3", 1), "1à4");
    assert_eq!(apply_rupture_modifier("Non", 2), "1à2");
    assert_eq!(apply_rupture_modifier("Non", 1), "1");
    assert_eq!(apply_rupture_modifier("2", -5), "Non");
}

#[test]
fn trigger_without_base_grants_base_tier() {
    let rules = GameRules::default();
    let identity = Identity {
        origine: "Humain".into(),
        ..Identity::default()
    };
    let ctx = CharacterContext::new(Some(&identity), &rules);
    let out = apply_rules(vec![trigger()], &ctx, &[]);
    assert_eq!(system_names(&out), ["Terrifiant I"]);
}

#[test]
fn trigger_with_native_base_grants_upgraded_tier() {
    let rules = GameRules {
        origines: vec![OriginEntry {
            name_m: "Ogre".into(),
            name_f: "Ogresse".into(),
            competences: vec!["Terrifiant I".into()],
        }],
        metiers: Vec::new(),
    };
    let identity = Identity {
        origine: "Ogre".into(),
        ..Identity::default()
    };
    let ctx = CharacterContext::new(Some(&identity), &rules);

    // A stale base grant from before the origin changed is replaced.
    let mut skills = apply_rules(vec![trigger()], &ctx, &[]);
    assert_eq!(system_names(&skills), ["Terrifiant II"]);
    skills.push(Competence {
        id: "sys-stale".into(),
        name: "Terrifiant I".into(),
        provenance: grimoire_game::Provenance::System("les_yeux".into()),
        ..Competence::default()
    });
    let out = apply_rules(skills, &ctx, &[]);
    assert_eq!(system_names(&out), ["Terrifiant II"]);
}

#[test]
fn excluded_lines_do_not_count() {
    let catalog = ReferenceCatalog::from_json(
        &json!([
            {"id": 1, "category": "Outils", "nom": "Corde", "prix_info": {"prix": 10}},
            {"id": 2, "category": "Outils", "nom": "Grappin", "prix_info": {"prix": 100}}
        ])
        .to_string(),
    )
    .unwrap();
    let lines = vec![
        CatalogueLine {
            uid: "ligne-1".into(),
            ref_id: 1,
            quantity: 2,
            rarity: Rarity::OneAndHalf,
            included: true,
            condensed: false,
        },
        CatalogueLine {
            uid: "ligne-2".into(),
            ref_id: 2,
            quantity: 1,
            rarity: Rarity::Normal,
            included: false,
            condensed: false,
        },
    ];
    let totals = aggregate_catalogue(&lines, &catalog);
    assert!((totals.total_price - 30.0).abs() < 1e-9);
    assert_eq!(lines.len(), 2);
}
