//! Per-iteration invariants checked against seeded random sheets.
use anyhow::{Result, ensure};
use grimoire_game::inventory::{LineUpdate, line_totals};
use grimoire_game::{
    Archetype, CharacterContext, CharacterSheet, Competence, EffectType, SheetSnapshot,
    StatDetail, add_line, aggregate_catalogue, apply_rules, apply_rupture_modifier,
    available_modifier_options, build_snapshot, classify, modifiers, normalize_rupture,
    set_quantity, update_line,
};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

use super::assets::TesterAssets;
use super::generator::random_sheet;

pub type CheckFn = fn(&TesterAssets, &mut ChaCha20Rng) -> Result<()>;

fn snapshot_of(assets: &TesterAssets, rng: &mut ChaCha20Rng) -> (CharacterSheet, SheetSnapshot) {
    let reference = &assets.reference;
    let sheet = random_sheet(rng, &reference.catalog);
    let snapshot = build_snapshot(
        &sheet,
        &reference.sheet_context(),
        &reference.rules,
        &reference.competences,
    );
    (sheet, snapshot)
}

fn stat_details(snapshot: &SheetSnapshot) -> Vec<(String, &StatDetail)> {
    let mut details = vec![
        ("naturelle".to_string(), &snapshot.defenses.naturelle),
        ("solide".to_string(), &snapshot.defenses.solide),
        ("speciale".to_string(), &snapshot.defenses.speciale),
        ("magique".to_string(), &snapshot.defenses.magique),
        ("marche".to_string(), &snapshot.movement.marche),
        ("course".to_string(), &snapshot.movement.course),
        ("magie_physique".to_string(), &snapshot.magic.magie_physique),
        ("magie_psychique".to_string(), &snapshot.magic.magie_psychique),
        (
            "resistance_magique".to_string(),
            &snapshot.magic.resistance_magique,
        ),
        ("discretion".to_string(), &snapshot.discretion),
        ("esquive".to_string(), &snapshot.esquive),
        ("pi".to_string(), &snapshot.weapon_damage_bonus),
    ];
    details.extend(
        snapshot
            .characteristics
            .iter()
            .map(|(attribute, detail)| (attribute.key().to_string(), detail)),
    );
    details
}

pub fn check_smoke(assets: &TesterAssets, rng: &mut ChaCha20Rng) -> Result<()> {
    let (sheet, first) = snapshot_of(assets, rng);
    let reference = &assets.reference;
    let second = build_snapshot(
        &sheet,
        &reference.sheet_context(),
        &reference.rules,
        &reference.competences,
    );
    ensure!(first == second, "recompute changed the snapshot");
    let json = serde_json::to_value(&first)?;
    ensure!(json.get("defenses").is_some(), "snapshot lost its defenses");
    Ok(())
}

pub fn check_ledger_totals(assets: &TesterAssets, rng: &mut ChaCha20Rng) -> Result<()> {
    let (_, snapshot) = snapshot_of(assets, rng);
    for (name, detail) in stat_details(&snapshot) {
        ensure!(
            detail.total == detail.base + detail.sum_components(),
            "{name}: total {} != base {} + components {}",
            detail.total,
            detail.base,
            detail.sum_components()
        );
    }
    ensure!(snapshot.esquive.total >= 0, "esquive below zero");
    Ok(())
}

pub fn check_competence_rules(assets: &TesterAssets, rng: &mut ChaCha20Rng) -> Result<()> {
    let reference = &assets.reference;
    let sheet = random_sheet(rng, &reference.catalog);
    let ctx = CharacterContext::new(sheet.identity.as_ref(), &reference.rules);
    let once = apply_rules(sheet.competences.clone(), &ctx, &reference.competences);
    let twice = apply_rules(once.clone(), &ctx, &reference.competences);
    ensure!(once == twice, "rules are not idempotent for {:?}", sheet.competences);

    // Without an identity the list is left untouched, stale tiers included.
    let owned = |tier: &str| {
        once.iter()
            .filter(|c| c.name == tier && c.provenance.is_owned_by("les_yeux"))
            .count()
    };
    ensure!(
        sheet.identity.is_none() || owned("Terrifiant I") + owned("Terrifiant II") <= 1,
        "stacked tiers in {once:?}"
    );

    let foreign = |skills: &[Competence]| -> Vec<Competence> {
        skills
            .iter()
            .filter(|c| !c.provenance.is_owned_by("les_yeux"))
            .cloned()
            .collect()
    };
    ensure!(
        foreign(&sheet.competences) == foreign(&once),
        "rules touched entries they do not own"
    );
    Ok(())
}

const RUPTURES: &[&str] = &[
    "Non", "aucune", "", "1", "3", "1à3", "1 à 5", "2-4", "1/6", "1 to 2", "?",
];

pub fn check_rupture(_assets: &TesterAssets, rng: &mut ChaCha20Rng) -> Result<()> {
    let rupture = RUPTURES.choose(rng).copied().unwrap_or_default();
    let max = normalize_rupture(rupture);
    ensure!(
        normalize_rupture(&apply_rupture_modifier(rupture, 0)) == max,
        "{rupture:?} does not round-trip"
    );
    let modifier = rng.gen_range(-3..=6);
    let shifted = normalize_rupture(&apply_rupture_modifier(rupture, modifier));
    ensure!(
        shifted == (max + modifier).max(0),
        "{rupture:?} shifted by {modifier} gave {shifted}"
    );
    let cap = rng.gen_range(0..=8);
    let options = available_modifier_options(rupture, cap);
    ensure!(options.first() == Some(&0), "options must start at 0");
    ensure!(
        options == [0] || options.iter().all(|option| max + option <= cap),
        "option past cap {cap} for {rupture:?}: {options:?}"
    );
    Ok(())
}

pub fn check_status_doses(_assets: &TesterAssets, rng: &mut ChaCha20Rng) -> Result<()> {
    let dose = rng.gen_range(-50..=50);
    for effect in EffectType::ALL {
        ensure!(effect.table().len() == 11, "{} table size", effect.key());
        ensure!(
            modifiers(effect, dose) == modifiers(effect, dose.clamp(0, 10)),
            "{} dose {dose} not clamped",
            effect.key()
        );
    }
    Ok(())
}

const ORIGIN_SAMPLES: &[(&str, Archetype)] = &[
    ("Humaine", Archetype::Humain),
    ("Elfe", Archetype::Elfe),
    ("Elfe noir", Archetype::ElfeNoir),
    ("Haute elfe", Archetype::Elfe),
    ("Naine", Archetype::Nain),
    ("Ogresse", Archetype::PeauVerte),
    ("Gnôme des forêts", Archetype::Gnome),
    ("Hobbit", Archetype::SemiHomme),
    ("Loup-garou", Archetype::Barbare),
    ("", Archetype::Humain),
];

pub fn check_origin_classification(_assets: &TesterAssets, rng: &mut ChaCha20Rng) -> Result<()> {
    let (text, expected) = ORIGIN_SAMPLES
        .choose(rng)
        .copied()
        .unwrap_or(("", Archetype::Humain));
    let padded = format!("  {}  ", text.to_uppercase());
    ensure!(
        classify(&padded) == expected,
        "{padded:?} classified as {} instead of {expected}",
        classify(&padded)
    );
    Ok(())
}

pub fn check_catalogue_totals(assets: &TesterAssets, rng: &mut ChaCha20Rng) -> Result<()> {
    let catalog = &assets.reference.catalog;
    let sheet = random_sheet(rng, catalog);
    let totals = aggregate_catalogue(&sheet.catalogue, catalog);
    let expected: f64 = sheet
        .catalogue
        .iter()
        .filter(|line| line.included)
        .filter_map(|line| line_totals(line, catalog))
        .map(|line| line.price)
        .sum();
    ensure!(
        (totals.total_price - expected).abs() < 1e-6,
        "price {} != {expected}",
        totals.total_price
    );
    ensure!(totals.total_weight >= 0.0, "negative weight");

    let grown = add_line(&sheet.catalogue, 1, false);
    let uid = grown.last().map(|line| line.uid.clone()).unwrap_or_default();
    ensure!(
        grown.iter().filter(|line| line.uid == uid).count() == 1,
        "duplicate uid {uid}"
    );
    let shrunk = set_quantity(&grown, &uid, rng.gen_range(-5..=0));
    ensure!(
        shrunk.iter().all(|line| line.quantity >= 1),
        "quantity below one"
    );
    let excluded = update_line(
        &shrunk,
        &uid,
        LineUpdate {
            included: Some(false),
            ..LineUpdate::default()
        },
    );
    ensure!(
        aggregate_catalogue(&excluded, catalog) == totals,
        "excluded line still counted"
    );
    Ok(())
}

pub fn check_shields(assets: &TesterAssets, rng: &mut ChaCha20Rng) -> Result<()> {
    let reference = &assets.reference;
    let mut sheet = random_sheet(rng, &reference.catalog);
    let ctx = reference.sheet_context();
    sheet.defenses.bouclier_actif = false;
    let lowered = grimoire_game::sheet::compute_defenses(&sheet, &ctx);
    sheet.defenses.bouclier_actif = true;
    let raised = grimoire_game::sheet::compute_defenses(&sheet, &ctx);
    let pairs = [
        (&lowered.solide, &raised.solide),
        (&lowered.speciale, &raised.speciale),
        (&lowered.magique, &raised.magique),
    ];
    for (before, after) in pairs {
        ensure!(
            after.components.len() >= before.components.len(),
            "raising a shield removed a source"
        );
    }
    ensure!(lowered.naturelle == raised.naturelle, "shield moved natural protection");
    Ok(())
}
