//! Seeded random character sheets for sweeps.
use grimoire_game::sheet::{EquippedItem, ValuePair};
use grimoire_game::status::AlcoholDoses;
use grimoire_game::{
    AdresseBonus, Attribute, AttributeVector, CatalogueLine, CharacterSheet, CharacterStatus,
    Competence, Identity, Provenance, Rarity, ReferenceCatalog,
};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

const ORIGINS: &[&str] = &[
    "Humain",
    "Naine",
    "Ogre",
    "Ogresse",
    "Elfe",
    "Elfe noir",
    "Haute Elfe",
    "Gnôme des forêts",
    "Hobbit",
    "Barbare",
    "Troll",
    "",
    "Origine inventée",
];

const JOBS: &[&str] = &["Guerrier", "Guerrière", "Bourreau", "Voleuse", "Mage", ""];

const SKILLS: &[&str] = &[
    "Les yeux révolver",
    "Les yeux révolvers",
    "Terrifiant I",
    "Terrifiant II",
    "Radin",
    "Armurerie",
    "Chercher des noises",
];

fn pick<'a>(rng: &mut ChaCha20Rng, pool: &[&'a str]) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

fn value_pair(rng: &mut ChaCha20Rng, max: i32) -> ValuePair {
    ValuePair {
        base: rng.gen_range(0..=max),
        temp: rng.gen_range(-2..=2),
    }
}

fn attributes(rng: &mut ChaCha20Rng) -> AttributeVector {
    Attribute::ALL
        .into_iter()
        .fold(AttributeVector::ZERO, |vector, attribute| {
            let value = if attribute == Attribute::Pi {
                0
            } else {
                rng.gen_range(7..=14)
            };
            vector.with(attribute, value)
        })
}

fn competences(rng: &mut ChaCha20Rng) -> Vec<Competence> {
    (0..rng.gen_range(0..5))
        .map(|idx| Competence {
            id: format!("comp-{}", idx + 1),
            name: pick(rng, SKILLS).to_string(),
            provenance: if rng.gen_bool(0.2) {
                Provenance::System("les_yeux".to_string())
            } else {
                Provenance::User
            },
            ..Competence::default()
        })
        .collect()
}

fn status(rng: &mut ChaCha20Rng) -> CharacterStatus {
    CharacterStatus {
        alcohol: AlcoholDoses {
            leger: rng.gen_range(-2..=12),
            fort: rng.gen_range(-2..=12),
            gueule_de_bois: rng.gen_range(-2..=12),
        },
        fatigue: rng.gen_range(0..=4),
        drogue: rng.gen_range(0..=3),
        blessure_tete: rng.gen_range(0..=2),
    }
}

/// A plausible sheet referencing items of `catalog`, plus the odd dangling id.
pub fn random_sheet(rng: &mut ChaCha20Rng, catalog: &ReferenceCatalog) -> CharacterSheet {
    let ids: Vec<i64> = catalog.iter().map(|item| item.id).collect();
    let ref_id = |rng: &mut ChaCha20Rng| {
        if rng.gen_bool(0.1) {
            rng.gen_range(900..1000)
        } else {
            ids.choose(rng).copied().unwrap_or_default()
        }
    };

    let mut sheet = CharacterSheet {
        identity: rng.gen_bool(0.95).then(|| Identity {
            nom: "Aventurier".to_string(),
            origine: pick(rng, ORIGINS).to_string(),
            metier: pick(rng, JOBS).to_string(),
            ..Identity::default()
        }),
        caracteristiques: attributes(rng),
        status: status(rng),
        competences: competences(rng),
        adresse_bonus: [None, Some(AdresseBonus::Attaque), Some(AdresseBonus::Parade)]
            .choose(rng)
            .copied()
            .flatten(),
        ..CharacterSheet::default()
    };
    sheet.defenses.naturelle = value_pair(rng, 3);
    sheet.defenses.solide = value_pair(rng, 2);
    sheet.defenses.bouclier_actif = rng.gen_bool(0.5);
    sheet.movement.marche = value_pair(rng, 12);
    sheet.movement.course = value_pair(rng, 16);
    sheet.magie.resistance_magique = value_pair(rng, 14);
    sheet.magie.discretion = value_pair(rng, 8);

    sheet.equipement = (0..rng.gen_range(0..5))
        .map(|_| EquippedItem {
            ref_id: ref_id(rng),
            modif_rupture: rng.gen_range(-1..=4),
        })
        .collect();
    sheet.catalogue = (0..rng.gen_range(0..6))
        .map(|idx| CatalogueLine {
            uid: format!("ligne-{}", idx + 1),
            ref_id: ref_id(rng),
            quantity: rng.gen_range(1..=5),
            rarity: Rarity::ALL.choose(rng).copied().unwrap_or_default(),
            included: rng.gen_bool(0.8),
            condensed: rng.gen_bool(0.5),
        })
        .collect();
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn same_seed_same_sheet() {
        let catalog = ReferenceCatalog::default();
        let a = random_sheet(&mut ChaCha20Rng::seed_from_u64(7), &catalog);
        let b = random_sheet(&mut ChaCha20Rng::seed_from_u64(7), &catalog);
        assert_eq!(a, b);
    }
}
