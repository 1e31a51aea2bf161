//! Full recompute of a character sheet into one serializable value.
use serde::Serialize;
use std::collections::BTreeMap;

use crate::attributes::Attribute;
use crate::catalog::EquipmentCategory;
use crate::competences::{CharacterContext, Competence, apply_rules};
use crate::constants::DEFAULT_RUPTURE_CAP;
use crate::data::{GameRules, ReferenceCompetence};
use crate::inventory::{
    CatalogueTotals, aggregate_catalogue, apply_rupture_modifier, available_modifier_options,
    weight_of,
};
use crate::ledger::StatDetail;
use crate::origin::Archetype;
use crate::sheet::{
    CharacterSheet, DefenseBreakdown, MagicBreakdown, MovementBreakdown, SheetContext,
    adresse_bonus_pending, compute_characteristic, compute_defenses, compute_discretion,
    compute_esquive, compute_magic, compute_movement, compute_weapon_damage_bonus,
    equipped_items, total_protection,
};
use crate::status::{StatusModifiers, all_modifiers};

/// An equipped item with its effective rupture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentView {
    pub ref_id: i64,
    pub name: String,
    pub category: EquipmentCategory,
    pub base_rupture: String,
    pub modif_rupture: i32,
    pub rupture: String,
    /// Modifiers still selectable without passing the cap.
    pub rupture_options: Vec<i32>,
    pub weight: f64,
}

/// Every derived value of a sheet, recomputed from scratch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSnapshot {
    pub archetype: Archetype,
    pub defenses: DefenseBreakdown,
    pub total_protection: i32,
    pub movement: MovementBreakdown,
    pub magic: MagicBreakdown,
    pub discretion: StatDetail,
    pub characteristics: BTreeMap<Attribute, StatDetail>,
    pub esquive: StatDetail,
    pub weapon_damage_bonus: StatDetail,
    pub status_modifiers: StatusModifiers,
    pub competences: Vec<Competence>,
    pub equipment: Vec<EquipmentView>,
    pub catalogue_totals: CatalogueTotals,
    pub adresse_bonus_pending: bool,
}

/// Resolve `sheet` against reference data. Pure; inputs are not modified.
#[must_use]
pub fn build_snapshot(
    sheet: &CharacterSheet,
    ctx: &SheetContext<'_>,
    rules: &GameRules,
    reference: &[ReferenceCompetence],
) -> SheetSnapshot {
    let defenses = compute_defenses(sheet, ctx);
    let characteristics = Attribute::ALL
        .into_iter()
        .filter(|attr| !matches!(attr, Attribute::Esquive | Attribute::Pi))
        .map(|attr| (attr, compute_characteristic(sheet, ctx, attr)))
        .collect();
    let competences = apply_rules(
        sheet.competences.clone(),
        &CharacterContext::new(sheet.identity.as_ref(), rules),
        reference,
    );
    let equipment = equipped_items(sheet, ctx.catalog)
        .map(|(slot, item)| EquipmentView {
            ref_id: slot.ref_id,
            name: item.name.clone(),
            category: item.category.clone(),
            base_rupture: item.rupture.clone(),
            modif_rupture: slot.modif_rupture,
            rupture: apply_rupture_modifier(&item.rupture, slot.modif_rupture),
            rupture_options: available_modifier_options(&item.rupture, DEFAULT_RUPTURE_CAP),
            weight: weight_of(item),
        })
        .collect();

    SheetSnapshot {
        archetype: sheet.archetype(),
        total_protection: total_protection(sheet, &defenses),
        defenses,
        movement: compute_movement(sheet, ctx),
        magic: compute_magic(sheet, ctx),
        discretion: compute_discretion(sheet, ctx),
        characteristics,
        esquive: compute_esquive(sheet, ctx),
        weapon_damage_bonus: compute_weapon_damage_bonus(sheet),
        status_modifiers: all_modifiers(&sheet.status),
        competences,
        equipment,
        catalogue_totals: aggregate_catalogue(&sheet.catalogue, ctx.catalog),
        adresse_bonus_pending: adresse_bonus_pending(sheet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ReferenceCatalog;
    use crate::origin::RacialTable;
    use serde_json::json;

    #[test]
    fn snapshot_is_deterministic_and_complete() {
        let catalog = ReferenceCatalog::from_json(
            &json!([{"id": 5, "category": "Armes", "nom": "Hache", "details": {"rupture": "1à3"}}])
                .to_string(),
        )
        .unwrap();
        let racial = RacialTable::default();
        let ctx = SheetContext::new(&catalog, &racial);
        let sheet: CharacterSheet = serde_json::from_value(json!({
            "identity": {"origine": "Barbare"},
            "equipement": [{"refId": 5, "modif_rupture": 1}],
            "competences": [{"id": "c1", "nom": "Les yeux révolver"}]
        }))
        .unwrap();

        let first = build_snapshot(&sheet, &ctx, &GameRules::default(), &[]);
        let second = build_snapshot(&sheet, &ctx, &GameRules::default(), &[]);
        assert_eq!(first, second);
        assert_eq!(first.archetype, Archetype::Barbare);
        assert_eq!(first.characteristics.len(), 8);
        assert_eq!(first.equipment[0].rupture, "1à4");
        assert_eq!(first.equipment[0].rupture_options, [0, 1, 2, 3]);
        assert_eq!(first.competences.len(), 2);
        assert_eq!(sheet.competences.len(), 1);

        let json = serde_json::to_value(&first).unwrap();
        assert!(json["characteristics"]["courage"].is_object());
        assert_eq!(json["archetype"], "barbare");
    }
}
