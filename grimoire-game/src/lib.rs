//! Grimoire Rules Engine
//!
//! Platform-agnostic derived-stat resolution for Grimoire character sheets.
//! This crate turns raw attributes, equipment, status effects, origin and
//! skills into final values with auditable breakdowns, without UI or
//! persistence dependencies.

pub mod attributes;
pub mod catalog;
pub mod competences;
pub mod constants;
pub mod data;
pub mod inventory;
pub mod ledger;
pub mod numbers;
pub mod origin;
pub mod sheet;
pub mod snapshot;
pub mod status;

// Re-export commonly used types
pub use attributes::{Attribute, AttributeVector, DerivedStat};
pub use catalog::{
    Characteristics, EquipmentCategory, FieldDef, FieldKind, ItemDetails, Protections,
    RawRefRecord, RefEquipment, ReferenceCatalog, schema,
};
pub use competences::{
    CharacterContext, Competence, CompetenceEditError, CompetenceRule, Provenance, TierGrantRule,
    add_user_competence, apply_rules, apply_rules_with, remove_user_competence, select_reference,
};
pub use data::{GameRules, JobEntry, OriginEntry, ReferenceCompetence, RulesDataError};
pub use inventory::{
    CatalogueLine, CatalogueTotals, LineUpdate, Rarity, add_line, aggregate_catalogue,
    apply_rupture_modifier, available_modifier_options, format_amount, group_by_category,
    normalize_rupture, remove_line, set_all_condensed, set_quantity, update_line, weight_of,
};
pub use ledger::{Contribution, Ledger, StatDetail, resolve, resolve_with_formula};
pub use origin::{Archetype, RacialModifiers, RacialTable, classify};
pub use sheet::{AdresseBonus, CharacterSheet, Identity, SheetContext};
pub use snapshot::{SheetSnapshot, build_snapshot};
pub use status::{CharacterStatus, EffectType, StatusModifiers, all_modifiers, modifiers};

use constants::LOG_TARGET_ENGINE;

/// Trait for abstracting reference data loading
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the equipment reference catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<ReferenceCatalog, Self::Error>;

    /// Load origins and jobs
    ///
    /// # Errors
    ///
    /// Returns an error if the rules cannot be loaded.
    fn load_game_rules(&self) -> Result<GameRules, Self::Error>;

    /// Load the reference competence list
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be loaded.
    fn load_reference_competences(&self) -> Result<Vec<ReferenceCompetence>, Self::Error>;

    /// Load racial modifiers per archetype
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be loaded.
    fn load_racial_table(&self) -> Result<RacialTable, Self::Error>;
}

/// Trait for abstracting character persistence
pub trait CharacterStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a character sheet
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet cannot be saved.
    fn save_character(&self, id: &str, sheet: &CharacterSheet) -> Result<(), Self::Error>;

    /// Load a character sheet
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet cannot be loaded.
    fn load_character(&self, id: &str) -> Result<Option<CharacterSheet>, Self::Error>;

    /// Delete a character sheet
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet cannot be deleted.
    fn delete_character(&self, id: &str) -> Result<(), Self::Error>;
}

/// Reference data loaded once and shared by every sheet.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub catalog: ReferenceCatalog,
    pub rules: GameRules,
    pub competences: Vec<ReferenceCompetence>,
    pub racial: RacialTable,
}

impl ReferenceData {
    /// Load everything through `loader`.
    ///
    /// # Errors
    ///
    /// Returns the loader's error for the first source that fails.
    pub fn load<L: DataLoader>(loader: &L) -> Result<Self, L::Error> {
        Ok(Self {
            catalog: loader.load_catalog()?,
            rules: loader.load_game_rules()?,
            competences: loader.load_reference_competences()?,
            racial: loader.load_racial_table()?,
        })
    }

    #[must_use]
    pub const fn sheet_context(&self) -> SheetContext<'_> {
        SheetContext::new(&self.catalog, &self.racial)
    }
}

/// Main engine facade
pub struct SheetEngine<L, S>
where
    L: DataLoader,
    S: CharacterStorage,
{
    data_loader: L,
    storage: S,
    reference: ReferenceData,
}

impl<L, S> SheetEngine<L, S>
where
    L: DataLoader,
    S: CharacterStorage,
{
    /// Create an engine, loading reference data once
    ///
    /// # Errors
    ///
    /// Returns an error if reference data cannot be loaded.
    pub fn new(data_loader: L, storage: S) -> Result<Self, L::Error> {
        let reference = ReferenceData::load(&data_loader)?;
        log::debug!(
            target: LOG_TARGET_ENGINE,
            "reference data loaded: {} items, {} origins, {} jobs",
            reference.catalog.len(),
            reference.rules.origines.len(),
            reference.rules.metiers.len()
        );
        Ok(Self {
            data_loader,
            storage,
            reference,
        })
    }

    /// Refresh reference data after the owning context signals a change.
    /// The previous data is kept when loading fails.
    ///
    /// # Errors
    ///
    /// Returns an error if reference data cannot be loaded.
    pub fn reload(&mut self) -> Result<(), L::Error> {
        let fresh = ReferenceData::load(&self.data_loader)?;
        log::info!(
            target: LOG_TARGET_ENGINE,
            "reference data reloaded: {} -> {} items",
            self.reference.catalog.len(),
            fresh.catalog.len()
        );
        self.reference = fresh;
        Ok(())
    }

    #[must_use]
    pub const fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Recompute every derived value of `sheet`.
    #[must_use]
    pub fn snapshot(&self, sheet: &CharacterSheet) -> SheetSnapshot {
        build_snapshot(
            sheet,
            &self.reference.sheet_context(),
            &self.reference.rules,
            &self.reference.competences,
        )
    }

    /// Copy of `sheet` with its competence list brought to the rules' fixed point.
    #[must_use]
    pub fn apply_competence_rules(&self, sheet: &CharacterSheet) -> CharacterSheet {
        let ctx = CharacterContext::new(sheet.identity.as_ref(), &self.reference.rules);
        CharacterSheet {
            competences: apply_rules(
                sheet.competences.clone(),
                &ctx,
                &self.reference.competences,
            ),
            ..sheet.clone()
        }
    }

    /// Save a sheet after applying the competence rules
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet cannot be saved.
    pub fn save_character(&self, id: &str, sheet: &CharacterSheet) -> Result<(), S::Error> {
        self.storage
            .save_character(id, &self.apply_competence_rules(sheet))
    }

    /// Load a stored sheet and resolve it
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet cannot be loaded.
    pub fn load_snapshot(&self, id: &str) -> Result<Option<SheetSnapshot>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let sheet = self.storage.load_character(id).map_err(Into::into)?;
        Ok(sheet.map(|sheet| self.snapshot(&sheet)))
    }

    /// Delete a stored sheet
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet cannot be deleted.
    pub fn delete_character(&self, id: &str) -> Result<(), S::Error> {
        self.storage.delete_character(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct FixtureLoader {
        loads: Rc<Cell<u32>>,
    }

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<ReferenceCatalog, Self::Error> {
            self.loads.set(self.loads.get() + 1);
            let json = if self.loads.get() == 1 {
                r#"[{"id": 1, "category": "Protections", "nom": "Casque", "protections": {"pr_sol": 1}}]"#
            } else {
                r#"[{"id": 1, "category": "Protections", "nom": "Casque", "protections": {"pr_sol": 2}}]"#
            };
            Ok(ReferenceCatalog::from_json(json).unwrap())
        }

        fn load_game_rules(&self) -> Result<GameRules, Self::Error> {
            Ok(GameRules::from_json(
                r#"{"origines": [{"name_m": "Ogre", "name_f": "Ogresse", "competences": ["Terrifiant I"]}]}"#,
            )
            .unwrap())
        }

        fn load_reference_competences(&self) -> Result<Vec<ReferenceCompetence>, Self::Error> {
            Ok(Vec::new())
        }

        fn load_racial_table(&self) -> Result<RacialTable, Self::Error> {
            Ok(RacialTable::default())
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

    fn ogre() -> CharacterSheet {
        serde_json::from_value(serde_json::json!({
            "identity": {"origine": "Ogre"},
            "equipement": [{"refId": 1}],
            "competences": [{"id": "c1", "nom": "Les yeux révolver"}]
        }))
        .unwrap()
    }

    #[test]
    fn engine_saves_rule_applied_sheets() {
        let storage = MemoryStorage::default();
        let engine = SheetEngine::new(FixtureLoader::default(), storage.clone()).unwrap();
        engine.save_character("ogre", &ogre()).unwrap();

        let stored = storage.sheets.borrow().get("ogre").cloned().unwrap();
        let names: Vec<_> = stored.competences.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Les yeux révolver", "Terrifiant II"]);

        let snapshot = engine.load_snapshot("ogre").unwrap().expect("sheet exists");
        assert_eq!(snapshot.archetype, Archetype::PeauVerte);
        assert_eq!(snapshot.defenses.solide.total, 1);
        assert!(engine.load_snapshot("missing").unwrap().is_none());

        engine.delete_character("ogre").unwrap();
        assert!(engine.load_snapshot("ogre").unwrap().is_none());
    }

    #[test]
    fn reload_refreshes_reference_data() {
        let loader = FixtureLoader::default();
        let mut engine = SheetEngine::new(loader.clone(), MemoryStorage::default()).unwrap();
        assert_eq!(engine.snapshot(&ogre()).defenses.solide.total, 1);
        engine.reload().unwrap();
        assert_eq!(loader.loads.get(), 2);
        assert_eq!(engine.snapshot(&ogre()).defenses.solide.total, 2);
        assert_eq!(engine.reference().catalog.len(), 1);
    }
}
