//! Human-readable breakdown of one stored sheet.
use anyhow::{Context, Result};
use colored::Colorize;
use grimoire_game::{
    CharacterSheet, CharacterStorage, SheetEngine, SheetSnapshot, StatDetail, format_amount,
    group_by_category,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logic::FileLoader;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("sheet {path} is not valid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One JSON file per sheet, named `<id>.json`.
#[derive(Debug, Clone)]
pub struct DirStorage {
    dir: PathBuf,
}

impl DirStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl CharacterStorage for DirStorage {
    type Error = StorageError;

    fn save_character(&self, id: &str, sheet: &CharacterSheet) -> Result<(), Self::Error> {
        let path = self.path(id);
        let json = serde_json::to_string_pretty(sheet).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StorageError::Io { path, source })
    }

    fn load_character(&self, id: &str) -> Result<Option<CharacterSheet>, Self::Error> {
        let path = self.path(id);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| StorageError::Json { path, source })
    }

    fn delete_character(&self, id: &str) -> Result<(), Self::Error> {
        let path = self.path(id);
        match fs::remove_file(&path) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
                Err(StorageError::Io { path, source: err })
            }
            _ => Ok(()),
        }
    }
}

fn split_sheet_path(path: &Path) -> Result<(PathBuf, String)> {
    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((dir, id.to_string()))
}

fn write_stat(out: &mut dyn Write, name: &str, detail: &StatDetail) -> Result<()> {
    writeln!(out, "{}", format!("▸ {name}: {}", detail.total).bold())?;
    for line in detail.to_string().lines() {
        writeln!(out, "    {line}")?;
    }
    Ok(())
}

fn write_snapshot(out: &mut dyn Write, snapshot: &SheetSnapshot) -> Result<()> {
    writeln!(out, "Archetype: {}", snapshot.archetype.to_string().bright_white())?;
    writeln!(out)?;
    writeln!(out, "{}", "🛡️  Protections".bright_cyan().bold())?;
    write_stat(out, "Naturelle", &snapshot.defenses.naturelle)?;
    write_stat(out, "Solide", &snapshot.defenses.solide)?;
    write_stat(out, "Spéciale", &snapshot.defenses.speciale)?;
    write_stat(out, "Magique", &snapshot.defenses.magique)?;
    writeln!(out, "Total: {}", snapshot.total_protection)?;
    writeln!(out)?;
    writeln!(out, "{}", "🏃 Movement".bright_cyan().bold())?;
    write_stat(out, "Marche", &snapshot.movement.marche)?;
    write_stat(out, "Course", &snapshot.movement.course)?;
    writeln!(out)?;
    writeln!(out, "{}", "✨ Magic & stealth".bright_cyan().bold())?;
    write_stat(out, "Magie physique", &snapshot.magic.magie_physique)?;
    write_stat(out, "Magie psychique", &snapshot.magic.magie_psychique)?;
    write_stat(out, "Résistance magique", &snapshot.magic.resistance_magique)?;
    write_stat(out, "Discrétion", &snapshot.discretion)?;
    writeln!(out)?;
    writeln!(out, "{}", "⚔️  Characteristics".bright_cyan().bold())?;
    for (attribute, detail) in &snapshot.characteristics {
        write_stat(out, attribute.label(), detail)?;
    }
    write_stat(out, "Esquive", &snapshot.esquive)?;
    write_stat(out, "Dégâts (PI)", &snapshot.weapon_damage_bonus)?;
    if snapshot.adresse_bonus_pending {
        writeln!(out, "{}", "⚠️  Adresse bonus not assigned".yellow())?;
    }
    writeln!(out)?;
    writeln!(out, "{}", "🎒 Equipment".bright_cyan().bold())?;
    for item in &snapshot.equipment {
        writeln!(
            out,
            "  {} [{}] rupture {} (base {}, modif {}), {} g",
            item.name,
            item.category,
            item.rupture,
            item.base_rupture,
            item.modif_rupture,
            format_amount(item.weight)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{}", "📜 Competences".bright_cyan().bold())?;
    for competence in &snapshot.competences {
        let marker = if competence.is_system() { " (auto)" } else { "" };
        writeln!(out, "  {}{marker}", competence.name)?;
    }
    Ok(())
}

/// Load the sheet at `path` through the engine and print its derived values.
/// With `write_back`, the sheet is saved again with the competence rules applied.
pub fn audit_sheet(
    out: &mut dyn Write,
    loader: FileLoader,
    path: &Path,
    write_back: bool,
) -> Result<()> {
    let (dir, id) = split_sheet_path(path)?;
    let storage = DirStorage::new(dir);
    let sheet = storage
        .load_character(&id)?
        .with_context(|| format!("no sheet at {}", path.display()))?;
    let engine = SheetEngine::new(loader, storage)?;

    let snapshot = engine
        .load_snapshot(&id)?
        .with_context(|| format!("sheet {id} vanished while auditing"))?;
    writeln!(out, "{}", format!("📋 Sheet audit: {id}").bright_cyan().bold())?;
    writeln!(out, "{}", "================================".cyan())?;
    write_snapshot(out, &snapshot)?;

    writeln!(out)?;
    writeln!(out, "{}", "🛒 Catalogue".bright_cyan().bold())?;
    let catalog = &engine.reference().catalog;
    for (category, lines) in group_by_category(&sheet.catalogue, catalog) {
        writeln!(out, "  {category}")?;
        for line in lines {
            let name = catalog
                .get(line.ref_id)
                .map_or("?", |item| item.name.as_str());
            let excluded = if line.included { "" } else { " (excluded)" };
            writeln!(out, "    {} x{}{excluded}", name, line.quantity)?;
        }
    }
    writeln!(
        out,
        "Total: {} PO, {} g",
        format_amount(snapshot.catalogue_totals.total_price),
        format_amount(snapshot.catalogue_totals.total_weight)
    )?;

    if write_back {
        engine.save_character(&id, &sheet)?;
        log::info!("rewrote {} with competence rules applied", path.display());
    }
    Ok(())
}
