use std::fs;
use std::path::{Path, PathBuf};

use grimoire_game::data::reference_competences_from_json;
use grimoire_game::{
    DataLoader, GameRules, RacialTable, ReferenceCatalog, ReferenceCompetence, ReferenceData,
    RulesDataError,
};
use thiserror::Error;

const BUNDLED_CATALOG: &str = include_str!("../../../assets/data/catalog.json");
const BUNDLED_RULES: &str = include_str!("../../../assets/data/rules.json");
const BUNDLED_COMPETENCES: &str = include_str!("../../../assets/data/competences.json");
const BUNDLED_RACIAL: &str = include_str!("../../../assets/data/racial.json");

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Data(#[from] RulesDataError),
}

/// Where each reference document comes from; `None` means the bundled copy.
#[derive(Debug, Clone, Default)]
pub struct AssetPaths {
    pub catalog: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub competences: Option<PathBuf>,
    pub racial: Option<PathBuf>,
}

/// Loads reference data from disk, falling back to the bundled fixtures.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    paths: AssetPaths,
}

impl FileLoader {
    pub const fn new(paths: AssetPaths) -> Self {
        Self { paths }
    }

    fn read(path: Option<&Path>, bundled: &'static str) -> Result<String, AssetError> {
        let Some(path) = path else {
            return Ok(bundled.to_string());
        };
        log::debug!("reading reference data from {}", path.display());
        fs::read_to_string(path).map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl DataLoader for FileLoader {
    type Error = AssetError;

    fn load_catalog(&self) -> Result<ReferenceCatalog, Self::Error> {
        let json = Self::read(self.paths.catalog.as_deref(), BUNDLED_CATALOG)?;
        Ok(ReferenceCatalog::from_json(&json)?)
    }

    fn load_game_rules(&self) -> Result<GameRules, Self::Error> {
        let json = Self::read(self.paths.rules.as_deref(), BUNDLED_RULES)?;
        Ok(GameRules::from_json(&json)?)
    }

    fn load_reference_competences(&self) -> Result<Vec<ReferenceCompetence>, Self::Error> {
        let json = Self::read(self.paths.competences.as_deref(), BUNDLED_COMPETENCES)?;
        Ok(reference_competences_from_json(&json)?)
    }

    fn load_racial_table(&self) -> Result<RacialTable, Self::Error> {
        let json = Self::read(self.paths.racial.as_deref(), BUNDLED_RACIAL)?;
        Ok(RacialTable::from_json(&json)?)
    }
}

/// Reference data shared by every scenario run.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    pub reference: ReferenceData,
}

impl TesterAssets {
    /// Bundled fixtures only. These are compiled in, so a failure is a
    /// broken build and falls back to empty data with a warning.
    pub fn load_default() -> Self {
        Self::load(&FileLoader::default()).unwrap_or_else(|err| {
            log::warn!("bundled reference data unusable: {err}");
            Self {
                reference: ReferenceData::default(),
            }
        })
    }

    pub fn load(loader: &FileLoader) -> Result<Self, AssetError> {
        Ok(Self {
            reference: ReferenceData::load(loader)?,
        })
    }
}
