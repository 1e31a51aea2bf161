//! Reference documents consumed by the rules engine.
//!
//! These are the shapes the persistence collaborator hands over: the game
//! rules (origins and jobs with the skills they grant) and the reference
//! competence list. Validation failures surface as [`RulesDataError`].
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::numbers::null_as_default;

/// Failure while reading reference data. Sheet resolution itself never fails.
#[derive(Debug, Error)]
pub enum RulesDataError {
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown origin archetype key {0:?}")]
    UnknownArchetype(String),
    #[error("rarity multiplier must be one of 0.5, 1, 1.5, 2 (got {0})")]
    InvalidRarity(f64),
}

impl RulesDataError {
    pub(crate) const fn parse(what: &'static str, source: serde_json::Error) -> Self {
        Self::Parse { what, source }
    }
}

/// A playable origin and the skills it grants natively.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OriginEntry {
    #[serde(default)]
    pub name_m: String,
    #[serde(default)]
    pub name_f: String,
    #[serde(default, alias = "Competences", deserialize_with = "null_as_default")]
    pub competences: Vec<String>,
}

/// A job and the skills every holder must take.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobEntry {
    #[serde(default)]
    pub name_m: String,
    #[serde(default)]
    pub name_f: String,
    #[serde(
        default,
        alias = "Competences_obligatoires",
        deserialize_with = "null_as_default"
    )]
    pub competences_obligatoires: Vec<String>,
}

fn names_match(name_m: &str, name_f: &str, wanted: &str) -> bool {
    !wanted.is_empty() && (name_m == wanted || name_f == wanted)
}

/// Origins and jobs, as published by the rules owner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameRules {
    #[serde(default, deserialize_with = "null_as_default")]
    pub origines: Vec<OriginEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metiers: Vec<JobEntry>,
}

impl GameRules {
    /// Parse the rules document.
    ///
    /// # Errors
    ///
    /// Returns [`RulesDataError::Parse`] when the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, RulesDataError> {
        serde_json::from_str(json).map_err(|err| RulesDataError::parse("game rules", err))
    }

    /// Origin entry matching either the masculine or feminine name.
    #[must_use]
    pub fn origin(&self, name: &str) -> Option<&OriginEntry> {
        self.origines
            .iter()
            .find(|entry| names_match(&entry.name_m, &entry.name_f, name))
    }

    #[must_use]
    pub fn job(&self, name: &str) -> Option<&JobEntry> {
        self.metiers
            .iter()
            .find(|entry| names_match(&entry.name_m, &entry.name_f, name))
    }

    /// Whether the origin grants `skill` natively.
    #[must_use]
    pub fn origin_grants(&self, origin: &str, skill: &str) -> bool {
        self.origin(origin)
            .is_some_and(|entry| entry.competences.iter().any(|c| c == skill))
    }

    /// Whether the job mandates `skill`.
    #[must_use]
    pub fn job_mandates(&self, job: &str, skill: &str) -> bool {
        self.job(job).is_some_and(|entry| {
            entry
                .competences_obligatoires
                .iter()
                .any(|c| c == skill)
        })
    }
}

/// Entry of the reference competence list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceCompetence {
    pub nom: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Opaque structured table shown under the description.
    #[serde(default)]
    pub tableau: Option<Value>,
}

/// Parse the reference competence list.
///
/// # Errors
///
/// Returns [`RulesDataError::Parse`] when the JSON is malformed.
pub fn reference_competences_from_json(
    json: &str,
) -> Result<Vec<ReferenceCompetence>, RulesDataError> {
    serde_json::from_str(json).map_err(|err| RulesDataError::parse("reference competences", err))
}

/// Find a reference competence by exact name.
#[must_use]
pub fn find_reference<'a>(
    reference: &'a [ReferenceCompetence],
    name: &str,
) -> Option<&'a ReferenceCompetence> {
    reference.iter().find(|entry| entry.nom == name)
}
