//! Reactive competence rules.
//!
//! Some skills grant other skills. The rule engine keeps those derived
//! entries in sync with the character's list and tags each one with the rule
//! that owns it. Entries a player typed in are never touched; entries a rule
//! owns are never editable by the player.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::constants::{
    LEGACY_SYSTEM_TAGS, LOG_TARGET_COMPETENCES, MAX_RULE_PASSES, SYSTEM_ID_SEED,
    SYSTEM_SOURCE_PREFIX,
};
use crate::data::{GameRules, ReferenceCompetence, find_reference};
use crate::numbers::next_sequential_id;
use crate::sheet::Identity;

/// Who owns a competence entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Provenance {
    /// Entered by the player.
    #[default]
    User,
    /// Maintained by the rule with this id.
    System(String),
    /// Tagged by something this engine does not know. The tag is written
    /// back as read and the entry stays editable by the player.
    Foreign(String),
}

impl Provenance {
    /// Untagged player entry.
    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self, Self::User)
    }

    /// Owned by a competence rule.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }

    #[must_use]
    pub fn is_owned_by(&self, rule_id: &str) -> bool {
        matches!(self, Self::System(owner) if owner == rule_id)
    }
}

impl From<Option<String>> for Provenance {
    fn from(source: Option<String>) -> Self {
        let Some(tag) = source else {
            return Self::User;
        };
        if let Some(rule) = tag.strip_prefix(SYSTEM_SOURCE_PREFIX) {
            return Self::System(rule.to_string());
        }
        if LEGACY_SYSTEM_TAGS.contains(&tag.as_str()) {
            return Self::System(tag);
        }
        Self::Foreign(tag)
    }
}

impl From<Provenance> for Option<String> {
    fn from(provenance: Provenance) -> Self {
        match provenance {
            Provenance::User => None,
            Provenance::System(rule) => Some(format!("{SYSTEM_SOURCE_PREFIX}{rule}")),
            Provenance::Foreign(tag) => Some(tag),
        }
    }
}

/// A skill on the character sheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Competence {
    #[serde(default, deserialize_with = "crate::numbers::null_as_default")]
    pub id: String,
    #[serde(rename = "nom", default, deserialize_with = "crate::numbers::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "crate::numbers::null_as_default")]
    pub description: String,
    #[serde(rename = "tableau", default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Value>,
    #[serde(rename = "source", default, skip_serializing_if = "Provenance::is_user")]
    pub provenance: Provenance,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Competence {
    #[must_use]
    pub const fn is_system(&self) -> bool {
        self.provenance.is_system()
    }
}

/// Read-only view of the character the rules may consult.
#[derive(Debug, Clone, Copy)]
pub struct CharacterContext<'a> {
    pub identity: Option<&'a Identity>,
    pub rules: &'a GameRules,
}

impl<'a> CharacterContext<'a> {
    #[must_use]
    pub const fn new(identity: Option<&'a Identity>, rules: &'a GameRules) -> Self {
        Self { identity, rules }
    }
}

/// A rule maintaining the entries tagged with its own id.
pub trait CompetenceRule {
    fn id(&self) -> &str;

    /// Bring `skills` to the rule's fixed point. Must only add or remove
    /// entries owned by this rule.
    fn apply(
        &self,
        skills: Vec<Competence>,
        ctx: &CharacterContext<'_>,
        reference: &[ReferenceCompetence],
    ) -> Vec<Competence>;
}

/// A trigger skill grants a base tier, or the upgraded tier when the base is
/// already held through another source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierGrantRule {
    pub id: &'static str,
    pub triggers: &'static [&'static str],
    pub base_tier: &'static str,
    pub upgraded_tier: &'static str,
}

impl TierGrantRule {
    /// "Les yeux révolver": Terrifiant I, or Terrifiant II on top of a native Terrifiant I.
    pub const LES_YEUX: Self = Self {
        id: "les_yeux",
        triggers: &["Les yeux révolver", "Les yeux révolvers"],
        base_tier: "Terrifiant I",
        upgraded_tier: "Terrifiant II",
    };

    fn owns(&self, skill: &Competence) -> bool {
        skill.provenance.is_owned_by(self.id)
    }

    fn triggered(&self, skills: &[Competence]) -> bool {
        skills
            .iter()
            .any(|skill| self.triggers.contains(&skill.name.as_str()))
    }

    /// Base tier held through origin, job, or any entry this rule does not own.
    fn base_held_elsewhere(&self, skills: &[Competence], ctx: &CharacterContext<'_>) -> bool {
        let from_identity = ctx.identity.is_some_and(|identity| {
            ctx.rules.origin_grants(&identity.origine, self.base_tier)
                || ctx.rules.job_mandates(&identity.metier, self.base_tier)
        });
        from_identity
            || skills
                .iter()
                .any(|skill| skill.name == self.base_tier && !self.owns(skill))
    }

    fn system_entry(&self, name: &str, reference: &[ReferenceCompetence]) -> Competence {
        let found = find_reference(reference, name);
        Competence {
            id: system_competence_id(self.id, name),
            name: name.to_string(),
            description: found.map(|r| r.description.clone()).unwrap_or_default(),
            table: found.and_then(|r| r.tableau.clone()),
            provenance: Provenance::System(self.id.to_string()),
            extra: Map::new(),
        }
    }

    /// Keep at most one owned copy of `tier`, or none when another source has it.
    fn ensure_single(
        &self,
        mut skills: Vec<Competence>,
        tier: &str,
        reference: &[ReferenceCompetence],
    ) -> Vec<Competence> {
        let held_elsewhere = skills
            .iter()
            .any(|skill| skill.name == tier && !self.owns(skill));
        let mut kept_own = held_elsewhere;
        let before = skills.len();
        skills.retain(|skill| {
            if skill.name != tier || !self.owns(skill) {
                return true;
            }
            !std::mem::replace(&mut kept_own, true)
        });
        if skills.len() != before {
            log::debug!(
                target: LOG_TARGET_COMPETENCES,
                "rule {} dropped {} redundant {tier}",
                self.id,
                before - skills.len()
            );
        }
        if !kept_own {
            log::debug!(target: LOG_TARGET_COMPETENCES, "rule {} grants {tier}", self.id);
            skills.push(self.system_entry(tier, reference));
        }
        skills
    }

    fn remove_owned(&self, mut skills: Vec<Competence>, tier: Option<&str>) -> Vec<Competence> {
        let before = skills.len();
        skills.retain(|skill| !(self.owns(skill) && tier.is_none_or(|t| skill.name == t)));
        if skills.len() != before {
            log::debug!(
                target: LOG_TARGET_COMPETENCES,
                "rule {} retracted {} owned entries",
                self.id,
                before - skills.len()
            );
        }
        skills
    }
}

impl CompetenceRule for TierGrantRule {
    fn id(&self) -> &str {
        self.id
    }

    fn apply(
        &self,
        skills: Vec<Competence>,
        ctx: &CharacterContext<'_>,
        reference: &[ReferenceCompetence],
    ) -> Vec<Competence> {
        if !self.triggered(&skills) {
            return self.remove_owned(skills, None);
        }
        let (target, stale) = if self.base_held_elsewhere(&skills, ctx) {
            (self.upgraded_tier, self.base_tier)
        } else {
            (self.base_tier, self.upgraded_tier)
        };
        let skills = self.remove_owned(skills, Some(stale));
        self.ensure_single(skills, target, reference)
    }
}

/// Rules shipped with the engine, in application order.
pub static DEFAULT_RULES: [TierGrantRule; 1] = [TierGrantRule::LES_YEUX];

/// Deterministic id for a rule-owned entry, so recomputation is stable.
#[must_use]
pub fn system_competence_id(rule_id: &str, name: &str) -> String {
    let mut hasher = XxHash64::with_seed(SYSTEM_ID_SEED);
    hasher.write(rule_id.as_bytes());
    hasher.write(&[0]);
    hasher.write(name.as_bytes());
    format!("sys-{rule_id}-{:016x}", hasher.finish())
}

/// Apply the shipped rules. Without an identity the list is returned as is.
#[must_use]
pub fn apply_rules(
    skills: Vec<Competence>,
    ctx: &CharacterContext<'_>,
    reference: &[ReferenceCompetence],
) -> Vec<Competence> {
    let rules: Vec<&dyn CompetenceRule> = DEFAULT_RULES
        .iter()
        .map(|rule| rule as &dyn CompetenceRule)
        .collect();
    apply_rules_with(&rules, skills, ctx, reference)
}

/// Apply an explicit rule set in order, repeating the whole set until a pass
/// changes nothing. A grant from a later rule can trigger an earlier one.
#[must_use]
pub fn apply_rules_with(
    rules: &[&dyn CompetenceRule],
    skills: Vec<Competence>,
    ctx: &CharacterContext<'_>,
    reference: &[ReferenceCompetence],
) -> Vec<Competence> {
    if ctx.identity.is_none() {
        return skills;
    }
    let mut current = skills;
    for _ in 0..MAX_RULE_PASSES {
        let next = rules
            .iter()
            .fold(current.clone(), |skills, rule| rule.apply(skills, ctx, reference));
        if next == current {
            return next;
        }
        current = next;
    }
    log::warn!(
        target: LOG_TARGET_COMPETENCES,
        "competence rules still changing after {MAX_RULE_PASSES} passes"
    );
    current
}

/// Rejected edit of the competence list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompetenceEditError {
    #[error("competence {id} is granted by rule {rule} and cannot be edited by hand")]
    SystemManaged { id: String, rule: String },
    #[error("no competence with id {0}")]
    UnknownId(String),
}

fn user_entry_index(skills: &[Competence], id: &str) -> Result<usize, CompetenceEditError> {
    let index = skills
        .iter()
        .position(|skill| skill.id == id)
        .ok_or_else(|| CompetenceEditError::UnknownId(id.to_string()))?;
    match &skills[index].provenance {
        Provenance::User | Provenance::Foreign(_) => Ok(index),
        Provenance::System(rule) => Err(CompetenceEditError::SystemManaged {
            id: id.to_string(),
            rule: rule.clone(),
        }),
    }
}

/// Append an empty player-owned row.
#[must_use]
pub fn add_user_competence(skills: &[Competence], name: &str) -> Vec<Competence> {
    let id = next_sequential_id("comp", skills.iter().map(|skill| skill.id.as_str()));
    let mut next = skills.to_vec();
    next.push(Competence {
        id,
        name: name.to_string(),
        ..Competence::default()
    });
    next
}

/// Remove a player-owned row.
///
/// # Errors
///
/// Fails for unknown ids and for rule-owned entries.
pub fn remove_user_competence(
    skills: &[Competence],
    id: &str,
) -> Result<Vec<Competence>, CompetenceEditError> {
    let index = user_entry_index(skills, id)?;
    let mut next = skills.to_vec();
    next.remove(index);
    Ok(next)
}

/// Fill a player row from the reference list. Unknown names keep the typed
/// name and clear the reference text.
///
/// # Errors
///
/// Fails for unknown ids and for rule-owned entries.
pub fn select_reference(
    skills: &[Competence],
    id: &str,
    name: &str,
    reference: &[ReferenceCompetence],
) -> Result<Vec<Competence>, CompetenceEditError> {
    let index = user_entry_index(skills, id)?;
    let found = find_reference(reference, name);
    let mut next = skills.to_vec();
    let row = &mut next[index];
    row.name = name.to_string();
    row.description = found.map(|r| r.description.clone()).unwrap_or_default();
    row.table = found.and_then(|r| r.tableau.clone());
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OriginEntry;

    fn user(id: &str, name: &str) -> Competence {
        Competence {
            id: id.to_string(),
            name: name.to_string(),
            ..Competence::default()
        }
    }

    fn names(skills: &[Competence]) -> Vec<(&str, bool)> {
        skills
            .iter()
            .map(|s| (s.name.as_str(), s.is_system()))
            .collect()
    }

    fn reference() -> Vec<ReferenceCompetence> {
        vec![ReferenceCompetence {
            nom: "Terrifiant I".into(),
            description: "Fait fuir les faibles".into(),
            tableau: None,
        }]
    }

    #[test]
    fn provenance_reads_prefixed_and_legacy_tags() {
        assert_eq!(
            Provenance::from(Some("system:les_yeux".to_string())),
            Provenance::System("les_yeux".into())
        );
        assert_eq!(
            Provenance::from(Some("les_yeux".to_string())),
            Provenance::System("les_yeux".into())
        );
        assert_eq!(
            Provenance::from(Some("objet:anneau".to_string())),
            Provenance::Foreign("objet:anneau".into())
        );
        assert_eq!(Provenance::from(None), Provenance::User);
    }

    #[test]
    fn competence_json_uses_sheet_keys() {
        let parsed: Competence = serde_json::from_str(
            r#"{"id": "a", "nom": "Terrifiant I", "description": null, "source": "les_yeux"}"#,
        )
        .unwrap();
        assert!(parsed.is_system());
        let written = serde_json::to_value(&parsed).unwrap();
        assert_eq!(written["source"], "system:les_yeux");
        assert_eq!(written["nom"], "Terrifiant I");

        let plain = serde_json::to_value(user("b", "Radin")).unwrap();
        assert!(plain.get("source").is_none());
    }

    #[test]
    fn foreign_tags_and_unknown_keys_are_written_back() {
        let raw = serde_json::json!({
            "id": "c9",
            "nom": "Anneau de vision",
            "source": "objet:anneau",
            "niveau": 2
        });
        let parsed: Competence = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(parsed.provenance, Provenance::Foreign("objet:anneau".into()));
        assert!(!parsed.is_system());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), {
            let mut expected = raw;
            expected["description"] = "".into();
            expected
        });

        // Player-editable, and left alone by the rules.
        let skills = vec![parsed, user("c1", "Les yeux révolver")];
        assert_eq!(remove_user_competence(&skills, "c9").unwrap().len(), 1);
        let rules = GameRules::default();
        let identity = Identity::default();
        let ctx = CharacterContext::new(Some(&identity), &rules);
        let out = apply_rules(skills.clone(), &ctx, &[]);
        assert_eq!(out[0], skills[0]);
    }

    #[test]
    fn trigger_grants_base_tier() {
        let rules = GameRules::default();
        let identity = Identity::default();
        let ctx = CharacterContext::new(Some(&identity), &rules);
        let out = apply_rules(vec![user("1", "Les yeux révolver")], &ctx, &reference());
        assert_eq!(
            names(&out),
            [("Les yeux révolver", false), ("Terrifiant I", true)]
        );
        assert_eq!(out[1].description, "Fait fuir les faibles");
        assert_eq!(out[1].id, system_competence_id("les_yeux", "Terrifiant I"));
    }

    #[test]
    fn native_base_tier_upgrades_the_grant() {
        let rules = GameRules {
            origines: vec![OriginEntry {
                name_m: "Ogre".into(),
                name_f: "Ogresse".into(),
                competences: vec!["Terrifiant I".into()],
            }],
            metiers: Vec::new(),
        };
        let identity = Identity {
            origine: "Ogresse".into(),
            ..Identity::default()
        };
        let ctx = CharacterContext::new(Some(&identity), &rules);
        let out = apply_rules(vec![user("1", "Les yeux révolvers")], &ctx, &[]);
        assert_eq!(
            names(&out),
            [("Les yeux révolvers", false), ("Terrifiant II", true)]
        );
        assert_eq!(out[1].description, "");
    }

    #[test]
    fn upgraded_tier_held_by_player_is_not_duplicated() {
        let rules = GameRules::default();
        let identity = Identity::default();
        let ctx = CharacterContext::new(Some(&identity), &rules);
        let skills = vec![
            user("1", "Les yeux révolver"),
            user("2", "Terrifiant I"),
            user("3", "Terrifiant II"),
        ];
        let out = apply_rules(skills.clone(), &ctx, &[]);
        assert_eq!(out, skills);
    }

    #[test]
    fn losing_the_trigger_retracts_grants() {
        let rules = GameRules::default();
        let identity = Identity::default();
        let ctx = CharacterContext::new(Some(&identity), &rules);
        let granted = apply_rules(vec![user("1", "Les yeux révolver")], &ctx, &[]);
        let without_trigger: Vec<_> = granted.into_iter().skip(1).collect();
        assert!(apply_rules(without_trigger, &ctx, &[]).is_empty());
    }

    #[test]
    fn missing_identity_leaves_list_alone() {
        let rules = GameRules::default();
        let ctx = CharacterContext::new(None, &rules);
        let skills = vec![user("1", "Les yeux révolver")];
        assert_eq!(apply_rules(skills.clone(), &ctx, &[]), skills);
    }

    #[test]
    fn player_cannot_remove_system_entries() {
        let rules = GameRules::default();
        let identity = Identity::default();
        let ctx = CharacterContext::new(Some(&identity), &rules);
        let skills = apply_rules(vec![user("comp-1", "Les yeux révolver")], &ctx, &[]);
        let system_id = skills[1].id.clone();
        assert!(matches!(
            remove_user_competence(&skills, &system_id),
            Err(CompetenceEditError::SystemManaged { rule, .. }) if rule == "les_yeux"
        ));
        assert_eq!(
            remove_user_competence(&skills, "nope"),
            Err(CompetenceEditError::UnknownId("nope".into()))
        );
        let trimmed = remove_user_competence(&skills, "comp-1").unwrap();
        assert_eq!(trimmed.len(), 1);
    }

    #[test]
    fn user_rows_are_added_and_filled_from_reference() {
        let skills = add_user_competence(&[user("comp-3", "Radin")], "");
        assert_eq!(skills[1].id, "comp-4");
        let filled = select_reference(&skills, "comp-4", "Terrifiant I", &reference()).unwrap();
        assert_eq!(filled[1].name, "Terrifiant I");
        assert_eq!(filled[1].description, "Fait fuir les faibles");
        assert!(!filled[1].is_system());
    }
}
