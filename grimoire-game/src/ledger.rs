//! Contribution ledger: ordered, labelled contributions reduced to a total.
//!
//! Every derived value on the sheet (protections, movement, magic, dodge)
//! is a [`StatDetail`] built here, so the breakdown shown to the player is
//! the exact computation that produced the number.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::constants::FLOOR_LABEL;

/// Inline storage sized for the usual handful of sources per stat.
pub type Components = SmallVec<[Contribution; 8]>;

/// A single signed, labelled input to a stat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contribution {
    pub label: String,
    pub value: i32,
}

impl Contribution {
    #[must_use]
    pub fn new(label: impl Into<String>, value: i32) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Auditable breakdown of a computed value.
///
/// `total == base + Σ components.value` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatDetail {
    /// Human-readable description of the computation; never evaluated.
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub base: i32,
    #[serde(default)]
    pub components: Components,
    pub total: i32,
}

impl StatDetail {
    /// Sum of all contributions, excluding the base.
    #[must_use]
    pub fn sum_components(&self) -> i32 {
        self.components
            .iter()
            .fold(0i32, |acc, c| acc.saturating_add(c.value))
    }

    /// Contributions worth showing in a tooltip (zero entries hidden).
    pub fn visible_components(&self) -> impl Iterator<Item = &Contribution> {
        self.components.iter().filter(|c| c.value != 0)
    }

    /// Raise the total to `min` through an explicit floor contribution.
    #[must_use]
    pub fn floor_at(mut self, min: i32) -> Self {
        if self.total < min {
            let lift = min.saturating_sub(self.total);
            self.components.push(Contribution::new(FLOOR_LABEL, lift));
            self.total = min;
        }
        self
    }

    /// Value displayed once the sheet's temporary ("Add.") column is applied.
    #[must_use]
    pub const fn total_with_temp(&self, temp: i32) -> i32 {
        self.total.saturating_add(temp)
    }
}

impl fmt::Display for StatDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.formula.is_empty() {
            writeln!(f, "{}", self.formula)?;
        }
        writeln!(f, "Base : {}", self.base)?;
        for component in self.visible_components() {
            let sign = if component.value > 0 { "+" } else { "" };
            writeln!(f, "{} : {sign}{}", component.label, component.value)?;
        }
        write!(f, "Total : {}", self.total)
    }
}

/// Combine a base value with ordered contributions.
#[must_use]
pub fn resolve<I>(base: i32, contributions: I) -> StatDetail
where
    I: IntoIterator<Item = Contribution>,
{
    resolve_with_formula(String::new(), base, contributions)
}

/// Same as [`resolve`], attaching a descriptive formula.
#[must_use]
pub fn resolve_with_formula<I>(formula: impl Into<String>, base: i32, contributions: I) -> StatDetail
where
    I: IntoIterator<Item = Contribution>,
{
    let components: Components = contributions.into_iter().collect();
    let total = components
        .iter()
        .fold(base, |acc, c| acc.saturating_add(c.value));
    StatDetail {
        formula: formula.into(),
        base,
        components,
        total,
    }
}

/// Incremental builder used by the sheet resolvers.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    formula: String,
    base: i32,
    components: Components,
}

impl Ledger {
    #[must_use]
    pub fn new(base: i32) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = formula.into();
        self
    }

    pub fn push(&mut self, label: impl Into<String>, value: i32) -> &mut Self {
        self.components.push(Contribution::new(label, value));
        self
    }

    /// Record a contribution only when it changes the total.
    pub fn push_nonzero(&mut self, label: impl Into<String>, value: i32) -> &mut Self {
        if value != 0 {
            self.push(label, value);
        }
        self
    }

    pub fn extend<I>(&mut self, contributions: I) -> &mut Self
    where
        I: IntoIterator<Item = Contribution>,
    {
        self.components.extend(contributions);
        self
    }

    #[must_use]
    pub fn finish(self) -> StatDetail {
        resolve_with_formula(self.formula, self.base, self.components)
    }
}
