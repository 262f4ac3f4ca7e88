//! Computed comfort index: score, grade, component breakdown, rationale

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Letter grade derived from the comfort-index score. Higher score means
/// a more problematic unit, so `A` is best and `E` is worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    /// Default cutoffs: `< 20 → A, < 40 → B, < 60 → C, < 80 → D, else E`.
    pub const DEFAULT_CUTOFFS: [f64; 4] = [20.0, 40.0, 60.0, 80.0];

    /// Classify a [0,100] score against monotone non-decreasing cutoffs.
    ///
    /// A boundary value belongs to the higher (worse) grade: with default
    /// cutoffs a score of exactly 20.0 is `B`, not `A`. This is the only
    /// grade derivation in the crate; every call site goes through it so
    /// the boundary direction cannot drift between layers.
    pub fn classify(score: f64, cutoffs: &[f64; 4]) -> Self {
        if score < cutoffs[0] {
            Grade::A
        } else if score < cutoffs[1] {
            Grade::B
        } else if score < cutoffs[2] {
            Grade::C
        } else if score < cutoffs[3] {
            Grade::D
        } else {
            Grade::E
        }
    }

    /// Classify against [`Self::DEFAULT_CUTOFFS`].
    pub fn from_score(score: f64) -> Self {
        Self::classify(score, &Self::DEFAULT_CUTOFFS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
        }
    }
}

/// Group weights actually applied after dropping absent groups and
/// renormalizing. Absent groups carry 0.0; present-group weights sum to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightsUsed {
    pub human: f64,
    pub geo: f64,
    pub population: f64,
    pub extra: f64,
}

impl WeightsUsed {
    pub fn sum(&self) -> f64 {
        self.human + self.geo + self.population + self.extra
    }
}

/// Per-group breakdown behind a computed index.
///
/// Group scores are in [0,1] (`None` = the group had no data and was
/// dropped from the weighted sum). Every entry of a normalized feature
/// map is clamped to [0,1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexComponents {
    pub human_score: Option<f64>,
    pub geo_score: Option<f64>,
    pub population_score: Option<f64>,
    pub extra_score: Option<f64>,
    pub human_normalized: BTreeMap<String, f64>,
    pub geo_normalized: BTreeMap<String, f64>,
    pub population_normalized: BTreeMap<String, f64>,
    pub extra_normalized: BTreeMap<String, f64>,
    pub weights: WeightsUsed,
}

/// One explainability driver: a signal name and its rounded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDriver {
    pub signal: String,
    pub value: f64,
}

/// Baseline the human group was compared against, echoed for transparency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineReference {
    pub period: String,
    pub citywide_total: f64,
    pub growth_rate: f64,
}

/// Machine-generated rationale for a computed index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explain {
    pub why_summary: String,
    pub key_drivers: Vec<KeyDriver>,
    pub baseline_reference: Option<BaselineReference>,
}

/// Engine output for one (unit, date).
///
/// Created fresh on every invocation and never mutated; replacing a prior
/// computation for the same key is the caller's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedIndex {
    pub unit_id: String,
    pub date: NaiveDate,
    /// Composite score, [0,100], rounded to 2 decimals
    pub score: f64,
    pub grade: Grade,
    pub components: IndexComponents,
    pub explain: Explain,
}
