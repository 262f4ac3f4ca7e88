//! Composite comfort-index scorer
//!
//! Combines up to four signal groups (human complaints, geographic
//! vulnerability, population movement, and a reserved extension group)
//! into one bounded [0,100] score with letter grade and rationale.
//! Groups without data drop out of the weighted sum and the remaining
//! weights renormalize so they still sum to 1; only when every group is
//! absent does the whole computation yield `None`.

mod explain;
mod geo;
mod human;
mod population;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::{EngineConfig, GroupWeights};
use crate::types::{
    BaselineMetric, ComputedIndex, GeoAttributes, Grade, IndexComponents, PopulationRecord,
    SignalRecord, WeightsUsed,
};

pub(crate) use human::{CategoryTotals, HumanScore};
pub(crate) use population::PopulationScore;

/// Round a caller-facing number to 2 decimals.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compose a comfort index from already-fetched window data.
///
/// Pure: identical inputs yield bit-identical output. Returns `None`
/// when no signal group has any data (insufficient data, not an error).
#[allow(clippy::too_many_arguments)]
pub fn compute_index(
    config: &EngineConfig,
    unit_id: &str,
    date: NaiveDate,
    window_weeks: u32,
    enable_extra: bool,
    signals: &[SignalRecord],
    geo_attributes: Option<&GeoAttributes>,
    population: &[PopulationRecord],
    baseline: Option<&BaselineMetric>,
) -> Option<ComputedIndex> {
    let window_days = f64::from(window_weeks * 7);

    let human = human::evaluate(&config.human, signals, window_days, baseline);
    let geo = geo_attributes.map(|attributes| geo::evaluate(&config.geo, attributes));
    let population_score = population::evaluate(&config.population, population);

    // Reserved extension point: no data source exists for the extra
    // group, so it never contributes even when enabled.
    let extra_score: Option<f64> = None;

    let composite = compose(
        &config.weights,
        enable_extra,
        human.as_ref().map(|h| h.score),
        geo.as_ref().map(|g| g.score),
        population_score.as_ref().map(|p| p.score),
        extra_score,
    )?;

    let score = round2((composite.score * 100.0).clamp(0.0, 100.0));
    let grade = Grade::classify(score, &config.grade_cutoffs);

    let explain = explain::build(
        &config.explain,
        window_weeks,
        human.as_ref(),
        geo_attributes,
        population_score.as_ref(),
        baseline,
    );

    debug!(
        unit_id,
        %date,
        score,
        grade = grade.as_str(),
        weight_sum = composite.weights.sum(),
        "composed comfort index"
    );

    Some(ComputedIndex {
        unit_id: unit_id.to_string(),
        date,
        score,
        grade,
        components: IndexComponents {
            human_score: human.as_ref().map(|h| h.score),
            geo_score: geo.as_ref().map(|g| g.score),
            population_score: population_score.as_ref().map(|p| p.score),
            extra_score,
            human_normalized: human.map(|h| h.normalized).unwrap_or_default(),
            geo_normalized: geo.map(|g| g.normalized).unwrap_or_default(),
            population_normalized: population_score.map(|p| p.normalized).unwrap_or_default(),
            extra_normalized: BTreeMap::new(),
            weights: composite.weights,
        },
        explain,
    })
}

struct Composite {
    score: f64,
    weights: WeightsUsed,
}

/// Weighted combination over present groups with dynamic renormalization.
///
/// With `enable_extra = false` the extra group's base weight drops and
/// the other base weights rescale first, so the configured extra weight
/// never leaks into a deployment that has not opted in. Then any group
/// without a score drops out and the surviving weights renormalize to
/// sum 1.
fn compose(
    weights: &GroupWeights,
    enable_extra: bool,
    human: Option<f64>,
    geo: Option<f64>,
    population: Option<f64>,
    extra: Option<f64>,
) -> Option<Composite> {
    let mut base = *weights;
    if !enable_extra {
        base.extra = 0.0;
        let total = base.human + base.geo + base.population;
        if total > 0.0 {
            base.human /= total;
            base.geo /= total;
            base.population /= total;
        }
    }
    let extra = if enable_extra { extra } else { None };

    enum Slot {
        Human,
        Geo,
        Population,
        Extra,
    }
    let mut present: Vec<(Slot, f64, f64)> = Vec::with_capacity(4);
    if let Some(score) = human {
        present.push((Slot::Human, score, base.human));
    }
    if let Some(score) = geo {
        present.push((Slot::Geo, score, base.geo));
    }
    if let Some(score) = population {
        present.push((Slot::Population, score, base.population));
    }
    if let Some(score) = extra {
        present.push((Slot::Extra, score, base.extra));
    }
    if present.is_empty() {
        return None;
    }

    let total: f64 = present.iter().map(|(_, _, weight)| weight).sum();
    let mut used = WeightsUsed::default();
    let mut score = 0.0;
    for (slot, group_score, weight) in present {
        let renormalized = if total > 0.0 { weight / total } else { weight };
        score += group_score * renormalized;
        match slot {
            Slot::Human => used.human = renormalized,
            Slot::Geo => used.geo = renormalized,
            Slot::Population => used.population = renormalized,
            Slot::Extra => used.extra = renormalized,
        }
    }
    Some(Composite {
        score,
        weights: used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> GroupWeights {
        GroupWeights {
            human: 0.5,
            geo: 0.3,
            population: 0.2,
            extra: 0.0,
        }
    }

    #[test]
    fn all_groups_present_uses_base_weights() {
        let composite = compose(&weights(), false, Some(0.8), Some(0.5), Some(0.2), None)
            .expect("three groups present");
        assert!((composite.weights.sum() - 1.0).abs() < 1e-9);
        assert!((composite.score - (0.8 * 0.5 + 0.5 * 0.3 + 0.2 * 0.2)).abs() < 1e-9);
    }

    #[test]
    fn missing_group_renormalizes_remaining_weights() {
        let composite =
            compose(&weights(), false, Some(0.8), None, Some(0.2), None).expect("two groups");
        assert_eq!(composite.weights.geo, 0.0);
        assert!((composite.weights.sum() - 1.0).abs() < 1e-9);
        // human 0.5 and population 0.2 rescale to 5/7 and 2/7
        assert!((composite.weights.human - 5.0 / 7.0).abs() < 1e-9);
        assert!((composite.weights.population - 2.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn single_group_carries_full_weight() {
        let composite = compose(&weights(), false, None, Some(0.4), None, None).expect("one group");
        assert!((composite.weights.geo - 1.0).abs() < 1e-9);
        assert!((composite.score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn all_groups_absent_yields_none() {
        assert!(compose(&weights(), false, None, None, None, None).is_none());
        assert!(compose(&weights(), true, None, None, None, None).is_none());
    }

    #[test]
    fn configured_extra_weight_stays_dormant_when_disabled() {
        let with_extra = GroupWeights {
            human: 0.45,
            geo: 0.25,
            population: 0.2,
            extra: 0.1,
        };
        let composite = compose(&with_extra, false, Some(1.0), Some(1.0), Some(1.0), None)
            .expect("three groups present");
        assert!((composite.weights.sum() - 1.0).abs() < 1e-9);
        assert_eq!(composite.weights.extra, 0.0);
        assert!((composite.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(12.346), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(100.0), 100.0);
    }
}
