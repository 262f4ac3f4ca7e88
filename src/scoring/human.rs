//! Human/complaint group scoring
//!
//! Aggregates the window's complaint signals into normalized sub-features
//! and a weighted group score. The two baseline-relative sub-features
//! (citywide ratio, excess growth) need a published `BaselineMetric`;
//! without one they contribute 0 and the remaining sub-weights apply
//! unchanged. Baseline absence degrades the score; it never invalidates
//! the group.

use std::collections::BTreeMap;

use crate::config::HumanScoringConfig;
use crate::stats;
use crate::types::{BaselineMetric, SignalRecord, SignalType};

/// Raw per-category complaint totals over the window.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CategoryTotals {
    pub total: f64,
    pub odor: f64,
    pub trash: f64,
    pub illegal_dumping: f64,
}

/// Human-group score plus the raw aggregates the rationale builder needs.
#[derive(Debug, Clone)]
pub(crate) struct HumanScore {
    /// Weighted group score, [0,1]
    pub score: f64,
    /// Normalized sub-features, each clamped to [0,1]
    pub normalized: BTreeMap<String, f64>,
    pub totals: CategoryTotals,
    pub night_avg: f64,
    pub repeat_avg: f64,
    /// Unit daily average over citywide average-per-unit, capped.
    /// `None` when no baseline was available (or its average was 0).
    pub relative_ratio: Option<f64>,
    /// Unit window growth minus citywide growth, floored at 0.
    /// `None` when no baseline was available.
    pub excess_growth: Option<f64>,
}

pub(crate) fn evaluate(
    config: &HumanScoringConfig,
    signals: &[SignalRecord],
    window_days: f64,
    baseline: Option<&BaselineMetric>,
) -> Option<HumanScore> {
    if signals.is_empty() {
        return None;
    }

    let mut totals = CategoryTotals::default();
    let mut total_series: Vec<f64> = Vec::new();
    let mut night_values: Vec<f64> = Vec::new();
    let mut repeat_values: Vec<f64> = Vec::new();
    for record in signals {
        match record.signal_type {
            SignalType::Total => {
                totals.total += record.value;
                total_series.push(record.value);
            }
            SignalType::Odor => totals.odor += record.value,
            SignalType::Trash => totals.trash += record.value,
            SignalType::IllegalDumping => totals.illegal_dumping += record.value,
            SignalType::NightRatio => night_values.push(record.value),
            SignalType::RepeatRatio => repeat_values.push(record.value),
            SignalType::Other => {}
        }
    }

    let night_avg = stats::mean(&night_values);
    let repeat_avg = stats::mean(&repeat_values);
    let growth_rate = window_growth(&total_series);
    let daily_avg = totals.total / window_days;

    let mut relative_ratio = None;
    let mut excess_growth = None;
    if let Some(metric) = baseline {
        if metric.citywide_avg_per_unit > 0.0 {
            relative_ratio =
                Some((daily_avg / metric.citywide_avg_per_unit).min(config.baseline_ratio_cap));
        }
        excess_growth = Some((growth_rate - metric.growth_rate).max(0.0));
    }

    let volume = (daily_avg / config.volume_daily_cap).clamp(0.0, 1.0);
    let odor_ratio = share(totals.odor, totals.total);
    let trash_ratio = share(totals.trash, totals.total);
    let illegal_ratio = share(totals.illegal_dumping, totals.total);
    let night_norm = night_avg.clamp(0.0, 1.0);
    let repeat_norm = repeat_avg.clamp(0.0, 1.0);
    let growth_norm = (growth_rate.max(0.0) / config.growth_rate_scale).clamp(0.0, 1.0);
    let relative_norm =
        relative_ratio.map_or(0.0, |r| (r / config.baseline_ratio_cap).clamp(0.0, 1.0));
    let excess_norm =
        excess_growth.map_or(0.0, |e| (e / config.excess_growth_saturation).clamp(0.0, 1.0));

    let score = (volume * config.volume_weight
        + relative_norm * config.relative_baseline_weight
        + excess_norm * config.excess_growth_weight
        + odor_ratio * config.odor_weight
        + trash_ratio * config.trash_weight
        + illegal_ratio * config.illegal_dump_weight
        + night_norm * config.night_weight)
        .clamp(0.0, 1.0);

    let mut normalized = BTreeMap::new();
    normalized.insert("total_complaints".to_string(), volume);
    normalized.insert("relative_to_baseline".to_string(), relative_norm);
    normalized.insert("excess_growth_rate".to_string(), excess_norm);
    normalized.insert("odor_ratio".to_string(), odor_ratio);
    normalized.insert("trash_ratio".to_string(), trash_ratio);
    normalized.insert("illegal_dump_ratio".to_string(), illegal_ratio);
    normalized.insert("night_ratio".to_string(), night_norm);
    normalized.insert("repeat_ratio".to_string(), repeat_norm);
    normalized.insert("growth_rate".to_string(), growth_norm);

    Some(HumanScore {
        score,
        normalized,
        totals,
        night_avg,
        repeat_avg,
        relative_ratio,
        excess_growth,
    })
}

/// Relative growth of the second half of the window's total-complaint
/// series over the first half. Fewer than 2 records, or an empty first
/// half, yields 0.
fn window_growth(total_series: &[f64]) -> f64 {
    if total_series.len() < 2 {
        return 0.0;
    }
    let mid = total_series.len() / 2;
    let first: f64 = total_series[..mid].iter().sum();
    let second: f64 = total_series[mid..].iter().sum();
    if first > 0.0 {
        (second - first) / first
    } else {
        0.0
    }
}

fn share(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part / whole).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, signal_type: SignalType, value: f64) -> SignalRecord {
        SignalRecord {
            unit_id: "U-001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, day).expect("valid test date"),
            signal_type,
            value,
        }
    }

    fn baseline(avg_per_unit: f64, growth_rate: f64) -> BaselineMetric {
        BaselineMetric {
            period: "2024-05".to_string(),
            category: BaselineMetric::CATEGORY_OVERALL.to_string(),
            citywide_total: avg_per_unit * 37.0,
            citywide_avg_per_unit: avg_per_unit,
            growth_rate,
        }
    }

    #[test]
    fn no_signals_yields_none() {
        let config = HumanScoringConfig::default();
        assert!(evaluate(&config, &[], 28.0, None).is_none());
    }

    #[test]
    fn volume_saturates_at_daily_cap() {
        // 280 complaints over a 28-day window: daily average 10 = cap
        let config = HumanScoringConfig::default();
        let signals: Vec<SignalRecord> = (1..=28)
            .map(|day| record(day, SignalType::Total, 10.0))
            .collect();
        let score = evaluate(&config, &signals, 28.0, None).expect("group has data");
        assert_eq!(score.normalized["total_complaints"], 1.0);
    }

    #[test]
    fn missing_baseline_zeroes_baseline_features_without_renormalizing() {
        let config = HumanScoringConfig::default();
        let signals = vec![record(1, SignalType::Total, 280.0)];
        let score = evaluate(&config, &signals, 28.0, None).expect("group has data");
        assert!(score.relative_ratio.is_none());
        assert!(score.excess_growth.is_none());
        assert_eq!(score.normalized["relative_to_baseline"], 0.0);
        assert_eq!(score.normalized["excess_growth_rate"], 0.0);
        // Only the volume sub-weight contributes: 1.0 * 0.15
        assert!((score.score - config.volume_weight).abs() < 1e-9);
    }

    #[test]
    fn relative_ratio_caps_at_three() {
        let config = HumanScoringConfig::default();
        let signals = vec![record(1, SignalType::Total, 280.0)];
        // Unit daily average 10, citywide 1 -> raw ratio 10, capped at 3
        let metric = baseline(1.0, 0.0);
        let score = evaluate(&config, &signals, 28.0, Some(&metric)).expect("group has data");
        assert_eq!(score.relative_ratio, Some(3.0));
        assert_eq!(score.normalized["relative_to_baseline"], 1.0);
    }

    #[test]
    fn excess_growth_floors_at_zero_and_saturates() {
        let config = HumanScoringConfig::default();
        // First half 10, second half 20: unit growth 1.0
        let signals = vec![
            record(1, SignalType::Total, 10.0),
            record(15, SignalType::Total, 20.0),
        ];
        let rising = evaluate(&config, &signals, 28.0, Some(&baseline(100.0, 0.0)))
            .expect("group has data");
        assert_eq!(rising.excess_growth, Some(1.0));
        // 1.0 excess is far past the 0.3 saturation point
        assert_eq!(rising.normalized["excess_growth_rate"], 1.0);

        // Citywide growing faster than the unit: floored at 0
        let lagging = evaluate(&config, &signals, 28.0, Some(&baseline(100.0, 5.0)))
            .expect("group has data");
        assert_eq!(lagging.excess_growth, Some(0.0));
    }

    #[test]
    fn category_shares_are_fractions_of_total() {
        let config = HumanScoringConfig::default();
        let signals = vec![
            record(1, SignalType::Total, 100.0),
            record(1, SignalType::Odor, 30.0),
            record(1, SignalType::Trash, 20.0),
            record(1, SignalType::IllegalDumping, 10.0),
        ];
        let score = evaluate(&config, &signals, 28.0, None).expect("group has data");
        assert!((score.normalized["odor_ratio"] - 0.3).abs() < 1e-9);
        assert!((score.normalized["trash_ratio"] - 0.2).abs() < 1e-9);
        assert!((score.normalized["illegal_dump_ratio"] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn score_and_features_stay_in_unit_interval() {
        let config = HumanScoringConfig::default();
        let mut signals: Vec<SignalRecord> = (1..=28)
            .map(|day| record(day, SignalType::Total, 500.0))
            .collect();
        signals.push(record(1, SignalType::Odor, 14_000.0));
        signals.push(record(1, SignalType::NightRatio, 1.7));
        let metric = baseline(0.5, -2.0);
        let score = evaluate(&config, &signals, 28.0, Some(&metric)).expect("group has data");
        assert!((0.0..=1.0).contains(&score.score));
        assert!(score
            .normalized
            .values()
            .all(|v| (0.0..=1.0).contains(v)));
    }
}
