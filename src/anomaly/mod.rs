//! Z-score anomaly detection
//!
//! Compares a recent window of complaint and population behavior against
//! a longer, strictly preceding baseline window belonging to the same
//! unit. Four relative-change features combine into a composite score,
//! which is standardized against weekly aggregates of the baseline window
//! (z-score) and mapped into a [0,1] anomaly score centered at 0.5.
//!
//! The detector is total: absent signal history yields all-zero features,
//! a zero z-score, the neutral 0.5 anomaly score, and no flag; never an
//! error. Every division is guarded by an explicit zero rule documented
//! on the feature it belongs to.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::config::AnomalyConfig;
use crate::stats;
use crate::types::{
    AnomalyFeatures, AnomalyResult, AnomalyStats, PopulationRecord, SignalRecord, SignalType,
};

/// Evaluate one (unit, date) against already-fetched window data.
///
/// `recent_*` covers `[date - recent_weeks*7, date]`; `baseline_*` covers
/// the non-overlapping span ending exactly where the recent window
/// begins. Pure: identical inputs yield identical output.
pub fn detect(
    config: &AnomalyConfig,
    unit_id: &str,
    date: NaiveDate,
    recent_signals: &[SignalRecord],
    baseline_signals: &[SignalRecord],
    recent_population: &[PopulationRecord],
    baseline_population: &[PopulationRecord],
) -> AnomalyResult {
    let features = compute_features(
        recent_signals,
        baseline_signals,
        recent_population,
        baseline_population,
    );

    let composite = config.complaint_change_weight * features.complaint_change_4w
        + config.growth_rate_weight * features.complaint_growth_rate
        + config.night_ratio_weight * features.night_ratio_change.abs()
        + config.population_weight * features.population_change_rate.abs();

    let (rolling_mean, rolling_std) =
        baseline_statistics(config, baseline_signals, baseline_population);

    let z_score = (composite - rolling_mean) / rolling_std;
    let anomaly_score = (0.5 + z_score / config.z_score_divisor).clamp(0.0, 1.0);
    let anomaly_flag = anomaly_score > config.flag_score_threshold
        || z_score.abs() > config.flag_z_threshold;

    let explanation = anomaly_flag.then(|| describe(config, &features, z_score));

    debug!(
        unit_id,
        %date,
        z_score,
        anomaly_score,
        anomaly_flag,
        "anomaly evaluation"
    );

    AnomalyResult {
        unit_id: unit_id.to_string(),
        date,
        anomaly_score,
        anomaly_flag,
        features,
        stats: AnomalyStats {
            z_score,
            rolling_mean,
            rolling_std,
        },
        explanation,
    }
}

/// Relative change with the complaint zero rule: an empty baseline maps
/// to 1.0 when the recent side has volume (a unit going from silence to
/// complaints is maximal growth) and 0.0 when both sides are silent.
fn relative_change_or_unit(recent: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        (recent - baseline) / baseline
    } else if recent > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Relative change with the ratio/population zero rule: an empty baseline
/// yields 0 (no meaningful reference to move against).
fn relative_change_or_zero(recent: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        (recent - baseline) / baseline
    } else {
        0.0
    }
}

fn compute_features(
    recent_signals: &[SignalRecord],
    baseline_signals: &[SignalRecord],
    recent_population: &[PopulationRecord],
    baseline_population: &[PopulationRecord],
) -> AnomalyFeatures {
    let recent_totals: Vec<f64> = values_of(recent_signals, SignalType::Total);
    let baseline_totals: Vec<f64> = values_of(baseline_signals, SignalType::Total);

    let recent_sum: f64 = recent_totals.iter().sum();
    let baseline_sum: f64 = baseline_totals.iter().sum();
    let complaint_change_4w = relative_change_or_unit(recent_sum, baseline_sum);

    let recent_daily = stats::mean(&recent_totals);
    let baseline_daily = stats::mean(&baseline_totals);
    let complaint_growth_rate = relative_change_or_unit(recent_daily, baseline_daily);

    let recent_night = stats::mean(&values_of(recent_signals, SignalType::NightRatio));
    let baseline_night = stats::mean(&values_of(baseline_signals, SignalType::NightRatio));
    let night_ratio_change = relative_change_or_zero(recent_night, baseline_night);

    let recent_pop: f64 = recent_population.iter().map(|r| r.pop_total).sum();
    let baseline_pop: f64 = baseline_population.iter().map(|r| r.pop_total).sum();
    let population_change_rate = relative_change_or_zero(recent_pop, baseline_pop);

    AnomalyFeatures {
        complaint_change_4w,
        complaint_growth_rate,
        night_ratio_change,
        population_change_rate,
    }
}

fn values_of(signals: &[SignalRecord], signal_type: SignalType) -> Vec<f64> {
    signals
        .iter()
        .filter(|r| r.signal_type == signal_type)
        .map(|r| r.value)
        .collect()
}

/// Mean and std of simplified per-week composites over the baseline
/// window.
///
/// Buckets are ISO weeks. Per-week composite: weekly_human_weight times
/// the week's average daily complaints, plus weekly_population_weight
/// when the week has any population data. Degenerate cases: no buckets
/// leaves the mean at 0; fewer than 2 buckets defaults the variance to
/// 1.0; a zero std is replaced by 1.0 so the z-score division is always
/// defined.
fn baseline_statistics(
    config: &AnomalyConfig,
    baseline_signals: &[SignalRecord],
    baseline_population: &[PopulationRecord],
) -> (f64, f64) {
    #[derive(Default)]
    struct WeekBucket {
        complaint_values: Vec<f64>,
        population_days: usize,
    }

    let mut buckets: BTreeMap<(i32, u32), WeekBucket> = BTreeMap::new();
    for record in baseline_signals
        .iter()
        .filter(|r| r.signal_type == SignalType::Total)
    {
        let week = record.date.iso_week();
        buckets
            .entry((week.year(), week.week()))
            .or_default()
            .complaint_values
            .push(record.value);
    }
    for record in baseline_population {
        let week = record.date.iso_week();
        buckets
            .entry((week.year(), week.week()))
            .or_default()
            .population_days += 1;
    }

    let weekly_scores: Vec<f64> = buckets
        .values()
        .map(|bucket| {
            let human_avg = stats::mean(&bucket.complaint_values);
            let population_term = if bucket.population_days > 0 {
                config.weekly_population_weight
            } else {
                0.0
            };
            config.weekly_human_weight * human_avg + population_term
        })
        .collect();

    let rolling_mean = stats::mean(&weekly_scores);
    let rolling_std = if weekly_scores.len() < 2 {
        1.0
    } else {
        let std = stats::sample_std_dev(&weekly_scores);
        if std > 0.0 {
            std
        } else {
            1.0
        }
    };
    (rolling_mean, rolling_std)
}

/// One sentence naming each exceeded feature threshold.
fn describe(config: &AnomalyConfig, features: &AnomalyFeatures, z_score: f64) -> String {
    let mut parts: Vec<String> = Vec::new();
    if features.complaint_change_4w > config.explain_complaint_change {
        parts.push(format!(
            "complaints up {:.0}% over the recent window",
            features.complaint_change_4w * 100.0
        ));
    }
    if features.complaint_growth_rate > config.explain_growth_rate {
        parts.push(format!(
            "daily complaint rate {:.0}% above the historical average",
            features.complaint_growth_rate * 100.0
        ));
    }
    if features.night_ratio_change.abs() > config.explain_night_change {
        let direction = if features.night_ratio_change > 0.0 {
            "rose"
        } else {
            "fell"
        };
        parts.push(format!("night complaint share {direction} sharply"));
    }
    if z_score.abs() > config.flag_z_threshold {
        parts.push(format!("statistical outlier (z-score {z_score:.2})"));
    }

    if parts.is_empty() {
        "statistical anomaly pattern detected".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn total(day_offset: i64, value: f64) -> SignalRecord {
        SignalRecord {
            unit_id: "U-001".to_string(),
            date: date(2024, 1, 1) + chrono::Duration::days(day_offset),
            signal_type: SignalType::Total,
            value,
        }
    }

    #[test]
    fn empty_history_is_neutral_and_unflagged() {
        let result = detect(
            &AnomalyConfig::default(),
            "U-001",
            date(2024, 5, 1),
            &[],
            &[],
            &[],
            &[],
        );
        assert_eq!(result.features, AnomalyFeatures::default());
        assert_eq!(result.stats.z_score, 0.0);
        assert_eq!(result.anomaly_score, 0.5);
        assert!(!result.anomaly_flag);
        assert!(result.explanation.is_none());
    }

    #[test]
    fn complaint_change_matches_relative_formula() {
        // Recent 150 vs baseline 200: (150-200)/200 = -0.25
        let recent: Vec<SignalRecord> = (0..28).map(|d| total(d + 56, 150.0 / 28.0)).collect();
        let baseline: Vec<SignalRecord> = (0..56).map(|d| total(d, 200.0 / 56.0)).collect();
        let features = compute_features(&recent, &baseline, &[], &[]);
        assert!((features.complaint_change_4w - (-0.25)).abs() < 1e-9);
    }

    #[test]
    fn zero_baseline_with_recent_volume_saturates_to_one() {
        let recent = vec![total(60, 5.0)];
        let features = compute_features(&recent, &[], &[], &[]);
        assert_eq!(features.complaint_change_4w, 1.0);
        assert_eq!(features.complaint_growth_rate, 1.0);
    }

    #[test]
    fn anomaly_score_is_always_in_unit_interval() {
        // A violent spike against a quiet baseline
        let recent: Vec<SignalRecord> = (0..28).map(|d| total(d + 56, 500.0)).collect();
        let baseline: Vec<SignalRecord> = (0..56).map(|d| total(d, 1.0)).collect();
        let result = detect(
            &AnomalyConfig::default(),
            "U-001",
            date(2024, 5, 1),
            &recent,
            &baseline,
            &[],
            &[],
        );
        assert!((0.0..=1.0).contains(&result.anomaly_score));
        assert!(result.anomaly_flag);
        let explanation = result.explanation.expect("flagged result explains itself");
        assert!(explanation.contains("complaints up"));
    }

    #[test]
    fn quiet_unit_with_stable_history_is_not_flagged() {
        let recent: Vec<SignalRecord> = (0..28).map(|d| total(d + 56, 3.0)).collect();
        let baseline: Vec<SignalRecord> = (0..56).map(|d| total(d, 3.0)).collect();
        let result = detect(
            &AnomalyConfig::default(),
            "U-001",
            date(2024, 5, 1),
            &recent,
            &baseline,
            &[],
            &[],
        );
        assert!(!result.anomaly_flag);
        assert!(result.explanation.is_none());
    }

    #[test]
    fn weekly_buckets_default_variance_when_single_bucket() {
        let config = AnomalyConfig::default();
        // All baseline records in one ISO week
        let baseline: Vec<SignalRecord> = (0..5).map(|d| total(d, 4.0)).collect();
        let (mean, std) = baseline_statistics(&config, &baseline, &[]);
        assert!((mean - 0.7 * 4.0).abs() < 1e-9);
        assert_eq!(std, 1.0);
    }

    #[test]
    fn population_presence_contributes_to_weekly_composite() {
        let config = AnomalyConfig::default();
        let baseline: Vec<SignalRecord> = (0..5).map(|d| total(d, 4.0)).collect();
        let population = vec![PopulationRecord {
            unit_id: "U-001".to_string(),
            date: date(2024, 1, 2),
            pop_total: 9000.0,
            pop_night: 3000.0,
            pop_change_rate: None,
        }];
        let (mean, _) = baseline_statistics(&config, &baseline, &population);
        assert!((mean - (0.7 * 4.0 + 0.3)).abs() < 1e-9);
    }
}
