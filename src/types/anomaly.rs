//! Anomaly detection results

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Input features for the anomaly composite, each a relative change of the
/// recent window against the baseline window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFeatures {
    /// Relative change in total complaints
    pub complaint_change_4w: f64,
    /// Relative change in per-record daily complaint average
    pub complaint_growth_rate: f64,
    /// Relative change in average night-complaint share
    pub night_ratio_change: f64,
    /// Relative change in total population
    pub population_change_rate: f64,
}

/// Rolling statistics the z-score was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyStats {
    pub z_score: f64,
    pub rolling_mean: f64,
    pub rolling_std: f64,
}

/// Outcome of one anomaly evaluation for a (unit, date).
///
/// `anomaly_score` is always in [0,1]; 0.5 is neutral (no deviation from
/// baseline), values toward 1.0 indicate rapid deterioration. Absent
/// signal history yields the neutral score with `anomaly_flag = false`,
/// never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub unit_id: String,
    pub date: NaiveDate,
    pub anomaly_score: f64,
    pub anomaly_flag: bool,
    pub features: AnomalyFeatures,
    pub stats: AnomalyStats,
    /// Which feature thresholds were exceeded; `None` unless flagged
    pub explanation: Option<String>,
}
