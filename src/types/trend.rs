//! Trend, forecast, and seasonality results

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction classification of a fitted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    /// Fewer than 2 observations; no trend is fabricated
    Unknown,
}

/// One (date, value) observation in a numeric time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One forecast step with linearly decaying confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Predicted value, clamped to >= 0
    pub value: f64,
    /// [0,1], decays with forecast distance
    pub confidence: f64,
}

/// Day-of-week and monthly averages over the analyzed series.
///
/// Day keys are 0 = Sunday through 6 = Saturday; month keys are "YYYY-MM".
/// Peak buckets are the highest-mean keys; ties resolve to the later key
/// in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub day_of_week_avg: BTreeMap<u8, f64>,
    pub monthly_avg: BTreeMap<String, f64>,
    pub peak_day: Option<u8>,
    pub peak_month: Option<String>,
}

/// Fitted trend plus forecast and seasonality for a numeric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub slope: f64,
    pub intercept: f64,
    /// Model confidence: R² of the fit clamped to [0,1]
    pub confidence: f64,
    pub forecast: Vec<ForecastPoint>,
    pub seasonality: Seasonality,
}

/// Trailing moving averages over the analyzed series, aligned to its dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovingAverages {
    pub ma7: Vec<TimePoint>,
    pub ma14: Vec<TimePoint>,
}

/// Min/max/mean/std summary of the analyzed series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

/// Date span the analysis actually covered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Number of observations in the span (not calendar days)
    pub observed_days: usize,
}

/// Enriched trend report for one unit's series: the fitted trend wrapped
/// with moving averages, summary statistics, and the analyzed period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub unit_id: String,
    pub period: AnalysisPeriod,
    pub current_value: f64,
    /// First-to-last relative change over the period, in percent
    pub change_rate_pct: f64,
    pub trend: TrendResult,
    pub moving_averages: MovingAverages,
    pub statistics: SeriesStatistics,
}
