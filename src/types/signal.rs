//! Raw signal observations owned by the external data store

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category of a human-signal observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// Daily total complaint count
    Total,
    /// Odor complaint count
    Odor,
    /// Trash complaint count
    Trash,
    /// Illegal dumping complaint count
    IllegalDumping,
    /// Fraction of the day's complaints filed at night, [0,1]
    NightRatio,
    /// Fraction of the day's complaints from repeat reporters, [0,1]
    RepeatRatio,
    /// Uncategorized
    Other,
}

/// One time-stamped observation for a spatial unit.
///
/// Immutable once ingested. The engine only reads these; ingestion and
/// validation happen upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub unit_id: String,
    pub date: NaiveDate,
    pub signal_type: SignalType,
    pub value: f64,
}

/// Static geographic vulnerability attributes. One record per unit, no
/// date dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoAttributes {
    pub unit_id: String,
    /// Alley segments per km², open-ended (capped at 100 during scoring)
    pub alley_density: f64,
    /// Backroad share of the road network, [0,1]
    pub backroad_ratio: f64,
    /// Ventilation quality proxy, 0 (worst) to 10 (best)
    pub ventilation_proxy: f64,
    /// Cleanup-vehicle accessibility proxy, 0 (worst) to 10 (best)
    pub accessibility_proxy: f64,
    /// Land-use mixing degree, [0,1]
    pub landuse_mix: f64,
    /// Historical dumping-hotspot propensity, [0,1]
    pub habitual_dumping_risk: f64,
}

/// Daily population-movement statistics for a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub unit_id: String,
    pub date: NaiveDate,
    pub pop_total: f64,
    pub pop_night: f64,
    /// Day-over-day change rate. `None` when the upstream source had no
    /// prior day to difference against.
    pub pop_change_rate: Option<f64>,
}

/// Citywide reference aggregate for one (month, category) pair.
///
/// Used only as a read-only comparison reference for baseline-relative
/// scoring; the engine never produces these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetric {
    /// "YYYY-MM"
    pub period: String,
    pub category: String,
    pub citywide_total: f64,
    pub citywide_avg_per_unit: f64,
    pub growth_rate: f64,
}

impl BaselineMetric {
    /// Category name of the all-complaint-types aggregate the human group
    /// scores against.
    pub const CATEGORY_OVERALL: &'static str = "overall";
}
