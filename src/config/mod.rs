//! Engine configuration
//!
//! Every weight, cap, and threshold used by the scoring, anomaly, and
//! trend components, collected into one immutable [`EngineConfig`] passed
//! to `Engine::new`. Defaults reproduce the production tuning; any value
//! can be overridden from a TOML file and the result is range-checked by
//! [`EngineConfig::validate`].
//!
//! There is deliberately no process-global configuration: each engine
//! instance owns its own copy, so two engines with different tunings can
//! coexist and no call can observe a half-updated setting.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Configuration loading/validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Base weight per signal group before presence renormalization.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupWeights {
    pub human: f64,
    pub geo: f64,
    pub population: f64,
    /// Reserved fourth group ("extra"/pigeon). 0.0 unless a deployment
    /// actually wires a data source for it.
    pub extra: f64,
}

impl Default for GroupWeights {
    fn default() -> Self {
        Self {
            human: 0.5,
            geo: 0.3,
            population: 0.2,
            extra: 0.0,
        }
    }
}

/// Human/complaint group: sub-feature weights and saturation caps.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HumanScoringConfig {
    pub volume_weight: f64,
    pub relative_baseline_weight: f64,
    pub excess_growth_weight: f64,
    pub odor_weight: f64,
    pub trash_weight: f64,
    pub illegal_dump_weight: f64,
    pub night_weight: f64,
    /// Daily complaint average that saturates the volume feature to 1.0
    pub volume_daily_cap: f64,
    /// Cap on the unit-vs-citywide daily-average ratio
    pub baseline_ratio_cap: f64,
    /// Excess growth rate that saturates to 1.0 (0.3 = 30 points)
    pub excess_growth_saturation: f64,
    /// Scale for the informational (unweighted) growth-rate feature
    pub growth_rate_scale: f64,
}

impl Default for HumanScoringConfig {
    fn default() -> Self {
        Self {
            volume_weight: 0.15,
            relative_baseline_weight: 0.20,
            excess_growth_weight: 0.15,
            odor_weight: 0.15,
            trash_weight: 0.12,
            illegal_dump_weight: 0.12,
            night_weight: 0.11,
            volume_daily_cap: 10.0,
            baseline_ratio_cap: 3.0,
            excess_growth_saturation: 0.3,
            growth_rate_scale: 0.5,
        }
    }
}

impl HumanScoringConfig {
    pub fn weight_sum(&self) -> f64 {
        self.volume_weight
            + self.relative_baseline_weight
            + self.excess_growth_weight
            + self.odor_weight
            + self.trash_weight
            + self.illegal_dump_weight
            + self.night_weight
    }
}

/// Geo/vulnerability group: feature weights and normalization scales.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeoScoringConfig {
    pub alley_weight: f64,
    pub backroad_weight: f64,
    pub ventilation_weight: f64,
    pub accessibility_weight: f64,
    pub landuse_weight: f64,
    /// Alley density that saturates to 1.0
    pub alley_density_cap: f64,
    /// Proxy scale: proxies are 0..=proxy_scale, inverted to 1 - v/scale
    pub proxy_scale: f64,
}

impl Default for GeoScoringConfig {
    fn default() -> Self {
        Self {
            alley_weight: 0.30,
            backroad_weight: 0.25,
            ventilation_weight: 0.20,
            accessibility_weight: 0.15,
            landuse_weight: 0.10,
            alley_density_cap: 100.0,
            proxy_scale: 10.0,
        }
    }
}

impl GeoScoringConfig {
    pub fn weight_sum(&self) -> f64 {
        self.alley_weight
            + self.backroad_weight
            + self.ventilation_weight
            + self.accessibility_weight
            + self.landuse_weight
    }
}

/// Population group: feature weights and normalization caps.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationScoringConfig {
    pub total_weight: f64,
    pub night_weight: f64,
    pub change_weight: f64,
    /// Average daily population that saturates to 1.0
    pub total_cap: f64,
    /// Average change rate that saturates to 1.0
    pub change_rate_cap: f64,
}

impl Default for PopulationScoringConfig {
    fn default() -> Self {
        Self {
            total_weight: 0.3,
            night_weight: 0.4,
            change_weight: 0.3,
            total_cap: 10_000.0,
            change_rate_cap: 0.3,
        }
    }
}

impl PopulationScoringConfig {
    pub fn weight_sum(&self) -> f64 {
        self.total_weight + self.night_weight + self.change_weight
    }
}

/// Anomaly detector: feature weights, flag thresholds, explanation gates.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnomalyConfig {
    pub complaint_change_weight: f64,
    pub growth_rate_weight: f64,
    pub night_ratio_weight: f64,
    pub population_weight: f64,
    /// Weight of average complaints in the weekly baseline composite
    pub weekly_human_weight: f64,
    /// Contribution of population-data presence in the weekly composite
    pub weekly_population_weight: f64,
    /// z-score divisor mapping z into the [0,1] anomaly score
    pub z_score_divisor: f64,
    /// Flag when anomaly_score exceeds this
    pub flag_score_threshold: f64,
    /// Flag when |z| exceeds this
    pub flag_z_threshold: f64,
    /// Explanation gate: complaint change above this is called out
    pub explain_complaint_change: f64,
    /// Explanation gate: growth-rate delta above this is called out
    pub explain_growth_rate: f64,
    /// Explanation gate: |night-ratio change| above this is called out
    pub explain_night_change: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            complaint_change_weight: 0.4,
            growth_rate_weight: 0.3,
            night_ratio_weight: 0.2,
            population_weight: 0.1,
            weekly_human_weight: 0.7,
            weekly_population_weight: 0.3,
            z_score_divisor: 5.0,
            flag_score_threshold: 0.7,
            flag_z_threshold: 2.5,
            explain_complaint_change: 0.3,
            explain_growth_rate: 0.2,
            explain_night_change: 0.15,
        }
    }
}

impl AnomalyConfig {
    pub fn feature_weight_sum(&self) -> f64 {
        self.complaint_change_weight
            + self.growth_rate_weight
            + self.night_ratio_weight
            + self.population_weight
    }
}

/// Trend forecaster: direction thresholds and moving-average windows.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrendConfig {
    /// |slope| below this is "stable"
    pub slope_threshold: f64,
    /// Fraction of confidence lost at the forecast horizon
    pub confidence_decay: f64,
    pub short_ma_window: usize,
    pub long_ma_window: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            slope_threshold: 0.1,
            confidence_decay: 0.5,
            short_ma_window: 7,
            long_ma_window: 14,
        }
    }
}

/// Explainability gates: each is an independent threshold that, when
/// exceeded, appends one driver to the rationale.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplainConfig {
    /// Unit-vs-citywide ratio above this is a driver
    pub relative_baseline_min: f64,
    /// Excess growth above this is a driver
    pub excess_growth_min: f64,
    /// Sub-category share of total complaints above this is a driver
    pub category_ratio_min: f64,
    /// Average night share above this is a driver
    pub night_ratio_min: f64,
    /// Average repeat share above this is a driver
    pub repeat_ratio_min: f64,
    /// Alley density above this is a driver
    pub alley_density_min: f64,
    /// Backroad ratio above this is a driver
    pub backroad_ratio_min: f64,
    /// Average population change rate above this is a driver
    pub pop_change_min: f64,
    /// Cap on caller-facing drivers
    pub max_drivers: usize,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            relative_baseline_min: 1.2,
            excess_growth_min: 0.05,
            category_ratio_min: 0.1,
            night_ratio_min: 0.4,
            repeat_ratio_min: 0.3,
            alley_density_min: 30.0,
            backroad_ratio_min: 0.3,
            pop_change_min: 0.05,
            max_drivers: 5,
        }
    }
}

/// Full engine configuration. Immutable once constructed; pass by value
/// (or clone) into each `Engine`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub weights: GroupWeights,
    pub human: HumanScoringConfig,
    pub geo: GeoScoringConfig,
    pub population: PopulationScoringConfig,
    pub anomaly: AnomalyConfig,
    pub trend: TrendConfig,
    pub explain: ExplainConfig,
    /// Grade cutoffs, strictly increasing within (0,100)
    pub grade_cutoffs: [f64; 4],
    /// Concurrent unit computations in batch scoring
    pub batch_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: GroupWeights::default(),
            human: HumanScoringConfig::default(),
            geo: GeoScoringConfig::default(),
            population: PopulationScoringConfig::default(),
            anomaly: AnomalyConfig::default(),
            trend: TrendConfig::default(),
            explain: ExplainConfig::default(),
            grade_cutoffs: crate::types::Grade::DEFAULT_CUTOFFS,
            batch_concurrency: 8,
        }
    }
}

/// Weight sums may drift by float representation, not by tuning mistakes.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

impl EngineConfig {
    /// Parse from a TOML string and validate. Unknown keys are rejected
    /// by serde, so a typo'd threshold cannot silently fall back to its
    /// default.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Range-check every tunable. Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weight_sum(
            "weights",
            self.weights.human + self.weights.geo + self.weights.population + self.weights.extra,
        )?;
        check_non_negative(
            "weights",
            &[
                self.weights.human,
                self.weights.geo,
                self.weights.population,
                self.weights.extra,
            ],
        )?;
        check_weight_sum("human", self.human.weight_sum())?;
        check_weight_sum("geo", self.geo.weight_sum())?;
        check_weight_sum("population", self.population.weight_sum())?;
        check_weight_sum("anomaly", self.anomaly.feature_weight_sum())?;

        check_positive("human.volume_daily_cap", self.human.volume_daily_cap)?;
        check_positive("human.baseline_ratio_cap", self.human.baseline_ratio_cap)?;
        check_positive(
            "human.excess_growth_saturation",
            self.human.excess_growth_saturation,
        )?;
        check_positive("human.growth_rate_scale", self.human.growth_rate_scale)?;
        check_positive("geo.alley_density_cap", self.geo.alley_density_cap)?;
        check_positive("geo.proxy_scale", self.geo.proxy_scale)?;
        check_positive("population.total_cap", self.population.total_cap)?;
        check_positive("population.change_rate_cap", self.population.change_rate_cap)?;
        check_positive("anomaly.z_score_divisor", self.anomaly.z_score_divisor)?;
        check_positive("anomaly.flag_z_threshold", self.anomaly.flag_z_threshold)?;
        check_positive("trend.slope_threshold", self.trend.slope_threshold)?;

        if !(0.0..=1.0).contains(&self.anomaly.flag_score_threshold) {
            return Err(ConfigError::Invalid {
                field: "anomaly.flag_score_threshold",
                message: format!("{} outside [0, 1]", self.anomaly.flag_score_threshold),
            });
        }
        if !(0.0..=1.0).contains(&self.trend.confidence_decay) {
            return Err(ConfigError::Invalid {
                field: "trend.confidence_decay",
                message: format!("{} outside [0, 1]", self.trend.confidence_decay),
            });
        }
        if self.trend.short_ma_window == 0 || self.trend.long_ma_window == 0 {
            return Err(ConfigError::Invalid {
                field: "trend",
                message: "moving-average windows must be >= 1".to_string(),
            });
        }

        let c = &self.grade_cutoffs;
        let ordered = c.windows(2).all(|w| w[0] < w[1]);
        if !ordered || c[0] <= 0.0 || c[3] >= 100.0 {
            return Err(ConfigError::Invalid {
                field: "grade_cutoffs",
                message: format!("{c:?} must be strictly increasing within (0, 100)"),
            });
        }

        if self.batch_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "batch_concurrency",
                message: "must be >= 1".to_string(),
            });
        }
        if self.explain.max_drivers == 0 {
            return Err(ConfigError::Invalid {
                field: "explain.max_drivers",
                message: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

fn check_weight_sum(field: &'static str, sum: f64) -> Result<(), ConfigError> {
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::Invalid {
            field,
            message: format!("weights sum to {sum}, expected 1.0"),
        });
    }
    Ok(())
}

fn check_non_negative(field: &'static str, values: &[f64]) -> Result<(), ConfigError> {
    if values.iter().any(|v| *v < 0.0) {
        return Err(ConfigError::Invalid {
            field,
            message: "weights must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value <= 0.0 {
        return Err(ConfigError::Invalid {
            field,
            message: format!("{value} must be > 0"),
        });
    }
    Ok(())
}
