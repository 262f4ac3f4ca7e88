//! UCI Engine: signal scoring and statistical analytics for urban comfort
//!
//! Turns time-stamped, per-spatial-unit signal observations (civic
//! complaints, geographic vulnerability attributes, population movement)
//! into three derived artifacts used to prioritize administrative
//! intervention:
//!
//! - **Comfort index**: a bounded [0,100] composite score over weighted
//!   signal groups, with letter grade and machine-generated rationale
//! - **Anomaly detection**: z-score deviation of a unit's recent behavior
//!   from its own historical baseline window
//! - **Trend forecast**: least-squares trend with decaying-confidence
//!   forecast, moving averages, and seasonality over any numeric series
//!
//! Every computation is a pure function of data fetched through the
//! read-only [`store::SignalStore`] contract; the engine keeps no state
//! between calls and never writes. Persistence of the computed artifacts
//! is the caller's responsibility.

pub mod anomaly;
pub mod config;
pub mod engine;
pub mod scoring;
pub mod stats;
pub mod store;
pub mod trend;
pub mod types;

// Re-export the engine surface
pub use engine::{Engine, EngineError};

// Re-export configuration
pub use config::{ConfigError, EngineConfig};

// Re-export the store contract
pub use store::{MemoryStore, SignalStore, StoreError};

// Re-export commonly used types
pub use types::{
    AnomalyFeatures, AnomalyResult, AnomalyStats, BaselineMetric, ComputedIndex, Explain,
    GeoAttributes, Grade, IndexComponents, KeyDriver, PopulationRecord, Seasonality, SignalRecord,
    SignalType, TimePoint, TrendAnalysis, TrendDirection, TrendResult, WeightsUsed,
};
