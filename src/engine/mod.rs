//! Engine orchestration layer
//!
//! The surface exposed to the (external) REST/ETL layers. Each operation
//! validates its parameters before any store access, fetches the windows
//! it needs from the read-only [`SignalStore`], and delegates to the pure
//! scoring/anomaly/trend components. The engine holds no mutable state:
//! identical store contents and parameters always produce identical
//! results, and abandoning a call mid-flight leaves nothing
//! behind. Persistence of the outputs is entirely the caller's concern.

use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;
use tracing::debug;

use crate::config::EngineConfig;
use crate::store::{SignalStore, StoreError};
use crate::types::{
    AnomalyResult, BaselineMetric, ComputedIndex, SignalType, TimePoint, TrendAnalysis,
    TrendResult,
};
use crate::{anomaly, scoring, trend};

/// Default lookback window for index computation, in weeks.
pub const DEFAULT_WINDOW_WEEKS: u32 = 4;
/// Default anomaly baseline window, in weeks.
pub const DEFAULT_BASELINE_WEEKS: u32 = 8;
/// Default forecast horizon, in days.
pub const DEFAULT_FORECAST_DAYS: u32 = 7;

const WINDOW_WEEKS_RANGE: RangeInclusive<u32> = 1..=12;
const BASELINE_WEEKS_RANGE: RangeInclusive<u32> = 1..=26;
const FORECAST_DAYS_RANGE: RangeInclusive<u32> = 1..=30;
const LOOKBACK_DAYS_RANGE: RangeInclusive<u32> = 1..=365;

/// Engine operation failure.
///
/// Insufficient data is NOT represented here; it comes back as
/// `Ok(None)`, an `Unknown` trend direction, or a neutral anomaly result,
/// so callers can always distinguish "computed a low score" from "could
/// not compute" from "the store is down".
#[derive(Debug, Error)]
pub enum EngineError {
    /// Upstream store failure, propagated as-is. Never conflated with an
    /// empty result set.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Rejected before any store access.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },
}

fn check_range(
    name: &'static str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> Result<(), EngineError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidParameter {
            name,
            message: format!("{value} outside [{}, {}]", range.start(), range.end()),
        })
    }
}

/// The scoring and analytics engine.
///
/// Cheap to clone; the store is shared behind an `Arc` and the config is
/// immutable, so one engine can serve concurrent callers without locks.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn SignalStore>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(store: Arc<dyn SignalStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Engine over a store with the default production tuning.
    pub fn with_defaults(store: Arc<dyn SignalStore>) -> Self {
        Self::new(store, EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the comfort index for one (unit, date).
    ///
    /// `Ok(None)` means no signal group had any data in the window:
    /// insufficient data, not an error.
    pub async fn compute_index(
        &self,
        unit_id: &str,
        date: NaiveDate,
        window_weeks: u32,
        enable_extra: bool,
    ) -> Result<Option<ComputedIndex>, EngineError> {
        check_range("window_weeks", window_weeks, &WINDOW_WEEKS_RANGE)?;

        let from = date - Duration::days(i64::from(window_weeks * 7));
        let signals = self.store.fetch_signals(unit_id, from, date).await?;
        let geo = self.store.fetch_geo(unit_id).await?;
        let population = self.store.fetch_population(unit_id, from, date).await?;
        let period = date.format("%Y-%m").to_string();
        let baseline = self
            .store
            .fetch_baseline(&period, BaselineMetric::CATEGORY_OVERALL)
            .await?;

        debug!(
            unit_id,
            %date,
            window_weeks,
            signal_records = signals.len(),
            population_records = population.len(),
            baseline_available = baseline.is_some(),
            "computing comfort index"
        );

        Ok(scoring::compute_index(
            &self.config,
            unit_id,
            date,
            window_weeks,
            enable_extra,
            &signals,
            geo.as_ref(),
            &population,
            baseline.as_ref(),
        ))
    }

    /// Compute comfort indexes for many units on one date, fanning out
    /// across a bounded worker pool (`config.batch_concurrency`).
    ///
    /// Unit computations are fully independent (no unit observes
    /// another's intermediate state) and results come back in input
    /// order. A store failure for any unit fails the batch.
    pub async fn compute_index_batch(
        &self,
        unit_ids: &[String],
        date: NaiveDate,
        window_weeks: u32,
        enable_extra: bool,
    ) -> Result<Vec<(String, Option<ComputedIndex>)>, EngineError> {
        check_range("window_weeks", window_weeks, &WINDOW_WEEKS_RANGE)?;

        let computations = unit_ids.iter().map(|unit_id| async move {
            let index = self
                .compute_index(unit_id, date, window_weeks, enable_extra)
                .await?;
            Ok::<_, EngineError>((unit_id.clone(), index))
        });

        stream::iter(computations)
            .buffered(self.config.batch_concurrency.max(1))
            .try_collect()
            .await
    }

    /// Detect whether the unit's recent window deviates anomalously from
    /// its own history. The baseline window ends exactly where the recent
    /// window begins; the two never overlap.
    ///
    /// Total: a unit with no data yields the neutral result, never an
    /// error.
    pub async fn detect_anomaly(
        &self,
        unit_id: &str,
        date: NaiveDate,
        recent_weeks: u32,
        baseline_weeks: u32,
    ) -> Result<AnomalyResult, EngineError> {
        check_range("recent_weeks", recent_weeks, &WINDOW_WEEKS_RANGE)?;
        check_range("baseline_weeks", baseline_weeks, &BASELINE_WEEKS_RANGE)?;

        let recent_from = date - Duration::days(i64::from(recent_weeks * 7));
        let baseline_from =
            date - Duration::days(i64::from((recent_weeks + baseline_weeks) * 7));
        let baseline_to = recent_from - Duration::days(1);

        let recent_signals = self.store.fetch_signals(unit_id, recent_from, date).await?;
        let baseline_signals = self
            .store
            .fetch_signals(unit_id, baseline_from, baseline_to)
            .await?;
        let recent_population = self
            .store
            .fetch_population(unit_id, recent_from, date)
            .await?;
        let baseline_population = self
            .store
            .fetch_population(unit_id, baseline_from, baseline_to)
            .await?;

        Ok(anomaly::detect(
            &self.config.anomaly,
            unit_id,
            date,
            &recent_signals,
            &baseline_signals,
            &recent_population,
            &baseline_population,
        ))
    }

    /// Fit a trend over a caller-supplied series and forecast ahead.
    ///
    /// Pure, no store access. A series with fewer than 2 points comes
    /// back with `Unknown` direction and an empty forecast.
    pub fn forecast_trend(
        &self,
        series: &[TimePoint],
        horizon_days: u32,
    ) -> Result<TrendResult, EngineError> {
        check_range("horizon_days", horizon_days, &FORECAST_DAYS_RANGE)?;
        Ok(trend::forecast(&self.config.trend, series, horizon_days))
    }

    /// Fetch the unit's total-complaint series and produce the enriched
    /// trend report (fit + forecast + moving averages + seasonality +
    /// summary statistics). `Ok(None)` when the unit has no complaint
    /// records in the lookback span.
    pub async fn complaint_trend(
        &self,
        unit_id: &str,
        date: NaiveDate,
        lookback_days: u32,
        horizon_days: u32,
    ) -> Result<Option<TrendAnalysis>, EngineError> {
        check_range("lookback_days", lookback_days, &LOOKBACK_DAYS_RANGE)?;
        check_range("horizon_days", horizon_days, &FORECAST_DAYS_RANGE)?;

        let from = date - Duration::days(i64::from(lookback_days));
        let signals = self.store.fetch_signals(unit_id, from, date).await?;
        let series: Vec<TimePoint> = signals
            .iter()
            .filter(|r| r.signal_type == SignalType::Total)
            .map(|r| TimePoint {
                date: r.date,
                value: r.value,
            })
            .collect();

        debug!(
            unit_id,
            %date,
            lookback_days,
            observations = series.len(),
            "complaint trend analysis"
        );

        Ok(trend::analyze(
            &self.config.trend,
            unit_id,
            &series,
            horizon_days,
        ))
    }
}
