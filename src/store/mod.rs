//! Read-only signal store contract
//!
//! The engine's single I/O boundary. Implementations wrap whatever
//! backing store a deployment uses (document database, warehouse,
//! in-process fixtures); the engine only ever reads through this trait
//! and treats a failed fetch as a distinct error, never as "no data".

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{BaselineMetric, GeoAttributes, PopulationRecord, SignalRecord};

mod memory;
pub use memory::MemoryStore;

/// Upstream store failure. An empty result set is `Ok`; this is for the
/// store itself being unreachable or rejecting the query.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store query failed: {0}")]
    Query(String),
}

/// Read-only access to raw signal history.
///
/// All date ranges are inclusive on both ends and results come back
/// ascending by date. Timeouts and retries, if any, belong to the
/// implementation; the engine never retries.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// All signal records for the unit within `[from, to]`.
    async fn fetch_signals(
        &self,
        unit_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SignalRecord>, StoreError>;

    /// Static geo attributes, or `None` for an unknown unit.
    async fn fetch_geo(&self, unit_id: &str) -> Result<Option<GeoAttributes>, StoreError>;

    /// Population records for the unit within `[from, to]`.
    async fn fetch_population(
        &self,
        unit_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PopulationRecord>, StoreError>;

    /// Citywide baseline for a ("YYYY-MM", category) pair, if published.
    async fn fetch_baseline(
        &self,
        period: &str,
        category: &str,
    ) -> Result<Option<BaselineMetric>, StoreError>;
}
