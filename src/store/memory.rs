//! In-memory signal store
//!
//! Backs integration tests and embedded callers that materialize their
//! signal history up front. Fetches clone the matching records, so the
//! store can be shared behind an `Arc` across concurrent computations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{SignalStore, StoreError};
use crate::types::{BaselineMetric, GeoAttributes, PopulationRecord, SignalRecord};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    signals: Vec<SignalRecord>,
    geo: HashMap<String, GeoAttributes>,
    population: Vec<PopulationRecord>,
    baselines: HashMap<(String, String), BaselineMetric>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_signal(&mut self, record: SignalRecord) {
        self.signals.push(record);
    }

    pub fn insert_signals(&mut self, records: impl IntoIterator<Item = SignalRecord>) {
        self.signals.extend(records);
    }

    pub fn insert_geo(&mut self, attributes: GeoAttributes) {
        self.geo.insert(attributes.unit_id.clone(), attributes);
    }

    pub fn insert_population(&mut self, record: PopulationRecord) {
        self.population.push(record);
    }

    pub fn insert_populations(&mut self, records: impl IntoIterator<Item = PopulationRecord>) {
        self.population.extend(records);
    }

    pub fn insert_baseline(&mut self, metric: BaselineMetric) {
        self.baselines
            .insert((metric.period.clone(), metric.category.clone()), metric);
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn fetch_signals(
        &self,
        unit_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SignalRecord>, StoreError> {
        let mut records: Vec<SignalRecord> = self
            .signals
            .iter()
            .filter(|r| r.unit_id == unit_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    async fn fetch_geo(&self, unit_id: &str) -> Result<Option<GeoAttributes>, StoreError> {
        Ok(self.geo.get(unit_id).cloned())
    }

    async fn fetch_population(
        &self,
        unit_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PopulationRecord>, StoreError> {
        let mut records: Vec<PopulationRecord> = self
            .population
            .iter()
            .filter(|r| r.unit_id == unit_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    async fn fetch_baseline(
        &self,
        period: &str,
        category: &str,
    ) -> Result<Option<BaselineMetric>, StoreError> {
        Ok(self
            .baselines
            .get(&(period.to_string(), category.to_string()))
            .cloned())
    }
}
