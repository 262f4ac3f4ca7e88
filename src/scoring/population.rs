//! Population group scoring

use std::collections::BTreeMap;

use crate::config::PopulationScoringConfig;
use crate::stats;
use crate::types::PopulationRecord;

/// Population-group score plus the raw change-rate average the rationale
/// builder needs.
#[derive(Debug, Clone)]
pub(crate) struct PopulationScore {
    pub score: f64,
    pub normalized: BTreeMap<String, f64>,
    /// Average of the records that carried a change rate; `None` when
    /// none did.
    pub avg_change_rate: Option<f64>,
}

pub(crate) fn evaluate(
    config: &PopulationScoringConfig,
    records: &[PopulationRecord],
) -> Option<PopulationScore> {
    if records.is_empty() {
        return None;
    }

    let count = records.len() as f64;
    let avg_total = records.iter().map(|r| r.pop_total).sum::<f64>() / count;
    let avg_night = records.iter().map(|r| r.pop_night).sum::<f64>() / count;
    let change_rates: Vec<f64> = records.iter().filter_map(|r| r.pop_change_rate).collect();
    let avg_change_rate = (!change_rates.is_empty()).then(|| stats::mean(&change_rates));

    let night_ratio = if avg_total > 0.0 {
        (avg_night / avg_total).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let total_norm = (avg_total / config.total_cap).clamp(0.0, 1.0);
    let change_norm = (avg_change_rate.unwrap_or(0.0).max(0.0) / config.change_rate_cap)
        .clamp(0.0, 1.0);

    let score = (total_norm * config.total_weight
        + night_ratio * config.night_weight
        + change_norm * config.change_weight)
        .clamp(0.0, 1.0);

    let mut normalized = BTreeMap::new();
    normalized.insert("avg_total".to_string(), total_norm);
    normalized.insert("night_ratio".to_string(), night_ratio);
    normalized.insert("change_rate".to_string(), change_norm);

    Some(PopulationScore {
        score,
        normalized,
        avg_change_rate,
    })
}
