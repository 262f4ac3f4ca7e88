//! Geo/vulnerability group scoring
//!
//! Static and date-independent: the same unit scores identically on every
//! invocation until its geographic attributes are re-surveyed. The
//! ventilation and accessibility proxies grade 0 (worst) to 10 (best), so
//! they invert before weighting: poor ventilation raises the score.

use std::collections::BTreeMap;

use crate::config::GeoScoringConfig;
use crate::types::GeoAttributes;

/// Geo-group score with its normalized feature map.
#[derive(Debug, Clone)]
pub(crate) struct GeoScore {
    pub score: f64,
    pub normalized: BTreeMap<String, f64>,
}

pub(crate) fn evaluate(config: &GeoScoringConfig, attributes: &GeoAttributes) -> GeoScore {
    let alley = (attributes.alley_density / config.alley_density_cap).clamp(0.0, 1.0);
    let backroad = attributes.backroad_ratio.clamp(0.0, 1.0);
    let ventilation = (1.0 - attributes.ventilation_proxy / config.proxy_scale).clamp(0.0, 1.0);
    let accessibility =
        (1.0 - attributes.accessibility_proxy / config.proxy_scale).clamp(0.0, 1.0);
    let landuse = attributes.landuse_mix.clamp(0.0, 1.0);

    let score = (alley * config.alley_weight
        + backroad * config.backroad_weight
        + ventilation * config.ventilation_weight
        + accessibility * config.accessibility_weight
        + landuse * config.landuse_weight)
        .clamp(0.0, 1.0);

    let mut normalized = BTreeMap::new();
    normalized.insert("alley_density".to_string(), alley);
    normalized.insert("backroad_ratio".to_string(), backroad);
    normalized.insert("ventilation_proxy".to_string(), ventilation);
    normalized.insert("accessibility_proxy".to_string(), accessibility);
    normalized.insert("landuse_mix".to_string(), landuse);

    GeoScore { score, normalized }
}
