//! Explainability driver extraction
//!
//! Presentation logic over numbers the scorer already computed: a set of
//! independent threshold gates, each appending at most one driver and
//! optionally one summary fragment. Gates are not mutually exclusive.
//! Drivers are deduplicated by signal name and capped for caller-facing
//! output; when nothing fires the summary falls back to a generic line.

use crate::config::ExplainConfig;
use crate::types::{BaselineMetric, BaselineReference, Explain, GeoAttributes, KeyDriver};

use super::{round2, HumanScore, PopulationScore};

pub(crate) fn build(
    config: &ExplainConfig,
    window_weeks: u32,
    human: Option<&HumanScore>,
    geo: Option<&GeoAttributes>,
    population: Option<&PopulationScore>,
    baseline: Option<&BaselineMetric>,
) -> Explain {
    let mut summary_parts: Vec<String> = Vec::new();
    let mut drivers: Vec<KeyDriver> = Vec::new();

    if let Some(human) = human {
        if let Some(ratio) = human.relative_ratio {
            if ratio > config.relative_baseline_min {
                summary_parts.push(format!(
                    "complaint volume {:.1}x the citywide average",
                    ratio
                ));
                drivers.push(KeyDriver {
                    signal: "relative_to_baseline".to_string(),
                    value: round2(ratio),
                });
            }
        }
        if let Some(excess) = human.excess_growth {
            if excess > config.excess_growth_min {
                summary_parts.push(format!(
                    "complaint growth {:.0}%p above the citywide rate",
                    excess * 100.0
                ));
                drivers.push(KeyDriver {
                    signal: "excess_growth_rate".to_string(),
                    value: round2(excess),
                });
            }
        }

        let categories = [
            ("complaint_odor", "odor", human.totals.odor),
            ("complaint_trash", "trash", human.totals.trash),
            (
                "complaint_illegal_dumping",
                "illegal dumping",
                human.totals.illegal_dumping,
            ),
        ];
        for (signal, label, count) in categories {
            if human.totals.total > 0.0 && count / human.totals.total > config.category_ratio_min {
                summary_parts.push(format!("{count:.0} {label} complaints"));
                drivers.push(KeyDriver {
                    signal: signal.to_string(),
                    value: round2(count / human.totals.total),
                });
            }
        }

        if human.night_avg > config.night_ratio_min {
            summary_parts.push(format!(
                "night concentration {:.0}%",
                human.night_avg * 100.0
            ));
            drivers.push(KeyDriver {
                signal: "night_ratio".to_string(),
                value: round2(human.night_avg),
            });
        }
        if human.repeat_avg > config.repeat_ratio_min {
            summary_parts.push(format!(
                "repeat complaint share {:.0}%",
                human.repeat_avg * 100.0
            ));
            drivers.push(KeyDriver {
                signal: "repeat_ratio".to_string(),
                value: round2(human.repeat_avg),
            });
        }
        if human.totals.total > 0.0 {
            drivers.push(KeyDriver {
                signal: "total_complaints".to_string(),
                value: round2(human.totals.total),
            });
        }
    }

    if let Some(geo) = geo {
        if geo.alley_density > config.alley_density_min {
            summary_parts.push("dense alley network".to_string());
            drivers.push(KeyDriver {
                signal: "alley_density".to_string(),
                value: round2(geo.alley_density),
            });
        }
        if geo.backroad_ratio > config.backroad_ratio_min {
            drivers.push(KeyDriver {
                signal: "backroad_ratio".to_string(),
                value: round2(geo.backroad_ratio),
            });
        }
    }

    if let Some(population) = population {
        if let Some(avg_change) = population.avg_change_rate {
            if avg_change > config.pop_change_min {
                summary_parts.push(format!(
                    "resident population up {:.0}%",
                    avg_change * 100.0
                ));
                drivers.push(KeyDriver {
                    signal: "pop_change_rate".to_string(),
                    value: round2(avg_change),
                });
            }
        }
    }

    dedup_by_signal(&mut drivers);
    drivers.truncate(config.max_drivers);

    let why_summary = if summary_parts.is_empty() {
        format!("signal analysis over the last {window_weeks} weeks")
    } else {
        summary_parts.join(", ")
    };

    Explain {
        why_summary,
        key_drivers: drivers,
        baseline_reference: baseline.map(|metric| BaselineReference {
            period: metric.period.clone(),
            citywide_total: metric.citywide_total,
            growth_rate: metric.growth_rate,
        }),
    }
}

/// Keep the first driver per signal name, preserving order.
fn dedup_by_signal(drivers: &mut Vec<KeyDriver>) {
    let mut seen = std::collections::HashSet::new();
    drivers.retain(|driver| seen.insert(driver.signal.clone()));
}
