//! Trend forecasting over numeric time series
//!
//! Ordinary least squares on index position, a horizon forecast with
//! linearly decaying confidence, trailing moving averages, and
//! day-of-week/monthly seasonality. Works on any numeric series: the
//! comfort index history, raw complaint counts, or anything else the
//! caller hands in.
//!
//! A series with fewer than 2 points yields `TrendDirection::Unknown`
//! with an empty forecast and zero confidence: insufficient data is
//! signaled explicitly, never papered over with a fabricated trend.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration};

use crate::config::TrendConfig;
use crate::types::{
    AnalysisPeriod, ForecastPoint, MovingAverages, Seasonality, SeriesStatistics, TimePoint,
    TrendAnalysis, TrendDirection, TrendResult,
};
use crate::stats;

/// Fit a trend and forecast `horizon_days` ahead.
pub fn forecast(config: &TrendConfig, series: &[TimePoint], horizon_days: u32) -> TrendResult {
    if series.len() < 2 {
        return TrendResult {
            direction: TrendDirection::Unknown,
            slope: 0.0,
            intercept: 0.0,
            confidence: 0.0,
            forecast: Vec::new(),
            seasonality: Seasonality::default(),
        };
    }

    let n = series.len();
    let (slope, intercept) = least_squares(series);

    let direction = if slope > config.slope_threshold {
        TrendDirection::Increasing
    } else if slope < -config.slope_threshold {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    let last_date = series[n - 1].date;
    let horizon = f64::from(horizon_days);
    let forecast = (1..=horizon_days)
        .map(|i| {
            let x = (n + i as usize - 1) as f64;
            ForecastPoint {
                date: last_date + Duration::days(i64::from(i)),
                value: (slope * x + intercept).max(0.0),
                confidence: (1.0 - (f64::from(i) / horizon) * config.confidence_decay).max(0.0),
            }
        })
        .collect();

    TrendResult {
        direction,
        slope,
        intercept,
        confidence: r_squared(series, slope, intercept),
        forecast,
        seasonality: seasonality(series),
    }
}

/// OLS slope/intercept over index position 0..n-1. The denominator
/// cannot be 0 for n >= 2 with this indexing, but the guard stays so
/// a zero spread degrades to a flat line rather than NaN.
fn least_squares(series: &[TimePoint]) -> (f64, f64) {
    let n = series.len() as f64;
    let x_mean = (series.len() - 1) as f64 / 2.0;
    let y_mean = series.iter().map(|p| p.value).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, point) in series.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (point.value - y_mean);
        denominator += dx * dx;
    }

    let slope = if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    };
    (slope, y_mean - slope * x_mean)
}

/// R² of the fit, clamped to [0,1]. A flat series (SS_tot = 0) yields 0.
fn r_squared(series: &[TimePoint], slope: f64, intercept: f64) -> f64 {
    let y_mean = series.iter().map(|p| p.value).sum::<f64>() / series.len() as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (i, point) in series.iter().enumerate() {
        let predicted = slope * i as f64 + intercept;
        ss_res += (point.value - predicted).powi(2);
        ss_tot += (point.value - y_mean).powi(2);
    }
    if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Trailing simple moving average aligned to the input dates.
///
/// The first `window - 1` points pass through unmodified; a series
/// shorter than the window passes through whole.
pub fn moving_average(series: &[TimePoint], window: usize) -> Vec<TimePoint> {
    if window == 0 || series.len() < window {
        return series.to_vec();
    }
    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            if i < window - 1 {
                *point
            } else {
                let sum: f64 = series[i + 1 - window..=i].iter().map(|p| p.value).sum();
                TimePoint {
                    date: point.date,
                    value: sum / window as f64,
                }
            }
        })
        .collect()
}

/// Day-of-week (0 = Sunday) and "YYYY-MM" monthly averages.
///
/// All 7 day keys are always present (0.0 for unobserved days) so
/// downstream chart layers get a full week. Peak buckets take the
/// highest mean; ties resolve to the later key in ascending scan order.
pub fn seasonality(series: &[TimePoint]) -> Seasonality {
    let mut day_values: BTreeMap<u8, Vec<f64>> = (0..7).map(|d| (d, Vec::new())).collect();
    let mut month_values: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for point in series {
        let day = point.date.weekday().num_days_from_sunday() as u8;
        day_values.entry(day).or_default().push(point.value);
        month_values
            .entry(point.date.format("%Y-%m").to_string())
            .or_default()
            .push(point.value);
    }

    let day_of_week_avg: BTreeMap<u8, f64> = day_values
        .iter()
        .map(|(day, values)| (*day, stats::mean(values)))
        .collect();
    let monthly_avg: BTreeMap<String, f64> = month_values
        .iter()
        .map(|(month, values)| (month.clone(), stats::mean(values)))
        .collect();

    let peak_day = if series.is_empty() {
        None
    } else {
        peak_key(&day_of_week_avg).copied()
    };
    let peak_month = peak_key(&monthly_avg).cloned();

    Seasonality {
        day_of_week_avg,
        monthly_avg,
        peak_day,
        peak_month,
    }
}

/// Key of the highest-valued bucket; ascending scan with `>=` so a tie
/// lands on the later key.
fn peak_key<K: Ord>(buckets: &BTreeMap<K, f64>) -> Option<&K> {
    let mut peak: Option<(&K, f64)> = None;
    for (key, value) in buckets {
        match peak {
            Some((_, best)) if *value < best => {}
            _ => peak = Some((key, *value)),
        }
    }
    peak.map(|(key, _)| key)
}

/// Enriched per-unit trend report: fit + forecast wrapped with moving
/// averages, summary statistics, and the analyzed period. `None` for an
/// empty series; a single point comes back with `Unknown` direction and
/// degenerate statistics rather than an error.
pub fn analyze(
    config: &TrendConfig,
    unit_id: &str,
    series: &[TimePoint],
    horizon_days: u32,
) -> Option<TrendAnalysis> {
    let first = series.first()?;
    let last = series[series.len() - 1];

    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let change_rate_pct = if first.value > 0.0 {
        (last.value - first.value) / first.value * 100.0
    } else {
        0.0
    };

    Some(TrendAnalysis {
        unit_id: unit_id.to_string(),
        period: AnalysisPeriod {
            start: first.date,
            end: last.date,
            observed_days: series.len(),
        },
        current_value: last.value,
        change_rate_pct,
        trend: forecast(config, series, horizon_days),
        moving_averages: MovingAverages {
            ma7: moving_average(series, config.short_ma_window),
            ma14: moving_average(series, config.long_ma_window),
        },
        statistics: SeriesStatistics {
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: stats::mean(&values),
            std: stats::std_dev(&values),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> Vec<TimePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid test date");
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TimePoint {
                date: start + Duration::days(i as i64),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn fewer_than_two_points_is_unknown() {
        let config = TrendConfig::default();
        let empty = forecast(&config, &[], 7);
        assert_eq!(empty.direction, TrendDirection::Unknown);
        assert!(empty.forecast.is_empty());
        assert_eq!(empty.confidence, 0.0);

        let single = forecast(&config, &series(&[42.0]), 7);
        assert_eq!(single.direction, TrendDirection::Unknown);
        assert!(single.forecast.is_empty());
    }

    #[test]
    fn strictly_increasing_series_forecasts_upward() {
        let config = TrendConfig::default();
        let result = forecast(&config, &series(&[10.0, 12.0, 14.0, 16.0, 18.0]), 2);
        assert_eq!(result.direction, TrendDirection::Increasing);
        assert!((result.slope - 2.0).abs() < 1e-9);
        assert_eq!(result.forecast.len(), 2);
        // Perfect linear fit
        assert!((result.confidence - 1.0).abs() < 1e-9);
        // Next values continue the line: 20, 22
        assert!((result.forecast[0].value - 20.0).abs() < 1e-9);
        assert!((result.forecast[1].value - 22.0).abs() < 1e-9);
        // Confidence decays with distance
        assert!(result.forecast[1].confidence < result.forecast[0].confidence);
        assert!(result.forecast.iter().all(|p| p.confidence >= 0.0));
    }

    #[test]
    fn decreasing_series_clamps_forecast_at_zero() {
        let config = TrendConfig::default();
        let result = forecast(&config, &series(&[10.0, 6.0, 2.0]), 5);
        assert_eq!(result.direction, TrendDirection::Decreasing);
        let last = result.forecast.last().expect("forecast requested");
        assert_eq!(last.value, 0.0);
    }

    #[test]
    fn flat_series_is_stable_with_zero_confidence() {
        let config = TrendConfig::default();
        let result = forecast(&config, &series(&[5.0, 5.0, 5.0, 5.0]), 3);
        assert_eq!(result.direction, TrendDirection::Stable);
        assert_eq!(result.slope, 0.0);
        // SS_tot = 0: no confidence rather than NaN
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn forecast_dates_continue_from_last_observation() {
        let config = TrendConfig::default();
        let points = series(&[1.0, 2.0, 3.0]);
        let result = forecast(&config, &points, 2);
        assert_eq!(result.forecast[0].date, points[2].date + Duration::days(1));
        assert_eq!(result.forecast[1].date, points[2].date + Duration::days(2));
    }

    #[test]
    fn moving_average_passes_first_window_through() {
        let points = series(&[2.0, 4.0, 6.0, 8.0, 10.0]);
        let averaged = moving_average(&points, 3);
        assert_eq!(averaged.len(), points.len());
        assert_eq!(averaged[0].value, 2.0);
        assert_eq!(averaged[1].value, 4.0);
        assert!((averaged[2].value - 4.0).abs() < 1e-9);
        assert!((averaged[4].value - 8.0).abs() < 1e-9);
    }

    #[test]
    fn moving_average_short_series_unchanged() {
        let points = series(&[1.0, 2.0]);
        let averaged = moving_average(&points, 7);
        assert_eq!(averaged, points);
    }

    #[test]
    fn seasonality_has_all_seven_day_buckets() {
        // 2024-05-01 is a Wednesday
        let result = seasonality(&series(&[1.0, 2.0, 3.0]));
        assert_eq!(result.day_of_week_avg.len(), 7);
        // Wednesday = 3 days from Sunday
        assert!((result.day_of_week_avg[&3] - 1.0).abs() < 1e-9);
        assert_eq!(result.day_of_week_avg[&0], 0.0);
        assert_eq!(result.monthly_avg.len(), 1);
        assert!((result.monthly_avg["2024-05"] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn seasonality_peak_tie_goes_to_later_key() {
        // Two observations with equal values on different weekdays
        let points = vec![
            TimePoint {
                date: NaiveDate::from_ymd_opt(2024, 5, 6).expect("valid test date"), // Monday
                value: 4.0,
            },
            TimePoint {
                date: NaiveDate::from_ymd_opt(2024, 5, 7).expect("valid test date"), // Tuesday
                value: 4.0,
            },
        ];
        let result = seasonality(&points);
        // Monday = 1, Tuesday = 2; the tie lands on the later key
        assert_eq!(result.peak_day, Some(2));
    }

    #[test]
    fn seasonality_of_empty_series_has_no_peaks() {
        let result = seasonality(&[]);
        assert_eq!(result.peak_day, None);
        assert_eq!(result.peak_month, None);
        assert_eq!(result.day_of_week_avg.len(), 7);
    }

    #[test]
    fn analyze_wraps_fit_with_statistics() {
        let config = TrendConfig::default();
        let points = series(&[10.0, 12.0, 14.0, 16.0, 18.0]);
        let analysis = analyze(&config, "U-001", &points, 7).expect("non-empty series");
        assert_eq!(analysis.period.observed_days, 5);
        assert_eq!(analysis.current_value, 18.0);
        assert!((analysis.change_rate_pct - 80.0).abs() < 1e-9);
        assert_eq!(analysis.trend.direction, TrendDirection::Increasing);
        assert_eq!(analysis.statistics.min, 10.0);
        assert_eq!(analysis.statistics.max, 18.0);
        assert!((analysis.statistics.mean - 14.0).abs() < 1e-9);
    }

    #[test]
    fn analyze_empty_series_is_none() {
        assert!(analyze(&TrendConfig::default(), "U-001", &[], 7).is_none());
    }

    #[test]
    fn analyze_single_point_reports_unknown_trend() {
        let analysis = analyze(&TrendConfig::default(), "U-001", &series(&[7.0]), 7)
            .expect("single point is data, not an error");
        assert_eq!(analysis.trend.direction, TrendDirection::Unknown);
        assert!(analysis.trend.forecast.is_empty());
        assert_eq!(analysis.statistics.std, 0.0);
    }
}
