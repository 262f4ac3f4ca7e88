//! Statistics primitives shared by the scoring, anomaly, and trend paths
//!
//! Every function is total: degenerate inputs (empty, single element,
//! zero spread) return documented fallbacks instead of NaN. Callers that
//! divide by a standard deviation substitute 1.0 for a zero result.

/// Arithmetic mean. Empty input yields 0.0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (N denominator). Empty or single-element
/// input yields 0.0.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Sample standard deviation (N-1 denominator), used where the values are
/// a sample of a longer history. Fewer than 2 elements yields 0.0.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Clip every value into `[quantile(p), quantile(1-p)]` of the input.
///
/// Length and order are preserved. `p` is a fraction in [0, 0.5); `p = 0`
/// is the identity. Empty or single-element input is returned unchanged.
pub fn winsorize(values: &[f64], percentile: f64) -> Vec<f64> {
    if values.len() < 2 || percentile <= 0.0 {
        return values.to_vec();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = values.len();
    let lower_idx = ((n as f64) * percentile).floor() as usize;
    let upper_idx = ((n as f64) * (1.0 - percentile)).ceil() as usize;
    let lower = sorted[lower_idx.min(n - 1)];
    let upper = sorted[upper_idx.min(n - 1)];

    values.iter().map(|v| v.clamp(lower, upper)).collect()
}

/// Map values into [0,1] using provided or data-derived bounds.
///
/// A degenerate range (`max == min`, e.g. a constant series) maps every
/// value to 0.5: no information, but no division by zero either.
pub fn min_max_normalize(values: &[f64], min: Option<f64>, max: Option<f64>) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let lo = min.unwrap_or_else(|| values.iter().copied().fold(f64::INFINITY, f64::min));
    let hi = max.unwrap_or_else(|| values.iter().copied().fold(f64::NEG_INFINITY, f64::max));

    if hi == lo {
        return vec![0.5; values.len()];
    }
    values
        .iter()
        .map(|v| ((v - lo) / (hi - lo)).clamp(0.0, 1.0))
        .collect()
}

/// Winsorize-then-min-max pipeline for preparing a raw signal series.
pub fn normalize_signal(values: &[f64], winsorize_percentile: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let clipped = winsorize(values, winsorize_percentile);
    min_max_normalize(&clipped, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn mean_basic() {
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn std_dev_population_denominator() {
        // Population std of [2,4,4,4,5,5,7,9] is exactly 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn std_dev_of_single_element_is_zero() {
        assert_eq!(std_dev(&[42.0]), 0.0);
    }

    #[test]
    fn sample_std_dev_uses_n_minus_one() {
        let values = [1.0, 3.0];
        // mean 2, squared deviations 1+1, /(n-1)=2, sqrt ~1.414
        assert!((sample_std_dev(&values) - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn winsorize_preserves_length_and_order() {
        // 0..19 with the extremes swapped to the front
        let mut values: Vec<f64> = (0..20).map(f64::from).collect();
        values.swap(0, 19);
        let clipped = winsorize(&values, 0.1);
        assert_eq!(clipped.len(), values.len());
        // lower bound sorted[2] = 2, upper bound sorted[18] = 18
        assert_eq!(clipped[0], 18.0);
        assert_eq!(clipped[19], 2.0);
        // Interior values untouched, order preserved
        assert_eq!(clipped[5], values[5]);
        assert_eq!(clipped[10], values[10]);
    }

    #[test]
    fn winsorize_zero_percentile_is_identity() {
        let values = [5.0, 1.0, 9.0];
        assert_eq!(winsorize(&values, 0.0), values.to_vec());
    }

    #[test]
    fn winsorize_degenerate_inputs_unchanged() {
        assert!(winsorize(&[], 0.05).is_empty());
        assert_eq!(winsorize(&[7.0], 0.05), vec![7.0]);
    }

    #[test]
    fn winsorize_output_within_quantile_bounds() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let clipped = winsorize(&values, 0.05);
        let lo = clipped.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = clipped.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(lo >= 5.0);
        assert!(hi <= 95.0);
    }

    #[test]
    fn min_max_output_in_unit_interval() {
        let values = [-3.0, 0.0, 10.0, 4.0];
        let normalized = min_max_normalize(&values, None, None);
        assert!(normalized.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(normalized[0], 0.0);
        assert_eq!(normalized[2], 1.0);
    }

    #[test]
    fn min_max_constant_input_is_half() {
        let normalized = min_max_normalize(&[3.0, 3.0, 3.0], None, None);
        assert_eq!(normalized, vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn min_max_with_explicit_bounds_clamps() {
        let normalized = min_max_normalize(&[-5.0, 5.0, 15.0], Some(0.0), Some(10.0));
        assert_eq!(normalized, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn normalize_signal_pipeline() {
        let values = [1.0, 2.0, 3.0, 1000.0];
        let normalized = normalize_signal(&values, 0.25);
        assert_eq!(normalized.len(), 4);
        assert!(normalized.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
