use serde::{Deserialize, Serialize};

use crate::error::McError;
use crate::McResult;

/// Percentile levels reported for every outcome distribution.
pub const PERCENTILE_LEVELS: [f64; 9] = [1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0];

/// Nine-point percentile summary of an outcome distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    #[serde(rename = "P1")]
    pub p1: f64,
    #[serde(rename = "P5")]
    pub p5: f64,
    #[serde(rename = "P10")]
    pub p10: f64,
    #[serde(rename = "P25")]
    pub p25: f64,
    #[serde(rename = "P50")]
    pub p50: f64,
    #[serde(rename = "P75")]
    pub p75: f64,
    #[serde(rename = "P90")]
    pub p90: f64,
    #[serde(rename = "P95")]
    pub p95: f64,
    #[serde(rename = "P99")]
    pub p99: f64,
}

impl Percentiles {
    /// Percentiles of an ascending-sorted, non-empty slice.
    pub fn from_sorted(sorted: &[f64]) -> Self {
        let [p1, p5, p10, p25, p50, p75, p90, p95, p99] =
            PERCENTILE_LEVELS.map(|p| percentile_sorted(sorted, p));
        Percentiles {
            p1,
            p5,
            p10,
            p25,
            p50,
            p75,
            p90,
            p95,
            p99,
        }
    }
}

/// Descriptive statistics over an outcome vector.
///
/// `std` and `variance` are population moments; `skewness` and `kurtosis`
/// are the biased moment estimators (kurtosis is excess, normal = 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Compute the percentile value from a **sorted** slice using linear interpolation.
/// An empty slice yields NaN.
pub(crate) fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted {
        [] => return f64::NAN,
        [only] => return *only,
        _ => {}
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

pub(crate) fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Compute descriptive statistics and percentiles for a non-empty slice.
pub fn describe(values: &[f64]) -> McResult<(SummaryStatistics, Percentiles)> {
    if values.is_empty() {
        return Err(McError::invalid("outcomes", "at least one value is required"));
    }
    let sorted = sorted_copy(values);
    let n = sorted.len() as f64;

    let mean = mean(&sorted);
    let median = percentile_sorted(&sorted, 50.0);

    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    let (skewness, kurtosis) = if std > f64::EPSILON * mean.abs().max(1.0) {
        let m3 = sorted.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
        let m4 = sorted.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n;
        (m3 / variance.powf(1.5), m4 / (variance * variance) - 3.0)
    } else {
        (0.0, 0.0)
    };

    let stats = SummaryStatistics {
        mean,
        median,
        std,
        variance,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        skewness,
        kurtosis,
    };
    Ok((stats, Percentiles::from_sorted(&sorted)))
}

/// Two-sided empirical interval holding `confidence_level` of the outcomes.
///
/// Returns the `(1 - level) / 2` and `1 - (1 - level) / 2` quantiles,
/// interpolating linearly between order statistics.
pub fn confidence_interval(outcomes: &[f64], confidence_level: f64) -> McResult<(f64, f64)> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(McError::invalid(
            "confidence_level",
            format!("must be strictly between 0 and 1, got {confidence_level}"),
        ));
    }
    if outcomes.is_empty() {
        return Err(McError::invalid("outcomes", "at least one value is required"));
    }
    let sorted = sorted_copy(outcomes);
    let alpha = 1.0 - confidence_level;
    let lower = percentile_sorted(&sorted, alpha / 2.0 * 100.0);
    let upper = percentile_sorted(&sorted, (1.0 - alpha / 2.0) * 100.0);
    Ok((lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slice_gives_nan() {
        assert!(percentile_sorted(&[], 50.0).is_nan());
        assert!(Percentiles::from_sorted(&[]).p99.is_nan());
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(percentile_sorted(&sorted, 100.0), 4.0);
        assert!((percentile_sorted(&sorted, 50.0) - 2.5).abs() < 1e-12);
        // rank = 0.25 * 3 = 0.75
        assert!((percentile_sorted(&sorted, 25.0) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_describe_known_values() {
        let (s, p) = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.variance - 4.0).abs() < 1e-12);
        assert!((s.std - 2.0).abs() < 1e-12);
        assert_eq!(s.median, 4.5);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert!(s.skewness > 0.0);
        assert_eq!(p.p50, s.median);
    }

    #[test]
    fn test_describe_unsorted_input() {
        let (s, _) = describe(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(s.median, 2.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
    }

    #[test]
    fn test_constant_series_has_zero_shape() {
        let (s, p) = describe(&[7.0; 10]).unwrap();
        assert_eq!(s.std, 0.0);
        assert_eq!(s.skewness, 0.0);
        assert_eq!(s.kurtosis, 0.0);
        assert!((p.p1 - 7.0).abs() < 1e-12);
        assert!((p.p99 - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_series_zero_skew() {
        let (s, _) = describe(&[-2.0, -1.0, 0.0, 1.0, 2.0]).unwrap();
        assert!(s.skewness.abs() < 1e-12);
        // Discrete uniform on five points: m4/m2^2 = 6.8/4 = 1.7
        assert!((s.kurtosis - (1.7 - 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_describe_empty_rejected() {
        assert!(describe(&[]).is_err());
    }

    #[test]
    fn test_percentile_ordering() {
        let values: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 1000) as f64).collect();
        let (_, p) = describe(&values).unwrap();
        let ordered = [p.p1, p.p5, p.p10, p.p25, p.p50, p.p75, p.p90, p.p95, p.p99];
        assert!(ordered.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_confidence_interval_containment() {
        let outcomes = [5.0, -3.0, 12.0, 0.5, 8.0, 1.0];
        let (lo, hi) = confidence_interval(&outcomes, 0.95).unwrap();
        assert!(lo <= hi);
        assert!(lo >= -3.0 && hi <= 12.0);
    }

    #[test]
    fn test_confidence_interval_quantiles() {
        let outcomes: Vec<f64> = (0..=100).map(f64::from).collect();
        let (lo, hi) = confidence_interval(&outcomes, 0.90).unwrap();
        assert!((lo - 5.0).abs() < 1e-9, "lo={lo}");
        assert!((hi - 95.0).abs() < 1e-9, "hi={hi}");
    }

    #[test]
    fn test_confidence_interval_single_value() {
        assert_eq!(confidence_interval(&[4.2], 0.5).unwrap(), (4.2, 4.2));
    }

    #[test]
    fn test_confidence_level_bounds() {
        assert!(confidence_interval(&[1.0, 2.0], 0.0).is_err());
        assert!(confidence_interval(&[1.0, 2.0], 1.0).is_err());
        assert!(confidence_interval(&[1.0, 2.0], f64::NAN).is_err());
        assert!(confidence_interval(&[], 0.95).is_err());
    }
}
