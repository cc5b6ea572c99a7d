//! Linear trend of a value series against time.

use super::distribution::mean;
use crate::config::{MIN_TREND_SAMPLES, TREND_SLOPE_THRESHOLD};
use crate::stats::Section;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    /// Classifies a regression slope.
    pub fn from_slope(slope: f64) -> Self {
        if slope > TREND_SLOPE_THRESHOLD {
            TrendDirection::Increasing
        } else if slope < -TREND_SLOPE_THRESHOLD {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    /// Pearson correlation between normalized time and value
    pub correlation: f64,
    /// Least-squares slope (value units per second)
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub direction: TrendDirection,
    /// |correlation|
    pub strength: f64,
    pub sample_count: usize,
}

/// Fits `values` against `timestamps` shifted so the earliest is zero.
///
/// Needs at least three pairs of equal-length input. Degenerate series
/// (constant time or constant value) report a correlation of 0.
pub fn analyze_trend(timestamps: &[f64], values: &[f64]) -> Section<TrendAnalysis> {
    if timestamps.len() != values.len() {
        tracing::debug!(
            timestamps = timestamps.len(),
            values = values.len(),
            "trend input lengths differ"
        );
        return Section::Insufficient {
            required: MIN_TREND_SAMPLES,
            available: timestamps.len().min(values.len()),
        };
    }

    Section::require(MIN_TREND_SAMPLES, values.len(), || {
        let t0 = timestamps.iter().copied().fold(f64::INFINITY, f64::min);
        let x: Vec<f64> = timestamps.iter().map(|t| t - t0).collect();

        let mean_x = mean(&x);
        let mean_y = mean(values);

        let mut sxx = 0.0;
        let mut syy = 0.0;
        let mut sxy = 0.0;
        for (xi, yi) in x.iter().zip(values) {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }

        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = mean_y - slope * mean_x;
        let correlation = if sxx > 0.0 && syy > 0.0 {
            (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        TrendAnalysis {
            correlation,
            slope,
            intercept,
            r_squared: correlation * correlation,
            direction: TrendDirection::from_slope(slope),
            strength: correlation.abs(),
            sample_count: values.len(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_increasing_trend() {
        let ts = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let trend = analyze_trend(&ts, &ts).into_computed().unwrap();

        assert!((trend.correlation - 1.0).abs() < 1e-9);
        assert!((trend.slope - 1.0).abs() < 1e-9);
        assert!(trend.intercept.abs() < 1e-9);
        assert_eq!(trend.direction, TrendDirection::Increasing);
        assert!((trend.strength - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_timestamps_are_normalized() {
        let ts = [100.0, 101.0, 102.0];
        let values = [0.9, 0.7, 0.5];
        let trend = analyze_trend(&ts, &values).into_computed().unwrap();

        assert!((trend.slope + 0.2).abs() < 1e-9);
        assert!((trend.intercept - 0.9).abs() < 1e-9);
        assert_eq!(trend.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_small_slope_is_stable() {
        let ts = [0.0, 1.0, 2.0, 3.0];
        let values = [0.800, 0.805, 0.810, 0.815];
        let trend = analyze_trend(&ts, &values).into_computed().unwrap();

        assert!(trend.slope < TREND_SLOPE_THRESHOLD);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_constant_values_have_zero_correlation() {
        let trend = analyze_trend(&[0.0, 1.0, 2.0], &[0.5, 0.5, 0.5])
            .into_computed()
            .unwrap();
        assert_eq!(trend.correlation, 0.0);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_requires_three_equal_length_pairs() {
        assert!(!analyze_trend(&[0.0, 1.0], &[0.0, 1.0]).is_computed());
        assert!(!analyze_trend(&[0.0, 1.0, 2.0], &[0.0, 1.0]).is_computed());
    }
}
