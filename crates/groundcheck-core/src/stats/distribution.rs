//! Descriptive statistics over numeric samples.
//!
//! Standard deviations here are population deviations (divide by n), which
//! is what the moment-based shape statistics are defined against.

use crate::config::{MIN_DISTRIBUTION_SAMPLES, MIN_TEMPORAL_SAMPLES};
use crate::stats::Section;
use serde::Serialize;
use std::cmp::Ordering;

/// 25th, 50th and 75th percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Summary of a sample's location, spread and shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub quartiles: Quartiles,
    /// Third standardized moment (0 when n < 3 or σ = 0)
    pub skewness: f64,
    /// Excess kurtosis (0 when n < 4 or σ = 0)
    pub kurtosis: f64,
}

/// Rate and clustering of detections over time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalDistribution {
    /// Detections per second over the observed span (0 when the span is 0)
    pub detection_rate: f64,
    pub time_span: f64,
    /// Statistics over gaps between consecutive sorted timestamps
    pub interval_stats: DistributionStats,
    pub temporal_clustering: TemporalClustering,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalClustering {
    pub cluster_count: usize,
    /// Detections per cluster
    pub cluster_density: f64,
    /// A gap larger than this starts a new cluster
    pub gap_threshold: f64,
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    let var = values.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Sample standard deviation (divide by n - 1); 0.0 for fewer than 2 values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mu = mean(values);
    let var = values.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Returns a sorted copy with NaNs ordered last.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Linear-interpolated percentile of an already sorted slice.
///
/// `pct` is in [0, 100]. Returns `None` for an empty slice.
pub fn percentile_sorted(sorted_values: &[f64], pct: f64) -> Option<f64> {
    if sorted_values.is_empty() || !pct.is_finite() {
        return None;
    }
    if sorted_values.len() == 1 {
        return Some(sorted_values[0]);
    }
    let p = (pct / 100.0).clamp(0.0, 1.0);
    let pos = p * (sorted_values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    let (low, high) = (sorted_values[lo], sorted_values[hi]);
    Some(low + (high - low) * frac)
}

/// Median; 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    percentile_sorted(&sorted(values), 50.0).unwrap_or(0.0)
}

/// Third standardized moment: mean((x-μ)³) / σ³.
pub fn skewness(values: &[f64]) -> f64 {
    standardized_moment(values, 3, 3).unwrap_or(0.0)
}

/// Excess kurtosis: mean((x-μ)⁴) / σ⁴ - 3.
pub fn kurtosis(values: &[f64]) -> f64 {
    standardized_moment(values, 4, 4)
        .map(|m| m - 3.0)
        .unwrap_or(0.0)
}

fn standardized_moment(values: &[f64], order: i32, min_samples: usize) -> Option<f64> {
    if values.len() < min_samples {
        return None;
    }
    let sigma = std_dev(values);
    if sigma == 0.0 {
        return None;
    }
    let mu = mean(values);
    let moment = values.iter().map(|x| (x - mu).powi(order)).sum::<f64>() / values.len() as f64;
    Some(moment / sigma.powi(order))
}

/// Full distribution summary; `Insufficient` for an empty sample.
pub fn describe(values: &[f64]) -> Section<DistributionStats> {
    Section::require(MIN_DISTRIBUTION_SAMPLES, values.len(), || {
        let s = sorted(values);
        let q = |pct| percentile_sorted(&s, pct).unwrap_or(0.0);
        let quartiles = Quartiles {
            q1: q(25.0),
            q2: q(50.0),
            q3: q(75.0),
        };
        DistributionStats {
            count: values.len(),
            mean: mean(values),
            median: quartiles.q2,
            std: std_dev(values),
            min: s[0],
            max: s[s.len() - 1],
            quartiles,
            skewness: skewness(values),
            kurtosis: kurtosis(values),
        }
    })
}

/// Detection rate, gap statistics and clustering over timestamps.
///
/// A gap greater than mean(gaps) + std(gaps) starts a new cluster.
pub fn temporal_distribution(timestamps: &[f64]) -> Section<TemporalDistribution> {
    Section::require(MIN_TEMPORAL_SAMPLES, timestamps.len(), || {
        let ordered = sorted(timestamps);
        let gaps: Vec<f64> = ordered.windows(2).map(|w| w[1] - w[0]).collect();
        let span = ordered[ordered.len() - 1] - ordered[0];
        let detection_rate = if span > 0.0 {
            timestamps.len() as f64 / span
        } else {
            0.0
        };

        let gap_threshold = mean(&gaps) + std_dev(&gaps);
        let cluster_count = 1 + gaps.iter().filter(|&&g| g > gap_threshold).count();

        // `gaps` is non-empty here, so describe() always computes.
        let interval_stats = describe(&gaps)
            .into_computed()
            .unwrap_or_else(|| empty_stats(gaps.len()));

        TemporalDistribution {
            detection_rate,
            time_span: span,
            interval_stats,
            temporal_clustering: TemporalClustering {
                cluster_count,
                cluster_density: timestamps.len() as f64 / cluster_count as f64,
                gap_threshold,
            },
        }
    })
}

fn empty_stats(count: usize) -> DistributionStats {
    DistributionStats {
        count,
        mean: 0.0,
        median: 0.0,
        std: 0.0,
        min: 0.0,
        max: 0.0,
        quartiles: Quartiles {
            q1: 0.0,
            q2: 0.0,
            q3: 0.0,
        },
        skewness: 0.0,
        kurtosis: 0.0,
    }
}
