//! Statistical analysis of detection confidences and timing.
//!
//! Every routine here is pure and operates on in-memory samples already
//! extracted from detections. Sections that need more samples than are
//! available come back as [`Section::Insufficient`] rather than as errors.
//!
//! | Section | Input | Minimum samples |
//! |---------|-------|-----------------|
//! | Distribution | confidences | 1 |
//! | Temporal distribution | timestamps | 2 |
//! | Outliers (IQR) | confidences | 4 |
//! | Trend | (timestamp, confidence) pairs | 3 |
//! | Confidence interval | confidences | 2 |
//!
//! # Example
//!
//! ```
//! use groundcheck_core::stats::StatisticalAnalyzer;
//!
//! let analyzer = StatisticalAnalyzer::default();
//! let results = analyzer.analyze(&[0.9, 0.8, 0.85], &[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
//! assert!(results.confidence_intervals.confidence.is_computed());
//! ```

pub mod distribution;
pub mod interval;
pub mod outliers;
pub mod section;
pub mod student_t;
pub mod trend;

pub use distribution::{describe, temporal_distribution, DistributionStats, TemporalDistribution};
pub use interval::{confidence_interval, ConfidenceInterval};
pub use outliers::{detect_outliers, OutlierAnalysis};
pub use section::Section;
pub use trend::{analyze_trend, TrendAnalysis, TrendDirection};

use crate::config::DEFAULT_CONFIDENCE_LEVEL;
use serde::Serialize;
use tracing::{debug, warn};

/// Interval estimates keyed by the quantity they describe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceIntervals {
    pub confidence: Section<ConfidenceInterval>,
}

/// Distribution summaries keyed by the quantity they describe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionReport {
    pub confidence: Section<DistributionStats>,
    pub temporal: Section<TemporalDistribution>,
}

/// All statistical sections for one validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticalResults {
    pub confidence_intervals: ConfidenceIntervals,
    pub distribution_stats: DistributionReport,
    pub outlier_analysis: OutlierAnalysis,
    pub trend_analysis: Section<TrendAnalysis>,
}

/// Computes [`StatisticalResults`] at a fixed confidence level.
#[derive(Debug, Clone, Copy)]
pub struct StatisticalAnalyzer {
    confidence_level: f64,
}

impl Default for StatisticalAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_LEVEL)
    }
}

impl StatisticalAnalyzer {
    pub fn new(confidence_level: f64) -> Self {
        Self { confidence_level }
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Runs every section.
    ///
    /// # Arguments
    ///
    /// * `confidences` - Confidence scores of scored detections
    /// * `timestamps` - Timestamps of all detections
    /// * `scored_timestamps` - Timestamps aligned with `confidences`, for the trend fit
    pub fn analyze(
        &self,
        confidences: &[f64],
        timestamps: &[f64],
        scored_timestamps: &[f64],
    ) -> StatisticalResults {
        let (scored_timestamps, trend_values) = finite_pairs(scored_timestamps, confidences);
        let confidences = finite(confidences, "confidence");
        let timestamps = finite(timestamps, "timestamp");

        debug!(
            confidences = confidences.len(),
            timestamps = timestamps.len(),
            "computing statistical sections"
        );

        StatisticalResults {
            confidence_intervals: ConfidenceIntervals {
                confidence: confidence_interval(&confidences, self.confidence_level),
            },
            distribution_stats: DistributionReport {
                confidence: describe(&confidences),
                temporal: temporal_distribution(&timestamps),
            },
            outlier_analysis: detect_outliers(&confidences),
            trend_analysis: analyze_trend(&scored_timestamps, &trend_values),
        }
    }
}

fn finite(values: &[f64], what: &str) -> Vec<f64> {
    let kept: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if kept.len() != values.len() {
        warn!(
            dropped = values.len() - kept.len(),
            what, "non-finite samples dropped before analysis"
        );
    }
    kept
}

// Pairs are dropped together so the trend inputs stay aligned. When the two
// inputs differ in length nothing is paired and the trend is skipped.
fn finite_pairs(timestamps: &[f64], values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    if timestamps.len() != values.len() {
        return (timestamps.to_vec(), values.to_vec());
    }
    timestamps
        .iter()
        .zip(values)
        .filter(|(t, v)| t.is_finite() && v.is_finite())
        .map(|(t, v)| (*t, *v))
        .unzip()
}
