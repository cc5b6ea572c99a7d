//! IQR outlier detection.

use super::distribution::{percentile_sorted, sorted};
use crate::config::{IQR_MULTIPLIER, MIN_OUTLIER_SAMPLES};
use serde::Serialize;

/// Inclusive range outside of which a value is an outlier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
    pub iqr: f64,
}

/// Result of the IQR rule over a sample.
///
/// With fewer than four values no bounds are computed and the outlier list
/// is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutlierAnalysis {
    /// Outlying values in input order
    pub outliers: Vec<f64>,
    pub outlier_count: usize,
    pub outlier_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<OutlierBounds>,
}

/// Flags values outside [Q1 - 1.5·IQR, Q3 + 1.5·IQR].
pub fn detect_outliers(values: &[f64]) -> OutlierAnalysis {
    if values.len() < MIN_OUTLIER_SAMPLES {
        tracing::debug!(
            required = MIN_OUTLIER_SAMPLES,
            available = values.len(),
            "too few values for outlier analysis"
        );
        return OutlierAnalysis::default();
    }

    let s = sorted(values);
    let (Some(q1), Some(q3)) = (percentile_sorted(&s, 25.0), percentile_sorted(&s, 75.0)) else {
        return OutlierAnalysis::default();
    };
    let iqr = q3 - q1;
    let bounds = OutlierBounds {
        lower: q1 - IQR_MULTIPLIER * iqr,
        upper: q3 + IQR_MULTIPLIER * iqr,
        iqr,
    };

    let outliers: Vec<f64> = values
        .iter()
        .copied()
        .filter(|&v| v < bounds.lower || v > bounds.upper)
        .collect();
    let outlier_count = outliers.len();

    OutlierAnalysis {
        outliers,
        outlier_count,
        outlier_percentage: outlier_count as f64 / values.len() as f64 * 100.0,
        bounds: Some(bounds),
    }
}
