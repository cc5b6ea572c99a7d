//! Design constants and runtime configuration.
//!
//! The constants in this module are fixed by the validation policy: reports
//! produced with different values would not be comparable with earlier runs.
//! Only [`ValidationConfig`] is meant to be overridden by callers.
//!
//! # Usage
//!
//! ```
//! use groundcheck_core::config::{ValidationConfig, MAX_TOLERANCE_MS};
//!
//! let config = ValidationConfig::default();
//! assert!(config.base_tolerance_ms <= MAX_TOLERANCE_MS);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Tolerance
// =============================================================================

/// Tolerance used when no history is available (milliseconds).
pub const DEFAULT_BASE_TOLERANCE_MS: f64 = 100.0;

/// Lower clamp for adaptively derived tolerances (milliseconds).
pub const MIN_TOLERANCE_MS: f64 = 50.0;

/// Upper clamp for adaptively derived tolerances (milliseconds).
pub const MAX_TOLERANCE_MS: f64 = 500.0;

/// Number of standard deviations added to the mean historical latency.
///
/// Under a normal approximation, mean + 2σ covers roughly 95% of latencies.
pub const TOLERANCE_SIGMA_MULTIPLIER: f64 = 2.0;

// =============================================================================
// Statistics
// =============================================================================

/// Default confidence level for t-distribution intervals.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Whisker length for the IQR outlier rule.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Slopes within (-x, x) are classified as "stable".
pub const TREND_SLOPE_THRESHOLD: f64 = 0.01;

/// Minimum sample counts per statistical section.
pub const MIN_DISTRIBUTION_SAMPLES: usize = 1;
pub const MIN_TEMPORAL_SAMPLES: usize = 2;
pub const MIN_OUTLIER_SAMPLES: usize = 4;
pub const MIN_TREND_SAMPLES: usize = 3;
pub const MIN_INTERVAL_SAMPLES: usize = 2;

// =============================================================================
// Report ratings
// =============================================================================

/// Accuracy rating buckets, checked top-down.
pub const ACCURACY_EXCELLENT: f64 = 0.95;
pub const ACCURACY_VERY_GOOD: f64 = 0.90;
pub const ACCURACY_GOOD: f64 = 0.80;
pub const ACCURACY_FAIR: f64 = 0.70;

/// |precision - recall| at or above this is reported as imbalanced.
pub const BALANCE_THRESHOLD: f64 = 0.1;

/// Timing standard deviation (ms) below which consistency is "high".
pub const CONSISTENCY_HIGH_STD_MS: f64 = 20.0;

/// Timing standard deviation (ms) below which consistency is "medium".
pub const CONSISTENCY_MEDIUM_STD_MS: f64 = 50.0;

/// FN above this fraction of TP counts as significant missed detections.
pub const MISSED_DETECTION_RATIO: f64 = 0.3;

/// Precision above this with recall below [`CONSERVATIVE_RECALL`] is conservative.
pub const CONSERVATIVE_PRECISION: f64 = 0.95;
pub const CONSERVATIVE_RECALL: f64 = 0.80;

/// Recall above this with precision below [`AGGRESSIVE_PRECISION`] is aggressive.
pub const AGGRESSIVE_RECALL: f64 = 0.95;
pub const AGGRESSIVE_PRECISION: f64 = 0.80;

/// Strength/weakness cut-offs for precision, recall and F1.
pub const STRONG_METRIC: f64 = 0.90;
pub const WEAK_METRIC: f64 = 0.80;

/// Within-tolerance percentage below which timing is reported as a weakness.
pub const WEAK_WITHIN_TOLERANCE_PCT: f64 = 80.0;

/// Within-tolerance percentage at or above which timing is reported as a strength.
pub const STRONG_WITHIN_TOLERANCE_PCT: f64 = 95.0;

/// Outlier percentage above which confidence scores are flagged.
pub const OUTLIER_PCT_WARNING: f64 = 10.0;

/// Mean confidence below which scores are reported as low.
pub const LOW_MEAN_CONFIDENCE: f64 = 0.5;

// =============================================================================
// Runtime configuration
// =============================================================================

/// Invalid runtime configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("base tolerance {0} ms is outside [50, 500]")]
    BaseToleranceOutOfRange(f64),
    #[error("confidence level {0} must be strictly between 0 and 1")]
    ConfidenceLevelOutOfRange(f64),
}

/// Caller-tunable settings for a validation workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Tolerance returned when no latency history is available.
    pub base_tolerance_ms: f64,
    /// Confidence level for the interval estimate of mean confidence.
    pub confidence_level: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            base_tolerance_ms: DEFAULT_BASE_TOLERANCE_MS,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        }
    }
}

impl ValidationConfig {
    /// Checks that every value lies in its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TOLERANCE_MS..=MAX_TOLERANCE_MS).contains(&self.base_tolerance_ms) {
            return Err(ConfigError::BaseToleranceOutOfRange(self.base_tolerance_ms));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigError::ConfidenceLevelOutOfRange(self.confidence_level));
        }
        Ok(())
    }
}
