//! Detection evaluation against ground truth.
//!
//! Two independent analyses run over the same inputs:
//!
//! | Analysis | Pairing rule | Output |
//! |----------|--------------|--------|
//! | [`DetectionMatcher`] | first-fit, one-to-one, within tolerance, same class | [`PerformanceMetrics`] |
//! | [`TemporalAnalyzer`] | nearest same-class, non-exclusive, any distance | [`TemporalMetrics`] |
//!
//! The two pairing rules differ on purpose: confusion counts and timing
//! error must stay comparable with previously published scorecards.
//!
//! # Example
//!
//! ```
//! use groundcheck_core::evaluation::{DetectionMatcher, TemporalAnalyzer};
//! use groundcheck_core::types::{DetectionEvent, GroundTruthObject};
//!
//! let detections = vec![DetectionEvent::new("d1", 1.00, "person", 0.92)];
//! let ground_truth = vec![GroundTruthObject::new("g1", 1.02, "person")];
//!
//! let metrics = DetectionMatcher::new(100.0).calculate_metrics(&detections, &ground_truth);
//! assert_eq!(metrics.true_positives, 1);
//!
//! let timing = TemporalAnalyzer::new(100.0).analyze(&detections, &ground_truth);
//! assert!((timing.mean_timing_error_ms - 20.0).abs() < 1e-6);
//! ```

pub mod matching;
pub mod temporal;

pub use matching::{DetectionMatcher, MatchOutcome, PerformanceMetrics};
pub use temporal::{TemporalAnalyzer, TemporalMetrics};
