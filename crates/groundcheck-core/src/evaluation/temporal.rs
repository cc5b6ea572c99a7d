//! Timing-error analysis against the nearest same-class ground truth.
//!
//! Unlike [`super::matching`], pairing here is non-exclusive and ignores the
//! tolerance window: every detection is compared with the closest ground-truth
//! object of its class, even if another detection already matched it. The
//! tolerance is only used to report the share of detections that land inside
//! the window.

use crate::stats::distribution::{mean, median, std_dev};
use crate::types::{DetectionEvent, GroundTruthObject};
use serde::Serialize;
use std::collections::HashMap;

/// Summary of per-detection timing errors, in milliseconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TemporalMetrics {
    pub mean_timing_error_ms: f64,
    pub std_timing_error_ms: f64,
    pub max_timing_error_ms: f64,
    pub min_timing_error_ms: f64,
    pub median_timing_error_ms: f64,
    /// Share of all detections whose error is within tolerance, in percent
    pub within_tolerance_percentage: f64,
    /// Detections that had at least one same-class ground-truth object
    pub paired_detections: usize,
    pub total_detections: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TemporalAnalyzer {
    tolerance_ms: f64,
}

impl TemporalAnalyzer {
    pub fn new(tolerance_ms: f64) -> Self {
        Self { tolerance_ms }
    }

    /// Absolute error (ms) to the nearest same-class ground truth, per detection.
    ///
    /// `None` when no ground truth shares the detection's class. Ties go to
    /// the ground-truth object listed first.
    pub fn timing_errors(
        &self,
        detections: &[DetectionEvent],
        ground_truth: &[GroundTruthObject],
    ) -> Vec<Option<f64>> {
        let mut by_class: HashMap<&str, Vec<f64>> = HashMap::new();
        for gt in ground_truth {
            by_class
                .entry(gt.class_label.as_str())
                .or_default()
                .push(gt.timestamp);
        }

        detections
            .iter()
            .map(|det| {
                let candidates = by_class.get(det.class_label.as_str())?;
                let mut best: Option<f64> = None;
                for &t in candidates {
                    let diff = (det.timestamp - t).abs();
                    if best.is_none_or(|b| diff < b) {
                        best = Some(diff);
                    }
                }
                best.map(|secs| secs * 1000.0)
            })
            .collect()
    }

    /// Summarizes timing errors. All fields are 0.0 when nothing can be paired.
    pub fn analyze(
        &self,
        detections: &[DetectionEvent],
        ground_truth: &[GroundTruthObject],
    ) -> TemporalMetrics {
        let errors: Vec<f64> = self
            .timing_errors(detections, ground_truth)
            .into_iter()
            .flatten()
            .collect();

        if errors.is_empty() {
            return TemporalMetrics {
                total_detections: detections.len(),
                ..Default::default()
            };
        }

        let within = errors.iter().filter(|&&e| e <= self.tolerance_ms).count();

        TemporalMetrics {
            mean_timing_error_ms: mean(&errors),
            std_timing_error_ms: std_dev(&errors),
            max_timing_error_ms: errors.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min_timing_error_ms: errors.iter().copied().fold(f64::INFINITY, f64::min),
            median_timing_error_ms: median(&errors),
            within_tolerance_percentage: within as f64 / detections.len() as f64 * 100.0,
            paired_detections: errors.len(),
            total_detections: detections.len(),
        }
    }
}
