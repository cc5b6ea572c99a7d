//! Greedy detection-to-ground-truth matching and confusion-matrix metrics.
//!
//! # Matching policy
//!
//! For each detection, in input order, ground-truth objects are scanned in
//! input order. The first unclaimed object with the same class label and a
//! timestamp within the tolerance window is claimed. Detections that claim
//! nothing are false positives; unclaimed ground truth are false negatives.
//!
//! This is first-fit, not nearest-fit and not an optimal assignment. Results
//! therefore depend on input order when several candidates are eligible.
//!
//! ```text
//! precision = TP / (TP + FP)
//! recall    = TP / (TP + FN)
//! f1        = 2PR / (P + R)
//! accuracy  = TP / |ground truth|
//! ```
//!
//! Any ratio with a zero denominator is 0.0.

use crate::types::{DetectionEvent, GroundTruthObject};
use serde::Serialize;
use std::collections::BTreeMap;

/// Confusion counts and the ratios derived from them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PerformanceMetrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub accuracy: f64,
}

impl PerformanceMetrics {
    /// Derives ratios from raw counts.
    pub fn from_counts(
        true_positives: usize,
        false_positives: usize,
        false_negatives: usize,
        ground_truth_count: usize,
    ) -> Self {
        let precision = ratio(true_positives, true_positives + false_positives);
        let recall = ratio(true_positives, true_positives + false_negatives);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            true_positives,
            false_positives,
            false_negatives,
            precision,
            recall,
            f1_score,
            accuracy: ratio(true_positives, ground_truth_count),
        }
    }
}

#[inline]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Outcome of one matching pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// For each detection, the index of the ground-truth object it claimed
    pub assignment: Vec<Option<usize>>,
    pub metrics: PerformanceMetrics,
    /// Metrics per class label, from the same assignment
    pub per_class: BTreeMap<String, PerformanceMetrics>,
}

/// Greedy first-fit matcher under a timing tolerance.
#[derive(Debug, Clone, Copy)]
pub struct DetectionMatcher {
    tolerance_ms: f64,
}

impl DetectionMatcher {
    pub fn new(tolerance_ms: f64) -> Self {
        Self { tolerance_ms }
    }

    pub fn tolerance_ms(&self) -> f64 {
        self.tolerance_ms
    }

    /// Returns the ground-truth index claimed by each detection.
    ///
    /// Each ground-truth object is claimed at most once.
    pub fn assign(
        &self,
        detections: &[DetectionEvent],
        ground_truth: &[GroundTruthObject],
    ) -> Vec<Option<usize>> {
        let window_secs = self.tolerance_ms / 1000.0;
        let mut claimed = vec![false; ground_truth.len()];

        detections
            .iter()
            .map(|det| {
                let hit = ground_truth.iter().enumerate().position(|(idx, gt)| {
                    !claimed[idx]
                        && (det.timestamp - gt.timestamp).abs() <= window_secs
                        && det.class_label == gt.class_label
                });
                if let Some(idx) = hit {
                    claimed[idx] = true;
                }
                hit
            })
            .collect()
    }

    /// Matches detections against ground truth and derives all metrics.
    pub fn match_detections(
        &self,
        detections: &[DetectionEvent],
        ground_truth: &[GroundTruthObject],
    ) -> MatchOutcome {
        let assignment = self.assign(detections, ground_truth);

        let true_positives = assignment.iter().filter(|a| a.is_some()).count();
        let false_positives = detections.len() - true_positives;
        let false_negatives = ground_truth.len() - true_positives;

        let metrics = PerformanceMetrics::from_counts(
            true_positives,
            false_positives,
            false_negatives,
            ground_truth.len(),
        );
        let per_class = per_class_metrics(detections, ground_truth, &assignment);

        MatchOutcome {
            assignment,
            metrics,
            per_class,
        }
    }

    /// Convenience wrapper returning only the aggregate metrics.
    pub fn calculate_metrics(
        &self,
        detections: &[DetectionEvent],
        ground_truth: &[GroundTruthObject],
    ) -> PerformanceMetrics {
        self.match_detections(detections, ground_truth).metrics
    }
}

#[derive(Default)]
struct ClassCounts {
    tp: usize,
    fp: usize,
    gt: usize,
}

fn per_class_metrics(
    detections: &[DetectionEvent],
    ground_truth: &[GroundTruthObject],
    assignment: &[Option<usize>],
) -> BTreeMap<String, PerformanceMetrics> {
    let mut counts: BTreeMap<&str, ClassCounts> = BTreeMap::new();

    for gt in ground_truth {
        counts.entry(gt.class_label.as_str()).or_default().gt += 1;
    }
    for (det, hit) in detections.iter().zip(assignment) {
        let entry = counts.entry(det.class_label.as_str()).or_default();
        if hit.is_some() {
            entry.tp += 1;
        } else {
            entry.fp += 1;
        }
    }

    counts
        .into_iter()
        .map(|(label, c)| {
            (
                label.to_string(),
                PerformanceMetrics::from_counts(c.tp, c.fp, c.gt - c.tp, c.gt),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(t: f64, class: &str) -> DetectionEvent {
        DetectionEvent::new(format!("d{}", t), t, class, 0.9)
    }

    fn gt(t: f64, class: &str) -> GroundTruthObject {
        GroundTruthObject::new(format!("g{}", t), t, class)
    }

    #[test]
    fn test_match_within_tolerance() {
        let m = DetectionMatcher::new(100.0)
            .calculate_metrics(&[det(1.00, "person")], &[gt(1.02, "person")]);

        assert_eq!(
            (m.true_positives, m.false_positives, m.false_negatives),
            (1, 0, 0)
        );
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
        assert_eq!(m.accuracy, 1.0);
    }

    #[test]
    fn test_no_match_outside_tolerance() {
        let m = DetectionMatcher::new(100.0)
            .calculate_metrics(&[det(1.00, "person")], &[gt(1.30, "person")]);

        assert_eq!(
            (m.true_positives, m.false_positives, m.false_negatives),
            (0, 1, 1)
        );
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
    }

    #[test]
    fn test_class_must_match() {
        let m = DetectionMatcher::new(100.0)
            .calculate_metrics(&[det(1.0, "car")], &[gt(1.0, "person")]);
        assert_eq!(m.true_positives, 0);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.false_negatives, 1);
    }

    #[test]
    fn test_first_fit_not_closest() {
        // Both ground-truth objects are in range; the first listed is claimed
        // even though the second is closer.
        let matcher = DetectionMatcher::new(100.0);
        let assignment = matcher.assign(
            &[det(1.05, "person")],
            &[gt(0.98, "person"), gt(1.05, "person")],
        );
        assert_eq!(assignment, vec![Some(0)]);
    }

    #[test]
    fn test_order_dependence() {
        // The first detection steals the only object the second could match.
        let matcher = DetectionMatcher::new(100.0);
        let gts = [gt(1.00, "person"), gt(1.15, "person")];

        let forward = matcher.assign(&[det(1.08, "person"), det(0.95, "person")], &gts);
        assert_eq!(forward, vec![Some(0), None]);

        let reversed = matcher.assign(&[det(0.95, "person"), det(1.08, "person")], &gts);
        assert_eq!(reversed, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_each_ground_truth_claimed_once() {
        let m = DetectionMatcher::new(100.0).calculate_metrics(
            &[det(1.0, "person"), det(1.0, "person"), det(1.0, "person")],
            &[gt(1.0, "person")],
        );
        assert_eq!(m.true_positives, 1);
        assert_eq!(m.false_positives, 2);
        assert!((m.precision - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_detections() {
        let m = DetectionMatcher::new(100.0)
            .calculate_metrics(&[], &[gt(1.0, "person"), gt(2.0, "car")]);

        assert_eq!(m.true_positives, 0);
        assert_eq!(m.false_negatives, 2);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
        assert_eq!(m.accuracy, 0.0);
    }

    #[test]
    fn test_empty_ground_truth() {
        let m = DetectionMatcher::new(100.0).calculate_metrics(&[det(1.0, "person")], &[]);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.recall, 0.0);
    }

    #[test]
    fn test_counts_invariants_hold() {
        let dets: Vec<_> = (0..20)
            .map(|i| det(i as f64 * 0.37, if i % 3 == 0 { "car" } else { "person" }))
            .collect();
        let gts: Vec<_> = (0..15)
            .map(|i| gt(i as f64 * 0.41, if i % 2 == 0 { "car" } else { "person" }))
            .collect();

        for tol in [50.0, 100.0, 250.0, 500.0] {
            let m = DetectionMatcher::new(tol).calculate_metrics(&dets, &gts);
            assert_eq!(m.true_positives + m.false_negatives, gts.len());
            assert_eq!(m.true_positives + m.false_positives, dets.len());
            assert!(m.true_positives <= dets.len().min(gts.len()));
            for v in [m.precision, m.recall, m.f1_score, m.accuracy] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_per_class_breakdown() {
        let outcome = DetectionMatcher::new(100.0).match_detections(
            &[det(1.0, "person"), det(2.0, "car"), det(3.0, "dog")],
            &[gt(1.0, "person"), gt(2.5, "car"), gt(4.0, "person")],
        );

        let person = &outcome.per_class["person"];
        assert_eq!(
            (person.true_positives, person.false_positives, person.false_negatives),
            (1, 0, 1)
        );
        let car = &outcome.per_class["car"];
        assert_eq!(
            (car.true_positives, car.false_positives, car.false_negatives),
            (0, 1, 1)
        );
        let dog = &outcome.per_class["dog"];
        assert_eq!((dog.false_positives, dog.false_negatives), (1, 0));
        assert_eq!(dog.accuracy, 0.0);
    }
}
