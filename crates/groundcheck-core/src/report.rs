//! Narrative analysis of a validation run.
//!
//! Ratings and insight rules use the fixed thresholds in [`crate::config`].
//! Every list in [`DetailedAnalysis`] keeps first-seen order and holds each
//! message at most once.

use crate::config::{
    ACCURACY_EXCELLENT, ACCURACY_FAIR, ACCURACY_GOOD, ACCURACY_VERY_GOOD, AGGRESSIVE_PRECISION,
    AGGRESSIVE_RECALL, BALANCE_THRESHOLD, CONSERVATIVE_PRECISION, CONSERVATIVE_RECALL,
    CONSISTENCY_HIGH_STD_MS, CONSISTENCY_MEDIUM_STD_MS, LOW_MEAN_CONFIDENCE, MISSED_DETECTION_RATIO,
    OUTLIER_PCT_WARNING, STRONG_METRIC, STRONG_WITHIN_TOLERANCE_PCT, WEAK_METRIC,
    WEAK_WITHIN_TOLERANCE_PCT,
};
use crate::evaluation::{PerformanceMetrics, TemporalMetrics};
use crate::stats::{StatisticalResults, TrendDirection};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyRating {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl AccuracyRating {
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= ACCURACY_EXCELLENT {
            AccuracyRating::Excellent
        } else if accuracy >= ACCURACY_VERY_GOOD {
            AccuracyRating::VeryGood
        } else if accuracy >= ACCURACY_GOOD {
            AccuracyRating::Good
        } else if accuracy >= ACCURACY_FAIR {
            AccuracyRating::Fair
        } else {
            AccuracyRating::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyRating {
    High,
    Medium,
    Low,
}

impl ConsistencyRating {
    /// Rates timing jitter from the standard deviation of timing errors (ms).
    pub fn from_std_ms(std_ms: f64) -> Self {
        if std_ms < CONSISTENCY_HIGH_STD_MS {
            ConsistencyRating::High
        } else if std_ms < CONSISTENCY_MEDIUM_STD_MS {
            ConsistencyRating::Medium
        } else {
            ConsistencyRating::Low
        }
    }
}

/// Whether precision and recall are within [`BALANCE_THRESHOLD`] of each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceAssessment {
    pub balanced: bool,
    /// |precision - recall|
    pub difference: f64,
    /// The larger of the two when imbalanced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favors: Option<&'static str>,
}

impl BalanceAssessment {
    pub fn assess(precision: f64, recall: f64) -> Self {
        let difference = (precision - recall).abs();
        let balanced = difference < BALANCE_THRESHOLD;
        let favors = match balanced {
            true => None,
            false if precision > recall => Some("precision"),
            false => Some("recall"),
        };
        Self {
            balanced,
            difference,
            favors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub accuracy_rating: AccuracyRating,
    pub precision_recall_balance: BalanceAssessment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalSummary {
    /// Absent when no detection could be paired with ground truth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency_rating: Option<ConsistencyRating>,
    pub mean_timing_error_ms: f64,
    pub within_tolerance_percentage: f64,
}

/// Narrative tree attached to every validation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedAnalysis {
    pub performance_summary: PerformanceSummary,
    pub temporal_summary: TemporalSummary,
    pub insights: Vec<String>,
    pub statistical_insights: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Ordered, duplicate-free message list.
#[derive(Default)]
struct Notes(Vec<String>);

impl Notes {
    fn push(&mut self, note: impl Into<String>) {
        let note = note.into();
        if !self.0.contains(&note) {
            self.0.push(note);
        }
    }
}

const REC_REDUCE_FALSE_POSITIVES: &str =
    "Raise the confidence threshold or add hard negatives to reduce false positives";
const REC_IMPROVE_RECALL: &str =
    "Lower the confidence threshold or add training data for frequently missed objects";
const REC_TIMING: &str = "Investigate detection latency; timing errors often exceed the tolerance";
const REC_JITTER: &str = "Stabilize inference timing to reduce timing-error variance";

/// Builds the narrative for one run.
pub fn generate_detailed_analysis(
    metrics: &PerformanceMetrics,
    per_class: &BTreeMap<String, PerformanceMetrics>,
    temporal: &TemporalMetrics,
    statistics: &StatisticalResults,
) -> DetailedAnalysis {
    let balance = BalanceAssessment::assess(metrics.precision, metrics.recall);
    let consistency = (temporal.paired_detections > 0)
        .then(|| ConsistencyRating::from_std_ms(temporal.std_timing_error_ms));

    let mut insights = Notes::default();
    let mut strengths = Notes::default();
    let mut weaknesses = Notes::default();
    let mut recommendations = Notes::default();

    let tp = metrics.true_positives as f64;

    if metrics.false_positives > metrics.true_positives {
        insights.push(
            "High false positive rate: more spurious detections than correct ones",
        );
        weaknesses.push("High false positive rate");
        recommendations.push(REC_REDUCE_FALSE_POSITIVES);
    }
    if metrics.false_negatives as f64 > MISSED_DETECTION_RATIO * tp {
        insights.push(format!(
            "Significant missed detections: {} ground-truth objects were not detected",
            metrics.false_negatives
        ));
        weaknesses.push("Significant missed detections");
        recommendations.push(REC_IMPROVE_RECALL);
    }
    if metrics.precision > CONSERVATIVE_PRECISION && metrics.recall < CONSERVATIVE_RECALL {
        insights.push(
            "Model is conservative: detections are reliable but many objects are missed",
        );
        recommendations.push(REC_IMPROVE_RECALL);
    }
    if metrics.recall > AGGRESSIVE_RECALL && metrics.precision < AGGRESSIVE_PRECISION {
        insights.push(
            "Model is aggressive: most objects are found but many detections are spurious",
        );
        recommendations.push(REC_REDUCE_FALSE_POSITIVES);
    }
    if !balance.balanced {
        insights.push(format!(
            "Precision and recall are imbalanced by {:.2} in favor of {}",
            balance.difference,
            balance.favors.unwrap_or("neither")
        ));
    }

    for (name, value) in [
        ("precision", metrics.precision),
        ("recall", metrics.recall),
        ("F1 score", metrics.f1_score),
    ] {
        if value >= STRONG_METRIC {
            strengths.push(format!("High {} ({:.1}%)", name, value * 100.0));
        } else if value < WEAK_METRIC {
            weaknesses.push(format!("Low {} ({:.1}%)", name, value * 100.0));
        }
    }
    if metrics.precision < WEAK_METRIC {
        recommendations.push(REC_REDUCE_FALSE_POSITIVES);
    }
    if metrics.recall < WEAK_METRIC {
        recommendations.push(REC_IMPROVE_RECALL);
    }

    for (label, class) in per_class {
        let present = class.true_positives + class.false_negatives > 0;
        if present && class.recall < WEAK_METRIC {
            weaknesses.push(format!(
                "Low recall for class '{}' ({:.1}%)",
                label,
                class.recall * 100.0
            ));
        }
    }

    if temporal.total_detections > 0 {
        let pct = temporal.within_tolerance_percentage;
        if pct >= STRONG_WITHIN_TOLERANCE_PCT {
            strengths.push("Consistent temporal alignment with ground truth");
        } else if pct < WEAK_WITHIN_TOLERANCE_PCT {
            insights.push(format!(
                "Only {:.1}% of detections fall within the timing tolerance",
                pct
            ));
            weaknesses.push("Weak temporal alignment");
            recommendations.push(REC_TIMING);
        }
    }
    match consistency {
        Some(ConsistencyRating::High) => strengths.push("Low timing jitter"),
        Some(ConsistencyRating::Low) => {
            weaknesses.push("High timing variance");
            recommendations.push(REC_JITTER);
        }
        _ => {}
    }

    let statistical_insights = statistical_insights(statistics);

    DetailedAnalysis {
        performance_summary: PerformanceSummary {
            accuracy_rating: AccuracyRating::from_accuracy(metrics.accuracy),
            precision_recall_balance: balance,
        },
        temporal_summary: TemporalSummary {
            consistency_rating: consistency,
            mean_timing_error_ms: temporal.mean_timing_error_ms,
            within_tolerance_percentage: temporal.within_tolerance_percentage,
        },
        insights: insights.0,
        statistical_insights,
        strengths: strengths.0,
        weaknesses: weaknesses.0,
        recommendations: recommendations.0,
    }
}

fn statistical_insights(statistics: &StatisticalResults) -> Vec<String> {
    let mut notes = Notes::default();

    if let Some(dist) = statistics.distribution_stats.confidence.computed() {
        if dist.mean < LOW_MEAN_CONFIDENCE {
            notes.push(format!("Low average confidence ({:.2})", dist.mean));
        }
    }
    if let Some(ci) = statistics.confidence_intervals.confidence.computed() {
        notes.push(format!(
            "Mean confidence {:.0}% interval: {}",
            ci.confidence_level * 100.0,
            ci.format(3)
        ));
    }

    let outliers = &statistics.outlier_analysis;
    if outliers.outlier_percentage > OUTLIER_PCT_WARNING {
        notes.push(format!(
            "{} confidence outliers ({:.1}% of scored detections)",
            outliers.outlier_count, outliers.outlier_percentage
        ));
    }

    if let Some(trend) = statistics.trend_analysis.computed() {
        match trend.direction {
            TrendDirection::Decreasing => notes.push(format!(
                "Confidence declines over the recording (slope {:.4}/s)",
                trend.slope
            )),
            TrendDirection::Increasing => notes.push(format!(
                "Confidence rises over the recording (slope {:.4}/s)",
                trend.slope
            )),
            TrendDirection::Stable => {}
        }
    }

    if let Some(temporal) = statistics.distribution_stats.temporal.computed() {
        if temporal.temporal_clustering.cluster_count > 1 {
            notes.push(format!(
                "Detections form {} temporal clusters",
                temporal.temporal_clustering.cluster_count
            ));
        }
    }

    notes.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatisticalAnalyzer;

    fn empty_stats() -> StatisticalResults {
        StatisticalAnalyzer::default().analyze(&[], &[], &[])
    }

    fn temporal(std_ms: f64, within: f64) -> TemporalMetrics {
        TemporalMetrics {
            mean_timing_error_ms: 10.0,
            std_timing_error_ms: std_ms,
            within_tolerance_percentage: within,
            paired_detections: 10,
            total_detections: 10,
            ..Default::default()
        }
    }

    fn has_note(notes: &[String], prefix: &str) -> bool {
        notes.iter().any(|n| n.starts_with(prefix))
    }

    fn listed(notes: &[String], note: &str) -> bool {
        notes.iter().any(|n| n == note)
    }

    #[test]
    fn test_accuracy_buckets() {
        assert_eq!(
            AccuracyRating::from_accuracy(0.95),
            AccuracyRating::Excellent
        );
        assert_eq!(
            AccuracyRating::from_accuracy(0.949),
            AccuracyRating::VeryGood
        );
        assert_eq!(
            AccuracyRating::from_accuracy(0.90),
            AccuracyRating::VeryGood
        );
        assert_eq!(AccuracyRating::from_accuracy(0.80), AccuracyRating::Good);
        assert_eq!(AccuracyRating::from_accuracy(0.70), AccuracyRating::Fair);
        assert_eq!(AccuracyRating::from_accuracy(0.69), AccuracyRating::Poor);
    }

    #[test]
    fn test_consistency_buckets() {
        assert_eq!(
            ConsistencyRating::from_std_ms(19.9),
            ConsistencyRating::High
        );
        assert_eq!(
            ConsistencyRating::from_std_ms(20.0),
            ConsistencyRating::Medium
        );
        assert_eq!(ConsistencyRating::from_std_ms(50.0), ConsistencyRating::Low);
    }

    #[test]
    fn test_balance() {
        assert!(BalanceAssessment::assess(0.9, 0.85).balanced);
        let b = BalanceAssessment::assess(0.98, 0.7);
        assert!(!b.balanced);
        assert_eq!(b.favors, Some("precision"));
        assert!(!BalanceAssessment::assess(0.5, 0.75).balanced);
    }

    #[test]
    fn test_balance_nominal_tenth_gap_is_balanced() {
        // 0.9 - 0.8 rounds to just under 0.1 in f64.
        let b = BalanceAssessment::assess(0.9, 0.8);
        assert!(b.difference < BALANCE_THRESHOLD);
        assert!(b.balanced);
        assert!(BalanceAssessment::assess(0.5, 0.6).balanced);
    }

    #[test]
    fn test_false_positive_and_missed_rules() {
        // TP 2, FP 5, FN 3
        let metrics = PerformanceMetrics::from_counts(2, 5, 3, 5);
        let analysis = generate_detailed_analysis(
            &metrics,
            &BTreeMap::new(),
            &temporal(10.0, 100.0),
            &empty_stats(),
        );

        assert!(has_note(&analysis.insights, "High false positive rate"));
        assert!(has_note(&analysis.insights, "Significant missed detections"));
        assert!(listed(&analysis.weaknesses, "High false positive rate"));
        // Low precision and FP > TP both recommend the same fix; listed once.
        let fp_recs = analysis
            .recommendations
            .iter()
            .filter(|r| r.as_str() == REC_REDUCE_FALSE_POSITIVES)
            .count();
        assert_eq!(fp_recs, 1);
    }

    #[test]
    fn test_conservative_model() {
        // P = 1.0, R = 0.7
        let metrics = PerformanceMetrics::from_counts(7, 0, 3, 10);
        let analysis = generate_detailed_analysis(
            &metrics,
            &BTreeMap::new(),
            &temporal(10.0, 100.0),
            &empty_stats(),
        );

        assert!(has_note(&analysis.insights, "Model is conservative"));
        let summary = &analysis.performance_summary;
        assert!(!summary.precision_recall_balance.balanced);
        assert_eq!(summary.accuracy_rating, AccuracyRating::Fair);
    }

    #[test]
    fn test_aggressive_model() {
        // P = 0.7, R = 1.0
        let metrics = PerformanceMetrics::from_counts(7, 3, 0, 7);
        let analysis = generate_detailed_analysis(
            &metrics,
            &BTreeMap::new(),
            &temporal(10.0, 100.0),
            &empty_stats(),
        );

        assert!(has_note(&analysis.insights, "Model is aggressive"));
        assert!(!has_note(&analysis.insights, "Model is conservative"));
        let balance = &analysis.performance_summary.precision_recall_balance;
        assert_eq!(balance.favors, Some("recall"));
    }

    #[test]
    fn test_strong_run_has_strengths_only() {
        let metrics = PerformanceMetrics::from_counts(10, 0, 0, 10);
        let analysis = generate_detailed_analysis(
            &metrics,
            &BTreeMap::new(),
            &temporal(5.0, 100.0),
            &empty_stats(),
        );

        assert!(analysis.weaknesses.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert!(analysis.insights.is_empty());
        assert!(listed(&analysis.strengths, "Low timing jitter"));
        assert_eq!(
            analysis.temporal_summary.consistency_rating,
            Some(ConsistencyRating::High)
        );
    }

    #[test]
    fn test_weak_timing_and_jitter() {
        let metrics = PerformanceMetrics::from_counts(10, 0, 0, 10);
        let analysis = generate_detailed_analysis(
            &metrics,
            &BTreeMap::new(),
            &temporal(80.0, 60.0),
            &empty_stats(),
        );

        assert!(listed(&analysis.weaknesses, "Weak temporal alignment"));
        assert!(listed(&analysis.weaknesses, "High timing variance"));
        assert!(analysis.recommendations.contains(&REC_TIMING.to_string()));
        assert!(analysis.recommendations.contains(&REC_JITTER.to_string()));
    }

    #[test]
    fn test_no_pairs_has_no_consistency_rating() {
        let metrics = PerformanceMetrics::from_counts(0, 0, 2, 2);
        let analysis = generate_detailed_analysis(
            &metrics,
            &BTreeMap::new(),
            &TemporalMetrics::default(),
            &empty_stats(),
        );
        assert_eq!(analysis.temporal_summary.consistency_rating, None);

        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json["temporal_summary"].get("consistency_rating").is_none());
    }

    #[test]
    fn test_weak_class_reported() {
        let mut per_class = BTreeMap::new();
        per_class.insert(
            "car".to_string(),
            PerformanceMetrics::from_counts(1, 0, 3, 4),
        );
        per_class.insert(
            "person".to_string(),
            PerformanceMetrics::from_counts(5, 0, 0, 5),
        );
        let analysis = generate_detailed_analysis(
            &PerformanceMetrics::from_counts(6, 0, 3, 9),
            &per_class,
            &temporal(10.0, 100.0),
            &empty_stats(),
        );

        assert!(listed(&analysis.weaknesses, "Low recall for class 'car' (25.0%)"));
        assert!(!analysis.weaknesses.iter().any(|w| w.contains("'person'")));
    }

    #[test]
    fn test_statistical_insights() {
        let conf = [0.4, 0.35, 0.3, 0.25, 0.2];
        let ts = [0.0, 1.0, 2.0, 3.0, 4.0];
        let stats = StatisticalAnalyzer::default().analyze(&conf, &ts, &ts);
        let notes = statistical_insights(&stats);

        assert!(has_note(&notes, "Low average confidence"));
        assert!(has_note(&notes, "Mean confidence 95% interval"));
        assert!(has_note(&notes, "Confidence declines"));
    }
}
