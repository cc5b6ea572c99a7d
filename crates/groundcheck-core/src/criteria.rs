//! Pass/fail criteria evaluation.
//!
//! The workflow hands a [`TestResults`] summary to a [`PassFailCriteriaEngine`]
//! and gets back a verdict and an overall score. Deployments inject their own
//! engine; [`ThresholdCriteriaEngine`] is the reference implementation.
//!
//! # Verdicts
//!
//! | Verdict | Condition |
//! |---------|-----------|
//! | `PASS` | every criterion met |
//! | `WARNING` | some criterion missed, all misses within `warning_margin` (relative) |
//! | `FAIL` | at least one criterion missed by more than `warning_margin` |
//!
//! # Score
//!
//! ```text
//! score = 0.30·f1 + 0.20·precision + 0.20·recall
//!       + 0.15·clamp(1 − latency / (2·max_latency), 0, 1)
//!       + 0.15·(1 − fp_rate)
//! ```

use crate::error::CriteriaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const F1_WEIGHT: f64 = 0.30;
const PRECISION_WEIGHT: f64 = 0.20;
const RECALL_WEIGHT: f64 = 0.20;
const LATENCY_WEIGHT: f64 = 0.15;
const FALSE_POSITIVE_WEIGHT: f64 = 0.15;

/// Outcome of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestVerdict {
    Pass,
    Fail,
    Warning,
}

impl TestVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestVerdict::Pass => "PASS",
            TestVerdict::Fail => "FAIL",
            TestVerdict::Warning => "WARNING",
        }
    }
}

impl fmt::Display for TestVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one validation run, as seen by a criteria engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestResults {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub accuracy: f64,
    /// Mean timing error in milliseconds
    pub average_latency_ms: f64,
    /// False positives over total detections
    pub false_positive_rate: f64,
    /// Mean confidence of scored detections (0.0 if none)
    pub average_confidence: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub total_detections: usize,
    pub total_ground_truth: usize,
}

/// Thresholds a run must meet.
///
/// Missing fields in a JSON document take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassFailCriteria {
    pub min_precision: f64,
    pub min_recall: f64,
    pub min_f1_score: f64,
    pub max_average_latency_ms: f64,
    pub max_false_positive_rate: f64,
    pub min_average_confidence: f64,
    /// Relative shortfall tolerated before a miss becomes a failure
    pub warning_margin: f64,
}

impl Default for PassFailCriteria {
    fn default() -> Self {
        Self {
            min_precision: 0.85,
            min_recall: 0.85,
            min_f1_score: 0.85,
            max_average_latency_ms: 100.0,
            max_false_positive_rate: 0.15,
            min_average_confidence: 0.0,
            warning_margin: 0.05,
        }
    }
}

impl PassFailCriteria {
    /// Checks that every threshold is in range.
    pub fn validate(&self) -> Result<(), CriteriaError> {
        let unit = [
            ("min_precision", self.min_precision),
            ("min_recall", self.min_recall),
            ("min_f1_score", self.min_f1_score),
            ("max_false_positive_rate", self.max_false_positive_rate),
            ("min_average_confidence", self.min_average_confidence),
            ("warning_margin", self.warning_margin),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(CriteriaError::InvalidCriteria(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if !(self.max_average_latency_ms.is_finite() && self.max_average_latency_ms > 0.0) {
            return Err(CriteriaError::InvalidCriteria(format!(
                "max_average_latency_ms must be positive, got {}",
                self.max_average_latency_ms
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    AtLeast,
    AtMost,
}

/// Result of checking one threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionOutcome {
    pub name: String,
    pub actual: f64,
    pub threshold: f64,
    pub passed: bool,
}

impl CriterionOutcome {
    fn check(name: &str, actual: f64, threshold: f64, bound: Bound) -> (Self, f64) {
        let (passed, shortfall) = match bound {
            Bound::AtLeast => (actual >= threshold, threshold - actual),
            Bound::AtMost => (actual <= threshold, actual - threshold),
        };
        // Relative to the threshold; a zero threshold falls back to the absolute gap.
        let relative = if threshold.abs() > f64::EPSILON {
            shortfall / threshold.abs()
        } else {
            shortfall
        };
        let outcome = Self {
            name: name.to_string(),
            actual,
            threshold,
            passed,
        };
        (outcome, if passed { 0.0 } else { relative })
    }
}

/// Verdict, score and per-criterion detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaEvaluation {
    pub verdict: TestVerdict,
    pub overall_score: f64,
    pub outcomes: Vec<CriterionOutcome>,
}

/// Evaluates [`TestResults`] against [`PassFailCriteria`].
#[async_trait::async_trait]
pub trait PassFailCriteriaEngine: Send + Sync {
    /// Criteria used when the caller supplies none.
    fn default_criteria(&self) -> PassFailCriteria;

    async fn evaluate(
        &self,
        results: &TestResults,
        criteria: &PassFailCriteria,
    ) -> Result<CriteriaEvaluation, CriteriaError>;
}

/// Reference engine: fixed thresholds and a weighted score.
#[derive(Debug, Clone, Default)]
pub struct ThresholdCriteriaEngine {
    defaults: PassFailCriteria,
}

impl ThresholdCriteriaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `defaults` whenever the caller supplies no criteria.
    pub fn with_defaults(defaults: PassFailCriteria) -> Self {
        Self { defaults }
    }

    /// Weighted score in [0, 1].
    pub fn score(results: &TestResults, criteria: &PassFailCriteria) -> f64 {
        let latency_score = (1.0
            - results.average_latency_ms / (2.0 * criteria.max_average_latency_ms))
            .clamp(0.0, 1.0);
        let score = F1_WEIGHT * results.f1_score
            + PRECISION_WEIGHT * results.precision
            + RECALL_WEIGHT * results.recall
            + LATENCY_WEIGHT * latency_score
            + FALSE_POSITIVE_WEIGHT * (1.0 - results.false_positive_rate);
        score.clamp(0.0, 1.0)
    }
}

#[async_trait::async_trait]
impl PassFailCriteriaEngine for ThresholdCriteriaEngine {
    fn default_criteria(&self) -> PassFailCriteria {
        self.defaults.clone()
    }

    async fn evaluate(
        &self,
        results: &TestResults,
        criteria: &PassFailCriteria,
    ) -> Result<CriteriaEvaluation, CriteriaError> {
        criteria.validate()?;

        let checks = [
            ("precision", results.precision, criteria.min_precision, Bound::AtLeast),
            ("recall", results.recall, criteria.min_recall, Bound::AtLeast),
            ("f1_score", results.f1_score, criteria.min_f1_score, Bound::AtLeast),
            (
                "average_latency_ms",
                results.average_latency_ms,
                criteria.max_average_latency_ms,
                Bound::AtMost,
            ),
            (
                "false_positive_rate",
                results.false_positive_rate,
                criteria.max_false_positive_rate,
                Bound::AtMost,
            ),
            (
                "average_confidence",
                results.average_confidence,
                criteria.min_average_confidence,
                Bound::AtLeast,
            ),
        ];

        let mut outcomes = Vec::with_capacity(checks.len());
        let mut worst_shortfall = 0.0_f64;
        for (name, actual, threshold, bound) in checks {
            if !actual.is_finite() {
                return Err(CriteriaError::EvaluationFailed(format!(
                    "{} is not a finite number",
                    name
                )));
            }
            let (outcome, shortfall) = CriterionOutcome::check(name, actual, threshold, bound);
            worst_shortfall = worst_shortfall.max(shortfall);
            outcomes.push(outcome);
        }

        let verdict = if outcomes.iter().all(|o| o.passed) {
            TestVerdict::Pass
        } else if worst_shortfall > criteria.warning_margin {
            TestVerdict::Fail
        } else {
            TestVerdict::Warning
        };
        let overall_score = Self::score(results, criteria);

        debug!(
            %verdict,
            overall_score,
            failed = outcomes.iter().filter(|o| !o.passed).count(),
            "criteria evaluated"
        );

        Ok(CriteriaEvaluation {
            verdict,
            overall_score,
            outcomes,
        })
    }
}
