//! Staged validation pipeline.
//!
//! [`ValidationWorkflow::validate`] runs the stages in a straight line:
//!
//! 1. Fetch detections, ground truth and session metadata
//! 2. Resolve the timing tolerance
//! 3. Greedy matching and confusion-matrix metrics
//! 4. Timing-error metrics
//! 5. Statistical sections over confidences and timestamps
//! 6. Assemble [`TestResults`] and ask the criteria engine for a verdict
//! 7. Build the narrative [`DetailedAnalysis`]
//!
//! Only a missing session, an invalid supplied tolerance or a criteria
//! engine failure aborts the run. Statistical shortfalls show up as empty
//! sections in the result.
//!
//! Tolerance is resolved once, before matching, and the same value drives
//! both the matcher and the timing analysis. Precedence:
//!
//! | Source | Used when |
//! |--------|-----------|
//! | `request` | the request carries `tolerance_ms` |
//! | `session` | the session record carries `tolerance_ms` |
//! | `historical` | the request carries `historical_latencies` |
//! | `adaptive` | otherwise, from completed sibling sessions |

use crate::config::ValidationConfig;
use crate::criteria::{
    CriterionOutcome, PassFailCriteria, PassFailCriteriaEngine, TestResults, TestVerdict,
};
use crate::error::ValidationError;
use crate::evaluation::{DetectionMatcher, PerformanceMetrics, TemporalAnalyzer, TemporalMetrics};
use crate::history::{HistoryEntry, ValidationHistory};
use crate::report::{generate_detailed_analysis, DetailedAnalysis};
use crate::stats::distribution::mean;
use crate::stats::{StatisticalAnalyzer, StatisticalResults};
use crate::storage::{SessionHistory, ValidationStore};
use crate::tolerance::ToleranceCalculator;
use crate::types::{SessionInputs, SessionRecord};
use instant::Instant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Parameters for one validation run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub session_id: String,
    /// Fixed tolerance, overriding every other source
    #[serde(default)]
    pub tolerance_ms: Option<f64>,
    /// Per-session average latencies for adaptive tolerance
    #[serde(default)]
    pub historical_latencies: Option<Vec<f64>>,
    /// Criteria to use instead of the engine's defaults
    #[serde(default)]
    pub criteria: Option<PassFailCriteria>,
}

impl ValidationRequest {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    pub fn with_tolerance_ms(mut self, tolerance_ms: f64) -> Self {
        self.tolerance_ms = Some(tolerance_ms);
        self
    }

    pub fn with_historical_latencies(mut self, latencies: Vec<f64>) -> Self {
        self.historical_latencies = Some(latencies);
        self
    }

    pub fn with_criteria(mut self, criteria: PassFailCriteria) -> Self {
        self.criteria = Some(criteria);
        self
    }
}

/// Where the tolerance of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceSource {
    Request,
    Session,
    Historical,
    Adaptive,
}

impl ToleranceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToleranceSource::Request => "request",
            ToleranceSource::Session => "session",
            ToleranceSource::Historical => "historical",
            ToleranceSource::Adaptive => "adaptive",
        }
    }
}

/// Complete scorecard for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub session_id: String,
    pub tolerance_ms: f64,
    pub tolerance_source: ToleranceSource,
    pub performance_metrics: PerformanceMetrics,
    pub per_class_metrics: BTreeMap<String, PerformanceMetrics>,
    pub temporal_metrics: TemporalMetrics,
    pub statistical_results: StatisticalResults,
    pub test_results: TestResults,
    pub test_verdict: TestVerdict,
    pub overall_score: f64,
    pub criteria_outcomes: Vec<CriterionOutcome>,
    pub detailed_analysis: DetailedAnalysis,
    pub processing_time_ms: f64,
}

impl ValidationResult {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// History entry describing this run.
    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            session_id: self.session_id.clone(),
            verdict: self.test_verdict,
            overall_score: self.overall_score,
            f1_score: self.performance_metrics.f1_score,
            tolerance_ms: self.tolerance_ms,
        }
    }
}

/// Orchestrates matching, statistics and criteria evaluation.
///
/// # Type Parameters
///
/// * `S` - Storage collaborator providing inputs and sibling-session history
/// * `C` - Pass/fail criteria engine
pub struct ValidationWorkflow<S, C> {
    store: S,
    criteria_engine: C,
    config: ValidationConfig,
    tolerance: ToleranceCalculator,
    analyzer: StatisticalAnalyzer,
}

impl<S, C> ValidationWorkflow<S, C>
where
    S: ValidationStore + SessionHistory,
    C: PassFailCriteriaEngine,
{
    /// Creates a workflow with the default configuration.
    pub fn new(store: S, criteria_engine: C) -> Self {
        let config = ValidationConfig::default();
        Self {
            store,
            criteria_engine,
            tolerance: ToleranceCalculator::new(config.base_tolerance_ms),
            analyzer: StatisticalAnalyzer::new(config.confidence_level),
            config,
        }
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(mut self, config: ValidationConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        self.tolerance = ToleranceCalculator::new(config.base_tolerance_ms);
        self.analyzer = StatisticalAnalyzer::new(config.confidence_level);
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the full pipeline for one session.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::NotFound`] if the session does not exist
    /// - [`ValidationError::InvalidInput`] if a supplied tolerance is not a positive number
    /// - [`ValidationError::Criteria`] if the criteria engine rejects the run
    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    pub async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ValidationError> {
        let total_start = Instant::now();

        let inputs = self.store.fetch(&request.session_id).await?;
        info!(
            "Validating {} detections against {} ground-truth objects",
            inputs.detections.len(),
            inputs.ground_truth.len()
        );

        let (tolerance_ms, tolerance_source) =
            self.resolve_tolerance(request, &inputs.session).await?;
        debug!(
            "Tolerance {:.1} ms ({})",
            tolerance_ms,
            tolerance_source.as_str()
        );

        let outcome = DetectionMatcher::new(tolerance_ms)
            .match_detections(&inputs.detections, &inputs.ground_truth);
        debug!(
            "Matched: tp={} fp={} fn={}",
            outcome.metrics.true_positives,
            outcome.metrics.false_positives,
            outcome.metrics.false_negatives
        );

        let temporal_metrics =
            TemporalAnalyzer::new(tolerance_ms).analyze(&inputs.detections, &inputs.ground_truth);

        let stats_start = Instant::now();
        let (scored_timestamps, confidences) = inputs.scored_points();
        let statistical_results = self
            .analyzer
            .analyze(&confidences, &inputs.timestamps(), &scored_timestamps);
        debug!(
            "Statistical sections computed in {:?}",
            stats_start.elapsed()
        );

        let test_results = assemble_test_results(&inputs, &outcome.metrics, &temporal_metrics);

        let criteria = match &request.criteria {
            Some(criteria) => criteria.clone(),
            None => self.criteria_engine.default_criteria(),
        };
        let evaluation = self
            .criteria_engine
            .evaluate(&test_results, &criteria)
            .await?;

        let detailed_analysis = generate_detailed_analysis(
            &outcome.metrics,
            &outcome.per_class,
            &temporal_metrics,
            &statistical_results,
        );

        let elapsed = total_start.elapsed();
        info!(
            "Validation finished: {} (score {:.3}) in {:?}",
            evaluation.verdict, evaluation.overall_score, elapsed
        );

        Ok(ValidationResult {
            session_id: request.session_id.clone(),
            tolerance_ms,
            tolerance_source,
            performance_metrics: outcome.metrics,
            per_class_metrics: outcome.per_class,
            temporal_metrics,
            statistical_results,
            test_results,
            test_verdict: evaluation.verdict,
            overall_score: evaluation.overall_score,
            criteria_outcomes: evaluation.outcomes,
            detailed_analysis,
            processing_time_ms: elapsed.as_secs_f64() * 1000.0,
        })
    }

    /// Runs [`validate`](Self::validate) and appends the outcome to `history`.
    ///
    /// Failed runs leave `history` untouched.
    pub async fn validate_recorded(
        &self,
        request: &ValidationRequest,
        history: &mut ValidationHistory,
    ) -> Result<ValidationResult, ValidationError> {
        let result = self.validate(request).await?;
        history.record(result.history_entry());
        Ok(result)
    }

    async fn resolve_tolerance(
        &self,
        request: &ValidationRequest,
        session: &SessionRecord,
    ) -> Result<(f64, ToleranceSource), ValidationError> {
        if let Some(tolerance_ms) = request.tolerance_ms {
            return Ok((
                check_tolerance(tolerance_ms, "request")?,
                ToleranceSource::Request,
            ));
        }
        if let Some(tolerance_ms) = session.tolerance_ms {
            return Ok((
                check_tolerance(tolerance_ms, "session")?,
                ToleranceSource::Session,
            ));
        }
        if let Some(latencies) = &request.historical_latencies {
            let tolerance_ms = self.tolerance.calculate_adaptive_tolerance(latencies);
            return Ok((tolerance_ms, ToleranceSource::Historical));
        }
        let tolerance_ms = self
            .tolerance
            .tolerance_for_session(&self.store, &session.id)
            .await;
        Ok((tolerance_ms, ToleranceSource::Adaptive))
    }
}

fn check_tolerance(tolerance_ms: f64, origin: &str) -> Result<f64, ValidationError> {
    if tolerance_ms.is_finite() && tolerance_ms > 0.0 {
        Ok(tolerance_ms)
    } else {
        Err(ValidationError::InvalidInput(format!(
            "{} tolerance must be a positive number of milliseconds, got {}",
            origin, tolerance_ms
        )))
    }
}

fn assemble_test_results(
    inputs: &SessionInputs,
    metrics: &PerformanceMetrics,
    temporal: &TemporalMetrics,
) -> TestResults {
    let total_detections = inputs.detections.len();
    let confidences: Vec<f64> = inputs
        .confidences()
        .into_iter()
        .filter(|c| c.is_finite())
        .collect();

    TestResults {
        precision: metrics.precision,
        recall: metrics.recall,
        f1_score: metrics.f1_score,
        accuracy: metrics.accuracy,
        average_latency_ms: temporal.mean_timing_error_ms,
        false_positive_rate: if total_detections == 0 {
            0.0
        } else {
            metrics.false_positives as f64 / total_detections as f64
        },
        average_confidence: mean(&confidences),
        true_positives: metrics.true_positives,
        false_positives: metrics.false_positives,
        false_negatives: metrics.false_negatives,
        total_detections,
        total_ground_truth: inputs.ground_truth.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{CriteriaEvaluation, ThresholdCriteriaEngine};
    use crate::error::CriteriaError;
    use crate::storage::InMemoryValidationStore;
    use crate::types::{DetectionEvent, GroundTruthObject, SessionStatus};

    fn store_with(session: SessionRecord) -> InMemoryValidationStore {
        let store = InMemoryValidationStore::new();
        store
            .insert(SessionInputs {
                session,
                detections: vec![
                    DetectionEvent::new("d1", 1.00, "person", 0.9),
                    DetectionEvent::new("d2", 2.00, "car", 0.8),
                ],
                ground_truth: vec![
                    GroundTruthObject::new("g1", 1.02, "person"),
                    GroundTruthObject::new("g2", 2.15, "car"),
                ],
            })
            .unwrap();
        store
    }

    /// Engine that fails every evaluation.
    struct RejectingEngine;

    #[async_trait::async_trait]
    impl PassFailCriteriaEngine for RejectingEngine {
        fn default_criteria(&self) -> PassFailCriteria {
            PassFailCriteria::default()
        }

        async fn evaluate(
            &self,
            _results: &TestResults,
            _criteria: &PassFailCriteria,
        ) -> Result<CriteriaEvaluation, CriteriaError> {
            Err(CriteriaError::EvaluationFailed("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_request_tolerance_wins() {
        let store = store_with(
            SessionRecord::new("s1", "p1", SessionStatus::Running).with_tolerance_ms(100.0),
        );
        let workflow = ValidationWorkflow::new(store, ThresholdCriteriaEngine::new());

        let result = workflow
            .validate(&ValidationRequest::new("s1").with_tolerance_ms(200.0))
            .await
            .unwrap();

        assert_eq!(result.tolerance_source, ToleranceSource::Request);
        assert_eq!(result.tolerance_ms, 200.0);
        // The car detection is 150 ms off: matched only at 200 ms.
        assert_eq!(result.performance_metrics.true_positives, 2);
    }

    #[tokio::test]
    async fn test_session_tolerance_before_history() {
        let store = store_with(
            SessionRecord::new("s1", "p1", SessionStatus::Running).with_tolerance_ms(100.0),
        );
        let workflow = ValidationWorkflow::new(store, ThresholdCriteriaEngine::new());

        let result = workflow
            .validate(&ValidationRequest::new("s1").with_historical_latencies(vec![400.0]))
            .await
            .unwrap();

        assert_eq!(result.tolerance_source, ToleranceSource::Session);
        assert_eq!(result.performance_metrics.true_positives, 1);
        assert_eq!(result.performance_metrics.false_negatives, 1);
    }

    #[tokio::test]
    async fn test_historical_then_adaptive() {
        let store = store_with(SessionRecord::new("s1", "p1", SessionStatus::Running));
        let workflow = ValidationWorkflow::new(store, ThresholdCriteriaEngine::new());

        let historical = workflow
            .validate(&ValidationRequest::new("s1").with_historical_latencies(vec![10_000.0]))
            .await
            .unwrap();
        assert_eq!(historical.tolerance_source, ToleranceSource::Historical);
        assert_eq!(historical.tolerance_ms, 500.0);

        let adaptive = workflow
            .validate(&ValidationRequest::new("s1"))
            .await
            .unwrap();
        assert_eq!(adaptive.tolerance_source, ToleranceSource::Adaptive);
        assert_eq!(adaptive.tolerance_ms, 100.0);
    }

    #[tokio::test]
    async fn test_invalid_tolerance_rejected() {
        let store = store_with(SessionRecord::new("s1", "p1", SessionStatus::Running));
        let workflow = ValidationWorkflow::new(store, ThresholdCriteriaEngine::new());

        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = workflow
                .validate(&ValidationRequest::new("s1").with_tolerance_ms(bad))
                .await
                .unwrap_err();
            assert!(matches!(err, ValidationError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_criteria_failure_aborts() {
        let store = store_with(SessionRecord::new("s1", "p1", SessionStatus::Running));
        let workflow = ValidationWorkflow::new(store, RejectingEngine);

        let err = workflow
            .validate(&ValidationRequest::new("s1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Criteria(CriteriaError::EvaluationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_with_config_validates() {
        let store = store_with(SessionRecord::new("s1", "p1", SessionStatus::Running));
        let bad = ValidationConfig {
            confidence_level: 1.5,
            ..Default::default()
        };
        assert!(ValidationWorkflow::new(store, ThresholdCriteriaEngine::new())
            .with_config(bad)
            .is_err());
    }

    #[tokio::test]
    async fn test_configured_base_tolerance_used_for_adaptive_fallback() {
        let store = store_with(SessionRecord::new("s1", "p1", SessionStatus::Running));
        let config = ValidationConfig {
            base_tolerance_ms: 200.0,
            ..Default::default()
        };
        let workflow = ValidationWorkflow::new(store, ThresholdCriteriaEngine::new())
            .with_config(config)
            .unwrap();

        let result = workflow
            .validate(&ValidationRequest::new("s1"))
            .await
            .unwrap();
        assert_eq!(result.tolerance_ms, 200.0);
        assert_eq!(result.performance_metrics.true_positives, 2);
    }

    #[test]
    fn test_false_positive_rate_over_detections() {
        let inputs = SessionInputs {
            session: SessionRecord::new("s1", "p1", SessionStatus::Running),
            detections: vec![
                DetectionEvent::new("d1", 1.0, "person", 0.6),
                DetectionEvent::unscored("d2", 2.0, "person"),
            ],
            ground_truth: vec![],
        };
        let metrics = PerformanceMetrics::from_counts(1, 1, 0, 1);
        let results = assemble_test_results(&inputs, &metrics, &TemporalMetrics::default());

        assert_eq!(results.false_positive_rate, 0.5);
        assert_eq!(results.average_confidence, 0.6);
        assert_eq!(results.total_detections, 2);
    }
}
