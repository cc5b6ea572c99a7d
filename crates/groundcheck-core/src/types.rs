//! Input records consumed by the validation engine.
//!
//! All of these are produced by collaborators (a detector, human annotators,
//! the session store) and are only ever read by the core.

use serde::{Deserialize, Serialize};

/// A single object occurrence reported by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Detector-assigned identifier
    pub id: String,
    /// Seconds from the start of the recording
    pub timestamp: f64,
    /// Class label (e.g. "person")
    pub class_label: String,
    /// Detector confidence in [0, 1], when reported
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl DetectionEvent {
    /// Creates a detection with a confidence score.
    pub fn new(
        id: impl Into<String>,
        timestamp: f64,
        class_label: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            class_label: class_label.into(),
            confidence: Some(confidence),
        }
    }

    /// Creates a detection without a confidence score.
    pub fn unscored(id: impl Into<String>, timestamp: f64, class_label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            class_label: class_label.into(),
            confidence: None,
        }
    }
}

/// A human-verified object occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthObject {
    pub id: String,
    /// Seconds from the start of the recording
    pub timestamp: f64,
    pub class_label: String,
}

impl GroundTruthObject {
    pub fn new(id: impl Into<String>, timestamp: f64, class_label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            class_label: class_label.into(),
        }
    }
}

/// Lifecycle state of a test session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Metadata for one test run against a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub project_id: String,
    pub status: SessionStatus,
    /// Tolerance configured on the session itself, if any.
    #[serde(default)]
    pub tolerance_ms: Option<f64>,
}

impl SessionRecord {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        status: SessionStatus,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            status,
            tolerance_ms: None,
        }
    }

    /// Sets a session-configured tolerance.
    pub fn with_tolerance_ms(mut self, tolerance_ms: f64) -> Self {
        self.tolerance_ms = Some(tolerance_ms);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Everything the workflow needs for one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInputs {
    pub session: SessionRecord,
    pub detections: Vec<DetectionEvent>,
    pub ground_truth: Vec<GroundTruthObject>,
}

impl SessionInputs {
    /// Confidence scores of the detections that report one, in input order.
    pub fn confidences(&self) -> Vec<f64> {
        self.detections
            .iter()
            .filter_map(|d| d.confidence)
            .collect()
    }

    /// Detection timestamps in input order.
    pub fn timestamps(&self) -> Vec<f64> {
        self.detections.iter().map(|d| d.timestamp).collect()
    }

    /// (timestamp, confidence) pairs for detections that report a confidence.
    pub fn scored_points(&self) -> (Vec<f64>, Vec<f64>) {
        self.detections
            .iter()
            .filter_map(|d| d.confidence.map(|c| (d.timestamp, c)))
            .unzip()
    }
}
