//! Input bundles.
//!
//! Each input file holds one session's detections and ground truth:
//!
//! ```json
//! {
//!   "session": { "id": "run-42", "project_id": "lobby-cam", "status": "running" },
//!   "detections": [{ "id": "d1", "timestamp": 1.0, "class_label": "person", "confidence": 0.91 }],
//!   "ground_truth": [{ "id": "g1", "timestamp": 1.02, "class_label": "person" }],
//!   "historical_latencies": [42.0, 55.0],
//!   "average_latency_ms": 48.0
//! }
//! ```
//!
//! `average_latency_ms` describes the bundle's own session, so completed
//! sessions passed alongside a new one feed its adaptive tolerance.

use crate::config::read_json;
use anyhow::{Context, Result};
use groundcheck_core::storage::InMemoryValidationStore;
use groundcheck_core::{DetectionEvent, GroundTruthObject, SessionInputs, SessionRecord};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct InputBundle {
    pub session: SessionRecord,
    #[serde(default)]
    pub detections: Vec<DetectionEvent>,
    #[serde(default)]
    pub ground_truth: Vec<GroundTruthObject>,
    #[serde(default)]
    pub historical_latencies: Option<Vec<f64>>,
    #[serde(default)]
    pub average_latency_ms: Option<f64>,
}

impl InputBundle {
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path).with_context(|| format!("Failed to load input bundle: {}", path.display()))
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }
}

/// Builds a store holding every bundle, keyed by session id.
pub fn build_store(bundles: &[InputBundle]) -> Result<InMemoryValidationStore> {
    let store = InMemoryValidationStore::new();
    for bundle in bundles {
        store.insert(SessionInputs {
            session: bundle.session.clone(),
            detections: bundle.detections.clone(),
            ground_truth: bundle.ground_truth.clone(),
        })?;
        if let Some(latency) = bundle.average_latency_ms {
            store.set_average_latency(bundle.session_id(), latency)?;
        }
    }
    Ok(store)
}
