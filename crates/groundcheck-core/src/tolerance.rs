//! Timing tolerance derivation.
//!
//! A tolerance is the largest timestamp difference (in milliseconds) at which
//! a detection still counts as aligned with a ground-truth object. It is
//! either supplied by the caller or derived from the average latencies of
//! previously completed sessions in the same project:
//!
//! ```text
//! tolerance = clamp(mean(latencies) + 2·σ(latencies), 50, 500)
//! ```
//!
//! Tolerance estimation never fails a validation: any lookup error falls back
//! to the base tolerance.

use crate::config::{
    DEFAULT_BASE_TOLERANCE_MS, MAX_TOLERANCE_MS, MIN_TOLERANCE_MS, TOLERANCE_SIGMA_MULTIPLIER,
};
use crate::error::StoreError;
use crate::stats::distribution::{mean, std_dev};
use crate::storage::SessionHistory;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy)]
pub struct ToleranceCalculator {
    base_tolerance_ms: f64,
}

impl Default for ToleranceCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_TOLERANCE_MS)
    }
}

impl ToleranceCalculator {
    /// Creates a calculator that falls back to `base_tolerance_ms`.
    pub fn new(base_tolerance_ms: f64) -> Self {
        Self { base_tolerance_ms }
    }

    pub fn base_tolerance_ms(&self) -> f64 {
        self.base_tolerance_ms
    }

    /// Derives a tolerance from historical per-session average latencies.
    ///
    /// Returns the base tolerance when no finite latency is given; otherwise
    /// the result always lies in [50, 500] ms.
    pub fn calculate_adaptive_tolerance(&self, historical_latencies: &[f64]) -> f64 {
        let latencies: Vec<f64> = historical_latencies
            .iter()
            .copied()
            .filter(|l| l.is_finite())
            .collect();

        if latencies.is_empty() {
            debug!(
                base = self.base_tolerance_ms,
                "no latency history, using base tolerance"
            );
            return self.base_tolerance_ms;
        }

        let raw = mean(&latencies) + TOLERANCE_SIGMA_MULTIPLIER * std_dev(&latencies);
        let tolerance = raw.clamp(MIN_TOLERANCE_MS, MAX_TOLERANCE_MS);
        debug!(
            samples = latencies.len(),
            raw, tolerance, "derived adaptive tolerance"
        );
        tolerance
    }

    /// Derives a tolerance from the completed sibling sessions of `session_id`.
    ///
    /// Any lookup failure, including an unknown session, yields the base
    /// tolerance.
    #[instrument(skip(self, history))]
    pub async fn tolerance_for_session<H>(&self, history: &H, session_id: &str) -> f64
    where
        H: SessionHistory + ?Sized,
    {
        match self.sibling_latencies(history, session_id).await {
            Ok(latencies) => self.calculate_adaptive_tolerance(&latencies),
            Err(err) => {
                warn!(error = %err, "tolerance lookup failed, using base tolerance");
                self.base_tolerance_ms
            }
        }
    }

    async fn sibling_latencies<H>(
        &self,
        history: &H,
        session_id: &str,
    ) -> Result<Vec<f64>, StoreError>
    where
        H: SessionHistory + ?Sized,
    {
        let session = history
            .session(session_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("session {}", session_id)))?;

        let siblings = history.project_sessions(&session.project_id).await?;
        let mut latencies = Vec::new();
        for sibling in siblings
            .iter()
            .filter(|s| s.is_completed() && s.id != session.id)
        {
            if let Some(latency) = history.average_latency_ms(&sibling.id).await? {
                latencies.push(latency);
            }
        }

        debug!(
            project = %session.project_id,
            samples = latencies.len(),
            "collected sibling latencies"
        );
        Ok(latencies)
    }
}
