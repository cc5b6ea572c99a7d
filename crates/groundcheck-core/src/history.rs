//! Caller-owned log of completed validations.
//!
//! There is no process-wide registry of past runs. Callers that want
//! metrics-of-metrics keep a [`ValidationHistory`] and pass it to
//! [`crate::workflow::ValidationWorkflow::validate_recorded`]. Entries can
//! only be appended.

use crate::criteria::TestVerdict;
use serde::{Deserialize, Serialize};

/// One completed validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub session_id: String,
    pub verdict: TestVerdict,
    pub overall_score: f64,
    pub f1_score: f64,
    pub tolerance_ms: f64,
}

/// Aggregate view over a [`ValidationHistory`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HistorySummary {
    pub runs: usize,
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
    /// Share of runs with a PASS verdict (0.0 when empty)
    pub pass_rate: f64,
    pub mean_score: f64,
    pub mean_f1: f64,
}

/// Append-only validation log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationHistory {
    entries: Vec<HistoryEntry>,
}

impl ValidationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Entries in the order they were recorded.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry for a session, if any.
    pub fn latest_for(&self, session_id: &str) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.session_id == session_id)
    }

    pub fn summary(&self) -> HistorySummary {
        let runs = self.entries.len();
        if runs == 0 {
            return HistorySummary::default();
        }

        let count = |v: TestVerdict| self.entries.iter().filter(|e| e.verdict == v).count();
        let passed = count(TestVerdict::Pass);
        let n = runs as f64;

        HistorySummary {
            runs,
            passed,
            warnings: count(TestVerdict::Warning),
            failed: count(TestVerdict::Fail),
            pass_rate: passed as f64 / n,
            mean_score: self.entries.iter().map(|e| e.overall_score).sum::<f64>() / n,
            mean_f1: self.entries.iter().map(|e| e.f1_score).sum::<f64>() / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, verdict: TestVerdict, score: f64) -> HistoryEntry {
        HistoryEntry {
            session_id: id.to_string(),
            verdict,
            overall_score: score,
            f1_score: score,
            tolerance_ms: 100.0,
        }
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(
            ValidationHistory::new().summary(),
            HistorySummary::default()
        );
    }

    #[test]
    fn test_summary_counts_and_means() {
        let mut history = ValidationHistory::new();
        history.record(entry("a", TestVerdict::Pass, 0.9));
        history.record(entry("b", TestVerdict::Fail, 0.3));
        history.record(entry("c", TestVerdict::Warning, 0.6));
        history.record(entry("d", TestVerdict::Pass, 1.0));

        let s = history.summary();
        assert_eq!((s.runs, s.passed, s.warnings, s.failed), (4, 2, 1, 1));
        assert!((s.pass_rate - 0.5).abs() < 1e-12);
        assert!((s.mean_score - 0.7).abs() < 1e-12);
        assert!((s.mean_f1 - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_latest_for_returns_most_recent() {
        let mut history = ValidationHistory::new();
        history.record(entry("a", TestVerdict::Fail, 0.2));
        history.record(entry("b", TestVerdict::Pass, 0.9));
        history.record(entry("a", TestVerdict::Pass, 0.95));

        assert_eq!(history.latest_for("a").unwrap().verdict, TestVerdict::Pass);
        assert_eq!(history.entries()[0].overall_score, 0.2);
        assert!(history.latest_for("z").is_none());
    }
}
