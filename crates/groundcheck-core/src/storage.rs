//! Storage collaborators for the validation workflow.
//!
//! The core never talks to a database directly. It reads through two traits:
//!
//! - [`ValidationStore`] - fetches the detections, ground truth and session
//!   metadata for one run
//! - [`SessionHistory`] - looks up sibling sessions and their average
//!   latencies for adaptive tolerance
//!
//! [`InMemoryValidationStore`] implements both and backs the CLI and tests.
//!
//! Both traits are `Send + Sync` with `Send` futures, so a workflow shared
//! through an `Arc` can run validations on spawned tokio tasks.

use crate::error::StoreError;
use crate::types::{SessionInputs, SessionRecord};
use std::collections::HashMap;
use std::sync::RwLock;

/// Source of validation inputs.
#[async_trait::async_trait]
pub trait ValidationStore: Send + Sync {
    /// Fetches everything needed to validate `session_id`.
    ///
    /// Returns [`StoreError::NotFound`] if the session does not exist.
    async fn fetch(&self, session_id: &str) -> Result<SessionInputs, StoreError>;
}

/// Read access to past sessions, used to derive adaptive tolerances.
#[async_trait::async_trait]
pub trait SessionHistory: Send + Sync {
    /// Returns `Ok(None)` if the session doesn't exist.
    async fn session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// All sessions belonging to a project, in any status.
    async fn project_sessions(&self, project_id: &str) -> Result<Vec<SessionRecord>, StoreError>;

    /// Average detection latency of a session in milliseconds, if known.
    async fn average_latency_ms(&self, session_id: &str) -> Result<Option<f64>, StoreError>;
}

/// In-memory store keyed by session id.
#[derive(Default)]
pub struct InMemoryValidationStore {
    sessions: RwLock<HashMap<String, SessionInputs>>,
    latencies: RwLock<HashMap<String, f64>>,
}

impl InMemoryValidationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores (or replaces) the inputs for a session.
    pub fn insert(&self, inputs: SessionInputs) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| StoreError::Backend(format!("Lock poisoned: {}", e)))?;
        sessions.insert(inputs.session.id.clone(), inputs);
        Ok(())
    }

    /// Records the measured average latency of a session.
    pub fn set_average_latency(&self, session_id: &str, latency_ms: f64) -> Result<(), StoreError> {
        let mut latencies = self
            .latencies
            .write()
            .map_err(|e| StoreError::Backend(format!("Lock poisoned: {}", e)))?;
        latencies.insert(session_id.to_string(), latency_ms);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ValidationStore for InMemoryValidationStore {
    async fn fetch(&self, session_id: &str) -> Result<SessionInputs, StoreError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| StoreError::Backend(format!("Lock poisoned: {}", e)))?;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("session {}", session_id)))
    }
}

#[async_trait::async_trait]
impl SessionHistory for InMemoryValidationStore {
    async fn session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| StoreError::Backend(format!("Lock poisoned: {}", e)))?;
        Ok(sessions.get(session_id).map(|i| i.session.clone()))
    }

    async fn project_sessions(&self, project_id: &str) -> Result<Vec<SessionRecord>, StoreError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| StoreError::Backend(format!("Lock poisoned: {}", e)))?;
        let mut records: Vec<SessionRecord> = sessions
            .values()
            .filter(|i| i.session.project_id == project_id)
            .map(|i| i.session.clone())
            .collect();
        // HashMap order is unspecified; keep results stable.
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn average_latency_ms(&self, session_id: &str) -> Result<Option<f64>, StoreError> {
        let latencies = self
            .latencies
            .read()
            .map_err(|e| StoreError::Backend(format!("Lock poisoned: {}", e)))?;
        Ok(latencies.get(session_id).copied())
    }
}

// Lets several workflows share one store.
#[async_trait::async_trait]
impl<T: ValidationStore> ValidationStore for std::sync::Arc<T> {
    async fn fetch(&self, session_id: &str) -> Result<SessionInputs, StoreError> {
        (**self).fetch(session_id).await
    }
}

#[async_trait::async_trait]
impl<T: SessionHistory> SessionHistory for std::sync::Arc<T> {
    async fn session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        (**self).session(session_id).await
    }

    async fn project_sessions(&self, project_id: &str) -> Result<Vec<SessionRecord>, StoreError> {
        (**self).project_sessions(project_id).await
    }

    async fn average_latency_ms(&self, session_id: &str) -> Result<Option<f64>, StoreError> {
        (**self).average_latency_ms(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionStatus;

    fn inputs(id: &str, project: &str, status: SessionStatus) -> SessionInputs {
        SessionInputs {
            session: SessionRecord::new(id, project, status),
            detections: vec![],
            ground_truth: vec![],
        }
    }

    #[tokio::test]
    async fn test_fetch_roundtrip() {
        let store = InMemoryValidationStore::new();
        store
            .insert(inputs("s1", "p1", SessionStatus::Running))
            .unwrap();

        let fetched = store.fetch("s1").await.unwrap();
        assert_eq!(fetched.session.id, "s1");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let store = InMemoryValidationStore::new();
        let err = store.fetch("nope").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("session nope".to_string()));
    }

    #[tokio::test]
    async fn test_project_sessions_filters_by_project() {
        let store = InMemoryValidationStore::new();
        for (id, project, status) in [
            ("b", "p1", SessionStatus::Completed),
            ("a", "p1", SessionStatus::Running),
            ("c", "p2", SessionStatus::Completed),
        ] {
            store.insert(inputs(id, project, status)).unwrap();
        }

        let ids: Vec<String> = store
            .project_sessions("p1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_average_latency_lookup() {
        let store = InMemoryValidationStore::new();
        store.set_average_latency("s1", 42.0).unwrap();

        assert_eq!(store.average_latency_ms("s1").await.unwrap(), Some(42.0));
        assert_eq!(store.average_latency_ms("s2").await.unwrap(), None);
        assert_eq!(store.session("s1").await.unwrap(), None);
    }
}
