//! # Groundcheck Core
//!
//! Validation and statistics engine for object-detection runs.
//!
//! Given the detections a model produced for a recording and the human-curated
//! ground truth for that same recording, this crate decides whether the
//! detections are temporally and semantically correct and produces a
//! statistically grounded scorecard.
//!
//! The crate is a library boundary only: storage and pass/fail evaluation are
//! injected collaborators (see [`storage`] and [`criteria`]).
//!
//! ## Modules
//!
//! - [`types`] - Detection, ground-truth and session records
//! - [`config`] - Design constants and runtime configuration
//! - [`error`] - Error taxonomy
//! - [`tolerance`] - Timing tolerance derivation (fixed or adaptive)
//! - [`evaluation`] - Greedy detection matching and timing-error analysis
//! - [`stats`] - Distribution, outlier, trend and interval statistics
//! - [`criteria`] - Pass/fail criteria evaluation seam
//! - [`storage`] - Input fetch seam and an in-memory implementation
//! - [`report`] - Narrative analysis built from rating thresholds
//! - [`history`] - Caller-owned log of completed validations
//! - [`workflow`] - The staged validation pipeline

pub mod config;
pub mod criteria;
pub mod error;
pub mod evaluation;
pub mod history;
pub mod report;
pub mod stats;
pub mod storage;
pub mod tolerance;
pub mod types;
pub mod workflow;

pub use error::{CriteriaError, StatsError, StoreError, ValidationError};
pub use types::{DetectionEvent, GroundTruthObject, SessionInputs, SessionRecord, SessionStatus};
pub use workflow::{ValidationRequest, ValidationResult, ValidationWorkflow};
