//! Groundcheck CLI - scorecards for detection validation runs.
//!
//! # Usage
//!
//! ```bash
//! # Validate one run with an adaptive tolerance
//! gc run-42.json
//!
//! # Fixed tolerance, custom criteria, JSON output
//! gc run-42.json --tolerance-ms 150 --criteria strict.json --json
//!
//! # Several runs: completed sessions feed the tolerance of new ones
//! gc past-*.json run-42.json
//! ```
//!
//! Exits with status 1 if any run errors or gets a FAIL verdict.

mod config;
mod input;
mod output;

use anyhow::Result;
use clap::Parser;
use groundcheck_core::criteria::{TestVerdict, ThresholdCriteriaEngine};
use groundcheck_core::history::ValidationHistory;
use groundcheck_core::{ValidationRequest, ValidationWorkflow};
use input::InputBundle;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Validate detector output against ground truth.
///
/// Each input is a JSON bundle holding one session's detections and
/// ground truth.
#[derive(Parser)]
#[command(name = "gc", version, about)]
struct Cli {
    /// Input bundles (JSON)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Fixed matching tolerance in milliseconds
    #[arg(long)]
    tolerance_ms: Option<f64>,

    /// Pass/fail criteria file (JSON)
    #[arg(long)]
    criteria: Option<PathBuf>,

    /// Workflow config file (JSON); falls back to $GROUNDCHECK_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let workflow_config = config::load_config(cli.config.as_deref())?;
    let criteria = cli
        .criteria
        .as_deref()
        .map(config::load_criteria)
        .transpose()?;

    let bundles = cli
        .inputs
        .iter()
        .map(|path| InputBundle::load(path))
        .collect::<Result<Vec<_>>>()?;

    let store = input::build_store(&bundles)?;
    let workflow = ValidationWorkflow::new(store, ThresholdCriteriaEngine::new())
        .with_config(workflow_config)?;

    let mut history = ValidationHistory::new();
    let mut results = Vec::with_capacity(bundles.len());
    let mut errors = Vec::new();

    for bundle in &bundles {
        let request = ValidationRequest {
            session_id: bundle.session_id().to_string(),
            tolerance_ms: cli.tolerance_ms,
            historical_latencies: bundle.historical_latencies.clone(),
            criteria: criteria.clone(),
        };

        match workflow.validate_recorded(&request, &mut history).await {
            Ok(result) => results.push(result),
            Err(err) => {
                warn!("Validation of {} failed: {}", request.session_id, err);
                errors.push(format!("{}: {}", request.session_id, err));
            }
        }
    }

    let summary = history.summary();
    if cli.json {
        println!("{}", output::format_json(&results, &errors, &summary));
    } else {
        for result in &results {
            println!("{}", output::format_human(result));
        }
        for error in &errors {
            eprintln!("error: {}", error);
        }
        if bundles.len() > 1 {
            println!("{}", output::format_summary(&summary));
        }
    }

    let failed =
        !errors.is_empty() || results.iter().any(|r| r.test_verdict == TestVerdict::Fail);
    if failed {
        std::process::exit(1);
    }

    Ok(())
}
