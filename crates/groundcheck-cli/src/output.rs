//! Output formatting for validation results.
//!
//! Supports both a human-readable scorecard and JSON for scripting.

use groundcheck_core::history::HistorySummary;
use groundcheck_core::ValidationResult;
use serde::Serialize;
use std::fmt::Write;

/// JSON output for a batch of runs
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub results: &'a [ValidationResult],
    /// Failed runs as "session: error"
    pub errors: &'a [String],
    pub summary: &'a HistorySummary,
}

/// Formats a batch of results as JSON.
pub fn format_json(
    results: &[ValidationResult],
    errors: &[String],
    summary: &HistorySummary,
) -> String {
    let output = JsonOutput {
        results,
        errors,
        summary,
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

/// Formats one result as a terminal scorecard.
pub fn format_human(result: &ValidationResult) -> String {
    let mut out = String::new();
    let m = &result.performance_metrics;
    let t = &result.temporal_metrics;

    let _ = writeln!(
        out,
        "Session {}: {} (score {:.3})",
        result.session_id, result.test_verdict, result.overall_score
    );
    let _ = writeln!(
        out,
        "  Tolerance   {:.1} ms ({})",
        result.tolerance_ms,
        result.tolerance_source.as_str()
    );
    let _ = writeln!(
        out,
        "  Matches     TP {}  FP {}  FN {}",
        m.true_positives, m.false_positives, m.false_negatives
    );
    let _ = writeln!(
        out,
        "  Metrics     precision {}  recall {}  F1 {}  accuracy {}",
        pct(m.precision),
        pct(m.recall),
        pct(m.f1_score),
        pct(m.accuracy)
    );
    let _ = writeln!(
        out,
        "  Timing      mean {:.1} ms  std {:.1} ms  within tolerance {:.1}%",
        t.mean_timing_error_ms, t.std_timing_error_ms, t.within_tolerance_percentage
    );
    if let Some(ci) = result
        .statistical_results
        .confidence_intervals
        .confidence
        .computed()
    {
        let _ = writeln!(
            out,
            "  Confidence  {} ({:.0}% CI)",
            ci.format(3),
            ci.confidence_level * 100.0
        );
    }

    if result.per_class_metrics.len() > 1 {
        let _ = writeln!(out, "\n  Per class:");
        for (label, c) in &result.per_class_metrics {
            let _ = writeln!(
                out,
                "    {:<14} precision {}  recall {}  F1 {}",
                label,
                pct(c.precision),
                pct(c.recall),
                pct(c.f1_score)
            );
        }
    }

    let _ = writeln!(out, "\n  Criteria:");
    for outcome in &result.criteria_outcomes {
        let _ = writeln!(
            out,
            "    [{}] {:<20} {:.3} (threshold {:.3})",
            if outcome.passed { "ok" } else { "--" },
            outcome.name,
            outcome.actual,
            outcome.threshold
        );
    }

    let analysis = &result.detailed_analysis;
    for (title, items) in [
        ("Insights", &analysis.insights),
        ("Statistics", &analysis.statistical_insights),
        ("Strengths", &analysis.strengths),
        ("Weaknesses", &analysis.weaknesses),
        ("Recommendations", &analysis.recommendations),
    ] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n  {}:", title);
        for item in items {
            let _ = writeln!(out, "    - {}", item);
        }
    }

    out
}

/// Formats the batch summary printed after several runs.
pub fn format_summary(summary: &HistorySummary) -> String {
    format!(
        "{} runs: {} passed, {} warnings, {} failed (pass rate {}, mean score {:.3}, mean F1 {:.3})",
        summary.runs,
        summary.passed,
        summary.warnings,
        summary.failed,
        pct(summary.pass_rate),
        summary.mean_score,
        summary.mean_f1
    )
}
