//! t-distribution confidence intervals for a sample mean.

use super::distribution::{mean, sample_std_dev};
use super::student_t;
use crate::config::MIN_INTERVAL_SAMPLES;
use crate::stats::Section;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub mean: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence_level: f64,
    pub margin_of_error: f64,
    pub standard_error: f64,
}

impl ConfidenceInterval {
    /// Formats the interval as "mean [lower, upper]".
    pub fn format(&self, precision: usize) -> String {
        format!(
            "{:.prec$} [{:.prec$}, {:.prec$}]",
            self.mean,
            self.lower_bound,
            self.upper_bound,
            prec = precision
        )
    }
}

/// Interval estimate of the population mean at `level` (e.g. 0.95).
///
/// Uses the sample standard deviation and Student's t with n - 1 degrees of
/// freedom. A quantile failure degrades to [`Section::Failed`].
pub fn confidence_interval(values: &[f64], level: f64) -> Section<ConfidenceInterval> {
    if values.len() < MIN_INTERVAL_SAMPLES {
        tracing::debug!(
            required = MIN_INTERVAL_SAMPLES,
            available = values.len(),
            "too few values for a confidence interval"
        );
        return Section::Insufficient {
            required: MIN_INTERVAL_SAMPLES,
            available: values.len(),
        };
    }

    let n = values.len();
    // A constant sample must give a zero-width interval at exactly that value,
    // which summation rounding would otherwise break.
    let (mu, standard_error) = if values.iter().all(|&v| v == values[0]) {
        (values[0], 0.0)
    } else {
        (mean(values), sample_std_dev(values) / (n as f64).sqrt())
    };

    let t = match student_t::ppf((1.0 + level) / 2.0, (n - 1) as f64) {
        Ok(t) => t,
        Err(err) => {
            tracing::warn!(error = %err, level, n, "t quantile lookup failed");
            return Section::Failed {
                reason: err.to_string(),
            };
        }
    };
    let margin = t * standard_error;

    Section::Computed(ConfidenceInterval {
        mean: mu,
        lower_bound: mu - margin,
        upper_bound: mu + margin,
        confidence_level: level,
        margin_of_error: margin,
        standard_error,
    })
}
