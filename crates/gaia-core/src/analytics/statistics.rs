//! Descriptive statistics and z-score anomaly detection over pixel samples.
//!
//! Non-finite values (NaN no-data markers, infinities) are dropped before any
//! computation; counts and percentages refer to the finite samples only.
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Sufficiency;
use crate::error::{CoreError, Result};
use crate::math::{mean, percentile_sorted, population_std};

/// Default |z| above which a sample counts as anomalous (≈95% two-sided).
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;
/// Minimum sample count for anomaly detection.
pub const MIN_ANOMALY_SAMPLES: usize = 3;
/// Flagged values reported back for inspection.
const MAX_ANOMALY_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSummary {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub status: Sufficiency,
    pub anomaly_count: usize,
    pub anomaly_percent: f64,
    pub threshold: f64,
    /// First flagged values in input order, at most 10.
    pub anomalies: Vec<f64>,
}

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Mean, median, population std, extrema and quartiles.
/// All fields are zero when no finite value is present.
pub fn analyze_statistics(values: &[f64]) -> StatisticalSummary {
    let mut sorted = finite(values);
    if sorted.is_empty() {
        return StatisticalSummary::default();
    }
    sorted.sort_by(f64::total_cmp);

    StatisticalSummary {
        mean: mean(&sorted),
        median: percentile_sorted(&sorted, 50.0),
        std: population_std(&sorted),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p25: percentile_sorted(&sorted, 25.0),
        p75: percentile_sorted(&sorted, 75.0),
    }
}

/// Flag values whose |z| = |x − μ| / σ exceeds `threshold`.
///
/// Needs at least three samples; fewer yields an `Insufficient` report with
/// zero counts. A constant series has σ = 0 and therefore no anomalies.
pub fn detect_spatial_anomalies(values: &[f64], threshold: f64) -> Result<AnomalyReport> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(CoreError::InvalidInput(format!(
            "anomaly threshold must be a non-negative number, got {threshold}"
        )));
    }

    let samples = finite(values);
    if samples.len() < MIN_ANOMALY_SAMPLES {
        debug!(available = samples.len(), "anomaly detection skipped: too few samples");
        return Ok(AnomalyReport {
            status: Sufficiency::Insufficient {
                required: MIN_ANOMALY_SAMPLES,
                available: samples.len(),
            },
            anomaly_count: 0,
            anomaly_percent: 0.0,
            threshold,
            anomalies: Vec::new(),
        });
    }

    let mu = mean(&samples);
    let sigma = population_std(&samples);

    let flagged: Vec<f64> = if sigma < 1e-12 {
        Vec::new()
    } else {
        samples
            .iter()
            .copied()
            .filter(|&v| ((v - mu) / sigma).abs() > threshold)
            .collect()
    };

    Ok(AnomalyReport {
        status: Sufficiency::Sufficient,
        anomaly_count: flagged.len(),
        anomaly_percent: flagged.len() as f64 / samples.len() as f64 * 100.0,
        threshold,
        anomalies: flagged.into_iter().take(MAX_ANOMALY_SAMPLES).collect(),
    })
}
