//! Gap detection against a benchmark reference terroir.
//!
//! Each `GapRule` names a fingerprint feature, where its reference value
//! comes from, a tolerance, and the remediation to recommend on either side
//! of the reference. New dimensions are added as rules in configuration.
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fingerprint::{Feature, TerroirFingerprint};
use super::reference::{ReferenceDatabase, ReferenceTerroir, SampleKey};
use crate::error::{CoreError, Result};
use crate::math::round_to;

/// Reference pH used for the built-in soil chemistry rule.
pub const REFERENCE_SOIL_PH: f64 = 7.2;
pub const SOIL_PH_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ReferenceValue {
    /// Same constant for every benchmark.
    Fixed { value: f64 },
    /// Read from the benchmark's sample.
    Benchmark { key: SampleKey },
}

impl ReferenceValue {
    fn resolve(&self, benchmark: &ReferenceTerroir) -> Option<f64> {
        match self {
            ReferenceValue::Fixed { value } => Some(*value),
            ReferenceValue::Benchmark { key } => benchmark.sample.value(*key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapRule {
    pub category: String,
    pub parameter: String,
    pub feature: Feature,
    pub reference: ReferenceValue,
    /// A gap is raised when |observed − reference| > threshold.
    pub threshold: f64,
    pub impact: String,
    /// Recommendation when the parcel is below the reference.
    pub below: String,
    /// Recommendation when the parcel is above the reference.
    pub above: String,
}

/// The built-in rule table: soil pH against 7.2 ± 0.5.
pub fn default_gap_rules() -> Vec<GapRule> {
    vec![GapRule {
        category: "Soil Chemical".into(),
        parameter: "pH".into(),
        feature: Feature::SoilPh,
        reference: ReferenceValue::Fixed { value: REFERENCE_SOIL_PH },
        threshold: SOIL_PH_TOLERANCE,
        impact: "Nutrient availability limitation".into(),
        below: "Liming".into(),
        above: "Acidification".into(),
    }]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GapStatus {
    Deviation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub category: String,
    pub parameter: String,
    pub status: GapStatus,
    pub impact: String,
    pub recommendation: String,
    pub observed: f64,
    pub reference: f64,
    /// observed − reference, rounded to 3 decimals.
    pub deviation: f64,
}

/// What happens when the requested benchmark id is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Use the first reference and say so in the report.
    #[default]
    FirstReference,
    /// Fail with `CoreError::MissingReference`.
    Strict,
}

/// How the benchmark was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum BenchmarkResolution {
    Found { id: String },
    Fallback { requested: String, used: String },
}

impl BenchmarkResolution {
    pub fn used_id(&self) -> &str {
        match self {
            BenchmarkResolution::Found { id } => id,
            BenchmarkResolution::Fallback { used, .. } => used,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, BenchmarkResolution::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub benchmark: BenchmarkResolution,
    pub gaps: Vec<Gap>,
}

fn resolve_benchmark<'a>(
    database: &'a ReferenceDatabase,
    benchmark_id: &str,
    policy: FallbackPolicy,
) -> Result<(&'a ReferenceTerroir, BenchmarkResolution)> {
    if let Some(found) = database.get(benchmark_id) {
        return Ok((found, BenchmarkResolution::Found { id: found.id.clone() }));
    }
    let missing = || CoreError::MissingReference {
        requested: benchmark_id.to_string(),
    };
    match policy {
        FallbackPolicy::Strict => Err(missing()),
        FallbackPolicy::FirstReference => {
            let first = database.first().ok_or_else(missing)?;
            warn!(requested = benchmark_id, used = %first.id, "benchmark not found, falling back to first reference");
            Ok((
                first,
                BenchmarkResolution::Fallback {
                    requested: benchmark_id.to_string(),
                    used: first.id.clone(),
                },
            ))
        }
    }
}

/// Compare the fingerprint with the benchmark under every rule and report
/// the deviations that exceed their threshold, in rule order.
pub fn detect_critical_gaps(
    fingerprint: &TerroirFingerprint,
    benchmark_id: &str,
    database: &ReferenceDatabase,
    rules: &[GapRule],
    policy: FallbackPolicy,
) -> Result<GapReport> {
    let (benchmark, resolution) = resolve_benchmark(database, benchmark_id, policy)?;

    let mut gaps = Vec::new();
    for rule in rules {
        let Some(reference) = rule.reference.resolve(benchmark) else {
            debug!(parameter = %rule.parameter, benchmark = %benchmark.id, "gap rule skipped: benchmark has no value");
            continue;
        };
        let observed = fingerprint.get(rule.feature);
        let deviation = observed - reference;
        if deviation.abs() > rule.threshold {
            let recommendation = if observed < reference { &rule.below } else { &rule.above };
            gaps.push(Gap {
                category: rule.category.clone(),
                parameter: rule.parameter.clone(),
                status: GapStatus::Deviation,
                impact: rule.impact.clone(),
                recommendation: recommendation.clone(),
                observed,
                reference,
                deviation: round_to(deviation, 3),
            });
        }
    }

    Ok(GapReport {
        benchmark: resolution,
        gaps,
    })
}
