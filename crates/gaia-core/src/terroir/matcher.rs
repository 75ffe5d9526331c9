//! Reference matching by a weighted, Euclidean-style distance proxy.
//!
//! This is not a Mahalanobis distance: there is no population covariance
//! matrix. The distance combines two soil-weighted terms with an additive
//! variance term standing in for dimensions the fingerprint does not model:
//!
//!   d = w_soil · |elevation − ref.elevation_avg| / 100
//!     + w_soil · |clay% − ref.clay_content| / 20
//!     + v,        v ~ U[0.1, 0.5) by default
//!
//!   similarity = clamp(100 − 10·d, 0, 100)
//!
//! `v` comes from an injected `VarianceSource` so runs can be reproduced
//! (seeded) or made exact (off / constant).
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fingerprint::{Feature, TerroirFingerprint};
use super::reference::{ReferenceDatabase, ReferenceSample, SimilarityWeights};
use crate::math::round_to;

pub const VARIANCE_MIN: f64 = 0.1;
pub const VARIANCE_MAX: f64 = 0.5;

const ELEVATION_SCALE_M: f64 = 100.0;
const CLAY_SCALE_PERCENT: f64 = 20.0;

/// Source of the additive unmodeled-dimension term.
#[derive(Debug, Clone)]
pub enum VarianceSource {
    Off,
    Constant(f64),
    Sampled(StdRng),
}

impl VarianceSource {
    pub fn seeded(seed: u64) -> Self {
        VarianceSource::Sampled(StdRng::seed_from_u64(seed))
    }

    /// Non-reproducible sampling from OS entropy.
    pub fn from_entropy() -> Self {
        VarianceSource::Sampled(StdRng::from_entropy())
    }

    pub fn draw(&mut self) -> f64 {
        match self {
            VarianceSource::Off => 0.0,
            VarianceSource::Constant(v) => *v,
            VarianceSource::Sampled(rng) => rng.gen_range(VARIANCE_MIN..VARIANCE_MAX),
        }
    }
}

/// Serializable description of a `VarianceSource`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum VarianceConfig {
    Off,
    Constant { value: f64 },
    /// `seed: null` draws from OS entropy.
    Sampled { seed: Option<u64> },
}

impl Default for VarianceConfig {
    fn default() -> Self {
        VarianceConfig::Sampled { seed: Some(42) }
    }
}

impl VarianceConfig {
    pub fn source(&self) -> VarianceSource {
        match *self {
            VarianceConfig::Off => VarianceSource::Off,
            VarianceConfig::Constant { value } => VarianceSource::Constant(value),
            VarianceConfig::Sampled { seed: Some(seed) } => VarianceSource::seeded(seed),
            VarianceConfig::Sampled { seed: None } => VarianceSource::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: String,
    pub name: String,
    /// 0–100, rounded to 1 decimal.
    pub similarity_score: f64,
    /// Rounded to 2 decimals.
    pub distance: f64,
}

/// Deterministic part of the distance (no variance term).
pub fn weighted_distance(
    fingerprint: &TerroirFingerprint,
    sample: &ReferenceSample,
    weights: &SimilarityWeights,
) -> f64 {
    let elevation = fingerprint.get(Feature::Elevation);
    let clay = fingerprint.get(Feature::ClayPercent);

    // Soil weight stands in for the terrain term as well.
    let topo = (elevation - sample.elevation_avg()).abs() / ELEVATION_SCALE_M * weights.soil;
    let soil = (clay - sample.clay_content()).abs() / CLAY_SCALE_PERCENT * weights.soil;
    topo + soil
}

pub fn similarity_from_distance(distance: f64) -> f64 {
    (100.0 - distance * 10.0).clamp(0.0, 100.0)
}

/// Score the fingerprint against every reference, best match first.
/// Equal scores keep database order. One variance draw per reference.
pub fn find_matching_terroir(
    fingerprint: &TerroirFingerprint,
    database: &ReferenceDatabase,
    weights: &SimilarityWeights,
    variance: &mut VarianceSource,
) -> Vec<MatchResult> {
    let mut matches: Vec<MatchResult> = database
        .entries()
        .iter()
        .map(|r| {
            let distance = weighted_distance(fingerprint, &r.sample, weights) + variance.draw();
            MatchResult {
                id: r.id.clone(),
                name: r.name.clone(),
                similarity_score: round_to(similarity_from_distance(distance), 1),
                distance: round_to(distance, 2),
            }
        })
        .collect();

    matches.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    debug!(
        references = matches.len(),
        best = matches.first().map(|m| m.id.as_str()).unwrap_or("-"),
        "terroir matching done"
    );
    matches
}
