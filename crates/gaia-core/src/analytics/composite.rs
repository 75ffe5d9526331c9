//! Composite score calculator.
//!
//! Maps raw spectral-index summaries plus a handful of field scalars to five
//! bounded 0–100 scores. Every input is optional; absent values fall back to
//! the documented defaults below, so an empty `RawIndexSet` still yields a
//! deterministic baseline.
//!
//!   VHS = 100 · (0.5·n(NDVI, −0.2, 0.9) + 0.3·n(EVI, −0.2, 0.8) + 0.2·n(SAVI, −0.2, 0.8))
//!   WSS = 100 · (1 − (0.6·n(NDWI, −0.5, 0.5) + 0.4·n(rain, 0, 500)))
//!   PS  = clamp(0.6·VHS + 0.3·(100 − WSS) + 0.1·soil)
//!   ERS = clamp(0.4·WSS + 0.3·pest + 0.3·weather)
//!   GSS = clamp(0.35·VHS + 0.35·PS + 0.30·(100 − ERS))
use serde::{Deserialize, Serialize};

use crate::math::round_to;

pub const DEFAULT_NDVI: f64 = 0.5;
pub const DEFAULT_NDWI: f64 = 0.2;
pub const DEFAULT_EVI: f64 = 0.4;
pub const DEFAULT_SAVI: f64 = 0.45;
pub const DEFAULT_RAINFALL_MM: f64 = 0.0;
pub const DEFAULT_SOIL_HEALTH: f64 = 50.0;
pub const DEFAULT_PEST_RISK: f64 = 30.0;
pub const DEFAULT_WEATHER_RISK: f64 = 40.0;

/// Region-level summary of one spectral index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSummary {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Raw indices for one area and time window, as delivered by the
/// Earth-observation provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawIndexSet {
    pub ndvi: Option<IndexSummary>,
    pub ndwi: Option<IndexSummary>,
    pub evi: Option<IndexSummary>,
    pub savi: Option<IndexSummary>,
    /// Accumulated rainfall in mm.
    pub rainfall: Option<f64>,
    /// 0–100.
    pub soil_health: Option<f64>,
    /// 0–100.
    pub pest_risk: Option<f64>,
    /// 0–100.
    pub weather_risk: Option<f64>,
}

fn mean_or(summary: Option<IndexSummary>, default: f64) -> f64 {
    summary.and_then(|s| s.mean).unwrap_or(default)
}

impl RawIndexSet {
    pub fn ndvi_mean(&self) -> f64 {
        mean_or(self.ndvi, DEFAULT_NDVI)
    }

    pub fn ndwi_mean(&self) -> f64 {
        mean_or(self.ndwi, DEFAULT_NDWI)
    }

    pub fn evi_mean(&self) -> f64 {
        mean_or(self.evi, DEFAULT_EVI)
    }

    pub fn savi_mean(&self) -> f64 {
        mean_or(self.savi, DEFAULT_SAVI)
    }

    pub fn rainfall_mm(&self) -> f64 {
        self.rainfall.unwrap_or(DEFAULT_RAINFALL_MM)
    }

    pub fn soil_health(&self) -> f64 {
        self.soil_health.unwrap_or(DEFAULT_SOIL_HEALTH)
    }

    pub fn pest_risk(&self) -> f64 {
        self.pest_risk.unwrap_or(DEFAULT_PEST_RISK)
    }

    pub fn weather_risk(&self) -> f64 {
        self.weather_risk.unwrap_or(DEFAULT_WEATHER_RISK)
    }
}

/// Five composite scores, each in [0, 100] and rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeScoreSet {
    pub vegetation_health: f64,
    /// Higher = more stress.
    pub water_stress: f64,
    pub productivity: f64,
    pub environmental_risk: f64,
    pub sustainability: f64,
}

/// Linearly scale `value` from [min, max] into [0, 1], clamped.
/// A degenerate range (min == max) yields 0.5 for any input.
pub fn normalize_value(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.5;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

fn clamp_score(x: f64) -> f64 {
    x.clamp(0.0, 100.0)
}

pub fn vegetation_health_score(ndvi: f64, evi: f64, savi: f64) -> f64 {
    let ndvi_n = normalize_value(ndvi, -0.2, 0.9);
    let evi_n = normalize_value(evi, -0.2, 0.8);
    let savi_n = normalize_value(savi, -0.2, 0.8);
    (ndvi_n * 0.5 + evi_n * 0.3 + savi_n * 0.2) * 100.0
}

pub fn water_stress_score(ndwi: f64, rainfall_mm: f64) -> f64 {
    let ndwi_n = normalize_value(ndwi, -0.5, 0.5);
    let rain_n = normalize_value(rainfall_mm, 0.0, 500.0);
    let availability = ndwi_n * 0.6 + rain_n * 0.4;
    (1.0 - availability) * 100.0
}

pub fn productivity_score(vhs: f64, wss: f64, soil_health: f64) -> f64 {
    clamp_score(vhs * 0.6 + (100.0 - wss) * 0.3 + soil_health * 0.1)
}

pub fn environmental_risk_score(wss: f64, pest_risk: f64, weather_risk: f64) -> f64 {
    clamp_score(wss * 0.4 + pest_risk * 0.3 + weather_risk * 0.3)
}

pub fn sustainability_score(vhs: f64, ps: f64, ers: f64) -> f64 {
    clamp_score(vhs * 0.35 + ps * 0.35 + (100.0 - ers) * 0.30)
}

/// Compute all five composite scores. Intermediate values stay unrounded;
/// only the reported scores are rounded to one decimal.
pub fn calculate_composite_scores(raw: &RawIndexSet) -> CompositeScoreSet {
    let vhs = vegetation_health_score(raw.ndvi_mean(), raw.evi_mean(), raw.savi_mean());
    let wss = water_stress_score(raw.ndwi_mean(), raw.rainfall_mm());
    let ps = productivity_score(vhs, wss, raw.soil_health());
    let ers = environmental_risk_score(wss, raw.pest_risk(), raw.weather_risk());
    let gss = sustainability_score(vhs, ps, ers);

    CompositeScoreSet {
        vegetation_health: round_to(vhs, 1),
        water_stress: round_to(wss, 1),
        productivity: round_to(ps, 1),
        environmental_risk: round_to(ers, 1),
        sustainability: round_to(gss, 1),
    }
}

/// Qualitative band for a 0–100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreBand {
    Excellent,
    Good,
    Moderate,
    Poor,
    Critical,
}

pub fn interpret_score(score: f64) -> ScoreBand {
    if score >= 80.0 {
        ScoreBand::Excellent
    } else if score >= 60.0 {
        ScoreBand::Good
    } else if score >= 40.0 {
        ScoreBand::Moderate
    } else if score >= 20.0 {
        ScoreBand::Poor
    } else {
        ScoreBand::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalize_stays_in_unit_interval() {
        for x in [-10.0, -0.2, 0.0, 0.35, 0.9, 5.0] {
            let n = normalize_value(x, -0.2, 0.9);
            assert!((0.0..=1.0).contains(&n), "n({x}) = {n}");
        }
        assert_eq!(normalize_value(-10.0, -0.2, 0.9), 0.0);
        assert_eq!(normalize_value(10.0, -0.2, 0.9), 1.0);
    }

    #[test]
    fn normalize_degenerate_range_is_half() {
        for x in [-1e9, 0.0, 3.0, 1e9] {
            assert_eq!(normalize_value(x, 2.0, 2.0), 0.5);
        }
    }

    #[test]
    fn empty_input_gives_default_baseline() {
        let scores = calculate_composite_scores(&RawIndexSet::default());
        // VHS = 100·(0.5·0.7/1.1 + 0.3·0.6 + 0.2·0.65) = 62.818…
        assert_eq!(scores.vegetation_health, 62.8);
        // WSS = 100·(1 − 0.6·0.7) = 58
        assert_eq!(scores.water_stress, 58.0);
        // PS = 0.6·62.818 + 0.3·42 + 5 = 55.29…
        assert_eq!(scores.productivity, 55.3);
        // ERS = 23.2 + 9 + 12
        assert_eq!(scores.environmental_risk, 44.2);
        // GSS = 0.35·62.818 + 0.35·55.291 + 0.3·55.8 = 58.078…
        assert_eq!(scores.sustainability, 58.1);
    }

    #[test]
    fn extreme_inputs_stay_bounded() {
        let worst = RawIndexSet {
            ndvi: Some(IndexSummary { mean: Some(-5.0), ..Default::default() }),
            ndwi: Some(IndexSummary { mean: Some(-5.0), ..Default::default() }),
            evi: Some(IndexSummary { mean: Some(-5.0), ..Default::default() }),
            savi: Some(IndexSummary { mean: Some(-5.0), ..Default::default() }),
            rainfall: Some(-100.0),
            soil_health: Some(-500.0),
            pest_risk: Some(500.0),
            weather_risk: Some(500.0),
        };
        let best = RawIndexSet {
            ndvi: Some(IndexSummary { mean: Some(5.0), ..Default::default() }),
            ndwi: Some(IndexSummary { mean: Some(5.0), ..Default::default() }),
            evi: Some(IndexSummary { mean: Some(5.0), ..Default::default() }),
            savi: Some(IndexSummary { mean: Some(5.0), ..Default::default() }),
            rainfall: Some(10_000.0),
            soil_health: Some(500.0),
            pest_risk: Some(-500.0),
            weather_risk: Some(-500.0),
        };
        for raw in [worst, best] {
            let s = calculate_composite_scores(&raw);
            for v in [s.vegetation_health, s.water_stress, s.productivity, s.environmental_risk, s.sustainability] {
                assert!((0.0..=100.0).contains(&v), "score out of range: {v}");
            }
        }
    }

    #[test]
    fn water_stress_drops_with_rain() {
        let dry = water_stress_score(0.0, 0.0);
        let wet = water_stress_score(0.0, 500.0);
        assert_abs_diff_eq!(dry - wet, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_mean_in_present_summary_uses_default() {
        let raw = RawIndexSet {
            ndvi: Some(IndexSummary { std: Some(0.1), ..Default::default() }),
            ..Default::default()
        };
        assert_eq!(raw.ndvi_mean(), DEFAULT_NDVI);
    }

    #[test]
    fn score_bands_follow_thresholds() {
        assert_eq!(interpret_score(80.0), ScoreBand::Excellent);
        assert_eq!(interpret_score(79.9), ScoreBand::Good);
        assert_eq!(interpret_score(40.0), ScoreBand::Moderate);
        assert_eq!(interpret_score(20.0), ScoreBand::Poor);
        assert_eq!(interpret_score(19.9), ScoreBand::Critical);
    }
}
