//! Homogeneous zone segmentation of an index raster.
//!
//! Valid pixels are clustered on their index value alone; each cluster
//! becomes a zone annotated with a health class and a risk class derived
//! from its mean index. Zones are reported best-first.
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cluster::Clusterer;
use super::Sufficiency;
use crate::error::{CoreError, Result};
use crate::math::{mean, population_std, round_to};
use crate::raster::IndexRaster;

pub const DEFAULT_N_ZONES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl HealthStatus {
    /// >0.7 Excellent, >0.5 Good, >0.3 Moderate, else Poor.
    pub fn from_index(value: f64) -> Self {
        if value > 0.7 {
            HealthStatus::Excellent
        } else if value > 0.5 {
            HealthStatus::Good
        } else if value > 0.3 {
            HealthStatus::Moderate
        } else {
            HealthStatus::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// >0.6 Low, >0.4 Medium, else High.
    pub fn from_index(value: f64) -> Self {
        if value > 0.6 {
            RiskLevel::Low
        } else if value > 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// 1-based cluster id, assigned before sorting.
    pub zone_id: usize,
    /// Rounded to 1 decimal.
    pub area_percent: f64,
    /// Rounded to 3 decimals.
    pub avg_index: f64,
    /// Population std, rounded to 3 decimals.
    pub std_index: f64,
    pub health_status: HealthStatus,
    pub risk_level: RiskLevel,
    pub pixel_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSegmentation {
    pub status: Sufficiency,
    /// Sorted by `avg_index` descending; equal averages keep zone_id order.
    pub zones: Vec<Zone>,
    pub n_zones: usize,
    pub total_pixels: usize,
}

/// Cluster the finite pixels of `raster` into `n_zones` zones.
///
/// With fewer valid pixels than zones no clustering is attempted and the
/// result carries `Sufficiency::Insufficient`. Clusters that end up empty
/// (fewer distinct values than zones) are omitted.
pub fn segment_homogeneous_zones<C: Clusterer + ?Sized>(
    raster: &IndexRaster,
    n_zones: usize,
    clusterer: &C,
    seed: u64,
) -> Result<ZoneSegmentation> {
    if n_zones == 0 {
        return Err(CoreError::InvalidInput("n_zones must be at least 1".into()));
    }
    raster.validate()?;

    let values = raster.valid_values();
    if values.len() < n_zones {
        debug!(valid = values.len(), n_zones, "segmentation skipped: too few valid pixels");
        return Ok(ZoneSegmentation {
            status: Sufficiency::Insufficient {
                required: n_zones,
                available: values.len(),
            },
            zones: Vec::new(),
            n_zones,
            total_pixels: values.len(),
        });
    }

    let labels = clusterer.cluster(&values, n_zones, seed);
    if labels.len() != values.len() {
        return Err(CoreError::InvalidInput(format!(
            "clusterer returned {} labels for {} pixels",
            labels.len(),
            values.len()
        )));
    }

    let mut members: Vec<Vec<f64>> = vec![Vec::new(); n_zones];
    for (&label, &v) in labels.iter().zip(values.iter()) {
        let slot = members.get_mut(label).ok_or_else(|| {
            CoreError::InvalidInput(format!("cluster label {label} out of range 0..{n_zones}"))
        })?;
        slot.push(v);
    }

    let total = values.len() as f64;
    let mut zones: Vec<Zone> = members
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.is_empty())
        .map(|(i, m)| {
            let avg = mean(m);
            Zone {
                zone_id: i + 1,
                area_percent: round_to(m.len() as f64 / total * 100.0, 1),
                avg_index: round_to(avg, 3),
                std_index: round_to(population_std(m), 3),
                health_status: HealthStatus::from_index(avg),
                risk_level: RiskLevel::from_index(avg),
                pixel_count: m.len(),
            }
        })
        .collect();

    // Stable: ties keep ascending zone_id.
    zones.sort_by(|a, b| b.avg_index.total_cmp(&a.avg_index));

    Ok(ZoneSegmentation {
        status: Sufficiency::Sufficient,
        zones,
        n_zones,
        total_pixels: values.len(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetterZone {
    A,
    B,
    Equal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericDifference {
    pub zone_a: f64,
    pub zone_b: f64,
    /// a − b, rounded to 3 decimals.
    pub difference: f64,
    pub better_zone: BetterZone,
}

impl NumericDifference {
    fn between(a: f64, b: f64) -> Self {
        let better_zone = if a > b {
            BetterZone::A
        } else if b > a {
            BetterZone::B
        } else {
            BetterZone::Equal
        };
        Self {
            zone_a: a,
            zone_b: b,
            difference: round_to(a - b, 3),
            better_zone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneComparison {
    pub zone_a_id: usize,
    pub zone_b_id: usize,
    pub avg_index: NumericDifference,
    pub area_percent: NumericDifference,
    pub same_health_status: bool,
    pub same_risk_level: bool,
    /// Zone with the higher average index; `b` wins ties.
    pub healthier_zone_id: usize,
}

pub fn compare_zones(a: &Zone, b: &Zone) -> ZoneComparison {
    ZoneComparison {
        zone_a_id: a.zone_id,
        zone_b_id: b.zone_id,
        avg_index: NumericDifference::between(a.avg_index, b.avg_index),
        area_percent: NumericDifference::between(a.area_percent, b.area_percent),
        same_health_status: a.health_status == b.health_status,
        same_risk_level: a.risk_level == b.risk_level,
        healthier_zone_id: if a.avg_index > b.avg_index { a.zone_id } else { b.zone_id },
    }
}
