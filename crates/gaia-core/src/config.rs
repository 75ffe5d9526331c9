//! Engine configuration, loadable from JSON.
//! Every field is optional in JSON; `EngineConfig::default()` carries the
//! calibrated constants.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analytics::cluster::KMeans;
use crate::analytics::statistics::DEFAULT_ANOMALY_THRESHOLD;
use crate::analytics::zones::DEFAULT_N_ZONES;
use crate::error::{CoreError, Result};
use crate::terroir::gaps::{default_gap_rules, FallbackPolicy, GapRule};
use crate::terroir::matcher::VarianceConfig;
use crate::terroir::reference::SimilarityWeights;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        let km = KMeans::default();
        Self {
            seed: 42,
            n_init: km.n_init,
            max_iter: km.max_iter,
            tolerance: km.tolerance,
        }
    }
}

impl ClusteringConfig {
    pub fn kmeans(&self) -> KMeans {
        KMeans {
            n_init: self.n_init,
            max_iter: self.max_iter,
            tolerance: self.tolerance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// |z| threshold for spatial anomalies.
    pub anomaly_threshold: f64,
    /// Zones produced by segmentation.
    pub n_zones: usize,
    pub clustering: ClusteringConfig,
    /// Unmodeled-dimension term of the matching distance.
    pub variance: VarianceConfig,
    pub weights: SimilarityWeights,
    pub benchmark_fallback: FallbackPolicy,
    pub gap_rules: Vec<GapRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            n_zones: DEFAULT_N_ZONES,
            clustering: ClusteringConfig::default(),
            variance: VarianceConfig::default(),
            weights: SimilarityWeights::default(),
            benchmark_fallback: FallbackPolicy::default(),
            gap_rules: default_gap_rules(),
        }
    }
}

fn non_negative(name: &str, v: f64) -> Result<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(CoreError::Config(format!("{name} must be a non-negative number, got {v}")));
    }
    Ok(())
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        non_negative("anomaly_threshold", self.anomaly_threshold)?;
        if self.n_zones == 0 {
            return Err(CoreError::Config("n_zones must be at least 1".into()));
        }
        if self.clustering.n_init == 0 || self.clustering.max_iter == 0 {
            return Err(CoreError::Config("clustering n_init and max_iter must be at least 1".into()));
        }
        non_negative("clustering.tolerance", self.clustering.tolerance)?;
        non_negative("weights.soil", self.weights.soil)?;
        non_negative("weights.climate", self.weights.climate)?;
        non_negative("weights.satellite_signals", self.weights.satellite_signals)?;
        non_negative("weights.biological", self.weights.biological)?;
        if let VarianceConfig::Constant { value } = self.variance {
            non_negative("variance.value", value)?;
        }
        for rule in &self.gap_rules {
            non_negative(&format!("gap rule '{}' threshold", rule.parameter), rule.threshold)?;
        }
        Ok(())
    }
}
