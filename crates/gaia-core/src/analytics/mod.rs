//! Area analytics: composite scores, statistics, trends and zoning.
//!
//! Every operation here is a pure function of its inputs. None of them
//! depends on another's output; composition is left to the caller.

pub mod alerts;
pub mod cluster;
pub mod composite;
pub mod statistics;
pub mod trend;
pub mod zones;

use serde::{Deserialize, Serialize};

pub use alerts::{detect_alerts, Alert};
pub use cluster::{Clusterer, KMeans};
pub use composite::{calculate_composite_scores, interpret_score, normalize_value, CompositeScoreSet, RawIndexSet};
pub use statistics::{analyze_statistics, detect_spatial_anomalies, AnomalyReport, StatisticalSummary};
pub use trend::{analyze_temporal_trends, compare_periods, TrendReport, TrendSample};
pub use zones::{compare_zones, segment_homogeneous_zones, Zone, ZoneSegmentation};

/// Whether an operation had enough samples to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Sufficiency {
    Sufficient,
    Insufficient { required: usize, available: usize },
}

impl Sufficiency {
    pub fn is_sufficient(&self) -> bool {
        matches!(self, Sufficiency::Sufficient)
    }
}
