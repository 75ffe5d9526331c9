//! Terroir fingerprinting, reference matching and gap analysis.
//!
//! `TerroirEngine` bundles a reference database with the matching and gap
//! configuration. The free functions in the sub-modules remain usable on
//! their own.

pub mod fingerprint;
pub mod gaps;
pub mod matcher;
pub mod reference;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::Result;

pub use fingerprint::{create_terroir_fingerprint, Feature, FieldData, MultiSourceObservation, TerroirFingerprint};
pub use gaps::{detect_critical_gaps, GapReport};
pub use matcher::{find_matching_terroir, MatchResult, VarianceSource};
pub use reference::{ReferenceDatabase, ReferenceTerroir};

/// Full result of a parcel audit: fingerprint, ranked matches and the gaps
/// against the best match.
#[derive(Debug, Clone, Serialize)]
pub struct TerroirAudit {
    pub fingerprint: TerroirFingerprint,
    pub summary: fingerprint::FingerprintSummary,
    pub matches: Vec<MatchResult>,
    /// `None` when the database is empty.
    pub gaps: Option<GapReport>,
}

pub struct TerroirEngine<'a> {
    database: &'a ReferenceDatabase,
    config: EngineConfig,
    variance: VarianceSource,
}

impl TerroirEngine<'static> {
    /// Engine over the built-in reference database.
    pub fn with_builtin(config: EngineConfig) -> Self {
        TerroirEngine::new(ReferenceDatabase::builtin(), config)
    }
}

impl<'a> TerroirEngine<'a> {
    pub fn new(database: &'a ReferenceDatabase, config: EngineConfig) -> Self {
        let variance = config.variance.source();
        Self {
            database,
            config,
            variance,
        }
    }

    /// Replace the variance source (e.g. `VarianceSource::Off` in tests).
    pub fn with_variance(mut self, variance: VarianceSource) -> Self {
        self.variance = variance;
        self
    }

    pub fn create_terroir_fingerprint(
        &self,
        observation: &MultiSourceObservation,
        field_data: Option<&FieldData>,
    ) -> TerroirFingerprint {
        create_terroir_fingerprint(observation, field_data)
    }

    pub fn find_matching_terroir(&mut self, fingerprint: &TerroirFingerprint) -> Vec<MatchResult> {
        find_matching_terroir(fingerprint, self.database, &self.config.weights, &mut self.variance)
    }

    pub fn detect_critical_gaps(&self, fingerprint: &TerroirFingerprint, benchmark_id: &str) -> Result<GapReport> {
        detect_critical_gaps(
            fingerprint,
            benchmark_id,
            self.database,
            &self.config.gap_rules,
            self.config.benchmark_fallback,
        )
    }

    /// Fingerprint → match → gaps against the top match.
    pub fn audit(&mut self, observation: &MultiSourceObservation, field_data: Option<&FieldData>) -> Result<TerroirAudit> {
        let fingerprint = self.create_terroir_fingerprint(observation, field_data);
        let matches = self.find_matching_terroir(&fingerprint);
        let gaps = match matches.first() {
            Some(best) => Some(self.detect_critical_gaps(&fingerprint, &best.id)?),
            None => None,
        };
        Ok(TerroirAudit {
            summary: fingerprint.summary(),
            fingerprint,
            matches,
            gaps,
        })
    }
}
