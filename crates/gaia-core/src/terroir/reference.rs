//! Reference terroirs and the immutable database that holds them.
//!
//! The database is loaded once (built-in or from JSON) and only ever read
//! afterwards, so a `&ReferenceDatabase` can be shared freely across threads.
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const DEFAULT_ELEVATION_AVG: f64 = 0.0;
pub const DEFAULT_CLAY_CONTENT: f64 = 20.0;

/// Named feature sample describing a reference site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSample {
    /// Percent.
    pub clay_content: Option<f64>,
    /// 0–100.
    pub drainage_score: Option<f64>,
    /// Mean diurnal temperature range, °C.
    pub thermal_amplitude_avg: Option<f64>,
    /// Metres.
    pub elevation_avg: Option<f64>,
    pub geology: Option<String>,
}

impl ReferenceSample {
    pub fn elevation_avg(&self) -> f64 {
        self.elevation_avg.unwrap_or(DEFAULT_ELEVATION_AVG)
    }

    pub fn clay_content(&self) -> f64 {
        self.clay_content.unwrap_or(DEFAULT_CLAY_CONTENT)
    }

    /// Look up a numeric sample field by key.
    pub fn value(&self, key: SampleKey) -> Option<f64> {
        match key {
            SampleKey::ClayContent => Some(self.clay_content()),
            SampleKey::ElevationAvg => Some(self.elevation_avg()),
            SampleKey::DrainageScore => self.drainage_score,
            SampleKey::ThermalAmplitudeAvg => self.thermal_amplitude_avg,
        }
    }
}

/// Numeric fields of a `ReferenceSample` addressable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKey {
    ClayContent,
    DrainageScore,
    ThermalAmplitudeAvg,
    ElevationAvg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTerroir {
    pub id: String,
    pub name: String,
    #[serde(alias = "vector_sample")]
    pub sample: ReferenceSample,
}

/// Category weights of the similarity metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    pub soil: f64,
    pub climate: f64,
    pub satellite_signals: f64,
    pub biological: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            soil: 0.4,
            climate: 0.3,
            satellite_signals: 0.2,
            biological: 0.1,
        }
    }
}

/// Ordered, immutable collection of reference terroirs.
/// Insertion order is significant: it breaks similarity ties and picks the
/// fallback benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReferenceDatabase {
    entries: Vec<ReferenceTerroir>,
}

impl ReferenceDatabase {
    /// Build a database; ids must be unique.
    pub fn new(entries: Vec<ReferenceTerroir>) -> Result<Self> {
        let mut seen = HashSet::new();
        for e in &entries {
            if !seen.insert(e.id.as_str()) {
                return Err(CoreError::Config(format!("duplicate reference id: {}", e.id)));
            }
        }
        Ok(Self { entries })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<ReferenceTerroir> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Process-wide built-in reference set, initialised on first use.
    pub fn builtin() -> &'static ReferenceDatabase {
        static BUILTIN: OnceLock<ReferenceDatabase> = OnceLock::new();
        BUILTIN.get_or_init(|| ReferenceDatabase {
            entries: builtin_entries(),
        })
    }

    pub fn entries(&self) -> &[ReferenceTerroir] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&ReferenceTerroir> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn first(&self) -> Option<&ReferenceTerroir> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn builtin_entries() -> Vec<ReferenceTerroir> {
    vec![
        ReferenceTerroir {
            id: "pauillac_premier_cru".into(),
            name: "Pauillac - Graves Profondes".into(),
            sample: ReferenceSample {
                clay_content: Some(15.0),
                drainage_score: Some(95.0),
                thermal_amplitude_avg: Some(12.5),
                elevation_avg: Some(25.0),
                geology: Some("Garonne Gravel".into()),
            },
        },
        ReferenceTerroir {
            id: "vosne_romanee_grand_cru".into(),
            name: "Vosne-Romanée - Argilo-Calcaire".into(),
            sample: ReferenceSample {
                clay_content: Some(35.0),
                drainage_score: Some(85.0),
                thermal_amplitude_avg: Some(14.2),
                elevation_avg: Some(280.0),
                geology: Some("Jurassic Limestone".into()),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_both_references_in_order() {
        let db = ReferenceDatabase::builtin();
        let ids: Vec<&str> = db.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["pauillac_premier_cru", "vosne_romanee_grand_cru"]);
        assert_eq!(db.get("vosne_romanee_grand_cru").unwrap().sample.elevation_avg(), 280.0);
        assert!(std::ptr::eq(db, ReferenceDatabase::builtin()));
    }

    #[test]
    fn json_accepts_vector_sample_alias_and_defaults() {
        let db = ReferenceDatabase::from_json_str(
            r#"[{"id": "x", "name": "X", "vector_sample": {"geology": "Schist"}}]"#,
        )
        .unwrap();
        let s = &db.first().unwrap().sample;
        assert_eq!(s.elevation_avg(), DEFAULT_ELEVATION_AVG);
        assert_eq!(s.clay_content(), DEFAULT_CLAY_CONTENT);
        assert_eq!(s.value(SampleKey::DrainageScore), None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"[{"id": "a", "name": "A", "sample": {}}, {"id": "a", "name": "B", "sample": {}}]"#;
        assert!(matches!(ReferenceDatabase::from_json_str(json), Err(CoreError::Config(_))));
    }
}
