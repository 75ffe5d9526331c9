//! Terroir fingerprint: a fixed-layout feature vector fused from optical,
//! radar, climate, topography and soil observations.
//!
//! Layout (23 values, category order is a contract):
//!
//! | category   | offset | len | features                                   |
//! |------------|--------|-----|--------------------------------------------|
//! | optical    | 0      | 9   | B2 B3 B4 B8 B11 B12 NDVI NDWI NDMI         |
//! | radar      | 9      | 4   | VV VH rugosity canopy_height               |
//! | climate    | 13     | 3   | LST °C, GPM precip mm, CHIRPS precip mm    |
//! | topography | 16     | 3   | elevation slope aspect                     |
//! | soil       | 19     | 4   | pH clay% organic_matter% drainage_score    |
//!
//! Consumers address values through `Feature`, never through raw offsets.
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};

pub const FINGERPRINT_LEN: usize = 23;

// ── Layout ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Optical,
    Radar,
    Climate,
    Topography,
    Soil,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 5] = [
        FeatureCategory::Optical,
        FeatureCategory::Radar,
        FeatureCategory::Climate,
        FeatureCategory::Topography,
        FeatureCategory::Soil,
    ];

    pub fn len(self) -> usize {
        match self {
            FeatureCategory::Optical => 9,
            FeatureCategory::Radar => 4,
            FeatureCategory::Climate => 3,
            FeatureCategory::Topography => 3,
            FeatureCategory::Soil => 4,
        }
    }

    pub fn offset(self) -> usize {
        Self::ALL
            .iter()
            .take_while(|&&c| c != self)
            .map(|c| c.len())
            .sum()
    }

    pub fn range(self) -> std::ops::Range<usize> {
        let start = self.offset();
        start..start + self.len()
    }
}

/// One named position in the fingerprint vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    B2,
    B3,
    B4,
    B8,
    B11,
    B12,
    Ndvi,
    Ndwi,
    Ndmi,
    Vv,
    Vh,
    Rugosity,
    CanopyHeight,
    LstCelsius,
    PrecipGpmMm,
    PrecipChirpsMm,
    Elevation,
    Slope,
    Aspect,
    SoilPh,
    ClayPercent,
    OrganicMatterPercent,
    DrainageScore,
}

impl Feature {
    /// All features in vector order.
    pub const ALL: [Feature; FINGERPRINT_LEN] = [
        Feature::B2,
        Feature::B3,
        Feature::B4,
        Feature::B8,
        Feature::B11,
        Feature::B12,
        Feature::Ndvi,
        Feature::Ndwi,
        Feature::Ndmi,
        Feature::Vv,
        Feature::Vh,
        Feature::Rugosity,
        Feature::CanopyHeight,
        Feature::LstCelsius,
        Feature::PrecipGpmMm,
        Feature::PrecipChirpsMm,
        Feature::Elevation,
        Feature::Slope,
        Feature::Aspect,
        Feature::SoilPh,
        Feature::ClayPercent,
        Feature::OrganicMatterPercent,
        Feature::DrainageScore,
    ];

    /// Position in the flat vector.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn category(self) -> FeatureCategory {
        FeatureCategory::ALL
            .into_iter()
            .find(|c| c.range().contains(&self.index()))
            .unwrap_or(FeatureCategory::Soil)
    }
}

// ── Fingerprint ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OpticalFeatures {
    pub b2: f64,
    pub b3: f64,
    pub b4: f64,
    pub b8: f64,
    pub b11: f64,
    pub b12: f64,
    pub ndvi: f64,
    pub ndwi: f64,
    pub ndmi: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarFeatures {
    /// VV backscatter, dB.
    pub vv: f64,
    /// VH backscatter, dB.
    pub vh: f64,
    pub rugosity: f64,
    /// Metres.
    pub canopy_height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateFeatures {
    pub lst_celsius: f64,
    pub precip_gpm_mm: f64,
    pub precip_chirps_mm: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TopographyFeatures {
    /// Metres above sea level.
    pub elevation: f64,
    /// Degrees.
    pub slope: f64,
    /// Degrees clockwise from north.
    pub aspect: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilFeatures {
    pub ph: f64,
    pub clay_percent: f64,
    pub organic_matter_percent: f64,
    pub drainage_score: f64,
}

/// Named view of the 23-value fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TerroirFingerprint {
    pub optical: OpticalFeatures,
    pub radar: RadarFeatures,
    pub climate: ClimateFeatures,
    pub topography: TopographyFeatures,
    pub soil: SoilFeatures,
}

/// The handful of fingerprint values echoed back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FingerprintSummary {
    pub elevation: f64,
    pub slope: f64,
    pub ndvi: f64,
}

impl TerroirFingerprint {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::B2 => self.optical.b2,
            Feature::B3 => self.optical.b3,
            Feature::B4 => self.optical.b4,
            Feature::B8 => self.optical.b8,
            Feature::B11 => self.optical.b11,
            Feature::B12 => self.optical.b12,
            Feature::Ndvi => self.optical.ndvi,
            Feature::Ndwi => self.optical.ndwi,
            Feature::Ndmi => self.optical.ndmi,
            Feature::Vv => self.radar.vv,
            Feature::Vh => self.radar.vh,
            Feature::Rugosity => self.radar.rugosity,
            Feature::CanopyHeight => self.radar.canopy_height,
            Feature::LstCelsius => self.climate.lst_celsius,
            Feature::PrecipGpmMm => self.climate.precip_gpm_mm,
            Feature::PrecipChirpsMm => self.climate.precip_chirps_mm,
            Feature::Elevation => self.topography.elevation,
            Feature::Slope => self.topography.slope,
            Feature::Aspect => self.topography.aspect,
            Feature::SoilPh => self.soil.ph,
            Feature::ClayPercent => self.soil.clay_percent,
            Feature::OrganicMatterPercent => self.soil.organic_matter_percent,
            Feature::DrainageScore => self.soil.drainage_score,
        }
    }

    fn slot_mut(&mut self, feature: Feature) -> &mut f64 {
        match feature {
            Feature::B2 => &mut self.optical.b2,
            Feature::B3 => &mut self.optical.b3,
            Feature::B4 => &mut self.optical.b4,
            Feature::B8 => &mut self.optical.b8,
            Feature::B11 => &mut self.optical.b11,
            Feature::B12 => &mut self.optical.b12,
            Feature::Ndvi => &mut self.optical.ndvi,
            Feature::Ndwi => &mut self.optical.ndwi,
            Feature::Ndmi => &mut self.optical.ndmi,
            Feature::Vv => &mut self.radar.vv,
            Feature::Vh => &mut self.radar.vh,
            Feature::Rugosity => &mut self.radar.rugosity,
            Feature::CanopyHeight => &mut self.radar.canopy_height,
            Feature::LstCelsius => &mut self.climate.lst_celsius,
            Feature::PrecipGpmMm => &mut self.climate.precip_gpm_mm,
            Feature::PrecipChirpsMm => &mut self.climate.precip_chirps_mm,
            Feature::Elevation => &mut self.topography.elevation,
            Feature::Slope => &mut self.topography.slope,
            Feature::Aspect => &mut self.topography.aspect,
            Feature::SoilPh => &mut self.soil.ph,
            Feature::ClayPercent => &mut self.soil.clay_percent,
            Feature::OrganicMatterPercent => &mut self.soil.organic_matter_percent,
            Feature::DrainageScore => &mut self.soil.drainage_score,
        }
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        *self.slot_mut(feature) = value;
    }

    /// Flatten to the fixed-layout vector.
    pub fn to_vector(&self) -> [f64; FINGERPRINT_LEN] {
        Feature::ALL.map(|f| self.get(f))
    }

    /// Rebuild from a flat vector; the length must be exactly 23.
    pub fn from_vector(values: &[f64]) -> Result<Self> {
        if values.len() != FINGERPRINT_LEN {
            return Err(CoreError::InvalidInput(format!(
                "fingerprint vector has {} values, expected {FINGERPRINT_LEN}",
                values.len()
            )));
        }
        let mut fp = Self::default();
        for (&f, &v) in Feature::ALL.iter().zip(values.iter()) {
            fp.set(f, v);
        }
        Ok(fp)
    }

    /// Values of one category, in vector order.
    pub fn category_values(&self, category: FeatureCategory) -> Vec<f64> {
        Feature::ALL
            .into_iter()
            .filter(|f| f.category() == category)
            .map(|f| self.get(f))
            .collect()
    }

    pub fn summary(&self) -> FingerprintSummary {
        FingerprintSummary {
            elevation: self.topography.elevation,
            slope: self.topography.slope,
            ndvi: self.optical.ndvi,
        }
    }
}

// ── Observations ──────────────────────────────────────────────────────────────

/// Accept any JSON value; keep it only if it is a number.
/// Upstream providers send strings such as "N/A" for missing canopy height.
fn numeric_or_none<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(v.as_f64())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticalBands {
    #[serde(rename = "B2")]
    pub b2: Option<f64>,
    #[serde(rename = "B3")]
    pub b3: Option<f64>,
    #[serde(rename = "B4")]
    pub b4: Option<f64>,
    #[serde(rename = "B8")]
    pub b8: Option<f64>,
    #[serde(rename = "B11")]
    pub b11: Option<f64>,
    #[serde(rename = "B12")]
    pub b12: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticalIndices {
    #[serde(rename = "NDVI")]
    pub ndvi: Option<f64>,
    #[serde(rename = "NDWI")]
    pub ndwi: Option<f64>,
    #[serde(rename = "NDMI")]
    pub ndmi: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticalObservation {
    pub bands: OpticalBands,
    pub indices: OpticalIndices,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarObservation {
    pub vv: Option<f64>,
    pub vh: Option<f64>,
    pub rugosity: Option<f64>,
    #[serde(deserialize_with = "numeric_or_none")]
    pub canopy_height: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateObservation {
    pub lst_celsius: Option<f64>,
    pub precip_gpm_mm: Option<f64>,
    pub precip_chirps_mm: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopographyObservation {
    pub elevation: Option<f64>,
    pub slope: Option<f64>,
    pub aspect: Option<f64>,
}

/// Multi-source observations for one parcel. A category left out entirely
/// contributes a zero-filled block to the fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiSourceObservation {
    pub optical: Option<OpticalObservation>,
    pub radar_lidar: Option<RadarObservation>,
    pub climatology: Option<ClimateObservation>,
    pub topography: Option<TopographyObservation>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemicalProfile {
    #[serde(deserialize_with = "numeric_or_none")]
    pub ph_h2o: Option<f64>,
    #[serde(deserialize_with = "numeric_or_none")]
    pub organic_matter: Option<f64>,
    /// Cation exchange capacity, meq/100 g.
    #[serde(deserialize_with = "numeric_or_none")]
    pub cec: Option<f64>,
    #[serde(deserialize_with = "numeric_or_none")]
    pub active_limestone: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalProfile {
    #[serde(deserialize_with = "numeric_or_none")]
    pub sand_percent: Option<f64>,
    #[serde(deserialize_with = "numeric_or_none")]
    pub silt_percent: Option<f64>,
    #[serde(deserialize_with = "numeric_or_none")]
    pub clay_percent: Option<f64>,
    #[serde(deserialize_with = "numeric_or_none")]
    pub drainage_score: Option<f64>,
}

/// Ground-truth soil measurements. `FieldData::default()` is the template
/// used when no field campaign is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldData {
    pub physical: PhysicalProfile,
    pub chemical: ChemicalProfile,
}

pub const DEFAULT_LST_CELSIUS: f64 = 20.0;
pub const DEFAULT_PRECIP_MM: f64 = 100.0;
pub const DEFAULT_SOIL_PH: f64 = 6.5;
pub const PLACEHOLDER_CLAY_PERCENT: f64 = 15.0;
pub const PLACEHOLDER_ORGANIC_MATTER_PERCENT: f64 = 25.0;
pub const PLACEHOLDER_DRAINAGE_SCORE: f64 = 90.0;

fn optical_features(obs: &OpticalObservation) -> OpticalFeatures {
    let b = &obs.bands;
    let i = &obs.indices;
    OpticalFeatures {
        b2: b.b2.unwrap_or(0.0),
        b3: b.b3.unwrap_or(0.0),
        b4: b.b4.unwrap_or(0.0),
        b8: b.b8.unwrap_or(0.0),
        b11: b.b11.unwrap_or(0.0),
        b12: b.b12.unwrap_or(0.0),
        ndvi: i.ndvi.unwrap_or(0.0),
        ndwi: i.ndwi.unwrap_or(0.0),
        ndmi: i.ndmi.unwrap_or(0.0),
    }
}

fn radar_features(obs: &RadarObservation) -> RadarFeatures {
    RadarFeatures {
        vv: obs.vv.unwrap_or(0.0),
        vh: obs.vh.unwrap_or(0.0),
        rugosity: obs.rugosity.unwrap_or(0.0),
        canopy_height: obs.canopy_height.unwrap_or(0.0),
    }
}

fn climate_features(obs: &ClimateObservation) -> ClimateFeatures {
    ClimateFeatures {
        lst_celsius: obs.lst_celsius.unwrap_or(DEFAULT_LST_CELSIUS),
        precip_gpm_mm: obs.precip_gpm_mm.unwrap_or(DEFAULT_PRECIP_MM),
        precip_chirps_mm: obs.precip_chirps_mm.unwrap_or(DEFAULT_PRECIP_MM),
    }
}

fn topography_features(obs: &TopographyObservation) -> TopographyFeatures {
    TopographyFeatures {
        elevation: obs.elevation.unwrap_or(0.0),
        slope: obs.slope.unwrap_or(0.0),
        aspect: obs.aspect.unwrap_or(0.0),
    }
}

fn soil_features(field: &FieldData) -> SoilFeatures {
    SoilFeatures {
        ph: field.chemical.ph_h2o.unwrap_or(DEFAULT_SOIL_PH),
        clay_percent: field.physical.clay_percent.unwrap_or(PLACEHOLDER_CLAY_PERCENT),
        organic_matter_percent: field
            .chemical
            .organic_matter
            .unwrap_or(PLACEHOLDER_ORGANIC_MATTER_PERCENT),
        drainage_score: field.physical.drainage_score.unwrap_or(PLACEHOLDER_DRAINAGE_SCORE),
    }
}

/// Fuse observations and field data into a fingerprint.
///
/// Missing categories are zero-filled; missing fields inside a present
/// category take their per-field default. Without `field_data` the default
/// soil template applies (pH 6.5, clay 15 %, organic matter 25 %, drainage 90).
pub fn create_terroir_fingerprint(
    observation: &MultiSourceObservation,
    field_data: Option<&FieldData>,
) -> TerroirFingerprint {
    let template = FieldData::default();
    let field = field_data.unwrap_or(&template);

    TerroirFingerprint {
        optical: observation.optical.as_ref().map(optical_features).unwrap_or_default(),
        radar: observation.radar_lidar.as_ref().map(radar_features).unwrap_or_default(),
        climate: observation.climatology.as_ref().map(climate_features).unwrap_or_default(),
        topography: observation.topography.as_ref().map(topography_features).unwrap_or_default(),
        soil: soil_features(field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_contiguous_and_ordered() {
        assert_eq!(FeatureCategory::ALL.iter().map(|c| c.len()).sum::<usize>(), FINGERPRINT_LEN);
        assert_eq!(FeatureCategory::Optical.range(), 0..9);
        assert_eq!(FeatureCategory::Radar.range(), 9..13);
        assert_eq!(FeatureCategory::Climate.range(), 13..16);
        assert_eq!(FeatureCategory::Topography.range(), 16..19);
        assert_eq!(FeatureCategory::Soil.range(), 19..23);
        for (i, f) in Feature::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
        assert_eq!(Feature::Elevation.index(), 16);
        assert_eq!(Feature::SoilPh.index(), 19);
        assert_eq!(Feature::ClayPercent.index(), 20);
        assert_eq!(Feature::CanopyHeight.category(), FeatureCategory::Radar);
        assert_eq!(Feature::DrainageScore.category(), FeatureCategory::Soil);
    }

    #[test]
    fn empty_observation_gives_fixed_length_zero_and_placeholder_vector() {
        let fp = create_terroir_fingerprint(&MultiSourceObservation::default(), None);
        let v = fp.to_vector();
        assert_eq!(v.len(), FINGERPRINT_LEN);
        assert!(v[..19].iter().all(|&x| x == 0.0));
        assert_eq!(&v[19..], &[6.5, 15.0, 25.0, 90.0]);
    }

    #[test]
    fn present_categories_use_field_defaults() {
        let obs = MultiSourceObservation {
            climatology: Some(ClimateObservation::default()),
            topography: Some(TopographyObservation { elevation: Some(312.0), ..Default::default() }),
            ..Default::default()
        };
        let fp = create_terroir_fingerprint(&obs, None);
        assert_eq!(fp.category_values(FeatureCategory::Climate), vec![20.0, 100.0, 100.0]);
        assert_eq!(fp.get(Feature::Elevation), 312.0);
        assert_eq!(fp.get(Feature::Slope), 0.0);
    }

    #[test]
    fn non_numeric_canopy_height_and_ph_fall_back() {
        let obs: MultiSourceObservation = serde_json::from_str(
            r#"{"radar_lidar": {"vv": -9.5, "vh": -15.2, "canopy_height": "N/A"}}"#,
        )
        .unwrap();
        let field: FieldData = serde_json::from_str(r#"{"chemical": {"ph_h2o": "float"}}"#).unwrap();
        let fp = create_terroir_fingerprint(&obs, Some(&field));
        assert_eq!(fp.category_values(FeatureCategory::Radar), vec![-9.5, -15.2, 0.0, 0.0]);
        assert_eq!(fp.soil.ph, DEFAULT_SOIL_PH);
    }

    #[test]
    fn field_measurements_replace_placeholders() {
        let field: FieldData = serde_json::from_str(
            r#"{"physical": {"clay_percent": 32.0}, "chemical": {"ph_h2o": 7.9, "organic_matter": 3.1}}"#,
        )
        .unwrap();
        let fp = create_terroir_fingerprint(&MultiSourceObservation::default(), Some(&field));
        assert_eq!(fp.category_values(FeatureCategory::Soil), vec![7.9, 32.0, 3.1, 90.0]);
    }

    #[test]
    fn optical_json_uses_band_names() {
        let obs: MultiSourceObservation = serde_json::from_str(
            r#"{"optical": {"bands": {"B2": 0.04, "B8": 0.31}, "indices": {"NDVI": 0.68}}}"#,
        )
        .unwrap();
        let fp = create_terroir_fingerprint(&obs, None);
        assert_eq!(fp.optical.b2, 0.04);
        assert_eq!(fp.optical.b8, 0.31);
        assert_eq!(fp.optical.b3, 0.0);
        assert_eq!(fp.summary().ndvi, 0.68);
    }

    #[test]
    fn vector_mapping_is_positional() {
        let values: Vec<f64> = (0..FINGERPRINT_LEN).map(|i| i as f64).collect();
        let fp = TerroirFingerprint::from_vector(&values).unwrap();
        assert_eq!(fp.topography.elevation, 16.0);
        assert_eq!(fp.soil.ph, 19.0);
        assert_eq!(fp.to_vector().to_vec(), values);
        assert!(TerroirFingerprint::from_vector(&values[..22]).is_err());
    }
}
