//! Row-major index raster with NaN as the no-data marker.
//!
//! Rasters usually arrive as JSON, where `null` marks a masked pixel. Only
//! finite values count as valid pixels; NaN and ±inf are both skipped.
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};

/// A 2D raster of a spectral index (NDVI, EVI, ...), row-major.
/// NaN marks an invalid pixel (cloud mask, outside the area, no data).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRaster {
    /// Row-major index values; `null` in JSON decodes to NaN.
    #[serde(deserialize_with = "null_as_nan_vec")]
    pub data: Vec<f64>,
    pub width: usize,
    pub height: usize,
}

/// Decode a JSON array of numbers or `null` into f64, mapping `null` to NaN.
pub fn null_as_nan_vec<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<f64>, D::Error> {
    let v: Vec<Option<f64>> = Vec::deserialize(d)?;
    Ok(v.into_iter().map(|x| x.unwrap_or(f64::NAN)).collect())
}

fn expected_len(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .ok_or_else(|| CoreError::InvalidInput(format!("raster dimensions {width}×{height} overflow")))
}

impl IndexRaster {
    /// Wrap row-major data. Fails if `data.len() != width × height`.
    pub fn new(data: Vec<f64>, width: usize, height: usize) -> Result<Self> {
        let raster = Self { data, width, height };
        raster.validate()?;
        Ok(raster)
    }

    /// Build from nested rows. All rows must share the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(CoreError::InvalidInput(format!(
                "raster row {i} has {} values, expected {width}",
                row.len()
            )));
        }
        let data = rows.into_iter().flatten().collect();
        Ok(Self { data, width, height })
    }

    #[cfg(test)]
    pub(crate) fn filled(width: usize, height: usize, fill: f64) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }

    /// Check the width × height contract; deserialized rasters skip `new`.
    pub fn validate(&self) -> Result<()> {
        let expected = expected_len(self.width, self.height)?;
        if self.data.len() != expected {
            return Err(CoreError::InvalidInput(format!(
                "raster data has {} values, expected {}×{} = {expected}",
                self.data.len(),
                self.width,
                self.height,
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f64) {
        self.data[row * self.width + col] = val;
    }

    /// Flattened finite pixels, in row-major order.
    pub fn valid_values(&self) -> Vec<f64> {
        self.data.iter().copied().filter(|v| v.is_finite()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = IndexRaster::from_rows(vec![vec![0.1, 0.2], vec![0.3]]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn valid_values_skip_nan_and_keep_order() {
        let mut r = IndexRaster::filled(3, 2, f64::NAN);
        r.set(0, 1, 0.4);
        r.set(1, 0, 0.2);
        r.set(1, 2, 0.9);
        assert_eq!(r.valid_values(), vec![0.4, 0.2, 0.9]);
    }

    #[test]
    fn valid_values_skip_infinities() {
        let r = IndexRaster::new(vec![0.1, f64::INFINITY, 0.3, f64::NEG_INFINITY], 2, 2).unwrap();
        assert_eq!(r.valid_values(), vec![0.1, 0.3]);
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let err = IndexRaster::new(vec![0.1, 0.2, 0.3], 2, 2).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn overflowing_dimensions_are_invalid_input() {
        let r: IndexRaster =
            serde_json::from_str(r#"{"data":[0.5],"width":8589934592,"height":8589934592}"#).unwrap();
        assert!(matches!(r.validate(), Err(CoreError::InvalidInput(_))));
        let err = IndexRaster::new(vec![0.5], usize::MAX, 2).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn json_null_decodes_to_nan() {
        let r: IndexRaster = serde_json::from_str(r#"{"data":[0.5,null],"width":2,"height":1}"#).unwrap();
        assert!(r.get(0, 1).is_nan());
        assert!(r.validate().is_ok());
    }
}
