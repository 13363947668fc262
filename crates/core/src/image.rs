//! Multi-band, time-stamped images

use chrono::{DateTime, Utc};
use ndarray::Array2;
use std::collections::BTreeMap;

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GridSpec, Raster};
use crate::vector::BoundingBox;

/// A single acquisition: named bands sharing one grid, plus the
/// acquisition time.
///
/// Bands are kept in name order. Every band must have the same dimensions
/// and geotransform as the first one inserted.
#[derive(Debug, Clone)]
pub struct Image {
    id: String,
    acquired: DateTime<Utc>,
    bands: BTreeMap<String, Raster<f64>>,
    grid: Option<GridSpec>,
    crs: Option<CRS>,
}

impl Image {
    pub fn new(id: impl Into<String>, acquired: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            acquired,
            bands: BTreeMap::new(),
            grid: None,
            crs: None,
        }
    }

    /// Builder form of [`Image::insert_band`]
    pub fn with_band(mut self, name: impl Into<String>, raster: Raster<f64>) -> Result<Self> {
        self.insert_band(name, raster)?;
        Ok(self)
    }

    /// Add or replace a band, returning the band it replaced
    pub fn insert_band(
        &mut self,
        name: impl Into<String>,
        raster: Raster<f64>,
    ) -> Result<Option<Raster<f64>>> {
        match self.grid {
            Some(grid) if grid != raster.grid() => {
                return Err(Error::SizeMismatch {
                    er: grid.rows,
                    ec: grid.cols,
                    ar: raster.rows(),
                    ac: raster.cols(),
                })
            }
            Some(_) => {}
            None => self.grid = Some(raster.grid()),
        }

        match (&self.crs, raster.crs()) {
            (Some(mine), Some(theirs)) if !mine.is_equivalent(theirs) => {
                return Err(Error::CrsMismatch(mine.identifier(), theirs.identifier()));
            }
            (None, Some(theirs)) => self.crs = Some(theirs.clone()),
            _ => {}
        }

        Ok(self.bands.insert(name.into(), raster))
    }

    /// Declare the CRS of every band
    pub fn with_crs(mut self, crs: CRS) -> Self {
        for band in self.bands.values_mut() {
            band.set_crs(Some(crs.clone()));
        }
        self.crs = Some(crs);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn acquired(&self) -> DateTime<Utc> {
        self.acquired
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Shared lattice of the bands, `None` while the image has no band
    pub fn grid(&self) -> Option<GridSpec> {
        self.grid
    }

    /// Map extent covered by the bands
    pub fn footprint(&self) -> Option<BoundingBox> {
        self.grid.map(|g| g.bounds())
    }

    /// Band by name, or [`Error::MissingBand`]
    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.bands
            .get(name)
            .ok_or_else(|| Error::missing_band(name, format!("image '{}'", self.id)))
    }

    pub fn get_band(&self, name: &str) -> Option<&Raster<f64>> {
        self.bands.get(name)
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.contains_key(name)
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }

    pub fn bands(&self) -> impl Iterator<Item = (&str, &Raster<f64>)> {
        self.bands.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replace every band with `f(name, band)`; metadata is untouched
    pub fn map_bands<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Raster<f64>) -> Raster<f64>,
    {
        self.bands = std::mem::take(&mut self.bands)
            .into_iter()
            .map(|(name, band)| {
                let mapped = f(&name, band);
                (name, mapped)
            })
            .collect();
        self
    }

    /// Invalidate, in every band, each cell where `mask` is `false`
    pub fn update_mask(&mut self, mask: &Array2<bool>) -> Result<()> {
        for band in self.bands.values_mut() {
            band.update_mask(mask)?;
        }
        Ok(())
    }

    /// Number of bands
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;
    use chrono::TimeZone;

    fn band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::north_up(0.0, rows as f64 * 30.0, 30.0));
        r
    }

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 5, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_band_lookup() {
        let img = Image::new("LC08_001", when())
            .with_band("SR_B4", band(2, 2, 0.1))
            .unwrap();
        assert!(img.band("SR_B4").is_ok());
        match img.band("SR_B5") {
            Err(Error::MissingBand { band, source_name }) => {
                assert_eq!(band, "SR_B5");
                assert!(source_name.contains("LC08_001"));
            }
            other => panic!("expected MissingBand, got {:?}", other),
        }
    }

    #[test]
    fn test_band_grid_must_match() {
        let img = Image::new("a", when()).with_band("B1", band(2, 2, 1.0)).unwrap();
        assert!(img.with_band("B2", band(3, 2, 1.0)).is_err());
    }

    #[test]
    fn test_crs_must_match() {
        let mut b1 = band(2, 2, 1.0);
        b1.set_crs(Some(CRS::from_epsg(32633)));
        let mut b2 = band(2, 2, 1.0);
        b2.set_crs(Some(CRS::from_epsg(32634)));

        let img = Image::new("a", when()).with_band("B1", b1).unwrap();
        assert_eq!(img.crs().and_then(CRS::epsg), Some(32633));
        assert!(matches!(img.with_band("B2", b2), Err(Error::CrsMismatch(_, _))));
    }

    #[test]
    fn test_footprint_and_mask() {
        let mut img = Image::new("a", when())
            .with_band("B1", band(2, 2, 1.0))
            .unwrap()
            .with_band("B2", band(2, 2, 2.0))
            .unwrap();
        assert_eq!(img.footprint(), Some(BoundingBox::new(0.0, 0.0, 60.0, 60.0)));

        let mask = Array2::from_shape_vec((2, 2), vec![true, false, true, true]).unwrap();
        img.update_mask(&mask).unwrap();
        for (_, b) in img.bands() {
            assert_eq!(b.get(0, 1).unwrap(), None);
            assert_eq!(b.valid_count(), 3);
        }
    }
}
