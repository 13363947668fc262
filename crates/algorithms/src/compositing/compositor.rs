//! Monthly median composites over the region of interest

use std::collections::BTreeMap;

use greenseries_core::raster::resample_nearest;
use greenseries_core::{Error, GridSpec, ImageArchive, Raster, Roi, CRS};
use tracing::debug;

use crate::compositing::median_stack;
use crate::error::{PipelineResult, Stage, StageContext};
use crate::imagery::{CleanImage, ImagePreprocessor};
use crate::timeseries::Period;

/// Per-band median rasters of one period, laid out on the composite grid
#[derive(Debug, Clone)]
pub struct Composite {
    bands: BTreeMap<String, Raster<f64>>,
    grid: GridSpec,
    image_count: usize,
}

impl Composite {
    pub fn new(grid: GridSpec, image_count: usize, bands: BTreeMap<String, Raster<f64>>) -> Self {
        Self {
            bands,
            grid,
            image_count,
        }
    }

    /// Composite of a period without observations: no bands, all no-data
    pub fn empty(grid: GridSpec) -> Self {
        Self {
            bands: BTreeMap::new(),
            grid,
            image_count: 0,
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Number of images that went into the composite
    pub fn image_count(&self) -> usize {
        self.image_count
    }

    pub fn is_empty(&self) -> bool {
        self.image_count == 0
    }

    /// Band by name, or [`Error::MissingBand`]
    pub fn band(&self, name: &str) -> greenseries_core::Result<&Raster<f64>> {
        self.bands
            .get(name)
            .ok_or_else(|| Error::missing_band(name, "composite"))
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }
}

/// Builds a [`Composite`] for a period.
#[derive(Debug, Clone)]
pub struct PeriodCompositor {
    preprocessor: ImagePreprocessor,
    resolution: f64,
}

impl PeriodCompositor {
    pub fn new(preprocessor: ImagePreprocessor, resolution: f64) -> Self {
        Self {
            preprocessor,
            resolution,
        }
    }

    /// Grid the composites of `roi` are computed on
    pub fn grid_for(&self, roi: &Roi) -> PipelineResult<GridSpec> {
        GridSpec::covering(&roi.bounds(), self.resolution).stage(Stage::Composite)
    }

    /// Query, clean, resample and reduce the images of `period`.
    ///
    /// A period without matching images gives [`Composite::empty`].
    pub fn composite<A>(&self, archive: &A, roi: &Roi, period: &Period) -> PipelineResult<Composite>
    where
        A: ImageArchive + ?Sized,
    {
        let grid = self.grid_for(roi)?;

        let candidates = archive
            .query(&roi.bounds(), period.start_utc(), period.end_utc())
            .stage(Stage::ArchiveQuery)?;

        let mut clean: Vec<CleanImage> = Vec::with_capacity(candidates.len());
        for image in candidates {
            if !period.contains(image.acquired()) {
                continue;
            }
            if !image.footprint().is_some_and(|fp| roi.intersects_bbox(&fp)) {
                continue;
            }
            roi.check_crs(image.crs()).stage(Stage::Region)?;
            clean.push(self.preprocessor.process(image)?);
        }

        debug!("{}: {} images selected", period.label(), clean.len());

        if clean.is_empty() {
            return Ok(Composite::empty(grid));
        }

        let crs: Option<CRS> = roi
            .crs()
            .cloned()
            .or_else(|| clean.iter().find_map(|img| img.crs().cloned()));

        // Union of band names; each is reduced over the images carrying it.
        let mut stacks: BTreeMap<String, Vec<Raster<f64>>> = BTreeMap::new();
        for image in &clean {
            for (name, band) in image.bands() {
                stacks
                    .entry(name.to_string())
                    .or_default()
                    .push(resample_nearest(band, &grid));
            }
        }

        let inside = roi.mask(&grid);
        let mut bands = BTreeMap::new();
        for (name, stack) in stacks {
            let mut reduced = median_stack(&stack, &grid).stage(Stage::Composite)?;
            reduced.update_mask(&inside).stage(Stage::Composite)?;
            reduced.set_crs(crs.clone());
            bands.insert(name, reduced);
        }

        Ok(Composite {
            bands,
            grid,
            image_count: clean.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeZone, Utc};
    use geo_types::{polygon, Geometry};
    use greenseries_core::{GeoTransform, Image, MemoryArchive};

    use crate::imagery::{LandWaterMask, QualityMask, RadiometricCalibrator};
    use crate::timeseries::monthly_periods;

    const CELL: f64 = 30.0;

    /// 4x4 pixels of 30 m at the origin
    fn roi() -> Roi {
        Roi::new(Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 120.0, y: 0.0),
            (x: 120.0, y: 120.0),
            (x: 0.0, y: 120.0),
            (x: 0.0, y: 0.0),
        ]))
        .unwrap()
    }

    fn make_band(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(4, 4, value);
        r.set_transform(GeoTransform::north_up(0.0, 120.0, CELL));
        r
    }

    fn scene(id: &str, day: u32, red_dn: f64, qa: f64) -> Image {
        Image::new(id, Utc.with_ymd_and_hms(2014, 1, day, 10, 0, 0).unwrap())
            .with_band("QA_PIXEL", make_band(qa))
            .unwrap()
            .with_band("SR_B4", make_band(red_dn))
            .unwrap()
    }

    fn compositor() -> PeriodCompositor {
        let land = Arc::new(LandWaterMask::from_classification(&make_band(1.0), 1.0));
        let pre = ImagePreprocessor::new(QualityMask::default(), RadiometricCalibrator::default(), land);
        PeriodCompositor::new(pre, CELL)
    }

    fn january() -> Period {
        monthly_periods(NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(), 1).unwrap()[0]
    }

    #[test]
    fn test_median_of_clear_scenes() {
        let archive = MemoryArchive::new(vec![
            scene("a", 3, 10_000.0, 0.0),
            scene("b", 19, 12_000.0, 0.0),
            scene("c", 27, 30_000.0, 0.0),
        ]);
        let comp = compositor().composite(&archive, &roi(), &january()).unwrap();

        assert_eq!(comp.image_count(), 3);
        assert_eq!(comp.grid().shape(), (4, 4));
        let red = comp.band("SR_B4").unwrap();
        assert_relative_eq!(red.get(1, 1).unwrap().unwrap(), 12_000.0 * 0.0000275 - 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_cloudy_scene_is_ignored_per_pixel() {
        let archive = MemoryArchive::new(vec![
            scene("clear", 3, 10_000.0, 0.0),
            scene("cloudy", 5, 40_000.0, 32.0),
        ]);
        let comp = compositor().composite(&archive, &roi(), &january()).unwrap();
        let red = comp.band("SR_B4").unwrap();
        assert_eq!(comp.image_count(), 2);
        assert_relative_eq!(red.get(0, 0).unwrap().unwrap(), 0.075, epsilon = 1e-12);
    }

    #[test]
    fn test_no_images_gives_empty_composite() {
        let archive = MemoryArchive::new(vec![scene("late", 1, 10_000.0, 0.0)]);
        let feb = monthly_periods(NaiveDate::from_ymd_opt(2014, 2, 1).unwrap(), 1).unwrap()[0];
        let comp = compositor().composite(&archive, &roi(), &feb).unwrap();

        assert!(comp.is_empty());
        assert_eq!(comp.band_names().count(), 0);
        assert!(comp.band("SR_B4").is_err());
    }

    #[test]
    fn test_clip_to_region() {
        let triangle = Roi::new(Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 120.0, y: 0.0),
            (x: 0.0, y: 120.0),
            (x: 0.0, y: 0.0),
        ]))
        .unwrap();
        let archive = MemoryArchive::new(vec![scene("a", 3, 10_000.0, 0.0)]);
        let comp = compositor().composite(&archive, &triangle, &january()).unwrap();
        let red = comp.band("SR_B4").unwrap();

        assert!(red.get(3, 0).unwrap().is_some()); // south-west corner
        assert_eq!(red.get(0, 3).unwrap(), None); // north-east corner
        assert!(red.valid_count() < 16);
    }

    #[test]
    fn test_band_union() {
        let extra = scene("b", 9, 10_000.0, 0.0)
            .with_band("SR_B5", make_band(30_000.0))
            .unwrap();
        let archive = MemoryArchive::new(vec![scene("a", 3, 12_000.0, 0.0), extra]);
        let comp = compositor().composite(&archive, &roi(), &january()).unwrap();

        let names: Vec<_> = comp.band_names().collect();
        assert_eq!(names, ["QA_PIXEL", "SR_B4", "SR_B5"]);
        assert_relative_eq!(
            comp.band("SR_B5").unwrap().get(2, 2).unwrap().unwrap(),
            30_000.0 * 0.0000275 - 0.2,
            epsilon = 1e-12
        );
    }
}
