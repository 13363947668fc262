//! Per-image cleaning: quality mask, calibration, land mask

use std::sync::Arc;

use greenseries_core::Image;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{PipelineResult, Stage, StageContext};
use crate::imagery::{LandWaterMask, QualityMask, RadiometricCalibrator};

/// An image in physical units whose cloudy, shadowed and non-land pixels
/// are no-data. Only [`ImagePreprocessor`] builds one.
#[derive(Debug, Clone)]
pub struct CleanImage(Image);

impl CleanImage {
    pub fn image(&self) -> &Image {
        &self.0
    }

    pub fn into_inner(self) -> Image {
        self.0
    }
}

impl std::ops::Deref for CleanImage {
    type Target = Image;

    fn deref(&self) -> &Image {
        &self.0
    }
}

/// Runs the three cleaning steps in their fixed order.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    quality: QualityMask,
    calibrator: RadiometricCalibrator,
    land: Arc<LandWaterMask>,
}

impl ImagePreprocessor {
    pub fn new(quality: QualityMask, calibrator: RadiometricCalibrator, land: Arc<LandWaterMask>) -> Self {
        Self {
            quality,
            calibrator,
            land,
        }
    }

    pub fn from_config(config: &PipelineConfig, land: Arc<LandWaterMask>) -> Self {
        Self::new(
            QualityMask::from_config(&config.quality),
            RadiometricCalibrator::new(config.calibration.clone()),
            land,
        )
    }

    pub fn land_mask(&self) -> &Arc<LandWaterMask> {
        &self.land
    }

    pub fn process(&self, image: Image) -> PipelineResult<CleanImage> {
        let id = image.id().to_string();

        let image = self.quality.apply(image).stage(Stage::QualityMask)?;
        let image = self.calibrator.apply(image);
        let image = self.land.apply(image).stage(Stage::LandMask)?;

        debug!(
            "{}: {} clear land pixels after preprocessing",
            id,
            image
                .get_band(self.quality.band())
                .map_or(0, |qa| qa.valid_count())
        );

        Ok(CleanImage(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use greenseries_core::{GeoTransform, Raster};

    fn band(values: Vec<f64>) -> Raster<f64> {
        let mut r = Raster::from_vec(values, 1, 3).unwrap();
        r.set_transform(GeoTransform::north_up(0.0, 30.0, 30.0));
        r
    }

    fn land_everywhere_but_east() -> Arc<LandWaterMask> {
        let classes = band(vec![1.0, 1.0, 0.0]);
        Arc::new(LandWaterMask::from_classification(&classes, 1.0))
    }

    fn raw() -> Image {
        Image::new("LC08_PRE", Utc.with_ymd_and_hms(2014, 1, 12, 0, 0, 0).unwrap())
            .with_band("QA_PIXEL", band(vec![21_824.0, 32.0, 21_824.0]))
            .unwrap()
            .with_band("SR_B4", band(vec![10_000.0, 10_000.0, 10_000.0]))
            .unwrap()
    }

    #[test]
    fn test_steps_in_order() {
        let pre = ImagePreprocessor::new(
            QualityMask::default(),
            RadiometricCalibrator::default(),
            land_everywhere_but_east(),
        );
        let clean = pre.process(raw()).unwrap();
        let red = clean.band("SR_B4").unwrap();

        assert_relative_eq!(red.get(0, 0).unwrap().unwrap(), 0.075, epsilon = 1e-12);
        assert_eq!(red.get(0, 1).unwrap(), None); // cloud
        assert_eq!(red.get(0, 2).unwrap(), None); // water
        assert_eq!(clean.id(), "LC08_PRE");
    }

    #[test]
    fn test_missing_qa_reports_stage() {
        let pre = ImagePreprocessor::from_config(&PipelineConfig::default(), land_everywhere_but_east());
        let img = Image::new("no-qa", Utc.with_ymd_and_hms(2014, 1, 12, 0, 0, 0).unwrap())
            .with_band("SR_B4", band(vec![1.0, 1.0, 1.0]))
            .unwrap();
        let err = pre.process(img).unwrap_err();
        assert_eq!(err.stage, Stage::QualityMask);
    }
}
