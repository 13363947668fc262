//! Cloud and cloud-shadow masking from a bit-packed QA band

use ndarray::{Array2, Zip};
use greenseries_core::{Image, Result};

use crate::config::QualityConfig;

/// Decodes clear-sky pixels from a quality-assessment band.
///
/// A pixel is clear iff both the cloud and the cloud-shadow bits are unset.
/// For Landsat Collection 2 `QA_PIXEL` these are bits 5 and 3.
#[derive(Debug, Clone)]
pub struct QualityMask {
    band: String,
    cloud_bits: u32,
    cloud_shadow_bits: u32,
}

impl QualityMask {
    pub fn new(band: impl Into<String>, cloud_bit: u8, cloud_shadow_bit: u8) -> Self {
        Self {
            band: band.into(),
            cloud_bits: 1u32 << cloud_bit,
            cloud_shadow_bits: 1u32 << cloud_shadow_bit,
        }
    }

    pub fn from_config(config: &QualityConfig) -> Self {
        Self::new(&config.band, config.cloud_bit, config.cloud_shadow_bit)
    }

    pub fn band(&self) -> &str {
        &self.band
    }

    /// Whether a single QA word describes a clear pixel
    pub fn is_clear(&self, qa: u32) -> bool {
        qa & self.cloud_shadow_bits == 0 && qa & self.cloud_bits == 0
    }

    /// Clear-pixel mask of `image`; QA no-data counts as not clear
    pub fn clear_mask(&self, image: &Image) -> Result<Array2<bool>> {
        let qa = image.band(&self.band)?;
        Ok(Zip::from(qa.data())
            .and(qa.mask())
            .map_collect(|&word, &valid| valid && word >= 0.0 && self.is_clear(word as u32)))
    }

    /// Mask cloudy and shadowed pixels in every band
    pub fn apply(&self, mut image: Image) -> Result<Image> {
        let mask = self.clear_mask(&image)?;
        image.update_mask(&mask)?;
        Ok(image)
    }
}

impl Default for QualityMask {
    fn default() -> Self {
        Self::from_config(&QualityConfig::default())
    }
}
