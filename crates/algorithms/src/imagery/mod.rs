//! Per-image and per-composite imagery algorithms
//!
//! - Quality mask: cloud and cloud-shadow bits of a QA band
//! - Radiometric calibration: DN to reflectance and temperature
//! - Land/water mask from a static classification layer
//! - Preprocessing: the three steps above in order
//! - Normalized-difference indices (NDVI)

mod calibration;
mod indices;
mod landmask;
mod preprocess;
mod quality;

pub use calibration::RadiometricCalibrator;
pub use indices::{ndvi, normalized_difference, IndexCalculator};
pub use landmask::LandWaterMask;
pub use preprocess::{CleanImage, ImagePreprocessor};
pub use quality::QualityMask;
