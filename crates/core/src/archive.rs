//! Sources of imagery and land-cover data.
//!
//! The pipeline never talks to a concrete catalog; it depends on these
//! traits. [`MemoryArchive`] is the in-process implementation used by tests
//! and by callers that already hold their scenes.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::image::Image;
use crate::raster::Raster;
use crate::vector::BoundingBox;

/// Query interface of an image archive.
pub trait ImageArchive: Send + Sync {
    /// Images whose footprint intersects `bounds` and whose acquisition
    /// time lies in `[start, end)`.
    fn query(
        &self,
        bounds: &BoundingBox,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Image>>;
}

/// A land/water classification raster, read once per run.
pub trait LandCoverSource {
    fn load(&self) -> Result<Raster<f64>>;
}

impl LandCoverSource for Raster<f64> {
    fn load(&self) -> Result<Raster<f64>> {
        Ok(self.clone())
    }
}

/// Archive over images held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    images: Vec<Image>,
}

impl MemoryArchive {
    pub fn new(images: Vec<Image>) -> Self {
        Self { images }
    }

    pub fn push(&mut self, image: Image) {
        self.images.push(image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageArchive for MemoryArchive {
    fn query(
        &self,
        bounds: &BoundingBox,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Image>> {
        Ok(self
            .images
            .iter()
            .filter(|img| img.acquired() >= start && img.acquired() < end)
            .filter(|img| img.footprint().is_some_and(|fp| fp.intersects(bounds)))
            .cloned()
            .collect())
    }
}
