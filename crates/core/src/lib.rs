//! # GreenSeries Core
//!
//! Core types, traits and I/O for the GreenSeries vegetation-index library.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced grid with an explicit validity mask
//! - `GeoTransform` / `GridSpec`: lattice descriptions and resampling
//! - `Roi`: validated polygonal region of interest
//! - `Image`: time-stamped multi-band acquisition
//! - `ImageArchive` / `LandCoverSource`: data source traits
//! - Native GeoTIFF I/O

pub mod archive;
pub mod crs;
pub mod error;
pub mod image;
pub mod io;
pub mod raster;
pub mod vector;

pub use archive::{ImageArchive, LandCoverSource, MemoryArchive};
pub use crs::CRS;
pub use error::{Error, Result};
pub use image::Image;
pub use raster::{GeoTransform, GridSpec, Raster, RasterElement};
pub use vector::{BoundingBox, Roi};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::archive::{ImageArchive, LandCoverSource, MemoryArchive};
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::image::Image;
    pub use crate::raster::{GeoTransform, GridSpec, Raster, RasterElement};
    pub use crate::vector::{BoundingBox, Roi};
}
