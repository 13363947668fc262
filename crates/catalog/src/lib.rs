//! # GreenSeries Catalog
//!
//! A local, file-backed image archive for GreenSeries: a STAC-style Item
//! Collection JSON whose assets are single-band GeoTIFF files, plus a
//! GeoTIFF land-cover source.

pub mod error;
pub mod local;
pub mod models;

pub use error::{CatalogError, Result};
pub use local::{GeoTiffLandCover, LocalCatalog};
pub use models::{Asset, Item, ItemCollection, ItemProperties};
