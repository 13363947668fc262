//! File-backed archive: an Item Collection JSON plus GeoTIFF band files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use greenseries_core::io::read_geotiff;
use greenseries_core::{BoundingBox, Image, ImageArchive, LandCoverSource, Raster, CRS};
use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::models::{Item, ItemCollection};

/// Image archive over a local Item Collection.
///
/// Asset hrefs are resolved against the directory holding the collection
/// file. Each asset key becomes a band name.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    root: PathBuf,
    items: Vec<Item>,
    bands: Option<Vec<String>>,
}

impl LocalCatalog {
    /// Read and parse the collection at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let collection: ItemCollection =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        info!("catalog {}: {} items", path.display(), collection.len());
        Ok(Self::from_collection(root, collection))
    }

    /// Catalog over an already parsed collection; hrefs resolve against `root`
    pub fn from_collection(root: impl Into<PathBuf>, collection: ItemCollection) -> Self {
        Self {
            root: root.into(),
            items: collection.features,
            bands: None,
        }
    }

    /// Only load these asset keys
    pub fn with_bands<I, S>(mut self, bands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bands = Some(bands.into_iter().map(Into::into).collect());
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn resolve(&self, href: &str) -> PathBuf {
        let href = Path::new(href);
        if href.is_absolute() {
            href.to_path_buf()
        } else {
            self.root.join(href)
        }
    }

    fn wants(&self, band: &str) -> bool {
        self.bands
            .as_ref()
            .map_or(true, |bands| bands.iter().any(|b| b == band))
    }

    /// Items intersecting `bounds` and acquired in `[start, end)`
    pub fn select(
        &self,
        bounds: &BoundingBox,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<&Item>> {
        let mut selected = Vec::new();
        for item in &self.items {
            let acquired = item.acquired()?;
            if acquired < start || acquired >= end {
                continue;
            }
            if item.bounds()?.intersects(bounds) {
                selected.push(item);
            }
        }
        Ok(selected)
    }

    /// Read every wanted asset of `item` into an [`Image`]
    pub fn load_item(&self, item: &Item) -> Result<Image> {
        let crs = item.epsg().map(CRS::from_epsg);
        let mut image = Image::new(&item.id, item.acquired()?);

        for (key, asset) in &item.assets {
            if !self.wants(key) {
                continue;
            }
            let path = self.resolve(&asset.href);
            let mut band: Raster<f64> =
                read_geotiff(&path).map_err(|source| CatalogError::Asset {
                    id: item.id.clone(),
                    asset: key.clone(),
                    path: path.clone(),
                    source,
                })?;
            if band.crs().is_none() {
                band.set_crs(crs.clone());
            }
            image.insert_band(key.as_str(), band)?;
        }

        debug!("loaded {} ({} bands)", item.id, image.len());
        Ok(image)
    }
}

impl ImageArchive for LocalCatalog {
    fn query(
        &self,
        bounds: &BoundingBox,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> greenseries_core::Result<Vec<Image>> {
        let items = self.select(bounds, start, end)?;
        let images = items
            .into_iter()
            .map(|item| self.load_item(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(images)
    }
}

/// Land/water classification read from a single-band GeoTIFF
#[derive(Debug, Clone)]
pub struct GeoTiffLandCover {
    path: PathBuf,
}

impl GeoTiffLandCover {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LandCoverSource for GeoTiffLandCover {
    fn load(&self) -> greenseries_core::Result<Raster<f64>> {
        info!("reading land cover {}", self.path.display());
        read_geotiff(&self.path)
    }
}
