//! STAC-style catalog documents.
//!
//! Serde models for a static Item Collection (GeoJSON FeatureCollection)
//! covering the subset the local catalog needs: bbox, datetime, the
//! projection extension's EPSG code and asset hrefs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use greenseries_core::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// A STAC Item Collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemCollection {
    #[serde(rename = "type", default = "feature_collection")]
    pub type_: String,

    pub features: Vec<Item>,
}

fn feature_collection() -> String {
    "FeatureCollection".to_string()
}

impl ItemCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A single acquisition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Item {
    /// Unique item identifier.
    pub id: String,

    /// Bounding box `[west, south, east, north]` in the item's CRS.
    #[serde(default)]
    pub bbox: Vec<f64>,

    pub properties: ItemProperties,

    /// Assets keyed by band name.
    pub assets: BTreeMap<String, Asset>,
}

impl Item {
    pub fn asset(&self, key: &str) -> Option<&Asset> {
        self.assets.get(key)
    }

    /// Footprint from `bbox`
    pub fn bounds(&self) -> Result<BoundingBox> {
        BoundingBox::from_slice(&self.bbox)
            .filter(|b| b.min_x < b.max_x && b.min_y < b.max_y)
            .ok_or_else(|| CatalogError::InvalidBbox {
                id: self.id.clone(),
                bbox: self.bbox.clone(),
            })
    }

    /// Acquisition time from `properties.datetime`
    pub fn acquired(&self) -> Result<DateTime<Utc>> {
        let raw = self
            .properties
            .datetime
            .as_deref()
            .ok_or_else(|| CatalogError::MissingDatetime { id: self.id.clone() })?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|source| CatalogError::InvalidDatetime {
                id: self.id.clone(),
                value: raw.to_string(),
                source,
            })
    }

    /// EPSG code from the `proj:epsg` property, if available.
    pub fn epsg(&self) -> Option<u32> {
        self.properties.epsg.and_then(|v| u32::try_from(v).ok())
    }
}

/// Item properties.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemProperties {
    /// RFC 3339 datetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(rename = "proj:epsg", skip_serializing_if = "Option::is_none")]
    pub epsg: Option<u64>,

    /// Cloud cover percentage (EO extension).
    #[serde(rename = "eo:cloud_cover", skip_serializing_if = "Option::is_none")]
    pub eo_cloud_cover: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// A single asset (one band file).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Asset {
    /// Path to the GeoTIFF, relative to the catalog file or absolute.
    pub href: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
