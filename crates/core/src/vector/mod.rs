//! Vector types: bounding boxes and the region of interest

mod geojson;
mod roi;

pub use roi::Roi;

use geo_types::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in map units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// From a STAC/GeoJSON style `[west, south, east, north]` array
    pub fn from_slice(bbox: &[f64]) -> Option<Self> {
        match *bbox {
            [w, s, e, n] => Some(Self::new(w, s, e, n)),
            // 3D bbox: [w, s, zmin, e, n, zmax]
            [w, s, _, e, n, _] => Some(Self::new(w, s, e, n)),
            _ => None,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord { x: self.min_x, y: self.min_y },
            Coord { x: self.max_x, y: self.max_y },
        )
    }
}

impl From<(f64, f64, f64, f64)> for BoundingBox {
    fn from((min_x, min_y, max_x, max_y): (f64, f64, f64, f64)) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }
}
