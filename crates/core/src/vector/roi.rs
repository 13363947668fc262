//! Region of interest

use geo::{Area, BoundingRect, Contains, Intersects};
use geo_types::{Geometry, MultiPolygon, Point, Polygon};
use ndarray::Array2;

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::GridSpec;
use crate::vector::{geojson, BoundingBox};

/// Polygonal region of interest.
///
/// Acts both as the spatial filter for archive queries and as the footprint
/// over which rasters are clipped and reduced. Construction validates the
/// geometry once; a `Roi` is immutable afterwards.
#[derive(Debug, Clone)]
pub struct Roi {
    geometry: MultiPolygon<f64>,
    bounds: BoundingBox,
    crs: Option<CRS>,
}

impl Roi {
    /// Build from a polygon or multipolygon geometry
    pub fn new(geometry: Geometry<f64>) -> Result<Self> {
        let polygons = match geometry {
            Geometry::Polygon(p) => vec![p],
            Geometry::MultiPolygon(mp) => mp.0,
            Geometry::Rect(r) => vec![r.to_polygon()],
            other => {
                return Err(Error::InvalidGeometry(format!(
                    "region of interest must be polygonal, got {}",
                    geometry_kind(&other)
                )))
            }
        };
        Self::from_polygons(polygons)
    }

    /// Build from the polygons of a GeoJSON document
    pub fn from_geojson(text: &str) -> Result<Self> {
        Self::from_polygons(geojson::parse_polygons(text)?)
    }

    fn from_polygons(polygons: Vec<Polygon<f64>>) -> Result<Self> {
        if polygons.is_empty() {
            return Err(Error::InvalidGeometry("region of interest is empty".into()));
        }
        for (i, polygon) in polygons.iter().enumerate() {
            validate_polygon(polygon).map_err(|reason| {
                Error::InvalidGeometry(format!("polygon {}: {}", i, reason))
            })?;
        }

        let geometry = MultiPolygon::new(polygons);
        let rect = geometry
            .bounding_rect()
            .ok_or_else(|| Error::InvalidGeometry("region of interest has no extent".into()))?;

        Ok(Self {
            bounds: BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y),
            geometry,
            crs: None,
        })
    }

    /// Attach the CRS the coordinates are expressed in
    pub fn with_crs(mut self, crs: CRS) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Area in squared map units
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    /// Whether the point lies strictly inside the region
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if !self.bounds.contains_point(x, y) {
            return false;
        }
        let point = Point::new(x, y);
        self.geometry.0.iter().any(|p| p.contains(&point))
    }

    /// Whether the region touches the given box
    pub fn intersects_bbox(&self, bbox: &BoundingBox) -> bool {
        if !self.bounds.intersects(bbox) {
            return false;
        }
        let rect = bbox.to_rect();
        self.geometry.0.iter().any(|p| p.intersects(&rect))
    }

    /// Fail when `other` is known and differs from the region's CRS
    pub fn check_crs(&self, other: Option<&CRS>) -> Result<()> {
        match (&self.crs, other) {
            (Some(mine), Some(theirs)) if !mine.is_equivalent(theirs) => {
                Err(Error::CrsMismatch(mine.identifier(), theirs.identifier()))
            }
            _ => Ok(()),
        }
    }

    /// `true` for every cell of `grid` whose center lies inside the region
    pub fn mask(&self, grid: &GridSpec) -> Array2<bool> {
        Array2::from_shape_fn(grid.shape(), |(row, col)| {
            let (x, y) = grid.cell_center(row, col);
            self.contains(x, y)
        })
    }
}

fn validate_polygon(polygon: &Polygon<f64>) -> std::result::Result<(), String> {
    let exterior = polygon.exterior();
    if exterior.0.len() < 4 {
        return Err(format!(
            "exterior ring needs at least 4 positions, has {}",
            exterior.0.len()
        ));
    }

    let rings = std::iter::once(exterior).chain(polygon.interiors());
    for ring in rings {
        if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err("ring contains non-finite coordinates".into());
        }
        if !ring.is_closed() {
            return Err("ring is not closed".into());
        }
    }

    let area = polygon.unsigned_area();
    if area.is_nan() || area <= 0.0 {
        return Err("polygon has zero area".into());
    }
    Ok(())
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Triangle(_) => "Triangle",
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) => "polygon",
    }
}
