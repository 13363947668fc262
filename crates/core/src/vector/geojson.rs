//! Minimal GeoJSON reader for polygonal regions.
//!
//! Accepts a Polygon, MultiPolygon, Feature, FeatureCollection or
//! GeometryCollection and flattens every polygon it finds.

use geo_types::{Coord, LineString, Polygon};
use serde::Deserialize;

use crate::error::{Error, Result};

type Ring = Vec<Vec<f64>>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJson {
    Polygon {
        coordinates: Vec<Ring>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Ring>>,
    },
    Feature {
        geometry: Option<Box<GeoJson>>,
    },
    FeatureCollection {
        features: Vec<GeoJson>,
    },
    GeometryCollection {
        geometries: Vec<GeoJson>,
    },
}

/// Parse GeoJSON text into its polygons
pub(crate) fn parse_polygons(text: &str) -> Result<Vec<Polygon<f64>>> {
    let doc: GeoJson = serde_json::from_str(text)
        .map_err(|e| Error::InvalidGeometry(format!("unreadable GeoJSON: {}", e)))?;

    let mut polygons = Vec::new();
    collect(doc, &mut polygons)?;
    Ok(polygons)
}

fn collect(doc: GeoJson, out: &mut Vec<Polygon<f64>>) -> Result<()> {
    match doc {
        GeoJson::Polygon { coordinates } => out.push(polygon(coordinates)?),
        GeoJson::MultiPolygon { coordinates } => {
            for rings in coordinates {
                out.push(polygon(rings)?);
            }
        }
        GeoJson::Feature { geometry } => {
            if let Some(geometry) = geometry {
                collect(*geometry, out)?;
            }
        }
        GeoJson::FeatureCollection { features } => {
            for feature in features {
                collect(feature, out)?;
            }
        }
        GeoJson::GeometryCollection { geometries } => {
            for geometry in geometries {
                collect(geometry, out)?;
            }
        }
    }
    Ok(())
}

fn polygon(rings: Vec<Ring>) -> Result<Polygon<f64>> {
    let mut rings = rings.into_iter();
    let exterior = rings
        .next()
        .ok_or_else(|| Error::InvalidGeometry("polygon without an exterior ring".into()))?;
    let interiors = rings.map(line_string).collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(line_string(exterior)?, interiors))
}

fn line_string(ring: Ring) -> Result<LineString<f64>> {
    ring.into_iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(Error::InvalidGeometry(format!(
                "position needs at least two coordinates, got {:?}",
                position
            ))),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_collection() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "a"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
                {"type": "Feature", "properties": null,
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[2,2],[3,2],[3,3],[2,3],[2,2]]],
                    [[[4,4,10],[5,4,10],[5,5,10],[4,4,10]]]
                 ]}}
            ]
        }"#;
        let polygons = parse_polygons(text).unwrap();
        assert_eq!(polygons.len(), 3);
    }

    #[test]
    fn test_rejects_points() {
        let text = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(matches!(parse_polygons(text), Err(Error::InvalidGeometry(_))));
    }
}
