//! Monthly pipeline over GeoTIFF files: catalog, land cover and exported
//! rasters all go through disk.

use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use chrono::NaiveDate;
use geo_types::{Geometry, Rect};
use greenseries_algorithms::prelude::*;
use greenseries_catalog::{GeoTiffLandCover, LocalCatalog};
use greenseries_core::io::{read_geotiff, write_geotiff, GeoTiffOptions};

// ── Fixtures ──────────────────────────────────────────────────────────

const WEST: f64 = 500_000.0;
const NORTH: f64 = 4_001_000.0;
const EPSG: u16 = 32633;

fn write_layer(path: &Path, cells: usize, west: f64, north: f64, value: f64) {
    let mut r = Raster::filled(cells, cells, value);
    r.set_transform(GeoTransform::north_up(west, north, 30.0));
    write_geotiff(&r, path, &GeoTiffOptions { epsg: Some(EPSG) }).unwrap();
}

const COLLECTION: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "id": "LC08_L2SP_20140117",
      "bbox": [500000.0, 3999980.0, 501020.0, 4001000.0],
      "properties": { "datetime": "2014-01-17T09:52:31Z", "proj:epsg": 32633 },
      "assets": {
        "QA_PIXEL": { "href": "scenes/qa.tif" },
        "SR_B4": { "href": "scenes/b4.tif" },
        "SR_B5": { "href": "scenes/b5.tif" }
      }
    }
  ]
}"#;

/// One clear January scene, a land-everywhere datamask slightly larger than it
fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let scenes = dir.path().join("scenes");
    fs::create_dir_all(&scenes).unwrap();
    write_layer(&scenes.join("qa.tif"), 34, WEST, NORTH, 21_824.0);
    write_layer(&scenes.join("b4.tif"), 34, WEST, NORTH, 10_000.0);
    write_layer(&scenes.join("b5.tif"), 34, WEST, NORTH, 30_000.0);
    write_layer(&dir.path().join("datamask.tif"), 40, WEST - 60.0, NORTH + 60.0, 1.0);
    fs::write(dir.path().join("collection.json"), COLLECTION).unwrap();
    dir
}

fn roi() -> Roi {
    Roi::new(Geometry::Rect(Rect::new(
        (WEST, NORTH - 1_000.0),
        (WEST + 1_000.0, NORTH),
    )))
    .unwrap()
    .with_crs(CRS::from_epsg(u32::from(EPSG)))
}

// ── Runs ──────────────────────────────────────────────────────────────

#[test]
fn january_is_defined_when_read_from_disk() {
    let dir = workspace();
    let catalog = LocalCatalog::open(dir.path().join("collection.json")).unwrap();
    let land = GeoTiffLandCover::new(dir.path().join("datamask.tif"));
    let roi = roi();
    let config = PipelineConfig {
        start: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
        periods: 2,
        ..Default::default()
    };

    let builder = TimeSeriesBuilder::new(config, &catalog, &roi, &land).unwrap();
    assert_eq!(builder.land_mask().land_count(), 1_600);

    let out = dir.path().join("out");
    let mut rasters = GeoTiffExporter::new(&out, "NDVI", 30.0);
    let series = builder.run(&mut rasters, &mut Discard).unwrap();

    let january = &series.records()[0];
    assert_eq!(january.image_count, 1);
    assert_eq!(january.valid_pixels, 100);
    assert_relative_eq!(january.value.unwrap(), 0.55 / 0.7, epsilon = 1e-6);
    assert_eq!(series.records()[1].value, None);

    let back: Raster<f64> = read_geotiff(out.join("NDVI_Month1.tif")).unwrap();
    assert_eq!(back.shape(), (34, 34));
    assert_relative_eq!(back.cell_size(), 30.0);
    assert_relative_eq!(back.transform().origin_x, WEST);
    assert_relative_eq!(back.transform().origin_y, NORTH);
    assert_eq!(back.crs().and_then(|c| c.epsg()), Some(32633));
    assert_relative_eq!(back.get(10, 10).unwrap().unwrap(), 0.55 / 0.7, epsilon = 1e-6);
}
