//! Local catalog round trips through GeoTIFF files on disk.

use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use greenseries_catalog::{GeoTiffLandCover, LocalCatalog};
use greenseries_core::io::{write_geotiff, GeoTiffOptions};
use greenseries_core::{BoundingBox, Error, GeoTransform, ImageArchive, LandCoverSource, Raster};

// ── Fixtures ──────────────────────────────────────────────────────────

fn write_band(dir: &Path, name: &str, value: f64) {
    let mut r = Raster::filled(4, 4, value);
    r.set_transform(GeoTransform::north_up(500_000.0, 4_000_120.0, 30.0));
    write_geotiff(&r, dir.join(name), &GeoTiffOptions { epsg: Some(32633) }).unwrap();
}

const COLLECTION: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "id": "jan",
      "bbox": [500000.0, 4000000.0, 500120.0, 4000120.0],
      "properties": { "datetime": "2014-01-12T09:41:07Z", "proj:epsg": 32633 },
      "assets": {
        "SR_B4": { "href": "bands/jan_b4.tif" },
        "SR_B5": { "href": "bands/jan_b5.tif" }
      }
    },
    {
      "id": "feb-first",
      "bbox": [500000.0, 4000000.0, 500120.0, 4000120.0],
      "properties": { "datetime": "2014-02-01T00:00:00Z", "proj:epsg": 32633 },
      "assets": { "SR_B4": { "href": "bands/jan_b4.tif" } }
    },
    {
      "id": "elsewhere",
      "bbox": [700000.0, 4000000.0, 700120.0, 4000120.0],
      "properties": { "datetime": "2014-01-20T09:41:07Z" },
      "assets": { "SR_B4": { "href": "bands/missing.tif" } }
    }
  ]
}"#;

fn catalog_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let bands = dir.path().join("bands");
    fs::create_dir_all(&bands).unwrap();
    write_band(&bands, "jan_b4.tif", 8_000.0);
    write_band(&bands, "jan_b5.tif", 24_000.0);
    fs::write(dir.path().join("collection.json"), COLLECTION).unwrap();
    dir
}

fn roi_bounds() -> BoundingBox {
    BoundingBox::new(500_010.0, 4_000_010.0, 500_100.0, 4_000_100.0)
}

// ── Queries ───────────────────────────────────────────────────────────

#[test]
fn query_filters_by_bounds_and_half_open_month() {
    let dir = catalog_dir();
    let catalog = LocalCatalog::open(dir.path().join("collection.json")).unwrap();
    assert_eq!(catalog.len(), 3);

    let start = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2014, 2, 1, 0, 0, 0).unwrap();
    let images = catalog.query(&roi_bounds(), start, end).unwrap();

    assert_eq!(images.len(), 1);
    let jan = &images[0];
    assert_eq!(jan.id(), "jan");
    assert_eq!(jan.band_names().collect::<Vec<_>>(), ["SR_B4", "SR_B5"]);
    assert_eq!(jan.band("SR_B5").unwrap().get(2, 2).unwrap(), Some(24_000.0));
    assert_eq!(jan.crs().and_then(|c| c.epsg()), Some(32633));
}

#[test]
fn band_subset() {
    let dir = catalog_dir();
    let catalog = LocalCatalog::open(dir.path().join("collection.json"))
        .unwrap()
        .with_bands(["SR_B5"]);

    let start = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2014, 2, 1, 0, 0, 0).unwrap();
    let images = catalog.query(&roi_bounds(), start, end).unwrap();
    assert_eq!(images[0].len(), 1);
    assert!(images[0].has_band("SR_B5"));
}

#[test]
fn missing_asset_is_an_archive_error() {
    let dir = catalog_dir();
    let catalog = LocalCatalog::open(dir.path().join("collection.json")).unwrap();

    let start = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2014, 2, 1, 0, 0, 0).unwrap();
    let far = BoundingBox::new(700_000.0, 4_000_000.0, 700_050.0, 4_000_050.0);

    match catalog.query(&far, start, end) {
        Err(Error::Archive(msg)) => assert!(msg.contains("elsewhere"), "{}", msg),
        other => panic!("expected archive error, got {:?}", other.map(|v| v.len())),
    }
}

#[test]
fn land_cover_from_geotiff() {
    let dir = tempfile::tempdir().unwrap();
    write_band(dir.path(), "datamask.tif", 1.0);
    let land = GeoTiffLandCover::new(dir.path().join("datamask.tif")).load().unwrap();
    assert_eq!(land.shape(), (4, 4));
    assert_eq!(land.get(0, 0).unwrap(), Some(1.0));
}
