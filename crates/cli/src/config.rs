//! Run files: inputs plus pipeline settings in one TOML document.
//!
//! ```toml
//! [inputs]
//! catalog = "landsat/collection.json"
//! roi = "roi.geojson"
//! roi_epsg = 32633
//! land_cover = "hansen/datamask.tif"
//! output = "out"
//! table_format = "csv"
//!
//! [pipeline]
//! start = "2014-01-01"
//! periods = 12
//! ```
//!
//! Relative paths are taken from the directory holding the run file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use greenseries_algorithms::PipelineConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RunFile {
    pub inputs: Inputs,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Inputs {
    /// Item Collection JSON of the image archive
    pub catalog: PathBuf,
    /// GeoJSON polygon(s) of the region of interest
    pub roi: PathBuf,
    /// EPSG code of the ROI coordinates, when known
    pub roi_epsg: Option<u32>,
    /// Land/water classification GeoTIFF
    pub land_cover: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub table_format: TableFormat,
    /// Asset keys to read; all assets when absent
    pub bands: Option<Vec<String>>,
    /// File name prefix of the monthly rasters; the index name when absent
    pub raster_prefix: Option<String>,
    /// Text written for undefined values in CSV tables
    #[serde(default)]
    pub nodata: String,
}

fn default_output() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Csv,
    Json,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Json => "json",
        }
    }
}

impl RunFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read run file {}", path.display()))?;
        let mut run: RunFile = toml::from_str(&text)
            .with_context(|| format!("Failed to parse run file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        run.inputs.resolve(base);
        Ok(run)
    }
}

impl Inputs {
    fn resolve(&mut self, base: &Path) {
        for p in [
            &mut self.catalog,
            &mut self.roi,
            &mut self.land_cover,
            &mut self.output,
        ] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }
}
