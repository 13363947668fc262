//! Output collaborators of the time-series driver
//!
//! Index rasters go to a [`RasterExporter`] one period at a time, in period
//! order; the finished table goes to a [`TableExporter`] once.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use greenseries_core::io::{write_geotiff, GeoTiffOptions};
use greenseries_core::raster::resample_to_resolution;
use greenseries_core::{Error, Raster, Result};
use tracing::debug;

use crate::timeseries::{Period, TimeSeriesRecord};

/// Receives the index raster of every period
pub trait RasterExporter {
    fn export_raster(&mut self, raster: &Raster<f64>, period: &Period) -> Result<()>;
}

/// Receives the complete, ordered record table
pub trait TableExporter {
    fn export_table(&mut self, records: &[TimeSeriesRecord]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// GeoTIFF
// ---------------------------------------------------------------------------

/// Writes `<dir>/<prefix>_Month<N>.tif`, resampled to the export resolution
#[derive(Debug, Clone)]
pub struct GeoTiffExporter {
    dir: PathBuf,
    prefix: String,
    resolution: f64,
    written: Vec<PathBuf>,
}

impl GeoTiffExporter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, resolution: f64) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            resolution,
            written: Vec::new(),
        }
    }

    pub fn file_name(&self, period: &Period) -> String {
        format!("{}_Month{}.tif", self.prefix, period.index)
    }

    /// Files written so far, in period order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl RasterExporter for GeoTiffExporter {
    fn export_raster(&mut self, raster: &Raster<f64>, period: &Period) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let resampled;
        let out = if (raster.cell_size() - self.resolution).abs() < 1e-9 {
            raster
        } else {
            resampled = resample_to_resolution(raster, self.resolution)?;
            &resampled
        };

        let options = GeoTiffOptions {
            epsg: raster
                .crs()
                .and_then(|crs| crs.epsg())
                .and_then(|code| u16::try_from(code).ok()),
        };

        let path = self.dir.join(self.file_name(period));
        write_geotiff(out, &path, &options)?;
        debug!("wrote {} ({}x{})", path.display(), out.rows(), out.cols());
        self.written.push(path);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// CSV table: `month,period,<value column>,images,valid_pixels`.
///
/// Undefined values are written as the no-data marker (empty by default).
pub struct CsvTableExporter<W: Write> {
    writer: csv::Writer<W>,
    value_column: String,
    nodata: String,
}

impl CsvTableExporter<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(file))
    }
}

impl<W: Write> CsvTableExporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            value_column: "meanNDVI".to_string(),
            nodata: String::new(),
        }
    }

    pub fn with_value_column(mut self, name: impl Into<String>) -> Self {
        self.value_column = name.into();
        self
    }

    pub fn with_nodata(mut self, marker: impl Into<String>) -> Self {
        self.nodata = marker.into();
        self
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Export(e.to_string()))
    }
}

impl<W: Write> TableExporter for CsvTableExporter<W> {
    fn export_table(&mut self, records: &[TimeSeriesRecord]) -> Result<()> {
        let csv_err = |e: csv::Error| Error::Export(e.to_string());

        self.writer
            .write_record(["month", "period", self.value_column.as_str(), "images", "valid_pixels"])
            .map_err(csv_err)?;

        for r in records {
            let value = r.value.map_or_else(|| self.nodata.clone(), |v| v.to_string());
            self.writer
                .write_record([
                    r.month.to_string(),
                    r.period.clone(),
                    value,
                    r.image_count.to_string(),
                    r.valid_pixels.to_string(),
                ])
                .map_err(csv_err)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON array of records; undefined values are `null`
pub struct JsonTableExporter<W: Write> {
    writer: W,
    pretty: bool,
}

impl JsonTableExporter<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::create(path.as_ref())?))
    }
}

impl<W: Write> JsonTableExporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
        }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TableExporter for JsonTableExporter<W> {
    fn export_table(&mut self, records: &[TimeSeriesRecord]) -> Result<()> {
        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, records)
        } else {
            serde_json::to_writer(&mut self.writer, records)
        };
        written.map_err(|e| Error::Export(e.to_string()))?;
        self.writer.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-process sinks
// ---------------------------------------------------------------------------

/// Keeps everything it is given
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rasters: Vec<(Period, Raster<f64>)>,
    pub records: Vec<TimeSeriesRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RasterExporter for MemorySink {
    fn export_raster(&mut self, raster: &Raster<f64>, period: &Period) -> Result<()> {
        self.rasters.push((*period, raster.clone()));
        Ok(())
    }
}

impl TableExporter for MemorySink {
    fn export_table(&mut self, records: &[TimeSeriesRecord]) -> Result<()> {
        self.records = records.to_vec();
        Ok(())
    }
}

/// Drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl RasterExporter for Discard {
    fn export_raster(&mut self, _raster: &Raster<f64>, _period: &Period) -> Result<()> {
        Ok(())
    }
}

impl TableExporter for Discard {
    fn export_table(&mut self, _records: &[TimeSeriesRecord]) -> Result<()> {
        Ok(())
    }
}
