//! # GreenSeries Algorithms
//!
//! Monthly vegetation-index time series from a multispectral archive.
//!
//! ## Modules
//!
//! - **imagery**: QA cloud masking, radiometric calibration, land/water
//!   masking, preprocessing and normalized-difference indices
//! - **compositing**: per-pixel temporal median composites per period
//! - **statistics**: reduction of an index raster over a region
//! - **timeseries**: calendar periods and the time-series driver
//! - **export**: GeoTIFF, CSV and JSON output collaborators
//!
//! Periods and composite rows run on rayon when the `parallel` feature is
//! enabled (the default).

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod imagery;
pub(crate) mod maybe_rayon;
pub mod statistics;
pub mod timeseries;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult, Stage};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::compositing::{Composite, PeriodCompositor};
    pub use crate::config::{
        AggregationConfig, BandGroup, ExportConfig, IndexConfig, LandMaskConfig, PipelineConfig,
        QualityConfig,
    };
    pub use crate::error::{PipelineError, PipelineResult, Stage};
    pub use crate::export::{
        CsvTableExporter, Discard, GeoTiffExporter, JsonTableExporter, MemorySink, RasterExporter,
        TableExporter,
    };
    pub use crate::imagery::{
        ndvi, normalized_difference, CleanImage, ImagePreprocessor, IndexCalculator,
        LandWaterMask, QualityMask, RadiometricCalibrator,
    };
    pub use crate::statistics::{Reducer, RegionAggregator, RegionSummary};
    pub use crate::timeseries::{
        monthly_periods, Period, PeriodOutput, TimeSeries, TimeSeriesBuilder, TimeSeriesRecord,
    };
    pub use greenseries_core::prelude::*;
}
