//! Monthly index time series over a region of interest

use std::sync::Arc;

use greenseries_core::{ImageArchive, LandCoverSource, Raster, Roi};
use tracing::{info, warn};

use crate::compositing::PeriodCompositor;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, Stage, StageContext};
use crate::export::{RasterExporter, TableExporter};
use crate::imagery::{ImagePreprocessor, IndexCalculator, LandWaterMask};
use crate::maybe_rayon::*;
use crate::statistics::RegionAggregator;
use crate::timeseries::{monthly_periods, Period, TimeSeries, TimeSeriesRecord};

/// Everything one period produces
#[derive(Debug, Clone)]
pub struct PeriodOutput {
    pub period: Period,
    pub index: Raster<f64>,
    pub record: TimeSeriesRecord,
}

/// Drives compositing, index computation and regional reduction across
/// consecutive months.
///
/// The land/water mask is read from its source once, when the builder is
/// created, and shared read-only by every period.
///
/// # Example
///
/// ```ignore
/// let builder = TimeSeriesBuilder::new(config, &archive, &roi, &land_cover)?;
/// let series = builder.run(&mut GeoTiffExporter::new("out", "NDVI", 30.0), &mut Discard)?;
/// ```
pub struct TimeSeriesBuilder<'a, A: ImageArchive + ?Sized> {
    config: PipelineConfig,
    archive: &'a A,
    roi: &'a Roi,
    land: Arc<LandWaterMask>,
    compositor: PeriodCompositor,
    calculator: IndexCalculator,
    aggregator: RegionAggregator,
}

impl<'a, A: ImageArchive + ?Sized> TimeSeriesBuilder<'a, A> {
    /// Validate `config` and load the land/water mask from `land_cover`
    pub fn new<L>(config: PipelineConfig, archive: &'a A, roi: &'a Roi, land_cover: &L) -> PipelineResult<Self>
    where
        L: LandCoverSource + ?Sized,
    {
        config.validate().stage(Stage::Configuration)?;
        let land = LandWaterMask::load(land_cover, &config.land_mask).stage(Stage::LandMask)?;
        Self::assemble(config, archive, roi, Arc::new(land))
    }

    /// Use an already built land/water mask
    pub fn with_land_mask(
        config: PipelineConfig,
        archive: &'a A,
        roi: &'a Roi,
        land: Arc<LandWaterMask>,
    ) -> PipelineResult<Self> {
        config.validate().stage(Stage::Configuration)?;
        Self::assemble(config, archive, roi, land)
    }

    fn assemble(
        config: PipelineConfig,
        archive: &'a A,
        roi: &'a Roi,
        land: Arc<LandWaterMask>,
    ) -> PipelineResult<Self> {
        let preprocessor = ImagePreprocessor::from_config(&config, Arc::clone(&land));
        let compositor = PeriodCompositor::new(preprocessor, config.composite_resolution);
        let calculator = IndexCalculator::from_config(&config.index);
        let aggregator = RegionAggregator::from_config(&config.aggregation).stage(Stage::Configuration)?;

        Ok(Self {
            config,
            archive,
            roi,
            land,
            compositor,
            calculator,
            aggregator,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn land_mask(&self) -> &Arc<LandWaterMask> {
        &self.land
    }

    /// The ordered periods of the run
    pub fn periods(&self) -> PipelineResult<Vec<Period>> {
        monthly_periods(self.config.start, self.config.periods).stage(Stage::Configuration)
    }

    /// Composite, index and reduce one period. Touches no shared state.
    pub fn process_period(&self, period: &Period) -> PipelineResult<PeriodOutput> {
        let tag = |e: PipelineError| e.in_period(period.index, period.label());

        let composite = self
            .compositor
            .composite(self.archive, self.roi, period)
            .map_err(tag)?;
        let index = self.calculator.compute(&composite, self.roi).map_err(tag)?;
        let summary = self
            .aggregator
            .aggregate(&index, self.roi)
            .stage(Stage::Aggregation)
            .map_err(tag)?;

        let record = TimeSeriesRecord::new(period, summary, composite.image_count());
        match record.value {
            Some(v) => info!(
                "{} ({}): {} {} = {:.4} over {} pixels from {} images",
                period.index,
                period.label(),
                self.aggregator.reducer(),
                self.calculator.name(),
                v,
                record.valid_pixels,
                record.image_count
            ),
            None => warn!(
                "{} ({}): no valid {} pixels ({} images)",
                period.index,
                period.label(),
                self.calculator.name(),
                record.image_count
            ),
        }

        Ok(PeriodOutput {
            period: *period,
            index,
            record,
        })
    }

    /// Run every period, export each index raster and then the table.
    ///
    /// Periods may be evaluated concurrently; exports always happen in
    /// period order and the first failing period aborts the run.
    pub fn run<R, T>(&self, rasters: &mut R, table: &mut T) -> PipelineResult<TimeSeries>
    where
        R: RasterExporter + ?Sized,
        T: TableExporter + ?Sized,
    {
        let periods = self.periods()?;
        info!(
            "{} periods from {} ({} {})",
            periods.len(),
            self.config.start,
            self.calculator.name(),
            self.aggregator.reducer()
        );

        let outputs: Vec<PipelineResult<PeriodOutput>> = periods
            .into_par_iter()
            .map(|period| self.process_period(&period))
            .collect();

        let mut records = Vec::with_capacity(outputs.len());
        for output in outputs {
            let output = output?;
            rasters
                .export_raster(&output.index, &output.period)
                .stage(Stage::RasterExport)
                .map_err(|e| e.in_period(output.period.index, output.period.label()))?;
            records.push(output.record);
        }

        table.export_table(&records).stage(Stage::TableExport)?;

        Ok(TimeSeries {
            index: self.calculator.name().to_string(),
            records,
        })
    }
}
