//! GreenSeries CLI - monthly vegetation-index time series

mod config;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use greenseries_algorithms::export::{
    CsvTableExporter, GeoTiffExporter, JsonTableExporter, TableExporter,
};
use greenseries_algorithms::timeseries::{monthly_periods, TimeSeries, TimeSeriesBuilder};
use greenseries_catalog::{GeoTiffLandCover, LocalCatalog};
use greenseries_core::io::read_geotiff;
use greenseries_core::{Raster, Roi, CRS};

use crate::config::{RunFile, TableFormat};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "greenseries")]
#[command(author, version, about = "Monthly vegetation-index time series", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the time series described by a run file
    Run {
        /// TOML run file
        #[arg(short, long)]
        config: PathBuf,
        /// First day of the first month (YYYY-MM-01), overrides the run file
        #[arg(short, long)]
        start: Option<NaiveDate>,
        /// Number of monthly periods, overrides the run file
        #[arg(short = 'n', long)]
        periods: Option<usize>,
        /// Output directory, overrides the run file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the monthly periods of a run
    Periods {
        /// First day of the first month (YYYY-MM-01)
        #[arg(short, long)]
        start: NaiveDate,
        /// Number of periods
        #[arg(short = 'n', long, default_value = "12")]
        count: usize,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_roi(path: &Path, epsg: Option<u32>) -> Result<Roi> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read region {}", path.display()))?;
    let roi = Roi::from_geojson(&text)
        .with_context(|| format!("Invalid region of interest {}", path.display()))?;
    Ok(match epsg {
        Some(code) => roi.with_crs(CRS::from_epsg(code)),
        None => roi,
    })
}

fn print_table(series: &TimeSeries, value_column: &str) {
    println!(
        "\n{:>5}  {:<7}  {:>10}  {:>6}  {:>7}",
        "month", "period", value_column, "images", "pixels"
    );
    for r in series.records() {
        let value = r
            .value
            .map_or_else(|| "no data".to_string(), |v| format!("{:.4}", v));
        println!(
            "{:>5}  {:<7}  {:>10}  {:>6}  {:>7}",
            r.month, r.period, value, r.image_count, r.valid_pixels
        );
    }
}

// ─── Commands ───────────────────────────────────────────────────────────

fn run(
    config: &Path,
    start: Option<NaiveDate>,
    periods: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut run = RunFile::load(config)?;
    if let Some(start) = start {
        run.pipeline.start = start;
    }
    if let Some(periods) = periods {
        run.pipeline.periods = periods;
    }
    if let Some(output) = output {
        run.inputs.output = output;
    }
    let inputs = &run.inputs;
    let pipeline = &run.pipeline;

    let roi = read_roi(&inputs.roi, inputs.roi_epsg)?;
    info!("Region: {:.0} square map units", roi.area());

    let mut catalog = LocalCatalog::open(&inputs.catalog).context("Failed to open catalog")?;
    if let Some(bands) = &inputs.bands {
        catalog = catalog.with_bands(bands.iter().cloned());
    }
    let land_cover = GeoTiffLandCover::new(&inputs.land_cover);

    let pb = spinner("Loading land/water mask...");
    let builder = TimeSeriesBuilder::new(pipeline.clone(), &catalog, &roi, &land_cover)
        .context("Failed to prepare the time series")?;
    pb.finish_and_clear();

    fs::create_dir_all(&inputs.output)
        .with_context(|| format!("Failed to create {}", inputs.output.display()))?;

    let index_name = pipeline.index.name.clone();
    let value_column = format!("{}{}", pipeline.aggregation.reducer, index_name);
    let prefix = inputs.raster_prefix.clone().unwrap_or_else(|| index_name.clone());
    let table_path = inputs.output.join(format!(
        "{}_{}_by_month.{}",
        pipeline.aggregation.reducer,
        index_name,
        inputs.table_format.extension()
    ));

    let mut rasters = GeoTiffExporter::new(&inputs.output, prefix, pipeline.export.resolution);
    let mut table: Box<dyn TableExporter> = match inputs.table_format {
        TableFormat::Csv => Box::new(
            CsvTableExporter::create(&table_path)
                .context("Failed to create table")?
                .with_value_column(&value_column)
                .with_nodata(&inputs.nodata),
        ),
        TableFormat::Json => Box::new(JsonTableExporter::create(&table_path).context("Failed to create table")?),
    };

    let pb = spinner(&format!("Computing {} periods...", pipeline.periods));
    let started = Instant::now();
    let series = builder
        .run(&mut rasters, &mut *table)
        .context("Time series failed")?;
    let elapsed = started.elapsed();
    pb.finish_and_clear();
    drop(table);

    print_table(&series, &value_column);
    println!(
        "\n{} of {} periods with data",
        series.defined_count(),
        series.len()
    );
    println!("Rasters saved to: {}", inputs.output.display());
    println!("Table saved to: {}", table_path.display());
    println!("  Processing time: {:.2?}", elapsed);
    Ok(())
}

fn periods(start: NaiveDate, count: usize) -> Result<()> {
    let periods = monthly_periods(start, count).context("Invalid period range")?;
    for p in &periods {
        println!("{:>3}  {}  [{}, {})", p.index, p.label(), p.start, p.end);
    }
    Ok(())
}

fn info(input: &Path) -> Result<()> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(input).context("Failed to read raster")?;
    pb.finish_and_clear();

    let (rows, cols) = raster.shape();
    let bounds = raster.bounds();
    let stats = raster.statistics();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!("Cell size: {}", raster.cell_size());
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    if let Some(crs) = raster.crs() {
        println!("CRS: {}", crs);
    }
    println!("\nStatistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            start,
            periods: count,
            output,
        } => run(&config, start, count, output),
        Commands::Periods { start, count } => periods(start, count),
        Commands::Info { input } => info(&input),
    }
}
