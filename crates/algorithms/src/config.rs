//! Run configuration.
//!
//! Defaults reproduce a Landsat 8 Collection 2 Level-2 NDVI year starting in
//! January 2014, with the Hansen global forest change `datamask` as the
//! land/water layer.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use greenseries_core::{Error, Result};

use crate::statistics::Reducer;

/// Everything the time-series driver needs besides its data sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// First day of the first period (`YYYY-MM-01`)
    pub start: NaiveDate,
    /// Number of monthly periods
    pub periods: usize,
    pub quality: QualityConfig,
    pub calibration: Vec<BandGroup>,
    pub land_mask: LandMaskConfig,
    pub index: IndexConfig,
    /// Cell size of the composite grid laid over the region
    pub composite_resolution: f64,
    pub aggregation: AggregationConfig,
    pub export: ExportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap_or_default(),
            periods: 12,
            quality: QualityConfig::default(),
            calibration: BandGroup::landsat_c2_l2(),
            land_mask: LandMaskConfig::default(),
            index: IndexConfig::default(),
            composite_resolution: 30.0,
            aggregation: AggregationConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// QA band and the bit positions flagging unusable pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub band: String,
    pub cloud_bit: u8,
    pub cloud_shadow_bit: u8,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            band: "QA_PIXEL".to_string(),
            cloud_bit: 5,
            cloud_shadow_bit: 3,
        }
    }
}

/// Linear rescaling applied to every band whose name starts with `prefix`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandGroup {
    pub name: String,
    pub prefix: String,
    pub scale: f64,
    pub offset: f64,
}

impl BandGroup {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, scale: f64, offset: f64) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            scale,
            offset,
        }
    }

    /// Collection 2 Level-2 surface reflectance and surface temperature
    pub fn landsat_c2_l2() -> Vec<Self> {
        vec![
            Self::new("optical", "SR_B", 0.0000275, -0.2),
            Self::new("thermal", "ST_B", 0.00341802, 149.0),
        ]
    }

    pub fn matches(&self, band: &str) -> bool {
        band.starts_with(&self.prefix)
    }
}

/// Land/water classification layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandMaskConfig {
    /// Label of the classification layer in log messages. The layer itself
    /// is whatever the land cover source loads.
    pub band: String,
    /// Class code meaning "land"
    pub land_value: f64,
}

impl Default for LandMaskConfig {
    fn default() -> Self {
        Self {
            band: "datamask".to_string(),
            land_value: 1.0,
        }
    }
}

/// Bands of the normalized difference `(numerator - denominator) / (numerator + denominator)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "NDVI".to_string(),
            numerator: "SR_B5".to_string(),
            denominator: "SR_B4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Ground sample distance of the regional reduction
    pub resolution: f64,
    pub reducer: Reducer,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            resolution: 100.0,
            reducer: Reducer::Mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Cell size of exported index rasters
    pub resolution: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { resolution: 30.0 }
    }
}

impl PipelineConfig {
    /// Reject settings that would make every run fail or silently misbehave
    pub fn validate(&self) -> Result<()> {
        if self.start.day() != 1 {
            return Err(invalid("start", self.start, "must be the first day of a month"));
        }
        if self.periods == 0 {
            return Err(invalid("periods", self.periods, "at least one period is required"));
        }

        for (name, bit) in [
            ("quality.cloud_bit", self.quality.cloud_bit),
            ("quality.cloud_shadow_bit", self.quality.cloud_shadow_bit),
        ] {
            if bit >= 32 {
                return Err(invalid(name, bit, "QA bit position must be below 32"));
            }
        }
        if self.quality.band.is_empty() {
            return Err(invalid("quality.band", "\"\"", "band name is empty"));
        }

        for group in &self.calibration {
            if group.prefix.is_empty() {
                return Err(invalid("calibration.prefix", &group.name, "prefix is empty"));
            }
            if !group.scale.is_finite() || !group.offset.is_finite() {
                return Err(invalid(
                    "calibration.scale",
                    format!("{} x {} + {}", group.name, group.scale, group.offset),
                    "scale and offset must be finite",
                ));
            }
        }

        if self.index.numerator.is_empty() || self.index.denominator.is_empty() {
            return Err(invalid("index", &self.index.name, "index bands must be named"));
        }
        if self.index.numerator == self.index.denominator {
            return Err(invalid(
                "index.denominator",
                &self.index.denominator,
                "numerator and denominator must differ",
            ));
        }

        for (name, res) in [
            ("composite_resolution", self.composite_resolution),
            ("aggregation.resolution", self.aggregation.resolution),
            ("export.resolution", self.export.resolution),
        ] {
            if !res.is_finite() || res <= 0.0 {
                return Err(invalid(name, res, "must be a positive, finite cell size"));
            }
        }

        Ok(())
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> Error {
    Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
