//! Time-series rows

use chrono::NaiveDate;
use serde::Serialize;

use crate::statistics::RegionSummary;
use crate::timeseries::Period;

/// One row of the output table; exactly one per period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesRecord {
    /// 1-based period index
    pub month: usize,
    /// `YYYY-MM`
    pub period: String,
    pub start: NaiveDate,
    /// Regional statistic, `None` when the period had no valid pixel
    pub value: Option<f64>,
    pub valid_pixels: usize,
    pub image_count: usize,
}

impl TimeSeriesRecord {
    pub fn new(period: &Period, summary: RegionSummary, image_count: usize) -> Self {
        Self {
            month: period.index,
            period: period.label(),
            start: period.start,
            value: summary.value,
            valid_pixels: summary.valid_pixels,
            image_count,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }
}

/// Ordered records of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    /// Index name, e.g. `NDVI`
    pub index: String,
    pub records: Vec<TimeSeriesRecord>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TimeSeriesRecord] {
        &self.records
    }

    /// Periods that produced a value
    pub fn defined_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_defined()).count()
    }

    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.records.iter().map(|r| r.value)
    }
}
