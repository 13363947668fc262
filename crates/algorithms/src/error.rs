//! Pipeline errors: a core error tagged with the stage and period that
//! raised it.

use std::fmt;

use greenseries_core::Error;
use thiserror::Error;

/// Step of the time-series pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Configuration,
    Region,
    ArchiveQuery,
    QualityMask,
    Calibration,
    LandMask,
    Composite,
    Index,
    Aggregation,
    RasterExport,
    TableExport,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Configuration => "configuration",
            Stage::Region => "region of interest",
            Stage::ArchiveQuery => "archive query",
            Stage::QualityMask => "quality mask",
            Stage::Calibration => "radiometric calibration",
            Stage::LandMask => "land/water mask",
            Stage::Composite => "composite",
            Stage::Index => "index",
            Stage::Aggregation => "region aggregation",
            Stage::RasterExport => "raster export",
            Stage::TableExport => "table export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Period a failure belongs to: 1-based index and `YYYY-MM` label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodTag {
    pub index: usize,
    pub label: String,
}

/// Fatal pipeline failure.
///
/// Only structural problems end up here; per-pixel anomalies become
/// no-data and empty periods produce empty records.
#[derive(Debug, Error)]
#[error("{}{stage} stage: {source}", describe_period(.period))]
pub struct PipelineError {
    pub stage: Stage,
    pub period: Option<PeriodTag>,
    #[source]
    pub source: Error,
}

fn describe_period(period: &Option<PeriodTag>) -> String {
    match period {
        Some(p) => format!("period {} ({}), ", p.index, p.label),
        None => String::new(),
    }
}

impl PipelineError {
    pub fn new(stage: Stage, source: Error) -> Self {
        Self {
            stage,
            period: None,
            source,
        }
    }

    /// Attach the period, keeping one that is already set
    pub fn in_period(mut self, index: usize, label: impl Into<String>) -> Self {
        if self.period.is_none() {
            self.period = Some(PeriodTag {
                index,
                label: label.into(),
            });
        }
        self
    }
}

/// Tag a core result with the stage that produced it
pub(crate) trait StageContext<T> {
    fn stage(self, stage: Stage) -> PipelineResult<T>;
}

impl<T> StageContext<T> for greenseries_core::Result<T> {
    fn stage(self, stage: Stage) -> PipelineResult<T> {
        self.map_err(|e| PipelineError::new(stage, e))
    }
}

/// Result alias for pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_period_and_stage() {
        let err = PipelineError::new(Stage::Index, Error::missing_band("SR_B5", "composite"))
            .in_period(3, "2014-03");
        let msg = err.to_string();
        assert!(msg.contains("period 3 (2014-03)"), "{}", msg);
        assert!(msg.contains("index stage"), "{}", msg);
        assert!(msg.contains("SR_B5"), "{}", msg);
    }

    #[test]
    fn test_in_period_keeps_first_tag() {
        let err = PipelineError::new(Stage::Composite, Error::Other("x".into()))
            .in_period(2, "2014-02")
            .in_period(5, "2014-05");
        assert_eq!(err.period.unwrap().index, 2);
    }
}
