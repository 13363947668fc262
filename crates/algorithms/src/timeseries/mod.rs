//! Period generation and the time-series driver

mod builder;
mod period;
mod record;

pub use builder::{PeriodOutput, TimeSeriesBuilder};
pub use period::{monthly_periods, Period};
pub use record::{TimeSeries, TimeSeriesRecord};
