//! Calendar-month periods

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use greenseries_core::{Error, Result};

/// Half-open `[start, end)` interval of one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    /// 1-based position in the run
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// `YYYY-MM`
    pub fn label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }

    /// Calendar month number, 1..=12
    pub fn month(&self) -> u32 {
        self.start.month()
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_utc() && instant < self.end_utc()
    }
}

/// The `count` consecutive months starting at `start`.
///
/// `start` must be the first day of a month; each period ends where the
/// next begins.
pub fn monthly_periods(start: NaiveDate, count: usize) -> Result<Vec<Period>> {
    if start.day() != 1 {
        return Err(Error::InvalidParameter {
            name: "start",
            value: start.to_string(),
            reason: "must be the first day of a month".into(),
        });
    }

    // Whole months between `start` and the last date chrono can represent
    let representable = (NaiveDate::MAX.year() - start.year()) as u64 * 12
        + u64::from(NaiveDate::MAX.month())
        - u64::from(start.month());
    if count as u64 > representable {
        return Err(Error::InvalidParameter {
            name: "periods",
            value: count.to_string(),
            reason: format!("calendar overflow after {} months", representable),
        });
    }

    let mut periods = Vec::new();
    let mut cursor = start;
    for index in 1..=count {
        let end = cursor
            .checked_add_months(Months::new(1))
            .ok_or_else(|| Error::InvalidParameter {
                name: "periods",
                value: count.to_string(),
                reason: format!("calendar overflow after {}", cursor),
            })?;
        periods.push(Period {
            index,
            start: cursor,
            end,
        });
        cursor = end;
    }
    Ok(periods)
}
