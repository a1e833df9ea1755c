//! Wall-clock time values and calendar helpers

use crate::error::{AppError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A time of day on local wall time, `00:00` through `24:00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

impl ClockTime {
    /// Create a validated clock time
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        let time = Self { hour, minute };
        time.validate()?;
        Ok(time)
    }

    pub(crate) const fn from_pair(pair: (u32, u32)) -> Self {
        Self {
            hour: pair.0,
            minute: pair.1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.hour > 24 {
            return Err(AppError::InvalidTime(format!(
                "hour {} is outside 0-24",
                self.hour
            )));
        }
        if self.minute > 59 {
            return Err(AppError::InvalidTime(format!(
                "minute {} is outside 0-59",
                self.minute
            )));
        }
        if self.hour == 24 && self.minute != 0 {
            return Err(AppError::InvalidTime(format!(
                "24:{:02} is past the end of the day",
                self.minute
            )));
        }
        Ok(())
    }

    /// Minutes since midnight
    pub fn to_minutes(&self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Number of days in a month; `month0` is zero-based (0 = January)
pub fn days_in_month(year: i32, month0: u32) -> Result<u32> {
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)
        .ok_or_else(|| AppError::InvalidTime(format!("no month {} in year {}", month0, year)))?;

    let next = if month0 == 11 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month0 + 2, 1)
    }
    .ok_or_else(|| AppError::InvalidTime(format!("no month after {}-{}", year, month0 + 1)))?;

    Ok(next.signed_duration_since(first).num_days() as u32)
}
