//! Shift (workday) record

use super::month_key::MonthKey;
use super::time::ClockTime;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// One recorded work interval on a calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    /// Day of the month, 1-31
    pub day: u32,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    /// Hourly rate
    pub wage: f64,
}

impl Shift {
    pub fn new(day: u32, start_time: ClockTime, end_time: ClockTime, wage: f64) -> Self {
        Self {
            day,
            start_time,
            end_time,
            wage,
        }
    }

    /// Check field ranges without looking at the month it belongs to
    pub fn validate(&self) -> Result<()> {
        self.start_time.validate()?;
        self.end_time.validate()?;

        if !(1..=31).contains(&self.day) {
            return Err(AppError::InvalidShift(format!(
                "day {} is outside 1-31",
                self.day
            )));
        }
        if !self.wage.is_finite() || self.wage < 0.0 {
            return Err(AppError::InvalidShift(format!(
                "wage {} must be a non-negative amount",
                self.wage
            )));
        }
        Ok(())
    }

    /// Validate for storage in `key`: the day must exist in that month and the
    /// shift must end after it starts
    pub fn validate_for_month(&self, key: &MonthKey) -> Result<()> {
        self.validate()?;

        if self.day > key.days() {
            return Err(AppError::InvalidShift(format!(
                "{} has no day {}",
                key, self.day
            )));
        }
        if self.end_time <= self.start_time {
            return Err(AppError::InvalidShift(format!(
                "shift on day {} ends at {} which is not after its start {}",
                self.day, self.end_time, self.start_time
            )));
        }
        Ok(())
    }

    /// Minutes between start and end
    pub fn duration_minutes(&self) -> i64 {
        self.end_time.to_minutes() - self.start_time.to_minutes()
    }
}

/// Insert or replace by day and keep the collection sorted by day
pub(crate) fn upsert_by_day(shifts: &mut Vec<Shift>, shift: Shift) {
    match shifts.iter_mut().find(|s| s.day == shift.day) {
        Some(existing) => *existing = shift,
        None => shifts.push(shift),
    }
    sort_by_day(shifts);
}

pub(crate) fn sort_by_day(shifts: &mut [Shift]) {
    shifts.sort_by_key(|s| s.day);
}
