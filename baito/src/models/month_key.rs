//! `YYYY-MM` addressing key for shift collections

use super::time::days_in_month;
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// A (year, month) pair; `month0` is zero-based (0 = January)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month0: u32,
}

impl MonthKey {
    pub fn new(year: i32, month0: u32) -> Result<Self> {
        if !(0..=9999).contains(&year) {
            return Err(AppError::InvalidTime(format!(
                "year {} does not fit a YYYY key",
                year
            )));
        }
        if month0 > 11 {
            return Err(AppError::InvalidTime(format!(
                "month index {} is outside 0-11",
                month0
            )));
        }
        Ok(Self { year, month0 })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Zero-based month
    pub fn month0(&self) -> u32 {
        self.month0
    }

    pub fn days(&self) -> u32 {
        // Year and month are range-checked on construction
        days_in_month(self.year, self.month0).unwrap_or(31)
    }

    /// The calendar date of `day` within this month, if it exists
    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, day)
    }

    /// Whether an ephemeral storage key names a shift collection
    pub fn is_key(key: &str) -> bool {
        key.parse::<MonthKey>().is_ok()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month0 + 1)
    }
}

impl FromStr for MonthKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AppError::InvalidTime(format!("'{}' is not a YYYY-MM key", s));

        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let (year, month) = (&s[0..4], &s[5..7]);
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Self::new(year, month - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_and_shifts_month() {
        assert_eq!(MonthKey::new(2024, 0).unwrap().to_string(), "2024-01");
        assert_eq!(MonthKey::new(2024, 11).unwrap().to_string(), "2024-12");
        assert_eq!(MonthKey::new(987, 4).unwrap().to_string(), "0987-05");
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(MonthKey::new(2024, 12).is_err());
        assert!(MonthKey::new(10000, 0).is_err());
        assert!(MonthKey::new(-1, 0).is_err());
    }

    #[test]
    fn test_parse() {
        let key: MonthKey = "2024-02".parse().unwrap();
        assert_eq!(key.year(), 2024);
        assert_eq!(key.month0(), 1);
        assert_eq!(key.days(), 29);
    }

    #[test]
    fn test_is_key_matches_only_month_keys() {
        assert!(MonthKey::is_key("2024-01"));
        assert!(MonthKey::is_key("1999-12"));

        assert!(!MonthKey::is_key("settings"));
        assert!(!MonthKey::is_key("2024-13"));
        assert!(!MonthKey::is_key("2024-00"));
        assert!(!MonthKey::is_key("2024-1"));
        assert!(!MonthKey::is_key("24-01-01"));
        assert!(!MonthKey::is_key("2024_01"));
        assert!(!MonthKey::is_key("+024-01"));
    }

    #[test]
    fn test_date() {
        let key = MonthKey::new(2023, 1).unwrap();
        assert!(key.date(28).is_some());
        assert!(key.date(29).is_none());
    }
}
