//! Wage settings record
//!
//! Field names are persisted in the SCREAMING_SNAKE_CASE shape the stored
//! documents have always used. Every field has a serde default so that a
//! document built up from partial merge writes still loads.

use super::shift::Shift;
use super::time::{is_weekend, ClockTime};
use crate::config;
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-identity wage and time picker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Settings {
    /// Prefilled start time for a new shift
    #[serde(default = "default_start_time")]
    pub default_start_time: ClockTime,
    /// Prefilled end time for a new shift
    #[serde(default = "default_end_time")]
    pub default_end_time: ClockTime,
    /// Earliest time offered by the time pickers
    #[serde(default = "default_worktime_start")]
    pub worktime_start: ClockTime,
    /// Latest time offered by the time pickers
    #[serde(default = "default_worktime_end")]
    pub worktime_end: ClockTime,
    /// Minute granularity of the time pickers; divides 60
    #[serde(default = "default_pay_interval_minutes")]
    pub pay_interval_minutes: u32,
    /// Clock time after which overtime premium applies
    #[serde(rename = "TIME_BARRIER", default = "default_overtime_threshold")]
    pub overtime_threshold: ClockTime,
    /// One-way commuting cost, paid twice per shift
    #[serde(default = "default_commuting_cost")]
    pub commuting_cost: f64,
    #[serde(default = "default_weekday_wage")]
    pub weekday_wage: f64,
    #[serde(default = "default_weekend_wage")]
    pub weekend_wage: f64,
}

fn default_start_time() -> ClockTime {
    ClockTime::from_pair(config::DEFAULT_START_TIME)
}

fn default_end_time() -> ClockTime {
    ClockTime::from_pair(config::DEFAULT_END_TIME)
}

fn default_worktime_start() -> ClockTime {
    ClockTime::from_pair(config::DEFAULT_WORKTIME_START)
}

fn default_worktime_end() -> ClockTime {
    ClockTime::from_pair(config::DEFAULT_WORKTIME_END)
}

fn default_pay_interval_minutes() -> u32 {
    config::DEFAULT_PAY_INTERVAL_MINUTES
}

fn default_overtime_threshold() -> ClockTime {
    ClockTime::from_pair(config::DEFAULT_OVERTIME_THRESHOLD)
}

fn default_commuting_cost() -> f64 {
    config::DEFAULT_COMMUTING_COST
}

fn default_weekday_wage() -> f64 {
    config::DEFAULT_WEEKDAY_WAGE
}

fn default_weekend_wage() -> f64 {
    config::DEFAULT_WEEKEND_WAGE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_start_time: default_start_time(),
            default_end_time: default_end_time(),
            worktime_start: default_worktime_start(),
            worktime_end: default_worktime_end(),
            pay_interval_minutes: default_pay_interval_minutes(),
            overtime_threshold: default_overtime_threshold(),
            commuting_cost: default_commuting_cost(),
            weekday_wage: default_weekday_wage(),
            weekend_wage: default_weekend_wage(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        for time in [
            &self.default_start_time,
            &self.default_end_time,
            &self.worktime_start,
            &self.worktime_end,
            &self.overtime_threshold,
        ] {
            time.validate()?;
        }

        // Worktime start may coincide with the default start (17:00 both by default)
        if self.worktime_start > self.default_start_time {
            return Err(AppError::InvalidSettings(format!(
                "default start {} is before the earliest worktime {}",
                self.default_start_time, self.worktime_start
            )));
        }
        if self.default_start_time >= self.default_end_time {
            return Err(AppError::InvalidSettings(format!(
                "default end {} must be after default start {}",
                self.default_end_time, self.default_start_time
            )));
        }
        if self.default_end_time > self.worktime_end {
            return Err(AppError::InvalidSettings(format!(
                "default end {} is after the latest worktime {}",
                self.default_end_time, self.worktime_end
            )));
        }

        let interval = self.pay_interval_minutes;
        if interval == 0 || interval > 60 || 60 % interval != 0 {
            return Err(AppError::InvalidSettings(format!(
                "pay interval {} minutes does not divide an hour",
                interval
            )));
        }

        for (name, amount) in [
            ("commuting cost", self.commuting_cost),
            ("weekday wage", self.weekday_wage),
            ("weekend wage", self.weekend_wage),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(AppError::InvalidSettings(format!(
                    "{} {} must be a non-negative amount",
                    name, amount
                )));
            }
        }

        Ok(())
    }

    /// Overwrite the fields present in `patch`
    pub fn apply(&mut self, patch: &SettingsPatch) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(value) = patch.$field {
                    self.$field = value;
                })*
            };
        }
        take!(
            default_start_time,
            default_end_time,
            worktime_start,
            worktime_end,
            pay_interval_minutes,
            overtime_threshold,
            commuting_cost,
            weekday_wage,
            weekend_wage
        );
    }

    /// Hourly rate that applies on `date`
    pub fn wage_for(&self, date: NaiveDate) -> f64 {
        if is_weekend(date) {
            self.weekend_wage
        } else {
            self.weekday_wage
        }
    }

    /// A new shift on `date` prefilled from the defaults
    pub fn draft_shift(&self, date: NaiveDate) -> Shift {
        use chrono::Datelike;
        Shift::new(
            date.day(),
            self.default_start_time,
            self.default_end_time,
            self.wage_for(date),
        )
    }

    /// Hours offered by the time pickers
    pub fn hour_options(&self) -> Vec<u32> {
        (self.worktime_start.hour..=self.worktime_end.hour).collect()
    }

    /// Minutes offered by the time pickers
    pub fn minute_options(&self) -> Vec<u32> {
        let step = self.pay_interval_minutes.max(1);
        (0..60).step_by(step as usize).collect()
    }
}

/// Partial settings update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_start_time: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_end_time: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktime_start: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktime_end: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_interval_minutes: Option<u32>,
    #[serde(
        rename = "TIME_BARRIER",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub overtime_threshold: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commuting_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday_wage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekend_wage: Option<f64>,
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            default_start_time: Some(settings.default_start_time),
            default_end_time: Some(settings.default_end_time),
            worktime_start: Some(settings.worktime_start),
            worktime_end: Some(settings.worktime_end),
            pay_interval_minutes: Some(settings.pay_interval_minutes),
            overtime_threshold: Some(settings.overtime_threshold),
            commuting_cost: Some(settings.commuting_cost),
            weekday_wage: Some(settings.weekday_wage),
            weekend_wage: Some(settings.weekend_wage),
        }
    }
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }
}
