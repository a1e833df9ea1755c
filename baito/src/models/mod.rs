//! Time and wage model
//!
//! Value types shared by the calculator, the record stores, and the
//! migration: clock times, shifts, settings, and month keys.

pub mod month_key;
pub mod settings;
pub mod shift;
pub mod time;

pub use month_key::MonthKey;
pub use settings::{Settings, SettingsPatch};
pub use shift::Shift;
pub use time::{days_in_month, is_weekend, ClockTime};
