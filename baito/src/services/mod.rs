//! Services module
//!
//! Business logic that coordinates between the session and the record stores.

pub mod migration;
pub mod salary;
pub mod workdays;

pub use migration::MigrationService;
pub use salary::{
    compute_month_salaries, compute_shift_pay, compute_year_salaries, MonthSalaries, YearSalaries,
};
pub use workdays::WorkdaysService;
