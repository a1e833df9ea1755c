//! Salary calculator
//!
//! Pure functions turning shifts and settings into pay. The year aggregate
//! takes its month data through an injected fetch capability so it can be
//! driven by any record store, or by plain vectors in tests.

use crate::config::{COMMUTING_TRIPS_PER_SHIFT, OVERTIME_PREMIUM};
use crate::error::Result;
use crate::models::{ClockTime, MonthKey, Settings, Shift};
use futures::future::try_join_all;
use serde::Serialize;
use std::future::Future;

/// Per-day pay for one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSalaries {
    /// Index `day - 1`; days without a shift are zero
    pub daily: Vec<f64>,
    pub sum: f64,
}

/// Per-month totals for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSalaries {
    /// Index is the zero-based month
    pub monthly: [f64; 12],
    pub total: f64,
}

/// Pay for a single shift, including the round-trip commuting cost.
///
/// Time after `overtime_threshold` is paid at the overtime premium. The
/// threshold is compared by clock position, not elapsed duration. Inverted
/// shifts (end before start) are not rejected here and yield a negative base
/// amount; stored shifts are validated as forward intervals before they get
/// this far.
pub fn compute_shift_pay(shift: &Shift, overtime_threshold: ClockTime, commuting_cost: f64) -> f64 {
    let start = shift.start_time.to_minutes();
    let end = shift.end_time.to_minutes();
    let threshold = overtime_threshold.to_minutes();
    let wage = shift.wage;

    let worked = if end > threshold {
        let regular = (threshold - start).max(0) as f64 / 60.0 * wage;
        let overtime = (end - threshold) as f64 / 60.0 * wage * OVERTIME_PREMIUM;
        regular + overtime
    } else {
        (end - start) as f64 / 60.0 * wage
    };

    worked + COMMUTING_TRIPS_PER_SHIFT * commuting_cost
}

/// Dense per-day pay for `key` plus the month total
pub fn compute_month_salaries(key: MonthKey, shifts: &[Shift], settings: &Settings) -> MonthSalaries {
    let mut daily = vec![0.0; key.days() as usize];
    let mut sum = 0.0;

    for shift in shifts {
        let pay = compute_shift_pay(shift, settings.overtime_threshold, settings.commuting_cost);
        match (shift.day as usize).checked_sub(1).and_then(|i| daily.get_mut(i)) {
            Some(slot) => {
                *slot = pay;
                sum += pay;
            }
            None => {
                tracing::warn!("Ignoring shift on day {} outside {}", shift.day, key);
            }
        }
    }

    MonthSalaries { daily, sum }
}

/// Monthly totals for `year`, fetching all twelve months concurrently
pub async fn compute_year_salaries<F, Fut>(
    year: i32,
    settings: &Settings,
    mut fetch: F,
) -> Result<YearSalaries>
where
    F: FnMut(MonthKey) -> Fut,
    Fut: Future<Output = Result<Vec<Shift>>>,
{
    let keys = (0..12)
        .map(|month0| MonthKey::new(year, month0))
        .collect::<Result<Vec<_>>>()?;

    let months = try_join_all(keys.iter().map(|key| fetch(*key))).await?;

    let mut monthly = [0.0; 12];
    for (slot, (key, shifts)) in monthly.iter_mut().zip(keys.into_iter().zip(months)) {
        *slot = compute_month_salaries(key, &shifts, settings).sum;
    }
    let total: f64 = monthly.iter().sum();

    tracing::debug!("Computed salaries for {}: total {}", year, total);

    Ok(YearSalaries { monthly, total })
}
