//! Workdays service
//!
//! What the UI calls for shifts, settings and salaries. Each call resolves
//! the record store for the current identity, so the same code serves guest
//! and account sessions.

use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::models::{MonthKey, Settings, SettingsPatch, Shift};
use crate::services::salary::{
    compute_month_salaries, compute_year_salaries, MonthSalaries, YearSalaries,
};
use crate::session::Session;
use chrono::NaiveDate;
use std::sync::Arc;

/// Service for shifts, settings and salary views
#[derive(Clone)]
pub struct WorkdaysService {
    session: Arc<Session>,
}

impl WorkdaysService {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn current_identity(&self) -> Identity {
        self.session.current_identity()
    }

    /// Shifts of one month, sorted by day
    pub async fn fetch_shifts(&self, year: i32, month0: u32) -> Result<Vec<Shift>> {
        let key = MonthKey::new(year, month0)?;
        self.session.store().await?.get_shifts(key).await
    }

    /// Record a shift, replacing any shift already on that day
    pub async fn add_shift(&self, year: i32, month0: u32, shift: Shift) -> Result<()> {
        let key = MonthKey::new(year, month0)?;
        shift.validate_for_month(&key)?;

        tracing::info!("Adding shift on {}-{:02}", key, shift.day);
        self.session.store().await?.put_shift(key, shift).await
    }

    /// Replace the shift on `day`; a different `shift.day` moves it.
    ///
    /// Moving onto a day that already has a shift is `InvalidShift`.
    pub async fn update_shift(&self, year: i32, month0: u32, day: u32, shift: Shift) -> Result<()> {
        let key = MonthKey::new(year, month0)?;
        shift.validate_for_month(&key)?;

        let store = self.session.store().await?;
        let new_day = shift.day;
        if new_day != day && store.get_shifts(key).await?.iter().any(|s| s.day == new_day) {
            return Err(AppError::InvalidShift(format!(
                "cannot move the shift on {}-{:02} onto day {}, which already has a shift",
                key, day, new_day
            )));
        }
        store.put_shift(key, shift).await?;

        if new_day != day {
            store.delete_shift(key, day).await?;
            tracing::info!("Moved shift in {} from day {} to {}", key, day, new_day);
        } else {
            tracing::debug!("Updated shift on {}-{:02}", key, day);
        }

        Ok(())
    }

    pub async fn delete_shift(&self, year: i32, month0: u32, day: u32) -> Result<()> {
        let key = MonthKey::new(year, month0)?;

        tracing::info!("Deleting shift on {}-{:02}", key, day);
        self.session.store().await?.delete_shift(key, day).await
    }

    /// Stored settings, or the defaults when nothing was saved yet
    pub async fn fetch_settings(&self) -> Result<Settings> {
        Ok(self
            .session
            .store()
            .await?
            .get_settings()
            .await?
            .unwrap_or_default())
    }

    /// Merge `patch` into the stored settings and return the result
    pub async fn save_settings(&self, patch: SettingsPatch) -> Result<Settings> {
        if patch.is_empty() {
            return self.fetch_settings().await;
        }

        let settings = self.session.store().await?.put_settings(&patch).await?;
        tracing::info!("Settings saved");
        Ok(settings)
    }

    /// A new shift for `date` prefilled from the current settings
    pub async fn draft_shift(&self, date: NaiveDate) -> Result<Shift> {
        Ok(self.fetch_settings().await?.draft_shift(date))
    }

    pub async fn month_salaries(&self, year: i32, month0: u32) -> Result<MonthSalaries> {
        let key = MonthKey::new(year, month0)?;
        let store = self.session.store().await?;
        let settings = store.get_settings().await?.unwrap_or_default();
        let shifts = store.get_shifts(key).await?;

        Ok(compute_month_salaries(key, &shifts, &settings))
    }

    pub async fn year_salaries(&self, year: i32) -> Result<YearSalaries> {
        let store = self.session.store().await?;
        let settings = store.get_settings().await?.unwrap_or_default();

        compute_year_salaries(year, &settings, |key| {
            let store = store.clone();
            async move { store.get_shifts(key).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_memory_pool, SqliteKeyValueStore};
    use crate::identity::MemoryIdentityProvider;
    use crate::models::ClockTime;
    use crate::storage::MemoryDocumentStore;
    use std::time::Duration;

    async fn create_test_service() -> (WorkdaysService, Arc<Session>) {
        let kv = Arc::new(SqliteKeyValueStore::new(create_memory_pool().await.unwrap()));
        let session = Arc::new(Session::new(
            Arc::new(MemoryIdentityProvider::new()),
            kv,
            Arc::new(MemoryDocumentStore::new()),
            Duration::from_millis(200),
        ));
        session.enter_guest().await.unwrap();
        (WorkdaysService::new(session.clone()), session)
    }

    fn shift(day: u32, start: (u32, u32), end: (u32, u32)) -> Shift {
        Shift::new(
            day,
            ClockTime::new(start.0, start.1).unwrap(),
            ClockTime::new(end.0, end.1).unwrap(),
            1200.0,
        )
    }

    #[tokio::test]
    async fn test_add_and_fetch_shifts() {
        let (service, _session) = create_test_service().await;

        service.add_shift(2024, 0, shift(20, (17, 0), (22, 0))).await.unwrap();
        service.add_shift(2024, 0, shift(3, (17, 0), (22, 0))).await.unwrap();

        let days: Vec<u32> = service
            .fetch_shifts(2024, 0)
            .await
            .unwrap()
            .iter()
            .map(|s| s.day)
            .collect();
        assert_eq!(days, vec![3, 20]);
        assert!(service.fetch_shifts(2024, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_shift_rejects_invalid_input() {
        let (service, _session) = create_test_service().await;

        let feb_30 = service.add_shift(2023, 1, shift(30, (17, 0), (22, 0))).await;
        assert!(matches!(feb_30, Err(AppError::InvalidShift(_))));

        let inverted = service.add_shift(2024, 0, shift(4, (22, 0), (17, 0))).await;
        assert!(matches!(inverted, Err(AppError::InvalidShift(_))));

        let bad_month = service.add_shift(2024, 12, shift(4, (17, 0), (22, 0))).await;
        assert!(matches!(bad_month, Err(AppError::InvalidTime(_))));

        assert!(service.fetch_shifts(2024, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_shift_in_place_and_move() {
        let (service, _session) = create_test_service().await;
        service.add_shift(2024, 4, shift(10, (17, 0), (22, 0))).await.unwrap();

        service
            .update_shift(2024, 4, 10, shift(10, (18, 0), (22, 0)))
            .await
            .unwrap();
        let shifts = service.fetch_shifts(2024, 4).await.unwrap();
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].start_time, ClockTime::new(18, 0).unwrap());

        service
            .update_shift(2024, 4, 10, shift(12, (18, 0), (22, 0)))
            .await
            .unwrap();
        let days: Vec<u32> = service
            .fetch_shifts(2024, 4)
            .await
            .unwrap()
            .iter()
            .map(|s| s.day)
            .collect();
        assert_eq!(days, vec![12]);
    }

    #[tokio::test]
    async fn test_update_shift_refuses_to_move_onto_occupied_day() {
        let (service, _session) = create_test_service().await;
        service.add_shift(2024, 4, shift(10, (17, 0), (22, 0))).await.unwrap();
        service.add_shift(2024, 4, shift(12, (18, 0), (21, 0))).await.unwrap();

        let result = service
            .update_shift(2024, 4, 10, shift(12, (19, 0), (22, 0)))
            .await;
        assert!(matches!(result, Err(AppError::InvalidShift(_))));

        let shifts = service.fetch_shifts(2024, 4).await.unwrap();
        assert_eq!(shifts.len(), 2);
        assert_eq!(shifts[0].day, 10);
        assert_eq!(shifts[1].start_time, ClockTime::new(18, 0).unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_shift_is_noop() {
        let (service, _session) = create_test_service().await;
        service.add_shift(2024, 4, shift(10, (17, 0), (22, 0))).await.unwrap();

        service.delete_shift(2024, 4, 11).await.unwrap();
        assert_eq!(service.fetch_shifts(2024, 4).await.unwrap().len(), 1);

        service.delete_shift(2024, 4, 10).await.unwrap();
        assert!(service.fetch_shifts(2024, 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settings_default_and_patch() {
        let (service, _session) = create_test_service().await;

        assert_eq!(service.fetch_settings().await.unwrap(), Settings::default());

        let saved = service
            .save_settings(SettingsPatch {
                commuting_cost: Some(300.0),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();
        assert_eq!(saved.commuting_cost, 300.0);
        assert_eq!(saved.weekday_wage, Settings::default().weekday_wage);
        assert_eq!(service.fetch_settings().await.unwrap(), saved);

        let invalid = service
            .save_settings(SettingsPatch {
                pay_interval_minutes: Some(7),
                ..SettingsPatch::default()
            })
            .await;
        assert!(matches!(invalid, Err(AppError::InvalidSettings(_))));
        assert_eq!(service.fetch_settings().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_draft_shift_uses_weekend_wage() {
        let (service, _session) = create_test_service().await;

        // 2024-06-01 is a Saturday
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let draft = service.draft_shift(saturday).await.unwrap();
        assert_eq!(draft.day, 1);
        assert_eq!(draft.wage, 1500.0);
        assert_eq!(draft.start_time, ClockTime::new(17, 0).unwrap());

        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(service.draft_shift(monday).await.unwrap().wage, 1200.0);
    }

    #[tokio::test]
    async fn test_month_and_year_salaries() {
        let (service, _session) = create_test_service().await;
        service.add_shift(2024, 0, shift(15, (17, 0), (22, 30))).await.unwrap();
        service.add_shift(2024, 2, shift(1, (17, 0), (22, 0))).await.unwrap();

        let january = service.month_salaries(2024, 0).await.unwrap();
        assert_eq!(january.daily.len(), 31);
        assert_eq!(january.daily[14], 7210.0);
        assert_eq!(january.sum, 7210.0);

        let year = service.year_salaries(2024).await.unwrap();
        assert_eq!(year.monthly[0], 7210.0);
        assert_eq!(year.monthly[1], 0.0);
        assert_eq!(year.monthly[2], 6460.0);
        assert_eq!(year.total, 13670.0);
    }

    #[tokio::test]
    async fn test_guest_and_account_data_are_separate() {
        let (service, session) = create_test_service().await;
        service.add_shift(2024, 0, shift(2, (17, 0), (22, 0))).await.unwrap();

        session.sign_in_federated().await.unwrap();
        assert!(matches!(service.current_identity(), Identity::Account(_)));
        assert!(service.fetch_shifts(2024, 0).await.unwrap().is_empty());

        session.logout().await.unwrap();
        session.enter_guest().await.unwrap();
        assert_eq!(service.fetch_shifts(2024, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_write_after_identity_change_is_rejected() {
        let (service, session) = create_test_service().await;
        let store = session.store().await.unwrap();

        session.logout().await.unwrap();
        session.sign_in_federated().await.unwrap();

        let key = MonthKey::new(2024, 0).unwrap();
        let result = store.put_shift(key, shift(2, (17, 0), (22, 0))).await;
        assert!(matches!(result, Err(AppError::SessionChanged)));

        session.logout().await.unwrap();
        session.enter_guest().await.unwrap();
        assert!(service.fetch_shifts(2024, 0).await.unwrap().is_empty());
    }
}
