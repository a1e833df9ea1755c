//! Ephemeral backend for guest sessions
//!
//! Layout in the key-value storage:
//! - `"settings"`: settings record as JSON
//! - `"YYYY-MM"`: JSON array of that month's shifts

use super::{BackendKind, KeyValueStore, RecordStore, WriteGuard};
use crate::config::SETTINGS_KEY;
use crate::error::Result;
use crate::models::shift::{sort_by_day, upsert_by_day};
use crate::models::{MonthKey, Settings, SettingsPatch, Shift};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Clone)]
pub struct LocalStore {
    kv: Arc<dyn KeyValueStore>,
    guard: WriteGuard,
}

impl LocalStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            guard: WriteGuard::unguarded(),
        }
    }

    pub fn with_guard(mut self, guard: WriteGuard) -> Self {
        self.guard = guard;
        self
    }

    async fn write_month(&self, key: MonthKey, shifts: &[Shift]) -> Result<()> {
        let json = serde_json::to_string(shifts)?;
        self.guard.check()?;
        self.kv.set(&key.to_string(), &json).await?;
        tracing::debug!("Stored {} shifts for {} locally", shifts.len(), key);
        Ok(())
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Ephemeral
    }

    async fn get_shifts(&self, key: MonthKey) -> Result<Vec<Shift>> {
        let Some(json) = self.kv.get(&key.to_string()).await? else {
            return Ok(Vec::new());
        };

        let mut shifts: Vec<Shift> = serde_json::from_str(&json)?;
        sort_by_day(&mut shifts);
        Ok(shifts)
    }

    async fn put_shift(&self, key: MonthKey, shift: Shift) -> Result<()> {
        let mut shifts = self.get_shifts(key).await?;
        upsert_by_day(&mut shifts, shift);
        self.write_month(key, &shifts).await
    }

    async fn delete_shift(&self, key: MonthKey, day: u32) -> Result<()> {
        let mut shifts = self.get_shifts(key).await?;
        let before = shifts.len();
        shifts.retain(|s| s.day != day);

        if shifts.len() == before {
            tracing::debug!("No shift on day {} of {}; nothing to delete", day, key);
            return Ok(());
        }

        self.write_month(key, &shifts).await
    }

    async fn get_settings(&self) -> Result<Option<Settings>> {
        match self.kv.get(SETTINGS_KEY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put_settings(&self, patch: &SettingsPatch) -> Result<Settings> {
        let mut settings = self.get_settings().await?.unwrap_or_default();
        settings.apply(patch);
        settings.validate()?;

        let json = serde_json::to_string(&settings)?;
        self.guard.check()?;
        self.kv.set(SETTINGS_KEY, &json).await?;

        tracing::info!("Saved guest settings");
        Ok(settings)
    }
}
