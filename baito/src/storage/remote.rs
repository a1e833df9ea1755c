//! Durable backend for signed-in accounts
//!
//! Document layout, stable across releases:
//! - `identity/{uid}/settings/main`: settings object
//! - `identity/{uid}/shifts/{YYYY-MM}`: `{ "shifts": [...] }`

use super::{BackendKind, DocumentStore, RecordStore, WriteGuard, WriteOptions};
use crate::config::{IDENTITY_COLLECTION, SETTINGS_DOC_ID, SHIFTS_FIELD};
use crate::error::Result;
use crate::identity::Uid;
use crate::models::shift::{sort_by_day, upsert_by_day};
use crate::models::{MonthKey, Settings, SettingsPatch, Shift};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn settings_path(uid: &Uid) -> String {
    format!("{}/{}/settings/{}", IDENTITY_COLLECTION, uid, SETTINGS_DOC_ID)
}

pub fn shifts_path(uid: &Uid, key: MonthKey) -> String {
    format!("{}/{}/shifts/{}", IDENTITY_COLLECTION, uid, key)
}

/// Wrap a month's shifts in its document shape
pub fn shifts_document(shifts: &[Shift]) -> Result<Value> {
    Ok(json!({ SHIFTS_FIELD: serde_json::to_value(shifts)? }))
}

#[derive(Clone)]
pub struct RemoteStore {
    uid: Uid,
    docs: Arc<dyn DocumentStore>,
    guard: WriteGuard,
}

impl RemoteStore {
    pub fn new(uid: Uid, docs: Arc<dyn DocumentStore>) -> Self {
        Self {
            uid,
            docs,
            guard: WriteGuard::unguarded(),
        }
    }

    pub fn with_guard(mut self, guard: WriteGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    async fn write_month(&self, key: MonthKey, shifts: &[Shift]) -> Result<()> {
        let doc = shifts_document(shifts)?;
        self.guard.check()?;
        self.docs
            .write_doc(&shifts_path(&self.uid, key), doc, WriteOptions::merge())
            .await?;
        tracing::debug!("Stored {} shifts for {} of {}", shifts.len(), key, self.uid);
        Ok(())
    }
}

#[async_trait]
impl RecordStore for RemoteStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Durable
    }

    async fn get_shifts(&self, key: MonthKey) -> Result<Vec<Shift>> {
        let Some(mut doc) = self.docs.read_doc(&shifts_path(&self.uid, key)).await? else {
            return Ok(Vec::new());
        };

        let mut shifts: Vec<Shift> = match doc.get_mut(SHIFTS_FIELD).map(Value::take) {
            Some(Value::Null) | None => Vec::new(),
            Some(value) => serde_json::from_value(value)?,
        };
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
        match self.docs.read_doc(&settings_path(&self.uid)).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    async fn put_settings(&self, patch: &SettingsPatch) -> Result<Settings> {
        let mut settings = self.get_settings().await?.unwrap_or_default();
        settings.apply(patch);
        settings.validate()?;

        // Only the patched fields go over the wire
        let fields = serde_json::to_value(patch)?;
        self.guard.check()?;
        self.docs
            .write_doc(&settings_path(&self.uid), fields, WriteOptions::merge())
            .await?;

        tracing::info!("Saved settings for {}", self.uid);
        Ok(settings)
    }
}
