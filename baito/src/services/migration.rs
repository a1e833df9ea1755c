//! Guest to account migration
//!
//! Copies every ephemeral record into the durable backend under a newly
//! established account, then clears the device-local storage. Writes are
//! merge writes, so an interrupted run can be resumed for the same uid.

use crate::config::SETTINGS_KEY;
use crate::error::{AppError, Result};
use crate::identity::{Credential, Uid};
use crate::models::{MonthKey, Settings, Shift};
use crate::session::Session;
use crate::storage::remote::{settings_path, shifts_document, shifts_path};
use crate::storage::WriteOptions;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

/// Everything a guest has stored on this device
#[derive(Debug, Default)]
struct GuestRecords {
    settings: Option<Settings>,
    months: Vec<(MonthKey, Vec<Shift>)>,
}

#[derive(Clone)]
pub struct MigrationService {
    session: Arc<Session>,
}

impl MigrationService {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Create or sign in to an account and move the guest data into it.
    ///
    /// Returns `Ok(None)` without doing anything when the session is not in
    /// guest mode.
    pub async fn migrate(&self, credential: Credential) -> Result<Option<Uid>> {
        if !self.session.current_identity().is_guest() {
            tracing::debug!("Not in guest mode; skipping migration");
            return Ok(None);
        }

        let provider = self.session.provider();
        let uid = match credential {
            Credential::EmailPassword { email, password } => {
                provider.create_account(&email, &password).await?
            }
            Credential::Federated => provider.sign_in_federated().await?,
        };

        tracing::info!("Migrating guest data into account {}", uid);
        self.transfer(uid).await.map(Some)
    }

    /// Re-run the transfer for an account established by an earlier
    /// `migrate` that ended in a partial failure. The identity provider must
    /// still be signed in as `uid`.
    pub async fn resume(&self, uid: Uid) -> Result<Option<Uid>> {
        if !self.session.current_identity().is_guest() {
            tracing::debug!("Not in guest mode; nothing to resume");
            return Ok(None);
        }

        let signed_in = self.session.provider().current_user().await?;
        if signed_in.as_ref() != Some(&uid) {
            tracing::warn!("Refusing to resume migration into {}: not signed in as it", uid);
            return Err(AppError::IdentityConflict(format!(
                "not signed in as {}; sign in to that account before resuming",
                uid
            )));
        }

        tracing::info!("Resuming migration into account {}", uid);
        self.transfer(uid).await.map(Some)
    }

    /// Steps after the account exists. Every failure names the uid so the
    /// caller can `resume`.
    async fn transfer(&self, uid: Uid) -> Result<Uid> {
        let records = match self.load_guest_records().await {
            Ok(records) => records,
            Err(e) => return Err(interrupted(&uid, e)),
        };
        let writes = self
            .durable_writes(&uid, &records)
            .map_err(|e| interrupted(&uid, e))?;
        let total = writes.len();

        let docs = self.session.documents();
        let results = join_all(
            writes
                .into_iter()
                .map(|(path, doc)| async move {
                    let outcome = docs.write_doc(&path, doc, WriteOptions::merge()).await;
                    (path, outcome)
                }),
        )
        .await;

        let mut failed = 0;
        for (path, outcome) in &results {
            if let Err(e) = outcome {
                tracing::error!("Failed to migrate {}: {}", path, e);
                failed += 1;
            }
        }

        if failed > 0 {
            tracing::warn!(
                "Migration into {} incomplete: {} of {} writes failed; guest data kept",
                uid,
                failed,
                total
            );
            return Err(AppError::PartialMigration {
                uid: uid.to_string(),
                failed,
                total,
            });
        }

        if !self.session.current_identity().is_guest() {
            tracing::warn!("Session changed during migration; guest data kept");
            return Err(AppError::SessionChanged);
        }

        if let Err(e) = self.session.local_kv().remove_all().await {
            return Err(interrupted(&uid, e));
        }
        self.session.complete_migration(uid.clone())?;

        tracing::info!(
            "Migrated {} months{} into {}",
            records.months.len(),
            if records.settings.is_some() { " and settings" } else { "" },
            uid
        );
        Ok(uid)
    }

    /// Read, decode and validate everything before the first durable write
    async fn load_guest_records(&self) -> Result<GuestRecords> {
        let kv = self.session.local_kv();
        let mut records = GuestRecords::default();

        for key in kv.keys().await? {
            if key == SETTINGS_KEY {
                if let Some(json) = kv.get(&key).await? {
                    let settings: Settings = serde_json::from_str(&json)?;
                    settings.validate()?;
                    records.settings = Some(settings);
                }
            } else if let Ok(month) = key.parse::<MonthKey>() {
                if let Some(json) = kv.get(&key).await? {
                    let shifts: Vec<Shift> = serde_json::from_str(&json)?;
                    for shift in &shifts {
                        shift.validate_for_month(&month)?;
                    }
                    records.months.push((month, shifts));
                }
            } else {
                tracing::debug!("Skipping unrecognized local key: {}", key);
            }
        }

        Ok(records)
    }

    fn durable_writes(&self, uid: &Uid, records: &GuestRecords) -> Result<Vec<(String, Value)>> {
        let mut writes = Vec::with_capacity(records.months.len() + 1);

        if let Some(settings) = &records.settings {
            writes.push((settings_path(uid), serde_json::to_value(settings)?));
        }
        for (month, shifts) in &records.months {
            writes.push((shifts_path(uid, *month), shifts_document(shifts)?));
        }

        Ok(writes)
    }
}

fn interrupted(uid: &Uid, cause: AppError) -> AppError {
    tracing::warn!("Migration into {} stopped: {}; guest data kept", uid, cause);
    AppError::MigrationInterrupted {
        uid: uid.to_string(),
        reason: cause.to_string(),
    }
}
