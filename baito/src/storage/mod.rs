//! Record store abstraction
//!
//! `RecordStore` is what the rest of the crate talks to. It has two
//! implementations:
//! - `LocalStore`: guest data in device-local key-value storage
//! - `RemoteStore`: account data in a remote document store
//!
//! The session picks one of them per identity; nothing else branches on the
//! backend.

pub mod documents;
pub mod http;
pub mod local;
pub mod remote;

pub use documents::{merge_document, MemoryDocumentStore};
pub use http::HttpDocumentStore;
pub use local::LocalStore;
pub use remote::RemoteStore;

use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::models::{MonthKey, Settings, SettingsPatch, Shift};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Ephemeral,
    Durable,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Ephemeral => f.write_str("ephemeral"),
            BackendKind::Durable => f.write_str("durable"),
        }
    }
}

/// Shift collections keyed by month plus one settings record
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend(&self) -> BackendKind;

    /// Shifts of a month, ascending by day
    async fn get_shifts(&self, key: MonthKey) -> Result<Vec<Shift>>;

    /// Insert or replace the shift for `shift.day`
    async fn put_shift(&self, key: MonthKey, shift: Shift) -> Result<()>;

    /// Remove the shift for `day`; absent days are not an error
    async fn delete_shift(&self, key: MonthKey, day: u32) -> Result<()>;

    async fn get_settings(&self) -> Result<Option<Settings>>;

    /// Merge `patch` into the stored settings and return the result
    async fn put_settings(&self, patch: &SettingsPatch) -> Result<Settings>;
}

/// Device-local string storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove_all(&self) -> Result<()>;

    async fn keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Keep stored top-level fields that the written value does not carry
    pub merge: bool,
}

impl WriteOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }

    pub fn replace() -> Self {
        Self { merge: false }
    }
}

/// Remote JSON documents addressed by slash-separated paths
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read_doc(&self, path: &str) -> Result<Option<Value>>;

    async fn write_doc(&self, path: &str, value: Value, options: WriteOptions) -> Result<()>;
}

/// Refuses writes once the session has moved away from the identity a store
/// was opened for
#[derive(Clone, Default)]
pub struct WriteGuard {
    watched: Option<(watch::Receiver<Identity>, Identity)>,
}

impl WriteGuard {
    /// A guard that never refuses
    pub fn unguarded() -> Self {
        Self::default()
    }

    pub fn new(identity: watch::Receiver<Identity>, expected: Identity) -> Self {
        Self {
            watched: Some((identity, expected)),
        }
    }

    pub fn check(&self) -> Result<()> {
        let Some((current, expected)) = &self.watched else {
            return Ok(());
        };

        let current = current.borrow().clone();
        if current != *expected {
            tracing::warn!(
                "Dropping write for {:?}; session is now {:?}",
                expected,
                current
            );
            return Err(AppError::SessionChanged);
        }
        Ok(())
    }
}
