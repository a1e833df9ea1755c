//! Application configuration
//!
//! Central location for the wage model constants, storage layout names,
//! default settings values, and the runtime `AppConfig` loaded from the
//! environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ===== Wage Model =====

/// Pay multiplier applied to time worked after the overtime threshold
pub const OVERTIME_PREMIUM: f64 = 1.25;

/// Commuting cost is paid for the trip there and the trip back
pub const COMMUTING_TRIPS_PER_SHIFT: f64 = 2.0;

// ===== Default Settings =====

pub const DEFAULT_START_TIME: (u32, u32) = (17, 0);
pub const DEFAULT_END_TIME: (u32, u32) = (22, 0);
pub const DEFAULT_WORKTIME_START: (u32, u32) = (17, 0);
pub const DEFAULT_WORKTIME_END: (u32, u32) = (24, 0);
pub const DEFAULT_OVERTIME_THRESHOLD: (u32, u32) = (22, 0);
pub const DEFAULT_PAY_INTERVAL_MINUTES: u32 = 15;
pub const DEFAULT_COMMUTING_COST: f64 = 230.0;
pub const DEFAULT_WEEKDAY_WAGE: f64 = 1200.0;
pub const DEFAULT_WEEKEND_WAGE: f64 = 1500.0;

// ===== Storage Layout =====

/// Ephemeral key holding the guest settings record
pub const SETTINGS_KEY: &str = "settings";

/// Root collection of the durable document tree
pub const IDENTITY_COLLECTION: &str = "identity";

/// Durable document id of the settings record
pub const SETTINGS_DOC_ID: &str = "main";

/// Field of a durable month document that holds the shift array
pub const SHIFTS_FIELD: &str = "shifts";

/// Local SQLite file backing guest storage, relative to the data directory
pub const GUEST_DB_FILE: &str = "guest.sqlite";

// ===== Runtime Defaults =====

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 10;

/// Runtime configuration for the storage backends and session gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the guest SQLite database
    pub data_dir: PathBuf,
    /// Base URL of the durable document store; in-memory store when unset
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Bearer token sent to the durable document store
    #[serde(default)]
    pub remote_token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long store access waits for an unresolved identity
    #[serde(default = "default_resolve_timeout_secs")]
    pub resolve_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_resolve_timeout_secs() -> u64 {
    DEFAULT_RESOLVE_TIMEOUT_SECS
}

impl AppConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            remote_url: None,
            remote_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            resolve_timeout_secs: DEFAULT_RESOLVE_TIMEOUT_SECS,
        }
    }

    /// Build configuration from `BAITO_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("BAITO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".baito"));

        let mut config = Self::new(data_dir);
        config.remote_url = lookup("BAITO_REMOTE_URL").filter(|v| !v.trim().is_empty());
        config.remote_token = lookup("BAITO_REMOTE_TOKEN").filter(|v| !v.trim().is_empty());

        if let Some(secs) = lookup("BAITO_REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.request_timeout_secs = secs;
        }
        if let Some(secs) = lookup("BAITO_RESOLVE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.resolve_timeout_secs = secs;
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn guest_db_path(&self) -> PathBuf {
        self.data_dir.join(GUEST_DB_FILE)
    }
}
