//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::AppConfig;
use crate::database::{create_pool, SqliteKeyValueStore};
use crate::error::Result;
use crate::identity::IdentityProvider;
use crate::services::{MigrationService, WorkdaysService};
use crate::session::Session;
use crate::storage::{DocumentStore, HttpDocumentStore, KeyValueStore, MemoryDocumentStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter; calling this again is harmless.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "baito=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub session: Arc<Session>,
    pub workdays: WorkdaysService,
    pub migration: MigrationService,
    guest_db: Option<SqliteKeyValueStore>,
}

impl AppState {
    /// Open the guest database, pick the document backend and restore any
    /// existing session
    pub async fn init(config: AppConfig, provider: Arc<dyn IdentityProvider>) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("App data directory: {:?}", config.data_dir);

        std::fs::create_dir_all(&config.data_dir)?;

        let guest_db = SqliteKeyValueStore::new(create_pool(&config.guest_db_path()).await?);

        let docs: Arc<dyn DocumentStore> = match HttpDocumentStore::from_config(&config)? {
            Some(http) => {
                tracing::info!("Using remote document service");
                Arc::new(http)
            }
            None => {
                tracing::warn!("No remote URL configured; account data stays in memory");
                Arc::new(MemoryDocumentStore::new())
            }
        };

        let mut state =
            Self::with_backends(config, provider, Arc::new(guest_db.clone()), docs).await?;
        state.guest_db = Some(guest_db);

        tracing::info!("Application initialized successfully");
        Ok(state)
    }

    /// Wire the services over caller-provided storage
    pub async fn with_backends(
        config: AppConfig,
        provider: Arc<dyn IdentityProvider>,
        kv: Arc<dyn KeyValueStore>,
        docs: Arc<dyn DocumentStore>,
    ) -> Result<Self> {
        let session = Arc::new(Session::new(provider, kv, docs, config.resolve_timeout()));
        session.init().await?;

        Ok(Self {
            workdays: WorkdaysService::new(session.clone()),
            migration: MigrationService::new(session.clone()),
            session,
            config,
            guest_db: None,
        })
    }

    /// Tear down the session and close the guest database
    pub async fn dispose(&self) {
        self.session.dispose();
        if let Some(guest_db) = &self.guest_db {
            guest_db.close().await;
        }
        tracing::info!("Application disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Identity, MemoryIdentityProvider, Uid};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_guest_database() {
        init_logging();
        init_logging();

        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::new(temp_dir.path().join("data"));
        let state = AppState::init(config.clone(), Arc::new(MemoryIdentityProvider::new()))
            .await
            .unwrap();

        assert!(config.guest_db_path().exists());
        assert_eq!(state.session.current_identity(), Identity::Unknown);

        state.dispose().await;
    }

    #[tokio::test]
    async fn test_init_restores_account() {
        let temp_dir = TempDir::new().unwrap();
        let provider = Arc::new(MemoryIdentityProvider::with_session(Uid::new("u7")));
        let state = AppState::init(AppConfig::new(temp_dir.path().to_path_buf()), provider)
            .await
            .unwrap();

        assert_eq!(
            state.workdays.current_identity(),
            Identity::Account(Uid::new("u7"))
        );

        state.dispose().await;
        assert_eq!(state.session.current_identity(), Identity::Unknown);
    }

    #[tokio::test]
    async fn test_guest_data_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::new(temp_dir.path().to_path_buf());

        let state = AppState::init(config.clone(), Arc::new(MemoryIdentityProvider::new()))
            .await
            .unwrap();
        state.session.enter_guest().await.unwrap();
        state
            .workdays
            .save_settings(crate::models::SettingsPatch {
                weekend_wage: Some(1700.0),
                ..Default::default()
            })
            .await
            .unwrap();
        state.dispose().await;

        let state = AppState::init(config, Arc::new(MemoryIdentityProvider::new()))
            .await
            .unwrap();
        state.session.enter_guest().await.unwrap();
        assert_eq!(
            state.workdays.fetch_settings().await.unwrap().weekend_wage,
            1700.0
        );
        state.dispose().await;
    }
}
