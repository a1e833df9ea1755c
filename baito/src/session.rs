//! Session and identity gate
//!
//! Holds the current `Identity` and is the one place that turns it into a
//! record store. Guest sessions get the ephemeral `LocalStore`, accounts get
//! a `RemoteStore` for their uid, and an unresolved session makes store
//! access wait until the identity is known.

use crate::error::{AppError, Result};
use crate::identity::{Identity, IdentityProvider, Uid};
use crate::storage::{DocumentStore, KeyValueStore, LocalStore, RecordStore, RemoteStore, WriteGuard};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct Session {
    identity: Arc<watch::Sender<Identity>>,
    provider: Arc<dyn IdentityProvider>,
    kv: Arc<dyn KeyValueStore>,
    docs: Arc<dyn DocumentStore>,
    resolve_timeout: Duration,
    follower: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        kv: Arc<dyn KeyValueStore>,
        docs: Arc<dyn DocumentStore>,
        resolve_timeout: Duration,
    ) -> Self {
        let (identity, _) = watch::channel(Identity::Unknown);
        Self {
            identity: Arc::new(identity),
            provider,
            kv,
            docs,
            resolve_timeout,
            follower: Mutex::new(None),
        }
    }

    /// Restore an existing account session and start following provider
    /// changes
    pub async fn init(&self) -> Result<()> {
        if let Some(uid) = self.provider.current_user().await? {
            tracing::info!("Restored session for {}", uid);
            self.identity.send_if_modified(|current| {
                if *current == Identity::Unknown {
                    *current = Identity::Account(uid);
                    true
                } else {
                    false
                }
            });
        }

        let identity = self.identity.clone();
        let mut provider_rx = self.provider.subscribe();
        let handle = tokio::spawn(async move {
            while provider_rx.changed().await.is_ok() {
                let user = provider_rx.borrow_and_update().clone();
                identity.send_if_modified(|current| follow_provider(current, user));
            }
        });

        if let Ok(mut follower) = self.follower.lock() {
            if let Some(previous) = follower.replace(handle) {
                previous.abort();
            }
        }

        Ok(())
    }

    /// Stop following the provider and forget the identity
    pub fn dispose(&self) {
        if let Ok(mut follower) = self.follower.lock() {
            if let Some(handle) = follower.take() {
                handle.abort();
            }
        }
        self.identity.send_replace(Identity::Unknown);
        tracing::info!("Session disposed");
    }

    pub fn current_identity(&self) -> Identity {
        self.identity.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Identity> {
        self.identity.subscribe()
    }

    /// Switch to guest mode, ending any account session first
    pub async fn enter_guest(&self) -> Result<()> {
        let signed_in = matches!(self.current_identity(), Identity::Account(_))
            || self.provider.current_user().await?.is_some();
        if signed_in {
            self.provider.sign_out().await?;
        }

        self.identity.send_replace(Identity::Guest);
        tracing::info!("Entered guest mode");
        Ok(())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Uid> {
        self.ensure_signed_out()?;
        let uid = self.provider.sign_in(email, password).await?;
        self.become_account(uid)
    }

    pub async fn sign_in_federated(&self) -> Result<Uid> {
        self.ensure_signed_out()?;
        let uid = self.provider.sign_in_federated().await?;
        self.become_account(uid)
    }

    /// Drop the in-memory identity; stored data is left alone
    pub async fn logout(&self) -> Result<()> {
        match self.current_identity() {
            Identity::Account(uid) => {
                self.provider.sign_out().await?;
                tracing::info!("Logged out of {}", uid);
            }
            Identity::Guest => tracing::info!("Left guest mode"),
            Identity::Unknown => return Ok(()),
        }

        self.identity.send_replace(Identity::Unknown);
        Ok(())
    }

    /// Wait until the identity is Guest or Account
    pub async fn wait_resolved(&self) -> Result<Identity> {
        let mut rx = self.identity.subscribe();
        let waited = tokio::time::timeout(
            self.resolve_timeout,
            rx.wait_for(|identity| *identity != Identity::Unknown),
        )
        .await;

        match waited {
            Ok(Ok(identity)) => Ok(identity.clone()),
            _ => Err(AppError::StoreUnavailable {
                backend: "session",
                message: format!(
                    "identity not resolved within {}s",
                    self.resolve_timeout.as_secs()
                ),
            }),
        }
    }

    /// The record store for the current identity
    pub async fn store(&self) -> Result<Arc<dyn RecordStore>> {
        let identity = self.wait_resolved().await?;
        let guard = WriteGuard::new(self.identity.subscribe(), identity.clone());

        match identity {
            Identity::Guest => Ok(Arc::new(LocalStore::new(self.kv.clone()).with_guard(guard))),
            Identity::Account(uid) => Ok(Arc::new(
                RemoteStore::new(uid, self.docs.clone()).with_guard(guard),
            )),
            Identity::Unknown => Err(AppError::SessionChanged),
        }
    }

    pub(crate) fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    pub(crate) fn local_kv(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    pub(crate) fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.docs
    }

    /// Guest to account, only reachable through migration
    pub(crate) fn complete_migration(&self, uid: Uid) -> Result<()> {
        let switched = self.identity.send_if_modified(|current| {
            if current.is_guest() {
                *current = Identity::Account(uid.clone());
                true
            } else {
                false
            }
        });

        if switched {
            Ok(())
        } else {
            Err(AppError::SessionChanged)
        }
    }

    fn ensure_signed_out(&self) -> Result<()> {
        match self.current_identity() {
            Identity::Account(uid) => Err(AppError::IdentityConflict(format!(
                "already signed in as {}; log out first",
                uid
            ))),
            _ => Ok(()),
        }
    }

    fn become_account(&self, uid: Uid) -> Result<Uid> {
        self.identity.send_replace(Identity::Account(uid.clone()));
        tracing::info!("Signed in as {}", uid);
        Ok(uid)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Ok(mut follower) = self.follower.lock() {
            if let Some(handle) = follower.take() {
                handle.abort();
            }
        }
    }
}

/// Apply a provider-side change. Guest sessions ignore the provider; the
/// migration owns the guest to account transition.
fn follow_provider(current: &mut Identity, user: Option<Uid>) -> bool {
    match (&*current, user) {
        (Identity::Unknown, Some(uid)) => {
            *current = Identity::Account(uid);
            true
        }
        (Identity::Account(_), None) => {
            tracing::info!("Account session ended by the identity provider");
            *current = Identity::Unknown;
            true
        }
        _ => false,
    }
}
