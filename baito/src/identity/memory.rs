//! In-process identity provider
//!
//! Stands in for a hosted authentication service in tests and offline runs.
//! Passwords are kept only as salted SHA-256 digests.

use super::{IdentityProvider, Uid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

/// Minimum password length accepted on sign-up
const MIN_PASSWORD_LENGTH: usize = 6;

struct Account {
    uid: Uid,
    salt: String,
    digest: String,
}

pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    federated_uid: Uid,
    current: watch::Sender<Option<Uid>>,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: RwLock::new(HashMap::new()),
            federated_uid: Uid::new(Uuid::new_v4().to_string()),
            current,
        }
    }

    /// A provider that already holds a signed-in session for `uid`
    pub fn with_session(uid: Uid) -> Self {
        let provider = Self::new();
        provider.current.send_replace(Some(uid));
        provider
    }

    /// The uid every federated sign-in on this provider resolves to
    pub fn federated_uid(&self) -> &Uid {
        &self.federated_uid
    }

    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn set_current(&self, uid: Option<Uid>) {
        self.current.send_replace(uid);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Uid> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::InvalidCredential(format!(
                "'{}' is not an email address",
                email
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::InvalidCredential(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(AppError::IdentityConflict(format!(
                "email {} is already in use",
                email
            )));
        }

        let uid = Uid::new(Uuid::new_v4().to_string());
        let salt = Uuid::new_v4().to_string();
        let digest = Self::digest(&salt, password);
        accounts.insert(
            email.clone(),
            Account {
                uid: uid.clone(),
                salt,
                digest,
            },
        );
        drop(accounts);

        tracing::info!("Created account {} for {}", uid, email);
        self.set_current(Some(uid.clone()));
        Ok(uid)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Uid> {
        let email = email.trim().to_lowercase();
        let accounts = self.accounts.read().await;

        let account = accounts
            .get(&email)
            .filter(|account| Self::digest(&account.salt, password) == account.digest)
            .ok_or_else(|| AppError::InvalidCredential("wrong email or password".to_string()))?;
        let uid = account.uid.clone();
        drop(accounts);

        self.set_current(Some(uid.clone()));
        Ok(uid)
    }

    async fn sign_in_federated(&self) -> Result<Uid> {
        let uid = self.federated_uid.clone();
        self.set_current(Some(uid.clone()));
        Ok(uid)
    }

    async fn sign_out(&self) -> Result<()> {
        self.set_current(None);
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<Uid>> {
        Ok(self.current.borrow().clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Uid>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_sign_in() {
        let provider = MemoryIdentityProvider::new();

        let uid = provider
            .create_account("worker@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(provider.current_user().await.unwrap(), Some(uid.clone()));

        provider.sign_out().await.unwrap();
        assert_eq!(provider.current_user().await.unwrap(), None);

        let again = provider
            .sign_in("Worker@Example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(again, uid);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let provider = MemoryIdentityProvider::new();
        provider
            .create_account("worker@example.com", "secret1")
            .await
            .unwrap();

        let result = provider.create_account("worker@example.com", "other12").await;
        assert!(matches!(result, Err(AppError::IdentityConflict(_))));
    }

    #[tokio::test]
    async fn test_rejects_short_password_and_wrong_password() {
        let provider = MemoryIdentityProvider::new();

        let short = provider.create_account("a@example.com", "12345").await;
        assert!(matches!(short, Err(AppError::InvalidCredential(_))));

        provider
            .create_account("a@example.com", "123456")
            .await
            .unwrap();
        let wrong = provider.sign_in("a@example.com", "654321").await;
        assert!(matches!(wrong, Err(AppError::InvalidCredential(_))));
    }

    #[tokio::test]
    async fn test_federated_sign_in_is_stable() {
        let provider = MemoryIdentityProvider::new();
        let first = provider.sign_in_federated().await.unwrap();
        let second = provider.sign_in_federated().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(&first, provider.federated_uid());
    }

    #[tokio::test]
    async fn test_subscribe_sees_changes() {
        let provider = MemoryIdentityProvider::with_session(Uid::new("restored"));
        let mut rx = provider.subscribe();
        assert_eq!(rx.borrow().as_ref().map(Uid::as_str), Some("restored"));

        provider.sign_out().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
