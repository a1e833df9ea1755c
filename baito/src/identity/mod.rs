//! Identity types and the identity provider capability
//!
//! The provider itself (email/password and federated sign-in) is an external
//! collaborator. The core only sees the `IdentityProvider` trait.

pub mod memory;

pub use memory::MemoryIdentityProvider;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

/// Server-side account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who owns the records the session is working on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "uid", rename_all = "snake_case")]
pub enum Identity {
    /// Not resolved yet, or signed out and nothing chosen
    Unknown,
    /// Device-local guest data
    Guest,
    Account(Uid),
}

impl Identity {
    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest)
    }

    pub fn uid(&self) -> Option<&Uid> {
        match self {
            Identity::Account(uid) => Some(uid),
            _ => None,
        }
    }
}

/// Credential used to establish the account a guest migrates into
#[derive(Debug, Clone)]
pub enum Credential {
    EmailPassword { email: String, password: String },
    Federated,
}

/// Account authentication collaborator
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<Uid>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Uid>;

    async fn sign_in_federated(&self) -> Result<Uid>;

    async fn sign_out(&self) -> Result<()>;

    /// The user of a session restored from a previous run, if any
    async fn current_user(&self) -> Result<Option<Uid>>;

    /// Change notifications for the signed-in user
    fn subscribe(&self) -> watch::Receiver<Option<Uid>>;
}
