//! Error types for the baito core
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized for UI collaborators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid shift: {0}")]
    InvalidShift(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("{backend} store unavailable: {message}")]
    StoreUnavailable {
        backend: &'static str,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Identity conflict: {0}")]
    IdentityConflict(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error(
        "Migration to account {uid} incomplete: {failed} of {total} writes failed; \
         guest data was kept and the migration can be re-run safely"
    )]
    PartialMigration {
        uid: String,
        failed: usize,
        total: usize,
    },

    #[error(
        "Migration to account {uid} stopped before writing: {reason}; \
         guest data was kept and the migration can be re-run safely"
    )]
    MigrationInterrupted { uid: String, reason: String },

    #[error("Session identity changed while the operation was in flight")]
    SessionChanged,
}

impl AppError {
    pub fn local_store(message: impl Into<String>) -> Self {
        AppError::StoreUnavailable {
            backend: "ephemeral",
            message: message.into(),
        }
    }

    pub fn remote_store(message: impl Into<String>) -> Self {
        AppError::StoreUnavailable {
            backend: "durable",
            message: message.into(),
        }
    }

    /// Whether repeating the same call may succeed without changing inputs
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::StoreUnavailable { .. }
                | AppError::PartialMigration { .. }
                | AppError::MigrationInterrupted { .. }
                | AppError::SessionChanged
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::local_store(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::remote_store(e.to_string())
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_errors_map_to_store_unavailable() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(
            err,
            AppError::StoreUnavailable {
                backend: "ephemeral",
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_partial_migration_message_mentions_rerun() {
        let err = AppError::PartialMigration {
            uid: "u1".to_string(),
            failed: 1,
            total: 3,
        };
        let message = err.to_string();
        assert!(message.contains("1 of 3"));
        assert!(message.contains("re-run"));
    }

    #[test]
    fn test_interrupted_migration_carries_uid() {
        let err = AppError::MigrationInterrupted {
            uid: "u1".to_string(),
            reason: "bad record".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("u1"));
        assert!(message.contains("re-run"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_serializes_as_message_string() {
        let err = AppError::InvalidShift("day 32 out of range".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Invalid shift: day 32 out of range\"");
        assert!(!err.is_retryable());
    }
}
