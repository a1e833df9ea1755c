//! Key-value table behind the ephemeral record store

use crate::error::Result;
use crate::storage::KeyValueStore;
use async_trait::async_trait;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Set local key: {}", key);
        Ok(())
    }

    async fn remove_all(&self) -> Result<()> {
        let removed = sqlx::query("DELETE FROM kv")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!("Cleared {} local keys", removed);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    async fn create_test_kv() -> SqliteKeyValueStore {
        SqliteKeyValueStore::new(create_memory_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let kv = create_test_kv().await;

        assert_eq!(kv.get("settings").await.unwrap(), None);

        kv.set("settings", "{}").await.unwrap();
        assert_eq!(kv.get("settings").await.unwrap(), Some("{}".to_string()));

        kv.set("settings", "{\"A\":1}").await.unwrap();
        assert_eq!(
            kv.get("settings").await.unwrap(),
            Some("{\"A\":1}".to_string())
        );
    }

    #[tokio::test]
    async fn test_keys_and_remove_all() {
        let kv = create_test_kv().await;
        kv.set("2024-02", "[]").await.unwrap();
        kv.set("settings", "{}").await.unwrap();
        kv.set("2024-01", "[]").await.unwrap();

        assert_eq!(
            kv.keys().await.unwrap(),
            vec!["2024-01", "2024-02", "settings"]
        );

        kv.remove_all().await.unwrap();
        assert!(kv.keys().await.unwrap().is_empty());
    }
}
