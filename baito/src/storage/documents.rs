//! In-process document store
//!
//! Implements the same read and merge-write rules as the remote document
//! service. Used by tests and when no remote URL is configured.

use super::{DocumentStore, WriteOptions};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Combine a stored document with a write.
///
/// With `merge`, top-level fields of `incoming` replace the stored ones and
/// the rest of the stored document is kept. Without it, or when either side
/// is not an object, `incoming` replaces the document.
pub fn merge_document(existing: Option<Value>, incoming: Value, options: WriteOptions) -> Value {
    match (existing, incoming) {
        (Some(Value::Object(mut stored)), Value::Object(fields)) if options.merge => {
            stored.extend(fields);
            Value::Object(stored)
        }
        (_, incoming) => incoming,
    }
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<BTreeMap<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All document paths, sorted
    pub async fn paths(&self) -> Vec<String> {
        self.docs.read().await.keys().cloned().collect()
    }

    /// Paths under `prefix`, sorted
    pub async fn paths_under(&self, prefix: &str) -> Vec<String> {
        self.docs
            .read()
            .await
            .keys()
            .filter(|path| path.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read_doc(&self, path: &str) -> Result<Option<Value>> {
        Ok(self.docs.read().await.get(path).cloned())
    }

    async fn write_doc(&self, path: &str, value: Value, options: WriteOptions) -> Result<()> {
        let mut docs = self.docs.write().await;
        let merged = merge_document(docs.remove(path), value, options);
        docs.insert(path.to_string(), merged);
        Ok(())
    }
}
