use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} available")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// String-keyed storage medium. Values are opaque JSON documents.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError>;
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage with an optional byte quota, like a browser's local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub async fn used_bytes(&self) -> usize {
        let entries = self.entries.read().await;
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;

        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
