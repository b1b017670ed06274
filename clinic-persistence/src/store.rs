use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::storage::{KeyValueStorage, MemoryStorage};
use clinic_types::UserId;

pub const USERS_KEY: &str = "kawaii_clinic_users_v1";
pub const CASES_KEY: &str = "kawaii_clinic_cases_v1";
pub const SEEN_KEY: &str = "kawaii_clinic_seen_v1";
pub const STATS_KEY: &str = "kawaii_clinic_stats_v1";
pub const SESSION_KEY: &str = "kawaii_clinic_session_v1";

/// JSON documents over a key-value medium. Reads fall back to defaults and writes are
/// best-effort, so storage trouble never interrupts play.
#[derive(Clone)]
pub struct ClinicStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl ClinicStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub async fn get_stored_item<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.storage.get_item(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                error!("Failed to read {}: {}", key, e);
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding corrupt entry {}: {}", key, e);
                default
            }
        }
    }

    /// Returns whether the value was persisted.
    pub async fn set_stored_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to serialize {}: {}", key, e);
                return false;
            }
        };

        match self.storage.set_item(key, raw).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save {}: {}", key, e);
                false
            }
        }
    }

    /// The session key holds the bare user id, not a JSON document.
    pub async fn get_session(&self) -> Option<UserId> {
        match self.storage.get_item(SESSION_KEY).await {
            Ok(raw) => raw.filter(|id| !id.is_empty()),
            Err(e) => {
                error!("Failed to read session: {}", e);
                None
            }
        }
    }

    pub async fn set_session(&self, user_id: &str) {
        if let Err(e) = self.storage.set_item(SESSION_KEY, user_id.to_string()).await {
            error!("Failed to save session: {}", e);
        }
    }

    pub async fn clear_session(&self) {
        if let Err(e) = self.storage.remove_item(SESSION_KEY).await {
            error!("Failed to clear session: {}", e);
        } else {
            debug!("Session cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_missing_key_returns_default() {
        let store = ClinicStore::in_memory();
        let value: Vec<String> = store.get_stored_item(SEEN_KEY, vec!["x".to_string()]).await;
        assert_eq!(value, vec!["x"]);
    }

    #[tokio::test]
    async fn test_corrupt_entry_returns_default() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item(STATS_KEY, "{not json".to_string())
            .await
            .unwrap();
        let store = ClinicStore::new(storage);

        let stats: HashMap<String, u32> = store.get_stored_item(STATS_KEY, HashMap::new()).await;
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_not_fatal() {
        let store = ClinicStore::new(Arc::new(MemoryStorage::with_quota(16)));

        assert!(!store.set_stored_item(CASES_KEY, &vec!["a".repeat(64)]).await);
        let cases: Vec<String> = store.get_stored_item(CASES_KEY, Vec::new()).await;
        assert!(cases.is_empty());
    }

    #[tokio::test]
    async fn test_session_roundtrip() {
        let store = ClinicStore::in_memory();
        assert_eq!(store.get_session().await, None);

        store.set_session("user-1").await;
        assert_eq!(store.get_session().await.as_deref(), Some("user-1"));

        store.clear_session().await;
        assert_eq!(store.get_session().await, None);
    }

    #[tokio::test]
    async fn test_session_stored_as_bare_id() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ClinicStore::new(storage.clone());

        store.set_session("user-1").await;
        assert_eq!(
            storage.get_item(SESSION_KEY).await.unwrap().as_deref(),
            Some("user-1")
        );

        // A value written by another client is read back verbatim
        storage
            .set_item(SESSION_KEY, "user-2".to_string())
            .await
            .unwrap();
        assert_eq!(store.get_session().await.as_deref(), Some("user-2"));
    }
}
