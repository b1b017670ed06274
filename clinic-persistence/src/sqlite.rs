use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};

use crate::entities::{kv_entries, prelude::*};
use crate::storage::{KeyValueStorage, StorageError};

/// Key-value storage in a single SQLite table.
pub struct SqliteStorage {
    db: DatabaseConnection,
}

impl SqliteStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStorage for SqliteStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entry = KvEntries::find_by_id(key.to_string()).one(&self.db).await?;
        Ok(entry.map(|model| model.value))
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let entry = kv_entries::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value),
            updated_at: ActiveValue::Set(chrono::Utc::now().into()),
        };

        KvEntries::insert(entry)
            .on_conflict(
                OnConflict::column(kv_entries::Column::Key)
                    .update_columns([kv_entries::Column::Value, kv_entries::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        KvEntries::delete_by_id(key.to_string()).exec(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> SqliteStorage {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SqliteStorage::new(db)
    }

    #[tokio::test]
    async fn test_upsert_and_read() {
        let storage = setup_test_db().await;

        storage.set_item("kawaii", "[1]".to_string()).await.unwrap();
        storage.set_item("kawaii", "[1,2]".to_string()).await.unwrap();

        let value = storage.get_item("kawaii").await.unwrap();
        assert_eq!(value.as_deref(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn test_remove_missing_key() {
        let storage = setup_test_db().await;
        storage.remove_item("missing").await.unwrap();
        assert_eq!(storage.get_item("missing").await.unwrap(), None);
    }
}
