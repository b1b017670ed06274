pub mod connection;
pub mod entities;
pub mod repositories;
pub mod sqlite;
pub mod storage;
pub mod store;

pub use repositories::{CaseRepository, LeaderboardEntry, StatsRepository, UserRepository};
pub use sqlite::SqliteStorage;
pub use storage::{KeyValueStorage, MemoryStorage, StorageError};
pub use store::*;
