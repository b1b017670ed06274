pub mod auth;
pub mod case_manager;
pub mod config;
pub mod controller;
pub mod genai;
pub mod scheduler;
pub mod ui;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use auth::AuthService;
use case_manager::CaseManager;
use clinic_core::TracingEventHandler;
use clinic_persistence::connection::connect_and_migrate;
use clinic_persistence::{ClinicStore, KeyValueStorage, MemoryStorage, SqliteStorage, UserRepository};
use config::{Config, StorageBackend};
use controller::{ControllerSettings, GameController};
use genai::{CaseGenerator, GeminiClient, GeminiConfig};

/// Opens the configured storage backend.
pub async fn open_store(config: &Config) -> anyhow::Result<ClinicStore> {
    let storage: Arc<dyn KeyValueStorage> = match config.storage_backend {
        StorageBackend::Sqlite => {
            let db = connect_and_migrate(&config.database_url).await?;
            Arc::new(SqliteStorage::new(db))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; progress is lost on exit");
            Arc::new(MemoryStorage::new())
        }
    };
    Ok(ClinicStore::new(storage))
}

/// Wires the store, services and controller together.
pub async fn build_controller(config: &Config) -> anyhow::Result<Arc<GameController>> {
    let store = open_store(config).await?;
    let users = UserRepository::new(store.clone());
    users.seed_ai_users().await;

    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; generated cases will use the fallback patient");
    }
    let model = Arc::new(GeminiClient::new(GeminiConfig::from(config)));
    let generator = Arc::new(CaseGenerator::new(model, config.generation_timeout()));
    let case_manager = Arc::new(CaseManager::new(store.clone(), generator));

    let auth = AuthService::new(
        store,
        Duration::from_millis(config.login_latency_ms),
        Duration::from_millis(config.signup_latency_ms),
    );

    let controller = GameController::new(auth, case_manager, users, ControllerSettings::from(config));
    controller
        .add_event_handler(Box::new(TracingEventHandler))
        .await;
    Ok(controller)
}
