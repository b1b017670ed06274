use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub storage_backend: StorageBackend,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_text_model: String,
    pub gemini_image_model: String,
    pub generation_timeout_seconds: u64,
    pub auto_advance_seconds: u64,
    pub passive_income_seconds: u64,
    pub login_latency_ms: u64,
    pub signup_latency_ms: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://kawaii_clinic.db?mode=rwc".to_string()),
            storage_backend: env_or("STORAGE_BACKEND", StorageBackend::Sqlite),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            gemini_text_model: env::var("GEMINI_TEXT_MODEL")
                .unwrap_or_else(|_| "gemini-3-pro-preview".to_string()),
            gemini_image_model: env::var("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash-image".to_string()),
            generation_timeout_seconds: positive_env_or("GENERATION_TIMEOUT_SECONDS", 60),
            auto_advance_seconds: positive_env_or("AUTO_ADVANCE_SECONDS", 5),
            passive_income_seconds: positive_env_or("PASSIVE_INCOME_SECONDS", 10),
            login_latency_ms: env_or("LOGIN_LATENCY_MS", 500),
            signup_latency_ms: env_or("SIGNUP_LATENCY_MS", 800),
        }
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_seconds)
    }

    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_secs(self.auto_advance_seconds)
    }

    pub fn passive_income_period(&self) -> Duration {
        Duration::from_secs(self.passive_income_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    parse_or(name, env::var(name).ok(), default)
}

fn positive_env_or(name: &str, default: u64) -> u64 {
    positive_or(name, env::var(name).ok(), default)
}

/// Like `parse_or`, but a zero period or timeout also falls back to the default.
fn positive_or(name: &str, raw: Option<String>, default: u64) -> u64 {
    match parse_or(name, raw, default) {
        0 => {
            warn!("{} must be greater than zero, using default {}", name, default);
            default
        }
        value => value,
    }
}

/// Parses a raw setting, keeping the default when it is absent or malformed.
fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}={:?}, using default", name, raw);
            default
        }),
        None => default,
    }
}
