use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{GenerationError, GenerativeModel};
use clinic_types::Difficulty;

/// 1x1 transparent PNG.
const PLACEHOLDER_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Offline model that replays a fixed case and image. Used for tests and demos.
pub struct ScriptedModel {
    case_json: Option<String>,
    images_fail: bool,
    delay: Duration,
    image_calls: Arc<AtomicUsize>,
    requested: Arc<Mutex<Vec<Difficulty>>>,
}

impl ScriptedModel {
    pub fn new(case_json: &str) -> Self {
        Self {
            case_json: Some(case_json.to_string()),
            images_fail: false,
            delay: Duration::ZERO,
            image_calls: Arc::new(AtomicUsize::new(0)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A model whose every case request fails.
    pub fn failing() -> Self {
        Self {
            case_json: None,
            ..Self::new("")
        }
    }

    pub fn failing_images(mut self) -> Self {
        self.images_fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn image_calls(&self) -> Arc<AtomicUsize> {
        self.image_calls.clone()
    }

    pub fn requested_difficulties(&self) -> Arc<Mutex<Vec<Difficulty>>> {
        self.requested.clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate_case_json(&self, difficulty: Difficulty) -> Result<String, GenerationError> {
        self.requested.lock().await.push(difficulty);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.case_json.clone().ok_or(GenerationError::Api {
            status: 503,
            body: "scripted failure".to_string(),
        })
    }

    async fn generate_image(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.images_fail {
            return Err(GenerationError::Image("no inline image in response".to_string()));
        }
        Ok(format!("data:image/png;base64,{}", PLACEHOLDER_PNG))
    }
}
