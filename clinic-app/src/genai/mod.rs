//! AI case generation. The model sits behind [`GenerativeModel`] so the network client
//! can be swapped for a scripted one in tests.

mod gemini;
mod mock;

pub use gemini::{GeminiClient, GeminiConfig, case_response_schema};
pub use mock::ScriptedModel;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::{OptionFuture, join};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use clinic_core::{ValidationError, fallback_case, validate_generated_case};
use clinic_types::{
    CaseStage, Difficulty, MedicalImage, PatientCase, TrustedSource, Vitals,
};

/// Players below this xp only get beginner cases.
pub const ADVANCED_XP_THRESHOLD: u32 = 300;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("HTTP client error: {0}")]
    Http(String),
    #[error("Model API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Model returned an empty response")]
    EmptyResponse,
    #[error("Malformed case JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Generated case is invalid: {0}")]
    Invalid(#[from] ValidationError),
    #[error("Invalid image payload: {0}")]
    Image(String),
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Raw JSON text of a case following [`case_response_schema`].
    async fn generate_case_json(&self, difficulty: Difficulty) -> Result<String, GenerationError>;

    /// A square image for the prompt, as a `data:` URL.
    async fn generate_image(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Case as the model returns it, before ids and images are attached.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedCase {
    name: String,
    age: u32,
    occupation: String,
    difficulty: Difficulty,
    symptoms: Vec<String>,
    vitals: Vitals,
    stages: Vec<CaseStage>,
    diagnosis: String,
    #[serde(default)]
    medical_image_description: Option<String>,
    medical_explanation: String,
    trusted_sources: Vec<TrustedSource>,
}

pub fn avatar_prompt(name: &str, occupation: &str) -> String {
    format!(
        "Masterpiece, high-quality 3D chibi human character, professionally produced video game asset. \
         Style of high-end 3D cozy games. Name: {}, Occupation: {}. Expression: Mildly unwell but cute. \
         Art style: Octane render, 4k, soft cinematic lighting, clay-like smooth texture, high detail, \
         pastel colors, solid white background. Nintendo Switch aesthetics.",
        name, occupation
    )
}

pub fn finding_prompt(description: &str) -> String {
    format!(
        "Professional video game UI illustration for a medical chart finding. Concept: {}. \
         Style: Clean vector-style or polished 3D render, soft hand-painted textures, pastel medical \
         palette, clean white background. Educational but aesthetic, high production quality, \
         masterpiece level. No gore.",
        description
    )
}

/// Produces fresh cases. Never fails: anything that goes wrong yields the fallback case.
pub struct CaseGenerator {
    model: Arc<dyn GenerativeModel>,
    timeout: Duration,
    rng: Mutex<StdRng>,
}

impl CaseGenerator {
    pub fn new(model: Arc<dyn GenerativeModel>, timeout: Duration) -> Self {
        Self::with_rng(model, timeout, StdRng::from_entropy())
    }

    pub fn with_rng(model: Arc<dyn GenerativeModel>, timeout: Duration, rng: StdRng) -> Self {
        Self {
            model,
            timeout,
            rng: Mutex::new(rng),
        }
    }

    pub async fn generate_case(&self, player_xp: u32) -> PatientCase {
        let (difficulty, seed_suffix) = {
            let mut rng = self.rng.lock().await;
            let advanced = player_xp >= ADVANCED_XP_THRESHOLD && rng.gen_bool(0.5);
            let difficulty = if advanced {
                Difficulty::Advanced
            } else {
                Difficulty::Beginner
            };
            (difficulty, rng.gen_range(0..1000))
        };

        info!("Generating {} case", difficulty.as_str());
        match tokio::time::timeout(self.timeout, self.try_generate(difficulty, seed_suffix)).await {
            Ok(Ok(case)) => {
                info!("Generated case {} ({})", case.id, case.diagnosis);
                case
            }
            Ok(Err(e)) => {
                warn!("Case generation failed, serving fallback: {}", e);
                fallback_case()
            }
            Err(_) => {
                warn!(
                    "Case generation timed out after {}s, serving fallback",
                    self.timeout.as_secs()
                );
                fallback_case()
            }
        }
    }

    async fn try_generate(
        &self,
        difficulty: Difficulty,
        seed_suffix: u32,
    ) -> Result<PatientCase, GenerationError> {
        let raw = self.model.generate_case_json(difficulty).await?;
        if raw.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        let data: GeneratedCase = serde_json::from_str(&raw)?;

        let finding = data
            .medical_image_description
            .as_deref()
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .map(str::to_string);

        let avatar_prompt = avatar_prompt(&data.name, &data.occupation);
        let finding_request = finding.as_deref().map(finding_prompt);
        let finding_image: OptionFuture<_> = finding_request
            .as_deref()
            .map(|prompt| self.model.generate_image(prompt))
            .into();

        let (avatar, finding_image) =
            join(self.model.generate_image(&avatar_prompt), finding_image).await;

        let avatar = avatar?;
        let medical_images = match (finding, finding_image) {
            (Some(caption), Some(image)) => vec![MedicalImage { url: image?, caption }],
            _ => Vec::new(),
        };

        let case = PatientCase {
            id: Uuid::new_v4().to_string(),
            difficulty: data.difficulty,
            stages: data.stages,
            avatar_seed: format!("{}-{}", data.name, seed_suffix),
            name: data.name,
            age: data.age,
            occupation: data.occupation,
            image_url: Some(avatar),
            medical_images,
            symptoms: data.symptoms,
            vitals: data.vitals,
            diagnosis: data.diagnosis,
            medical_explanation: data.medical_explanation,
            trusted_sources: data.trusted_sources,
            stats: None,
            is_fallback: false,
        };

        validate_generated_case(&case)?;
        Ok(case)
    }
}
