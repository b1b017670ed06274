use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{GenerationError, GenerativeModel};
use crate::config::Config;
use clinic_types::Difficulty;

const CASE_TEMPERATURE: f64 = 0.9;
const ADVANCED_THINKING_BUDGET: u32 = 2048;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
}

impl From<&Config> for GeminiConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_base_url.clone(),
            text_model: config.gemini_text_model.clone(),
            image_model: config.gemini_image_model.clone(),
        }
    }
}

/// Gemini REST client for `generateContent`.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &Value,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;

        debug!("POST generateContent on {}", model);
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_case_json(&self, difficulty: Difficulty) -> Result<String, GenerationError> {
        let body = case_request_body(difficulty);
        let response = self
            .generate_content(&self.config.text_model, &body)
            .await?;
        response.text().ok_or(GenerationError::EmptyResponse)
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": { "aspectRatio": "1:1" }
            }
        });
        let response = self
            .generate_content(&self.config.image_model, &body)
            .await?;
        response.image_data_url()
    }
}

fn system_instruction(difficulty: Difficulty) -> String {
    format!(
        r#"You are the Lead Narrative Doctor for "Kawaii Clinic", a high-end cozy medical simulation game.
Generate a patient case JSON for the game.
1. The aesthetic is "Cozy/Kawaii/Nintendo-style".
2. The medical conditions must be realistic and scientifically grounded, but presented in a user-friendly way.
3. DIFFICULTY: {}.
   - If "beginner": Provide exactly 1 stage.
   - If "advanced": Provide 2 or 3 stages forming a logical sequence.
4. "medicalImageDescription": If the diagnosis involves a visual finding (e.g. skin rash, X-ray, ECG), provide a detailed visual description for a professional artist."#,
        difficulty.as_str().to_uppercase()
    )
}

fn case_request_body(difficulty: Difficulty) -> Value {
    let mut generation_config = json!({
        "responseMimeType": "application/json",
        "responseSchema": case_response_schema(),
        "temperature": CASE_TEMPERATURE,
    });
    if difficulty == Difficulty::Advanced {
        generation_config["thinkingConfig"] = json!({ "thinkingBudget": ADVANCED_THINKING_BUDGET });
    }

    json!({
        "systemInstruction": { "parts": [{ "text": system_instruction(difficulty) }] },
        "contents": [{
            "role": "user",
            "parts": [{
                "text": format!(
                    "Generate a random high-quality {} patient case with professional medical logic.",
                    difficulty.as_str()
                )
            }]
        }],
        "generationConfig": generation_config,
    })
}

/// Structured-output schema for a generated case.
pub fn case_response_schema() -> Value {
    let string = |description: &str| json!({ "type": "STRING", "description": description });

    json!({
        "type": "OBJECT",
        "properties": {
            "name": string("Cute first name of the patient"),
            "age": { "type": "INTEGER", "description": "Age of the patient" },
            "occupation": string("Whimsical job title (e.g. Cloud Watcher, Berry Picker)"),
            "difficulty": {
                "type": "STRING",
                "enum": ["beginner", "advanced"],
                "description": "Difficulty level of the case"
            },
            "symptoms": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of 2-4 medical symptoms observed"
            },
            "vitals": {
                "type": "OBJECT",
                "properties": {
                    "temp": string("Body temperature"),
                    "bp": string("Blood pressure"),
                    "hr": string("Heart rate")
                }
            },
            "stages": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "dialogue": string("Patient's statement or narrator's update for this stage."),
                        "choices": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "id": { "type": "STRING" },
                                    "label": string("Action/Diagnosis description"),
                                    "feedback": string("Result message if this choice is selected")
                                },
                                "required": ["id", "label", "feedback"]
                            },
                            "description": "3 choices. One correct, two incorrect."
                        },
                        "correctChoiceId": string("The ID of the correct choice for this stage")
                    },
                    "required": ["id", "dialogue", "choices", "correctChoiceId"]
                },
                "description": "If beginner, 1 stage. If advanced, 2-3 stages forming a logical diagnostic sequence."
            },
            "diagnosis": string("The actual medical diagnosis"),
            "medicalImageDescription": string(
                "A description for a visual medical finding (e.g., 'X-ray showing a faint shadow', \
                 'Close-up of a circular red rash', 'An ECG with wavy lines'). Leave empty if not applicable."
            ),
            "medicalExplanation": string(
                "A paragraph explaining the real medical science, pathophysiology, and why the diagnosis \
                 is correct, written in an educational but accessible tone."
            ),
            "trustedSources": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": string("Name of a trusted medical website (e.g., Mayo Clinic, CDC, NHS)"),
                        "url": string("A valid URL to a page about this condition.")
                    },
                    "required": ["title", "url"]
                },
                "description": "2-3 links to trusted medical resources for learning more."
            }
        },
        "required": [
            "name", "age", "occupation", "difficulty", "symptoms", "vitals", "stages",
            "diagnosis", "medicalExplanation", "trustedSources"
        ]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// Concatenated answer text, skipping thought summaries.
    fn text(&self) -> Option<String> {
        let text: String = self
            .parts()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    fn image_data_url(&self) -> Result<String, GenerationError> {
        let inline = self
            .parts()
            .find_map(|part| part.inline_data.as_ref())
            .ok_or_else(|| GenerationError::Image("no inline image in response".to_string()))?;

        STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| GenerationError::Image(e.to_string()))?;

        let mime_type = inline.mime_type.as_deref().unwrap_or("image/png");
        Ok(format!("data:{};base64,{}", mime_type, inline.data))
    }
}
