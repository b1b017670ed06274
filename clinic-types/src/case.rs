use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub type CaseId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Difficulty {
    Beginner,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Choice {
    pub id: String,
    pub label: String,
    pub feedback: String, // shown when selected
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CaseStage {
    pub id: String,
    pub dialogue: String,
    pub choices: Vec<Choice>,
    pub correct_choice_id: String,
}

impl CaseStage {
    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    pub fn is_correct(&self, choice_id: &str) -> bool {
        self.correct_choice_id == choice_id
    }

    pub fn wrong_choices(&self) -> impl Iterator<Item = &Choice> {
        self.choices
            .iter()
            .filter(|c| c.id != self.correct_choice_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Vitals {
    pub temp: String,
    pub bp: String,
    pub hr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MedicalImage {
    pub url: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TrustedSource {
    pub title: String,
    pub url: String,
}

/// Global (not per-user) outcome counters for one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CaseStats {
    pub case_id: CaseId,
    pub attempts: u32,
    pub correct_count: u32,
    /// correct / attempts, 1.0 meaning everyone gets it right
    pub difficulty_rating: f64,
}

impl CaseStats {
    pub fn new(case_id: &str) -> Self {
        Self {
            case_id: case_id.to_string(),
            attempts: 0,
            correct_count: 0,
            difficulty_rating: 0.0,
        }
    }

    pub fn record(&mut self, is_correct: bool) {
        self.attempts += 1;
        if is_correct {
            self.correct_count += 1;
        }
        self.difficulty_rating = self.correct_count as f64 / self.attempts as f64;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PatientCase {
    pub id: CaseId,
    pub difficulty: Difficulty,
    /// Ordered stages. Beginner cases have exactly one.
    pub stages: Vec<CaseStage>,

    pub name: String,
    pub age: u32,
    pub occupation: String,
    pub avatar_seed: String,
    /// Generated avatar as an inline data URL. Never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[ts(as = "Option<Vec<MedicalImage>>", optional)]
    pub medical_images: Vec<MedicalImage>,
    pub symptoms: Vec<String>,
    pub vitals: Vitals,

    pub diagnosis: String,
    pub medical_explanation: String,
    pub trusted_sources: Vec<TrustedSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub stats: Option<CaseStats>,
    /// Fallback cases keep a session playable and are never stored.
    #[serde(default)]
    pub is_fallback: bool,
}

impl PatientCase {
    pub fn stage(&self, index: usize) -> Option<&CaseStage> {
        self.stages.get(index)
    }

    pub fn is_last_stage(&self, index: usize) -> bool {
        index + 1 >= self.stages.len()
    }

    /// Generated avatar if present, otherwise a placeholder derived from the avatar seed.
    pub fn avatar_url(&self) -> String {
        match &self.image_url {
            Some(url) => url.clone(),
            None => format!(
                "https://api.dicebear.com/9.x/adventurer/svg?seed={}",
                self.avatar_seed.replace(' ', "%20")
            ),
        }
    }

    /// Copy of the case with inline image payloads removed, suitable for storage.
    pub fn without_image_payloads(&self) -> Self {
        let mut stripped = self.clone();
        stripped.image_url = None;
        stripped
            .medical_images
            .retain(|image| !image.url.starts_with("data:"));
        stripped
    }
}
