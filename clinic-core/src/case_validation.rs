use clinic_types::{CaseStage, Difficulty, PatientCase};
use std::collections::HashSet;
use thiserror::Error;

/// Choices every generated stage must offer: one correct, two incorrect.
pub const GENERATED_CHOICES_PER_STAGE: usize = 3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("case has no stages")]
    NoStages,
    #[error("{difficulty} case has {count} stages")]
    StageCount { difficulty: &'static str, count: usize },
    #[error("stage {stage_id} has {count} choices")]
    ChoiceCount { stage_id: String, count: usize },
    #[error("stage {stage_id} repeats choice id {choice_id}")]
    DuplicateChoice { stage_id: String, choice_id: String },
    #[error("stage {stage_id} marks unknown choice {choice_id} as correct")]
    CorrectChoiceMissing { stage_id: String, choice_id: String },
}

/// Checks the structural invariants every playable case must satisfy.
pub fn validate_case(case: &PatientCase) -> Result<(), ValidationError> {
    if case.stages.is_empty() {
        return Err(ValidationError::NoStages);
    }

    let count = case.stages.len();
    let stage_count_ok = match case.difficulty {
        Difficulty::Beginner => count == 1,
        Difficulty::Advanced => (2..=3).contains(&count),
    };
    if !stage_count_ok {
        return Err(ValidationError::StageCount {
            difficulty: case.difficulty.as_str(),
            count,
        });
    }

    for stage in &case.stages {
        validate_stage(stage)?;
    }

    Ok(())
}

/// Stricter check for model output, which must follow the three-choice schema.
pub fn validate_generated_case(case: &PatientCase) -> Result<(), ValidationError> {
    validate_case(case)?;

    for stage in &case.stages {
        if stage.choices.len() != GENERATED_CHOICES_PER_STAGE {
            return Err(ValidationError::ChoiceCount {
                stage_id: stage.id.clone(),
                count: stage.choices.len(),
            });
        }
    }

    Ok(())
}

fn validate_stage(stage: &CaseStage) -> Result<(), ValidationError> {
    if stage.choices.len() < 2 {
        return Err(ValidationError::ChoiceCount {
            stage_id: stage.id.clone(),
            count: stage.choices.len(),
        });
    }

    let mut seen = HashSet::new();
    for choice in &stage.choices {
        if !seen.insert(choice.id.as_str()) {
            return Err(ValidationError::DuplicateChoice {
                stage_id: stage.id.clone(),
                choice_id: choice.id.clone(),
            });
        }
    }

    // Ids are unique at this point, so membership means exactly one match
    if !seen.contains(stage.correct_choice_id.as_str()) {
        return Err(ValidationError::CorrectChoiceMissing {
            stage_id: stage.id.clone(),
            choice_id: stage.correct_choice_id.clone(),
        });
    }

    Ok(())
}
