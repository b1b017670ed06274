use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::case::{CaseStage, PatientCase};
use crate::user::{Profile, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GameStatus {
    Idle,         // No case in play
    Playing,      // Waiting for a choice on the current stage
    StageSuccess, // Correct answer, more stages follow
    CaseSuccess,  // Correct answer on the final stage
    Failure,      // Wrong answer, case over
}

impl GameStatus {
    /// Case is over and the auto-advance timer applies.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::CaseSuccess | GameStatus::Failure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum GameView {
    Clinic,
    Shop,
}

/// One-shot promotion notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LevelUp {
    pub title: String,
    pub rank_id: u32,
}

/// The single top-level state object the front-end renders from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameState {
    pub user: Option<User>,
    pub current_case: Option<PatientCase>,
    pub current_stage_index: usize,

    pub streak: u32,
    pub loading: bool,
    pub game_status: GameStatus,
    pub feedback_message: Option<String>,
    pub is_correct: Option<bool>,
    pub view: GameView,
    pub show_explanation: bool,
    pub just_leveled_up: Option<LevelUp>,
    /// Choice hidden by the hint item on the current stage.
    pub removed_choice_id: Option<String>,
    /// The hint item works once per case.
    pub hint_used: bool,
    pub error: Option<String>,

    /// Live copy of the signed-in user's profile.
    pub profile: Profile,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            user: None,
            current_case: None,
            current_stage_index: 0,
            streak: 0,
            loading: false,
            game_status: GameStatus::Idle,
            feedback_message: None,
            is_correct: None,
            view: GameView::Clinic,
            show_explanation: false,
            just_leveled_up: None,
            removed_choice_id: None,
            hint_used: false,
            error: None,
            profile: Profile::default(),
        }
    }
}

impl GameState {
    pub fn current_stage(&self) -> Option<&CaseStage> {
        self.current_case
            .as_ref()
            .and_then(|case| case.stage(self.current_stage_index))
    }

    pub fn is_guest(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_guest)
    }

    /// The signed-in user with the live profile folded back in.
    pub fn session_user(&self) -> Option<User> {
        self.user.as_ref().map(|user| User {
            profile: self.profile.clone(),
            ..user.clone()
        })
    }
}
