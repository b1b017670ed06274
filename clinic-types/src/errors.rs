use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Rejections returned by the gameplay reducers. All of them are recoverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum GameError {
    #[error("Sign in to start your shift")]
    NotSignedIn,
    #[error("No patient is waiting")]
    NoActiveCase,
    #[error("Cannot do that while the case is {current_status}")]
    InvalidGameState { current_status: String },
    #[error("Unknown choice: {choice_id}")]
    UnknownChoice { choice_id: String },
    #[error("That option was ruled out")]
    ChoiceRemoved { choice_id: String },
    #[error("This case has no further stages")]
    NoNextStage,
    #[error("Unknown shop item: {item_id}")]
    UnknownItem { item_id: String },
    #[error("You already own {item_id}")]
    AlreadyOwned { item_id: String },
    #[error("Not enough coins ({coins}/{cost})")]
    InsufficientCoins { cost: u32, coins: u32 },
    #[error("No hint available")]
    HintUnavailable,
}
