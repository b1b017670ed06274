use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Everything a player can do from any screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PlayerAction {
    Login { username: String, password: String },
    Signup { username: String, password: String },
    PlayAsGuest,
    Logout,
    Choose { choice_id: String },
    NextStage,
    LearnMore,
    NextCase,
    UseHint,
    BuyItem { item_id: String },
    OpenShop,
    OpenClinic,
    CatchItem { item_id: u32 },
}
