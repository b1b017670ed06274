use clinic_types::{CaseId, UserId};

use crate::scoring::Reward;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SignedIn {
        user_id: UserId,
        is_guest: bool,
    },
    SignedOut,
    /// Guest progress was carried over into a freshly created account.
    GuestProgressTransferred {
        user_id: UserId,
    },
    CaseLoading,
    CaseServed {
        case_id: CaseId,
    },
    CaseLoadFailed,
    ChoiceEvaluated {
        case_id: CaseId,
        stage_index: usize,
        choice_id: String,
        is_correct: bool,
        reward: Reward,
    },
    StageAdvanced {
        case_id: CaseId,
        stage_index: usize,
    },
    /// Case ended in success or failure; the next case is due.
    CaseFinished {
        case_id: CaseId,
        solved: bool,
    },
    LeveledUp {
        rank_id: u32,
        title: String,
    },
    ExplanationOpened {
        case_id: CaseId,
    },
    ChoiceRemoved {
        choice_id: String,
    },
    ItemPurchased {
        item_id: String,
        cost: u32,
    },
    IncomeReceived {
        amount: u32,
    },
    MinigameItemCaught {
        item_id: u32,
    },
    /// Coins, xp, score or inventory changed.
    ProfileChanged,
}

impl GameEvent {
    pub fn case_id(&self) -> Option<&str> {
        match self {
            GameEvent::CaseServed { case_id }
            | GameEvent::ChoiceEvaluated { case_id, .. }
            | GameEvent::StageAdvanced { case_id, .. }
            | GameEvent::CaseFinished { case_id, .. }
            | GameEvent::ExplanationOpened { case_id } => Some(case_id),
            _ => None,
        }
    }
}

/// Event handler trait for processing game events
pub trait GameEventHandler: Send {
    fn handle_event(&mut self, event: GameEvent);
}

/// Simple event bus for distributing game events
pub struct GameEventBus {
    handlers: Vec<Box<dyn GameEventHandler>>,
}

impl GameEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: GameEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }

    pub fn publish_all(&mut self, events: &[GameEvent]) {
        for event in events {
            self.publish(event.clone());
        }
    }
}

impl Default for GameEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes every event to the trace log.
pub struct TracingEventHandler;

impl GameEventHandler for TracingEventHandler {
    fn handle_event(&mut self, event: GameEvent) {
        tracing::debug!("game event: {:?}", event);
    }
}
