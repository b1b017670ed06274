#![allow(dead_code)]

use clinic_core::{ClinicGame, GameEvent, GameEventHandler, permanent_cases};
use clinic_types::{GameStatus, PatientCase, Profile, User};
use std::sync::{Arc, Mutex};

/// Creates a signed-in account user with the given profile
pub fn create_test_user_with_profile(name: &str, profile: Profile) -> User {
    User {
        id: format!("test-user-{}", name.to_lowercase()),
        username: name.to_string(),
        password: None,
        is_ai: false,
        is_guest: false,
        profile,
        created_at: 0,
        last_login: 0,
    }
}

/// Creates an account user with a starting profile
pub fn create_test_user(name: &str) -> User {
    create_test_user_with_profile(name, Profile::starting())
}

pub fn create_guest() -> User {
    User {
        id: "guest_test".to_string(),
        username: "Guest Doctor".to_string(),
        is_guest: true,
        ..create_test_user("guest")
    }
}

/// Looks up a shipped case by id
pub fn permanent_case(case_id: &str) -> PatientCase {
    permanent_cases()
        .into_iter()
        .find(|case| case.id == case_id)
        .unwrap_or_else(|| panic!("no permanent case {}", case_id))
}

/// Signs the user in and puts the case on the table
pub fn start_case(user: User, case: PatientCase) -> ClinicGame {
    let mut game = ClinicGame::new();
    game.sign_in(user);
    game.begin_loading();
    game.case_loaded(case);
    game
}

pub fn assert_status(game: &ClinicGame, expected: GameStatus) {
    assert_eq!(
        game.state().game_status,
        expected,
        "Expected status {:?}, got {:?}",
        expected,
        game.state().game_status
    );
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<GameEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<GameEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&GameEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl GameEventHandler for EventCollector {
    fn handle_event(&mut self, event: GameEvent) {
        self.events.lock().unwrap().push(event);
    }
}
