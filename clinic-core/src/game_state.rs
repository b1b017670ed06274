use clinic_types::{GameError, GameState, GameStatus, GameView, LevelUp, PatientCase, User};
use rand::Rng;
use rand::seq::IteratorRandom;
use tracing::{debug, info};

use crate::game_events::GameEvent;
use crate::minigame::{COINS_PER_CATCH, MiniGame};
use crate::ranks::rank_for;
use crate::scoring::ScoringEngine;
use crate::shop::{ItemEffect, coin_multiplier, find_item, has_effect, passive_income};

pub const LOAD_FAILED_MESSAGE: &str =
    "Oh no! The pager is broken. We couldn't find a new patient.";

/// Owns the top-level game state. Every player action is a reducer that mutates the
/// state and reports what happened as events; side effects are left to the caller.
#[derive(Debug, Default)]
pub struct ClinicGame {
    state: GameState,
    minigame: MiniGame,
}

impl ClinicGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn minigame(&self) -> &MiniGame {
        &self.minigame
    }

    /// Starts a session for an account or guest. A guest who signs into a fresh
    /// account brings their progress along.
    pub fn sign_in(&mut self, mut user: User) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if self.state.is_guest() && !user.is_guest && user.profile.is_fresh() {
            info!("Transferring guest progress to {}", user.username);
            user.profile = self.state.profile.clone();
            events.push(GameEvent::GuestProgressTransferred {
                user_id: user.id.clone(),
            });
            events.push(GameEvent::ProfileChanged);
        }

        self.state.profile = user.profile.clone();
        events.push(GameEvent::SignedIn {
            user_id: user.id.clone(),
            is_guest: user.is_guest,
        });
        self.state.user = Some(user);
        self.state.error = None;
        events
    }

    pub fn sign_out(&mut self) -> Vec<GameEvent> {
        self.state = GameState::default();
        self.minigame.reset();
        vec![GameEvent::SignedOut]
    }

    /// Clears the table for the next patient and starts the loading screen.
    pub fn begin_loading(&mut self) -> Vec<GameEvent> {
        let state = &mut self.state;
        state.loading = true;
        state.current_case = None;
        state.current_stage_index = 0;
        state.game_status = GameStatus::Playing;
        state.feedback_message = None;
        state.is_correct = None;
        state.show_explanation = false;
        state.just_leveled_up = None;
        state.removed_choice_id = None;
        state.hint_used = false;
        state.error = None;
        self.minigame.reset();
        vec![GameEvent::CaseLoading]
    }

    pub fn case_loaded(&mut self, case: PatientCase) -> Vec<GameEvent> {
        let case_id = case.id.clone();
        self.state.current_case = Some(case);
        self.state.current_stage_index = 0;
        self.state.loading = false;
        vec![GameEvent::CaseServed { case_id }]
    }

    pub fn case_load_failed(&mut self) -> Vec<GameEvent> {
        self.state.loading = false;
        self.state.error = Some(LOAD_FAILED_MESSAGE.to_string());
        vec![GameEvent::CaseLoadFailed]
    }

    /// Evaluates a choice on the current stage and pays out the reward.
    pub fn choose(&mut self, choice_id: &str) -> Result<Vec<GameEvent>, GameError> {
        self.require_playing()?;

        let case = self
            .state
            .current_case
            .as_ref()
            .ok_or(GameError::NoActiveCase)?;
        let stage_index = self.state.current_stage_index;
        let stage = case.stage(stage_index).ok_or(GameError::NoActiveCase)?;
        let choice = stage.choice(choice_id).ok_or_else(|| GameError::UnknownChoice {
            choice_id: choice_id.to_string(),
        })?;
        if self.state.removed_choice_id.as_deref() == Some(choice_id) {
            return Err(GameError::ChoiceRemoved {
                choice_id: choice_id.to_string(),
            });
        }

        let is_correct = stage.is_correct(choice_id);
        let is_final_stage = case.is_last_stage(stage_index);
        let feedback = choice.feedback.clone();
        let case_id = case.id.clone();

        let multiplier = coin_multiplier(&self.state.profile.inventory);
        let reward = ScoringEngine::reward_for(is_correct, is_final_stage, multiplier);
        let status = ScoringEngine::status_after(is_correct, is_final_stage);

        let old_rank = rank_for(self.state.profile.xp);
        let profile = &mut self.state.profile;
        profile.coins = profile.coins.saturating_add(reward.coins);
        profile.xp = profile.xp.saturating_add(reward.xp);
        profile.score = profile.score.saturating_add(reward.score);
        let new_rank = rank_for(profile.xp);

        match status {
            GameStatus::CaseSuccess => self.state.streak += 1,
            GameStatus::Failure => self.state.streak = 0,
            _ => {}
        }

        self.state.game_status = status;
        self.state.feedback_message = Some(feedback);
        self.state.is_correct = Some(is_correct);
        self.state.just_leveled_up = None;

        debug!(
            "Case {} stage {}: choice {} correct={} (+{} coins, +{} xp)",
            case_id, stage_index, choice_id, is_correct, reward.coins, reward.xp
        );

        let mut events = vec![
            GameEvent::ChoiceEvaluated {
                case_id: case_id.clone(),
                stage_index,
                choice_id: choice_id.to_string(),
                is_correct,
                reward,
            },
            GameEvent::ProfileChanged,
        ];

        if new_rank.id > old_rank.id {
            info!("Promoted to {}", new_rank.title);
            self.state.just_leveled_up = Some(LevelUp {
                title: new_rank.title.to_string(),
                rank_id: new_rank.id,
            });
            events.push(GameEvent::LeveledUp {
                rank_id: new_rank.id,
                title: new_rank.title.to_string(),
            });
        }

        if status.is_terminal() {
            events.push(GameEvent::CaseFinished {
                case_id,
                solved: is_correct,
            });
        }

        Ok(events)
    }

    pub fn next_stage(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.state.game_status != GameStatus::StageSuccess {
            return Err(self.invalid_state());
        }
        let case = self
            .state
            .current_case
            .as_ref()
            .ok_or(GameError::NoActiveCase)?;
        let next_index = self.state.current_stage_index + 1;
        if case.stage(next_index).is_none() {
            return Err(GameError::NoNextStage);
        }
        let case_id = case.id.clone();

        self.state.current_stage_index = next_index;
        self.state.game_status = GameStatus::Playing;
        self.state.feedback_message = None;
        self.state.is_correct = None;
        self.state.removed_choice_id = None;

        Ok(vec![GameEvent::StageAdvanced {
            case_id,
            stage_index: next_index,
        }])
    }

    pub fn show_explanation(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let case = self
            .state
            .current_case
            .as_ref()
            .ok_or(GameError::NoActiveCase)?;
        let case_id = case.id.clone();
        self.state.show_explanation = true;
        Ok(vec![GameEvent::ExplanationOpened { case_id }])
    }

    pub fn buy_item(&mut self, item_id: &str) -> Result<Vec<GameEvent>, GameError> {
        if self.state.user.is_none() {
            return Err(GameError::NotSignedIn);
        }
        let item = find_item(item_id).ok_or_else(|| GameError::UnknownItem {
            item_id: item_id.to_string(),
        })?;

        let profile = &mut self.state.profile;
        if profile.owns(item.id) {
            return Err(GameError::AlreadyOwned {
                item_id: item.id.to_string(),
            });
        }
        if profile.coins < item.cost {
            return Err(GameError::InsufficientCoins {
                cost: item.cost,
                coins: profile.coins,
            });
        }

        profile.coins -= item.cost;
        profile.add_item(item.id);
        info!("Bought {} for {} coins", item.name, item.cost);

        Ok(vec![
            GameEvent::ItemPurchased {
                item_id: item.id.to_string(),
                cost: item.cost,
            },
            GameEvent::ProfileChanged,
        ])
    }

    /// Rules out one random incorrect choice. Needs the hint item, once per case.
    pub fn use_hint<R: Rng>(&mut self, rng: &mut R) -> Result<Vec<GameEvent>, GameError> {
        if !has_effect(&self.state.profile.inventory, ItemEffect::RemoveWrong)
            || self.state.hint_used
        {
            return Err(GameError::HintUnavailable);
        }
        self.require_playing()?;

        let stage = self.state.current_stage().ok_or(GameError::NoActiveCase)?;
        let removed = stage
            .wrong_choices()
            .choose(rng)
            .map(|choice| choice.id.clone())
            .ok_or(GameError::HintUnavailable)?;

        self.state.removed_choice_id = Some(removed.clone());
        self.state.hint_used = true;
        Ok(vec![GameEvent::ChoiceRemoved { choice_id: removed }])
    }

    /// Advances the loading-screen spawner. Only runs while a case is loading.
    pub fn spawn_minigame_item<R: Rng>(&mut self, now_ms: u64, rng: &mut R) -> Option<u32> {
        if !self.state.loading {
            return None;
        }
        self.minigame.tick(now_ms, rng)
    }

    pub fn collect_minigame_item(&mut self, item_id: u32) -> Vec<GameEvent> {
        if !self.minigame.catch(item_id) {
            return Vec::new();
        }
        self.state.profile.coins = self.state.profile.coins.saturating_add(COINS_PER_CATCH);
        vec![
            GameEvent::MinigameItemCaught { item_id },
            GameEvent::ProfileChanged,
        ]
    }

    /// One passive income tick from owned staff.
    pub fn apply_passive_income(&mut self) -> Vec<GameEvent> {
        if self.state.user.is_none() {
            return Vec::new();
        }
        let amount = passive_income(&self.state.profile.inventory);
        if amount == 0 {
            return Vec::new();
        }
        self.state.profile.coins = self.state.profile.coins.saturating_add(amount);
        vec![GameEvent::IncomeReceived { amount }, GameEvent::ProfileChanged]
    }

    pub fn set_view(&mut self, view: GameView) {
        self.state.view = view;
    }

    fn require_playing(&self) -> Result<(), GameError> {
        if self.state.current_case.is_none() {
            return Err(GameError::NoActiveCase);
        }
        if self.state.game_status != GameStatus::Playing {
            return Err(self.invalid_state());
        }
        Ok(())
    }

    fn invalid_state(&self) -> GameError {
        GameError::InvalidGameState {
            current_status: format!("{:?}", self.state.game_status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::permanent_cases;
    use clinic_types::Profile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn account(name: &str, profile: Profile) -> User {
        User {
            id: format!("id-{}", name),
            username: name.to_string(),
            password: None,
            is_ai: false,
            is_guest: false,
            profile,
            created_at: 0,
            last_login: 0,
        }
    }

    fn guest() -> User {
        User {
            id: "guest_1".to_string(),
            username: "Guest Doctor".to_string(),
            is_guest: true,
            ..account("guest", Profile::starting())
        }
    }

    fn game_with_case(case_index: usize) -> ClinicGame {
        let mut game = ClinicGame::new();
        game.sign_in(account("drtest", Profile::starting()));
        game.begin_loading();
        game.case_loaded(permanent_cases().remove(case_index));
        game
    }

    #[test]
    fn test_loading_resets_case_state() {
        let mut game = game_with_case(0);
        game.choose("c2").unwrap();

        let events = game.begin_loading();
        let state = game.state();
        assert_eq!(events, vec![GameEvent::CaseLoading]);
        assert!(state.loading);
        assert!(state.current_case.is_none());
        assert_eq!(state.game_status, GameStatus::Playing);
        assert!(state.feedback_message.is_none());
        assert!(state.is_correct.is_none());
    }

    #[test]
    fn test_choose_requires_case() {
        let mut game = ClinicGame::new();
        assert_eq!(game.choose("c1"), Err(GameError::NoActiveCase));
    }

    #[test]
    fn test_choose_unknown_choice() {
        let mut game = game_with_case(0);
        assert!(matches!(
            game.choose("nope"),
            Err(GameError::UnknownChoice { .. })
        ));
    }

    #[test]
    fn test_cannot_choose_twice() {
        let mut game = game_with_case(0);
        game.choose("c1").unwrap();
        assert!(matches!(
            game.choose("c1"),
            Err(GameError::InvalidGameState { .. })
        ));
    }

    #[test]
    fn test_multi_stage_flow() {
        // perm_adv_001 is the two-stage case
        let mut game = game_with_case(5);

        let events = game.choose("c_s1_2").unwrap();
        assert_eq!(game.state().game_status, GameStatus::StageSuccess);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::CaseFinished { .. })));
        assert_eq!(game.state().profile.coins, 120);
        assert_eq!(game.state().profile.xp, 20);

        game.next_stage().unwrap();
        assert_eq!(game.state().current_stage_index, 1);
        assert_eq!(game.state().game_status, GameStatus::Playing);
        assert!(game.state().feedback_message.is_none());

        let events = game.choose("c_s2_1").unwrap();
        assert_eq!(game.state().game_status, GameStatus::CaseSuccess);
        assert!(events.contains(&GameEvent::CaseFinished {
            case_id: "perm_adv_001".to_string(),
            solved: true,
        }));
        assert_eq!(game.state().profile.coins, 170);
        assert_eq!(game.state().profile.score, 120);
        assert_eq!(game.state().streak, 1);
        assert_eq!(game.next_stage(), Err(game.invalid_state()));
    }

    #[test]
    fn test_level_up_is_one_shot() {
        let mut game = game_with_case(0);
        let events = game.choose("c1").unwrap();

        // 0 -> 100 xp crosses into rank 2
        assert_eq!(
            game.state().just_leveled_up,
            Some(LevelUp {
                title: "Med Student (Lost)".to_string(),
                rank_id: 2
            })
        );
        assert!(events.iter().any(|e| matches!(e, GameEvent::LeveledUp { rank_id: 2, .. })));

        game.begin_loading();
        assert!(game.state().just_leveled_up.is_none());
    }

    #[test]
    fn test_buy_item() {
        let mut game = game_with_case(0);
        game.state.profile.coins = 600;

        game.buy_item("equip_stethoscope").unwrap();
        assert_eq!(game.state().profile.coins, 100);
        assert_eq!(game.state().profile.inventory, vec!["equip_stethoscope"]);

        assert!(matches!(
            game.buy_item("equip_stethoscope"),
            Err(GameError::AlreadyOwned { .. })
        ));
        assert_eq!(
            game.buy_item("equip_mri"),
            Err(GameError::InsufficientCoins {
                cost: 1200,
                coins: 100
            })
        );
        assert!(matches!(
            game.buy_item("gold_scalpel"),
            Err(GameError::UnknownItem { .. })
        ));
    }

    #[test]
    fn test_hint_removes_one_wrong_choice_per_case() {
        let mut game = game_with_case(0);
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(game.use_hint(&mut rng), Err(GameError::HintUnavailable));

        game.state.profile.inventory.push("equip_stethoscope".to_string());
        let events = game.use_hint(&mut rng).unwrap();
        let removed = game.state().removed_choice_id.clone().unwrap();
        assert_ne!(removed, "c1");
        assert_eq!(events, vec![GameEvent::ChoiceRemoved { choice_id: removed.clone() }]);

        assert_eq!(game.use_hint(&mut rng), Err(GameError::HintUnavailable));
        assert!(matches!(
            game.choose(&removed),
            Err(GameError::ChoiceRemoved { .. })
        ));
    }

    #[test]
    fn test_passive_income() {
        let mut game = ClinicGame::new();
        assert!(game.apply_passive_income().is_empty());

        let mut profile = Profile::starting();
        profile.inventory = vec!["staff_nurse_cat".to_string(), "staff_robo_doc".to_string()];
        game.sign_in(account("rich", profile));

        let events = game.apply_passive_income();
        assert_eq!(events[0], GameEvent::IncomeReceived { amount: 25 });
        assert_eq!(game.state().profile.coins, 125);
    }

    #[test]
    fn test_minigame_only_spawns_while_loading() {
        let mut game = game_with_case(0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(game.spawn_minigame_item(0, &mut rng).is_none());

        game.begin_loading();
        let id = game.spawn_minigame_item(0, &mut rng).unwrap();
        let events = game.collect_minigame_item(id);
        assert_eq!(events.len(), 2);
        assert_eq!(game.state().profile.coins, 101);
        assert!(game.collect_minigame_item(id).is_empty());
    }

    #[test]
    fn test_guest_progress_moves_into_fresh_account() {
        let mut game = ClinicGame::new();
        game.sign_in(guest());
        game.state.profile.coins = 180;
        game.state.profile.xp = 125;

        let events = game.sign_in(account("drnew", Profile::starting()));
        assert!(events.contains(&GameEvent::ProfileChanged));
        assert_eq!(game.state().profile.xp, 125);
        assert_eq!(game.state().session_user().unwrap().profile.coins, 180);
    }

    #[test]
    fn test_guest_progress_ignored_for_played_account() {
        let mut game = ClinicGame::new();
        game.sign_in(guest());
        game.state.profile.xp = 125;

        let mut veteran = Profile::starting();
        veteran.xp = 900;
        game.sign_in(account("drold", veteran));
        assert_eq!(game.state().profile.xp, 900);
    }

    #[test]
    fn test_sign_out_resets_everything() {
        let mut game = game_with_case(0);
        game.choose("c1").unwrap();
        game.set_view(GameView::Shop);

        assert_eq!(game.sign_out(), vec![GameEvent::SignedOut]);
        assert_eq!(game.state(), &GameState::default());
    }
}
