use clinic_types::GameStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reward {
    pub coins: u32,
    pub xp: u32,
    pub score: u32,
}

pub const CASE_COMPLETE_REWARD: Reward = Reward { coins: 50, xp: 100, score: 100 };
pub const STAGE_COMPLETE_REWARD: Reward = Reward { coins: 20, xp: 20, score: 20 };
/// Wrong answers still teach something.
pub const CONSOLATION_REWARD: Reward = Reward { coins: 0, xp: 25, score: 0 };

pub struct ScoringEngine;

impl ScoringEngine {
    /// Reward for one choice. The multiplier only applies to coins on correct answers.
    pub fn reward_for(is_correct: bool, is_final_stage: bool, coin_multiplier: f64) -> Reward {
        if !is_correct {
            return CONSOLATION_REWARD;
        }

        let base = if is_final_stage {
            CASE_COMPLETE_REWARD
        } else {
            STAGE_COMPLETE_REWARD
        };

        Reward {
            coins: (base.coins as f64 * coin_multiplier).floor() as u32,
            ..base
        }
    }

    pub fn status_after(is_correct: bool, is_final_stage: bool) -> GameStatus {
        match (is_correct, is_final_stage) {
            (false, _) => GameStatus::Failure,
            (true, true) => GameStatus::CaseSuccess,
            (true, false) => GameStatus::StageSuccess,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_stage_reward() {
        let reward = ScoringEngine::reward_for(true, true, 1.0);
        assert_eq!(reward, Reward { coins: 50, xp: 100, score: 100 });
    }

    #[test]
    fn test_intermediate_stage_reward() {
        let reward = ScoringEngine::reward_for(true, false, 1.0);
        assert_eq!(reward, Reward { coins: 20, xp: 20, score: 20 });
    }

    #[test]
    fn test_wrong_answer_consolation() {
        // Multiplier never applies to wrong answers
        let reward = ScoringEngine::reward_for(false, true, 1.5);
        assert_eq!(reward, Reward { coins: 0, xp: 25, score: 0 });
    }

    #[test]
    fn test_multiplier_floors_coins() {
        assert_eq!(ScoringEngine::reward_for(true, true, 1.5).coins, 75);
        assert_eq!(ScoringEngine::reward_for(true, false, 1.5).coins, 30);
        assert_eq!(ScoringEngine::reward_for(true, true, 1.33).coins, 66);
        // xp is unaffected
        assert_eq!(ScoringEngine::reward_for(true, true, 1.5).xp, 100);
    }

    #[test]
    fn test_status_after() {
        assert_eq!(ScoringEngine::status_after(true, true), GameStatus::CaseSuccess);
        assert_eq!(ScoringEngine::status_after(true, false), GameStatus::StageSuccess);
        assert_eq!(ScoringEngine::status_after(false, true), GameStatus::Failure);
        assert_eq!(ScoringEngine::status_after(false, false), GameStatus::Failure);
    }
}
