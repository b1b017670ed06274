pub mod case_repository;
pub mod stats_repository;
pub mod user_repository;

pub use case_repository::CaseRepository;
pub use stats_repository::StatsRepository;
pub use user_repository::{LeaderboardEntry, UserRepository};
