pub mod case_validation;
pub mod catalog;
pub mod game_events;
pub mod game_state;
pub mod minigame;
pub mod ranks;
pub mod scoring;
pub mod shop;

// Re-export main components
pub use case_validation::*;
pub use catalog::*;
pub use game_events::*;
pub use game_state::*;
pub use minigame::*;
pub use ranks::*;
pub use scoring::*;
pub use shop::*;
