mod codec;
pub mod error;
pub mod repository;
pub mod types;

pub use error::GameError;
pub use repository::{player_key, GameStateRepository};
pub use types::{PlayerState, PlayerStateUpdate};
