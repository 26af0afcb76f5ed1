pub mod cards;
pub mod game_state;
pub mod leaderboard;
pub mod realtime;
pub mod server;
pub mod store;
