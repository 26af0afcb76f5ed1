pub mod channel;
pub mod hub;
pub mod tally;

pub use channel::{RealtimeChannel, RealtimeError};
pub use hub::LeaderboardHub;
pub use tally::ConnectionTally;

#[cfg(test)]
mod tests;
