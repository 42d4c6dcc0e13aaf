pub mod bets;
pub mod cartelas;
pub mod events;
pub mod health;
pub mod metrics;
pub mod wallet;
