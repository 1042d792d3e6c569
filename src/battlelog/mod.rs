pub mod client;

pub use client::BattleLogClient;
