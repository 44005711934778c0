//! Rogue Arena - psychology-driven combat adjudication for a coached card battler

pub mod battle;
pub mod core;
pub mod narrative;
pub mod psych;
pub mod rewards;
pub mod team;
pub mod transport;
