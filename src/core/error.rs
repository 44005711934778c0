use thiserror::Error;

use crate::battle::phase::BattlePhase;
use crate::core::types::{BattleId, CharacterId};

#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("Battle not found: {0}")]
    BattleNotFound(BattleId),

    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),

    #[error("Input {input} is not valid during phase {phase:?}")]
    InvalidTransition { phase: BattlePhase, input: String },

    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),

    #[error("Dialogue error: {0}")]
    Dialogue(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ArenaError>;
