pub mod config;
pub mod dice;
pub mod error;
pub mod types;

pub use config::{load_config, EngineConfig};
pub use dice::{Dice, ScriptedDice};
pub use error::{ArenaError, Result};
pub use types::{BattleId, CharacterId, MatchResult, Round, TeamSide};
