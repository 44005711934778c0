//! Battle system - round-based duels adjudicated through psychology
//!
//! A battle is a `BattleSession` stepped by inputs:
//! - Phases run PreBattle -> Huddle -> StrategySelection -> RoundCombat -> RoundEnd
//! - Every action passes adherence, obedience, then scripted or rogue resolution
//! - Timers are requested as events and delivered back as inputs
//! - `BattleRegistry` keeps many battles apart and owns the timer queue

pub mod constants;
pub mod events;
pub mod fighter;
pub mod outcome;
pub mod phase;
pub mod record;
pub mod registry;
pub mod roster;
pub mod round;
pub mod session;
pub mod side;
pub mod strategy;
pub mod timers;

// Re-exports for convenient access
pub use constants::*;
pub use events::{BattleEvent, GameplanAdherenceEvent};
pub use fighter::{Ability, AbilityCategory, AbilityEffect, CombatStats, Fighter};
pub use outcome::{check_battle_end, BattleOutcome, EndReason};
pub use phase::{BattleInput, BattlePhase};
pub use record::{ActionKind, BattleLog, CombatRoundRecord};
pub use registry::{BattleEvents, BattleRegistry};
pub use roster::{load_roster, parse_roster, Roster};
pub use round::{planned_ability, RoundResolution, RoundResolver};
pub use session::{BattleReport, BattleSession, BattleSetup, BattleState, ChemistryChange, SideView};
pub use side::{Arena, BattleSide, TeamEntry};
pub use strategy::{resolve_strategy, ResolvedStrategy, StrategySelection};
pub use timers::{TimerKind, TimerQueue, TimerToken};
