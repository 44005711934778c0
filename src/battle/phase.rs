//! Battle phases and the inputs that drive them

use serde::{Deserialize, Serialize};

use crate::battle::strategy::StrategySelection;
use crate::battle::timers::TimerToken;
use crate::core::types::{CharacterId, TeamSide};
use crate::psych::coaching::{CoachingExchange, CoachingRequest};

/// Battle state machine phases
///
/// `PreBattle -> Huddle -> StrategySelection -> RoundCombat -> RoundEnd ->
/// (StrategySelection | BattleEnd)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    #[default]
    PreBattle,
    Huddle,
    StrategySelection,
    RoundCombat,
    RoundEnd,
    BattleEnd,
}

impl BattlePhase {
    pub fn is_terminal(self) -> bool {
        self == BattlePhase::BattleEnd
    }

    /// Phases in which the coach may talk to a fighter
    pub fn allows_coaching(self) -> bool {
        matches!(self, BattlePhase::Huddle | BattlePhase::StrategySelection)
    }
}

/// Everything that can advance a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleInput {
    StartBattle,
    /// Open a coaching window for one fighter; it times out if not completed
    BeginCoaching { character_id: CharacterId },
    Coach {
        request: CoachingRequest,
        #[serde(default)]
        exchange: Option<CoachingExchange>,
    },
    EndHuddle,
    SelectStrategy {
        side: TeamSide,
        selection: StrategySelection,
    },
    /// Close the selection window early
    Proceed,
    TimerExpired { token: TimerToken },
    ResolveRound,
    FinishRound,
}

impl BattleInput {
    /// Short name for logs and transition errors
    pub fn name(&self) -> &'static str {
        match self {
            BattleInput::StartBattle => "start_battle",
            BattleInput::BeginCoaching { .. } => "begin_coaching",
            BattleInput::Coach { .. } => "coach",
            BattleInput::EndHuddle => "end_huddle",
            BattleInput::SelectStrategy { .. } => "select_strategy",
            BattleInput::Proceed => "proceed",
            BattleInput::TimerExpired { .. } => "timer_expired",
            BattleInput::ResolveRound => "resolve_round",
            BattleInput::FinishRound => "finish_round",
        }
    }
}
