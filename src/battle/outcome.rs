//! Battle end detection

use serde::{Deserialize, Serialize};

use crate::battle::fighter::Fighter;
use crate::core::types::{MatchResult, Round, TeamSide};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "side", rename_all = "snake_case")]
pub enum BattleOutcome {
    Winner(TeamSide),
    Draw,
}

impl BattleOutcome {
    pub fn result_for(self, side: TeamSide) -> MatchResult {
        match self {
            BattleOutcome::Winner(winner) if winner == side => MatchResult::Victory,
            BattleOutcome::Winner(_) => MatchResult::Defeat,
            BattleOutcome::Draw => MatchResult::Draw,
        }
    }

    pub fn winner(self) -> Option<TeamSide> {
        match self {
            BattleOutcome::Winner(side) => Some(side),
            BattleOutcome::Draw => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Knockout,
    RoundCap,
}

/// Decide whether the battle is over after `round` has been resolved
///
/// A knockout is checked first. Both fighters down at once is a draw, so two
/// winners are impossible. Reaching the cap with both standing is a draw.
pub fn check_battle_end(
    home: &Fighter,
    away: &Fighter,
    round: Round,
    round_cap: Round,
) -> Option<(BattleOutcome, EndReason)> {
    match (home.is_down(), away.is_down()) {
        (true, true) => return Some((BattleOutcome::Draw, EndReason::Knockout)),
        (false, true) => return Some((BattleOutcome::Winner(TeamSide::Home), EndReason::Knockout)),
        (true, false) => return Some((BattleOutcome::Winner(TeamSide::Away), EndReason::Knockout)),
        (false, false) => {}
    }

    if round >= round_cap {
        return Some((BattleOutcome::Draw, EndReason::RoundCap));
    }

    None
}
