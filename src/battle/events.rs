//! Events emitted by a battle step

use serde::{Deserialize, Serialize};

use crate::battle::fighter::AbilityCategory;
use crate::battle::outcome::{BattleOutcome, EndReason};
use crate::battle::phase::BattlePhase;
use crate::battle::record::CombatRoundRecord;
use crate::battle::timers::TimerToken;
use crate::core::types::{BattleId, CharacterId, Round, TeamSide};
use crate::psych::adherence::{AdherenceReport, AdherenceTier};
use crate::psych::coaching::CoachingSession;
use crate::psych::rogue::RogueFacts;

/// Alert raised whenever a fighter is not firmly following the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameplanAdherenceEvent {
    pub battle_id: BattleId,
    pub round: Round,
    pub character_id: CharacterId,
    pub tier: AdherenceTier,
    pub score: f64,
    pub reasons: Vec<String>,
    pub consequences: Vec<String>,
}

impl GameplanAdherenceEvent {
    /// `None` when the fighter is following the plan
    pub fn from_report(
        battle_id: BattleId,
        round: Round,
        character_id: &CharacterId,
        report: &AdherenceReport,
    ) -> Option<Self> {
        if report.tier == AdherenceTier::FollowingPlan {
            return None;
        }
        Some(Self {
            battle_id,
            round,
            character_id: character_id.clone(),
            tier: report.tier,
            score: report.score,
            reasons: report.reasons(),
            consequences: report.tier.consequences().iter().map(|c| c.to_string()).collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEvent {
    PhaseChanged {
        from: BattlePhase,
        to: BattlePhase,
    },
    /// The driver should arm this timer
    TimerRequested {
        token: TimerToken,
        duration_ms: u64,
    },
    StrategyAccepted {
        side: TeamSide,
    },
    StrategyAutoFilled {
        side: TeamSide,
        categories: Vec<AbilityCategory>,
    },
    CoachingApplied {
        session: CoachingSession,
    },
    CoachingAbandoned {
        character_id: CharacterId,
    },
    RoundStarted {
        round: Round,
        turn_order: Vec<CharacterId>,
    },
    Action {
        record: CombatRoundRecord,
    },
    /// Structured facts for the dialogue collaborator
    RogueFacts {
        facts: RogueFacts,
    },
    AdherenceAlert {
        alert: GameplanAdherenceEvent,
    },
    RoundEnded {
        round: Round,
        home_morale: f64,
        away_morale: f64,
    },
    BattleEnded {
        outcome: BattleOutcome,
        reason: EndReason,
        rounds: Round,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psych::adherence::AdherenceFactor;

    fn report(score: f64) -> AdherenceReport {
        AdherenceReport {
            score,
            tier: AdherenceTier::from_score(score),
            jitter: 0.0,
            factors: vec![AdherenceFactor::HighStress],
        }
    }

    #[test]
    fn test_alert_only_when_off_plan() {
        let id = CharacterId::canonical("Tesla");
        assert!(GameplanAdherenceEvent::from_report(BattleId::new(), 1, &id, &report(85.0)).is_none());

        let alert = GameplanAdherenceEvent::from_report(BattleId::new(), 2, &id, &report(45.0))
            .expect("going rogue should alert");
        assert_eq!(alert.tier, AdherenceTier::GoingRogue);
        assert_eq!(alert.reasons.len(), 1);
        assert!(!alert.consequences.is_empty());
    }

    #[test]
    fn test_events_tagged_by_type() {
        let event = BattleEvent::RoundEnded {
            round: 3,
            home_morale: 55.0,
            away_morale: 40.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"round_ended\""));
    }
}
