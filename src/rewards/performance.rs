//! Per-character battle performance snapshot
//!
//! Computed once when the battle ends and handed read-only to the reward and
//! skill calculators.

use serde::{Deserialize, Serialize};

use crate::battle::record::{ActionKind, CombatRoundRecord};
use crate::core::types::{CharacterId, MatchResult, Round};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattlePerformance {
    pub character_id: CharacterId,
    pub level: u32,
    pub damage_dealt: f64,
    pub damage_taken: f64,
    pub healing_done: f64,
    pub critical_hits: u32,
    pub abilities_used: u32,
    pub rogue_actions: u32,
    pub rounds_survived: Round,
    pub result: MatchResult,
    pub is_victory: bool,
}

impl BattlePerformance {
    /// Aggregate the log from one character's point of view
    ///
    /// Focus actions do not count as ability use.
    pub fn from_records(
        character_id: &CharacterId,
        level: u32,
        records: &[CombatRoundRecord],
        rounds_survived: Round,
        result: MatchResult,
    ) -> Self {
        let mut perf = Self {
            character_id: character_id.clone(),
            level,
            damage_dealt: 0.0,
            damage_taken: 0.0,
            healing_done: 0.0,
            critical_hits: 0,
            abilities_used: 0,
            rogue_actions: 0,
            rounds_survived,
            result,
            is_victory: result.is_victory(),
        };

        for record in records {
            if &record.attacker_id == character_id {
                perf.damage_dealt += record.damage;
                perf.damage_taken += record.self_damage;
                perf.healing_done += record.healing;
                if record.critical {
                    perf.critical_hits += 1;
                }
                match record.action_kind {
                    ActionKind::Scripted => {
                        if record.ability.as_deref().is_some_and(|a| a != "Focus") {
                            perf.abilities_used += 1;
                        }
                    }
                    ActionKind::Rogue => perf.rogue_actions += 1,
                }
            }
            if &record.defender_id == character_id {
                perf.damage_taken += record.damage;
            }
        }

        perf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psych::rogue::RogueAction;

    fn record(attacker: &str, defender: &str, kind: ActionKind, damage: f64, self_damage: f64) -> CombatRoundRecord {
        CombatRoundRecord {
            round: 1,
            attacker_id: attacker.into(),
            defender_id: defender.into(),
            action_kind: kind,
            ability: (kind == ActionKind::Scripted).then(|| "Strike".to_string()),
            rogue_action: (kind == ActionKind::Rogue).then_some(RogueAction::Overcommit),
            damage,
            self_damage,
            healing: 0.0,
            critical: damage > 20.0,
            morale_impact: 0.0,
            narrative: String::new(),
            new_attacker_hp: 100.0,
            new_defender_hp: 100.0,
            adherence_score: 70.0,
            obedience_probability: 0.85,
        }
    }

    #[test]
    fn test_aggregates_both_directions() {
        let records = vec![
            record("a", "b", ActionKind::Scripted, 25.0, 0.0),
            record("b", "a", ActionKind::Scripted, 10.0, 0.0),
            record("a", "b", ActionKind::Rogue, 12.0, 4.0),
        ];
        let a = CharacterId::canonical("a");
        let perf = BattlePerformance::from_records(&a, 3, &records, 2, MatchResult::Victory);

        assert_eq!(perf.damage_dealt, 37.0);
        assert_eq!(perf.damage_taken, 14.0);
        assert_eq!(perf.critical_hits, 1);
        assert_eq!(perf.abilities_used, 1);
        assert_eq!(perf.rogue_actions, 1);
        assert!(perf.is_victory);
    }

    #[test]
    fn test_focus_not_counted_as_ability() {
        let mut focus = record("a", "b", ActionKind::Scripted, 0.0, 0.0);
        focus.ability = Some("Focus".into());
        let perf = BattlePerformance::from_records(&"a".into(), 1, &[focus], 1, MatchResult::Draw);
        assert_eq!(perf.abilities_used, 0);
        assert!(!perf.is_victory);
    }
}
