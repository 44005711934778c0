//! Resolution of a single combat round
//!
//! Turn order is speed plus a uniform initiative roll. Each actor in turn is
//! scored for adherence, rolls obedience, and then either executes the
//! coach's ability or hands control to the rogue judge. Every HP and psych
//! change is clamped where it is applied.

use ordered_float::OrderedFloat;
use std::cmp::Reverse;

use crate::battle::constants::*;
use crate::battle::events::GameplanAdherenceEvent;
use crate::battle::fighter::{Ability, AbilityEffect};
use crate::battle::record::{ActionKind, CombatRoundRecord};
use crate::battle::side::{Arena, BattleSide};
use crate::battle::strategy::ResolvedStrategy;
use crate::core::config::EngineConfig;
use crate::core::dice::Dice;
use crate::core::types::{BattleId, Round, TeamSide};
use crate::psych::adherence::{AdherenceEvaluator, AdherenceReport, RoundContext};
use crate::psych::obedience::{ObedienceArbiter, ObedienceInput};
use crate::psych::profile::PsychStat;
use crate::psych::rogue::{BattleTrend, RogueActionJudge, RogueContext, RogueFacts};
use crate::team::morale::MoraleCause;
use crate::team::relationships::{RelationshipGraph, DAMAGE_BONUS_MODIFIER};

/// Everything one round produced
#[derive(Debug, Clone, Default)]
pub struct RoundResolution {
    pub turn_order: Vec<TeamSide>,
    pub records: Vec<CombatRoundRecord>,
    pub alerts: Vec<GameplanAdherenceEvent>,
    pub rogue_facts: Vec<RogueFacts>,
}

/// Ability executed on a scripted turn: the Special pick replaces the attack
/// every `special_every` rounds unless it is a no-op
pub fn planned_ability(strategy: &ResolvedStrategy, round: Round, special_every: u32) -> &Ability {
    if special_every > 0 && round % special_every == 0 && !strategy.special.is_noop() {
        &strategy.special
    } else {
        &strategy.attack
    }
}

/// What an action did before it is written into a record
struct ActionOutcome {
    kind: ActionKind,
    ability: Option<String>,
    rogue_action: Option<crate::psych::rogue::RogueAction>,
    damage: f64,
    self_damage: f64,
    healing: f64,
    critical: bool,
    morale_impact: f64,
    cause: MoraleCause,
    narrative: String,
}

pub struct RoundResolver<'a> {
    config: &'a EngineConfig,
    adherence: AdherenceEvaluator,
    obedience: ObedienceArbiter,
    judge: RogueActionJudge,
}

impl<'a> RoundResolver<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            adherence: AdherenceEvaluator::new(config.adherence.clone()),
            obedience: ObedienceArbiter::new(config.obedience.clone()),
            judge: RogueActionJudge::new(),
        }
    }

    /// Sides sorted by `speed + uniform(0, jitter)`, highest first; ties go to Home
    pub fn turn_order(&self, arena: &Arena, dice: &mut impl Dice) -> Vec<TeamSide> {
        let jitter = self.config.battle.initiative_jitter;
        let mut order: Vec<(TeamSide, f64)> = TeamSide::both()
            .into_iter()
            .map(|side| {
                let initiative = arena.side(side).fighter.stats.speed + dice.uniform(0.0, jitter);
                (side, initiative)
            })
            .collect();
        order.sort_by_key(|(_, initiative)| Reverse(OrderedFloat(*initiative)));
        order.into_iter().map(|(side, _)| side).collect()
    }

    pub fn resolve(
        &self,
        battle_id: BattleId,
        round: Round,
        arena: &mut Arena,
        graph: &RelationshipGraph,
        dice: &mut impl Dice,
    ) -> RoundResolution {
        let mut out = RoundResolution {
            turn_order: self.turn_order(arena, dice),
            ..Default::default()
        };

        for actor in out.turn_order.clone() {
            if arena.any_down() {
                break;
            }
            self.act(battle_id, round, actor, arena, graph, dice, &mut out);
        }

        for side in TeamSide::both() {
            let state = arena.side_mut(side);
            if !state.fighter.is_down() {
                state.rounds_survived += 1;
            }
        }

        out
    }

    #[allow(clippy::too_many_arguments)]
    fn act(
        &self,
        battle_id: BattleId,
        round: Round,
        actor_side: TeamSide,
        arena: &mut Arena,
        graph: &RelationshipGraph,
        dice: &mut impl Dice,
        out: &mut RoundResolution,
    ) {
        let injury_threshold = self.config.battle.injury_threshold;
        let (actor, opponent) = arena.pair_mut(actor_side);

        let is_injured = actor.fighter.is_injured(injury_threshold);
        let context = RoundContext {
            is_last_round_rogue: actor.last_round_rogue,
            is_injured,
        };
        let report = self.adherence.evaluate(&actor.fighter.profile, context, dice);
        if let Some(alert) = GameplanAdherenceEvent::from_report(battle_id, round, &actor.fighter.id, &report) {
            out.alerts.push(alert);
        }

        let decision = self.obedience.decide(
            ObedienceInput {
                adherence: &report,
                team_morale: actor.morale.current(),
                is_injured,
                last_round_was_rogue: actor.last_round_rogue,
            },
            dice,
        );

        let outcome = if decision.will_obey {
            self.scripted(round, actor, opponent, graph, dice)
        } else {
            let (outcome, facts) = self.rogue(actor, opponent, &report, dice);
            out.rogue_facts.push(facts);
            outcome
        };
        actor.last_round_rogue = !decision.will_obey;

        let applied = actor.morale.apply(round, outcome.morale_impact, outcome.cause.clone());
        for side in [&mut *actor, &mut *opponent] {
            if side.fighter.is_down() {
                let fighter = side.fighter.id.clone();
                side.morale.apply(round, KNOCKOUT_MORALE, MoraleCause::Knockout { fighter });
            }
        }

        let record = CombatRoundRecord {
            round,
            attacker_id: actor.fighter.id.clone(),
            defender_id: opponent.fighter.id.clone(),
            action_kind: outcome.kind,
            ability: outcome.ability,
            rogue_action: outcome.rogue_action,
            damage: outcome.damage,
            self_damage: outcome.self_damage,
            healing: outcome.healing,
            critical: outcome.critical,
            morale_impact: applied,
            narrative: outcome.narrative,
            new_attacker_hp: actor.fighter.hp(),
            new_defender_hp: opponent.fighter.hp(),
            adherence_score: report.score,
            obedience_probability: decision.probability,
        };

        tracing::debug!(
            round,
            attacker = %record.attacker_id,
            kind = ?record.action_kind,
            damage = record.damage,
            defender_hp = record.new_defender_hp,
            "Action resolved"
        );

        out.records.push(record);
    }

    fn scripted(
        &self,
        round: Round,
        actor: &mut BattleSide,
        opponent: &mut BattleSide,
        graph: &RelationshipGraph,
        dice: &mut impl Dice,
    ) -> ActionOutcome {
        let ability = match &actor.strategy {
            Some(strategy) => planned_ability(strategy, round, self.config.battle.special_every).clone(),
            None => {
                tracing::warn!(fighter = %actor.fighter.id, "No resolved strategy, substituting Focus");
                Ability::focus()
            }
        };
        let mitigation = opponent
            .strategy
            .as_ref()
            .map(|s| s.defense.mitigation())
            .unwrap_or(0.0);

        let actor_name = actor.fighter.name.clone();
        let cause = MoraleCause::ScriptedAction {
            actor: actor.fighter.id.clone(),
        };
        let mut outcome = ActionOutcome {
            kind: ActionKind::Scripted,
            ability: Some(ability.name.clone()),
            rogue_action: None,
            damage: 0.0,
            self_damage: 0.0,
            healing: 0.0,
            critical: false,
            morale_impact: 0.0,
            cause,
            narrative: String::new(),
        };

        match ability.effect {
            AbilityEffect::Damage { power } => {
                let stats = actor.fighter.stats;
                let raw = (stats.attack * power - opponent.fighter.stats.defense / 2.0).max(1.0);
                let bonus = graph.battle_modifier(&actor.fighter.id, &opponent.fighter.id, DAMAGE_BONUS_MODIFIER);
                let critical = dice.chance(stats.crit_chance);

                let mut amount = raw * (1.0 - mitigation) * (1.0 + bonus).max(0.0);
                if critical {
                    amount *= self.config.battle.crit_multiplier;
                }
                let dealt = opponent.fighter.take_damage(amount.round().max(1.0));

                outcome.damage = dealt;
                outcome.critical = critical;
                outcome.morale_impact = SCRIPTED_HIT_MORALE;
                outcome.narrative = format!(
                    "{} uses {} on {} for {:.0} damage.",
                    actor_name, ability.name, opponent.fighter.name, dealt
                );
                if critical {
                    outcome.morale_impact += CRITICAL_HIT_MORALE;
                    outcome.cause = MoraleCause::CriticalHit {
                        actor: actor.fighter.id.clone(),
                    };
                    outcome.narrative.push_str(" Critical hit!");
                    actor.fighter.profile.adjust(PsychStat::Ego, CRIT_EGO_GAIN);
                }
            }
            AbilityEffect::Heal { amount } => {
                let healed = actor.fighter.heal(amount);
                outcome.healing = healed;
                outcome.morale_impact = HEAL_MORALE;
                outcome.narrative = format!("{} uses {} and recovers {:.0} HP.", actor_name, ability.name, healed);
            }
            AbilityEffect::Guard { .. } => {
                outcome.morale_impact = GUARD_MORALE;
                outcome.narrative = format!("{} braces behind {}.", actor_name, ability.name);
            }
            AbilityEffect::Focus => {
                actor.fighter.profile.adjust(PsychStat::BattleFocus, FOCUS_ACTION_GAIN);
                outcome.narrative = format!("{} takes a moment to focus.", actor_name);
            }
        }

        actor.fighter.profile.adjust(PsychStat::BattleFocus, OBEDIENT_FOCUS_GAIN);
        opponent
            .fighter
            .profile
            .adjust(PsychStat::Stress, outcome.damage * STRESS_PER_DAMAGE);

        outcome
    }

    fn rogue(
        &self,
        actor: &mut BattleSide,
        opponent: &mut BattleSide,
        report: &AdherenceReport,
        dice: &mut impl Dice,
    ) -> (ActionOutcome, RogueFacts) {
        let verdict = {
            let ctx = RogueContext {
                actor_id: &actor.fighter.id,
                actor_name: &actor.fighter.name,
                actor_attack: actor.fighter.stats.attack,
                profile: &actor.fighter.profile,
                tier: report.tier,
                opponent_id: &opponent.fighter.id,
                opponent_name: &opponent.fighter.name,
                opponent_defense: opponent.fighter.stats.defense,
                team_morale: actor.morale.current(),
                trend: BattleTrend::from_morale(actor.morale.current(), opponent.morale.current()),
            };
            self.judge.judge(&ctx, dice)
        };

        let dealt = opponent.fighter.take_damage(verdict.ruling.target_damage);
        let self_damage = actor.fighter.take_damage(verdict.ruling.damage);

        let profile = &mut actor.fighter.profile;
        profile.adjust(PsychStat::TeamTrust, ROGUE_TRUST_LOSS);
        profile.adjust(PsychStat::Stress, ROGUE_STRESS_GAIN + self_damage * STRESS_PER_DAMAGE);
        opponent
            .fighter
            .profile
            .adjust(PsychStat::Stress, dealt * STRESS_PER_DAMAGE);

        let outcome = ActionOutcome {
            kind: ActionKind::Rogue,
            ability: None,
            rogue_action: Some(verdict.action),
            damage: dealt,
            self_damage,
            healing: 0.0,
            critical: false,
            morale_impact: verdict.ruling.morale_change,
            cause: MoraleCause::RogueAction {
                actor: actor.fighter.id.clone(),
                action: verdict.action,
            },
            narrative: verdict.ruling.narrative_description,
        };
        (outcome, verdict.facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::fighter::{AbilityCategory, CombatStats, Fighter};
    use crate::battle::side::TeamEntry;
    use crate::battle::strategy::{resolve_strategy, StrategySelection};
    use crate::core::dice::ScriptedDice;
    use crate::team::chemistry::TeamChemistry;
    use crate::team::relationships::{BondCounts, RelationshipEdge, RelationshipType};

    fn fighter(name: &str, speed: f64, attack: f64, max_hp: f64) -> Fighter {
        Fighter::new(
            name,
            max_hp,
            CombatStats {
                attack,
                defense: 10.0,
                speed,
                crit_chance: 0.1,
            },
        )
        .with_ability(Ability::new(
            "Strike",
            AbilityCategory::Attack,
            AbilityEffect::Damage { power: 1.0 },
        ))
    }

    fn side(team_side: TeamSide, fighter: Fighter) -> BattleSide {
        let mut side = BattleSide::new(
            team_side,
            TeamEntry::new("team", fighter),
            50.0,
            TeamChemistry::from_value(50.0, BondCounts::default()),
        );
        side.strategy = Some(resolve_strategy(
            &side.fighter,
            &StrategySelection::default(),
            &mut ScriptedDice::new(),
        ));
        side
    }

    fn arena(home: Fighter, away: Fighter) -> Arena {
        Arena {
            home: side(TeamSide::Home, home),
            away: side(TeamSide::Away, away),
        }
    }

    #[test]
    fn test_faster_side_acts_first_and_ties_go_home() {
        let config = EngineConfig::default();
        let resolver = RoundResolver::new(&config);

        let a = arena(fighter("Slow", 5.0, 20.0, 100.0), fighter("Fast", 30.0, 20.0, 100.0));
        assert_eq!(resolver.turn_order(&a, &mut ScriptedDice::new()), vec![TeamSide::Away, TeamSide::Home]);

        let tied = arena(fighter("A", 10.0, 20.0, 100.0), fighter("B", 10.0, 20.0, 100.0));
        assert_eq!(resolver.turn_order(&tied, &mut ScriptedDice::new()), vec![TeamSide::Home, TeamSide::Away]);
    }

    #[test]
    fn test_scripted_exchange() {
        let config = EngineConfig::default();
        let resolver = RoundResolver::new(&config);
        let mut a = arena(fighter("Achilles", 20.0, 30.0, 100.0), fighter("Hector", 10.0, 20.0, 100.0));
        // obey, no crit, obey, no crit
        let mut dice = ScriptedDice::pessimistic().with_outcomes([true, false, true, false]);

        let res = resolver.resolve(BattleId::new(), 1, &mut a, &RelationshipGraph::new(), &mut dice);

        assert_eq!(res.records.len(), 2);
        assert_eq!(res.records[0].attacker_id.as_str(), "achilles");
        assert_eq!(res.records[0].damage, 25.0);
        assert_eq!(res.records[1].damage, 15.0);
        assert_eq!(a.away.fighter.hp(), 75.0);
        assert_eq!(a.home.fighter.hp(), 85.0);
        assert_eq!(res.records[1].new_defender_hp, 85.0);
        assert_eq!(a.home.morale.current(), 53.0);
        assert_eq!(a.home.rounds_survived, 1);
        // stress 30 + 25 * 0.1
        assert!((a.away.fighter.profile.stress() - 32.5).abs() < 1e-9);
    }

    #[test]
    fn test_critical_hit_multiplies() {
        let config = EngineConfig::default();
        let resolver = RoundResolver::new(&config);
        let mut a = arena(fighter("Achilles", 20.0, 30.0, 100.0), fighter("Hector", 10.0, 20.0, 100.0));
        let mut dice = ScriptedDice::pessimistic().with_outcomes([true, true, true, false]);

        let res = resolver.resolve(BattleId::new(), 1, &mut a, &RelationshipGraph::new(), &mut dice);
        assert!(res.records[0].critical);
        // 25 * 1.5 rounded
        assert_eq!(res.records[0].damage, 38.0);
        assert_eq!(a.home.morale.current(), 58.0);
    }

    #[test]
    fn test_relationship_damage_bonus() {
        let config = EngineConfig::default();
        let resolver = RoundResolver::new(&config);
        let mut a = arena(fighter("Achilles", 20.0, 30.0, 100.0), fighter("Hector", 10.0, 20.0, 100.0));
        let graph = RelationshipGraph::from_edges([RelationshipEdge::new(
            "Achilles",
            "Hector",
            RelationshipType::Enemy,
            -90.0,
        )
        .with_modifier(DAMAGE_BONUS_MODIFIER, 0.2)]);
        let mut dice = ScriptedDice::pessimistic().with_outcomes([true, false, true, false]);

        let res = resolver.resolve(BattleId::new(), 1, &mut a, &graph, &mut dice);
        assert_eq!(res.records[0].damage, 30.0);
        assert_eq!(res.records[1].damage, 15.0);
    }

    #[test]
    fn test_special_replaces_attack_every_third_round() {
        let config = EngineConfig::default();
        let resolver = RoundResolver::new(&config);
        let home = fighter("Achilles", 20.0, 30.0, 200.0).with_ability(Ability::new(
            "Heel Strike",
            AbilityCategory::Special,
            AbilityEffect::Damage { power: 2.0 },
        ));
        let mut a = arena(home, fighter("Hector", 10.0, 20.0, 200.0));

        let mut dice = ScriptedDice::pessimistic().with_outcomes([true, false, true, false]);
        let res = resolver.resolve(BattleId::new(), 2, &mut a, &RelationshipGraph::new(), &mut dice);
        assert_eq!(res.records[0].ability.as_deref(), Some("Strike"));

        let mut dice = ScriptedDice::pessimistic().with_outcomes([true, false, true, false]);
        let res = resolver.resolve(BattleId::new(), 3, &mut a, &RelationshipGraph::new(), &mut dice);
        assert_eq!(res.records[0].ability.as_deref(), Some("Heel Strike"));
        assert_eq!(res.records[0].damage, 55.0);
    }

    #[test]
    fn test_guard_mitigates_incoming() {
        let config = EngineConfig::default();
        let resolver = RoundResolver::new(&config);
        let away = fighter("Hector", 10.0, 20.0, 100.0).with_ability(Ability::new(
            "Shield Wall",
            AbilityCategory::Defense,
            AbilityEffect::Guard { mitigation: 0.4 },
        ));
        let mut a = arena(fighter("Achilles", 20.0, 30.0, 100.0), away);
        let mut dice = ScriptedDice::pessimistic().with_outcomes([true, false, true, false]);

        let res = resolver.resolve(BattleId::new(), 1, &mut a, &RelationshipGraph::new(), &mut dice);
        // 25 * 0.6
        assert_eq!(res.records[0].damage, 15.0);
    }

    #[test]
    fn test_knockout_stops_round() {
        let config = EngineConfig::default();
        let resolver = RoundResolver::new(&config);
        let mut a = arena(fighter("Achilles", 20.0, 30.0, 100.0), fighter("Hector", 10.0, 20.0, 20.0));
        let mut dice = ScriptedDice::pessimistic().with_outcomes([true, false]);

        let res = resolver.resolve(BattleId::new(), 1, &mut a, &RelationshipGraph::new(), &mut dice);
        assert_eq!(res.records.len(), 1);
        assert_eq!(a.away.fighter.hp(), 0.0);
        assert_eq!(a.away.rounds_survived, 0);
        assert!(a
            .away
            .morale
            .history()
            .iter()
            .any(|e| matches!(e.cause, MoraleCause::Knockout { .. })));
    }

    #[test]
    fn test_disobedience_goes_to_judge() {
        let config = EngineConfig::default();
        let resolver = RoundResolver::new(&config);
        let mut a = arena(fighter("Achilles", 20.0, 30.0, 100.0), fighter("Hector", 10.0, 20.0, 100.0));
        // home disobeys, away obeys without crit
        let mut dice = ScriptedDice::pessimistic().with_outcomes([false, true, false]);
        let trust_before = a.home.fighter.profile.team_trust();

        let res = resolver.resolve(BattleId::new(), 1, &mut a, &RelationshipGraph::new(), &mut dice);
        assert!(res.records[0].is_rogue());
        assert!(res.records[0].rogue_action.is_some());
        assert_eq!(res.rogue_facts.len(), 1);
        assert!(a.home.last_round_rogue);
        assert!(!a.away.last_round_rogue);
        assert_eq!(a.home.fighter.profile.team_trust(), trust_before - 3.0);
        // Default profile scores 67.5: hesitant, so both actors raise an alert
        assert_eq!(res.alerts.len(), 2);
    }

    #[test]
    fn test_fighter_without_abilities_focuses() {
        let config = EngineConfig::default();
        let resolver = RoundResolver::new(&config);
        let blank = Fighter::new("Blank", 100.0, CombatStats { speed: 50.0, ..CombatStats::default() });
        let mut a = arena(blank, fighter("Hector", 10.0, 20.0, 100.0));
        let mut dice = ScriptedDice::pessimistic().with_outcomes([true, true, false]);

        let res = resolver.resolve(BattleId::new(), 1, &mut a, &RelationshipGraph::new(), &mut dice);
        assert_eq!(res.records[0].ability.as_deref(), Some("Focus"));
        assert_eq!(res.records[0].damage, 0.0);
        assert_eq!(res.records.len(), 2);
    }
}
