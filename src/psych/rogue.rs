//! Rogue action adjudication
//!
//! When a character ignores the coach, the judge decides what they do instead
//! and rules on the consequences. It produces structured facts only; turning
//! them into coach/character dialogue is the narrator's job.

use serde::{Deserialize, Serialize};

use crate::core::dice::Dice;
use crate::core::types::CharacterId;
use crate::psych::adherence::AdherenceTier;
use crate::psych::profile::PsychProfile;

/// How the fight is going for the acting character's team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleTrend {
    Winning,
    Losing,
}

impl BattleTrend {
    /// Winning when own morale is at least the opponent's
    pub fn from_morale(own: f64, opponent: f64) -> Self {
        if own >= opponent {
            BattleTrend::Winning
        } else {
            BattleTrend::Losing
        }
    }
}

/// The deviation a character commits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RogueAction {
    /// Freezes or flees; nothing lands
    Panic,
    /// Lashes out wildly and hurts their own side
    FriendlyFire,
    /// Reckless all-in attack that costs the attacker too
    Overcommit,
    /// Flatly refuses the order and does nothing
    Refusal,
}

impl RogueAction {
    pub fn all() -> &'static [RogueAction] {
        &[
            RogueAction::Panic,
            RogueAction::FriendlyFire,
            RogueAction::Overcommit,
            RogueAction::Refusal,
        ]
    }
}

/// Consequences of a rogue action
///
/// `damage` lands on the acting character's side, `target_damage` on the opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeRuling {
    pub damage: f64,
    pub target_damage: f64,
    pub morale_change: f64,
    pub narrative_description: String,
}

/// What the judge needs to know about the round
#[derive(Debug, Clone)]
pub struct RogueContext<'a> {
    pub actor_id: &'a CharacterId,
    pub actor_name: &'a str,
    pub actor_attack: f64,
    pub profile: &'a PsychProfile,
    pub tier: AdherenceTier,
    pub opponent_id: &'a CharacterId,
    pub opponent_name: &'a str,
    pub opponent_defense: f64,
    pub team_morale: f64,
    pub trend: BattleTrend,
}

/// Facts handed to the dialogue collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RogueFacts {
    pub actor: CharacterId,
    pub opponent: CharacterId,
    pub action: RogueAction,
    pub tier: AdherenceTier,
    pub trend: BattleTrend,
    pub damage: f64,
    pub target_damage: f64,
    pub morale_change: f64,
}

/// Action plus ruling plus dialogue facts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RogueVerdict {
    pub action: RogueAction,
    pub ruling: JudgeRuling,
    pub facts: RogueFacts,
}

/// Team morale below which despair feeds Panic and Refusal
const MORALE_DESPAIR_LINE: f64 = 50.0;

#[derive(Debug, Clone, Default)]
pub struct RogueActionJudge;

impl RogueActionJudge {
    pub fn new() -> Self {
        Self
    }

    /// Pick the deviation and rule on it
    pub fn judge(&self, ctx: &RogueContext<'_>, dice: &mut impl Dice) -> RogueVerdict {
        let action = self.choose_action(ctx, dice);
        let ruling = self.rule(action, ctx);

        tracing::debug!(
            actor = %ctx.actor_id,
            ?action,
            damage = ruling.damage,
            target_damage = ruling.target_damage,
            morale = ruling.morale_change,
            "Rogue ruling"
        );

        let facts = RogueFacts {
            actor: ctx.actor_id.clone(),
            opponent: ctx.opponent_id.clone(),
            action,
            tier: ctx.tier,
            trend: ctx.trend,
            damage: ruling.damage,
            target_damage: ruling.target_damage,
            morale_change: ruling.morale_change,
        };

        RogueVerdict {
            action,
            ruling,
            facts,
        }
    }

    /// Relative likelihood of each deviation given the profile, team morale and the trend
    ///
    /// Morale below `MORALE_DESPAIR_LINE` pushes toward Panic and Refusal.
    pub fn weights(&self, ctx: &RogueContext<'_>) -> [(RogueAction, f64); 4] {
        let p = ctx.profile;
        let losing = ctx.trend == BattleTrend::Losing;
        let off_script = ctx.tier == AdherenceTier::CompletelyOffScript;
        // 0 at or above the line, 1 at zero morale
        let despair = (MORALE_DESPAIR_LINE - ctx.team_morale).clamp(0.0, MORALE_DESPAIR_LINE) / MORALE_DESPAIR_LINE;

        let mut panic = p.stress() / 100.0 * if losing { 1.5 } else { 1.0 } + despair * 0.4;
        if off_script {
            panic += 0.3;
        }

        let friendly_fire = if p.team_trust() < 50.0 {
            (100.0 - p.team_trust()) / 100.0 * 0.8
        } else {
            0.1
        };

        let overcommit = p.ego() / 100.0 * if losing { 1.0 } else { 1.5 };

        let refusal = (100.0 - p.communication()) / 100.0 * 0.6
            + (100.0 - p.mental_health()) / 200.0
            + despair * 0.3;

        [
            (RogueAction::Panic, panic.max(0.01)),
            (RogueAction::FriendlyFire, friendly_fire.max(0.01)),
            (RogueAction::Overcommit, overcommit.max(0.01)),
            (RogueAction::Refusal, refusal.max(0.01)),
        ]
    }

    fn choose_action(&self, ctx: &RogueContext<'_>, dice: &mut impl Dice) -> RogueAction {
        let weights = self.weights(ctx);
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        let mut roll = dice.uniform(0.0, total);
        for (action, weight) in weights {
            if roll < weight {
                return action;
            }
            roll -= weight;
        }
        weights[weights.len() - 1].0
    }

    /// Mechanical consequences of a deviation
    pub fn rule(&self, action: RogueAction, ctx: &RogueContext<'_>) -> JudgeRuling {
        let attack = ctx.actor_attack.max(0.0);
        let winning = ctx.trend == BattleTrend::Winning;

        let (damage, target_damage, morale_change, narrative_description) = match action {
            RogueAction::Panic => (
                0.0,
                0.0,
                if winning { -8.0 } else { -12.0 },
                format!(
                    "{} panics and abandons the plan, backing away from {}.",
                    ctx.actor_name, ctx.opponent_name
                ),
            ),
            RogueAction::FriendlyFire => (
                (attack * 0.5).round(),
                0.0,
                -15.0,
                format!(
                    "{} lashes out blindly and the blow lands on their own side.",
                    ctx.actor_name
                ),
            ),
            RogueAction::Overcommit => (
                (attack * 0.4).round(),
                (attack * 1.6 - ctx.opponent_defense / 2.0).max(1.0).round(),
                if winning { 8.0 } else { -4.0 },
                format!(
                    "{} ignores the gameplan and throws everything at {}.",
                    ctx.actor_name, ctx.opponent_name
                ),
            ),
            RogueAction::Refusal => (
                0.0,
                0.0,
                -6.0,
                format!("{} refuses the order and stands their ground.", ctx.actor_name),
            ),
        };

        JudgeRuling {
            damage: damage.max(0.0),
            target_damage: target_damage.max(0.0),
            morale_change: f64::clamp(morale_change, -100.0, 100.0),
            narrative_description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dice::ScriptedDice;
    use crate::psych::profile::PsychStat;

    fn ctx<'a>(
        actor: &'a CharacterId,
        opponent: &'a CharacterId,
        profile: &'a PsychProfile,
        trend: BattleTrend,
    ) -> RogueContext<'a> {
        RogueContext {
            actor_id: actor,
            actor_name: "Achilles",
            actor_attack: 40.0,
            profile,
            tier: AdherenceTier::GoingRogue,
            opponent_id: opponent,
            opponent_name: "Hector",
            opponent_defense: 20.0,
            team_morale: 50.0,
            trend,
        }
    }

    #[test]
    fn test_rulings_never_negative() {
        let actor = CharacterId::canonical("Achilles");
        let opponent = CharacterId::canonical("Hector");
        let profile = PsychProfile::new();
        let judge = RogueActionJudge::new();
        for trend in [BattleTrend::Winning, BattleTrend::Losing] {
            let c = ctx(&actor, &opponent, &profile, trend);
            for action in RogueAction::all() {
                let ruling = judge.rule(*action, &c);
                assert!(ruling.damage >= 0.0);
                assert!(ruling.target_damage >= 0.0);
                assert!((-100.0..=100.0).contains(&ruling.morale_change));
                assert!(!ruling.narrative_description.is_empty());
            }
        }
    }

    #[test]
    fn test_overcommit_hits_both_sides() {
        let actor = CharacterId::canonical("Achilles");
        let opponent = CharacterId::canonical("Hector");
        let profile = PsychProfile::new();
        let c = ctx(&actor, &opponent, &profile, BattleTrend::Winning);
        let ruling = RogueActionJudge::new().rule(RogueAction::Overcommit, &c);
        assert_eq!(ruling.target_damage, 54.0); // 40*1.6 - 20/2
        assert_eq!(ruling.damage, 16.0);
        assert_eq!(ruling.morale_change, 8.0);
    }

    #[test]
    fn test_stressed_loser_leans_to_panic() {
        let actor = CharacterId::canonical("Achilles");
        let opponent = CharacterId::canonical("Hector");
        let profile = PsychProfile::new()
            .with(PsychStat::Stress, 100.0)
            .with(PsychStat::Ego, 0.0)
            .with(PsychStat::TeamTrust, 100.0)
            .with(PsychStat::Communication, 100.0)
            .with(PsychStat::MentalHealth, 100.0);
        let c = ctx(&actor, &opponent, &profile, BattleTrend::Losing);
        let weights = RogueActionJudge::new().weights(&c);
        let panic = weights[0].1;
        assert!(weights.iter().skip(1).all(|(_, w)| *w < panic));

        // Low roll lands in the first bucket
        let mut dice = ScriptedDice::new().with_fractions([0.0]);
        let verdict = RogueActionJudge::new().judge(&c, &mut dice);
        assert_eq!(verdict.action, RogueAction::Panic);
        assert_eq!(verdict.facts.actor, actor);
    }

    #[test]
    fn test_low_morale_feeds_panic_and_refusal() {
        let actor = CharacterId::canonical("Achilles");
        let opponent = CharacterId::canonical("Hector");
        let profile = PsychProfile::new();
        let judge = RogueActionJudge::new();

        let steady = ctx(&actor, &opponent, &profile, BattleTrend::Winning);
        let mut broken = steady.clone();
        broken.team_morale = 0.0;
        let mut buoyant = steady.clone();
        buoyant.team_morale = 90.0;

        let base = judge.weights(&steady);
        let low = judge.weights(&broken);
        assert!((low[0].1 - base[0].1 - 0.4).abs() < 1e-9);
        assert!((low[3].1 - base[3].1 - 0.3).abs() < 1e-9);
        assert_eq!(low[1], base[1]);
        assert_eq!(low[2], base[2]);
        assert_eq!(judge.weights(&buoyant), base);
    }

    #[test]
    fn test_trend_from_morale() {
        assert_eq!(BattleTrend::from_morale(50.0, 50.0), BattleTrend::Winning);
        assert_eq!(BattleTrend::from_morale(40.0, 50.0), BattleTrend::Losing);
    }
}
