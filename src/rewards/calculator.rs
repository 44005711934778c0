//! Post-battle rewards
//!
//! Everything here is a pure function of the performance snapshot and the
//! reward context. The single random element (the rare achievement roll) goes
//! through the injected [`Dice`], so pinning the dice pins the output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::config::BattleTuning;
use crate::core::dice::Dice;
use crate::core::types::{CharacterId, MatchResult, Round};
use crate::rewards::performance::BattlePerformance;

/// Chance of the rare achievement on a victory without another achievement
pub const RARE_ACHIEVEMENT_CHANCE: f64 = 0.05;

/// Crits needed for Critical Storm
const CRITICAL_STORM_HITS: u32 = 3;

/// Level gap considered by the level-difference multiplier
const MAX_LEVEL_GAP: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// Won without taking damage
    FlawlessVictory,
    /// Landed several critical hits in one battle
    CriticalStorm,
    /// Was still standing when the round cap hit
    IronSurvivor,
    /// Rare roll on a victory
    LegendaryMoment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusStat {
    Attack,
    Defense,
    Speed,
    MaxHp,
}

/// Inputs beyond the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardContext {
    pub opponent_level: u32,
    /// Premium membership scaling for xp and currency (1.0 for none)
    pub membership_multiplier: f64,
    /// Battle round cap; surviving to it earns Iron Survivor
    pub round_cap: Round,
}

impl Default for RewardContext {
    fn default() -> Self {
        Self {
            opponent_level: 1,
            membership_multiplier: 1.0,
            round_cap: BattleTuning::default().round_cap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRewards {
    pub character_id: CharacterId,
    pub xp_gained: u32,
    pub training_points: u32,
    pub currency: u32,
    pub bond_increase: f64,
    pub stat_bonuses: BTreeMap<BonusStat, u32>,
    pub achievement_unlocked: Option<Achievement>,
}

#[derive(Debug, Clone, Default)]
pub struct RewardCalculator;

impl RewardCalculator {
    pub fn new() -> Self {
        Self
    }

    /// XP scaling for fighting above or below one's level
    ///
    /// `1 + 0.1 * clamp(opponent - own, -5, 5)`
    pub fn level_multiplier(own_level: u32, opponent_level: u32) -> f64 {
        let gap = (opponent_level as i64 - own_level as i64).clamp(-MAX_LEVEL_GAP, MAX_LEVEL_GAP);
        1.0 + 0.1 * gap as f64
    }

    pub fn calculate(&self, perf: &BattlePerformance, ctx: RewardContext, dice: &mut impl Dice) -> BattleRewards {
        let membership = if ctx.membership_multiplier.is_finite() {
            ctx.membership_multiplier.max(0.0)
        } else {
            1.0
        };

        let base_xp = match perf.result {
            MatchResult::Victory => 100.0,
            MatchResult::Draw => 60.0,
            MatchResult::Defeat => 40.0,
        };
        let xp = (base_xp
            + perf.damage_dealt / 10.0
            + perf.critical_hits as f64 * 15.0
            + perf.rounds_survived as f64 * 5.0)
            * Self::level_multiplier(perf.level, ctx.opponent_level)
            * membership;

        let base_currency = match perf.result {
            MatchResult::Victory => 50.0,
            MatchResult::Draw => 30.0,
            MatchResult::Defeat => 15.0,
        };
        let currency = (base_currency + perf.damage_dealt / 20.0) * membership;

        let training_points = match perf.result {
            MatchResult::Victory => 3,
            MatchResult::Draw => 2,
            MatchResult::Defeat => 1,
        } + perf.abilities_used / 3;

        let bond_increase = match perf.result {
            MatchResult::Victory => 5.0,
            MatchResult::Draw => 2.0,
            MatchResult::Defeat => 1.0,
        } - perf.rogue_actions as f64 * 0.5;

        let achievement_unlocked = self.achievement(perf, ctx.round_cap, dice);

        BattleRewards {
            character_id: perf.character_id.clone(),
            xp_gained: xp.round().max(0.0) as u32,
            training_points,
            currency: currency.round().max(0.0) as u32,
            bond_increase: bond_increase.max(0.0),
            stat_bonuses: stat_bonuses(perf),
            achievement_unlocked,
        }
    }

    /// Deterministic achievements first; the rare roll only happens on a
    /// victory that earned none of them
    fn achievement(&self, perf: &BattlePerformance, round_cap: Round, dice: &mut impl Dice) -> Option<Achievement> {
        if perf.is_victory && perf.damage_taken <= 0.0 {
            return Some(Achievement::FlawlessVictory);
        }
        if perf.critical_hits >= CRITICAL_STORM_HITS {
            return Some(Achievement::CriticalStorm);
        }
        if perf.rounds_survived >= round_cap.max(1) {
            return Some(Achievement::IronSurvivor);
        }
        if perf.is_victory && dice.chance(RARE_ACHIEVEMENT_CHANCE) {
            return Some(Achievement::LegendaryMoment);
        }
        None
    }
}

fn stat_bonuses(perf: &BattlePerformance) -> BTreeMap<BonusStat, u32> {
    let mut bonuses = BTreeMap::new();
    if perf.damage_dealt >= 100.0 {
        bonuses.insert(BonusStat::Attack, 1);
    }
    if perf.damage_taken >= 100.0 {
        bonuses.insert(BonusStat::Defense, 1);
    }
    if perf.critical_hits >= 2 {
        bonuses.insert(BonusStat::Speed, 1);
    }
    if perf.rounds_survived >= 5 {
        bonuses.insert(BonusStat::MaxHp, 1);
    }
    bonuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dice::ScriptedDice;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn perf() -> BattlePerformance {
        BattlePerformance {
            character_id: CharacterId::canonical("Achilles"),
            level: 5,
            damage_dealt: 120.0,
            damage_taken: 40.0,
            healing_done: 0.0,
            critical_hits: 1,
            abilities_used: 4,
            rogue_actions: 0,
            rounds_survived: 4,
            result: MatchResult::Victory,
            is_victory: true,
        }
    }

    #[test]
    fn test_level_multiplier_clamped() {
        assert_eq!(RewardCalculator::level_multiplier(5, 5), 1.0);
        assert!((RewardCalculator::level_multiplier(5, 7) - 1.2).abs() < 1e-9);
        assert!((RewardCalculator::level_multiplier(1, 50) - 1.5).abs() < 1e-9);
        assert!((RewardCalculator::level_multiplier(50, 1) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_victory_rewards() {
        let rewards = RewardCalculator::new().calculate(
            &perf(),
            RewardContext {
                opponent_level: 5,
                membership_multiplier: 1.0,
                ..Default::default()
            },
            &mut ScriptedDice::pessimistic(),
        );
        // 100 + 12 + 15 + 20
        assert_eq!(rewards.xp_gained, 147);
        // 50 + 6
        assert_eq!(rewards.currency, 56);
        assert_eq!(rewards.training_points, 4);
        assert_eq!(rewards.bond_increase, 5.0);
        assert_eq!(rewards.stat_bonuses.get(&BonusStat::Attack), Some(&1));
        assert_eq!(rewards.achievement_unlocked, None);
    }

    #[test]
    fn test_membership_scales_xp_and_currency() {
        let rewards = RewardCalculator::new().calculate(
            &perf(),
            RewardContext {
                opponent_level: 5,
                membership_multiplier: 2.0,
                ..Default::default()
            },
            &mut ScriptedDice::pessimistic(),
        );
        assert_eq!(rewards.xp_gained, 294);
        assert_eq!(rewards.currency, 112);
    }

    #[test]
    fn test_deterministic_achievements() {
        let calc = RewardCalculator::new();
        let mut flawless = perf();
        flawless.damage_taken = 0.0;
        assert_eq!(
            calc.calculate(&flawless, RewardContext::default(), &mut ScriptedDice::pessimistic())
                .achievement_unlocked,
            Some(Achievement::FlawlessVictory)
        );

        let mut storm = perf();
        storm.critical_hits = 3;
        assert_eq!(
            calc.calculate(&storm, RewardContext::default(), &mut ScriptedDice::pessimistic())
                .achievement_unlocked,
            Some(Achievement::CriticalStorm)
        );

        let mut survivor = perf();
        survivor.result = MatchResult::Draw;
        survivor.is_victory = false;
        survivor.rounds_survived = 9;
        assert_eq!(
            calc.calculate(&survivor, RewardContext::default(), &mut ScriptedDice::new())
                .achievement_unlocked,
            Some(Achievement::IronSurvivor)
        );
    }

    #[test]
    fn test_iron_survivor_follows_round_cap() {
        let calc = RewardCalculator::new();
        let mut survivor = perf();
        survivor.result = MatchResult::Draw;
        survivor.is_victory = false;
        survivor.rounds_survived = 5;

        let short = RewardContext {
            round_cap: 5,
            ..Default::default()
        };
        assert_eq!(
            calc.calculate(&survivor, short, &mut ScriptedDice::new()).achievement_unlocked,
            Some(Achievement::IronSurvivor)
        );
        assert_eq!(
            calc.calculate(&survivor, RewardContext::default(), &mut ScriptedDice::new())
                .achievement_unlocked,
            None
        );
    }

    #[test]
    fn test_rare_roll_goes_through_dice() {
        let calc = RewardCalculator::new();
        let lucky = calc.calculate(&perf(), RewardContext::default(), &mut ScriptedDice::new());
        assert_eq!(lucky.achievement_unlocked, Some(Achievement::LegendaryMoment));

        let mut loss = perf();
        loss.result = MatchResult::Defeat;
        loss.is_victory = false;
        let none = calc.calculate(&loss, RewardContext::default(), &mut ScriptedDice::new());
        assert_eq!(none.achievement_unlocked, None);
    }

    #[test]
    fn test_pinned_rng_gives_identical_output() {
        let calc = RewardCalculator::new();
        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);
        let a = serde_json::to_string(&calc.calculate(&perf(), RewardContext::default(), &mut rng_a)).unwrap();
        let b = serde_json::to_string(&calc.calculate(&perf(), RewardContext::default(), &mut rng_b)).unwrap();
        assert_eq!(a, b);
    }
}
