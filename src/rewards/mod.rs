//! Post-battle rewards and skill growth

pub mod calculator;
pub mod performance;
pub mod skills;

pub use calculator::{Achievement, BattleRewards, BonusStat, RewardCalculator, RewardContext};
pub use performance::BattlePerformance;
pub use skills::{
    default_interactions, xp_to_next_level, SkillCategory, SkillGain, SkillInteraction, SkillLevel,
    SkillProgressionEngine, SkillProgressionReward, SkillSet, MAX_SKILL_LEVEL,
};
