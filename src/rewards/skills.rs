//! Skill progression across the five skill categories
//!
//! Each battle grants experience per category, scaled by how the character
//! actually fought. Experience carries over between levels, several levels can
//! be gained at once, and pairs of skills that cross a configured level
//! together unlock a named interaction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::CharacterId;
use crate::rewards::performance::BattlePerformance;

/// Highest level any skill can reach
pub const MAX_SKILL_LEVEL: u32 = 100;

/// Base skill experience per category before multipliers
const BASE_SKILL_XP_VICTORY: f64 = 30.0;
const BASE_SKILL_XP_OTHER: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Combat,
    Survival,
    Mental,
    Social,
    Spiritual,
}

impl SkillCategory {
    pub fn all() -> &'static [SkillCategory] {
        &[
            SkillCategory::Combat,
            SkillCategory::Survival,
            SkillCategory::Mental,
            SkillCategory::Social,
            SkillCategory::Spiritual,
        ]
    }
}

/// Experience needed to go from `level` to `level + 1`
pub fn xp_to_next_level(level: u32) -> u32 {
    100 + 50 * level.saturating_sub(1)
}

/// Level and progress of one skill
///
/// Stored levels outside `1..=MAX_SKILL_LEVEL` are clamped on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSkillLevel")]
pub struct SkillLevel {
    pub level: u32,
    /// Experience banked toward the next level
    pub experience: u32,
}

impl Default for SkillLevel {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
        }
    }
}

/// Skill level as stored externally
#[derive(Debug, Deserialize)]
struct RawSkillLevel {
    #[serde(default = "first_level")]
    level: u32,
    #[serde(default)]
    experience: u32,
}

fn first_level() -> u32 {
    1
}

impl From<RawSkillLevel> for SkillLevel {
    fn from(raw: RawSkillLevel) -> Self {
        let level = raw.level.clamp(1, MAX_SKILL_LEVEL);
        if level != raw.level {
            tracing::warn!(stored = raw.level, level, "Skill level out of range, clamped");
        }
        Self {
            level,
            experience: if level >= MAX_SKILL_LEVEL { 0 } else { raw.experience },
        }
    }
}

impl SkillLevel {
    /// Bank experience and return how many levels were gained
    fn gain(&mut self, amount: u32) -> u32 {
        if self.level >= MAX_SKILL_LEVEL {
            self.level = MAX_SKILL_LEVEL;
            self.experience = 0;
            return 0;
        }

        self.experience = self.experience.saturating_add(amount);
        let mut gained = 0;
        while self.level < MAX_SKILL_LEVEL && self.experience >= xp_to_next_level(self.level) {
            self.experience -= xp_to_next_level(self.level);
            self.level += 1;
            gained += 1;
        }
        if self.level >= MAX_SKILL_LEVEL {
            self.experience = 0;
        }
        gained
    }
}

/// All five skills of one character
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSet {
    #[serde(default)]
    skills: BTreeMap<SkillCategory, SkillLevel>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, category: SkillCategory, level: u32) -> Self {
        self.skills.insert(
            category,
            SkillLevel {
                level: level.clamp(1, MAX_SKILL_LEVEL),
                experience: 0,
            },
        );
        self
    }

    pub fn get(&self, category: SkillCategory) -> SkillLevel {
        self.skills.get(&category).copied().unwrap_or_default()
    }

    pub fn level(&self, category: SkillCategory) -> u32 {
        self.get(category).level
    }

    fn entry(&mut self, category: SkillCategory) -> &mut SkillLevel {
        self.skills.entry(category).or_default()
    }
}

/// Named synergy between two skills
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInteraction {
    pub name: String,
    pub first: SkillCategory,
    pub second: SkillCategory,
    /// Both skills must be at least this level
    pub required_level: u32,
    #[serde(default)]
    pub description: String,
}

impl SkillInteraction {
    fn new(name: &str, first: SkillCategory, second: SkillCategory, required_level: u32, description: &str) -> Self {
        Self {
            name: name.to_string(),
            first,
            second,
            required_level,
            description: description.to_string(),
        }
    }

    fn qualifies(&self, skills: &SkillSet) -> bool {
        skills.level(self.first) >= self.required_level && skills.level(self.second) >= self.required_level
    }
}

/// Interaction table used when the config does not override it
pub fn default_interactions() -> Vec<SkillInteraction> {
    use SkillCategory::*;
    vec![
        SkillInteraction::new("Battle Meditation", Combat, Spiritual, 10, "Calm strikes that land true"),
        SkillInteraction::new("Iron Will", Survival, Mental, 10, "Keeps fighting past the breaking point"),
        SkillInteraction::new("Rallying Cry", Combat, Social, 15, "Lifts the whole team mid-fight"),
        SkillInteraction::new("Inner Peace", Mental, Spiritual, 20, "Stress slides off"),
        SkillInteraction::new("Shared Burden", Survival, Social, 20, "Takes hits meant for teammates"),
        SkillInteraction::new("Tactical Genius", Combat, Mental, 25, "Reads the opponent two moves ahead"),
    ]
}

/// Experience granted to one skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGain {
    pub category: SkillCategory,
    pub multiplier: f64,
    pub experience: u32,
    pub level_before: u32,
    pub level_after: u32,
}

impl SkillGain {
    pub fn levels_gained(&self) -> u32 {
        self.level_after.saturating_sub(self.level_before)
    }
}

/// Skill growth from one battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProgressionReward {
    pub character_id: CharacterId,
    pub gains: Vec<SkillGain>,
    pub unlocked_interactions: Vec<String>,
    pub skills: SkillSet,
}

impl SkillProgressionReward {
    pub fn total_levels_gained(&self) -> u32 {
        self.gains.iter().map(SkillGain::levels_gained).sum()
    }
}

/// Distributes battle experience across skills
#[derive(Debug, Clone)]
pub struct SkillProgressionEngine {
    interactions: Vec<SkillInteraction>,
}

impl Default for SkillProgressionEngine {
    fn default() -> Self {
        Self::new(default_interactions())
    }
}

impl SkillProgressionEngine {
    pub fn new(interactions: Vec<SkillInteraction>) -> Self {
        Self { interactions }
    }

    pub fn interactions(&self) -> &[SkillInteraction] {
        &self.interactions
    }

    /// Performance-derived multiplier per category
    pub fn multipliers(&self, perf: &BattlePerformance) -> BTreeMap<SkillCategory, f64> {
        let mut out = BTreeMap::new();
        out.insert(
            SkillCategory::Combat,
            1.0 + perf.damage_dealt / 500.0 + perf.critical_hits as f64 * 0.1,
        );
        out.insert(
            SkillCategory::Survival,
            1.0 + perf.damage_taken / 400.0 + perf.rounds_survived as f64 * 0.05,
        );
        out.insert(SkillCategory::Mental, 1.0 + perf.abilities_used as f64 * 0.05);
        out.insert(SkillCategory::Social, if perf.is_victory { 1.2 } else { 1.0 });
        // Losses teach more humility than wins
        out.insert(SkillCategory::Spiritual, if perf.is_victory { 1.1 } else { 1.3 });
        out
    }

    /// Apply one battle's experience to `current`
    ///
    /// Pure: the same snapshot and skill set always produce the same reward.
    pub fn progress(&self, current: &SkillSet, perf: &BattlePerformance) -> SkillProgressionReward {
        let base = if perf.is_victory {
            BASE_SKILL_XP_VICTORY
        } else {
            BASE_SKILL_XP_OTHER
        };

        let mut skills = current.clone();
        let mut gains = Vec::with_capacity(SkillCategory::all().len());
        for (category, multiplier) in self.multipliers(perf) {
            let experience = (base * multiplier).round().max(0.0) as u32;
            let slot = skills.entry(category);
            slot.level = slot.level.clamp(1, MAX_SKILL_LEVEL);
            let level_before = slot.level;
            slot.gain(experience);
            gains.push(SkillGain {
                category,
                multiplier,
                experience,
                level_before,
                level_after: slot.level,
            });
        }

        let unlocked_interactions: Vec<String> = self
            .interactions
            .iter()
            .filter(|i| !i.qualifies(current) && i.qualifies(&skills))
            .map(|i| i.name.clone())
            .collect();

        for name in &unlocked_interactions {
            tracing::info!(character = %perf.character_id, interaction = %name, "Skill interaction unlocked");
        }

        SkillProgressionReward {
            character_id: perf.character_id.clone(),
            gains,
            unlocked_interactions,
            skills,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MatchResult;

    fn perf(victory: bool) -> BattlePerformance {
        BattlePerformance {
            character_id: CharacterId::canonical("Joan of Arc"),
            level: 5,
            damage_dealt: 250.0,
            damage_taken: 80.0,
            healing_done: 0.0,
            critical_hits: 2,
            abilities_used: 6,
            rogue_actions: 1,
            rounds_survived: 6,
            result: if victory { MatchResult::Victory } else { MatchResult::Defeat },
            is_victory: victory,
        }
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(xp_to_next_level(1), 100);
        assert_eq!(xp_to_next_level(2), 150);
        assert_eq!(xp_to_next_level(10), 550);
    }

    #[test]
    fn test_multiple_level_ups_carry_remainder() {
        let mut skill = SkillLevel::default();
        // 100 + 150 + 20
        assert_eq!(skill.gain(270), 2);
        assert_eq!(skill.level, 3);
        assert_eq!(skill.experience, 20);
    }

    #[test]
    fn test_level_cap() {
        let mut skill = SkillLevel {
            level: MAX_SKILL_LEVEL - 1,
            experience: 0,
        };
        assert_eq!(skill.gain(u32::MAX), 1);
        assert_eq!(skill.level, MAX_SKILL_LEVEL);
        assert_eq!(skill.experience, 0);
        assert_eq!(skill.gain(500), 0);
    }

    #[test]
    fn test_stored_level_above_cap_is_clamped() {
        let stored: SkillSet =
            serde_json::from_str(r#"{"skills":{"combat":{"level":150,"experience":40},"mental":{"level":0}}}"#)
                .unwrap();
        assert_eq!(stored.level(SkillCategory::Combat), MAX_SKILL_LEVEL);
        assert_eq!(stored.get(SkillCategory::Combat).experience, 0);
        assert_eq!(stored.level(SkillCategory::Mental), 1);

        let reward = SkillProgressionEngine::default().progress(&stored, &perf(true));
        assert_eq!(reward.total_levels_gained(), 0);
        let combat = reward
            .gains
            .iter()
            .find(|g| g.category == SkillCategory::Combat)
            .unwrap();
        assert_eq!(combat.level_before, MAX_SKILL_LEVEL);
        assert_eq!(combat.level_after, MAX_SKILL_LEVEL);
    }

    #[test]
    fn test_levels_gained_never_underflows() {
        let gain = SkillGain {
            category: SkillCategory::Combat,
            multiplier: 1.0,
            experience: 0,
            level_before: 150,
            level_after: MAX_SKILL_LEVEL,
        };
        assert_eq!(gain.levels_gained(), 0);
    }

    #[test]
    fn test_multipliers_follow_performance() {
        let engine = SkillProgressionEngine::default();
        let m = engine.multipliers(&perf(true));
        assert!((m[&SkillCategory::Combat] - 1.7).abs() < 1e-9);
        assert!((m[&SkillCategory::Survival] - 1.5).abs() < 1e-9);
        assert!((m[&SkillCategory::Mental] - 1.3).abs() < 1e-9);
        assert_eq!(m[&SkillCategory::Social], 1.2);
        assert_eq!(engine.multipliers(&perf(false))[&SkillCategory::Spiritual], 1.3);
    }

    #[test]
    fn test_interaction_unlocks_when_both_cross() {
        let engine = SkillProgressionEngine::new(vec![SkillInteraction::new(
            "Battle Meditation",
            SkillCategory::Combat,
            SkillCategory::Spiritual,
            2,
            "",
        )]);
        let mut current = SkillSet::new();
        current.entry(SkillCategory::Combat).experience = 99;
        current.entry(SkillCategory::Spiritual).experience = 99;

        let reward = engine.progress(&current, &perf(true));
        assert_eq!(reward.unlocked_interactions, vec!["Battle Meditation".to_string()]);

        // Already qualified: not unlocked again
        let again = engine.progress(&reward.skills, &perf(true));
        assert!(again.unlocked_interactions.is_empty());
    }

    #[test]
    fn test_progress_is_pure() {
        let engine = SkillProgressionEngine::default();
        let skills = SkillSet::new().with_level(SkillCategory::Mental, 9);
        let a = serde_json::to_string(&engine.progress(&skills, &perf(false))).unwrap();
        let b = serde_json::to_string(&engine.progress(&skills, &perf(false))).unwrap();
        assert_eq!(a, b);
    }
}
