//! Fighters and their abilities
//!
//! Combat stats arrive already resolved from the equipment subsystem and are
//! treated as opaque numbers here.

use serde::{Deserialize, Serialize};

use crate::core::types::CharacterId;
use crate::psych::coaching::PersonalityTrait;
use crate::psych::profile::PsychProfile;

/// Resolved combat numbers for one character
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatStats {
    pub attack: f64,
    pub defense: f64,
    pub speed: f64,
    /// Probability in [0, 1]
    pub crit_chance: f64,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            attack: 20.0,
            defense: 10.0,
            speed: 10.0,
            crit_chance: 0.1,
        }
    }
}

/// Slot an ability fills in the coach's strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityCategory {
    Attack,
    Defense,
    Special,
}

impl AbilityCategory {
    pub fn all() -> &'static [AbilityCategory] {
        &[
            AbilityCategory::Attack,
            AbilityCategory::Defense,
            AbilityCategory::Special,
        ]
    }
}

/// What an ability does when executed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbilityEffect {
    /// Damage scaled by attack: `attack * power - defense / 2`
    Damage { power: f64 },
    /// Restore HP to the user
    Heal { amount: f64 },
    /// Fraction of incoming damage removed while this is the defense pick
    Guard { mitigation: f64 },
    /// No mechanical effect
    Focus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    pub category: AbilityCategory,
    pub effect: AbilityEffect,
}

impl Ability {
    pub fn new(name: &str, category: AbilityCategory, effect: AbilityEffect) -> Self {
        Self {
            name: name.to_string(),
            category,
            effect,
        }
    }

    /// Substitute action for a fighter with nothing usable
    pub fn focus() -> Self {
        Self::new("Focus", AbilityCategory::Special, AbilityEffect::Focus)
    }

    pub fn is_noop(&self) -> bool {
        matches!(self.effect, AbilityEffect::Focus)
    }

    /// Damage reduction offered when picked as the defense
    pub fn mitigation(&self) -> f64 {
        match self.effect {
            AbilityEffect::Guard { mitigation } => mitigation.clamp(0.0, 0.9),
            _ => 0.0,
        }
    }
}

/// A combatant in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFighter")]
pub struct Fighter {
    pub id: CharacterId,
    pub name: String,
    pub level: u32,
    pub stats: CombatStats,
    pub max_hp: f64,
    hp: f64,
    pub abilities: Vec<Ability>,
    pub profile: PsychProfile,
    #[serde(default)]
    pub traits: Vec<PersonalityTrait>,
}

/// Fighter as written in roster files
///
/// The id defaults to the canonical form of the name and HP to full.
#[derive(Debug, Deserialize)]
struct RawFighter {
    id: Option<String>,
    name: String,
    level: Option<u32>,
    #[serde(default)]
    stats: CombatStats,
    max_hp: f64,
    hp: Option<f64>,
    #[serde(default)]
    abilities: Vec<Ability>,
    #[serde(default)]
    profile: PsychProfile,
    #[serde(default)]
    traits: Vec<PersonalityTrait>,
}

impl From<RawFighter> for Fighter {
    fn from(raw: RawFighter) -> Self {
        let mut fighter = Fighter::new(&raw.name, raw.max_hp, raw.stats)
            .with_level(raw.level.unwrap_or(1))
            .with_profile(raw.profile)
            .with_traits(raw.traits);
        if let Some(id) = raw.id {
            fighter.id = CharacterId::canonical(&id);
        }
        fighter.abilities = raw.abilities;
        if let Some(hp) = raw.hp.filter(|hp| hp.is_finite()) {
            fighter.hp = hp.clamp(0.0, fighter.max_hp);
        }
        fighter
    }
}

impl Fighter {
    pub fn new(name: &str, max_hp: f64, stats: CombatStats) -> Self {
        let max_hp = max_hp.max(1.0);
        Self {
            id: CharacterId::canonical(name),
            name: name.to_string(),
            level: 1,
            stats,
            max_hp,
            hp: max_hp,
            abilities: Vec::new(),
            profile: PsychProfile::default(),
            traits: Vec::new(),
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.abilities.push(ability);
        self
    }

    pub fn with_profile(mut self, profile: PsychProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_traits(mut self, traits: impl IntoIterator<Item = PersonalityTrait>) -> Self {
        self.traits.extend(traits);
        self
    }

    pub fn hp(&self) -> f64 {
        self.hp
    }

    pub fn is_down(&self) -> bool {
        self.hp <= 0.0
    }

    /// Below `threshold` of max HP
    pub fn is_injured(&self, threshold: f64) -> bool {
        self.hp < self.max_hp * threshold
    }

    /// Subtract damage, clamped to [0, max_hp]; returns HP actually lost
    pub fn take_damage(&mut self, amount: f64) -> f64 {
        let amount = if amount.is_nan() { 0.0 } else { amount.max(0.0) };
        let before = self.hp;
        self.hp = (self.hp - amount).clamp(0.0, self.max_hp);
        before - self.hp
    }

    /// Add healing, clamped to [0, max_hp]; returns HP actually gained
    pub fn heal(&mut self, amount: f64) -> f64 {
        let amount = if amount.is_nan() { 0.0 } else { amount.max(0.0) };
        let before = self.hp;
        self.hp = (self.hp + amount).clamp(0.0, self.max_hp);
        self.hp - before
    }

    pub fn abilities_in(&self, category: AbilityCategory) -> Vec<&Ability> {
        self.abilities.iter().filter(|a| a.category == category).collect()
    }

    pub fn find_ability(&self, name: &str) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }
}
