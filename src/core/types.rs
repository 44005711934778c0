//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Canonical character identifier
///
/// Relationship, profile, and fighter lookups all key on this slug. Display
/// names and raw ids both normalise to the same value through [`CharacterId::canonical`],
/// so "Achilles", " achilles " and "ACHILLES" address one character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CharacterId(String);

impl CharacterId {
    /// Normalise a name or raw id into the canonical slug
    ///
    /// Lower-cases ASCII letters, keeps digits, and collapses every run of
    /// other characters into a single `_`. Leading/trailing separators are dropped.
    pub fn canonical(raw: &str) -> Self {
        let mut slug = String::with_capacity(raw.len());
        let mut pending_sep = false;
        for ch in raw.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_sep && !slug.is_empty() {
                    slug.push('_');
                }
                pending_sep = false;
                slug.push(ch.to_ascii_lowercase());
            } else {
                pending_sep = true;
            }
        }
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CharacterId {
    fn from(raw: String) -> Self {
        Self::canonical(&raw)
    }
}

impl From<&str> for CharacterId {
    fn from(raw: &str) -> Self {
        Self::canonical(raw)
    }
}

impl From<CharacterId> for String {
    fn from(id: CharacterId) -> Self {
        id.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a battle instance
///
/// Every piece of mutable battle state is scoped by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleId(pub Uuid);

impl BattleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BattleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the arena a team fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    Home,
    Away,
}

impl TeamSide {
    pub fn opponent(self) -> Self {
        match self {
            TeamSide::Home => TeamSide::Away,
            TeamSide::Away => TeamSide::Home,
        }
    }

    pub fn both() -> [TeamSide; 2] {
        [TeamSide::Home, TeamSide::Away]
    }
}

/// Result of a finished battle from one team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Victory,
    Defeat,
    Draw,
}

impl MatchResult {
    pub fn is_victory(self) -> bool {
        self == MatchResult::Victory
    }
}

/// Round counter (1-based once combat starts)
pub type Round = u32;

/// Clamp a psychological attribute into its legal range
pub fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
