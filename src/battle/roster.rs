//! Team rosters loaded from TOML
//!
//! The binaries read their teams from `data/roster.toml`; a roster also
//! carries the relationship edges every battle built from it starts with.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::battle::session::BattleSetup;
use crate::battle::side::TeamEntry;
use crate::core::error::{ArenaError, Result};
use crate::team::relationships::RelationshipGraph;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    pub teams: Vec<TeamEntry>,
    #[serde(default)]
    pub relationships: RelationshipGraph,
}

impl Roster {
    /// Team by name, case-insensitive
    pub fn team(&self, name: &str) -> Option<&TeamEntry> {
        self.teams.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn team_names(&self) -> Vec<&str> {
        self.teams.iter().map(|t| t.name.as_str()).collect()
    }

    /// Setup for a battle between two named teams
    pub fn setup(&self, home: &str, away: &str, seed: u64) -> Result<BattleSetup> {
        let find = |name: &str| {
            self.team(name)
                .cloned()
                .ok_or_else(|| ArenaError::Config(format!("No team named {:?} in roster", name)))
        };
        Ok(BattleSetup {
            home: find(home)?,
            away: find(away)?,
            relationships: self.relationships.clone(),
            seed,
        })
    }
}

pub fn load_roster(path: impl AsRef<Path>) -> Result<Roster> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_roster(&contents)
}

pub fn parse_roster(contents: &str) -> Result<Roster> {
    let roster: Roster = toml::from_str(contents)?;
    if roster.teams.len() < 2 {
        return Err(ArenaError::Config("A roster needs at least two teams".into()));
    }
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CharacterId;

    #[test]
    fn test_load_bundled_roster() {
        let roster = load_roster("data/roster.toml").expect("Should load bundled roster");
        assert!(roster.teams.len() >= 2);
        assert!(roster.teams.iter().all(|t| !t.fighter.abilities.is_empty()));
        assert!(!roster.relationships.is_empty());
    }

    #[test]
    fn test_setup_by_name() {
        let roster = load_roster("data/roster.toml").unwrap();
        let names = roster.team_names();
        let setup = roster.setup(names[0], &names[1].to_uppercase(), 7).unwrap();
        assert_eq!(setup.seed, 7);
        assert_eq!(setup.away.name, names[1]);
        assert!(roster.setup(names[0], "Nobody", 7).is_err());
    }

    #[test]
    fn test_single_team_rejected() {
        let result = parse_roster(
            r#"
            [[teams]]
            name = "Solo"
            [teams.fighter]
            name = "Hermit"
            max_hp = 50.0
            "#,
        );
        assert!(matches!(result, Err(ArenaError::Config(_))));
    }

    #[test]
    fn test_relationship_ids_canonicalised() {
        let roster = parse_roster(
            r#"
            [[teams]]
            name = "A"
            teammates = ["Patroclus"]
            [teams.fighter]
            name = "Achilles"
            max_hp = 50.0

            [[teams]]
            name = "B"
            [teams.fighter]
            name = "Hector"
            max_hp = 50.0

            [[relationships]]
            source = "Achilles"
            target = "PATROCLUS"
            relationship_type = "ally"
            strength = 80.0
            "#,
        )
        .unwrap();
        let edge = roster
            .relationships
            .get(&CharacterId::canonical("achilles"), &CharacterId::canonical("patroclus"));
        assert!(edge.is_some());
        assert_eq!(roster.teams[0].teammates[0], CharacterId::canonical("patroclus"));
    }
}
