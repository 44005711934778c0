//! Per-team battle state

use serde::{Deserialize, Serialize};

use crate::battle::fighter::Fighter;
use crate::battle::strategy::{ResolvedStrategy, StrategySelection};
use crate::core::types::{CharacterId, Round, TeamSide};
use crate::team::chemistry::TeamChemistry;
use crate::team::morale::MoraleLedger;

/// A team as handed to a new battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub name: String,
    /// The fighter sent into the arena
    pub fighter: Fighter,
    /// Teammates on the bench; their relationships feed chemistry
    #[serde(default)]
    pub teammates: Vec<CharacterId>,
    /// Morale carried over from the previous battle, if any
    #[serde(default)]
    pub carried_morale: Option<MoraleLedger>,
}

impl TeamEntry {
    pub fn new(name: &str, fighter: Fighter) -> Self {
        Self {
            name: name.to_string(),
            fighter,
            teammates: Vec::new(),
            carried_morale: None,
        }
    }

    pub fn with_teammates(mut self, teammates: impl IntoIterator<Item = CharacterId>) -> Self {
        self.teammates.extend(teammates);
        self
    }

    pub fn with_carried_morale(mut self, ledger: &MoraleLedger) -> Self {
        self.carried_morale = Some(ledger.carry_forward());
        self
    }

    /// Fighter first, then teammates, without duplicates
    pub fn roster(&self) -> Vec<CharacterId> {
        let mut roster = vec![self.fighter.id.clone()];
        for id in &self.teammates {
            if !roster.contains(id) {
                roster.push(id.clone());
            }
        }
        roster
    }
}

/// One team inside a running battle
#[derive(Debug, Clone)]
pub struct BattleSide {
    pub side: TeamSide,
    pub name: String,
    pub fighter: Fighter,
    pub roster: Vec<CharacterId>,
    pub morale: MoraleLedger,
    pub chemistry_before: TeamChemistry,
    pub chemistry: TeamChemistry,
    pub selection: StrategySelection,
    pub strategy: Option<ResolvedStrategy>,
    pub last_round_rogue: bool,
    pub rounds_survived: Round,
}

impl BattleSide {
    pub fn new(side: TeamSide, entry: TeamEntry, starting_morale: f64, chemistry: TeamChemistry) -> Self {
        let roster = entry.roster();
        let morale = entry
            .carried_morale
            .unwrap_or_else(|| MoraleLedger::new(starting_morale));
        Self {
            side,
            name: entry.name,
            fighter: entry.fighter,
            roster,
            morale,
            chemistry_before: chemistry,
            chemistry,
            selection: StrategySelection::default(),
            strategy: None,
            last_round_rogue: false,
            rounds_survived: 0,
        }
    }
}

/// Both sides of a battle
#[derive(Debug, Clone)]
pub struct Arena {
    pub home: BattleSide,
    pub away: BattleSide,
}

impl Arena {
    pub fn side(&self, side: TeamSide) -> &BattleSide {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    pub fn side_mut(&mut self, side: TeamSide) -> &mut BattleSide {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    /// Mutable access to the acting side and its opponent at once
    pub fn pair_mut(&mut self, actor: TeamSide) -> (&mut BattleSide, &mut BattleSide) {
        match actor {
            TeamSide::Home => (&mut self.home, &mut self.away),
            TeamSide::Away => (&mut self.away, &mut self.home),
        }
    }

    /// Side whose fighter has this id
    pub fn side_of(&self, id: &CharacterId) -> Option<TeamSide> {
        TeamSide::both()
            .into_iter()
            .find(|s| &self.side(*s).fighter.id == id)
    }

    pub fn any_down(&self) -> bool {
        self.home.fighter.is_down() || self.away.fighter.is_down()
    }
}
