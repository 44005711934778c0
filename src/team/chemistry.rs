//! Team chemistry derived from the relationship graph

use serde::{Deserialize, Serialize};

use crate::core::config::ChemistryTuning;
use crate::core::types::{clamp_stat, CharacterId, MatchResult};
use crate::team::relationships::{BondCounts, RelationshipGraph};

/// Qualitative reading of a chemistry score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChemistryBand {
    Exceptional,
    Strong,
    Good,
    Adequate,
    Fragile,
    Poor,
    NearDysfunction,
    Toxic,
}

impl ChemistryBand {
    pub fn from_value(value: f64) -> Self {
        match value {
            v if v >= 90.0 => ChemistryBand::Exceptional,
            v if v >= 80.0 => ChemistryBand::Strong,
            v if v >= 70.0 => ChemistryBand::Good,
            v if v >= 60.0 => ChemistryBand::Adequate,
            v if v >= 50.0 => ChemistryBand::Fragile,
            v if v >= 40.0 => ChemistryBand::Poor,
            v if v >= 30.0 => ChemistryBand::NearDysfunction,
            _ => ChemistryBand::Toxic,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ChemistryBand::Exceptional => "exceptional teamwork",
            ChemistryBand::Strong => "strong cohesion",
            ChemistryBand::Good => "good working relationships",
            ChemistryBand::Adequate => "adequate cooperation",
            ChemistryBand::Fragile => "fragile, tensions showing",
            ChemistryBand::Poor => "poor cooperation",
            ChemistryBand::NearDysfunction => "near dysfunction",
            ChemistryBand::Toxic => "toxic",
        }
    }
}

/// Chemistry score in [0, 100] with its band and the counts behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamChemistry {
    pub value: f64,
    pub band: ChemistryBand,
    pub bonds: BondCounts,
}

impl TeamChemistry {
    pub fn from_value(value: f64, bonds: BondCounts) -> Self {
        let value = clamp_stat(value);
        Self {
            value,
            band: ChemistryBand::from_value(value),
            bonds,
        }
    }

    /// Recompute from the roster's relationships
    pub fn compute(graph: &RelationshipGraph, roster: &[CharacterId], tuning: &ChemistryTuning) -> Self {
        let bonds = graph.bond_counts(roster);
        let value = tuning.base + bonds.strong_alliances as f64 * tuning.alliance_bonus
            - bonds.active_conflicts as f64 * tuning.conflict_penalty
            + bonds.mentoring_bonds as f64 * tuning.mentoring_bonus;
        Self::from_value(value, bonds)
    }

    /// Chemistry after a battle: +win_delta on victory, loss_delta otherwise
    ///
    /// A draw moves chemistry by half the loss delta.
    pub fn after_battle(&self, result: MatchResult, tuning: &ChemistryTuning) -> Self {
        let delta = match result {
            MatchResult::Victory => tuning.win_delta,
            MatchResult::Defeat => tuning.loss_delta,
            MatchResult::Draw => tuning.loss_delta / 2.0,
        };
        Self::from_value(self.value + delta, self.bonds)
    }

    /// Same value with bond counts taken from a newer graph
    pub fn with_bonds(mut self, bonds: BondCounts) -> Self {
        self.bonds = bonds;
        self
    }
}
