//! Obey/deviate decision
//!
//! An independent probability model from the adherence score. The adherence
//! tier is carried through for logging and alerts but does not enter the roll;
//! the two signals are kept side by side and never merged.

use serde::{Deserialize, Serialize};

use crate::core::config::ObedienceTuning;
use crate::core::dice::Dice;
use crate::psych::adherence::AdherenceReport;

/// Everything the arbiter looks at
#[derive(Debug, Clone, Copy)]
pub struct ObedienceInput<'a> {
    pub adherence: &'a AdherenceReport,
    pub team_morale: f64,
    pub is_injured: bool,
    pub last_round_was_rogue: bool,
}

/// Result of the roll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObedienceDecision {
    pub probability: f64,
    pub will_obey: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ObedienceArbiter {
    tuning: ObedienceTuning,
}

impl ObedienceArbiter {
    pub fn new(tuning: ObedienceTuning) -> Self {
        Self { tuning }
    }

    /// `p = base + morale_weight*morale - injured_penalty - rogue_penalty`, clamped to [0, 1]
    pub fn probability(&self, team_morale: f64, is_injured: bool, last_round_was_rogue: bool) -> f64 {
        let t = &self.tuning;
        let mut p = t.base + t.morale_weight * team_morale;
        if is_injured {
            p -= t.injured_penalty;
        }
        if last_round_was_rogue {
            p -= t.rogue_penalty;
        }
        p.clamp(0.0, 1.0)
    }

    pub fn decide(&self, input: ObedienceInput<'_>, dice: &mut impl Dice) -> ObedienceDecision {
        let probability =
            self.probability(input.team_morale, input.is_injured, input.last_round_was_rogue);
        let will_obey = dice.chance(probability);

        tracing::debug!(
            tier = ?input.adherence.tier,
            score = input.adherence.score,
            probability,
            will_obey,
            "Obedience roll"
        );

        ObedienceDecision {
            probability,
            will_obey,
        }
    }
}
