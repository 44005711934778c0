//! Team morale ledger
//!
//! Morale moves by clamped addition of each round's impact. Every change is
//! appended to the history with its cause; history is never rewritten.

use serde::{Deserialize, Serialize};

use crate::core::types::{clamp_stat, CharacterId, Round};
use crate::psych::rogue::RogueAction;

/// Why morale moved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoraleCause {
    /// A teammate carried out the coach's plan
    ScriptedAction { actor: CharacterId },
    /// A teammate landed a critical hit
    CriticalHit { actor: CharacterId },
    /// A teammate went rogue
    RogueAction { actor: CharacterId, action: RogueAction },
    /// The fighter on this side went down
    Knockout { fighter: CharacterId },
    /// Coaching between rounds
    Coaching { character: CharacterId },
}

/// One ledger line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoraleEntry {
    pub round: Round,
    /// Change that landed after clamping
    pub delta: f64,
    pub cause: MoraleCause,
}

/// Morale of one team for one battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoraleLedger {
    current_morale: f64,
    history: Vec<MoraleEntry>,
}

impl MoraleLedger {
    pub fn new(starting_morale: f64) -> Self {
        Self {
            current_morale: clamp_stat(starting_morale),
            history: Vec::new(),
        }
    }

    /// Fresh ledger that keeps this one's morale but none of its history
    pub fn carry_forward(&self) -> Self {
        Self::new(self.current_morale)
    }

    pub fn current(&self) -> f64 {
        self.current_morale
    }

    pub fn history(&self) -> &[MoraleEntry] {
        &self.history
    }

    /// Apply a signed change, returning the part that landed
    pub fn apply(&mut self, round: Round, delta: f64, cause: MoraleCause) -> f64 {
        if delta == 0.0 || delta.is_nan() {
            return 0.0;
        }
        let before = self.current_morale;
        self.current_morale = clamp_stat(before + delta);
        let applied = self.current_morale - before;
        self.history.push(MoraleEntry {
            round,
            delta: applied,
            cause,
        });
        applied
    }

    /// Sum of all recorded changes
    pub fn net_change(&self) -> f64 {
        self.history.iter().map(|e| e.delta).sum()
    }
}
