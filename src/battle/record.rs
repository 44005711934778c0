//! Combat round records and the append-only battle log

use serde::{Deserialize, Serialize};

use crate::core::types::{CharacterId, Round};
use crate::psych::rogue::RogueAction;

/// Whether the actor followed the coach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Scripted,
    Rogue,
}

/// One resolved action
///
/// `damage` always lands on the defender and `self_damage` on the attacker;
/// the HP fields are the values after both were applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRoundRecord {
    pub round: Round,
    pub attacker_id: CharacterId,
    pub defender_id: CharacterId,
    pub action_kind: ActionKind,
    /// Ability executed on a scripted action
    pub ability: Option<String>,
    /// Deviation taken on a rogue action
    pub rogue_action: Option<RogueAction>,
    pub damage: f64,
    pub self_damage: f64,
    pub healing: f64,
    pub critical: bool,
    pub morale_impact: f64,
    pub narrative: String,
    pub new_attacker_hp: f64,
    pub new_defender_hp: f64,
    /// Adherence score that preceded the obedience roll
    pub adherence_score: f64,
    pub obedience_probability: f64,
}

impl CombatRoundRecord {
    pub fn is_rogue(&self) -> bool {
        self.action_kind == ActionKind::Rogue
    }
}

/// Battle log; records are immutable once appended
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleLog {
    records: Vec<CombatRoundRecord>,
}

impl BattleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CombatRoundRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[CombatRoundRecord] {
        &self.records
    }

    pub fn for_round(&self, round: Round) -> impl Iterator<Item = &CombatRoundRecord> {
        self.records.iter().filter(move |r| r.round == round)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
