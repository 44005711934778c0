//! Persistent psychological attributes of a character
//!
//! Every attribute lives in [0, 100]. Fields are private and every write goes
//! through [`PsychProfile::set`] or [`PsychProfile::adjust`], which clamp, so
//! no mutation site can leave a profile out of range.

use serde::{Deserialize, Serialize};

use crate::core::types::clamp_stat;

/// Addressable psychological attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PsychStat {
    MentalHealth,
    Stress,
    TeamTrust,
    BattleFocus,
    Ego,
    Training,
    Communication,
    GameplanAdherence,
}

impl PsychStat {
    pub fn all() -> &'static [PsychStat] {
        &[
            PsychStat::MentalHealth,
            PsychStat::Stress,
            PsychStat::TeamTrust,
            PsychStat::BattleFocus,
            PsychStat::Ego,
            PsychStat::Training,
            PsychStat::Communication,
            PsychStat::GameplanAdherence,
        ]
    }

    /// Value substituted when the attribute is missing or malformed
    pub fn default_value(self) -> f64 {
        match self {
            PsychStat::MentalHealth => 70.0,
            PsychStat::Stress => 30.0,
            PsychStat::TeamTrust => 60.0,
            PsychStat::BattleFocus => 60.0,
            PsychStat::Ego => 50.0,
            PsychStat::Training => 50.0,
            PsychStat::Communication => 50.0,
            PsychStat::GameplanAdherence => 70.0,
        }
    }
}

/// Psychological profile of one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPsychProfile")]
pub struct PsychProfile {
    mental_health: f64,
    stress: f64,
    team_trust: f64,
    battle_focus: f64,
    ego: f64,
    training: f64,
    communication: f64,
    gameplan_adherence: f64,
}

impl Default for PsychProfile {
    fn default() -> Self {
        Self {
            mental_health: PsychStat::MentalHealth.default_value(),
            stress: PsychStat::Stress.default_value(),
            team_trust: PsychStat::TeamTrust.default_value(),
            battle_focus: PsychStat::BattleFocus.default_value(),
            ego: PsychStat::Ego.default_value(),
            training: PsychStat::Training.default_value(),
            communication: PsychStat::Communication.default_value(),
            gameplan_adherence: PsychStat::GameplanAdherence.default_value(),
        }
    }
}

impl PsychProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, clamped
    pub fn with(mut self, stat: PsychStat, value: f64) -> Self {
        self.set(stat, value);
        self
    }

    pub fn get(&self, stat: PsychStat) -> f64 {
        match stat {
            PsychStat::MentalHealth => self.mental_health,
            PsychStat::Stress => self.stress,
            PsychStat::TeamTrust => self.team_trust,
            PsychStat::BattleFocus => self.battle_focus,
            PsychStat::Ego => self.ego,
            PsychStat::Training => self.training,
            PsychStat::Communication => self.communication,
            PsychStat::GameplanAdherence => self.gameplan_adherence,
        }
    }

    /// Set an attribute; NaN becomes the documented default, everything else is clamped
    pub fn set(&mut self, stat: PsychStat, value: f64) {
        let value = if value.is_nan() {
            stat.default_value()
        } else {
            clamp_stat(value)
        };
        *self.slot(stat) = value;
    }

    /// Add a signed delta, returning the change that actually landed after clamping
    pub fn adjust(&mut self, stat: PsychStat, delta: f64) -> f64 {
        let before = self.get(stat);
        self.set(stat, before + delta);
        self.get(stat) - before
    }

    fn slot(&mut self, stat: PsychStat) -> &mut f64 {
        match stat {
            PsychStat::MentalHealth => &mut self.mental_health,
            PsychStat::Stress => &mut self.stress,
            PsychStat::TeamTrust => &mut self.team_trust,
            PsychStat::BattleFocus => &mut self.battle_focus,
            PsychStat::Ego => &mut self.ego,
            PsychStat::Training => &mut self.training,
            PsychStat::Communication => &mut self.communication,
            PsychStat::GameplanAdherence => &mut self.gameplan_adherence,
        }
    }

    pub fn mental_health(&self) -> f64 {
        self.mental_health
    }

    pub fn stress(&self) -> f64 {
        self.stress
    }

    pub fn team_trust(&self) -> f64 {
        self.team_trust
    }

    pub fn battle_focus(&self) -> f64 {
        self.battle_focus
    }

    pub fn ego(&self) -> f64 {
        self.ego
    }

    pub fn training(&self) -> f64 {
        self.training
    }

    pub fn communication(&self) -> f64 {
        self.communication
    }

    pub fn gameplan_adherence(&self) -> f64 {
        self.gameplan_adherence
    }

    /// True when every attribute is inside [0, 100]
    pub fn is_within_bounds(&self) -> bool {
        PsychStat::all()
            .iter()
            .all(|stat| (0.0..=100.0).contains(&self.get(*stat)))
    }
}

/// Wire form with every attribute optional
///
/// Missing or non-finite values take the documented default instead of
/// failing the load.
#[derive(Debug, Default, Deserialize)]
struct RawPsychProfile {
    mental_health: Option<f64>,
    stress: Option<f64>,
    team_trust: Option<f64>,
    battle_focus: Option<f64>,
    ego: Option<f64>,
    training: Option<f64>,
    communication: Option<f64>,
    gameplan_adherence: Option<f64>,
}

impl From<RawPsychProfile> for PsychProfile {
    fn from(raw: RawPsychProfile) -> Self {
        let fields = [
            (PsychStat::MentalHealth, raw.mental_health),
            (PsychStat::Stress, raw.stress),
            (PsychStat::TeamTrust, raw.team_trust),
            (PsychStat::BattleFocus, raw.battle_focus),
            (PsychStat::Ego, raw.ego),
            (PsychStat::Training, raw.training),
            (PsychStat::Communication, raw.communication),
            (PsychStat::GameplanAdherence, raw.gameplan_adherence),
        ];

        let mut profile = PsychProfile::default();
        for (stat, value) in fields {
            match value {
                Some(v) if v.is_finite() => profile.set(stat, v),
                Some(_) => {
                    tracing::warn!(?stat, "Malformed psych attribute, using default");
                }
                None => {}
            }
        }
        profile
    }
}
