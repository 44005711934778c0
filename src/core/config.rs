//! Engine configuration with documented constants
//!
//! All tunable numbers are collected here with explanations of their purpose.
//! A config is passed explicitly into every battle; there is no global copy,
//! so concurrent battles may run with different tunings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{ArenaError, Result};
use crate::rewards::skills::{default_interactions, SkillInteraction};

/// Round sequencing and damage tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleTuning {
    /// Battle ends after this many rounds even if nobody is down
    pub round_cap: u32,

    /// Upper bound of the uniform initiative roll added to speed
    pub initiative_jitter: f64,

    /// Fraction of max HP below which a fighter counts as injured
    pub injury_threshold: f64,

    /// Damage multiplier on a critical hit
    pub crit_multiplier: f64,

    /// The Special pick replaces the attack on every Nth round
    pub special_every: u32,

    /// Team morale at battle start
    pub starting_morale: f64,
}

impl Default for BattleTuning {
    fn default() -> Self {
        Self {
            round_cap: 9,
            initiative_jitter: 20.0,
            injury_threshold: 0.5,
            crit_multiplier: 1.5,
            special_every: 3,
            starting_morale: 50.0,
        }
    }
}

/// Weights of the gameplan adherence score
///
/// `score = base - stress_weight*stress + mental_health_weight*(mentalHealth-50)
///        + team_trust_weight*(teamTrust-50) + battle_focus_weight*(battleFocus-50) + jitter`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdherenceTuning {
    pub stress_weight: f64,
    pub mental_health_weight: f64,
    pub team_trust_weight: f64,
    pub battle_focus_weight: f64,
    /// Jitter is uniform in [-jitter, jitter]
    pub jitter: f64,
}

impl Default for AdherenceTuning {
    fn default() -> Self {
        Self {
            stress_weight: 0.30,
            mental_health_weight: 0.20,
            team_trust_weight: 0.10,
            battle_focus_weight: 0.15,
            jitter: 10.0,
        }
    }
}

/// Coefficients of the obedience roll
///
/// `p = base + morale_weight*morale - injured_penalty - rogue_penalty`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObedienceTuning {
    pub base: f64,
    pub morale_weight: f64,
    pub injured_penalty: f64,
    pub rogue_penalty: f64,
}

impl Default for ObedienceTuning {
    fn default() -> Self {
        Self {
            base: 0.8,
            morale_weight: 0.001,
            injured_penalty: 0.2,
            rogue_penalty: 0.3,
        }
    }
}

/// Cooperative timer windows (milliseconds of the driving clock)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerTuning {
    /// How long the coach has to pick a strategy before auto-fill
    pub strategy_selection_ms: u64,
    /// Pre-battle huddle length
    pub huddle_ms: u64,
    /// Coaching exchange is abandoned after this long
    pub coaching_timeout_ms: u64,
    /// Dialogue/narration calls give up after this long (2s..=5s)
    pub dialogue_timeout_ms: u64,
}

impl Default for TimerTuning {
    fn default() -> Self {
        Self {
            strategy_selection_ms: 30_000,
            huddle_ms: 10_000,
            coaching_timeout_ms: 20_000,
            dialogue_timeout_ms: 3_000,
        }
    }
}

/// Team chemistry scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemistryTuning {
    /// Chemistry of a roster with no notable relationships
    pub base: f64,
    /// Added per strong alliance (ally, strength > 60)
    pub alliance_bonus: f64,
    /// Subtracted per active conflict (enemy/rival, |strength| > 40)
    pub conflict_penalty: f64,
    /// Added per mentor/student bond
    pub mentoring_bonus: f64,
    /// Post-battle chemistry change on a win
    pub win_delta: f64,
    /// Post-battle chemistry change on a loss or draw
    pub loss_delta: f64,
    /// Post-battle teammate edge strength change on a win
    pub edge_win_delta: f64,
    /// Post-battle teammate edge strength change on a loss
    pub edge_loss_delta: f64,
}

impl Default for ChemistryTuning {
    fn default() -> Self {
        Self {
            base: 50.0,
            alliance_bonus: 5.0,
            conflict_penalty: 5.0,
            mentoring_bonus: 3.0,
            win_delta: 10.0,
            loss_delta: -5.0,
            edge_win_delta: 5.0,
            edge_loss_delta: -3.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub battle: BattleTuning,
    #[serde(default)]
    pub adherence: AdherenceTuning,
    #[serde(default)]
    pub obedience: ObedienceTuning,
    #[serde(default)]
    pub timers: TimerTuning,
    #[serde(default)]
    pub chemistry: ChemistryTuning,
    /// Skill pairs that unlock a named interaction when both reach a level
    #[serde(default = "default_interactions")]
    pub skill_interactions: Vec<SkillInteraction>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            battle: BattleTuning::default(),
            adherence: AdherenceTuning::default(),
            obedience: ObedienceTuning::default(),
            timers: TimerTuning::default(),
            chemistry: ChemistryTuning::default(),
            skill_interactions: default_interactions(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some((name, value)) = self.tunables().into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} ({}) must be a finite number", name, value));
        }

        if self.battle.round_cap == 0 {
            return Err("round_cap must be at least 1".into());
        }

        if !(0.0..=1.0).contains(&self.battle.injury_threshold) {
            return Err(format!(
                "injury_threshold ({}) must lie in [0, 1]",
                self.battle.injury_threshold
            ));
        }

        if self.battle.special_every == 0 {
            return Err("special_every must be at least 1".into());
        }

        if self.adherence.jitter < 0.0 || self.battle.initiative_jitter < 0.0 {
            return Err("Jitter ranges must be non-negative".into());
        }

        if !(2_000..=5_000).contains(&self.timers.dialogue_timeout_ms) {
            return Err(format!(
                "dialogue_timeout_ms ({}) must lie in 2000..=5000",
                self.timers.dialogue_timeout_ms
            ));
        }

        if !(0.0..=100.0).contains(&self.battle.starting_morale)
            || !(0.0..=100.0).contains(&self.chemistry.base)
        {
            return Err("starting_morale and chemistry base must lie in [0, 100]".into());
        }

        Ok(())
    }

    /// Every floating-point tunable with its dotted name
    fn tunables(&self) -> Vec<(&'static str, f64)> {
        let b = &self.battle;
        let a = &self.adherence;
        let o = &self.obedience;
        let c = &self.chemistry;
        vec![
            ("battle.initiative_jitter", b.initiative_jitter),
            ("battle.injury_threshold", b.injury_threshold),
            ("battle.crit_multiplier", b.crit_multiplier),
            ("battle.starting_morale", b.starting_morale),
            ("adherence.stress_weight", a.stress_weight),
            ("adherence.mental_health_weight", a.mental_health_weight),
            ("adherence.team_trust_weight", a.team_trust_weight),
            ("adherence.battle_focus_weight", a.battle_focus_weight),
            ("adherence.jitter", a.jitter),
            ("obedience.base", o.base),
            ("obedience.morale_weight", o.morale_weight),
            ("obedience.injured_penalty", o.injured_penalty),
            ("obedience.rogue_penalty", o.rogue_penalty),
            ("chemistry.base", c.base),
            ("chemistry.alliance_bonus", c.alliance_bonus),
            ("chemistry.conflict_penalty", c.conflict_penalty),
            ("chemistry.mentoring_bonus", c.mentoring_bonus),
            ("chemistry.win_delta", c.win_delta),
            ("chemistry.loss_delta", c.loss_delta),
            ("chemistry.edge_win_delta", c.edge_win_delta),
            ("chemistry.edge_loss_delta", c.edge_loss_delta),
        ]
    }
}

/// Load and validate a config from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate a config from TOML text
pub fn parse_config(contents: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(contents)?;
    config.validate().map_err(ArenaError::Config)?;
    Ok(config)
}
