//! Gameplan adherence scoring
//!
//! Scores how likely a character is to stick to the coach's plan this round
//! and sorts the score into four tiers. The contributing factors are kept in
//! a fixed order so alerts read the same way every time.

use serde::{Deserialize, Serialize};

use crate::core::config::AdherenceTuning;
use crate::core::dice::Dice;
use crate::psych::profile::PsychProfile;

/// Adherence tier, lower bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdherenceTier {
    /// score >= 80
    FollowingPlan,
    /// 60 <= score < 80
    Hesitant,
    /// 30 <= score < 60
    GoingRogue,
    /// score < 30
    CompletelyOffScript,
}

impl AdherenceTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            AdherenceTier::FollowingPlan
        } else if score >= 60.0 {
            AdherenceTier::Hesitant
        } else if score >= 30.0 {
            AdherenceTier::GoingRogue
        } else {
            AdherenceTier::CompletelyOffScript
        }
    }

    /// Consequences shown to the coach alongside an alert
    pub fn consequences(self) -> &'static [&'static str] {
        match self {
            AdherenceTier::FollowingPlan => &[],
            AdherenceTier::Hesitant => &["may delay or second-guess orders"],
            AdherenceTier::GoingRogue => &[
                "likely to ignore the selected strategy",
                "team morale at risk",
            ],
            AdherenceTier::CompletelyOffScript => &[
                "will act on impulse",
                "may endanger teammates",
                "team morale at serious risk",
            ],
        }
    }
}

/// Situational flags for one round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundContext {
    pub is_last_round_rogue: bool,
    pub is_injured: bool,
}

/// A reason that pushed the score around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdherenceFactor {
    HighStress,
    PoorMentalHealth,
    LowTeamTrust,
    PoorBattleFocus,
    InflatedEgo,
    Injured,
    WentRogueLastRound,
}

impl AdherenceFactor {
    pub fn describe(self) -> &'static str {
        match self {
            AdherenceFactor::HighStress => "high stress",
            AdherenceFactor::PoorMentalHealth => "poor mental health",
            AdherenceFactor::LowTeamTrust => "low trust in the team",
            AdherenceFactor::PoorBattleFocus => "poor battle focus",
            AdherenceFactor::InflatedEgo => "ego overriding instructions",
            AdherenceFactor::Injured => "fighting injured",
            AdherenceFactor::WentRogueLastRound => "went rogue last round",
        }
    }
}

/// Output of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceReport {
    pub score: f64,
    pub tier: AdherenceTier,
    pub jitter: f64,
    pub factors: Vec<AdherenceFactor>,
}

impl AdherenceReport {
    pub fn reasons(&self) -> Vec<String> {
        self.factors.iter().map(|f| f.describe().to_string()).collect()
    }
}

/// Scores adherence from a profile snapshot
#[derive(Debug, Clone, Default)]
pub struct AdherenceEvaluator {
    tuning: AdherenceTuning,
}

impl AdherenceEvaluator {
    pub fn new(tuning: AdherenceTuning) -> Self {
        Self { tuning }
    }

    /// Score with a jitter sampled from `dice`
    pub fn evaluate(
        &self,
        profile: &PsychProfile,
        context: RoundContext,
        dice: &mut impl Dice,
    ) -> AdherenceReport {
        let jitter = dice.uniform(-self.tuning.jitter, self.tuning.jitter);
        self.evaluate_with_jitter(profile, context, jitter)
    }

    /// Score with an explicit jitter term
    pub fn evaluate_with_jitter(
        &self,
        profile: &PsychProfile,
        context: RoundContext,
        jitter: f64,
    ) -> AdherenceReport {
        let t = &self.tuning;
        let raw = profile.gameplan_adherence() - t.stress_weight * profile.stress()
            + t.mental_health_weight * (profile.mental_health() - 50.0)
            + t.team_trust_weight * (profile.team_trust() - 50.0)
            + t.battle_focus_weight * (profile.battle_focus() - 50.0)
            + jitter;
        let score = raw.clamp(0.0, 100.0);

        AdherenceReport {
            score,
            tier: AdherenceTier::from_score(score),
            jitter,
            factors: contributing_factors(profile, context),
        }
    }
}

/// Factors in a fixed order: psych first, then situational
fn contributing_factors(profile: &PsychProfile, context: RoundContext) -> Vec<AdherenceFactor> {
    let mut factors = Vec::new();
    if profile.stress() > 70.0 {
        factors.push(AdherenceFactor::HighStress);
    }
    if profile.mental_health() < 40.0 {
        factors.push(AdherenceFactor::PoorMentalHealth);
    }
    if profile.team_trust() < 40.0 {
        factors.push(AdherenceFactor::LowTeamTrust);
    }
    if profile.battle_focus() < 40.0 {
        factors.push(AdherenceFactor::PoorBattleFocus);
    }
    if profile.ego() > 80.0 {
        factors.push(AdherenceFactor::InflatedEgo);
    }
    if context.is_injured {
        factors.push(AdherenceFactor::Injured);
    }
    if context.is_last_round_rogue {
        factors.push(AdherenceFactor::WentRogueLastRound);
    }
    factors
}
