//! Out-of-round coaching interventions
//!
//! A coaching session targets one character with a focus and an intensity.
//! Effectiveness comes from how well the focus matches the character's state
//! and personality; it scales the deltas applied to the profile. Sessions are
//! appended to an archive and never edited afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::CharacterId;
use crate::psych::profile::{PsychProfile, PsychStat};

/// What the coach works on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachingFocus {
    MentalHealthSupport,
    ConfidenceBoost,
    StrategyDrill,
    TeamBuilding,
    FocusTraining,
    EgoCheck,
}

impl CoachingFocus {
    pub fn all() -> &'static [CoachingFocus] {
        &[
            CoachingFocus::MentalHealthSupport,
            CoachingFocus::ConfidenceBoost,
            CoachingFocus::StrategyDrill,
            CoachingFocus::TeamBuilding,
            CoachingFocus::FocusTraining,
            CoachingFocus::EgoCheck,
        ]
    }

    /// Deltas at full effectiveness and moderate intensity
    fn base_deltas(self) -> &'static [(PsychStat, f64)] {
        match self {
            CoachingFocus::MentalHealthSupport => {
                &[(PsychStat::MentalHealth, 15.0), (PsychStat::Stress, -20.0)]
            }
            CoachingFocus::ConfidenceBoost => &[
                (PsychStat::MentalHealth, 10.0),
                (PsychStat::Ego, 8.0),
                (PsychStat::BattleFocus, 5.0),
            ],
            CoachingFocus::StrategyDrill => &[
                (PsychStat::GameplanAdherence, 15.0),
                (PsychStat::Training, 10.0),
                (PsychStat::Stress, 5.0),
            ],
            CoachingFocus::TeamBuilding => {
                &[(PsychStat::TeamTrust, 15.0), (PsychStat::Communication, 10.0)]
            }
            CoachingFocus::FocusTraining => {
                &[(PsychStat::BattleFocus, 15.0), (PsychStat::Stress, -5.0)]
            }
            CoachingFocus::EgoCheck => &[
                (PsychStat::Ego, -15.0),
                (PsychStat::GameplanAdherence, 8.0),
                (PsychStat::MentalHealth, -5.0),
            ],
        }
    }
}

/// How hard the coach pushes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachingIntensity {
    Gentle,
    Moderate,
    Firm,
}

impl CoachingIntensity {
    fn scale(self) -> f64 {
        match self {
            CoachingIntensity::Gentle => 0.8,
            CoachingIntensity::Moderate => 1.0,
            CoachingIntensity::Firm => 1.25,
        }
    }

    /// Stress side effect of the delivery itself
    fn stress_side_effect(self) -> f64 {
        match self {
            CoachingIntensity::Gentle => -2.0,
            CoachingIntensity::Moderate => 0.0,
            CoachingIntensity::Firm => 4.0,
        }
    }
}

/// Documented personality traits that change how coaching lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityTrait {
    /// +20 gentle, -25 firm
    Sensitive,
    /// -20 gentle, +15 firm
    Stubborn,
    /// -25 ego check, +15 confidence boost
    Proud,
    /// +15 strategy drill, +15 focus training
    Disciplined,
    /// -20 team building
    Loner,
    /// +25 mental health support, -15 firm
    Anxious,
    /// +20 team building, +15 confidence boost
    Loyal,
}

impl PersonalityTrait {
    pub fn modifier(self, focus: CoachingFocus, intensity: CoachingIntensity) -> f64 {
        use CoachingFocus as F;
        use CoachingIntensity as I;
        match self {
            PersonalityTrait::Sensitive => match intensity {
                I::Gentle => 20.0,
                I::Firm => -25.0,
                I::Moderate => 0.0,
            },
            PersonalityTrait::Stubborn => match intensity {
                I::Gentle => -20.0,
                I::Firm => 15.0,
                I::Moderate => 0.0,
            },
            PersonalityTrait::Proud => match focus {
                F::EgoCheck => -25.0,
                F::ConfidenceBoost => 15.0,
                _ => 0.0,
            },
            PersonalityTrait::Disciplined => match focus {
                F::StrategyDrill | F::FocusTraining => 15.0,
                _ => 0.0,
            },
            PersonalityTrait::Loner => match focus {
                F::TeamBuilding => -20.0,
                _ => 0.0,
            },
            PersonalityTrait::Anxious => {
                let focus_bonus = if focus == F::MentalHealthSupport { 25.0 } else { 0.0 };
                let firm_penalty = if intensity == I::Firm { -15.0 } else { 0.0 };
                focus_bonus + firm_penalty
            }
            PersonalityTrait::Loyal => match focus {
                F::TeamBuilding => 20.0,
                F::ConfidenceBoost => 15.0,
                _ => 0.0,
            },
        }
    }
}

/// A coach's request before it is applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingRequest {
    pub character_id: CharacterId,
    pub focus: CoachingFocus,
    pub intensity: CoachingIntensity,
}

/// Coach line and character reply attached to an archived session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingExchange {
    pub coach_line: String,
    pub character_line: String,
}

/// An applied session; immutable once archived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingSession {
    pub character_id: CharacterId,
    pub focus: CoachingFocus,
    pub intensity: CoachingIntensity,
    pub effectiveness: f64,
    /// Changes that actually landed after clamping
    pub deltas: BTreeMap<PsychStat, f64>,
    pub exchange: Option<CoachingExchange>,
}

/// Computes effectiveness and applies sessions
#[derive(Debug, Clone, Default)]
pub struct CoachingEffectProcessor;

impl CoachingEffectProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Effectiveness before personality traits
    pub fn base_effectiveness(
        &self,
        profile: &PsychProfile,
        focus: CoachingFocus,
        intensity: CoachingIntensity,
    ) -> f64 {
        let mut eff = 50.0;
        if profile.stress() > 70.0 && focus == CoachingFocus::MentalHealthSupport {
            eff += 30.0;
        }
        if profile.mental_health() < 40.0 && focus == CoachingFocus::ConfidenceBoost {
            eff += 25.0;
        }
        if profile.gameplan_adherence() < 50.0 && intensity == CoachingIntensity::Gentle {
            eff += 20.0;
        }
        if profile.gameplan_adherence() > 80.0 && intensity == CoachingIntensity::Firm {
            eff += 15.0;
        }
        eff
    }

    /// Full effectiveness clamped to [10, 100]
    pub fn effectiveness(
        &self,
        profile: &PsychProfile,
        traits: &[PersonalityTrait],
        focus: CoachingFocus,
        intensity: CoachingIntensity,
    ) -> f64 {
        let base = self.base_effectiveness(profile, focus, intensity);
        let trait_total: f64 = traits.iter().map(|t| t.modifier(focus, intensity)).sum();
        (base + trait_total).clamp(10.0, 100.0)
    }

    /// Apply a request to the profile and describe what happened
    pub fn apply(
        &self,
        request: &CoachingRequest,
        traits: &[PersonalityTrait],
        profile: &mut PsychProfile,
    ) -> CoachingSession {
        let effectiveness = self.effectiveness(profile, traits, request.focus, request.intensity);
        let factor = effectiveness / 100.0 * request.intensity.scale();

        let mut deltas: BTreeMap<PsychStat, f64> = BTreeMap::new();
        for (stat, base) in request.focus.base_deltas() {
            let magnitude = (base * factor).clamp(-effectiveness, effectiveness);
            let applied = profile.adjust(*stat, magnitude);
            *deltas.entry(*stat).or_insert(0.0) += applied;
        }

        let side_effect = request.intensity.stress_side_effect();
        if side_effect != 0.0 {
            let applied = profile.adjust(PsychStat::Stress, side_effect);
            *deltas.entry(PsychStat::Stress).or_insert(0.0) += applied;
        }

        tracing::info!(
            character = %request.character_id,
            focus = ?request.focus,
            intensity = ?request.intensity,
            effectiveness,
            "Coaching session applied"
        );

        CoachingSession {
            character_id: request.character_id.clone(),
            focus: request.focus,
            intensity: request.intensity,
            effectiveness,
            deltas,
            exchange: None,
        }
    }
}

/// Append-only archive of coaching sessions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoachingLog {
    sessions: Vec<CoachingSession>,
}

impl CoachingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive a session together with its exchange text
    pub fn archive(&mut self, mut session: CoachingSession, exchange: Option<CoachingExchange>) {
        if exchange.is_some() {
            session.exchange = exchange;
        }
        self.sessions.push(session);
    }

    pub fn sessions(&self) -> &[CoachingSession] {
        &self.sessions
    }

    pub fn for_character<'a>(
        &'a self,
        id: &'a CharacterId,
    ) -> impl Iterator<Item = &'a CoachingSession> + 'a {
        self.sessions.iter().filter(move |s| &s.character_id == id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
