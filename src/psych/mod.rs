//! Character psychology: profile, adherence, obedience, rogue actions, coaching
//!
//! The adherence score and the obedience roll are separate signals. The score
//! feeds alerts and the rogue judge; the roll decides obey/deviate.

pub mod adherence;
pub mod coaching;
pub mod obedience;
pub mod profile;
pub mod rogue;

pub use adherence::{
    AdherenceEvaluator, AdherenceFactor, AdherenceReport, AdherenceTier, RoundContext,
};
pub use coaching::{
    CoachingEffectProcessor, CoachingExchange, CoachingFocus, CoachingIntensity, CoachingLog,
    CoachingRequest, CoachingSession, PersonalityTrait,
};
pub use obedience::{ObedienceArbiter, ObedienceDecision, ObedienceInput};
pub use profile::{PsychProfile, PsychStat};
pub use rogue::{
    BattleTrend, JudgeRuling, RogueAction, RogueActionJudge, RogueContext, RogueFacts,
    RogueVerdict,
};
