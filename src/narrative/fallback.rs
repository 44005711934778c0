//! Local fallback lines used when the dialogue service is unavailable
//!
//! Selection is a pure function of the request, so a degraded battle replays
//! with the same text.

use crate::narrative::context::{DialogueKind, DialogueRequest};
use crate::psych::rogue::RogueAction;

const COACH_RESPONSES: &[&str] = &[
    "That was not the plan, {name}. Get your head back in this.",
    "{name}! We talked about this. Stick to the call.",
    "I can't help you if you won't listen, {name}.",
    "Breathe, {name}. Next round we do it my way.",
];

const PANIC_REACTIONS: &[&str] = &[
    "I froze. I just... froze.",
    "Too much, coach. It was all too much.",
];

const FRIENDLY_FIRE_REACTIONS: &[&str] = &[
    "They were in my way!",
    "I didn't mean to hit our own. It just happened.",
];

const OVERCOMMIT_REACTIONS: &[&str] = &[
    "I saw an opening and I took it. Every bit of it.",
    "Holding back wasn't going to win this.",
];

const REFUSAL_REACTIONS: &[&str] = &[
    "No. Not that order, not today.",
    "Find someone else to run your plan.",
];

const GENERIC_REACTIONS: &[&str] = &[
    "I did what I had to do.",
    "Trust me on this one.",
];

const BATTLE_CRIES: &[&str] = &[
    "Let's finish this!",
    "Stay with me, everyone!",
    "This one is ours.",
];

const COACHING_LINES: &[&str] = &[
    "Talk to me, {name}. How are you holding up?",
    "{name}, I need you sharp for the next round.",
    "Focus on the plan, {name}. One exchange at a time.",
];

const COACHING_REPLIES: &[&str] = &[
    "I hear you, coach.",
    "Alright. I'll try it your way.",
    "Give me a second to steady myself.",
];

/// Deterministic pool of fallback lines
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackPool;

impl FallbackPool {
    pub fn new() -> Self {
        Self
    }

    /// Pick a line for the request
    pub fn line(&self, request: &DialogueRequest) -> String {
        let pool = match request.kind {
            DialogueKind::CoachResponse => COACH_RESPONSES,
            DialogueKind::CharacterReaction => match request.context.rogue_action {
                Some(RogueAction::Panic) => PANIC_REACTIONS,
                Some(RogueAction::FriendlyFire) => FRIENDLY_FIRE_REACTIONS,
                Some(RogueAction::Overcommit) => OVERCOMMIT_REACTIONS,
                Some(RogueAction::Refusal) => REFUSAL_REACTIONS,
                None => GENERIC_REACTIONS,
            },
            DialogueKind::BattleCry => BATTLE_CRIES,
            DialogueKind::CoachingLine => COACHING_LINES,
            DialogueKind::CoachingReply => COACHING_REPLIES,
        };
        let index = Self::pick(request, pool.len());
        pool[index].replace("{name}", &request.character_name)
    }

    /// FNV-1a over the character id and round
    fn pick(request: &DialogueRequest, len: usize) -> usize {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let bytes = request
            .character_id
            .as_str()
            .bytes()
            .chain(request.context.round.to_le_bytes());
        for byte in bytes {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        (hash % len.max(1) as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CharacterId;
    use crate::narrative::context::DialogueContext;

    fn request(kind: DialogueKind, round: u32, action: Option<RogueAction>) -> DialogueRequest {
        let mut context = DialogueContext::new(round);
        context.rogue_action = action;
        DialogueRequest::new(CharacterId::canonical("Joan of Arc"), "Joan of Arc", kind, context)
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let pool = FallbackPool::new();
        let req = request(DialogueKind::CoachResponse, 3, None);
        assert_eq!(pool.line(&req), pool.line(&req));
    }

    #[test]
    fn test_reaction_matches_action() {
        let pool = FallbackPool::new();
        for round in 1..=9 {
            let line = pool.line(&request(DialogueKind::CharacterReaction, round, Some(RogueAction::Refusal)));
            assert!(REFUSAL_REACTIONS.contains(&line.as_str()));
        }
    }

    #[test]
    fn test_name_substituted() {
        let pool = FallbackPool::new();
        for round in 1..=9 {
            let line = pool.line(&request(DialogueKind::CoachResponse, round, None));
            assert!(line.contains("Joan of Arc"));
            assert!(!line.contains("{name}"));
        }
    }
}
