//! Gather battle context for dialogue prompts
//!
//! A `DialogueRequest` says who speaks and why; its `DialogueContext` is the
//! plain-text situation summary the dialogue service receives alongside it.

use serde::{Deserialize, Serialize};

use crate::core::types::{CharacterId, Round};
use crate::psych::coaching::CoachingSession;
use crate::psych::rogue::{BattleTrend, RogueAction, RogueFacts};

/// Recent events kept in a context
const MAX_RECENT_EVENTS: usize = 5;

/// What kind of line is wanted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueKind {
    /// The coach reacting to a rogue action
    CoachResponse,
    /// The character explaining themselves after going rogue
    CharacterReaction,
    /// Flavor line at the start of a battle or round
    BattleCry,
    /// The coach's line in a coaching session
    CoachingLine,
    /// The character's reply in a coaching session
    CoachingReply,
}

/// Situation summary handed to the dialogue service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueContext {
    pub round: Round,
    pub trend: Option<BattleTrend>,
    pub rogue_action: Option<RogueAction>,
    pub opponent_name: Option<String>,
    /// Recent significant events, oldest first
    pub recent_events: Vec<String>,
}

impl DialogueContext {
    pub fn new(round: Round) -> Self {
        Self {
            round,
            ..Default::default()
        }
    }

    /// Context for the lines that follow a rogue action
    pub fn from_rogue_facts(round: Round, facts: &RogueFacts, opponent_name: &str) -> Self {
        let mut context = Self {
            round,
            trend: Some(facts.trend),
            rogue_action: Some(facts.action),
            opponent_name: Some(opponent_name.to_string()),
            recent_events: Vec::new(),
        };
        if facts.damage > 0.0 {
            context.add_event(format!("own side took {:.0} damage", facts.damage));
        }
        if facts.target_damage > 0.0 {
            context.add_event(format!("{} took {:.0} damage", opponent_name, facts.target_damage));
        }
        if facts.morale_change != 0.0 {
            context.add_event(format!("team morale moved {:+.0}", facts.morale_change));
        }
        context
    }

    /// Context for a coaching exchange
    pub fn from_coaching(round: Round, session: &CoachingSession) -> Self {
        let mut context = Self::new(round);
        context.add_event(format!(
            "coaching on {:?} ({:?}), effectiveness {:.0}",
            session.focus, session.intensity, session.effectiveness
        ));
        context
    }

    /// Add a recent event, keeping only the last few
    pub fn add_event(&mut self, event: impl Into<String>) {
        self.recent_events.push(event.into());
        if self.recent_events.len() > MAX_RECENT_EVENTS {
            self.recent_events.remove(0);
        }
    }

    /// Human-readable summary for prompts
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str(&format!("Round: {}\n", self.round));
        if let Some(trend) = self.trend {
            s.push_str(&format!("Trend: {:?}\n", trend));
        }
        if let Some(opponent) = &self.opponent_name {
            s.push_str(&format!("Opponent: {}\n", opponent));
        }
        if let Some(action) = self.rogue_action {
            s.push_str(&format!("Rogue action: {:?}\n", action));
        }

        if !self.recent_events.is_empty() {
            s.push_str("\nRecent Events:\n");
            for event in &self.recent_events {
                s.push_str(&format!("- {}\n", event));
            }
        }

        s
    }
}

/// One line of dialogue to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub character_id: CharacterId,
    pub character_name: String,
    pub kind: DialogueKind,
    pub context: DialogueContext,
}

impl DialogueRequest {
    pub fn new(character_id: CharacterId, character_name: &str, kind: DialogueKind, context: DialogueContext) -> Self {
        Self {
            character_id,
            character_name: character_name.to_string(),
            kind,
            context,
        }
    }

    /// System prompt for this request
    pub fn system_prompt(&self) -> String {
        let role = match self.kind {
            DialogueKind::CoachResponse => "You are the coach of an arena team. One of your fighters just ignored your orders.",
            DialogueKind::CharacterReaction => "You are an arena fighter who just ignored your coach's orders.",
            DialogueKind::BattleCry => "You are an arena fighter about to enter combat.",
            DialogueKind::CoachingLine => "You are the coach of an arena team, speaking with one of your fighters.",
            DialogueKind::CoachingReply => "You are an arena fighter answering your coach.",
        };
        format!("{} Reply with one or two sentences, in character, no stage directions.", role)
    }

    /// User prompt: the speaker plus the situation summary
    pub fn user_prompt(&self) -> String {
        format!("Fighter: {}\n{}", self.character_name, self.context.summary())
    }
}
