//! Best-effort narration on top of a dialogue service
//!
//! The narrator runs after a battle step has returned. Every call is bounded
//! by the configured dialogue timeout; a slow or failing service yields a line
//! from the fallback pool instead, so narration always completes.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::battle::events::BattleEvent;
use crate::core::config::TimerTuning;
use crate::core::error::Result;
use crate::core::types::{CharacterId, Round};
use crate::narrative::context::{DialogueContext, DialogueKind, DialogueRequest};
use crate::narrative::fallback::FallbackPool;
use crate::psych::coaching::{CoachingExchange, CoachingSession};
use crate::psych::rogue::RogueFacts;

/// External text generator
pub trait DialogueService {
    fn generate(&self, request: &DialogueRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Where a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSource {
    Service,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narration {
    pub text: String,
    pub source: LineSource,
}

impl Narration {
    pub fn is_degraded(&self) -> bool {
        self.source == LineSource::Fallback
    }
}

/// Coach and character lines for one rogue action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RogueDialogue {
    pub character_id: CharacterId,
    pub round: Round,
    pub coach_response: Narration,
    pub character_reaction: Narration,
}

pub struct Narrator<S> {
    service: Option<S>,
    timeout: Duration,
    fallback: FallbackPool,
}

impl<S: DialogueService> Narrator<S> {
    pub fn new(service: S, timeout_ms: u64) -> Self {
        Self {
            service: Some(service),
            timeout: Duration::from_millis(timeout_ms),
            fallback: FallbackPool::new(),
        }
    }

    /// Narrator that only uses the fallback pool
    pub fn offline() -> Self {
        Self {
            service: None,
            timeout: Duration::ZERO,
            fallback: FallbackPool::new(),
        }
    }

    pub fn from_config(service: Option<S>, timers: &TimerTuning) -> Self {
        match service {
            Some(service) => Self::new(service, timers.dialogue_timeout_ms),
            None => Self::offline(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.service.is_some()
    }

    /// One line, from the service when it answers in time
    pub async fn line(&self, request: &DialogueRequest) -> Narration {
        let Some(service) = &self.service else {
            return self.fallback_line(request);
        };

        match tokio::time::timeout(self.timeout, service.generate(request)).await {
            Ok(Ok(text)) => Narration {
                text,
                source: LineSource::Service,
            },
            Ok(Err(e)) => {
                tracing::warn!(character = %request.character_id, kind = ?request.kind, error = %e, "Dialogue degraded: service error");
                self.fallback_line(request)
            }
            Err(_) => {
                tracing::warn!(
                    character = %request.character_id,
                    kind = ?request.kind,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Dialogue degraded: service timed out"
                );
                self.fallback_line(request)
            }
        }
    }

    fn fallback_line(&self, request: &DialogueRequest) -> Narration {
        Narration {
            text: self.fallback.line(request),
            source: LineSource::Fallback,
        }
    }

    /// Coach response and character reaction for a rogue action
    pub async fn rogue_exchange(
        &self,
        round: Round,
        facts: &RogueFacts,
        actor_name: &str,
        opponent_name: &str,
    ) -> RogueDialogue {
        let context = DialogueContext::from_rogue_facts(round, facts, opponent_name);
        let coach = DialogueRequest::new(facts.actor.clone(), actor_name, DialogueKind::CoachResponse, context.clone());
        let reaction = DialogueRequest::new(facts.actor.clone(), actor_name, DialogueKind::CharacterReaction, context);

        let (coach_response, character_reaction) = tokio::join!(self.line(&coach), self.line(&reaction));
        RogueDialogue {
            character_id: facts.actor.clone(),
            round,
            coach_response,
            character_reaction,
        }
    }

    /// Text for a coaching session, ready to archive with it
    pub async fn coaching_exchange(&self, round: Round, session: &CoachingSession, character_name: &str) -> CoachingExchange {
        let context = DialogueContext::from_coaching(round, session);
        let coach = DialogueRequest::new(
            session.character_id.clone(),
            character_name,
            DialogueKind::CoachingLine,
            context.clone(),
        );
        let reply = DialogueRequest::new(session.character_id.clone(), character_name, DialogueKind::CoachingReply, context);

        let (coach_line, character_line) = tokio::join!(self.line(&coach), self.line(&reply));
        CoachingExchange {
            coach_line: coach_line.text,
            character_line: character_line.text,
        }
    }

    /// Dialogue for every rogue action in a batch of battle events
    ///
    /// `name_of` maps ids to display names; the id itself is used when it
    /// returns `None`.
    pub async fn narrate_events<F>(&self, events: &[BattleEvent], name_of: F) -> Vec<RogueDialogue>
    where
        F: Fn(&CharacterId) -> Option<String>,
    {
        let mut round = 0;
        let mut out = Vec::new();
        for event in events {
            match event {
                BattleEvent::RoundStarted { round: r, .. } => round = *r,
                BattleEvent::RogueFacts { facts } => {
                    let actor = name_of(&facts.actor).unwrap_or_else(|| facts.actor.to_string());
                    let opponent = name_of(&facts.opponent).unwrap_or_else(|| facts.opponent.to_string());
                    out.push(self.rogue_exchange(round, facts, &actor, &opponent).await);
                }
                _ => {}
            }
        }
        out
    }
}
