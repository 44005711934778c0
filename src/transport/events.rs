//! Real-time wire schema
//!
//! JSON objects tagged by `type`, one event per message.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::battle::events::GameplanAdherenceEvent;
use crate::battle::outcome::{BattleOutcome, EndReason};
use crate::battle::record::CombatRoundRecord;
use crate::battle::session::{BattleReport, BattleState};
use crate::battle::side::TeamEntry;
use crate::battle::strategy::StrategySelection;
use crate::core::error::Result;
use crate::core::types::{BattleId, CharacterId, Round, TeamSide};

/// Connected player (one coach)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Queue for a match with the given team
    FindMatch { player_id: PlayerId, team: TeamEntry },
    /// Attach to a running battle (rejoin or spectate)
    JoinBattle { player_id: PlayerId, battle_id: BattleId },
    SelectStrategy {
        player_id: PlayerId,
        battle_id: BattleId,
        selection: StrategySelection,
    },
    ChatMessage {
        player_id: PlayerId,
        battle_id: BattleId,
        text: String,
    },
}

impl InboundEvent {
    pub fn player_id(&self) -> &PlayerId {
        match self {
            InboundEvent::FindMatch { player_id, .. }
            | InboundEvent::JoinBattle { player_id, .. }
            | InboundEvent::SelectStrategy { player_id, .. }
            | InboundEvent::ChatMessage { player_id, .. } => player_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    BattleStart {
        battle_id: BattleId,
        /// `None` for spectators
        side: Option<TeamSide>,
        state: BattleState,
    },
    RoundStart {
        battle_id: BattleId,
        round: Round,
        turn_order: Vec<CharacterId>,
    },
    RoundEnd {
        battle_id: BattleId,
        round: Round,
        records: Vec<CombatRoundRecord>,
        state: BattleState,
    },
    BattleEnd {
        battle_id: BattleId,
        outcome: BattleOutcome,
        reason: EndReason,
        report: Option<BattleReport>,
    },
    ChatMessage {
        battle_id: BattleId,
        from: PlayerId,
        text: String,
    },
    AdherenceAlert {
        battle_id: BattleId,
        alert: GameplanAdherenceEvent,
    },
    /// An inbound event was rejected
    Error { message: String },
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::BattleStart { .. } => "battle_start",
            OutboundEvent::RoundStart { .. } => "round_start",
            OutboundEvent::RoundEnd { .. } => "round_end",
            OutboundEvent::BattleEnd { .. } => "battle_end",
            OutboundEvent::ChatMessage { .. } => "chat_message",
            OutboundEvent::AdherenceAlert { .. } => "adherence_alert",
            OutboundEvent::Error { .. } => "error",
        }
    }
}

pub fn decode_inbound(message: &str) -> Result<InboundEvent> {
    Ok(serde_json::from_str(message)?)
}

pub fn encode_outbound(event: &OutboundEvent) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ArenaError;

    #[test]
    fn test_decode_select_strategy() {
        let battle_id = BattleId::new();
        let raw = format!(
            r#"{{"type":"select_strategy","player_id":"p1","battle_id":"{}","selection":{{"attack":"Strike"}}}}"#,
            battle_id
        );
        let event = decode_inbound(&raw).unwrap();
        match event {
            InboundEvent::SelectStrategy { player_id, battle_id: id, selection } => {
                assert_eq!(player_id, PlayerId::new("p1"));
                assert_eq!(id, battle_id);
                assert_eq!(selection.attack.as_deref(), Some("Strike"));
                assert!(selection.defense.is_none());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let err = decode_inbound(r#"{"type":"open_pack","player_id":"p1"}"#).unwrap_err();
        assert!(matches!(err, ArenaError::Serde(_)));
    }

    #[test]
    fn test_outbound_tag_matches_name() {
        let event = OutboundEvent::ChatMessage {
            battle_id: BattleId::new(),
            from: PlayerId::new("p2"),
            text: "gg".into(),
        };
        let json = encode_outbound(&event).unwrap();
        assert!(json.contains(&format!("\"type\":\"{}\"", event.name())));
    }
}
