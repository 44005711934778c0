//! Applies inbound events to the battle registry
//!
//! Players are paired first come, first served. Once both coaches have
//! submitted a strategy (or the selection timer fires) the round is resolved
//! and its results are broadcast to everyone attached to the battle.

use ahash::AHashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::battle::events::BattleEvent;
use crate::battle::phase::{BattleInput, BattlePhase};
use crate::battle::record::CombatRoundRecord;
use crate::battle::registry::BattleRegistry;
use crate::battle::session::{BattleSetup, BattleState};
use crate::battle::side::TeamEntry;
use crate::core::config::EngineConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{BattleId, TeamSide};
use crate::team::relationships::RelationshipGraph;
use crate::transport::events::{InboundEvent, OutboundEvent, PlayerId};

/// Messages addressed to players
pub type Outbox = Vec<(PlayerId, OutboundEvent)>;

/// Who is attached to one battle
#[derive(Debug, Clone)]
struct Seats {
    home: PlayerId,
    away: PlayerId,
    spectators: Vec<PlayerId>,
    home_ready: bool,
    away_ready: bool,
}

impl Seats {
    fn side_of(&self, player: &PlayerId) -> Option<TeamSide> {
        if &self.home == player {
            Some(TeamSide::Home)
        } else if &self.away == player {
            Some(TeamSide::Away)
        } else {
            None
        }
    }

    fn everyone(&self) -> impl Iterator<Item = &PlayerId> {
        [&self.home, &self.away].into_iter().chain(self.spectators.iter())
    }

    fn mark_ready(&mut self, side: TeamSide) {
        match side {
            TeamSide::Home => self.home_ready = true,
            TeamSide::Away => self.away_ready = true,
        }
    }

    fn all_ready(&self) -> bool {
        self.home_ready && self.away_ready
    }
}

pub struct Dispatcher {
    registry: BattleRegistry,
    queue: VecDeque<(PlayerId, TeamEntry)>,
    seats: AHashMap<BattleId, Seats>,
    players: AHashMap<PlayerId, BattleId>,
    relationships: RelationshipGraph,
    next_seed: u64,
}

impl Dispatcher {
    pub fn new(config: Arc<EngineConfig>, seed: u64) -> Self {
        Self {
            registry: BattleRegistry::new(config),
            queue: VecDeque::new(),
            seats: AHashMap::new(),
            players: AHashMap::new(),
            relationships: RelationshipGraph::new(),
            next_seed: seed,
        }
    }

    /// Relationships every new battle starts from
    pub fn with_relationships(mut self, graph: RelationshipGraph) -> Self {
        self.relationships = graph;
        self
    }

    pub fn registry(&self) -> &BattleRegistry {
        &self.registry
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn battle_of(&self, player: &PlayerId) -> Option<BattleId> {
        self.players.get(player).copied()
    }

    /// Apply one inbound event
    ///
    /// Rejected events are answered with an `Error` message to the sender
    /// rather than failing the dispatcher.
    pub fn handle(&mut self, event: InboundEvent, now_ms: u64) -> Outbox {
        let sender = event.player_id().clone();
        match self.apply(event, now_ms) {
            Ok(outbox) => outbox,
            Err(e) => {
                tracing::warn!(player = %sender, error = %e, "Inbound event rejected");
                vec![(sender, OutboundEvent::Error { message: e.to_string() })]
            }
        }
    }

    /// Fire due timers and broadcast what they caused
    pub fn pump(&mut self, now_ms: u64) -> Outbox {
        let mut outbox = Vec::new();
        for (battle_id, events) in self.registry.poll(now_ms) {
            match self.drive(battle_id, events, now_ms) {
                Ok(mut out) => outbox.append(&mut out),
                Err(e) => tracing::warn!(battle = %battle_id, error = %e, "Timer-driven round failed"),
            }
        }
        outbox
    }

    fn apply(&mut self, event: InboundEvent, now_ms: u64) -> Result<Outbox> {
        match event {
            InboundEvent::FindMatch { player_id, team } => self.find_match(player_id, team, now_ms),
            InboundEvent::JoinBattle { player_id, battle_id } => self.join(player_id, battle_id),
            InboundEvent::SelectStrategy {
                player_id,
                battle_id,
                selection,
            } => {
                let seats = self.seats.get(&battle_id).ok_or(ArenaError::BattleNotFound(battle_id))?;
                let side = seats
                    .side_of(&player_id)
                    .ok_or_else(|| ArenaError::InvalidStrategy(format!("{} is not seated in this battle", player_id)))?;

                let events = self
                    .registry
                    .advance(battle_id, BattleInput::SelectStrategy { side, selection }, now_ms)?;
                let all_ready = match self.seats.get_mut(&battle_id) {
                    Some(seats) => {
                        seats.mark_ready(side);
                        seats.all_ready()
                    }
                    None => false,
                };

                if all_ready {
                    let mut events = events;
                    events.extend(self.registry.advance(battle_id, BattleInput::Proceed, now_ms)?);
                    self.drive(battle_id, events, now_ms)
                } else {
                    Ok(Vec::new())
                }
            }
            InboundEvent::ChatMessage {
                player_id,
                battle_id,
                text,
            } => {
                let seats = self.seats.get(&battle_id).ok_or(ArenaError::BattleNotFound(battle_id))?;
                let message = OutboundEvent::ChatMessage {
                    battle_id,
                    from: player_id,
                    text,
                };
                Ok(seats.everyone().map(|p| (p.clone(), message.clone())).collect())
            }
        }
    }

    fn find_match(&mut self, player_id: PlayerId, team: TeamEntry, now_ms: u64) -> Result<Outbox> {
        if self.players.contains_key(&player_id) || self.queue.iter().any(|(p, _)| p == &player_id) {
            tracing::warn!(player = %player_id, "Already queued or in a battle");
            return Ok(Vec::new());
        }
        self.queue.push_back((player_id, team));

        if self.queue.len() < 2 {
            return Ok(Vec::new());
        }
        let (Some((home_player, home)), Some((away_player, away))) = (self.queue.pop_front(), self.queue.pop_front()) else {
            return Ok(Vec::new());
        };

        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(1);
        let battle_id = self.registry.create(BattleSetup {
            home,
            away,
            relationships: self.relationships.clone(),
            seed,
        });
        self.seats.insert(
            battle_id,
            Seats {
                home: home_player.clone(),
                away: away_player.clone(),
                spectators: Vec::new(),
                home_ready: false,
                away_ready: false,
            },
        );
        self.players.insert(home_player.clone(), battle_id);
        self.players.insert(away_player.clone(), battle_id);
        tracing::info!(battle = %battle_id, home = %home_player, away = %away_player, "Match made");

        // No coaching over the wire: the huddle closes at once
        self.registry.advance(battle_id, BattleInput::StartBattle, now_ms)?;
        self.registry.advance(battle_id, BattleInput::EndHuddle, now_ms)?;

        let state = self.state(battle_id)?;
        Ok(vec![
            (
                home_player,
                OutboundEvent::BattleStart {
                    battle_id,
                    side: Some(TeamSide::Home),
                    state: state.clone(),
                },
            ),
            (
                away_player,
                OutboundEvent::BattleStart {
                    battle_id,
                    side: Some(TeamSide::Away),
                    state,
                },
            ),
        ])
    }

    fn join(&mut self, player_id: PlayerId, battle_id: BattleId) -> Result<Outbox> {
        let state = self.state(battle_id)?;
        let seats = self
            .seats
            .get_mut(&battle_id)
            .ok_or(ArenaError::BattleNotFound(battle_id))?;
        let side = seats.side_of(&player_id);
        if side.is_none() && !seats.spectators.contains(&player_id) {
            seats.spectators.push(player_id.clone());
        }
        Ok(vec![(
            player_id,
            OutboundEvent::BattleStart {
                battle_id,
                side,
                state,
            },
        )])
    }

    fn state(&self, battle_id: BattleId) -> Result<BattleState> {
        self.registry
            .get(battle_id)
            .map(|s| s.state())
            .ok_or(ArenaError::BattleNotFound(battle_id))
    }

    /// Run the battle forward until it waits on coaches again, then translate
    fn drive(&mut self, battle_id: BattleId, mut events: Vec<BattleEvent>, now_ms: u64) -> Result<Outbox> {
        loop {
            let phase = self
                .registry
                .get(battle_id)
                .map(|s| s.phase())
                .ok_or(ArenaError::BattleNotFound(battle_id))?;
            let input = match phase {
                BattlePhase::RoundCombat => BattleInput::ResolveRound,
                BattlePhase::RoundEnd => BattleInput::FinishRound,
                _ => break,
            };
            events.extend(self.registry.advance(battle_id, input, now_ms)?);
        }

        let outbound = self.translate(battle_id, &events)?;
        let Some(seats) = self.seats.get_mut(&battle_id) else {
            return Ok(Vec::new());
        };
        if events.iter().any(|e| matches!(e, BattleEvent::PhaseChanged { to: BattlePhase::StrategySelection, .. })) {
            seats.home_ready = false;
            seats.away_ready = false;
        }
        let recipients: Vec<PlayerId> = seats.everyone().cloned().collect();

        let ended = outbound.iter().any(|e| matches!(e, OutboundEvent::BattleEnd { .. }));
        if ended {
            self.release(battle_id);
        }

        Ok(outbound
            .into_iter()
            .flat_map(|event| recipients.iter().map(move |p| (p.clone(), event.clone())).collect::<Vec<_>>())
            .collect())
    }

    fn translate(&self, battle_id: BattleId, events: &[BattleEvent]) -> Result<Vec<OutboundEvent>> {
        let session = self
            .registry
            .get(battle_id)
            .ok_or(ArenaError::BattleNotFound(battle_id))?;

        let mut out = Vec::new();
        let mut records: Vec<CombatRoundRecord> = Vec::new();
        for event in events {
            match event {
                BattleEvent::RoundStarted { round, turn_order } => {
                    records.clear();
                    out.push(OutboundEvent::RoundStart {
                        battle_id,
                        round: *round,
                        turn_order: turn_order.clone(),
                    });
                }
                BattleEvent::Action { record } => records.push(record.clone()),
                BattleEvent::AdherenceAlert { alert } => out.push(OutboundEvent::AdherenceAlert {
                    battle_id,
                    alert: alert.clone(),
                }),
                BattleEvent::RoundEnded { round, .. } => out.push(OutboundEvent::RoundEnd {
                    battle_id,
                    round: *round,
                    records: std::mem::take(&mut records),
                    state: session.state(),
                }),
                BattleEvent::BattleEnded { outcome, reason, .. } => out.push(OutboundEvent::BattleEnd {
                    battle_id,
                    outcome: *outcome,
                    reason: *reason,
                    report: session.report(),
                }),
                _ => {}
            }
        }
        Ok(out)
    }

    /// Forget a finished battle
    fn release(&mut self, battle_id: BattleId) {
        if let Some(seats) = self.seats.remove(&battle_id) {
            self.players.remove(&seats.home);
            self.players.remove(&seats.away);
        }
        self.registry.abort(battle_id);
    }
}
