//! Battle session - the explicit owner of one battle's state
//!
//! A session is advanced only through [`BattleSession::advance`], a step
//! function from one input to a list of events. It never sleeps or reads a
//! clock: timers are requested as events and come back as
//! [`BattleInput::TimerExpired`] with the token they were armed with.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::battle::constants::{COACHING_MORALE, COACHING_MORALE_EFFECTIVENESS};
use crate::battle::events::BattleEvent;
use crate::battle::fighter::Fighter;
use crate::battle::outcome::{check_battle_end, BattleOutcome, EndReason};
use crate::battle::phase::{BattleInput, BattlePhase};
use crate::battle::record::BattleLog;
use crate::battle::round::RoundResolver;
use crate::battle::side::{Arena, BattleSide, TeamEntry};
use crate::battle::strategy::{resolve_strategy, StrategySelection};
use crate::battle::timers::{TimerKind, TimerToken};
use crate::core::config::EngineConfig;
use crate::core::dice::Dice;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{BattleId, CharacterId, MatchResult, Round, TeamSide};
use crate::psych::coaching::{CoachingEffectProcessor, CoachingExchange, CoachingLog, CoachingRequest};
use crate::psych::profile::PsychProfile;
use crate::rewards::performance::BattlePerformance;
use crate::team::chemistry::{ChemistryBand, TeamChemistry};
use crate::team::morale::MoraleCause;
use crate::team::relationships::RelationshipGraph;

/// Everything needed to start (or restart) a battle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleSetup {
    pub home: TeamEntry,
    pub away: TeamEntry,
    #[serde(default)]
    pub relationships: RelationshipGraph,
    /// Seed for the battle's dice
    #[serde(default)]
    pub seed: u64,
}

/// Read-only view of one side for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideView {
    pub side: TeamSide,
    pub team_name: String,
    pub fighter_id: CharacterId,
    pub fighter_name: String,
    pub hp: f64,
    pub max_hp: f64,
    pub morale: f64,
    pub chemistry: f64,
    pub chemistry_band: ChemistryBand,
}

impl SideView {
    fn from_side(side: &BattleSide) -> Self {
        Self {
            side: side.side,
            team_name: side.name.clone(),
            fighter_id: side.fighter.id.clone(),
            fighter_name: side.fighter.name.clone(),
            hp: side.fighter.hp(),
            max_hp: side.fighter.max_hp,
            morale: side.morale.current(),
            chemistry: side.chemistry.value,
            chemistry_band: side.chemistry.band,
        }
    }
}

/// Read-only battle snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub battle_id: BattleId,
    pub phase: BattlePhase,
    pub round: Round,
    pub round_cap: Round,
    pub home: SideView,
    pub away: SideView,
    pub outcome: Option<BattleOutcome>,
}

/// Chemistry of one team before and after the battle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChemistryChange {
    pub side: TeamSide,
    pub result: MatchResult,
    pub before: TeamChemistry,
    pub after: TeamChemistry,
}

/// Deltas handed to the external store once a battle is over
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleReport {
    pub battle_id: BattleId,
    pub outcome: BattleOutcome,
    pub reason: EndReason,
    pub rounds: Round,
    pub performances: Vec<BattlePerformance>,
    pub chemistry: Vec<ChemistryChange>,
    /// Fighters' profiles after in-battle drift and coaching
    pub profiles: BTreeMap<CharacterId, PsychProfile>,
    pub relationships: RelationshipGraph,
}

pub struct BattleSession<D: Dice = ChaCha8Rng> {
    id: BattleId,
    config: Arc<EngineConfig>,
    setup: BattleSetup,
    phase: BattlePhase,
    round: Round,
    arena: Arena,
    graph: RelationshipGraph,
    log: BattleLog,
    coaching: CoachingLog,
    processor: CoachingEffectProcessor,
    outcome: Option<(BattleOutcome, EndReason)>,
    armed_timers: BTreeMap<TimerKind, u64>,
    next_generation: u64,
    pending_coaching: Option<CharacterId>,
    dice: D,
}

impl BattleSession<ChaCha8Rng> {
    /// Session on a `ChaCha8Rng` seeded from the setup
    pub fn new(id: BattleId, setup: BattleSetup, config: Arc<EngineConfig>) -> Self {
        let dice = ChaCha8Rng::seed_from_u64(setup.seed);
        Self::with_dice(id, setup, config, dice)
    }

    /// Back to `PreBattle` with the original setup and seed
    ///
    /// Timer generations keep counting up, so any token armed before the
    /// reset is stale afterwards.
    pub fn reset(&mut self) {
        let generation = self.next_generation;
        let fresh = Self::new(self.id, self.setup.clone(), Arc::clone(&self.config));
        *self = fresh;
        self.next_generation = generation;
        tracing::info!(battle = %self.id, "Battle reset");
    }
}

impl<D: Dice> BattleSession<D> {
    pub fn with_dice(id: BattleId, setup: BattleSetup, config: Arc<EngineConfig>, dice: D) -> Self {
        let graph = setup.relationships.clone();
        let build_side = |side: TeamSide, entry: &TeamEntry| {
            let chemistry = TeamChemistry::compute(&graph, &entry.roster(), &config.chemistry);
            BattleSide::new(side, entry.clone(), config.battle.starting_morale, chemistry)
        };
        let arena = Arena {
            home: build_side(TeamSide::Home, &setup.home),
            away: build_side(TeamSide::Away, &setup.away),
        };

        Self {
            id,
            config,
            setup,
            phase: BattlePhase::PreBattle,
            round: 0,
            arena,
            graph,
            log: BattleLog::new(),
            coaching: CoachingLog::new(),
            processor: CoachingEffectProcessor::new(),
            outcome: None,
            armed_timers: BTreeMap::new(),
            next_generation: 1,
            pending_coaching: None,
            dice,
        }
    }

    pub fn id(&self) -> BattleId {
        self.id
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn fighter(&self, side: TeamSide) -> &Fighter {
        &self.arena.side(side).fighter
    }

    pub fn side(&self, side: TeamSide) -> &BattleSide {
        self.arena.side(side)
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    pub fn coaching_log(&self) -> &CoachingLog {
        &self.coaching
    }

    pub fn relationships(&self) -> &RelationshipGraph {
        &self.graph
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome.map(|(outcome, _)| outcome)
    }

    pub fn state(&self) -> BattleState {
        BattleState {
            battle_id: self.id,
            phase: self.phase,
            round: self.round,
            round_cap: self.config.battle.round_cap,
            home: SideView::from_side(&self.arena.home),
            away: SideView::from_side(&self.arena.away),
            outcome: self.outcome(),
        }
    }

    /// Performance snapshots and persistence deltas; `None` until the battle ends
    pub fn report(&self) -> Option<BattleReport> {
        let (outcome, reason) = self.outcome?;

        let mut performances = Vec::with_capacity(2);
        let mut chemistry = Vec::with_capacity(2);
        let mut profiles = BTreeMap::new();
        for side in TeamSide::both() {
            let state = self.arena.side(side);
            let result = outcome.result_for(side);
            performances.push(BattlePerformance::from_records(
                &state.fighter.id,
                state.fighter.level,
                self.log.records(),
                state.rounds_survived,
                result,
            ));
            chemistry.push(ChemistryChange {
                side,
                result,
                before: state.chemistry_before,
                after: state.chemistry,
            });
            profiles.insert(state.fighter.id.clone(), state.fighter.profile.clone());
        }

        Some(BattleReport {
            battle_id: self.id,
            outcome,
            reason,
            rounds: self.round,
            performances,
            chemistry,
            profiles,
            relationships: self.graph.clone(),
        })
    }

    /// Apply one input
    pub fn advance(&mut self, input: BattleInput) -> Result<Vec<BattleEvent>> {
        let mut events = Vec::new();

        match (self.phase, input) {
            (BattlePhase::PreBattle, BattleInput::StartBattle) => {
                tracing::info!(
                    battle = %self.id,
                    home = %self.arena.home.fighter.id,
                    away = %self.arena.away.fighter.id,
                    "Battle starting"
                );
                self.transition(BattlePhase::Huddle, &mut events);
                events.push(self.arm(TimerKind::Huddle, self.config.timers.huddle_ms));
            }
            (phase, BattleInput::BeginCoaching { character_id }) if phase.allows_coaching() => {
                if self.arena.side_of(&character_id).is_none() {
                    return Err(ArenaError::CharacterNotFound(character_id));
                }
                self.pending_coaching = Some(character_id);
                events.push(self.arm(TimerKind::Coaching, self.config.timers.coaching_timeout_ms));
            }
            (phase, BattleInput::Coach { request, exchange }) if phase.allows_coaching() => {
                self.coach(request, exchange, &mut events)?;
            }
            (BattlePhase::Huddle, BattleInput::EndHuddle) => {
                self.armed_timers.remove(&TimerKind::Huddle);
                self.open_selection(&mut events);
            }
            (BattlePhase::StrategySelection, BattleInput::SelectStrategy { side, selection }) => {
                self.select(side, selection)?;
                events.push(BattleEvent::StrategyAccepted { side });
            }
            (BattlePhase::StrategySelection, BattleInput::Proceed) => {
                self.armed_timers.remove(&TimerKind::StrategySelection);
                self.begin_combat(&mut events);
            }
            (_, BattleInput::TimerExpired { token }) => {
                self.on_timer(token, &mut events);
            }
            (BattlePhase::RoundCombat, BattleInput::ResolveRound) => {
                self.resolve_round(&mut events);
            }
            (BattlePhase::RoundEnd, BattleInput::FinishRound) => {
                self.finish_round(&mut events);
            }
            (phase, input) => {
                return Err(ArenaError::InvalidTransition {
                    phase,
                    input: input.name().to_string(),
                })
            }
        }

        Ok(events)
    }

    /// Drive the battle to the end with no coach input
    ///
    /// Every selection window closes immediately and is auto-filled.
    pub fn play_out(&mut self) -> Result<Vec<BattleEvent>> {
        let mut events = Vec::new();
        loop {
            let input = match self.phase {
                BattlePhase::PreBattle => BattleInput::StartBattle,
                BattlePhase::Huddle => BattleInput::EndHuddle,
                BattlePhase::StrategySelection => BattleInput::Proceed,
                BattlePhase::RoundCombat => BattleInput::ResolveRound,
                BattlePhase::RoundEnd => BattleInput::FinishRound,
                BattlePhase::BattleEnd => break,
            };
            events.extend(self.advance(input)?);
        }
        Ok(events)
    }

    fn transition(&mut self, to: BattlePhase, events: &mut Vec<BattleEvent>) {
        let from = self.phase;
        self.phase = to;
        tracing::info!(battle = %self.id, ?from, ?to, round = self.round, "Phase transition");
        events.push(BattleEvent::PhaseChanged { from, to });
    }

    fn arm(&mut self, kind: TimerKind, duration_ms: u64) -> BattleEvent {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.armed_timers.insert(kind, generation);
        BattleEvent::TimerRequested {
            token: TimerToken {
                battle_id: self.id,
                kind,
                generation,
            },
            duration_ms,
        }
    }

    fn on_timer(&mut self, token: TimerToken, events: &mut Vec<BattleEvent>) {
        let live = token.battle_id == self.id
            && self.armed_timers.get(&token.kind) == Some(&token.generation);
        if !live {
            tracing::warn!(battle = %self.id, kind = ?token.kind, generation = token.generation, "Stale timer dropped");
            return;
        }
        self.armed_timers.remove(&token.kind);

        match (token.kind, self.phase) {
            (TimerKind::Huddle, BattlePhase::Huddle) => self.open_selection(events),
            (TimerKind::StrategySelection, BattlePhase::StrategySelection) => {
                tracing::info!(battle = %self.id, round = self.round, "Selection window expired");
                self.begin_combat(events);
            }
            (TimerKind::Coaching, phase) if phase.allows_coaching() => {
                if let Some(character_id) = self.pending_coaching.take() {
                    tracing::warn!(battle = %self.id, character = %character_id, "Coaching window timed out");
                    events.push(BattleEvent::CoachingAbandoned { character_id });
                }
            }
            (kind, phase) => {
                tracing::warn!(battle = %self.id, ?kind, ?phase, "Timer fired outside its phase");
            }
        }
    }

    fn coach(
        &mut self,
        request: CoachingRequest,
        exchange: Option<CoachingExchange>,
        events: &mut Vec<BattleEvent>,
    ) -> Result<()> {
        let side = self
            .arena
            .side_of(&request.character_id)
            .ok_or_else(|| ArenaError::CharacterNotFound(request.character_id.clone()))?;
        let state = self.arena.side_mut(side);
        let fighter = &mut state.fighter;
        let session = self.processor.apply(&request, &fighter.traits, &mut fighter.profile);

        if session.effectiveness >= COACHING_MORALE_EFFECTIVENESS {
            state.morale.apply(
                self.round,
                COACHING_MORALE,
                MoraleCause::Coaching {
                    character: request.character_id.clone(),
                },
            );
        }

        if self.pending_coaching.as_ref() == Some(&request.character_id) {
            self.pending_coaching = None;
            self.armed_timers.remove(&TimerKind::Coaching);
        }

        self.coaching.archive(session, exchange);
        if let Some(archived) = self.coaching.sessions().last() {
            events.push(BattleEvent::CoachingApplied {
                session: archived.clone(),
            });
        }
        Ok(())
    }

    fn select(&mut self, side: TeamSide, selection: StrategySelection) -> Result<()> {
        let state = self.arena.side_mut(side);
        selection.validate(&state.fighter)?;
        state.selection.merge(selection);
        tracing::debug!(battle = %self.id, ?side, selection = ?state.selection, "Strategy selected");
        Ok(())
    }

    fn open_selection(&mut self, events: &mut Vec<BattleEvent>) {
        if self.round == 0 {
            self.round = 1;
        }
        for side in TeamSide::both() {
            let state = self.arena.side_mut(side);
            state.selection = StrategySelection::default();
            state.strategy = None;
        }
        self.transition(BattlePhase::StrategySelection, events);
        events.push(self.arm(
            TimerKind::StrategySelection,
            self.config.timers.strategy_selection_ms,
        ));
    }

    fn begin_combat(&mut self, events: &mut Vec<BattleEvent>) {
        for side in TeamSide::both() {
            let state = self.arena.side_mut(side);
            let strategy = resolve_strategy(&state.fighter, &state.selection, &mut self.dice);
            if !strategy.auto_filled.is_empty() {
                tracing::warn!(
                    battle = %self.id,
                    ?side,
                    categories = ?strategy.auto_filled,
                    "Strategy auto-filled"
                );
                events.push(BattleEvent::StrategyAutoFilled {
                    side,
                    categories: strategy.auto_filled.clone(),
                });
            }
            state.strategy = Some(strategy);
        }
        self.transition(BattlePhase::RoundCombat, events);
    }

    fn resolve_round(&mut self, events: &mut Vec<BattleEvent>) {
        let resolver = RoundResolver::new(&self.config);
        let resolution = resolver.resolve(self.id, self.round, &mut self.arena, &self.graph, &mut self.dice);

        events.push(BattleEvent::RoundStarted {
            round: self.round,
            turn_order: resolution
                .turn_order
                .iter()
                .map(|side| self.arena.side(*side).fighter.id.clone())
                .collect(),
        });
        for alert in resolution.alerts {
            events.push(BattleEvent::AdherenceAlert { alert });
        }
        for facts in resolution.rogue_facts {
            events.push(BattleEvent::RogueFacts { facts });
        }
        for record in resolution.records {
            self.log.push(record.clone());
            events.push(BattleEvent::Action { record });
        }

        self.transition(BattlePhase::RoundEnd, events);
        events.push(BattleEvent::RoundEnded {
            round: self.round,
            home_morale: self.arena.home.morale.current(),
            away_morale: self.arena.away.morale.current(),
        });
    }

    fn finish_round(&mut self, events: &mut Vec<BattleEvent>) {
        let ended = check_battle_end(
            &self.arena.home.fighter,
            &self.arena.away.fighter,
            self.round,
            self.config.battle.round_cap,
        );

        match ended {
            Some((outcome, reason)) => self.end_battle(outcome, reason, events),
            None => {
                self.round += 1;
                self.open_selection(events);
            }
        }
    }

    fn end_battle(&mut self, outcome: BattleOutcome, reason: EndReason, events: &mut Vec<BattleEvent>) {
        self.outcome = Some((outcome, reason));
        self.armed_timers.clear();
        self.pending_coaching = None;

        let tuning = &self.config.chemistry;
        for side in TeamSide::both() {
            let result = outcome.result_for(side);
            let state = self.arena.side_mut(side);

            let edge_delta = match result {
                MatchResult::Victory => tuning.edge_win_delta,
                MatchResult::Defeat => tuning.edge_loss_delta,
                MatchResult::Draw => 0.0,
            };
            self.graph.evolve_after_battle(&state.roster, edge_delta);

            // Value moves by the result delta; bonds reflect the evolved graph
            let bonds = self.graph.bond_counts(&state.roster);
            state.chemistry = state.chemistry_before.after_battle(result, tuning).with_bonds(bonds);
        }

        tracing::info!(battle = %self.id, ?outcome, ?reason, rounds = self.round, "Battle ended");
        self.transition(BattlePhase::BattleEnd, events);
        events.push(BattleEvent::BattleEnded {
            outcome,
            reason,
            rounds: self.round,
        });
    }
}
