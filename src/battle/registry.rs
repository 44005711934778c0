//! Registry of live battles plus the timer queue that drives them
//!
//! Battles never share mutable state; the registry only routes inputs by
//! `BattleId` and turns `TimerRequested` events into queue entries.

use ahash::AHashMap;
use std::sync::Arc;

use crate::battle::events::BattleEvent;
use crate::battle::phase::BattleInput;
use crate::battle::session::{BattleSession, BattleSetup};
use crate::battle::timers::TimerQueue;
use crate::core::config::EngineConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::BattleId;

/// Events produced by one battle
pub type BattleEvents = (BattleId, Vec<BattleEvent>);

pub struct BattleRegistry {
    config: Arc<EngineConfig>,
    battles: AHashMap<BattleId, BattleSession>,
    timers: TimerQueue,
}

impl BattleRegistry {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            config,
            battles: AHashMap::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    /// Register a new battle in `PreBattle`
    pub fn create(&mut self, setup: BattleSetup) -> BattleId {
        let id = BattleId::new();
        let session = BattleSession::new(id, setup, Arc::clone(&self.config));
        self.battles.insert(id, session);
        tracing::info!(battle = %id, live = self.battles.len(), "Battle created");
        id
    }

    pub fn get(&self, id: BattleId) -> Option<&BattleSession> {
        self.battles.get(&id)
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }

    pub fn ids(&self) -> Vec<BattleId> {
        self.battles.keys().copied().collect()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Feed one input to a battle at time `now_ms`
    pub fn advance(&mut self, id: BattleId, input: BattleInput, now_ms: u64) -> Result<Vec<BattleEvent>> {
        let session = self
            .battles
            .get_mut(&id)
            .ok_or(ArenaError::BattleNotFound(id))?;
        let events = session.advance(input)?;
        let finished = session.is_finished();

        for event in &events {
            if let BattleEvent::TimerRequested { token, duration_ms } = event {
                self.timers.schedule(*token, now_ms.saturating_add(*duration_ms));
            }
        }
        if finished {
            let cancelled = self.timers.cancel_battle(id);
            tracing::debug!(battle = %id, cancelled, "Timers cleared for finished battle");
        }
        Ok(events)
    }

    /// Fire every timer due at `now_ms`
    ///
    /// A failing battle is logged and skipped; it never blocks the others.
    pub fn poll(&mut self, now_ms: u64) -> Vec<BattleEvents> {
        let mut out = Vec::new();
        for token in self.timers.poll(now_ms) {
            match self.advance(token.battle_id, BattleInput::TimerExpired { token }, now_ms) {
                Ok(events) if !events.is_empty() => out.push((token.battle_id, events)),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(battle = %token.battle_id, error = %e, "Timer delivery failed");
                }
            }
        }
        out
    }

    /// Restart a battle from its setup
    pub fn reset(&mut self, id: BattleId) -> Result<()> {
        let session = self
            .battles
            .get_mut(&id)
            .ok_or(ArenaError::BattleNotFound(id))?;
        session.reset();
        self.timers.cancel_battle(id);
        Ok(())
    }

    /// Drop a battle and its timers
    pub fn abort(&mut self, id: BattleId) -> Option<BattleSession> {
        self.timers.cancel_battle(id);
        let session = self.battles.remove(&id);
        if session.is_some() {
            tracing::info!(battle = %id, "Battle aborted");
        }
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::fighter::{Ability, AbilityCategory, AbilityEffect, CombatStats, Fighter};
    use crate::battle::phase::BattlePhase;
    use crate::battle::side::TeamEntry;
    use crate::team::relationships::RelationshipGraph;

    fn setup(seed: u64) -> BattleSetup {
        let fighter = |name: &str| {
            Fighter::new(name, 100.0, CombatStats::default()).with_ability(Ability::new(
                "Strike",
                AbilityCategory::Attack,
                AbilityEffect::Damage { power: 1.0 },
            ))
        };
        BattleSetup {
            home: TeamEntry::new("Home", fighter("Joan")),
            away: TeamEntry::new("Away", fighter("Genghis")),
            relationships: RelationshipGraph::new(),
            seed,
        }
    }

    #[test]
    fn test_timers_drive_phase_changes() {
        let config = Arc::new(EngineConfig::default());
        let huddle = config.timers.huddle_ms;
        let mut registry = BattleRegistry::new(config);
        let id = registry.create(setup(7));

        registry.advance(id, BattleInput::StartBattle, 0).unwrap();
        assert_eq!(registry.pending_timers(), 1);
        assert_eq!(registry.next_deadline(), Some(huddle));

        assert!(registry.poll(huddle - 1).is_empty());
        let fired = registry.poll(huddle);
        assert_eq!(fired.len(), 1);
        assert_eq!(registry.get(id).unwrap().phase(), BattlePhase::StrategySelection);
        // The selection timer replaced the huddle timer
        assert_eq!(registry.pending_timers(), 1);
    }

    #[test]
    fn test_battles_are_isolated() {
        let mut registry = BattleRegistry::new(Arc::new(EngineConfig::default()));
        let a = registry.create(setup(1));
        let b = registry.create(setup(2));

        registry.advance(a, BattleInput::StartBattle, 0).unwrap();
        assert_eq!(registry.get(a).unwrap().phase(), BattlePhase::Huddle);
        assert_eq!(registry.get(b).unwrap().phase(), BattlePhase::PreBattle);

        assert!(registry.abort(a).is_some());
        assert_eq!(registry.pending_timers(), 0);
        assert!(matches!(
            registry.advance(a, BattleInput::EndHuddle, 0),
            Err(ArenaError::BattleNotFound(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reset_drops_pending_timers() {
        let mut registry = BattleRegistry::new(Arc::new(EngineConfig::default()));
        let id = registry.create(setup(3));
        registry.advance(id, BattleInput::StartBattle, 0).unwrap();

        registry.reset(id).unwrap();
        assert_eq!(registry.pending_timers(), 0);
        assert_eq!(registry.get(id).unwrap().phase(), BattlePhase::PreBattle);
    }
}
