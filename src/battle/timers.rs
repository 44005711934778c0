//! Cooperative, cancellable battle timers
//!
//! Nothing here sleeps. Deadlines are plain numbers on whatever clock the
//! driver uses; the driver calls [`TimerQueue::poll`] and feeds the expired
//! tokens back into the owning battle. Every token carries a generation, so a
//! battle can tell a live timer from one that outlived a reset.

use serde::{Deserialize, Serialize};

use crate::core::types::BattleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Huddle,
    StrategySelection,
    Coaching,
}

/// Identifies one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken {
    pub battle_id: BattleId,
    pub kind: TimerKind,
    pub generation: u64,
}

#[derive(Debug, Clone)]
struct PendingTimer {
    deadline_ms: u64,
    seq: u64,
    token: TimerToken,
}

#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: Vec<PendingTimer>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer, replacing any pending timer of the same kind for that battle
    pub fn schedule(&mut self, token: TimerToken, deadline_ms: u64) {
        self.pending
            .retain(|p| !(p.token.battle_id == token.battle_id && p.token.kind == token.kind));
        self.pending.push(PendingTimer {
            deadline_ms,
            seq: self.next_seq,
            token,
        });
        self.next_seq += 1;
    }

    pub fn cancel(&mut self, token: &TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| &p.token != token);
        before != self.pending.len()
    }

    /// Drop every timer of one battle; returns how many were removed
    pub fn cancel_battle(&mut self, battle_id: BattleId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.token.battle_id != battle_id);
        let removed = before - self.pending.len();
        if removed > 0 {
            tracing::debug!(battle = %battle_id, removed, "Cancelled battle timers");
        }
        removed
    }

    /// Remove and return every token due at `now_ms`, earliest first
    pub fn poll(&mut self, now_ms: u64) -> Vec<TimerToken> {
        let (mut due, rest): (Vec<PendingTimer>, Vec<PendingTimer>) =
            self.pending.drain(..).partition(|p| p.deadline_ms <= now_ms);
        self.pending = rest;
        due.sort_by_key(|p| (p.deadline_ms, p.seq));
        due.into_iter().map(|p| p.token).collect()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.deadline_ms).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(battle_id: BattleId, kind: TimerKind, generation: u64) -> TimerToken {
        TimerToken {
            battle_id,
            kind,
            generation,
        }
    }

    #[test]
    fn test_poll_returns_due_in_deadline_order() {
        let battle = BattleId::new();
        let mut queue = TimerQueue::new();
        queue.schedule(token(battle, TimerKind::StrategySelection, 2), 500);
        queue.schedule(token(battle, TimerKind::Huddle, 1), 100);
        queue.schedule(token(battle, TimerKind::Coaching, 3), 900);

        let due = queue.poll(600);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].kind, TimerKind::Huddle);
        assert_eq!(due[1].kind, TimerKind::StrategySelection);
        assert_eq!(queue.next_deadline(), Some(900));
    }

    #[test]
    fn test_reschedule_replaces_same_kind() {
        let battle = BattleId::new();
        let mut queue = TimerQueue::new();
        queue.schedule(token(battle, TimerKind::StrategySelection, 1), 100);
        queue.schedule(token(battle, TimerKind::StrategySelection, 2), 300);
        assert_eq!(queue.len(), 1);
        assert!(queue.poll(200).is_empty());
        assert_eq!(queue.poll(300)[0].generation, 2);
    }

    #[test]
    fn test_cancel_battle_leaves_others() {
        let a = BattleId::new();
        let b = BattleId::new();
        let mut queue = TimerQueue::new();
        queue.schedule(token(a, TimerKind::Huddle, 1), 100);
        queue.schedule(token(a, TimerKind::Coaching, 2), 100);
        queue.schedule(token(b, TimerKind::Huddle, 1), 100);

        assert_eq!(queue.cancel_battle(a), 2);
        let due = queue.poll(1_000);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].battle_id, b);
    }

    #[test]
    fn test_cancel_single_token() {
        let battle = BattleId::new();
        let mut queue = TimerQueue::new();
        let t = token(battle, TimerKind::Coaching, 7);
        queue.schedule(t, 50);
        assert!(queue.cancel(&t));
        assert!(!queue.cancel(&t));
        assert!(queue.is_empty());
    }
}
