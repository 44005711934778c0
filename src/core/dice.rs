//! Injectable randomness
//!
//! Every probabilistic decision in the engine (adherence jitter, obedience
//! rolls, rogue action choice, initiative, auto-fill, achievement rolls) goes
//! through [`Dice`]. Any `rand::Rng` is a `Dice`, so battles normally run on a
//! seeded `ChaCha8Rng`; [`ScriptedDice`] pins outcomes for tests and replays.

use rand::Rng;
use std::collections::VecDeque;

/// Source of random outcomes
pub trait Dice {
    /// Uniform sample in the closed range `[lo, hi]`
    fn uniform(&mut self, lo: f64, hi: f64) -> f64;

    /// Bernoulli trial succeeding with probability `p` (clamped to [0, 1])
    fn chance(&mut self, p: f64) -> bool;

    /// Uniform index in `0..len` (0 when `len == 0`)
    fn index(&mut self, len: usize) -> usize;
}

/// Fallback sample for ranges that cannot be drawn from
///
/// Non-finite bounds fall back to whichever bound is finite, or 0.
fn degenerate_sample(lo: f64, hi: f64) -> Option<f64> {
    if !lo.is_finite() || !hi.is_finite() {
        return Some(if lo.is_finite() {
            lo
        } else if hi.is_finite() {
            hi
        } else {
            0.0
        });
    }
    if hi <= lo {
        return Some(lo);
    }
    if !(hi - lo).is_finite() {
        return Some(lo / 2.0 + hi / 2.0);
    }
    None
}

impl<R: Rng + ?Sized> Dice for R {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if let Some(value) = degenerate_sample(lo, hi) {
            return value;
        }
        self.gen_range(lo..=hi)
    }

    fn chance(&mut self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        self.gen_bool(p.clamp(0.0, 1.0))
    }

    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            self.gen_range(0..len)
        }
    }
}

/// Deterministic dice with queued outcomes
///
/// `uniform` consumes a queued fraction in [0, 1] and maps it onto the range;
/// with the queue empty it returns the midpoint, so a symmetric jitter range
/// yields exactly zero. `chance` and `index` consume their own queues and fall
/// back to `default_chance` and 0 respectively.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    fractions: VecDeque<f64>,
    outcomes: VecDeque<bool>,
    indices: VecDeque<usize>,
    default_chance: bool,
}

impl ScriptedDice {
    /// Midpoint samples, every chance succeeds, first index
    pub fn new() -> Self {
        Self {
            fractions: VecDeque::new(),
            outcomes: VecDeque::new(),
            indices: VecDeque::new(),
            default_chance: true,
        }
    }

    /// Every chance fails unless queued otherwise
    pub fn pessimistic() -> Self {
        Self {
            default_chance: false,
            ..Self::new()
        }
    }

    pub fn with_fractions(mut self, fractions: impl IntoIterator<Item = f64>) -> Self {
        self.fractions.extend(fractions);
        self
    }

    pub fn with_outcomes(mut self, outcomes: impl IntoIterator<Item = bool>) -> Self {
        self.outcomes.extend(outcomes);
        self
    }

    pub fn with_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.indices.extend(indices);
        self
    }
}

impl Default for ScriptedDice {
    fn default() -> Self {
        Self::new()
    }
}

impl Dice for ScriptedDice {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        let fraction = self.fractions.pop_front().unwrap_or(0.5);
        let fraction = if fraction.is_nan() { 0.5 } else { fraction.clamp(0.0, 1.0) };
        if let Some(value) = degenerate_sample(lo, hi) {
            return value;
        }
        lo + (hi - lo) * fraction
    }

    fn chance(&mut self, _p: f64) -> bool {
        self.outcomes.pop_front().unwrap_or(self.default_chance)
    }

    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.indices.pop_front().unwrap_or(0) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_scripted_midpoint_is_zero_for_symmetric_range() {
        let mut dice = ScriptedDice::new();
        assert_eq!(dice.uniform(-10.0, 10.0), 0.0);
    }

    #[test]
    fn test_scripted_queues_consumed_in_order() {
        let mut dice = ScriptedDice::pessimistic()
            .with_fractions([0.0, 1.0])
            .with_outcomes([true])
            .with_indices([7]);

        assert_eq!(dice.uniform(0.0, 20.0), 0.0);
        assert_eq!(dice.uniform(0.0, 20.0), 20.0);
        assert!(dice.chance(0.1));
        assert!(!dice.chance(0.9));
        assert_eq!(dice.index(5), 2);
        assert_eq!(dice.index(5), 0);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(a.uniform(-10.0, 10.0), b.uniform(-10.0, 10.0));
            assert_eq!(a.chance(0.5), b.chance(0.5));
        }
    }

    #[test]
    fn test_rng_dice_respects_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let v = rng.uniform(-10.0, 10.0);
            assert!((-10.0..=10.0).contains(&v));
            assert!(rng.index(3) < 3);
        }
        assert_eq!(rng.index(0), 0);
        assert!(!rng.chance(f64::NAN));
        assert!(rng.chance(2.0));
    }

    #[test]
    fn test_non_finite_bounds_do_not_panic() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(rng.uniform(-f64::NAN, f64::NAN), 0.0);
        assert_eq!(rng.uniform(f64::NEG_INFINITY, f64::INFINITY), 0.0);
        assert_eq!(rng.uniform(2.0, f64::INFINITY), 2.0);
        assert_eq!(rng.uniform(f64::NAN, 5.0), 5.0);
        assert!(rng.uniform(-f64::MAX, f64::MAX).is_finite());

        let mut scripted = ScriptedDice::new().with_fractions([f64::NAN]);
        assert_eq!(scripted.uniform(-10.0, 10.0), 0.0);
        assert_eq!(scripted.uniform(-f64::NAN, f64::NAN), 0.0);
    }
}
