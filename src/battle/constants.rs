//! Round resolution constants - morale impacts and psych drift in one place
//!
//! Tunables that a deployment is expected to change live in `EngineConfig`;
//! these are the fixed shape of a round.

// Morale impact of scripted actions
pub const SCRIPTED_HIT_MORALE: f64 = 3.0;
pub const CRITICAL_HIT_MORALE: f64 = 5.0;
pub const HEAL_MORALE: f64 = 2.0;
pub const GUARD_MORALE: f64 = 1.0;

// Morale lost by a side whose fighter is knocked out
pub const KNOCKOUT_MORALE: f64 = -10.0;

// Psych drift per action
pub const STRESS_PER_DAMAGE: f64 = 0.1;  // stress gained per HP lost
pub const OBEDIENT_FOCUS_GAIN: f64 = 1.0;
pub const FOCUS_ACTION_GAIN: f64 = 2.0;  // the no-op Focus action still steadies
pub const CRIT_EGO_GAIN: f64 = 1.0;
pub const ROGUE_TRUST_LOSS: f64 = -3.0;
pub const ROGUE_STRESS_GAIN: f64 = 2.0;

// Morale gained when a coaching session lands well
pub const COACHING_MORALE: f64 = 2.0;
pub const COACHING_MORALE_EFFECTIVENESS: f64 = 70.0;
