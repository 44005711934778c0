//! Team-level aggregates: morale, relationships, chemistry

pub mod chemistry;
pub mod morale;
pub mod relationships;

pub use chemistry::{ChemistryBand, TeamChemistry};
pub use morale::{MoraleCause, MoraleEntry, MoraleLedger};
pub use relationships::{
    BondCounts, RelationshipEdge, RelationshipGraph, RelationshipType, DAMAGE_BONUS_MODIFIER,
};
