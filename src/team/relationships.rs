//! Directed relationship graph between characters
//!
//! Edges are directed and may be asymmetric (A can see B as a mentor while B
//! sees A as a rival). Aggregations collapse mirrored edges into one pair so a
//! bond is never counted twice.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::CharacterId;

/// Battle modifier key read by the round resolver
pub const DAMAGE_BONUS_MODIFIER: &str = "damage_bonus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Ally,
    Rival,
    Enemy,
    Mentor,
    Student,
}

impl RelationshipType {
    pub fn is_conflict(self) -> bool {
        matches!(self, RelationshipType::Enemy | RelationshipType::Rival)
    }

    pub fn is_mentoring(self) -> bool {
        matches!(self, RelationshipType::Mentor | RelationshipType::Student)
    }
}

/// One directed edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source: CharacterId,
    pub target: CharacterId,
    pub relationship_type: RelationshipType,
    strength: f64,
    #[serde(default)]
    pub battle_modifiers: BTreeMap<String, f64>,
}

impl RelationshipEdge {
    pub fn new(
        source: impl Into<CharacterId>,
        target: impl Into<CharacterId>,
        relationship_type: RelationshipType,
        strength: f64,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship_type,
            strength: clamp_strength(strength),
            battle_modifiers: BTreeMap::new(),
        }
    }

    pub fn with_modifier(mut self, key: &str, value: f64) -> Self {
        self.battle_modifiers.insert(key.to_string(), value);
        self
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn adjust_strength(&mut self, delta: f64) {
        self.strength = clamp_strength(self.strength + delta);
    }

    pub fn is_strong_alliance(&self) -> bool {
        self.relationship_type == RelationshipType::Ally && self.strength > 60.0
    }

    pub fn is_active_conflict(&self) -> bool {
        self.relationship_type.is_conflict() && self.strength.abs() > 40.0
    }

    pub fn is_mentoring_bond(&self) -> bool {
        self.relationship_type.is_mentoring()
    }
}

fn clamp_strength(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-100.0, 100.0)
}

/// Counts feeding team chemistry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondCounts {
    pub strong_alliances: u32,
    pub active_conflicts: u32,
    pub mentoring_bonds: u32,
}

/// Directed graph keyed by canonical ids
///
/// Serialized as a flat edge list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<RelationshipEdge>", into = "Vec<RelationshipEdge>")]
pub struct RelationshipGraph {
    edges: AHashMap<(CharacterId, CharacterId), RelationshipEdge>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: impl IntoIterator<Item = RelationshipEdge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.upsert(edge);
        }
        graph
    }

    /// Insert or replace the edge for (source, target)
    pub fn upsert(&mut self, mut edge: RelationshipEdge) {
        edge.strength = clamp_strength(edge.strength);
        if edge.source == edge.target {
            tracing::warn!(character = %edge.source, "Ignoring self-relationship");
            return;
        }
        self.edges.insert((edge.source.clone(), edge.target.clone()), edge);
    }

    pub fn get(&self, source: &CharacterId, target: &CharacterId) -> Option<&RelationshipEdge> {
        self.edges.get(&(source.clone(), target.clone()))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edges whose both ends are on the roster, in a stable order
    pub fn edges_within<'a>(&'a self, roster: &[CharacterId]) -> Vec<&'a RelationshipEdge> {
        let mut edges: Vec<&RelationshipEdge> = self
            .edges
            .values()
            .filter(|e| roster.contains(&e.source) && roster.contains(&e.target))
            .collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        edges
    }

    /// One representative edge per unordered pair on the roster
    ///
    /// When both directions exist the one with the larger |strength| wins;
    /// ties go to the edge whose source sorts first.
    pub fn unique_pairs<'a>(&'a self, roster: &[CharacterId]) -> Vec<&'a RelationshipEdge> {
        let mut by_pair: BTreeMap<(CharacterId, CharacterId), &RelationshipEdge> = BTreeMap::new();
        for edge in self.edges_within(roster) {
            let key = if edge.source <= edge.target {
                (edge.source.clone(), edge.target.clone())
            } else {
                (edge.target.clone(), edge.source.clone())
            };
            match by_pair.get(&key) {
                Some(existing) if existing.strength().abs() >= edge.strength().abs() => {}
                _ => {
                    by_pair.insert(key, edge);
                }
            }
        }
        by_pair.into_values().collect()
    }

    pub fn bond_counts(&self, roster: &[CharacterId]) -> BondCounts {
        let mut counts = BondCounts::default();
        for edge in self.unique_pairs(roster) {
            if edge.is_strong_alliance() {
                counts.strong_alliances += 1;
            }
            if edge.is_active_conflict() {
                counts.active_conflicts += 1;
            }
            if edge.is_mentoring_bond() {
                counts.mentoring_bonds += 1;
            }
        }
        counts
    }

    /// Named modifier on the actor's edge toward the target (0 when absent)
    pub fn battle_modifier(&self, actor: &CharacterId, target: &CharacterId, key: &str) -> f64 {
        self.get(actor, target)
            .and_then(|e| e.battle_modifiers.get(key).copied())
            .unwrap_or(0.0)
    }

    /// Shift every edge between teammates after a battle
    pub fn evolve_after_battle(&mut self, roster: &[CharacterId], delta: f64) {
        for edge in self.edges.values_mut() {
            if roster.contains(&edge.source) && roster.contains(&edge.target) {
                edge.adjust_strength(delta);
            }
        }
    }
}

impl From<Vec<RelationshipEdge>> for RelationshipGraph {
    fn from(edges: Vec<RelationshipEdge>) -> Self {
        Self::from_edges(edges)
    }
}

impl From<RelationshipGraph> for Vec<RelationshipEdge> {
    fn from(graph: RelationshipGraph) -> Self {
        let mut edges: Vec<RelationshipEdge> = graph.edges.into_values().collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<CharacterId> {
        names.iter().map(|n| CharacterId::canonical(n)).collect()
    }

    #[test]
    fn test_strength_clamped() {
        let edge = RelationshipEdge::new("a", "b", RelationshipType::Ally, 250.0);
        assert_eq!(edge.strength(), 100.0);
        let mut edge = RelationshipEdge::new("a", "b", RelationshipType::Enemy, -90.0);
        edge.adjust_strength(-50.0);
        assert_eq!(edge.strength(), -100.0);
    }

    #[test]
    fn test_mirrored_pairs_counted_once() {
        let graph = RelationshipGraph::from_edges([
            RelationshipEdge::new("Merlin", "Arthur", RelationshipType::Mentor, 70.0),
            RelationshipEdge::new("Arthur", "Merlin", RelationshipType::Student, 50.0),
            RelationshipEdge::new("Arthur", "Lancelot", RelationshipType::Ally, 80.0),
            RelationshipEdge::new("Lancelot", "Arthur", RelationshipType::Ally, 75.0),
        ]);
        let roster = ids(&["Arthur", "Merlin", "Lancelot"]);

        assert_eq!(graph.unique_pairs(&roster).len(), 2);
        let counts = graph.bond_counts(&roster);
        assert_eq!(counts.strong_alliances, 1);
        assert_eq!(counts.mentoring_bonds, 1);
        assert_eq!(counts.active_conflicts, 0);
    }

    #[test]
    fn test_name_and_id_keys_agree() {
        let graph = RelationshipGraph::from_edges([RelationshipEdge::new(
            "Sun Wukong",
            "sun_wukong_clone",
            RelationshipType::Rival,
            -60.0,
        )]);
        assert!(graph
            .get(&CharacterId::canonical("sun-wukong"), &CharacterId::canonical("Sun Wukong Clone"))
            .is_some());
    }

    #[test]
    fn test_conflicts_use_absolute_strength() {
        let graph = RelationshipGraph::from_edges([
            RelationshipEdge::new("a", "b", RelationshipType::Enemy, -45.0),
            RelationshipEdge::new("c", "d", RelationshipType::Rival, 30.0),
        ]);
        let counts = graph.bond_counts(&ids(&["a", "b", "c", "d"]));
        assert_eq!(counts.active_conflicts, 1);
    }

    #[test]
    fn test_self_edges_ignored() {
        let mut graph = RelationshipGraph::new();
        graph.upsert(RelationshipEdge::new("Loki", "loki", RelationshipType::Rival, 99.0));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_evolve_only_touches_roster() {
        let mut graph = RelationshipGraph::from_edges([
            RelationshipEdge::new("a", "b", RelationshipType::Ally, 50.0),
            RelationshipEdge::new("a", "z", RelationshipType::Ally, 50.0),
        ]);
        graph.evolve_after_battle(&ids(&["a", "b"]), 5.0);
        assert_eq!(graph.get(&"a".into(), &"b".into()).unwrap().strength(), 55.0);
        assert_eq!(graph.get(&"a".into(), &"z".into()).unwrap().strength(), 50.0);
    }

    #[test]
    fn test_graph_serializes_as_edge_list() {
        let graph = RelationshipGraph::from_edges([
            RelationshipEdge::new("b", "a", RelationshipType::Ally, 10.0),
            RelationshipEdge::new("a", "b", RelationshipType::Ally, 20.0),
        ]);
        let json = serde_json::to_string(&graph).unwrap();
        let back: RelationshipGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert!(json.find("\"source\":\"a\"").unwrap() < json.find("\"source\":\"b\"").unwrap());
    }

    #[test]
    fn test_battle_modifier_lookup() {
        let graph = RelationshipGraph::from_edges([RelationshipEdge::new(
            "Achilles",
            "Hector",
            RelationshipType::Enemy,
            -90.0,
        )
        .with_modifier(DAMAGE_BONUS_MODIFIER, 0.2)]);
        let a = CharacterId::canonical("Achilles");
        let h = CharacterId::canonical("Hector");
        assert_eq!(graph.battle_modifier(&a, &h, DAMAGE_BONUS_MODIFIER), 0.2);
        assert_eq!(graph.battle_modifier(&h, &a, DAMAGE_BONUS_MODIFIER), 0.0);
    }
}
