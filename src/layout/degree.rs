use std::collections::HashMap;

use crate::model::{Edge, Node, NodeId};

use super::LayoutConfig;

/// Per-node edge endpoint counts for the current edge set.
///
/// A self-loop touches its node twice and so adds two.
#[derive(Clone, Debug, Default)]
pub struct DegreeMap {
    counts: HashMap<NodeId, u32>,
}

impl DegreeMap {
    pub fn from_links(nodes: &[Node], links: &[Edge]) -> Self {
        let mut counts = nodes
            .iter()
            .map(|node| (node.id(), 0))
            .collect::<HashMap<_, _>>();
        for link in links {
            *counts.entry(link.source()).or_insert(0) += 1;
            *counts.entry(link.target()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, id: NodeId) -> u32 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    pub fn max_endpoint(&self, source: NodeId, target: NodeId) -> u32 {
        self.get(source).max(self.get(target))
    }

    pub fn max(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0)
    }
}

impl LayoutConfig {
    /// Grows linearly past the crowding threshold, capped at the max distance.
    pub fn link_distance_for(&self, max_degree: u32) -> f32 {
        if max_degree < self.crowding_threshold {
            return self.link_distance;
        }
        let excess = (max_degree - self.crowding_threshold) as f32;
        self.link_distance + (excess * self.distance_per_degree).min(self.max_extra_distance())
    }

    /// Full strength up to the decay constant, then an exponential fall
    /// towards the minimum.
    pub fn link_strength_for(&self, max_degree: u32) -> f32 {
        let degree = max_degree as f32;
        if degree <= self.strength_decay {
            return self.link_strength;
        }
        let reduction = (degree - self.strength_decay) / self.strength_decay;
        let scaled = self.min_link_strength
            + (self.link_strength - self.min_link_strength) * (-reduction).exp();
        scaled.max(self.min_link_strength)
    }

    pub fn collision_radius_for(&self, degree: u32) -> f32 {
        self.collision_base_radius + (degree as f32).sqrt() * self.high_degree_padding
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{Graph, Palette, QueryResult};

    fn graph_from(rows: serde_json::Value) -> Graph {
        let result: QueryResult =
            serde_json::from_value(json!({ "data": rows })).expect("valid batch");
        let mut graph = Graph::new("g", Palette::default());
        graph.extend(&result, false);
        graph
    }

    #[test]
    fn counts_both_endpoints_and_self_loops_twice() {
        let graph = graph_from(json!([
            {"r": {"id": 1, "sourceId": 1, "destinationId": 2, "relationshipType": "R"}},
            {"r": {"id": 2, "sourceId": 1, "destinationId": 3, "relationshipType": "R"}},
            {"r": {"id": 3, "sourceId": 3, "destinationId": 3, "relationshipType": "R"}},
            {"n": {"id": 4, "labels": ["Lonely"]}}
        ]));
        let degrees = DegreeMap::from_links(graph.nodes(), graph.edges());
        assert_eq!(degrees.get(NodeId(1)), 2);
        assert_eq!(degrees.get(NodeId(2)), 1);
        assert_eq!(degrees.get(NodeId(3)), 3);
        assert_eq!(degrees.get(NodeId(4)), 0);
        assert_eq!(degrees.get(NodeId(99)), 0);
        assert_eq!(degrees.max_endpoint(NodeId(2), NodeId(3)), 3);
        assert_eq!(degrees.max(), 3);
    }

    #[test]
    fn distance_is_base_below_threshold() {
        let config = LayoutConfig::default();
        for degree in 0..config.crowding_threshold {
            assert_eq!(config.link_distance_for(degree), config.link_distance);
        }
    }

    #[test]
    fn distance_never_shrinks_and_caps() {
        let config = LayoutConfig::default();
        let mut previous = config.link_distance_for(0);
        for degree in 1..200 {
            let distance = config.link_distance_for(degree);
            assert!(distance >= previous);
            assert!(distance <= config.max_link_distance);
            previous = distance;
        }
        assert_eq!(config.link_distance_for(22), 53.0);
        assert_eq!(config.link_distance_for(200), config.max_link_distance);
    }

    #[test]
    fn strength_softens_past_decay_constant() {
        let config = LayoutConfig::default();
        assert_eq!(config.link_strength_for(15), config.link_strength);
        let softened = config.link_strength_for(30);
        let expected = 0.3 + 0.2 * (-1.0_f32).exp();
        assert!((softened - expected).abs() < 1e-6);
        assert!(config.link_strength_for(1000) >= config.min_link_strength);
        assert!(config.link_strength_for(40) < config.link_strength_for(20));
    }

    #[test]
    fn radius_grows_with_square_root() {
        let config = LayoutConfig::default();
        assert_eq!(config.collision_radius_for(0), 12.0);
        assert_eq!(config.collision_radius_for(4), 12.0 + 2.0 * 1.25);
        assert_eq!(config.collision_radius_for(100), 12.0 + 10.0 * 1.25);
    }
}
