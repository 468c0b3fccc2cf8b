/// Petgraph view over a workflow definition
///
/// Builds a directed graph from nodes and edges so the validator can warn about cycles and
/// unreachable islands, and so the store can lay nodes out in layers. Edges that point at
/// unknown nodes are skipped here; the validator reports them separately.

use crate::workflow::types::{Position, WorkflowEdge, WorkflowNode};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// Horizontal distance between layers
const LAYER_SPACING: f64 = 280.0;
/// Vertical distance between nodes of the same layer
const NODE_SPACING: f64 = 140.0;

#[derive(Debug)]
pub struct WorkflowGraph<'a> {
    graph: DiGraph<&'a WorkflowNode, ()>,
    node_id_to_index: HashMap<&'a str, NodeIndex>,
}

impl<'a> WorkflowGraph<'a> {
    pub fn build(nodes: &'a [WorkflowNode], edges: &[WorkflowEdge]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_id_to_index = HashMap::new();

        for node in nodes {
            let index = graph.add_node(node);
            node_id_to_index.insert(node.id.as_str(), index);
        }

        for edge in edges {
            let (Some(from), Some(to)) = (
                node_id_to_index.get(edge.source.as_str()),
                node_id_to_index.get(edge.target.as_str()),
            ) else {
                tracing::debug!("Skipping dangling edge '{}' ({} -> {})", edge.id, edge.source, edge.target);
                continue;
            };
            graph.add_edge(*from, *to, ());
        }

        Self { graph, node_id_to_index }
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Ids of every node reachable from `start`, `start` included
    pub fn reachable_from(&self, start: &str) -> HashSet<&'a str> {
        let mut reachable = HashSet::new();
        let Some(&start_index) = self.node_id_to_index.get(start) else {
            return reachable;
        };

        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(start_index);
        queue.push_back(start_index);

        while let Some(current) = queue.pop_front() {
            let node: &'a WorkflowNode = self.graph[current];
            reachable.insert(node.id.as_str());
            for next in self.graph.neighbors(current) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        reachable
    }

    /// Group node ids into layers by BFS depth from the roots (nodes without incoming edges).
    /// Nodes only reachable through a cycle end up in a trailing layer.
    pub fn layers(&self) -> Vec<Vec<&'a str>> {
        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
        let mut queue = VecDeque::new();

        for index in self.graph.node_indices() {
            if self.graph.neighbors_directed(index, Direction::Incoming).next().is_none() {
                depth.insert(index, 0);
                queue.push_back(index);
            }
        }

        while let Some(current) = queue.pop_front() {
            let next_depth = depth[&current] + 1;
            for next in self.graph.neighbors(current) {
                if !depth.contains_key(&next) {
                    depth.insert(next, next_depth);
                    queue.push_back(next);
                }
            }
        }

        let deepest = depth.values().copied().max().map_or(0, |d| d + 1);
        let mut layers: Vec<Vec<&'a str>> = vec![Vec::new(); deepest];
        let mut stragglers = Vec::new();

        // node_indices() follows insertion order, which keeps the layout stable
        for index in self.graph.node_indices() {
            let node: &'a WorkflowNode = self.graph[index];
            let id = node.id.as_str();
            match depth.get(&index) {
                Some(&d) => layers[d].push(id),
                None => stragglers.push(id),
            }
        }
        if !stragglers.is_empty() {
            layers.push(stragglers);
        }

        layers
    }

    /// Left-to-right layered positions for every node
    pub fn layout(&self) -> HashMap<String, Position> {
        let mut positions = HashMap::new();
        for (layer_index, layer) in self.layers().iter().enumerate() {
            for (row, id) in layer.iter().enumerate() {
                positions.insert(
                    id.to_string(),
                    Position::new(layer_index as f64 * LAYER_SPACING, row as f64 * NODE_SPACING),
                );
            }
        }
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{ActionConfig, NodeConfig, NodeData, TriggerConfig};

    fn node(id: &str, trigger: bool) -> WorkflowNode {
        let config = if trigger {
            NodeConfig::Trigger(TriggerConfig::default())
        } else {
            NodeConfig::Action(ActionConfig::default())
        };
        WorkflowNode { id: id.to_string(), config, position: Position::default(), data: NodeData::new(id) }
    }

    fn edge(source: &str, target: &str) -> WorkflowEdge {
        WorkflowEdge {
            id: format!("{source}->{target}"),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: None,
            target_handle: None,
            label: None,
            style: None,
        }
    }

    #[test]
    fn test_layers_follow_edge_depth() {
        let nodes = vec![node("t", true), node("a", false), node("b", false), node("c", false)];
        let edges = vec![edge("t", "a"), edge("a", "b"), edge("t", "c")];
        let graph = WorkflowGraph::build(&nodes, &edges);

        assert_eq!(graph.layers(), vec![vec!["t"], vec!["a", "c"], vec!["b"]]);

        let positions = graph.layout();
        assert_eq!(positions["b"], Position::new(2.0 * LAYER_SPACING, 0.0));
        assert_eq!(positions["c"], Position::new(LAYER_SPACING, NODE_SPACING));
    }

    #[test]
    fn test_cycle_detection_and_stragglers() {
        let nodes = vec![node("t", true), node("a", false), node("b", false)];
        let edges = vec![edge("a", "b"), edge("b", "a")];
        let graph = WorkflowGraph::build(&nodes, &edges);

        assert!(graph.has_cycle());
        assert_eq!(graph.layers(), vec![vec!["t"], vec!["a", "b"]]);
    }

    #[test]
    fn test_reachability_ignores_dangling_edges() {
        let nodes = vec![node("t", true), node("a", false), node("b", false)];
        let edges = vec![edge("t", "a"), edge("a", "ghost")];
        let graph = WorkflowGraph::build(&nodes, &edges);

        let reachable = graph.reachable_from("t");
        assert!(reachable.contains("a"));
        assert!(!reachable.contains("b"));
        assert!(graph.reachable_from("ghost").is_empty());
        assert!(!graph.has_cycle());
    }
}
