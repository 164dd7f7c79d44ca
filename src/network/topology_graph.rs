use std::collections::HashMap;

use petgraph::{
    Directed, Direction,
    stable_graph::{EdgeIndex, NodeIndex, StableGraph},
    visit::EdgeRef,
};
use serde::{Serialize, ser::SerializeStruct};
use thiserror::Error;
use tracing::warn;

use crate::{
    network::{edge::TopologyEdge, node::TopologyNode},
    topology::error::IdentityCollision,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("no node with identity '{0}'")]
    UnknownNode(String),
}

/// An edge with both endpoints resolved.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    pub source: &'a TopologyNode,
    pub target: &'a TopologyNode,
    pub edge: &'a TopologyEdge,
}

/// Directed multigraph of routers and pseudonodes.
///
/// Nodes and edges live in a `StableGraph` arena; `index_by_id` maps each node's
/// current identity to its arena slot. Relabeling only rewrites that table (and the
/// node's `id`), so indices, edges and attributes stay where they are.
/// Nodes iterate in insertion order; edges iterate by `seq`, the order their Link
/// records arrived in.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    graph: StableGraph<TopologyNode, TopologyEdge, Directed>,
    index_by_id: HashMap<String, NodeIndex>,
    collisions: Vec<IdentityCollision>,
}

impl TopologyGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TopologyNode> {
        self.graph.node_indices().map(move |index| &self.graph[index])
    }

    pub fn node(&self, id: &str) -> Option<&TopologyNode> {
        self.index_by_id.get(id).map(|&index| &self.graph[index])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    /// Lookup by the advertised IGP Router ID, regardless of relabeling.
    pub fn node_by_router_id(&self, router_id: &str) -> Option<&TopologyNode> {
        self.nodes().find(|node| node.router_id == router_id)
    }

    pub fn edges(&self) -> Vec<EdgeView<'_>> {
        let mut views: Vec<EdgeView<'_>> = self
            .graph
            .edge_indices()
            .filter_map(|index| {
                let (source, target) = self.graph.edge_endpoints(index)?;
                Some(self.view(source, target, &self.graph[index]))
            })
            .collect();
        views.sort_by_key(|view| view.edge.seq);
        views
    }

    pub fn edges_from(&self, id: &str) -> Vec<EdgeView<'_>> {
        let Some(&index) = self.index_by_id.get(id) else {
            return Vec::new();
        };
        let mut views: Vec<EdgeView<'_>> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|e| self.view(e.source(), e.target(), e.weight()))
            .collect();
        views.sort_by_key(|view| view.edge.seq);
        views
    }

    pub fn edges_between(&self, source: &str, target: &str) -> Vec<EdgeView<'_>> {
        self.edges_from(source)
            .into_iter()
            .filter(|view| view.target.id == target)
            .collect()
    }

    /// Identity clashes resolved while relabeling, in the order they happened.
    pub fn collisions(&self) -> &[IdentityCollision] {
        &self.collisions
    }

    /// Changes a node's identity in place. If `new_id` already names another node the
    /// two are merged: the one inserted later survives and takes over the other's edges,
    /// prefixes and attributes.
    pub fn relabel(
        &mut self,
        current: &str,
        new_id: &str,
    ) -> Result<Option<IdentityCollision>, GraphError> {
        let index = *self
            .index_by_id
            .get(current)
            .ok_or_else(|| GraphError::UnknownNode(current.to_string()))?;
        if current == new_id {
            return Ok(None);
        }
        self.index_by_id.remove(current);
        match self.index_by_id.get(new_id).copied() {
            Some(existing) => Ok(Some(self.resolve_clash(existing, index, new_id))),
            None => {
                self.graph[index].id = new_id.to_string();
                self.index_by_id.insert(new_id.to_string(), index);
                Ok(None)
            }
        }
    }

    /// Gives every node the identity `identity` computes for it, then rebuilds the
    /// lookup table in insertion order. Targets are computed up front so a rename
    /// onto a key that is itself being renamed away doesn't count as a clash.
    pub fn remap_identities<F>(&mut self, identity: F) -> Vec<IdentityCollision>
    where
        F: Fn(&TopologyNode) -> String,
    {
        let targets: Vec<(NodeIndex, String)> = self
            .graph
            .node_indices()
            .map(|index| (index, identity(&self.graph[index])))
            .collect();

        self.index_by_id.clear();
        let mut collisions = Vec::new();
        for (index, new_id) in targets {
            match self.index_by_id.get(&new_id).copied() {
                Some(earlier) => collisions.push(self.resolve_clash(earlier, index, &new_id)),
                None => {
                    self.graph[index].id = new_id.clone();
                    self.index_by_id.insert(new_id, index);
                }
            }
        }
        collisions
    }

    pub(crate) fn ensure_node(&mut self, router_id: &str) -> NodeIndex {
        if let Some(&index) = self.index_by_id.get(router_id) {
            return index;
        }
        let index = self.graph.add_node(TopologyNode::new(router_id));
        self.index_by_id.insert(router_id.to_string(), index);
        index
    }

    pub(crate) fn node_at_mut(&mut self, index: NodeIndex) -> &mut TopologyNode {
        &mut self.graph[index]
    }

    pub(crate) fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, edge: TopologyEdge) {
        self.graph.add_edge(source, target, edge);
    }

    fn view<'a>(
        &'a self,
        source: NodeIndex,
        target: NodeIndex,
        edge: &'a TopologyEdge,
    ) -> EdgeView<'a> {
        EdgeView {
            source: &self.graph[source],
            target: &self.graph[target],
            edge,
        }
    }

    /// Merges the earlier-inserted of `a` and `b` into the later one under `identity`.
    fn resolve_clash(&mut self, a: NodeIndex, b: NodeIndex, identity: &str) -> IdentityCollision {
        let (survivor, absorbed) = if a.index() > b.index() { (a, b) } else { (b, a) };

        self.retarget_edges(absorbed, survivor);
        let absorbed_router_id = self.graph[absorbed].router_id.clone();
        if let Some(node) = self.graph.remove_node(absorbed) {
            self.graph[survivor].absorb(node);
        }
        self.graph[survivor].id = identity.to_string();
        self.index_by_id.insert(identity.to_string(), survivor);

        let collision = IdentityCollision {
            identity: identity.to_string(),
            surviving_router_id: self.graph[survivor].router_id.clone(),
            absorbed_router_id,
        };
        warn!(%collision, "identity collision, merging nodes");
        self.collisions.push(collision.clone());
        collision
    }

    /// Moves every edge touching `from` onto `to`. Edge weights, including `seq`,
    /// travel unchanged.
    fn retarget_edges(&mut self, from: NodeIndex, to: NodeIndex) {
        let mut incident: Vec<EdgeIndex> = self
            .graph
            .edges_directed(from, Direction::Outgoing)
            .map(|e| e.id())
            .chain(
                self.graph
                    .edges_directed(from, Direction::Incoming)
                    .map(|e| e.id()),
            )
            .collect();
        incident.sort();
        incident.dedup();

        for edge in incident {
            let Some((source, target)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            let Some(weight) = self.graph.remove_edge(edge) else {
                continue;
            };
            let source = if source == from { to } else { source };
            let target = if target == from { to } else { target };
            self.graph.add_edge(source, target, weight);
        }
    }
}

#[derive(Serialize)]
struct SerializedEdge<'a> {
    source: &'a str,
    target: &'a str,
    #[serde(flatten)]
    edge: &'a TopologyEdge,
}

impl Serialize for TopologyGraph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let nodes: Vec<&TopologyNode> = self.nodes().collect();
        let edges: Vec<SerializedEdge<'_>> = self
            .edges()
            .into_iter()
            .map(|view| SerializedEdge {
                source: &view.source.id,
                target: &view.target.id,
                edge: view.edge,
            })
            .collect();

        let mut st = serializer.serialize_struct("TopologyGraph", 3)?;
        st.serialize_field("nodes", &nodes)?;
        st.serialize_field("edges", &edges)?;
        st.serialize_field("collisions", &self.collisions)?;
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::bgp_ls::record::Attributes;

    fn edge(seq: usize, cost: u32) -> TopologyEdge {
        TopologyEdge {
            seq,
            cost,
            remote_is_pseudonode: false,
            local_router_id: String::new(),
            remote_router_id: String::new(),
            raw_attributes: Attributes::new(),
        }
    }

    /// a -> b, b -> c, c -> a with costs 1, 2, 3.
    fn triangle() -> TopologyGraph {
        let mut graph = TopologyGraph::default();
        let a = graph.ensure_node("a");
        let b = graph.ensure_node("b");
        let c = graph.ensure_node("c");
        graph.add_edge(a, b, edge(0, 1));
        graph.add_edge(b, c, edge(1, 2));
        graph.add_edge(c, a, edge(2, 3));
        graph
    }

    #[test]
    fn test_ensure_node_is_idempotent() {
        let mut graph = TopologyGraph::default();
        let first = graph.ensure_node("a");
        let second = graph.ensure_node("a");
        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_relabel_keeps_edges() {
        let mut graph = triangle();
        let collision = graph.relabel("a", "R1").unwrap();
        assert!(collision.is_none());

        assert!(!graph.contains_node("a"));
        let node = graph.node("R1").unwrap();
        assert_eq!(node.router_id, "a");
        assert!(node.is_relabeled());

        let out = graph.edges_from("R1");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target.id, "b");
        assert_eq!(graph.edges_between("c", "R1").len(), 1);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_relabel_unknown_node() {
        let mut graph = triangle();
        assert_eq!(
            graph.relabel("zzz", "R1"),
            Err(GraphError::UnknownNode("zzz".to_string()))
        );
    }

    #[test]
    fn test_relabel_onto_existing_merges_into_later_node() {
        let mut graph = triangle();
        // "a" was inserted before "c", so "c" survives
        let collision = graph.relabel("a", "c").unwrap().unwrap();
        assert_eq!(collision.surviving_router_id, "c");
        assert_eq!(collision.absorbed_router_id, "a");

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 3);
        let costs: Vec<u32> = graph.edges().iter().map(|v| v.edge.cost).collect();
        assert_eq!(costs, vec![1, 2, 3]);
        // c -> a became a self loop on c
        assert_eq!(graph.edges_between("c", "c").len(), 1);
        assert_eq!(graph.edges_between("c", "b").len(), 1);
        assert_eq!(graph.collisions().len(), 1);
    }

    #[test]
    fn test_remap_swapping_names_is_not_a_collision() {
        let mut graph = triangle();
        let collisions = graph.remap_identities(|node| match node.router_id.as_str() {
            "a" => "b".to_string(),
            "b" => "a".to_string(),
            other => other.to_string(),
        });
        assert!(collisions.is_empty());
        assert_eq!(graph.node("b").unwrap().router_id, "a");
        assert_eq!(graph.node("a").unwrap().router_id, "b");
        assert_eq!(graph.edges_between("b", "a")[0].edge.cost, 1);
    }

    #[test]
    fn test_nodes_iterate_in_insertion_order() {
        let mut graph = triangle();
        graph.remap_identities(|node| node.router_id.to_uppercase());
        let ids: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_serialization() {
        let graph = triangle();
        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(value["nodes"][0]["routerId"], "a");
        assert_eq!(value["edges"][1]["source"], "b");
        assert_eq!(value["edges"][1]["target"], "c");
        assert_eq!(value["edges"][1]["cost"], 2);
        assert!(value["collisions"].as_array().unwrap().is_empty());
    }
}
