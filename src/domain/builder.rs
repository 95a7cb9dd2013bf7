//! Call/Issue Graph Builder.
//!
//! Accumulates nodes and edges for one probe run. Nodes are deduplicated by
//! `(type, key)`; call edges are aggregated by `(caller, callee)` with a
//! `count` property instead of being repeated.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::domain::graph::{GraphEdge, GraphNode, NodeKind, NodeRef, ProbeGraph, Relation};

#[derive(Debug, Default)]
pub struct GraphBuilder {
    probe_name: Option<String>,
    nodes: Vec<GraphNode>,
    node_keys: HashSet<(NodeKind, String)>,
    edges: Vec<GraphEdge>,
    // (relation, from, to) -> index into `edges`, for counted edges only
    counted: HashMap<(Relation, NodeRef, NodeRef), usize>,
}

impl GraphBuilder {
    pub fn new(probe_name: impl Into<String>) -> Self {
        Self {
            probe_name: Some(probe_name.into()),
            ..Self::default()
        }
    }

    /// Insert a node unless one with the same identity exists already.
    /// Returns the key reference either way.
    pub fn add_node(&mut self, node: GraphNode) -> NodeRef {
        let node_ref = node.node_ref();
        if self.node_keys.insert((node.kind(), node.key().to_string())) {
            self.nodes.push(node);
        }
        node_ref
    }

    pub fn contains(&self, kind: NodeKind, key: &str) -> bool {
        self.node_keys.contains(&(kind, key.to_string()))
    }

    pub fn add_edge(&mut self, relation: Relation, from: NodeRef, to: NodeRef) {
        self.edges.push(GraphEdge::new(relation, from, to));
    }

    /// Flat attribution: attach one observation node (issue, hotspot,
    /// changespot) to one code entity (method or class).
    ///
    /// The entity is created at most once per key. The observation is a new
    /// node per record; its id is unique by construction, and an accidental
    /// repeat collapses onto the existing node. Returns `false` in that case.
    pub fn attribute(&mut self, entity: GraphNode, observation: GraphNode, relation: Relation) -> bool {
        let fresh = !self.contains(observation.kind(), observation.key());
        if !fresh {
            debug!(id = observation.key(), "observation id seen before, reusing node");
        }
        let from = self.add_node(entity);
        let to = self.add_node(observation);
        self.add_edge(relation, from, to);
        fresh
    }

    /// Hierarchical mode: record one `caller -> callee` call between methods.
    /// Repeated pairs bump `properties.count`.
    pub fn record_call(&mut self, relation: Relation, caller: &str, callee: &str) {
        let from = self.add_node(GraphNode::method(caller));
        let to = self.add_node(GraphNode::method(callee));
        self.accumulate(relation, from, to, 1);
    }

    fn accumulate(&mut self, relation: Relation, from: NodeRef, to: NodeRef, by: u64) {
        let key = (relation, from, to);
        match self.counted.get(&key) {
            Some(&idx) => {
                let edge = &mut self.edges[idx];
                let count = edge.count().unwrap_or(0) + by;
                edge.set_count(count);
            }
            None => {
                let (relation, from, to) = key.clone();
                let mut edge = GraphEdge::new(relation, from, to);
                edge.set_count(by);
                self.counted.insert(key, self.edges.len());
                self.edges.push(edge);
            }
        }
    }

    /// Merge a graph built independently (e.g. from another file).
    /// Nodes are a set-union; counted edges add up; other edges append.
    pub fn absorb(&mut self, graph: ProbeGraph) {
        for node in graph.nodes {
            self.add_node(node);
        }
        for edge in graph.edges {
            match edge.count() {
                Some(count) => self.accumulate(edge.relation_name, edge.from, edge.to, count),
                None => self.edges.push(edge),
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn finish(self) -> ProbeGraph {
        ProbeGraph {
            probe_name: self.probe_name,
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}
