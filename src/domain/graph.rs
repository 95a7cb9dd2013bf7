//! Node/edge graph model shared by every probe.
//!
//! Edges reference nodes by key (`nodeType`, `propertyName`, `propertyValue`),
//! never by position, so nodes and edges serialize independently and the
//! loader matches them up on import.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Method,
    Class,
    Issue,
    Library,
    File,
    Changespot,
    PerformanceHotspot,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Method => "Method",
            NodeKind::Class => "Class",
            NodeKind::Issue => "Issue",
            NodeKind::Library => "Library",
            NodeKind::File => "File",
            NodeKind::Changespot => "Changespot",
            NodeKind::PerformanceHotspot => "PerformanceHotspot",
        }
    }

    /// Name of the property that identifies a node of this kind.
    pub fn key_property(&self) -> &'static str {
        match self {
            NodeKind::Method | NodeKind::Class => "fullName",
            NodeKind::Issue | NodeKind::Changespot | NodeKind::PerformanceHotspot => "id",
            NodeKind::Library => "uid",
            NodeKind::File => "fileName",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed graph node. Each variant carries only its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GraphNode {
    #[serde(rename_all = "camelCase")]
    Method {
        full_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Class {
        full_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        short_name: Option<String>,
    },
    Issue { id: String, description: String },
    #[serde(rename_all = "camelCase")]
    Library {
        uid: String,
        group_id: String,
        artifact_id: String,
        version: String,
    },
    #[serde(rename_all = "camelCase")]
    File { file_name: String },
    #[serde(rename_all = "camelCase")]
    Changespot {
        id: String,
        num_of_changes: u64,
        num_of_fixes: u64,
    },
    PerformanceHotspot {
        id: String,
        self_time: f64,
        self_time_cpu: f64,
        total_time: f64,
        total_time_cpu: f64,
        invocations: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        live_bytes: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        allocated_objects: Option<u64>,
    },
}

impl GraphNode {
    pub fn method(full_name: impl Into<String>) -> Self {
        GraphNode::Method {
            full_name: full_name.into(),
            name: None,
        }
    }

    /// Class node; the short name is the last dotted segment.
    pub fn class(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let short_name = full_name.rsplit('.').next().map(str::to_string);
        GraphNode::Class {
            full_name,
            short_name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            GraphNode::Method { .. } => NodeKind::Method,
            GraphNode::Class { .. } => NodeKind::Class,
            GraphNode::Issue { .. } => NodeKind::Issue,
            GraphNode::Library { .. } => NodeKind::Library,
            GraphNode::File { .. } => NodeKind::File,
            GraphNode::Changespot { .. } => NodeKind::Changespot,
            GraphNode::PerformanceHotspot { .. } => NodeKind::PerformanceHotspot,
        }
    }

    /// Value of the identifying property.
    pub fn key(&self) -> &str {
        match self {
            GraphNode::Method { full_name, .. } | GraphNode::Class { full_name, .. } => full_name,
            GraphNode::Issue { id, .. }
            | GraphNode::Changespot { id, .. }
            | GraphNode::PerformanceHotspot { id, .. } => id,
            GraphNode::Library { uid, .. } => uid,
            GraphNode::File { file_name } => file_name,
        }
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.kind(), self.key())
    }
}

/// Key-based reference to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRef {
    pub node_type: NodeKind,
    pub property_name: String,
    pub property_value: String,
}

impl NodeRef {
    pub fn new(kind: NodeKind, value: impl Into<String>) -> Self {
        Self {
            node_type: kind,
            property_name: kind.key_property().to_string(),
            property_value: value.into(),
        }
    }
}

/// Relation names understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "HASISSUE")]
    HasIssue,
    #[serde(rename = "HASPERFORMANCE")]
    HasPerformance,
    #[serde(rename = "HASCHANGELOG")]
    HasChangelog,
    #[serde(rename = "DEPENDS")]
    Depends,
    #[serde(rename = "DCALL")]
    DynamicCall,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::HasIssue => "HASISSUE",
            Relation::HasPerformance => "HASPERFORMANCE",
            Relation::HasChangelog => "HASCHANGELOG",
            Relation::Depends => "DEPENDS",
            Relation::DynamicCall => "DCALL",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub relation_name: Relation,
    pub from: NodeRef,
    pub to: NodeRef,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

impl GraphEdge {
    pub fn new(relation: Relation, from: NodeRef, to: NodeRef) -> Self {
        Self {
            relation_name: relation,
            from,
            to,
            properties: BTreeMap::new(),
        }
    }

    /// Aggregated call count, for edges that carry one.
    pub fn count(&self) -> Option<u64> {
        self.properties.get("count").and_then(Value::as_u64)
    }

    pub(crate) fn set_count(&mut self, count: u64) {
        self.properties.insert("count".to_string(), Value::from(count));
    }
}

/// The serialized output of one probe run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeGraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_name: Option<String>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl ProbeGraph {
    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    pub fn find_edge(&self, from: &str, to: &str) -> Option<&GraphEdge> {
        self.edges
            .iter()
            .find(|e| e.from.property_value == from && e.to.property_value == to)
    }
}
