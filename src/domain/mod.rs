// Domain model for Probegraph: graph types, name resolution, graph building
// and Java source scanning. No I/O happens in here.

pub mod builder;
pub mod call_tree;
pub mod graph;
pub mod java_source;
pub mod probe;
pub mod resolver;
