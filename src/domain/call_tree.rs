// Call tree reconstruction for Probegraph.
// Rebuilds caller -> callee edges from a call tree that a profiler flattened
// depth-first, pre-order (indentation level or XML nesting depth).

use crate::domain::builder::GraphBuilder;
use crate::domain::graph::Relation;

/// One row of a flattened call tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    pub depth: usize,
    pub raw_label: String,
    pub resolved: String,
}

impl CallFrame {
    pub fn new(depth: usize, raw_label: impl Into<String>, resolved: impl Into<String>) -> Self {
        Self {
            depth,
            raw_label: raw_label.into(),
            resolved: resolved.into(),
        }
    }
}

/// Explicit-stack walker over one input's frames. Owned by a single walk and
/// dropped with it.
#[derive(Debug)]
pub struct CallTree {
    relation: Relation,
    stack: Vec<CallFrame>,
    previous: Option<(usize, String)>,
}

impl CallTree {
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            stack: Vec::new(),
            previous: None,
        }
    }

    /// Feed the next frame. Returns the `(caller, callee)` pair when an edge
    /// was recorded.
    pub fn enter(&mut self, frame: CallFrame, graph: &mut GraphBuilder) -> Option<(String, String)> {
        // a row repeating the previous one at the same depth is self time
        if self
            .previous
            .as_ref()
            .is_some_and(|(depth, name)| *depth == frame.depth && *name == frame.resolved)
        {
            return None;
        }
        self.previous = Some((frame.depth, frame.resolved.clone()));

        while self.stack.last().is_some_and(|top| top.depth >= frame.depth) {
            self.stack.pop();
        }

        let edge = match self.stack.last() {
            Some(caller) if caller.resolved != frame.resolved => {
                graph.record_call(self.relation, &caller.resolved, &frame.resolved);
                Some((caller.resolved.clone(), frame.resolved.clone()))
            }
            _ => None,
        };

        self.stack.push(frame);
        edge
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Walk a whole frame sequence into `graph`.
pub fn walk_frames<I>(frames: I, relation: Relation, graph: &mut GraphBuilder) -> usize
where
    I: IntoIterator<Item = CallFrame>,
{
    let mut tree = CallTree::new(relation);
    frames
        .into_iter()
        .filter_map(|frame| tree.enter(frame, graph))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(rows: &[(usize, &str)]) -> Vec<CallFrame> {
        rows.iter().map(|(d, n)| CallFrame::new(*d, *n, *n)).collect()
    }

    #[test]
    fn test_sibling_pops_back_to_ancestor() {
        let mut graph = GraphBuilder::new("DynamiCall");
        let added = walk_frames(
            frames(&[(0, "A"), (1, "B"), (2, "C"), (1, "D")]),
            Relation::DynamicCall,
            &mut graph,
        );
        assert_eq!(added, 3);
        let g = graph.finish();
        assert!(g.find_edge("A", "B").is_some());
        assert!(g.find_edge("B", "C").is_some());
        assert!(g.find_edge("A", "D").is_some());
        assert!(g.find_edge("C", "D").is_none());
    }

    #[test]
    fn test_consecutive_identical_frames_add_nothing() {
        let mut graph = GraphBuilder::new("DynamiCall");
        let added = walk_frames(
            frames(&[(0, "A"), (1, "B"), (1, "B")]),
            Relation::DynamicCall,
            &mut graph,
        );
        assert_eq!(added, 1);
        assert_eq!(graph.finish().edges[0].count(), Some(1));
    }

    #[test]
    fn test_same_name_at_new_depth_is_still_pushed() {
        let mut tree = CallTree::new(Relation::DynamicCall);
        let mut graph = GraphBuilder::default();
        tree.enter(CallFrame::new(0, "A", "A"), &mut graph);
        tree.enter(CallFrame::new(1, "B", "B"), &mut graph);
        assert_eq!(tree.enter(CallFrame::new(2, "B", "B"), &mut graph), None);
        assert_eq!(tree.depth(), 3);
        assert_eq!(
            tree.enter(CallFrame::new(3, "C", "C"), &mut graph),
            Some(("B".to_string(), "C".to_string()))
        );
    }

    #[test]
    fn test_roots_have_no_caller() {
        let mut tree = CallTree::new(Relation::DynamicCall);
        let mut graph = GraphBuilder::default();
        assert_eq!(tree.enter(CallFrame::new(0, "A", "A"), &mut graph), None);
        assert_eq!(tree.enter(CallFrame::new(0, "B", "B"), &mut graph), None);
        assert_eq!(tree.depth(), 1);
    }
}
