use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::ports::{GraphExporter, Probe};

/// Counts reported after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub nodes: usize,
    pub edges: usize,
}

pub struct AnalyzeUsecase<'a> {
    pub probe: &'a dyn Probe,
    pub exporter: &'a dyn GraphExporter,
}

impl<'a> AnalyzeUsecase<'a> {
    pub fn run(&self, export_path: &Path) -> anyhow::Result<RunSummary> {
        let kind = self.probe.kind();
        let graph = self
            .probe
            .collect()
            .with_context(|| format!("{kind} probe failed"))?;
        let summary = RunSummary {
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
        };
        self.exporter.export(&graph, export_path)?;
        info!(
            "{kind}: wrote {} nodes and {} edges to {}",
            summary.nodes,
            summary.edges,
            export_path.display()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::GraphBuilder;
    use crate::domain::graph::{ProbeGraph, Relation};
    use crate::domain::probe::ProbeKind;
    use std::cell::RefCell;

    struct FixedProbe;

    impl Probe for FixedProbe {
        fn kind(&self) -> ProbeKind {
            ProbeKind::DynamicCalls
        }

        fn collect(&self) -> anyhow::Result<ProbeGraph> {
            let mut builder = GraphBuilder::new(self.kind().probe_name());
            builder.record_call(Relation::DynamicCall, "A", "B");
            Ok(builder.finish())
        }
    }

    #[derive(Default)]
    struct Capture(RefCell<Option<ProbeGraph>>);

    impl GraphExporter for Capture {
        fn export(&self, graph: &ProbeGraph, _path: &Path) -> anyhow::Result<()> {
            *self.0.borrow_mut() = Some(graph.clone());
            Ok(())
        }
    }

    #[test]
    fn test_run_exports_and_summarizes() {
        let exporter = Capture::default();
        let usecase = AnalyzeUsecase {
            probe: &FixedProbe,
            exporter: &exporter,
        };
        let summary = usecase.run(Path::new("out.json")).unwrap();
        assert_eq!(summary, RunSummary { nodes: 2, edges: 1 });
        assert!(exporter.0.borrow().is_some());
    }
}
