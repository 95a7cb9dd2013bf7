//! Dynamic call probe.
//!
//! Turns a profiler's call tree into `DCALL` edges between methods, with a
//! `count` property for repeated caller/callee pairs.

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::ProfilerSection;
use crate::domain::builder::GraphBuilder;
use crate::domain::call_tree::{walk_frames, CallFrame};
use crate::domain::graph::{ProbeGraph, Relation};
use crate::domain::probe::ProbeKind;
use crate::domain::resolver::{IdentifierContext, TypeResolver};
use crate::error::{read_input, ProbeError};
use crate::infrastructure::profiler::{in_scope, read_csv_frames, read_xml_frames, RawFrame};
use crate::ports::Probe;

pub struct DynamicCallProbe {
    input: PathBuf,
    base_package: String,
    profiler: ProfilerSection,
    resolver: TypeResolver,
}

impl DynamicCallProbe {
    pub fn new(input: impl Into<PathBuf>, base_package: impl Into<String>, resolver: TypeResolver) -> Self {
        Self {
            input: input.into(),
            base_package: base_package.into(),
            profiler: ProfilerSection::default(),
            resolver,
        }
    }

    pub fn with_profiler(mut self, profiler: ProfilerSection) -> Self {
        self.profiler = profiler;
        self
    }

    fn is_xml(&self) -> bool {
        self.input
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
    }

    fn raw_frames(&self) -> Result<Vec<RawFrame>, ProbeError> {
        let text = read_input(&self.input)?;
        if self.is_xml() {
            read_xml_frames(&text).map_err(|message| ProbeError::Malformed {
                what: "profiler XML",
                path: self.input.clone(),
                message,
            })
        } else {
            Ok(read_csv_frames(&text, &self.profiler))
        }
    }

    /// Qualify a raw label. Parameter types that are not otherwise known
    /// take the package of the method that declares them.
    pub fn resolve_label(&self, label: &str) -> String {
        let member = label.split('(').next().unwrap_or(label).trim();
        let ctx = IdentifierContext::default().with_enclosing(member);
        self.resolver.qualify_signature(label, &ctx)
    }
}

impl Probe for DynamicCallProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::DynamicCalls
    }

    fn collect(&self) -> Result<ProbeGraph> {
        let raw = self.raw_frames()?;
        let total = raw.len();

        let frames: Vec<CallFrame> = raw
            .into_iter()
            .filter(|f| in_scope(&f.label, &self.base_package))
            .map(|f| {
                let resolved = self.resolve_label(&f.label);
                CallFrame::new(f.depth, f.label, resolved)
            })
            .collect();
        debug!("{} of {} frames are in scope", frames.len(), total);

        let mut graph = GraphBuilder::new(self.kind().probe_name());
        let calls = walk_frames(frames, Relation::DynamicCall, &mut graph);

        info!(
            "Dynamic calls: {} calls observed, {} methods, {} distinct edges",
            calls,
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph.finish())
    }
}
