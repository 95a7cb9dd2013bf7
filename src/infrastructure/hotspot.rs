//! Performance hot-spot probe.
//!
//! One `PerformanceHotspot` per profiled method under the base package,
//! optionally enriched with memory figures from a second export.

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::domain::builder::GraphBuilder;
use crate::domain::graph::{GraphNode, ProbeGraph, Relation};
use crate::domain::probe::ProbeKind;
use crate::domain::resolver::{IdentifierContext, TypeResolver};
use crate::error::{read_input, ProbeError};
use crate::infrastructure::profiler::{in_scope, is_method_shaped};
use crate::ports::Probe;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Deserialize)]
struct HotspotRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Self Time", default)]
    self_time: String,
    #[serde(rename = "Self Time (CPU)", default)]
    self_time_cpu: String,
    #[serde(rename = "Total Time", default)]
    total_time: String,
    #[serde(rename = "Total Time (CPU)", default)]
    total_time_cpu: String,
    #[serde(rename = "Invocations", default)]
    invocations: String,
}

#[derive(Debug, Deserialize)]
struct MemoryRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Live Bytes", default)]
    live_bytes: String,
    #[serde(rename = "Allocated Objects", default)]
    allocated_objects: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryFigures {
    pub live_bytes: f64,
    pub allocated_objects: u64,
}

fn decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"))
}

/// First decimal number in a profiler cell such as `"1,234.5 ms (12%)"`.
/// Missing or unparsable cells count as zero.
pub fn lenient_f64(cell: &str) -> f64 {
    let cleaned = cell.replace(',', "");
    decimal_re()
        .find(&cleaned)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

pub fn lenient_u64(cell: &str) -> u64 {
    let cleaned = cell.replace(',', "");
    cleaned
        .split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

pub struct HotspotProbe {
    performance: PathBuf,
    memory: Option<PathBuf>,
    base_package: String,
    resolver: TypeResolver,
    observed_at: NaiveDateTime,
}

impl HotspotProbe {
    pub fn new(performance: impl Into<PathBuf>, base_package: impl Into<String>, resolver: TypeResolver) -> Self {
        Self {
            performance: performance.into(),
            memory: None,
            base_package: base_package.into(),
            resolver,
            observed_at: Local::now().naive_local(),
        }
    }

    pub fn with_memory(mut self, memory: Option<PathBuf>) -> Self {
        self.memory = memory;
        self
    }

    /// Fix the timestamp that goes into hotspot ids.
    pub fn observed_at(mut self, at: NaiveDateTime) -> Self {
        self.observed_at = at;
        self
    }

    /// Resolved signature for an in-scope, method-shaped name.
    fn method_name(&self, raw: &str) -> Option<String> {
        let name = raw.trim();
        if !is_method_shaped(name) || !in_scope(name, &self.base_package) {
            return None;
        }
        let member = name.split('(').next().unwrap_or(name).trim();
        let ctx = IdentifierContext::default().with_enclosing(member);
        Some(self.resolver.qualify_signature(name, &ctx))
    }

    fn read_memory(&self, path: &Path) -> Result<HashMap<String, MemoryFigures>, ProbeError> {
        let text = read_input(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut figures = HashMap::new();
        for row in reader.deserialize::<MemoryRow>() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    debug!("Skipping memory row: {e}");
                    continue;
                }
            };
            if let Some(method) = self.method_name(&row.name) {
                figures.insert(
                    method,
                    MemoryFigures {
                        live_bytes: lenient_f64(&row.live_bytes),
                        allocated_objects: lenient_u64(&row.allocated_objects),
                    },
                );
            }
        }
        Ok(figures)
    }
}

impl Probe for HotspotProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Hotspots
    }

    fn collect(&self) -> Result<ProbeGraph> {
        let text = read_input(&self.performance)?;
        let memory = match &self.memory {
            Some(path) => self.read_memory(path)?,
            None => HashMap::new(),
        };
        let stamp = self.observed_at.format(TIMESTAMP_FORMAT).to_string();

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut graph = GraphBuilder::new(self.kind().probe_name());
        let mut enriched = 0usize;
        for row in reader.deserialize::<HotspotRow>() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    debug!("Skipping hotspot row: {e}");
                    continue;
                }
            };
            let Some(method) = self.method_name(&row.name) else {
                continue;
            };

            let figures = memory.get(&method);
            if figures.is_some() {
                enriched += 1;
            }
            let hotspot = GraphNode::PerformanceHotspot {
                id: format!("{method}_{stamp}"),
                self_time: lenient_f64(&row.self_time),
                self_time_cpu: lenient_f64(&row.self_time_cpu),
                total_time: lenient_f64(&row.total_time),
                total_time_cpu: lenient_f64(&row.total_time_cpu),
                invocations: lenient_u64(&row.invocations),
                live_bytes: figures.map(|f| f.live_bytes),
                allocated_objects: figures.map(|f| f.allocated_objects),
            };
            graph.attribute(GraphNode::method(method), hotspot, Relation::HasPerformance);
        }

        info!(
            "Hotspots: {} nodes, {} edges ({} with memory figures)",
            graph.node_count(),
            graph.edge_count(),
            enriched
        );
        Ok(graph.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_numbers() {
        assert_eq!(lenient_f64("1,234.5 ms (12%)"), 1234.5);
        assert_eq!(lenient_f64("  "), 0.0);
        assert_eq!(lenient_f64("n/a"), 0.0);
        assert_eq!(lenient_u64("12,001"), 12001);
        assert_eq!(lenient_u64("7 calls"), 7);
        assert_eq!(lenient_u64(""), 0);
    }

    #[test]
    fn test_method_name_scope_and_shape() {
        let probe = HotspotProbe::new("perf.csv", "org.acme", TypeResolver::default());
        assert_eq!(
            probe.method_name(" org.acme.vet.VetController.showVetList (int, Model) ").as_deref(),
            Some("org.acme.vet.VetController.showVetList(int,org.springframework.ui.Model)")
        );
        assert!(probe.method_name("org.acme.vet").is_none());
        assert!(probe.method_name("java.lang.Thread.run ()").is_none());
    }
}
