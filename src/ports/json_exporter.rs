//! JSON Graph Exporter
//!
//! Writes a ProbeGraph as pretty-printed JSON in the loader's import shape.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::domain::graph::ProbeGraph;
use crate::ports::GraphExporter;

pub struct JsonExporter;

impl JsonExporter {
    pub fn to_json(graph: &ProbeGraph) -> Result<String> {
        serde_json::to_string_pretty(graph).context("Failed to serialize graph")
    }
}

impl GraphExporter for JsonExporter {
    fn export(&self, graph: &ProbeGraph, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
        }
        let content = Self::to_json(graph)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}
