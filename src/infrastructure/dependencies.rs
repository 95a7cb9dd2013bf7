//! Dependency probe.
//!
//! Libraries come from the `<dependencies>` block of a Maven `pom.xml`; each
//! Java file that declares a package becomes a `File` node and gets a
//! `DEPENDS` edge to every library whose groupId prefixes one of its imports.

use anyhow::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::domain::builder::GraphBuilder;
use crate::domain::graph::{GraphNode, ProbeGraph, Relation};
use crate::domain::java_source::JavaUnit;
use crate::domain::probe::ProbeKind;
use crate::error::{read_input, ProbeError};
use crate::infrastructure::project_loader::{ProjectLoader, SourceFile};
use crate::ports::Probe;

pub const UNKNOWN_VERSION: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl MavenDependency {
    pub fn uid(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }

    fn to_node(&self) -> GraphNode {
        GraphNode::Library {
            uid: self.uid(),
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: self.version.clone(),
        }
    }
}

#[derive(Default)]
struct PartialDependency {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
}

/// Parse the direct dependencies of a pom. Entries inside
/// `<dependencyManagement>` or plugin declarations are not direct
/// dependencies and are ignored. `${name}` versions are substituted from
/// `<properties>` when defined there.
pub fn parse_pom(content: &str) -> Result<Vec<MavenDependency>, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut properties: HashMap<String, String> = HashMap::new();
    let mut partials: Vec<PartialDependency> = Vec::new();
    let mut current: Option<PartialDependency> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                path.push(name);
                if is_direct_dependency(&path) {
                    current = Some(PartialDependency::default());
                }
            }
            Ok(Event::End(_)) => {
                if is_direct_dependency(&path) {
                    if let Some(dep) = current.take() {
                        partials.push(dep);
                    }
                }
                path.pop();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|e| e.to_string())?.trim().to_string();
                let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                match segments.as_slice() {
                    ["project", "properties", key] => {
                        properties.insert(key.to_string(), text);
                    }
                    ["project", "version"] => {
                        properties.insert("project.version".to_string(), text);
                    }
                    ["project", "groupId"] => {
                        properties.insert("project.groupId".to_string(), text);
                    }
                    ["project", "dependencies", "dependency", field] => {
                        if let Some(dep) = current.as_mut() {
                            match *field {
                                "groupId" => dep.group_id = Some(text),
                                "artifactId" => dep.artifact_id = Some(text),
                                "version" => dep.version = Some(text),
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error at {}: {e}", reader.buffer_position())),
            _ => {}
        }
    }

    let mut seen = HashSet::new();
    let dependencies = partials
        .into_iter()
        .filter_map(|p| {
            let (Some(group_id), Some(artifact_id)) = (p.group_id, p.artifact_id) else {
                debug!("Skipping dependency without groupId/artifactId");
                return None;
            };
            let version = match p.version {
                Some(v) if !v.is_empty() => substitute_property(&v, &properties),
                _ => UNKNOWN_VERSION.to_string(),
            };
            Some(MavenDependency {
                group_id: substitute_property(&group_id, &properties),
                artifact_id,
                version,
            })
        })
        .filter(|dep| seen.insert(dep.uid()))
        .collect();
    Ok(dependencies)
}

fn is_direct_dependency(path: &[String]) -> bool {
    path.len() == 3 && path[0] == "project" && path[1] == "dependencies" && path[2] == "dependency"
}

fn substitute_property(value: &str, properties: &HashMap<String, String>) -> String {
    value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .and_then(|key| properties.get(key))
        .cloned()
        .unwrap_or_else(|| value.to_string())
}

/// Imports of one packaged source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileImports {
    /// `/`-prefixed path relative to the source root.
    pub file_name: String,
    pub imports: Vec<String>,
}

fn scan_file(file: &SourceFile) -> Option<FileImports> {
    let unit = JavaUnit::parse(&file.content);
    unit.package.as_ref()?;
    Some(FileImports {
        file_name: format!("/{}", file.rel_path),
        imports: unit.imports,
    })
}

pub struct DependencyProbe {
    pom: PathBuf,
    source_root: PathBuf,
}

impl DependencyProbe {
    pub fn new(pom: impl Into<PathBuf>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            pom: pom.into(),
            source_root: source_root.into(),
        }
    }
}

impl Probe for DependencyProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Dependencies
    }

    fn collect(&self) -> Result<ProbeGraph> {
        let content = read_input(&self.pom)?;
        let dependencies = parse_pom(&content).map_err(|message| ProbeError::Malformed {
            what: "pom",
            path: self.pom.clone(),
            message,
        })?;
        let sources = ProjectLoader::load_java_sources(&self.source_root)?;

        let mut files: Vec<FileImports> = sources.par_iter().filter_map(scan_file).collect();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        let mut graph = GraphBuilder::new(self.kind().probe_name());
        for dep in &dependencies {
            graph.add_node(dep.to_node());
        }
        for file in &files {
            let from = graph.add_node(GraphNode::File {
                file_name: file.file_name.clone(),
            });
            for dep in &dependencies {
                if file.imports.iter().any(|imp| imp.starts_with(&dep.group_id)) {
                    graph.add_edge(Relation::Depends, from.clone(), dep.to_node().node_ref());
                }
            }
        }

        info!(
            "Dependencies: {} libraries, {} source files, {} edges",
            dependencies.len(),
            files.len(),
            graph.edge_count()
        );
        Ok(graph.finish())
    }
}
