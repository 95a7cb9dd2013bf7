//! Static complexity probe.
//!
//! Reads a PMD text report (`<path>:<line>: <Rule>: <message>`) and attaches
//! one `Issue` per reported line to the method or class it points at.

use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::domain::builder::GraphBuilder;
use crate::domain::graph::{GraphNode, ProbeGraph, Relation};
use crate::domain::java_source::{package_and_class_from_path, JavaUnit, MethodSpan};
use crate::domain::probe::ProbeKind;
use crate::domain::resolver::{IdentifierContext, MethodSignature, TypeResolver};
use crate::error::{read_input, require_dir};
use crate::ports::Probe;

fn report_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\./)?(?P<file>\S+):(?P<line>\d+):\s+(?P<rule>\w+):\s+(?P<msg>.+)$")
            .expect("valid regex")
    })
}

fn method_message_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^The (?:method|constructor) '([^']+)' has").expect("valid regex"))
}

fn class_message_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^The class '([^']+)' has").expect("valid regex"))
}

/// One parsed report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub file: String,
    pub line: usize,
    pub rule: String,
    pub message: String,
}

impl ReportEntry {
    pub fn parse(line: &str) -> Option<Self> {
        let caps = report_line_re().captures(line.trim_end())?;
        Some(Self {
            file: caps["file"].to_string(),
            line: caps["line"].parse().ok()?,
            rule: caps["rule"].to_string(),
            message: caps["msg"].trim().to_string(),
        })
    }

    pub fn issue_id(&self) -> String {
        format!("{}:{}:{}:{}", self.file, self.line, self.rule, self.message)
    }
}

pub struct ComplexityProbe {
    report: PathBuf,
    source_root: PathBuf,
    rule: String,
    resolver: TypeResolver,
}

impl ComplexityProbe {
    pub fn new(report: impl Into<PathBuf>, source_root: impl Into<PathBuf>, resolver: TypeResolver) -> Self {
        Self {
            report: report.into(),
            source_root: source_root.into(),
            rule: "CyclomaticComplexity".to_string(),
            resolver,
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = rule.into();
        self
    }

    fn locate(&self, file: &str) -> Option<PathBuf> {
        let direct = Path::new(file);
        if direct.is_absolute() && direct.is_file() {
            return Some(direct.to_path_buf());
        }
        let joined = self.source_root.join(file);
        joined.is_file().then_some(joined)
    }

    /// The code entity a report entry points at.
    fn entity_for(&self, entry: &ReportEntry, unit: &JavaUnit) -> GraphNode {
        let (path_package, path_class) = package_and_class_from_path(&entry.file);
        let package = unit.package.clone().unwrap_or(path_package);
        let owner = unit
            .owner_of(entry.line)
            .map(str::to_string)
            .unwrap_or(path_class);
        let ctx = unit.context();
        let qualified_owner = if package.is_empty() {
            owner
        } else {
            format!("{package}.{owner}")
        };

        if let Some(caps) = method_message_re().captures(&entry.message) {
            let label = &caps[1];
            if let Some(sig) = MethodSignature::parse(label) {
                return GraphNode::method(format!("{qualified_owner}.{}", sig.qualify(&self.resolver, &ctx)));
            }
            // a bare name: take the parameters from the declaration
            if let Some(span) = unit.method_at(entry.line).filter(|s| s.name == label) {
                return GraphNode::method(method_fqn(&qualified_owner, span, &self.resolver, &ctx));
            }
            return GraphNode::method(format!("{qualified_owner}.{label}()"));
        }

        if let Some(caps) = class_message_re().captures(&entry.message) {
            let class = &caps[1];
            let fqn = match unit.type_path(class) {
                Some(path) if !package.is_empty() => format!("{package}.{path}"),
                Some(path) => path.to_string(),
                None if class.contains('.') || package.is_empty() => class.to_string(),
                None => format!("{package}.{class}"),
            };
            return GraphNode::class(fqn);
        }

        match unit.method_at(entry.line) {
            Some(span) => GraphNode::method(method_fqn(&qualified_owner, span, &self.resolver, &ctx)),
            None => GraphNode::class(qualified_owner),
        }
    }
}

fn method_fqn(
    qualified_owner: &str,
    span: &MethodSpan,
    resolver: &TypeResolver,
    ctx: &IdentifierContext,
) -> String {
    let sig = MethodSignature {
        name: span.name.clone(),
        params: span.params.clone(),
    };
    format!("{qualified_owner}.{}", sig.qualify(resolver, ctx))
}

impl Probe for ComplexityProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Complexity
    }

    fn collect(&self) -> Result<ProbeGraph> {
        let report = read_input(&self.report)?;
        require_dir(&self.source_root)?;

        let mut graph = GraphBuilder::new(self.kind().probe_name());
        let mut units: HashMap<PathBuf, JavaUnit> = HashMap::new();
        let mut skipped = 0usize;

        for raw in report.lines() {
            let Some(entry) = ReportEntry::parse(raw) else {
                continue;
            };
            if entry.rule != self.rule {
                debug!("Ignoring rule {} at {}:{}", entry.rule, entry.file, entry.line);
                continue;
            }

            let Some(path) = self.locate(&entry.file) else {
                warn!("Source file not found: {}", self.source_root.join(&entry.file).display());
                skipped += 1;
                continue;
            };

            if !units.contains_key(&path) {
                match std::fs::read_to_string(&path) {
                    Ok(text) => {
                        units.insert(path.clone(), JavaUnit::parse(&text));
                    }
                    Err(e) => {
                        warn!("Cannot read {}: {e}", path.display());
                        skipped += 1;
                        continue;
                    }
                }
            }
            let Some(unit) = units.get(&path) else {
                continue;
            };

            let entity = self.entity_for(&entry, unit);
            let issue = GraphNode::Issue {
                id: entry.issue_id(),
                description: entry.message.clone(),
            };
            graph.attribute(entity, issue, Relation::HasIssue);
        }

        info!(
            "Complexity: {} nodes, {} edges ({} report lines skipped)",
            graph.node_count(),
            graph.edge_count(),
            skipped
        );
        Ok(graph.finish())
    }
}
