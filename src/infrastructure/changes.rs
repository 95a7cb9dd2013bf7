//! Change-frequency probe.
//!
//! For every method in the source tree, counts the commits that touched its
//! line range and how many of them look like fixes.

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::domain::builder::GraphBuilder;
use crate::domain::graph::{GraphNode, ProbeGraph, Relation};
use crate::domain::java_source::{package_and_class_from_path, JavaUnit};
use crate::domain::probe::ProbeKind;
use crate::domain::resolver::TypeResolver;
use crate::error::HistoryError;
use crate::infrastructure::project_loader::{ProjectLoader, SourceFile};
use crate::ports::{HistoryQuery, HistorySource, Probe};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Commit statistics for one method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeStats {
    pub changes: u64,
    pub fixes: u64,
}

impl ChangeStats {
    /// Count commits, and fixes by case-insensitive keyword match on the
    /// subject.
    pub fn from_subjects(subjects: &[String], fix_keywords: &[String]) -> Self {
        let keywords: Vec<String> = fix_keywords.iter().map(|k| k.to_lowercase()).collect();
        let fixes = subjects
            .iter()
            .filter(|subject| {
                let lower = subject.to_lowercase();
                keywords.iter().any(|k| lower.contains(k.as_str()))
            })
            .count();
        Self {
            changes: subjects.len() as u64,
            fixes: fixes as u64,
        }
    }
}

pub struct ChangeProbe<H: HistorySource> {
    source_root: PathBuf,
    repo_root: PathBuf,
    history: H,
    resolver: TypeResolver,
    fix_keywords: Vec<String>,
    whole_file: bool,
    observed_at: NaiveDateTime,
}

impl<H: HistorySource> ChangeProbe<H> {
    pub fn new(
        source_root: impl Into<PathBuf>,
        repo_root: impl Into<PathBuf>,
        history: H,
        resolver: TypeResolver,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            repo_root: repo_root.into(),
            history,
            resolver,
            fix_keywords: crate::config::HistorySection::default().fix_keywords,
            whole_file: false,
            observed_at: Local::now().naive_local(),
        }
    }

    pub fn with_fix_keywords(mut self, keywords: Vec<String>) -> Self {
        self.fix_keywords = keywords;
        self
    }

    /// Attribute whole-file history to every method in the file.
    pub fn whole_file(mut self, enabled: bool) -> Self {
        self.whole_file = enabled;
        self
    }

    pub fn observed_at(mut self, at: NaiveDateTime) -> Self {
        self.observed_at = at;
        self
    }

    /// Path of a source file as the repository sees it.
    fn repo_path(&self, file: &SourceFile) -> PathBuf {
        let abs = canonical(&file.abs_path);
        let root = canonical(&self.repo_root);
        abs.strip_prefix(&root)
            .map(Path::to_path_buf)
            .unwrap_or(abs)
    }

    fn stats(&self, query: &HistoryQuery) -> ChangeStats {
        match self.history.commit_subjects(query) {
            Ok(subjects) => ChangeStats::from_subjects(&subjects, &self.fix_keywords),
            Err(HistoryError::NoHistory(what)) => {
                debug!("No history for {what}");
                ChangeStats::default()
            }
            Err(e) => {
                warn!("History query failed for {}: {e}", query.path.display());
                ChangeStats::default()
            }
        }
    }

    fn analyze_file(&self, file: &SourceFile, stamp: &str, graph: &mut GraphBuilder) {
        let unit = JavaUnit::parse(&file.content);
        if unit.methods.is_empty() {
            return;
        }
        let (_, path_class) = package_and_class_from_path(&file.rel_path);
        let ctx = unit.context();
        let repo_path = self.repo_path(file);

        let file_stats = self
            .whole_file
            .then(|| self.stats(&HistoryQuery::whole_file(&repo_path)));

        for span in &unit.methods {
            let owner = unit.owner_of(span.start_line).unwrap_or(path_class.as_str());
            let fqn = unit.method_fqn(span, owner, &self.resolver, &ctx);
            let stats = match file_stats {
                Some(stats) => stats,
                None => self.stats(&HistoryQuery::lines(&repo_path, span.start_line, span.end_line)),
            };
            debug!("{fqn}: {} changes, {} fixes", stats.changes, stats.fixes);

            let changespot = GraphNode::Changespot {
                id: format!("{fqn}_{stamp}"),
                num_of_changes: stats.changes,
                num_of_fixes: stats.fixes,
            };
            graph.attribute(GraphNode::method(fqn), changespot, Relation::HasChangelog);
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl<H: HistorySource> Probe for ChangeProbe<H> {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Changes
    }

    fn collect(&self) -> Result<ProbeGraph> {
        let sources = ProjectLoader::load_java_sources(&self.source_root)?;
        let stamp = self.observed_at.format(TIMESTAMP_FORMAT).to_string();

        let mut graph = GraphBuilder::new(self.kind().probe_name());
        for file in &sources {
            self.analyze_file(file, &stamp, &mut graph);
        }

        info!(
            "Changes: {} files, {} nodes, {} edges",
            sources.len(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph.finish())
    }
}

/// In-memory history keyed by repository path. Unknown paths have no history.
#[derive(Debug, Default)]
pub struct StaticHistory {
    subjects: HashMap<PathBuf, Vec<String>>,
}

impl StaticHistory {
    pub fn with_file(mut self, path: impl Into<PathBuf>, subjects: &[&str]) -> Self {
        self.subjects
            .insert(path.into(), subjects.iter().map(|s| s.to_string()).collect());
        self
    }
}

impl HistorySource for StaticHistory {
    fn commit_subjects(&self, query: &HistoryQuery) -> Result<Vec<String>, HistoryError> {
        self.subjects
            .get(&query.path)
            .cloned()
            .ok_or_else(|| HistoryError::NoHistory(query.path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_keywords_case_insensitive() {
        let subjects = vec![
            "Fix NPE in owner lookup".to_string(),
            "BUGFIX: pet date".to_string(),
            "Add vet specialties".to_string(),
            "Resolve #12".to_string(),
        ];
        let keywords = crate::config::HistorySection::default().fix_keywords;
        assert_eq!(
            ChangeStats::from_subjects(&subjects, &keywords),
            ChangeStats { changes: 4, fixes: 3 }
        );
    }

    #[test]
    fn test_no_subjects_is_zero() {
        assert_eq!(ChangeStats::from_subjects(&[], &["fix".to_string()]), ChangeStats::default());
    }
}
