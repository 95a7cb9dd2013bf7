// Seams between the use case and the outside world: where graphs come from,
// where they go, and how version-control history is queried.

use std::path::{Path, PathBuf};

use crate::domain::graph::ProbeGraph;
use crate::domain::probe::ProbeKind;
use crate::error::HistoryError;

pub mod json_exporter;

/// One input family turned into a graph.
pub trait Probe {
    fn kind(&self) -> ProbeKind;
    fn collect(&self) -> anyhow::Result<ProbeGraph>;
}

pub trait GraphExporter {
    fn export(&self, graph: &ProbeGraph, path: &Path) -> anyhow::Result<()>;
}

/// What part of a file's history to ask about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryScope {
    /// 1-based, inclusive line range.
    Lines { start: usize, end: usize },
    /// The whole file, following renames.
    WholeFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Path relative to the repository root.
    pub path: PathBuf,
    pub scope: HistoryScope,
}

impl HistoryQuery {
    pub fn lines(path: impl Into<PathBuf>, start: usize, end: usize) -> Self {
        Self {
            path: path.into(),
            scope: HistoryScope::Lines { start, end },
        }
    }

    pub fn whole_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scope: HistoryScope::WholeFile,
        }
    }
}

pub trait HistorySource {
    /// Subjects of the commits touching the queried range, newest first.
    fn commit_subjects(&self, query: &HistoryQuery) -> Result<Vec<String>, HistoryError>;
}

impl<T: HistorySource + ?Sized> HistorySource for &T {
    fn commit_subjects(&self, query: &HistoryQuery) -> Result<Vec<String>, HistoryError> {
        (**self).commit_subjects(query)
    }
}
