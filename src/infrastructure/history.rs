/// Git history source.
///
/// Runs `git log` synchronously, one query at a time. Commits are picked out
/// of the output by a format marker, so any patch text `-L` prints in
/// between is ignored.
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::error::HistoryError;
use crate::ports::{HistoryQuery, HistoryScope, HistorySource};

const COMMIT_MARKER: &str = "commit:";

/// stderr fragments that mean "nothing recorded" rather than a failure.
const NO_HISTORY_HINTS: &[&str] = &[
    "no matches",
    "fatal: file",
    "has only",
    "does not have any commits",
    "no such path",
];

/// Program and arguments for one query (testable without running git).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

pub fn build_command_spec(query: &HistoryQuery) -> GitCommandSpec {
    let path = slash_path(&query.path);
    let format = format!("--format={COMMIT_MARKER}%h %s");
    let args = match query.scope {
        HistoryScope::Lines { start, end } => vec![
            "log".to_string(),
            format!("-L{start},{end}:{path}"),
            format,
        ],
        HistoryScope::WholeFile => vec![
            "log".to_string(),
            "--follow".to_string(),
            format,
            "--".to_string(),
            path,
        ],
    };
    GitCommandSpec {
        program: "git".to_string(),
        args,
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Subjects of the marked commit lines, in output order.
pub fn parse_log_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix(COMMIT_MARKER))
        .map(|rest| match rest.split_once(' ') {
            Some((_hash, subject)) => subject.trim().to_string(),
            None => String::new(),
        })
        .collect()
}

fn means_no_history(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    NO_HISTORY_HINTS.iter().any(|hint| lower.contains(hint))
}

pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }
}

impl HistorySource for GitCli {
    fn commit_subjects(&self, query: &HistoryQuery) -> Result<Vec<String>, HistoryError> {
        let spec = build_command_spec(query);
        debug!("Running {} {}", spec.program, spec.args.join(" "));

        let output = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|source| HistoryError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if means_no_history(&stderr) {
                return Err(HistoryError::NoHistory(slash_path(&query.path)));
            }
            return Err(HistoryError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        Ok(parse_log_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_range_command() {
        let spec = build_command_spec(&HistoryQuery::lines("src/main/java/A.java", 10, 24));
        assert_eq!(spec.program, "git");
        assert_eq!(
            spec.args,
            vec!["log", "-L10,24:src/main/java/A.java", "--format=commit:%h %s"]
        );
    }

    #[test]
    fn test_whole_file_command() {
        let spec = build_command_spec(&HistoryQuery::whole_file("A.java"));
        assert!(spec.args.contains(&"--follow".to_string()));
        assert_eq!(spec.args.last().map(String::as_str), Some("A.java"));
    }

    #[test]
    fn test_parse_ignores_patch_text() {
        let stdout = "commit:abc1234 Fix owner lookup\n\
                      \n\
                      diff --git a/A.java b/A.java\n\
                      @@ -10,3 +10,4 @@\n\
                      +commit: not a marker because of the leading plus\n\
                      commit:def5678 Add pet type formatter\n";
        assert_eq!(
            parse_log_output(stdout),
            vec!["Fix owner lookup".to_string(), "Add pet type formatter".to_string()]
        );
    }

    #[test]
    fn test_no_history_detection() {
        assert!(means_no_history("fatal: file src/A.java has only 3 lines"));
        assert!(means_no_history("fatal: -L parameter: no matches"));
        assert!(!means_no_history("fatal: not a git repository"));
    }
}
