use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::require_dir;

/// One `.java` file found under a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the scanned root, always with `/` separators.
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub content: String,
}

pub struct ProjectLoader;

impl ProjectLoader {
    /// Load every `.java` file under `root`, sorted by relative path.
    pub fn load_java_sources(root: &Path) -> Result<Vec<SourceFile>> {
        require_dir(root)?;
        let mut files = Vec::new();
        Self::collect_java_recursive(root, root, &mut files)?;
        files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        Ok(files)
    }

    fn collect_java_recursive(root: &Path, dir: &Path, out: &mut Vec<SourceFile>) -> Result<()> {
        if dir.ends_with("target") || dir.ends_with(".git") || dir.ends_with("build") {
            return Ok(());
        }

        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to list directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                Self::collect_java_recursive(root, &path, out)?;
            } else if path.extension().is_some_and(|ext| ext == "java") {
                let content = match fs::read_to_string(&path) {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable file {}: {e}", path.display());
                        continue;
                    }
                };
                out.push(SourceFile {
                    rel_path: relative_slash_path(root, &path),
                    abs_path: path,
                    content,
                });
            }
        }
        Ok(())
    }
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
