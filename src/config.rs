//! Configuration
//!
//! Optional TOML file. Every field has a default, so an empty file (or no
//! file) is a valid configuration. CLI flags override what is loaded here.
//!
//! ```toml
//! [resolver]
//! prefer_same_package = true
//! infer_from_enclosing = true
//! fallback_namespace = "java.lang"
//!
//! [resolver.well_known]
//! Pageable = "org.springframework.data.domain.Pageable"
//!
//! [scope]
//! base_package = "org.springframework.samples.petclinic"
//!
//! [profiler]
//! indent_width = 2
//!
//! [history]
//! fix_keywords = ["fix", "bug"]
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::domain::resolver::{ResolverOptions, ResolverTables, TypeResolver};
use crate::error::{read_input, ProbeError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub resolver: ResolverSection,
    pub scope: ScopeSection,
    pub profiler: ProfilerSection,
    pub complexity: ComplexitySection,
    pub history: HistorySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    pub prefer_same_package: bool,
    pub infer_from_enclosing: bool,
    pub fallback_namespace: Option<String>,
    pub well_known: BTreeMap<String, String>,
}

impl Default for ResolverSection {
    fn default() -> Self {
        let options = ResolverOptions::default();
        Self {
            prefer_same_package: options.prefer_same_package,
            infer_from_enclosing: options.infer_from_enclosing,
            fallback_namespace: None,
            well_known: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScopeSection {
    /// Only frames and rows under this package are kept by the profiler probes.
    pub base_package: String,
}

impl Default for ScopeSection {
    fn default() -> Self {
        Self {
            base_package: "org.springframework.samples.petclinic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfilerSection {
    /// Leading spaces per call-tree level in CSV exports.
    pub indent_width: usize,
    pub self_time_label: String,
}

impl Default for ProfilerSection {
    fn default() -> Self {
        Self {
            indent_width: 2,
            self_time_label: "Self time".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComplexitySection {
    pub rule: String,
}

impl Default for ComplexitySection {
    fn default() -> Self {
        Self {
            rule: "CyclomaticComplexity".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    pub fix_keywords: Vec<String>,
    pub whole_file: bool,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            fix_keywords: ["fix", "bug", "issue", "patch", "resolve"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            whole_file: false,
        }
    }
}

impl ProbeConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ProbeError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = read_input(path)?;
        let config: ProbeConfig = toml::from_str(&text)
            .map_err(|e| ProbeError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<(), ProbeError> {
        if self.profiler.indent_width == 0 {
            return Err(ProbeError::Config("profiler.indent_width must be at least 1".to_string()));
        }
        if self.complexity.rule.trim().is_empty() {
            return Err(ProbeError::Config("complexity.rule must not be empty".to_string()));
        }
        Ok(())
    }

    /// Build the resolver described by the `[resolver]` section.
    pub fn resolver(&self) -> TypeResolver {
        let mut tables = ResolverTables::default().with_well_known(self.resolver.well_known.clone());
        if let Some(ns) = &self.resolver.fallback_namespace {
            tables = tables.with_fallback_namespace(ns.clone());
        }
        TypeResolver::new(
            tables,
            ResolverOptions {
                prefer_same_package: self.resolver.prefer_same_package,
                infer_from_enclosing: self.resolver.infer_from_enclosing,
            },
        )
    }
}
