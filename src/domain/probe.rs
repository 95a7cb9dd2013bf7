//! Probe Domain Module
//!
//! Defines the kinds of probes Probegraph can run and their output identity.

/// One variant per input family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Complexity,
    Dependencies,
    DynamicCalls,
    Hotspots,
    Changes,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 5] = [
        ProbeKind::Complexity,
        ProbeKind::Dependencies,
        ProbeKind::DynamicCalls,
        ProbeKind::Hotspots,
        ProbeKind::Changes,
    ];

    /// Parse a probe kind from a CLI-style name.
    pub fn from_str(s: &str) -> Option<ProbeKind> {
        match s.to_lowercase().as_str() {
            "complexity" | "cyclomatic" | "pmd" => Some(ProbeKind::Complexity),
            "dependencies" | "pom" | "deps" => Some(ProbeKind::Dependencies),
            "dynamic-calls" | "dynamicall" | "dcall" => Some(ProbeKind::DynamicCalls),
            "hotspots" | "hotspot" => Some(ProbeKind::Hotspots),
            "changes" | "changespot" => Some(ProbeKind::Changes),
            _ => None,
        }
    }

    /// CLI subcommand name.
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Complexity => "complexity",
            ProbeKind::Dependencies => "dependencies",
            ProbeKind::DynamicCalls => "dynamic-calls",
            ProbeKind::Hotspots => "hotspots",
            ProbeKind::Changes => "changes",
        }
    }

    /// Value written to the `probeName` field of the output graph.
    pub fn probe_name(&self) -> &'static str {
        match self {
            ProbeKind::Complexity => "Cyclomatic",
            ProbeKind::Dependencies => "POM",
            ProbeKind::DynamicCalls => "DynamiCall",
            ProbeKind::Hotspots => "HotSpot",
            ProbeKind::Changes => "Changespot",
        }
    }

    pub fn default_output(&self) -> &'static str {
        match self {
            ProbeKind::Complexity => "pmd_cyclomatic.json",
            ProbeKind::Dependencies => "dependencies.json",
            ProbeKind::DynamicCalls => "dynamic_calls.json",
            ProbeKind::Hotspots => "performance-tracking.json",
            ProbeKind::Changes => "change-tracking.json",
        }
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
