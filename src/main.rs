// Command-line entry point for probegraph.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, warn};

use probegraph::application::AnalyzeUsecase;
use probegraph::config::ProbeConfig;
use probegraph::domain::probe::ProbeKind;
use probegraph::infrastructure::concurrency::init_thread_pool;
use probegraph::infrastructure::{
    ChangeProbe, ComplexityProbe, DependencyProbe, DynamicCallProbe, GitCli, HotspotProbe,
};
use probegraph::logger::init_logger;
use probegraph::ports::json_exporter::JsonExporter;
use probegraph::ports::Probe;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn code-analysis artifacts into graph JSON", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Worker threads for parallel source scanning
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// PMD report -> methods/classes with issues
    Complexity {
        report: PathBuf,
        source_dir: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Report rule to keep
        #[arg(long)]
        rule: Option<String>,
    },
    /// pom.xml + sources -> files depending on libraries
    Dependencies {
        pom: PathBuf,
        source_dir: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Profiler call tree (CSV or XML) -> method call edges
    DynamicCalls {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Base package; frames outside it are dropped
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Profiler hot-spot CSV -> methods with performance figures
    Hotspots {
        perf_csv: PathBuf,
        #[arg(long)]
        memory: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Git history -> methods with change/fix counts
    Changes {
        #[arg(long)]
        src: PathBuf,
        /// Repository root (defaults to --src)
        #[arg(long)]
        git_root: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Count whole-file history instead of per-method line ranges
        #[arg(long)]
        whole_file: bool,
    },
}

impl Command {
    fn kind(&self) -> ProbeKind {
        match self {
            Command::Complexity { .. } => ProbeKind::Complexity,
            Command::Dependencies { .. } => ProbeKind::Dependencies,
            Command::DynamicCalls { .. } => ProbeKind::DynamicCalls,
            Command::Hotspots { .. } => ProbeKind::Hotspots,
            Command::Changes { .. } => ProbeKind::Changes,
        }
    }

    fn output(&self) -> PathBuf {
        let explicit = match self {
            Command::Complexity { output, .. }
            | Command::Dependencies { output, .. }
            | Command::DynamicCalls { output, .. }
            | Command::Hotspots { output, .. }
            | Command::Changes { output, .. } => output.clone(),
        };
        explicit.unwrap_or_else(|| PathBuf::from(self.kind().default_output()))
    }

    fn into_probe(self, config: &ProbeConfig) -> Box<dyn Probe> {
        let resolver = config.resolver();
        match self {
            Command::Complexity {
                report,
                source_dir,
                rule,
                ..
            } => Box::new(
                ComplexityProbe::new(report, source_dir, resolver)
                    .with_rule(rule.unwrap_or_else(|| config.complexity.rule.clone())),
            ),
            Command::Dependencies { pom, source_dir, .. } => Box::new(DependencyProbe::new(pom, source_dir)),
            Command::DynamicCalls { input, prefix, .. } => Box::new(
                DynamicCallProbe::new(
                    input,
                    prefix.unwrap_or_else(|| config.scope.base_package.clone()),
                    resolver,
                )
                .with_profiler(config.profiler.clone()),
            ),
            Command::Hotspots {
                perf_csv,
                memory,
                prefix,
                ..
            } => Box::new(
                HotspotProbe::new(
                    perf_csv,
                    prefix.unwrap_or_else(|| config.scope.base_package.clone()),
                    resolver,
                )
                .with_memory(memory),
            ),
            Command::Changes {
                src,
                git_root,
                whole_file,
                ..
            } => {
                let repo_root = git_root.unwrap_or_else(|| src.clone());
                Box::new(
                    ChangeProbe::new(src, repo_root.clone(), GitCli::new(repo_root), resolver)
                        .with_fix_keywords(config.history.fix_keywords.clone())
                        .whole_file(whole_file || config.history.whole_file),
                )
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ProbeConfig::load(cli.config.as_deref())?;

    if let Err(e) = init_thread_pool(cli.jobs) {
        warn!("Thread pool already initialized: {e}");
    }

    let output = cli.command.output();
    let probe = cli.command.into_probe(&config);
    let usecase = AnalyzeUsecase {
        probe: probe.as_ref(),
        exporter: &JsonExporter,
    };
    usecase.run(&output)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}
