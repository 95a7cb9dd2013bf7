//! Logging setup for the probegraph binary.
//!
//! Library code only emits `tracing` events; the subscriber is installed once
//! by the CLI. `RUST_LOG` is honored unless `--verbose` or `--quiet` is given.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter for the given verbosity flags. `verbose` wins over `quiet`.
pub fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("probegraph=debug")
    } else if quiet {
        EnvFilter::new("probegraph=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("probegraph=info"))
    }
}

/// Install the global subscriber. Logs go to stderr so JSON written to
/// stdout-redirected files is never interleaved with them.
pub fn init_logger(verbose: bool, quiet: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(build_filter(verbose, quiet))
        .with(fmt_layer)
        .try_init();
}
