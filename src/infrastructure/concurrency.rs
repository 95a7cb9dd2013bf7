/// Worker pool sizing for probegraph.
/// Only the dependency probe's per-file scan runs on the pool.
use anyhow::Result;
use tracing::info;

/// Worker count when none is requested: half the logical CPUs, at least 1.
pub fn default_workers() -> usize {
    std::cmp::max(1, num_cpus::get() / 2)
}

/// Initialize the global rayon thread pool. `Some(0)` is treated as the
/// default.
pub fn init_thread_pool(jobs: Option<usize>) -> Result<usize> {
    let workers = match jobs {
        Some(n) if n > 0 => n,
        _ => default_workers(),
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    info!(
        "Initialized thread pool: {} workers (system has {} cores)",
        workers,
        num_cpus::get()
    );
    Ok(workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workers_is_at_least_one() {
        assert!(default_workers() >= 1);
        assert!(default_workers() <= num_cpus::get());
    }

    #[test]
    fn test_init_thread_pool_once() {
        // the global pool can only be built once per process; a second
        // build reports an error instead of replacing it
        let first = init_thread_pool(Some(2));
        let second = init_thread_pool(Some(2));
        assert!(first.is_ok() || second.is_err());
        assert!(second.is_err());
    }
}
