use tracing::debug;

/// How host CPU capacity is apportioned across concurrent external
/// invocations: `workers` processes at a time, each limited to
/// `threads_per_worker` internal threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyPlan {
    pub workers: usize,
    pub threads_per_worker: usize,
}

impl ConcurrencyPlan {
    /// Derive a plan from a logical CPU count. Explicit overrides always win;
    /// otherwise `threads_per_worker` comes from a fixed threshold table and
    /// `workers` fills the remaining capacity. Both values are clamped to at
    /// least one. `workers * threads_per_worker` staying within the CPU count
    /// is a heuristic, not an enforced bound.
    pub fn derive(
        logical_cpus: usize,
        workers: Option<usize>,
        threads_per_worker: Option<usize>,
    ) -> Self {
        let threads_per_worker = threads_per_worker
            .unwrap_or(match logical_cpus {
                n if n >= 32 => 4,
                n if n >= 16 => 3,
                n if n >= 8 => 2,
                _ => 1,
            })
            .max(1);
        let workers = workers
            .unwrap_or_else(|| logical_cpus / threads_per_worker)
            .max(1);

        if workers * threads_per_worker > logical_cpus {
            debug!(
                workers,
                threads_per_worker, logical_cpus, "plan oversubscribes the host CPUs"
            );
        }

        Self {
            workers,
            threads_per_worker,
        }
    }

    /// Derive a plan from the ambient hardware parallelism. Kept out of
    /// [`Self::derive`] so tests can supply a fake CPU count.
    pub fn detect(workers: Option<usize>, threads_per_worker: Option<usize>) -> Self {
        let logical_cpus = std::thread::available_parallelism().map_or(1, usize::from);
        Self::derive(logical_cpus, workers, threads_per_worker)
    }
}
