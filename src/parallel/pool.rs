//! Rayon thread pool configuration for fallback-path scans.
//!
//! Per-record categorization is embarrassingly parallel; results are merged
//! and sorted afterwards, so the worker count never affects output order.

use rayon::ThreadPoolBuilder;

/// Configures how many worker threads a parallel scan uses.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use Rayon's default (all cores).
    pub workers: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

impl WorkerPool {
    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Worker count from `ZANA_WORKERS`, defaulting to all cores.
    pub fn from_env() -> Self {
        let workers = std::env::var("ZANA_WORKERS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);
        Self { workers }
    }

    /// Run a closure on a pool with this worker count. A zero count uses
    /// the global Rayon pool; otherwise a temporary pool is built. Falls
    /// back to the global pool if the temporary pool cannot be created.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(err) => {
                eprintln!("parallel: could not build {}-thread pool ({err}); using default", self.workers);
                f()
            }
        }
    }
}
