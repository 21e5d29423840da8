//! Static work partitioning over a fixed-size worker pool
//!
//! Each pass splits a dimension into contiguous ranges, one per worker, and
//! waits for every worker before returning. The partition only depends on
//! the extent and the thread count, so results are reproducible.

use layered_core::{LayeredError, Result};
use rayon::prelude::*;
use std::ops::Range;

/// Split `0..extent` into at most `workers` contiguous, non-empty ranges
///
/// Every worker but the last receives `ceil(extent / workers)` elements.
pub fn partition(extent: usize, workers: usize) -> Vec<Range<usize>> {
    if extent == 0 {
        return Vec::new();
    }
    let per_worker = extent.div_ceil(workers.max(1));
    (0..extent)
        .step_by(per_worker)
        .map(|start| start..(start + per_worker).min(extent))
        .collect()
}

/// Workers shared by every pass of one conversion
///
/// With a single thread everything runs on the caller's thread. Otherwise a
/// dedicated pool of exactly `num_threads` threads is built once and reused.
pub struct WorkerPool {
    num_threads: usize,
    pool: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    pub fn new(num_threads: usize) -> Result<Self> {
        let num_threads = num_threads.max(1);
        let pool = if num_threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()
                .map_err(|e| {
                    log::error!("failed to build a pool of {num_threads} threads: {e}");
                    LayeredError::ThreadPool
                })?;
            Some(pool)
        } else {
            None
        };
        Ok(Self { num_threads, pool })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Split `0..extent` into one range per worker
    pub fn partition(&self, extent: usize) -> Vec<Range<usize>> {
        partition(extent, self.num_threads)
    }

    /// Run `f` once per work item and collect the results in item order
    ///
    /// The first error aborts the pass.
    pub fn run<W, R, F>(&self, work: Vec<W>, f: F) -> Result<Vec<R>>
    where
        W: Send,
        R: Send,
        F: Fn(usize, W) -> Result<R> + Sync,
    {
        match &self.pool {
            Some(pool) if work.len() > 1 => pool.install(|| {
                work.into_par_iter()
                    .enumerate()
                    .map(|(index, item)| f(index, item))
                    .collect()
            }),
            _ => work
                .into_iter()
                .enumerate()
                .map(|(index, item)| f(index, item))
                .collect(),
        }
    }
}
