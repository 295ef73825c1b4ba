//! Explicit compute context shared by every component that launches parallel
//! work.
//!
//! The context is built once by the application entry point and handed to the
//! detector behind an `Arc`. It owns the worker pool and fixes the natural
//! parallel width (the work-group size the phases are tuned for).

use crate::error::ResourceError;
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

/// Options for building a [`ComputeContext`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// Number of lanes in one work-group. Also decides where the pipeline
    /// switches from anchor-level to classifier-level parallelism.
    pub parallel_width: usize,
    /// Worker threads; `None` lets rayon pick one per logical core.
    pub threads: Option<usize>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            parallel_width: 64,
            threads: None,
        }
    }
}

pub struct ComputeContext {
    parallel_width: usize,
    pool: ThreadPool,
}

impl ComputeContext {
    pub fn new(options: ContextOptions) -> Result<Self, ResourceError> {
        let parallel_width = options.parallel_width.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.threads.unwrap_or(0))
            .thread_name(|idx| format!("cascade-worker-{idx}"))
            .build()
            .map_err(|e| ResourceError::WorkerPool(e.to_string()))?;
        debug!(
            "ComputeContext::new parallel_width={} threads={}",
            parallel_width,
            pool.current_num_threads()
        );
        Ok(Self {
            parallel_width,
            pool,
        })
    }

    #[inline]
    pub fn parallel_width(&self) -> usize {
        self.parallel_width
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `op` inside the context's worker pool.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl std::fmt::Debug for ComputeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeContext")
            .field("parallel_width", &self.parallel_width)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}
