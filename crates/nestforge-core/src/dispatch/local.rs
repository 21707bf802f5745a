use crate::dispatch::WalkDispatcher;
use crate::error::{NsError, NsResult};
use crate::walker::Walker;
use nestforge_protocol::{WalkJob, WalkResult};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// Fixed-size pool of OS threads running walks in-process.
pub struct LocalPool {
    pool: ThreadPool,
    walker: Arc<Walker>,
}

impl LocalPool {
    pub fn new(walker: Arc<Walker>, nprocs: usize) -> NsResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(nprocs)
            .build()
            .map_err(|e| NsError::Config(format!("failed to build thread pool: {}", e)))?;
        Ok(Self { pool, walker })
    }
}

impl WalkDispatcher for LocalPool {
    fn run_batch(&self, jobs: &[WalkJob]) -> NsResult<Vec<WalkResult>> {
        let walker = &self.walker;
        // par_iter keeps input order on collect; a single failed walk
        // fails the whole batch.
        self.pool
            .install(|| jobs.par_iter().map(|job| walker.walk(job)).collect())
    }
}
