use nestforge_protocol::protocol::{Shard, WalkFault, WorkerInfo};
use nestforge_protocol::{RunSpec, WalkJob, WalkResult};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Worker lifecycle: `Registering -> Idle <-> Busy`. Disconnection is
/// terminal — the entry is dropped from the pool once its in-flight shard
/// has been reissued, so it never appears as a status here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Registering,
    Idle,
    Busy,
}

impl WorkerStatus {
    fn as_str(self) -> &'static str {
        match self {
            WorkerStatus::Registering => "registering",
            WorkerStatus::Idle => "idle",
            WorkerStatus::Busy => "busy",
        }
    }
}

#[derive(Debug)]
pub struct WorkerEntry {
    pub addr: String,
    pub cores: u32,
    pub status: WorkerStatus,
    pub last_seen: Instant,
    /// The shard this worker is currently holding, if any.
    pub assigned: Option<(String, usize)>,
}

#[derive(Debug)]
struct Batch {
    spec: RunSpec,
    jobs: Vec<WalkJob>,
    results: Vec<Option<WalkResult>>,
    remaining: usize,
    failed: Option<WalkFault>,
}

/// Completion state of a submitted batch.
pub enum BatchPoll {
    Done(Vec<WalkResult>),
    Failed(WalkFault),
    Pending,
}

#[derive(Default)]
struct Inner {
    workers: HashMap<String, WorkerEntry>,
    batches: HashMap<String, Batch>,
    /// Per-job shard queue, (batch_id, index). Work-conserving: any idle
    /// worker polling while this is non-empty gets a shard.
    queue: VecDeque<(String, usize)>,
}

pub struct AppState {
    inner: Mutex<Inner>,
    pub heartbeat_timeout: Duration,
    pub batch_timeout: Duration,
}

impl AppState {
    pub fn new(heartbeat_timeout: Duration, batch_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            heartbeat_timeout,
            batch_timeout,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Every mutation below is a single-field update; the registry
        // stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register_worker(&self, addr: &str, cores: u32) -> String {
        let worker_id = format!(
            "worker-{}",
            Uuid::new_v4().to_string().split('-').next().unwrap_or("0")
        );
        let mut inner = self.lock();
        inner.workers.insert(
            worker_id.clone(),
            WorkerEntry {
                addr: addr.to_string(),
                cores,
                status: WorkerStatus::Registering,
                last_seen: Instant::now(),
                assigned: None,
            },
        );
        worker_id
    }

    /// Refreshes a worker's liveness. Returns false for unknown ids so the
    /// worker knows to re-register.
    pub fn heartbeat(&self, worker_id: &str) -> bool {
        let mut inner = self.lock();
        match inner.workers.get_mut(worker_id) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                if entry.status == WorkerStatus::Registering {
                    entry.status = WorkerStatus::Idle;
                }
                true
            }
            None => false,
        }
    }

    pub fn unregister(&self, worker_id: &str) -> bool {
        let mut inner = self.lock();
        match inner.workers.remove(worker_id) {
            Some(entry) => {
                if let Some(shard) = entry.assigned {
                    inner.queue.push_front(shard);
                }
                true
            }
            None => false,
        }
    }

    /// Queues a batch, splitting it into per-job shards. Fails on a
    /// duplicate id: batch ids are content hashes, so a collision means
    /// the same batch was submitted twice concurrently.
    pub fn submit_batch(
        &self,
        batch_id: &str,
        spec: RunSpec,
        jobs: Vec<WalkJob>,
    ) -> Result<(), String> {
        let mut inner = self.lock();
        if inner.batches.contains_key(batch_id) {
            return Err(format!("batch {} is already in flight", batch_id));
        }
        let n = jobs.len();
        inner.batches.insert(
            batch_id.to_string(),
            Batch {
                spec,
                results: vec![None; n],
                remaining: n,
                failed: None,
                jobs,
            },
        );
        for index in 0..n {
            inner.queue.push_back((batch_id.to_string(), index));
        }
        Ok(())
    }

    /// Hands the next shard to a worker, or `None` when the queue is dry.
    /// Re-handing the worker's own in-flight shard is idempotent, which
    /// covers a worker that lost the previous response.
    pub fn try_next_shard(&self, worker_id: &str) -> Result<Option<Shard>, String> {
        let mut inner = self.lock();

        let assigned = match inner.workers.get_mut(worker_id) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                if entry.status == WorkerStatus::Registering {
                    entry.status = WorkerStatus::Idle;
                }
                entry.assigned.clone()
            }
            None => return Err(format!("unknown worker {}", worker_id)),
        };

        if let Some((batch_id, index)) = assigned {
            if let Some(shard) = Self::make_shard(&inner, &batch_id, index) {
                return Ok(Some(shard));
            }
            // The batch vanished under the worker (failed or timed out).
            if let Some(entry) = inner.workers.get_mut(worker_id) {
                entry.assigned = None;
                entry.status = WorkerStatus::Idle;
            }
        }

        loop {
            let Some((batch_id, index)) = inner.queue.pop_front() else {
                return Ok(None);
            };
            let Some(shard) = Self::make_shard(&inner, &batch_id, index) else {
                // Stale queue entry for a batch that already ended.
                continue;
            };
            if let Some(entry) = inner.workers.get_mut(worker_id) {
                entry.status = WorkerStatus::Busy;
                entry.assigned = Some((batch_id, index));
            }
            return Ok(Some(shard));
        }
    }

    fn make_shard(inner: &Inner, batch_id: &str, index: usize) -> Option<Shard> {
        let batch = inner.batches.get(batch_id)?;
        if batch.failed.is_some() || batch.results[index].is_some() {
            return None;
        }
        Some(Shard {
            batch_id: batch_id.to_string(),
            index,
            spec: batch.spec.clone(),
            job: batch.jobs[index].clone(),
        })
    }

    /// Records one shard outcome. Duplicate or orphaned results (batch
    /// already gone) are dropped silently; a failed walk poisons the
    /// whole batch.
    pub fn submit_shard_result(
        &self,
        worker_id: &str,
        batch_id: &str,
        index: usize,
        outcome: Result<WalkResult, WalkFault>,
    ) {
        let mut inner = self.lock();

        if let Some(entry) = inner.workers.get_mut(worker_id) {
            entry.last_seen = Instant::now();
            entry.status = WorkerStatus::Idle;
            entry.assigned = None;
        }

        let Some(batch) = inner.batches.get_mut(batch_id) else {
            return;
        };
        match outcome {
            Ok(result) => {
                if index < batch.results.len() && batch.results[index].is_none() {
                    batch.results[index] = Some(result);
                    batch.remaining -= 1;
                }
            }
            Err(fault) => {
                batch.failed.get_or_insert(fault);
            }
        }
    }

    /// Checks a batch for completion, consuming it when done or failed.
    /// Results come back in job order.
    pub fn poll_batch(&self, batch_id: &str) -> BatchPoll {
        let mut inner = self.lock();

        let consume = match inner.batches.get(batch_id) {
            Some(batch) if batch.failed.is_some() || batch.remaining == 0 => true,
            Some(_) => return BatchPoll::Pending,
            None => {
                return BatchPoll::Failed(WalkFault {
                    message: "batch is not in flight".to_string(),
                    x: Vec::new(),
                })
            }
        };

        if consume {
            let batch = inner
                .batches
                .remove(batch_id)
                .expect("batch checked under the same lock");
            inner.queue.retain(|(id, _)| id != batch_id);
            if let Some(fault) = batch.failed {
                return BatchPoll::Failed(fault);
            }
            let results = batch.results.into_iter().flatten().collect();
            return BatchPoll::Done(results);
        }
        BatchPoll::Pending
    }

    /// Drops a batch (client gave up or the wall-clock budget ran out)
    /// and purges its queued shards.
    pub fn fail_batch(&self, batch_id: &str) {
        let mut inner = self.lock();
        inner.batches.remove(batch_id);
        inner.queue.retain(|(id, _)| id != batch_id);
    }

    /// Sweeps out workers whose heartbeat lapsed. Their in-flight shards
    /// go back to the front of the queue for reissue. Returns the ids of
    /// the disconnected workers.
    pub fn reap(&self) -> Vec<String> {
        let mut inner = self.lock();
        let deadline = self.heartbeat_timeout;
        let dead: Vec<String> = inner
            .workers
            .iter()
            .filter(|(_, w)| w.last_seen.elapsed() > deadline)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &dead {
            if let Some(entry) = inner.workers.remove(id) {
                if let Some(shard) = entry.assigned {
                    inner.queue.push_front(shard);
                }
            }
        }
        dead
    }

    pub fn worker_list(&self) -> Vec<WorkerInfo> {
        let inner = self.lock();
        let mut list: Vec<WorkerInfo> = inner
            .workers
            .iter()
            .map(|(id, w)| WorkerInfo {
                worker_id: id.clone(),
                addr: w.addr.clone(),
                cores: w.cores,
                status: w.status.as_str().to_string(),
                assigned: w.assigned.as_ref().map(|(b, i)| format!("{}#{}", b, i)),
            })
            .collect();
        list.sort_by(|a, b| a.worker_id.cmp(&b.worker_id));
        list
    }
}
