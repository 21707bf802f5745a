use crate::dispatch::WalkDispatcher;
use crate::error::{NsError, NsResult};
use crate::trace::TraceSink;
use nestforge_protocol::{EngineParams, Replica, WalkJob};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Multiplier sensitivity of the step-size adaptation. The update rule is
/// `stepsize *= exp(ALPHA * (ratio - target_ratio))`, which is monotone,
/// continuous and the identity at the target ratio.
const STEP_ALPHA: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Live-set energy spread fell below `etol`.
    Converged,
    /// Iteration cap reached.
    MaxIter,
    /// Cooperative cancellation, via the flag or the progress callback.
    Cancelled,
}

/// What one NS iteration produced.
#[derive(Debug, Clone)]
pub struct IterationReport {
    pub iter: u64,
    pub e_cut: f64,
    /// The K discarded energies, ascending.
    pub discarded: Vec<f64>,
    pub accept_ratio: f64,
    pub stepsize: f64,
    /// Live-set spread after replacement.
    pub spread: f64,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub iterations: u64,
    /// Total discarded energies (one per NS step).
    pub ns_steps: u64,
    pub stop: StopReason,
    /// Final live-set energies, sorted ascending.
    pub final_energies: Vec<f64>,
}

/// Per-iteration observer of a run. Return `false` to stop cleanly.
pub trait ProgressCallback: Send + Sync {
    fn on_iteration(&self, report: &IterationReport) -> bool;
}

/// Callback that never interrupts.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn on_iteration(&self, _report: &IterationReport) -> bool {
        true
    }
}

/// The nested-sampling iteration engine.
///
/// Owns the live set exclusively; workers only ever see owning copies of
/// seed replicas. The engine itself is single-threaded and synchronizes
/// with walkers at exactly one point per iteration, the batch join.
#[derive(Debug)]
pub struct NestedSampler {
    params: EngineParams,
    live: Vec<Replica>,
    stepsize: f64,
    rng: fastrand::Rng,
    iter: u64,
    cancel: Arc<AtomicBool>,
}

impl NestedSampler {
    /// Validates the parameter set against the initial live set. This is
    /// the only constructor-time failure path; everything later is a
    /// fallible run result.
    pub fn new(replicas: Vec<Replica>, params: EngineParams) -> NsResult<Self> {
        params
            .validate(replicas.len())
            .map_err(NsError::Config)?;
        for r in &replicas {
            if !r.e.is_finite() {
                return Err(NsError::Config(format!(
                    "initial replica has non-finite energy {}",
                    r.e
                )));
            }
        }

        Ok(Self {
            stepsize: params.stepsize,
            rng: fastrand::Rng::with_seed(params.seed),
            live: replicas,
            params,
            iter: 0,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle for signalling cooperative cancellation. Checked at
    /// iteration boundaries; an in-flight batch runs to completion.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn live(&self) -> &[Replica] {
        &self.live
    }

    pub fn stepsize(&self) -> f64 {
        self.stepsize
    }

    pub fn iterations(&self) -> u64 {
        self.iter
    }

    /// Current `E_max - E_min` over the live set.
    pub fn spread(&self) -> f64 {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for r in &self.live {
            min = min.min(r.e);
            max = max.max(r.e);
        }
        max - min
    }

    /// Runs one NS iteration: remove the K highest replicas, replace them
    /// with constrained walks seeded from surviving replicas, adapt the
    /// step size.
    pub fn step(&mut self, dispatcher: &dyn WalkDispatcher) -> NsResult<IterationReport> {
        let n = self.live.len();
        let k = self.params.replaced_per_iter();

        self.live.sort_by(|a, b| a.e.total_cmp(&b.e));
        let e_cut = self.live[n - k].e;
        let discarded: Vec<f64> = self.live[n - k..].iter().map(|r| r.e).collect();

        // Seeds drawn uniformly without replacement from the survivors,
        // so each surviving replica is cloned at most once per iteration.
        let mut survivor_idx: Vec<usize> = (0..n - k).collect();
        self.rng.shuffle(&mut survivor_idx);

        let jobs: Vec<WalkJob> = survivor_idx[..k]
            .iter()
            .map(|&i| WalkJob {
                seed: self.live[i].clone(),
                cutoff: e_cut,
                stepsize: self.stepsize,
                seed_rng: self.rng.u64(..),
            })
            .collect();

        let results = dispatcher.run_batch(&jobs)?;

        let mut acc = 0u64;
        let mut trl = 0u64;
        for (slot, (job, result)) in (n - k..n).zip(jobs.iter().zip(results)) {
            let replica = result.replica;
            // A result at or above the cutoff is only legitimate when the
            // walk never moved off its seed.
            if !(replica.e < e_cut) && replica.e != job.seed.e {
                return Err(NsError::InvariantViolation {
                    returned: replica.e,
                    cutoff: e_cut,
                });
            }
            acc += result.n_accept;
            trl += result.n_accept + result.n_reject;
            self.live[slot] = replica;
        }

        let accept_ratio = if trl > 0 { acc as f64 / trl as f64 } else { 0.0 };
        self.stepsize = (self.stepsize
            * (STEP_ALPHA * (accept_ratio - self.params.target_ratio)).exp())
        .clamp(self.params.stepsize_min, self.params.max_stepsize);

        self.iter += 1;

        Ok(IterationReport {
            iter: self.iter,
            e_cut,
            discarded,
            accept_ratio,
            stepsize: self.stepsize,
            spread: self.spread(),
        })
    }

    /// Iterates to termination, feeding each iteration's discarded
    /// energies to the sink (flushed there, so a crash leaves a valid
    /// prefix) and the report to the progress callback.
    pub fn run(
        &mut self,
        dispatcher: &dyn WalkDispatcher,
        sink: &mut dyn TraceSink,
        progress: &dyn ProgressCallback,
    ) -> NsResult<RunSummary> {
        let k = self.params.replaced_per_iter() as u64;
        let mut ns_steps = 0u64;

        let stop = loop {
            if self.cancel.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }
            if self.params.max_iter > 0 && self.iter >= self.params.max_iter {
                break StopReason::MaxIter;
            }
            if self.spread() < self.params.etol {
                break StopReason::Converged;
            }

            let report = self.step(dispatcher)?;
            sink.on_iteration(&report.discarded)?;
            ns_steps += k;

            if !progress.on_iteration(&report) {
                break StopReason::Cancelled;
            }
        };

        let mut final_energies: Vec<f64> = self.live.iter().map(|r| r.e).collect();
        final_energies.sort_by(f64::total_cmp);
        sink.on_final(&final_energies)?;

        Ok(RunSummary {
            iterations: self.iter,
            ns_steps,
            stop,
            final_energies,
        })
    }
}
