use crate::accept::{build_accept_tests, AcceptTest};
use crate::error::{NsResult, PotentialError};
use crate::events::WalkEvent;
use crate::potential::{build_potential, Potential};
use crate::step::{StepKernel, UniformStep};
use nestforge_protocol::{Replica, RunSpec, WalkJob, WalkResult};
use std::sync::Arc;

/// Rejection-based random walk under an upper-energy cutoff.
///
/// One walker instance serves every thread of a local pool; all shared
/// state is immutable and each walk owns its RNG, seeded from the job.
pub struct Walker {
    potential: Arc<dyn Potential>,
    kernel: Arc<dyn StepKernel>,
    tests: Vec<Arc<dyn AcceptTest>>,
    events: Vec<Arc<dyn WalkEvent>>,
    mciter: usize,
}

impl Walker {
    pub fn new(potential: Arc<dyn Potential>, kernel: Arc<dyn StepKernel>, mciter: usize) -> Self {
        Self {
            potential,
            kernel,
            tests: Vec::new(),
            events: Vec::new(),
            mciter,
        }
    }

    /// Builds a walker from a declarative run spec. This is what a remote
    /// worker does with an incoming batch: it materializes its own
    /// potential and tests rather than receiving anything executable.
    pub fn from_spec(spec: &RunSpec) -> Self {
        Self {
            potential: build_potential(&spec.potential),
            kernel: Arc::new(UniformStep),
            tests: build_accept_tests(&spec.accept_tests),
            events: Vec::new(),
            mciter: spec.mciter,
        }
    }

    pub fn with_accept_tests(mut self, tests: Vec<Arc<dyn AcceptTest>>) -> Self {
        self.tests = tests;
        self
    }

    pub fn with_events(mut self, events: Vec<Arc<dyn WalkEvent>>) -> Self {
        self.events = events;
        self
    }

    pub fn potential(&self) -> &Arc<dyn Potential> {
        &self.potential
    }

    pub fn mciter(&self) -> usize {
        self.mciter
    }

    /// Runs exactly `mciter` trial moves from the job's seed.
    ///
    /// Each trial: propose, evaluate, test against the energy cutoff, then
    /// against the configuration tests, in that order and short-circuited.
    /// If no trial is ever accepted the seed itself comes back unchanged;
    /// it already satisfied the constraint.
    pub fn walk(&self, job: &WalkJob) -> NsResult<WalkResult> {
        let mut rng = fastrand::Rng::with_seed(job.seed_rng);
        let mut x = job.seed.x.clone();
        let mut e = job.seed.e;

        let mut n_accept = 0u64;
        let mut n_cutoff_reject = 0u64;
        let mut n_test_reject = 0u64;

        for _ in 0..self.mciter {
            let x_trial = self.kernel.take_step(&x, job.stepsize, &mut rng);
            let e_trial = self.potential.energy(&x_trial)?;
            if !e_trial.is_finite() {
                return Err(PotentialError::new("non-finite energy", &x_trial).into());
            }

            let accepted = if e_trial >= job.cutoff {
                n_cutoff_reject += 1;
                false
            } else if !self.tests.iter().all(|t| t.accept(&x_trial)) {
                n_test_reject += 1;
                false
            } else {
                true
            };

            if accepted {
                x = x_trial;
                e = e_trial;
                n_accept += 1;
            }

            for event in &self.events {
                event.on_trial(&x, e, accepted);
            }
        }

        Ok(WalkResult {
            replica: Replica::new(x, e),
            n_accept,
            n_reject: n_cutoff_reject + n_test_reject,
            n_cutoff_reject,
            n_test_reject,
        })
    }
}
