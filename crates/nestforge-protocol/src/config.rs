use clap::Args;
use serde::{Deserialize, Serialize};

/// Engine construction options. Doubles as the CLI surface (flattened into
/// the driver's arguments) and as a serializable config block.
#[derive(Args, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    #[arg(
        long,
        default_value_t = 1,
        help = "Worker threads in the local pool"
    )]
    pub nprocs: usize,

    #[arg(
        long,
        default_value_t = 0,
        help = "Replicas replaced per iteration (0 = same as --nprocs)"
    )]
    pub walkers: usize,

    #[arg(long, default_value_t = 0.1, help = "Initial trial step size")]
    pub stepsize: f64,

    #[arg(long, default_value_t = 1.0, help = "Upper bound for the adaptive step size")]
    pub max_stepsize: f64,

    #[arg(long, default_value_t = 0.0, help = "Lower bound for the adaptive step size")]
    pub stepsize_min: f64,

    #[arg(
        long = "nsteps",
        default_value_t = 100,
        help = "Trial moves per constrained walk"
    )]
    pub mciter: usize,

    #[arg(
        long,
        default_value_t = 1e-3,
        help = "Stop when the live-set energy spread falls below this"
    )]
    pub etol: f64,

    #[arg(long, default_value_t = 0, help = "Iteration cap (0 = unlimited)")]
    pub max_iter: u64,

    #[arg(
        long,
        default_value_t = 0.5,
        help = "Acceptance ratio the step-size adaptation steers toward"
    )]
    pub target_ratio: f64,

    #[arg(long, default_value_t = 42, help = "Master RNG seed")]
    pub seed: u64,

    #[arg(
        long,
        default_value_t = 0,
        help = "Transport retries before a remote batch is fatal"
    )]
    pub retry_max: u32,

    #[arg(
        long,
        default_value_t = 300,
        help = "Wall-clock budget per remote batch, in seconds"
    )]
    pub batch_timeout_secs: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            nprocs: 1,
            walkers: 0,
            stepsize: 0.1,
            max_stepsize: 1.0,
            stepsize_min: 0.0,
            mciter: 100,
            etol: 1e-3,
            max_iter: 0,
            target_ratio: 0.5,
            seed: 42,
            retry_max: 0,
            batch_timeout_secs: 300,
        }
    }
}

impl EngineParams {
    /// Number of replicas replaced (and walks dispatched) per iteration.
    pub fn replaced_per_iter(&self) -> usize {
        if self.walkers == 0 {
            self.nprocs
        } else {
            self.walkers
        }
    }

    /// Validates the option set against a live set of `n_replicas`.
    /// Returns a human-readable reason on failure; the engine wraps it
    /// into its configuration error kind.
    pub fn validate(&self, n_replicas: usize) -> Result<(), String> {
        if self.nprocs < 1 {
            return Err("nprocs must be at least 1".into());
        }
        let k = self.replaced_per_iter();
        if k < 1 || k >= n_replicas {
            return Err(format!(
                "walkers ({}) must satisfy 1 <= walkers < nreplicas ({})",
                k, n_replicas
            ));
        }
        // Seeds are drawn without replacement from the N-K survivors, so
        // there have to be at least K of them.
        if k > n_replicas - k {
            return Err(format!(
                "walkers ({}) must not exceed the surviving replicas ({})",
                k,
                n_replicas - k
            ));
        }
        if !(self.stepsize > 0.0) {
            return Err(format!("stepsize ({}) must be positive", self.stepsize));
        }
        if self.max_stepsize < self.stepsize {
            return Err(format!(
                "max-stepsize ({}) must be >= stepsize ({})",
                self.max_stepsize, self.stepsize
            ));
        }
        if self.stepsize_min < 0.0 || self.stepsize_min > self.stepsize {
            return Err(format!(
                "stepsize-min ({}) must lie in [0, stepsize]",
                self.stepsize_min
            ));
        }
        if self.mciter < 1 {
            return Err("nsteps must be at least 1".into());
        }
        if self.etol < 0.0 {
            return Err(format!("etol ({}) must be non-negative", self.etol));
        }
        if !(self.target_ratio > 0.0 && self.target_ratio < 1.0) {
            return Err(format!(
                "target-ratio ({}) must lie strictly inside (0, 1)",
                self.target_ratio
            ));
        }
        Ok(())
    }
}
