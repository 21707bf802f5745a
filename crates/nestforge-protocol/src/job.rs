use crate::replica::Replica;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One constrained walk: evolve `seed` for a fixed number of trial moves
/// while staying strictly below `cutoff`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkJob {
    pub seed: Replica,
    pub cutoff: f64,
    pub stepsize: f64,
    /// RNG seed for this walk, derived from the engine's master RNG.
    /// Carrying the seed (rather than a generator) keeps the wire format
    /// plain data and makes results independent of shard assignment.
    pub seed_rng: u64,
}

/// Outcome of one walk: the evolved replica plus acceptance counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkResult {
    pub replica: Replica,
    pub n_accept: u64,
    pub n_reject: u64,
    pub n_cutoff_reject: u64,
    pub n_test_reject: u64,
}

impl WalkResult {
    /// Total trial moves performed.
    pub fn trials(&self) -> u64 {
        self.n_accept + self.n_reject
    }
}

/// Declarative description of a potential, materialized by whichever side
/// owns the walker. Nothing executable crosses the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PotentialSpec {
    Harmonic {
        ndof: usize,
        stiffness: f64,
        /// Radius of the ball `random_configuration` samples from.
        radius: f64,
    },
}

/// Declarative description of an auxiliary configuration test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcceptTestSpec {
    /// Accept iff the max-norm of the configuration is below `limit`.
    MaxNorm { limit: f64 },
}

/// Everything a remote worker needs to build its own walker for a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    pub mciter: usize,
    pub potential: PotentialSpec,
    #[serde(default)]
    pub accept_tests: Vec<AcceptTestSpec>,
}

/// Content-addressed batch identifier.
#[derive(Debug, Clone)]
pub struct BatchId {
    pub hash: String,
}

impl BatchId {
    pub fn from_parts(spec: &RunSpec, jobs: &[WalkJob]) -> Self {
        let mut hasher = Sha256::new();

        let spec_json = serde_json::to_string(spec).unwrap_or_default();
        hasher.update(spec_json.as_bytes());

        for job in jobs {
            hasher.update(job.seed_rng.to_le_bytes());
            hasher.update(job.cutoff.to_le_bytes());
            hasher.update(job.stepsize.to_le_bytes());
            for c in &job.seed.x {
                hasher.update(c.to_le_bytes());
            }
        }

        Self {
            hash: hex::encode(hasher.finalize()),
        }
    }
}
