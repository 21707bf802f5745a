use crate::error::PotentialError;
use nestforge_protocol::PotentialSpec;
use std::sync::Arc;

/// A scalar energy function over the configuration space.
///
/// Implementations must be logically immutable: `energy` may be called
/// concurrently from every worker thread. A potential with mutable caches
/// must not implement this trait directly; give each worker its own
/// instance instead.
pub trait Potential: Send + Sync {
    fn ndof(&self) -> usize;

    /// Energy of configuration `x`. A non-finite value is treated as a
    /// fatal fault by the walker.
    fn energy(&self, x: &[f64]) -> Result<f64, PotentialError>;

    /// Draws a fresh configuration for live-set initialization.
    fn random_configuration(&self, rng: &mut fastrand::Rng) -> Vec<f64>;
}

/// Isotropic harmonic well, `E(x) = stiffness/2 * |x|^2`.
///
/// `random_configuration` samples uniformly from a ball of the given
/// radius, so an initial live set is uniform over the sampled volume.
pub struct HarmonicWell {
    ndof: usize,
    stiffness: f64,
    radius: f64,
}

impl HarmonicWell {
    pub fn new(ndof: usize, stiffness: f64, radius: f64) -> Self {
        Self {
            ndof,
            stiffness,
            radius,
        }
    }
}

impl Potential for HarmonicWell {
    fn ndof(&self) -> usize {
        self.ndof
    }

    fn energy(&self, x: &[f64]) -> Result<f64, PotentialError> {
        if x.len() != self.ndof {
            return Err(PotentialError::new(
                format!("expected {} coordinates, got {}", self.ndof, x.len()),
                x,
            ));
        }
        Ok(0.5 * self.stiffness * x.iter().map(|c| c * c).sum::<f64>())
    }

    fn random_configuration(&self, rng: &mut fastrand::Rng) -> Vec<f64> {
        sample_in_ball(self.ndof, self.radius, rng)
    }
}

/// Uniform sample from a ball: gaussian direction, radius scaled by
/// u^(1/ndof).
fn sample_in_ball(ndof: usize, radius: f64, rng: &mut fastrand::Rng) -> Vec<f64> {
    loop {
        let v: Vec<f64> = (0..ndof).map(|_| standard_normal(rng)).collect();
        let norm = v.iter().map(|c| c * c).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }
        let r = radius * rng.f64().powf(1.0 / ndof as f64);
        return v.iter().map(|c| c / norm * r).collect();
    }
}

/// Box-Muller on top of fastrand's uniform stream.
fn standard_normal(rng: &mut fastrand::Rng) -> f64 {
    let u1 = rng.f64().max(f64::MIN_POSITIVE);
    let u2 = rng.f64();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Materializes a declarative potential spec into a concrete instance.
/// Each call returns a fresh instance, so every worker owns its own.
pub fn build_potential(spec: &PotentialSpec) -> Arc<dyn Potential> {
    match *spec {
        PotentialSpec::Harmonic {
            ndof,
            stiffness,
            radius,
        } => Arc::new(HarmonicWell::new(ndof, stiffness, radius)),
    }
}
