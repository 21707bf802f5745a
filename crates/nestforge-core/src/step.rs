/// Trial-move kernel, `(x, stepsize) -> x'`.
///
/// Kernels must be symmetric: the walker's hard-wall acceptance assumes
/// detailed balance with no proposal-density correction.
pub trait StepKernel: Send + Sync {
    fn take_step(&self, x: &[f64], stepsize: f64, rng: &mut fastrand::Rng) -> Vec<f64>;
}

/// Componentwise uniform displacement, `x_i + U(-s, +s)`.
pub struct UniformStep;

impl StepKernel for UniformStep {
    fn take_step(&self, x: &[f64], stepsize: f64, rng: &mut fastrand::Rng) -> Vec<f64> {
        x.iter()
            .map(|c| c + (2.0 * rng.f64() - 1.0) * stepsize)
            .collect()
    }
}
