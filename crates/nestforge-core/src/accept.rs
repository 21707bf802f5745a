use nestforge_protocol::AcceptTestSpec;
use std::sync::Arc;

/// Auxiliary configuration test. Must be pure, cheap and total: a test
/// that panics is a walker bug, not a rejection.
pub trait AcceptTest: Send + Sync {
    fn accept(&self, x: &[f64]) -> bool;
}

/// Accept iff `max_i |x_i| < limit`.
pub struct MaxNormBound {
    pub limit: f64,
}

impl AcceptTest for MaxNormBound {
    fn accept(&self, x: &[f64]) -> bool {
        x.iter().all(|c| c.abs() < self.limit)
    }
}

pub fn build_accept_tests(specs: &[AcceptTestSpec]) -> Vec<Arc<dyn AcceptTest>> {
    specs
        .iter()
        .map(|spec| match *spec {
            AcceptTestSpec::MaxNorm { limit } => {
                Arc::new(MaxNormBound { limit }) as Arc<dyn AcceptTest>
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_norm_is_strict() {
        let t = MaxNormBound { limit: 1.0 };
        assert!(t.accept(&[0.99, -0.5]));
        assert!(!t.accept(&[1.0, 0.0]));
        assert!(!t.accept(&[0.0, -1.2]));
    }
}
