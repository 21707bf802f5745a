use serde::{Deserialize, Serialize};

/// One sample of the configuration space: coordinates plus their energy.
///
/// A replica is immutable once constructed. Cloning produces a deep copy of
/// the coordinate vector, so replicas handed to workers never alias the
/// engine's live set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replica {
    /// Configuration coordinates, length `ndof`.
    pub x: Vec<f64>,
    /// Energy of `x` as reported by the potential at construction time.
    pub e: f64,
}

impl Replica {
    pub fn new(x: Vec<f64>, e: f64) -> Self {
        Self { x, e }
    }

    pub fn ndof(&self) -> usize {
        self.x.len()
    }
}
