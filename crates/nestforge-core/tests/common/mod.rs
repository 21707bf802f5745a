#![allow(dead_code)]

use nestforge_core::potential::{HarmonicWell, Potential};
use nestforge_core::step::UniformStep;
use nestforge_core::walker::Walker;
use nestforge_core::Replica;
use std::sync::Arc;

pub fn harmonic(ndof: usize) -> Arc<dyn Potential> {
    Arc::new(HarmonicWell::new(ndof, 1.0, 10.0))
}

pub fn harmonic_walker(ndof: usize, mciter: usize) -> Walker {
    Walker::new(harmonic(ndof), Arc::new(UniformStep), mciter)
}

/// Live set drawn uniformly from the initialization ball.
pub fn harmonic_live(n: usize, ndof: usize, seed: u64) -> Vec<Replica> {
    let pot = harmonic(ndof);
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..n)
        .map(|_| {
            let x = pot.random_configuration(&mut rng);
            let e = pot.energy(&x).expect("harmonic energy is total");
            Replica::new(x, e)
        })
        .collect()
}
