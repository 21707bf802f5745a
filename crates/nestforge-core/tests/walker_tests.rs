mod common;

use common::{harmonic, harmonic_walker};
use nestforge_core::accept::{AcceptTest, MaxNormBound};
use nestforge_core::events::WalkEvent;
use nestforge_core::step::UniformStep;
use nestforge_core::walker::Walker;
use nestforge_core::{NsError, Replica, WalkJob};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

fn job(seed: Replica, cutoff: f64, seed_rng: u64) -> WalkJob {
    WalkJob {
        seed,
        cutoff,
        stepsize: 0.3,
        seed_rng,
    }
}

#[test]
fn walk_performs_exactly_mciter_trials() {
    let walker = harmonic_walker(2, 137);
    let result = walker
        .walk(&job(Replica::new(vec![1.0, 1.0], 1.0), 5.0, 9))
        .unwrap();
    assert_eq!(result.trials(), 137);
    assert_eq!(
        result.n_reject,
        result.n_cutoff_reject + result.n_test_reject
    );
}

#[test]
fn walk_is_deterministic_for_a_fixed_seed() {
    let walker = harmonic_walker(3, 200);
    let j = job(Replica::new(vec![0.5, -0.5, 1.0], 0.75), 3.0, 4242);
    let a = walker.walk(&j).unwrap();
    let b = walker.walk(&j).unwrap();
    assert_eq!(a.replica, b.replica);
    assert_eq!(a.n_accept, b.n_accept);
    assert_eq!(a.n_cutoff_reject, b.n_cutoff_reject);
}

#[test]
fn accepted_walks_stay_below_the_cutoff() {
    let walker = harmonic_walker(2, 500);
    for seed_rng in 0..20 {
        let result = walker
            .walk(&job(Replica::new(vec![1.0, 0.0], 0.5), 2.0, seed_rng))
            .unwrap();
        if result.n_accept > 0 {
            assert!(
                result.replica.e < 2.0,
                "replica energy {} breached the cutoff",
                result.replica.e
            );
        }
    }
}

#[test]
fn fully_rejected_walk_returns_the_seed_unchanged() {
    // A cutoff below the whole landscape forces every trial through the
    // cutoff-reject path.
    let walker = harmonic_walker(2, 50);
    let seed = Replica::new(vec![2.0, -1.0], 2.5);
    let result = walker.walk(&job(seed.clone(), -1.0, 11)).unwrap();
    assert_eq!(result.replica, seed);
    assert_eq!(result.n_accept, 0);
    assert_eq!(result.n_cutoff_reject, 50);
    assert_eq!(result.n_test_reject, 0);
}

#[test]
fn impossible_accept_test_rejects_every_trial() {
    let walker = harmonic_walker(2, 50)
        .with_accept_tests(vec![Arc::new(MaxNormBound { limit: 0.0 })]);
    let seed = Replica::new(vec![0.1, 0.1], 0.01);
    let result = walker.walk(&job(seed.clone(), f64::INFINITY, 5)).unwrap();
    assert_eq!(result.replica, seed);
    assert_eq!(result.n_test_reject, 50);
    assert_eq!(result.n_cutoff_reject, 0);
}

#[test]
fn unconstrained_walk_reports_consistent_energy() {
    // With an infinite cutoff the returned energy must match a fresh
    // evaluation of the returned coordinates.
    let walker = harmonic_walker(3, 300);
    let result = walker
        .walk(&job(Replica::new(vec![1.0, 2.0, 3.0], 7.0), f64::INFINITY, 77))
        .unwrap();
    let fresh = harmonic(3).energy(&result.replica.x).unwrap();
    assert!((result.replica.e - fresh).abs() < 1e-12);
    assert_eq!(result.n_accept, 300);
}

#[test]
fn energy_test_short_circuits_before_accept_tests() {
    struct MustNotRun(Arc<AtomicBool>);
    impl AcceptTest for MustNotRun {
        fn accept(&self, _x: &[f64]) -> bool {
            self.0.store(true, Ordering::Relaxed);
            true
        }
    }

    let tripped = Arc::new(AtomicBool::new(false));
    let walker = harmonic_walker(2, 40)
        .with_accept_tests(vec![Arc::new(MustNotRun(tripped.clone()))]);
    // Cutoff below everything: the energy test fails first every time.
    walker
        .walk(&job(Replica::new(vec![1.0, 1.0], 1.0), -1.0, 3))
        .unwrap();
    assert!(!tripped.load(Ordering::Relaxed));
}

#[test]
fn events_observe_every_trial() {
    struct Counter(Arc<AtomicU64>);
    impl WalkEvent for Counter {
        fn on_trial(&self, _x: &[f64], _e: f64, _accepted: bool) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    let count = Arc::new(AtomicU64::new(0));
    let walker = harmonic_walker(1, 64).with_events(vec![Arc::new(Counter(count.clone()))]);
    walker
        .walk(&job(Replica::new(vec![0.5], 0.125), 10.0, 21))
        .unwrap();
    assert_eq!(count.load(Ordering::Relaxed), 64);
}

#[test]
fn failing_potential_is_fatal() {
    struct Broken;
    impl nestforge_core::potential::Potential for Broken {
        fn ndof(&self) -> usize {
            1
        }
        fn energy(&self, x: &[f64]) -> Result<f64, nestforge_core::PotentialError> {
            Err(nestforge_core::PotentialError::new("synthetic fault", x))
        }
        fn random_configuration(&self, _rng: &mut fastrand::Rng) -> Vec<f64> {
            vec![0.0]
        }
    }

    let walker = Walker::new(Arc::new(Broken), Arc::new(UniformStep), 10);
    let err = walker
        .walk(&job(Replica::new(vec![0.0], 0.0), 1.0, 1))
        .unwrap_err();
    assert!(matches!(err, NsError::Potential(_)));
    assert_eq!(err.exit_code(), 2);
}
