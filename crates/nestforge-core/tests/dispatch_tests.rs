mod common;

use common::harmonic_walker;
use nestforge_core::dispatch::{LocalPool, RemotePool, WalkDispatcher};
use nestforge_core::potential::Potential;
use nestforge_core::step::UniformStep;
use nestforge_core::walker::Walker;
use nestforge_core::{NsError, PotentialError, Replica, WalkJob};
use nestforge_core::protocol::{PotentialSpec, RunSpec};
use std::sync::Arc;
use std::time::Duration;

fn jobs(n: usize, cutoff: f64) -> Vec<WalkJob> {
    (0..n)
        .map(|i| WalkJob {
            seed: Replica::new(vec![i as f64 * 0.1, 0.0], 0.005 * (i * i) as f64),
            cutoff,
            stepsize: 0.2,
            seed_rng: 1000 + i as u64,
        })
        .collect()
}

#[test]
fn results_come_back_in_job_order() {
    // A cutoff below the landscape freezes every walk on its seed, so the
    // returned energies must be exactly the submitted ones, in order.
    let pool = LocalPool::new(Arc::new(harmonic_walker(2, 20)), 4).unwrap();
    let batch = jobs(32, -1.0);
    let results = pool.run_batch(&batch).unwrap();
    assert_eq!(results.len(), 32);
    for (job, result) in batch.iter().zip(&results) {
        assert_eq!(result.replica, job.seed);
    }
}

#[test]
fn pool_size_does_not_affect_results() {
    let batch = jobs(16, 5.0);
    let serial = LocalPool::new(Arc::new(harmonic_walker(2, 50)), 1)
        .unwrap()
        .run_batch(&batch)
        .unwrap();
    let parallel = LocalPool::new(Arc::new(harmonic_walker(2, 50)), 4)
        .unwrap()
        .run_batch(&batch)
        .unwrap();
    for (a, b) in serial.iter().zip(&parallel) {
        assert_eq!(a.replica, b.replica);
        assert_eq!(a.n_accept, b.n_accept);
    }
}

#[test]
fn one_failing_job_fails_the_batch() {
    struct FailAbove {
        limit: f64,
    }
    impl Potential for FailAbove {
        fn ndof(&self) -> usize {
            2
        }
        fn energy(&self, x: &[f64]) -> Result<f64, PotentialError> {
            let e = 0.5 * x.iter().map(|c| c * c).sum::<f64>();
            if e > self.limit {
                return Err(PotentialError::new("region is undefined", x));
            }
            Ok(e)
        }
        fn random_configuration(&self, _rng: &mut fastrand::Rng) -> Vec<f64> {
            vec![0.0, 0.0]
        }
    }

    // One seed sits so deep in the failure region that its very first
    // trial evaluation must fault.
    let walker = Walker::new(
        Arc::new(FailAbove { limit: 0.5 }),
        Arc::new(UniformStep),
        100,
    );
    let pool = LocalPool::new(Arc::new(walker), 2).unwrap();
    let mut batch = jobs(4, 10.0);
    batch[2].seed = Replica::new(vec![1.5, 0.0], 1.125);
    let err = pool.run_batch(&batch).unwrap_err();
    assert!(matches!(err, NsError::Potential(_)));
}

#[test]
fn walker_from_spec_matches_a_hand_built_walker() {
    // A remote worker materializes its walker from the wire spec; both
    // sides must agree walk-for-walk or remote runs would diverge from
    // local ones.
    let spec = RunSpec {
        mciter: 80,
        potential: PotentialSpec::Harmonic {
            ndof: 2,
            stiffness: 1.0,
            radius: 10.0,
        },
        accept_tests: vec![],
    };
    let from_spec = Walker::from_spec(&spec);
    let by_hand = harmonic_walker(2, 80);

    for job in jobs(8, 3.0) {
        let a = from_spec.walk(&job).unwrap();
        let b = by_hand.walk(&job).unwrap();
        assert_eq!(a.replica, b.replica);
        assert_eq!(a.n_accept, b.n_accept);
        assert_eq!(a.n_cutoff_reject, b.n_cutoff_reject);
    }
}

#[test]
fn unreachable_dispatcher_surfaces_a_transport_error() {
    let spec = RunSpec {
        mciter: 10,
        potential: PotentialSpec::Harmonic {
            ndof: 2,
            stiffness: 1.0,
            radius: 10.0,
        },
        accept_tests: vec![],
    };
    // Nothing listens on the discard port; the connection is refused.
    let pool = RemotePool::new(
        "http://127.0.0.1:9",
        spec,
        1,
        Duration::from_secs(2),
    )
    .unwrap();
    let err = pool.run_batch(&jobs(2, 5.0)).unwrap_err();
    assert!(matches!(err, NsError::Transport(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn empty_endpoint_is_a_configuration_error() {
    let spec = RunSpec {
        mciter: 10,
        potential: PotentialSpec::Harmonic {
            ndof: 1,
            stiffness: 1.0,
            radius: 1.0,
        },
        accept_tests: vec![],
    };
    let err = RemotePool::new("", spec, 0, Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, NsError::Config(_)));
}
