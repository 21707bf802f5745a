use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn run(label: &Path, seed: &str) {
    let status = Command::new(env!("CARGO_BIN_EXE_nestforge"))
        .args([
            "run",
            "--label",
            label.to_str().unwrap(),
            "--nreplicas",
            "30",
            "--ndof",
            "2",
            "--nprocs",
            "2",
            "--nsteps",
            "40",
            "--etol",
            "0",
            "--max-iter",
            "60",
            "--seed",
            seed,
        ])
        .status()
        .expect("failed to spawn nestforge");
    assert!(status.success());
}

#[test]
fn identical_seeds_give_byte_identical_output() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("run_a");
    let b = dir.path().join("run_b");
    run(&a, "42");
    run(&b, "42");

    let trace_a = fs::read(a.with_extension("energies")).unwrap();
    let trace_b = fs::read(b.with_extension("energies")).unwrap();
    assert!(!trace_a.is_empty());
    assert_eq!(trace_a, trace_b);

    let final_a = fs::read(a.with_extension("replicas_final")).unwrap();
    let final_b = fs::read(b.with_extension("replicas_final")).unwrap();
    assert_eq!(final_a, final_b);
}

#[test]
fn different_seeds_give_different_output() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("seed_a");
    let b = dir.path().join("seed_b");
    run(&a, "42");
    run(&b, "1042");

    let trace_a = fs::read(a.with_extension("energies")).unwrap();
    let trace_b = fs::read(b.with_extension("energies")).unwrap();
    assert_ne!(trace_a, trace_b);
}
