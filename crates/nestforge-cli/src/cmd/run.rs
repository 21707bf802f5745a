use crate::sinks::EnergySink;
use clap::Args;
use nestforge_core::accept::{AcceptTest, MaxNormBound};
use nestforge_core::dispatch::{LocalPool, RemotePool, WalkDispatcher};
use nestforge_core::engine::{IterationReport, NestedSampler, ProgressCallback, StopReason};
use nestforge_core::potential::{HarmonicWell, Potential};
use nestforge_core::protocol::{AcceptTestSpec, PotentialSpec, RunSpec};
use nestforge_core::step::UniformStep;
use nestforge_core::walker::Walker;
use nestforge_core::{EngineParams, NsError, NsResult, Replica};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Output prefix: writes <label>.energies and <label>.replicas_final
    #[arg(long, default_value = "nested")]
    pub label: String,

    #[arg(long, default_value_t = 100, help = "Size of the live set")]
    pub nreplicas: usize,

    #[arg(long, default_value_t = 1, help = "Degrees of freedom")]
    pub ndof: usize,

    #[arg(long, default_value_t = 1.0, help = "Stiffness of the harmonic well")]
    pub stiffness: f64,

    #[arg(
        long,
        default_value_t = 10.0,
        help = "Radius of the initialization ball"
    )]
    pub radius: f64,

    /// Max-norm bound enforced as an auxiliary accept test
    #[arg(long)]
    pub bound: Option<f64>,

    #[command(flatten)]
    pub params: EngineParams,

    /// Dispatcher endpoint; switches walks to the remote pool
    #[arg(long, conflicts_with = "dispatcher_endpoint_file")]
    pub dispatcher_endpoint: Option<String>,

    /// File holding the dispatcher endpoint (as written by the hive)
    #[arg(long)]
    pub dispatcher_endpoint_file: Option<PathBuf>,
}

struct CliLogger;

impl ProgressCallback for CliLogger {
    fn on_iteration(&self, report: &IterationReport) -> bool {
        if report.iter == 1 || report.iter % 100 == 0 {
            info!(
                "it {:6} | E_cut {:12.6} | acc {:.2} | step {:.4} | spread {:.3e}",
                report.iter, report.e_cut, report.accept_ratio, report.stepsize, report.spread
            );
        }
        true
    }
}

pub fn run(args: RunArgs) -> NsResult<()> {
    let params = args.params;

    let potential: Arc<dyn Potential> = Arc::new(HarmonicWell::new(
        args.ndof,
        args.stiffness,
        args.radius,
    ));

    // Initialization draws come from their own stream so they never
    // overlap the engine's job-seed derivation.
    let mut init_rng = fastrand::Rng::with_seed(params.seed.wrapping_add(9999));
    let mut replicas = Vec::with_capacity(args.nreplicas);
    for _ in 0..args.nreplicas {
        let x = potential.random_configuration(&mut init_rng);
        let e = potential.energy(&x)?;
        replicas.push(Replica::new(x, e));
    }

    let accept_specs: Vec<AcceptTestSpec> = args
        .bound
        .map(|limit| vec![AcceptTestSpec::MaxNorm { limit }])
        .unwrap_or_default();
    let tests: Vec<Arc<dyn AcceptTest>> = args
        .bound
        .map(|limit| vec![Arc::new(MaxNormBound { limit }) as Arc<dyn AcceptTest>])
        .unwrap_or_default();

    let dispatcher: Box<dyn WalkDispatcher> = match resolve_endpoint(&args)? {
        Some(endpoint) => {
            info!("🌐 dispatching walks to {}", endpoint);
            let spec = RunSpec {
                mciter: params.mciter,
                potential: PotentialSpec::Harmonic {
                    ndof: args.ndof,
                    stiffness: args.stiffness,
                    radius: args.radius,
                },
                accept_tests: accept_specs,
            };
            Box::new(RemotePool::new(
                endpoint,
                spec,
                params.retry_max,
                Duration::from_secs(params.batch_timeout_secs),
            )?)
        }
        None => {
            info!("🧵 local pool, {} threads", params.nprocs);
            let walker = Arc::new(
                Walker::new(potential.clone(), Arc::new(UniformStep), params.mciter)
                    .with_accept_tests(tests),
            );
            Box::new(LocalPool::new(walker, params.nprocs)?)
        }
    };

    let mut engine = NestedSampler::new(replicas, params)?;
    let mut sink = EnergySink::create(&args.label)?;

    info!(
        "🚀 nested sampling: N={} K={} ndof={} mciter={}",
        args.nreplicas,
        params.replaced_per_iter(),
        args.ndof,
        params.mciter
    );

    let summary = engine.run(dispatcher.as_ref(), &mut sink, &CliLogger)?;

    let reason = match summary.stop {
        StopReason::Converged => "converged",
        StopReason::MaxIter => "iteration cap",
        StopReason::Cancelled => "cancelled",
    };
    info!(
        "🏁 stopped after {} iterations ({} NS steps): {}",
        summary.iterations, summary.ns_steps, reason
    );
    if let (Some(lo), Some(hi)) = (
        summary.final_energies.first(),
        summary.final_energies.last(),
    ) {
        info!("   live set: E_min {:.6} | E_max {:.6}", lo, hi);
    }

    Ok(())
}

fn resolve_endpoint(args: &RunArgs) -> NsResult<Option<String>> {
    if let Some(endpoint) = &args.dispatcher_endpoint {
        return Ok(Some(endpoint.clone()));
    }
    if let Some(path) = &args.dispatcher_endpoint_file {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            NsError::Config(format!("cannot read endpoint file {:?}: {}", path, e))
        })?;
        let endpoint = raw.trim().to_string();
        if endpoint.is_empty() {
            return Err(NsError::Config(format!("endpoint file {:?} is empty", path)));
        }
        return Ok(Some(endpoint));
    }
    Ok(None)
}
