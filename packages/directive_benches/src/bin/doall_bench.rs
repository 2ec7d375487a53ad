//! Work-sharing loop overhead: the cost of distributing a fixed loop across a
//! thread pool, compared against running the same loop serially.

use std::hint::black_box;
use std::process::ExitCode;

use directive_benches::{banner, delay};
use rayon::prelude::*;
use sweep_bench::{Session, SessionError, Trial, WorksharingArgs, pool_for};

const FAMILY: &str = "DOALL";

fn main() -> ExitCode {
    let args: WorksharingArgs = argh::from_env();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: WorksharingArgs) -> Result<(), SessionError> {
    let (params, options) = args.into_inputs()?;
    banner("doall_bench", options.quiet);

    let mut session = Session::new(params, options);
    if options.save_results {
        session.remove_prior_results(FAMILY)?;
    }

    session.run_worksharing(FAMILY, "DOALL", &doall, &reference)?;
    session.run_worksharing(FAMILY, "SEPARATED", &separated, &reference)?;
    session.run_worksharing(FAMILY, "FIRSTPRIVATE", &firstprivate, &reference)?;
    session.run_worksharing(FAMILY, "PRIVATE", &private, &reference)?;

    Ok(())
}

/// The serial loop every test in this family is compared against.
fn reference(trial: &Trial) {
    for _ in 0..trial.directive_repeats.get() {
        for i in 0..trial.iterations {
            delay(i, trial.workload);
        }
    }
}

/// One pool dispatch per construct execution.
fn doall(trial: &Trial) {
    let pool = pool_for(trial.threads);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            (0..trial.iterations)
                .into_par_iter()
                .for_each(|i| delay(i, trial.workload));
        });
    }
}

/// The pool is entered once; only the loop distribution repeats inside it.
/// Isolates the distribution cost from the dispatch cost.
fn separated(trial: &Trial) {
    let pool = pool_for(trial.threads);

    pool.install(|| {
        for _ in 0..trial.directive_repeats.get() {
            (0..trial.iterations)
                .into_par_iter()
                .for_each(|i| delay(i, trial.workload));
        }
    });
}

/// Every loop body starts from a copied-in value.
fn firstprivate(trial: &Trial) {
    let pool = pool_for(trial.threads);
    let seed = black_box(1.0_f32);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            (0..trial.iterations).into_par_iter().for_each(|i| {
                let mut local = seed;
                for _ in 0..trial.workload {
                    local += i as f32;
                }
                black_box(local);
            });
        });
    }
}

/// Every splitting unit starts from a fresh uninitialized local.
fn private(trial: &Trial) {
    let pool = pool_for(trial.threads);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            (0..trial.iterations).into_par_iter().for_each_init(
                || 0.0_f32,
                |local, i| {
                    for _ in 0..trial.workload {
                        *local += i as f32;
                    }
                    black_box(*local);
                },
            );
        });
    }
}
