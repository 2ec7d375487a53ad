//! Reduction overhead: combining per-iteration values across a distributed
//! loop, compared against a serial fold.

use std::hint::black_box;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};

use directive_benches::{banner, delay_value};
use rayon::prelude::*;
use sweep_bench::{Session, SessionError, Trial, WorksharingArgs, pool_for};

const FAMILY: &str = "REDUCTION";

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
    banner("reduction_bench", options.quiet);

    let mut session = Session::new(params, options);
    if options.save_results {
        session.remove_prior_results(FAMILY)?;
    }

    session.run_worksharing(FAMILY, "REDUCTION", &reduction, &reference)?;
    session.run_worksharing(FAMILY, "ATOMIC", &atomic_reduction, &reference)?;

    Ok(())
}

/// Serial fold over the same values the test combines in parallel.
fn reference(trial: &Trial) {
    for _ in 0..trial.directive_repeats.get() {
        let mut total = 0.0_f32;
        for i in 0..trial.iterations {
            total += delay_value(i, trial.workload);
        }
        black_box(total);
    }
}

/// Parallel sum: each worker folds its share, partial results combine at the
/// join.
fn reduction(trial: &Trial) {
    let pool = pool_for(trial.threads);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            let total: f32 = (0..trial.iterations)
                .into_par_iter()
                .map(|i| delay_value(i, trial.workload))
                .sum();
            black_box(total);
        });
    }
}

/// Every iteration combines into one shared accumulator with an atomic
/// read-modify-write instead of per-worker partials.
fn atomic_reduction(trial: &Trial) {
    let pool = pool_for(trial.threads);
    let total = AtomicU64::new(0);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            (0..trial.iterations).into_par_iter().for_each(|i| {
                let value = delay_value(i, trial.workload) as u64;
                total.fetch_add(value, Ordering::Relaxed);
            });
        });
    }

    black_box(total.load(Ordering::Relaxed));
}
