//! Scheduling overhead: the same distributed loop under different iteration
//! assignment policies, with chunk sizes doubling from 1 up to one thread's
//! fair share of the loop.

use std::process::ExitCode;

use directive_benches::{banner, delay};
use rayon::prelude::*;
use sweep_bench::{Session, SessionError, Trial, WorksharingArgs, pool_for};

const FAMILY: &str = "SCHEDULE";

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
    banner("schedule_bench", options.quiet);

    // Chunks larger than one thread's fair share of the smallest swept loop
    // would degenerate to a single assignment per thread.
    let per_thread = params.iterations.last() / u64::from(*params.threads.last());

    let mut session = Session::new(params, options);
    if options.save_results {
        session.remove_prior_results(FAMILY)?;
    }

    let mut chunk = 1_u64;
    while chunk <= per_thread.max(1) {
        let static_payload = make_static(chunk);
        session.run_worksharing(
            FAMILY,
            &format!("STATIC_{chunk}"),
            &static_payload,
            &reference,
        )?;

        let dynamic_payload = make_dynamic(chunk);
        session.run_worksharing(
            FAMILY,
            &format!("DYNAMIC_{chunk}"),
            &dynamic_payload,
            &reference,
        )?;

        chunk *= 2;
    }

    session.run_worksharing(FAMILY, "AUTO", &auto, &reference)?;

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

/// Static scheduling: chunks are assigned round-robin, so every worker's
/// share is decided before the loop starts.
fn make_static(chunk: u64) -> impl Fn(&Trial) {
    move |trial: &Trial| {
        let pool = pool_for(trial.threads);

        for _ in 0..trial.directive_repeats.get() {
            pool.install(|| {
                rayon::broadcast(|context| {
                    let stride = chunk * context.num_threads() as u64;
                    let mut start = context.index() as u64 * chunk;

                    while start < trial.iterations {
                        let end = (start + chunk).min(trial.iterations);
                        for i in start..end {
                            delay(i, trial.workload);
                        }
                        start += stride;
                    }
                });
            });
        }
    }
}

/// Dynamic scheduling: workers steal fixed-size chunks as they become free.
fn make_dynamic(chunk: u64) -> impl Fn(&Trial) {
    move |trial: &Trial| {
        let pool = pool_for(trial.threads);
        let chunk = usize::try_from(chunk).expect("chunk sizes are derived from loop sizes");
        let iterations =
            usize::try_from(trial.iterations).expect("loop sizes fit in the address space");

        for _ in 0..trial.directive_repeats.get() {
            pool.install(|| {
                (0..iterations)
                    .into_par_iter()
                    .with_min_len(chunk)
                    .with_max_len(chunk)
                    .for_each(|i| delay(i as u64, trial.workload));
            });
        }
    }
}

/// The scheduler picks the splitting granularity itself.
fn auto(trial: &Trial) {
    let pool = pool_for(trial.threads);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            (0..trial.iterations)
                .into_par_iter()
                .for_each(|i| delay(i, trial.workload));
        });
    }
}
