//! Tasking overhead: spawning one task per unit of work into a scope,
//! compared against running the same work inline.

use std::hint::black_box;
use std::process::ExitCode;

use directive_benches::{banner, delay};
use sweep_bench::{Session, SessionError, Trial, WorksharingArgs, pool_for};

const FAMILY: &str = "TASK";

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
    banner("task_bench", options.quiet);

    let mut session = Session::new(params, options);
    if options.save_results {
        session.remove_prior_results(FAMILY)?;
    }

    session.run_worksharing(FAMILY, "TASK", &task, &reference)?;
    session.run_worksharing(FAMILY, "TASK_WAIT", &task_wait, &reference)?;
    session.run_worksharing(FAMILY, "CONDITIONAL_TRUE", &conditional_true, &reference)?;
    session.run_worksharing(FAMILY, "CONDITIONAL_FALSE", &conditional_false, &reference)?;

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

/// One spawned task per unit of work, joined at scope exit.
fn task(trial: &Trial) {
    let pool = pool_for(trial.threads);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            rayon::scope(|scope| {
                for i in 0..trial.iterations {
                    scope.spawn(move |_| delay(i, trial.workload));
                }
            });
        });
    }
}

/// One spawned task per unit of work, joined immediately: the scope closes
/// after every spawn instead of once at the end.
fn task_wait(trial: &Trial) {
    let pool = pool_for(trial.threads);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            for i in 0..trial.iterations {
                rayon::scope(|scope| {
                    scope.spawn(move |_| delay(i, trial.workload));
                });
            }
        });
    }
}

/// The spawn decision is behind a predicate the optimizer cannot resolve;
/// here it always spawns.
fn conditional_true(trial: &Trial) {
    let pool = pool_for(trial.threads);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            rayon::scope(|scope| {
                for i in 0..trial.iterations {
                    if black_box(true) {
                        scope.spawn(move |_| delay(i, trial.workload));
                    } else {
                        delay(i, trial.workload);
                    }
                }
            });
        });
    }
}

/// Same predicate shape, but it always falls through to inline execution:
/// the cost of carrying the tasking machinery without using it.
fn conditional_false(trial: &Trial) {
    let pool = pool_for(trial.threads);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            rayon::scope(|scope| {
                for i in 0..trial.iterations {
                    if black_box(false) {
                        scope.spawn(move |_| delay(i, trial.workload));
                    } else {
                        delay(i, trial.workload);
                    }
                }
            });
        });
    }
}
