//! Synchronization overhead: mutual exclusion, atomics and thread
//! coordination primitives inside a distributed loop.

use std::hint::{black_box, spin_loop};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Barrier, Mutex};

use directive_benches::{banner, delay, delay_value};
use rayon::prelude::*;
use sweep_bench::{Session, SessionError, Trial, WorksharingArgs, pool_for};

const FAMILY: &str = "SYNC";

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
    banner("sync_bench", options.quiet);

    let mut session = Session::new(params, options);
    if options.save_results {
        session.remove_prior_results(FAMILY)?;
    }

    session.run_worksharing(FAMILY, "CRITICAL_SECTION", &critical_section, &reference)?;
    session.run_worksharing(FAMILY, "LOCK", &lock, &reference)?;
    session.run_worksharing(FAMILY, "ATOMIC", &atomic, &reference_atomic)?;
    session.run_worksharing(FAMILY, "MASTER", &master, &reference)?;
    session.run_worksharing(FAMILY, "BARRIER", &barrier, &reference)?;

    Ok(())
}

/// The serial loop most tests in this family are compared against.
fn reference(trial: &Trial) {
    for _ in 0..trial.directive_repeats.get() {
        for i in 0..trial.iterations {
            delay(i, trial.workload);
        }
    }
}

/// Serial counterpart of the atomic test: the same read-modify-write, just
/// without the hardware synchronization.
fn reference_atomic(trial: &Trial) {
    let mut counter = 0_u64;

    for _ in 0..trial.directive_repeats.get() {
        for i in 0..trial.iterations {
            delay(i, trial.workload);
            counter += 1;
        }
    }

    black_box(counter);
}

/// Every loop body serializes through one mutex.
fn critical_section(trial: &Trial) {
    let pool = pool_for(trial.threads);
    let shared = Mutex::new(0.0_f32);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            (0..trial.iterations).into_par_iter().for_each(|i| {
                let value = delay_value(i, trial.workload);
                *shared.lock().expect("no payload panics while holding the lock") += value;
            });
        });
    }

    black_box(shared);
}

/// Same serialization through a hand-held spin lock instead of a mutex. The
/// delay runs inside the held lock, as an explicit lock idiom would place it.
fn lock(trial: &Trial) {
    let pool = pool_for(trial.threads);
    let taken = AtomicBool::new(false);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            (0..trial.iterations).into_par_iter().for_each(|i| {
                while taken
                    .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                    .is_err()
                {
                    spin_loop();
                }
                delay(i, trial.workload);
                taken.store(false, Ordering::Release);
            });
        });
    }
}

/// One atomic read-modify-write per loop body.
fn atomic(trial: &Trial) {
    let pool = pool_for(trial.threads);
    let counter = AtomicU64::new(0);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            (0..trial.iterations).into_par_iter().for_each(|i| {
                delay(i, trial.workload);
                counter.fetch_add(1, Ordering::Relaxed);
            });
        });
    }

    black_box(counter.load(Ordering::Relaxed));
}

/// The whole team is dispatched but only one worker executes the loop.
fn master(trial: &Trial) {
    let pool = pool_for(trial.threads);

    for _ in 0..trial.directive_repeats.get() {
        pool.install(|| {
            rayon::broadcast(|context| {
                if context.index() == 0 {
                    for i in 0..trial.iterations {
                        delay(i, trial.workload);
                    }
                }
            });
        });
    }
}

/// Every worker executes its share and waits at a barrier per construct
/// execution.
fn barrier(trial: &Trial) {
    let pool = pool_for(trial.threads);
    let rendezvous = Barrier::new(pool.current_num_threads());

    pool.install(|| {
        rayon::broadcast(|context| {
            let workers = context.num_threads() as u64;

            for _ in 0..trial.directive_repeats.get() {
                let mut i = context.index() as u64;
                while i < trial.iterations {
                    delay(i, trial.workload);
                    i += workers;
                }

                rendezvous.wait();
            }
        });
    });
}
