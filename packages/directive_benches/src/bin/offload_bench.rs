//! Offload overhead: staging a buffer to a dedicated execution resource and
//! running a kernel over it, compared against the same kernel on the host
//! pool. The "device" is a separate thread pool; the construct shapes mirror
//! staged-accelerator execution, with the buffer either staged inside the
//! execution pass or ahead of it.

use std::hint::black_box;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::thread;

use directive_benches::{array_delay, banner};
use rayon::prelude::*;
use sweep_bench::{OffloadArgs, OffloadHooks, Session, SessionError, Trial, pool_for};

const FAMILY: &str = "OFFLOAD";

fn main() -> ExitCode {
    let args: OffloadArgs = argh::from_env();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: OffloadArgs) -> Result<(), SessionError> {
    let (params, options) = args.into_inputs()?;
    banner("offload_bench", options.quiet);

    let device = Arc::new(DeviceState::bring_up()?);
    let mut hooks = DeviceHooks {
        state: Arc::clone(&device),
    };

    let mut session = Session::new(params, options);
    if options.save_results {
        session.remove_prior_results(FAMILY)?;
    }

    let simultaneous = staged_simultaneous(Arc::clone(&device));
    let separate = staged_separate(Arc::clone(&device));
    let reference = host_reference(Arc::clone(&device));

    session.run_offload(
        FAMILY,
        "COPY_DATA_SIMULTANEOUS_EXEC",
        &mut hooks,
        &simultaneous,
        &reference,
    )?;
    session.run_offload(
        FAMILY,
        "COPY_DATA_SEPARATE_EXEC",
        &mut hooks,
        &separate,
        &reference,
    )?;

    Ok(())
}

/// The execution resource trials are offloaded to: a dedicated pool plus the
/// buffer staged to it.
struct DeviceState {
    pool: rayon::ThreadPool,
    buffer: Mutex<Vec<f32>>,
}

impl DeviceState {
    fn bring_up() -> Result<Self, SessionError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .thread_name(|index| format!("device-{index}"))
            .build()
            .map_err(|error| SessionError::DeviceUnreachable(error.to_string()))?;

        Ok(Self {
            pool,
            buffer: Mutex::new(Vec::new()),
        })
    }
}

struct DeviceHooks {
    state: Arc<DeviceState>,
}

impl OffloadHooks for DeviceHooks {
    fn probe(&mut self) -> Result<(), String> {
        let host = thread::current().id();
        let device = self.state.pool.install(|| thread::current().id());

        if host == device {
            return Err("device pool executed on the host thread".to_owned());
        }

        // The first dispatch to a fresh pool is disproportionately expensive;
        // absorb it here, outside any measurement window.
        self.state.pool.broadcast(|_| ());

        Ok(())
    }

    fn preprocessing(&mut self, trial: &Trial) {
        let size = usize::try_from(trial.array_size)
            .expect("staged array sizes fit in the host address space");

        let mut buffer = self
            .state
            .buffer
            .lock()
            .expect("no payload panics while holding the buffer");

        // Reallocate only when the staged size actually changes.
        if buffer.len() == size {
            buffer.fill(0.0);
        } else {
            *buffer = vec![0.0; size];
        }
    }

    fn postprocessing(&mut self) {
        let buffer = self
            .state
            .buffer
            .lock()
            .expect("no payload panics while holding the buffer");

        black_box(buffer.first().copied());
    }
}

/// Staging and execution share one device pass.
fn staged_simultaneous(state: Arc<DeviceState>) -> impl Fn(&Trial) {
    move |trial: &Trial| {
        let mut guard = state
            .buffer
            .lock()
            .expect("no payload panics while holding the buffer");
        let staged: &mut Vec<f32> = &mut guard;

        state.pool.install(|| {
            for _ in 0..trial.directive_repeats.get() {
                stage(staged);
                kernel(staged, trial, device_width(trial));
            }
        });
    }
}

/// The buffer is staged from the host first; the device pass only executes.
fn staged_separate(state: Arc<DeviceState>) -> impl Fn(&Trial) {
    move |trial: &Trial| {
        let mut guard = state
            .buffer
            .lock()
            .expect("no payload panics while holding the buffer");
        let staged: &mut Vec<f32> = &mut guard;

        for _ in 0..trial.directive_repeats.get() {
            stage(staged);

            state
                .pool
                .install(|| kernel(staged, trial, device_width(trial)));
        }
    }
}

/// The same staging and kernel on the host pool at the baseline thread count.
fn host_reference(state: Arc<DeviceState>) -> impl Fn(&Trial) {
    move |trial: &Trial| {
        let mut guard = state
            .buffer
            .lock()
            .expect("no payload panics while holding the buffer");
        let staged: &mut Vec<f32> = &mut guard;
        let pool = pool_for(trial.threads);

        pool.install(|| {
            for _ in 0..trial.directive_repeats.get() {
                stage(staged);
                kernel(staged, trial, u64::from(trial.threads.max(1)));
            }
        });
    }
}

/// The device's logical worker count for a trial.
fn device_width(trial: &Trial) -> u64 {
    u64::from(trial.teams.max(1)) * u64::from(trial.gpu_threads.max(1))
}

/// Writes the input values into the staged buffer.
fn stage(buffer: &mut [f32]) {
    for (i, slot) in buffer.iter_mut().enumerate() {
        *slot = i as f32;
    }
}

/// The offloaded computation: every logical worker sweeps its contiguous
/// share of the buffer for the configured iteration count.
fn kernel(buffer: &mut [f32], trial: &Trial, logical_workers: u64) {
    let workers = usize::try_from(logical_workers.max(1))
        .expect("logical worker counts fit in the host address space");
    let chunk = buffer.len().div_ceil(workers).max(1);

    buffer.par_chunks_mut(chunk).for_each(|share| {
        for _ in 0..trial.iterations {
            for (i, slot) in share.iter_mut().enumerate() {
                array_delay(i as u64, trial.workload, slot);
            }
        }
    });
}
