//! Executes one payload repeatedly under a single configuration, timing each
//! execution.

use std::time::Instant;

use crate::{Payload, Timestamp, Trial, pool};

/// Modes applied by [`run_trial`] to every sample it collects.
#[derive(Clone, Copy, Debug, Default)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain flag set, constructed with struct update syntax"
)]
pub struct RunnerOptions {
    /// Rescale every sample to the EPCC per-thread convention,
    /// `elapsed * threads / iterations`, instead of reporting the
    /// directive-normalized elapsed time directly.
    pub epcc: bool,

    /// Run an empty region on the pool sized to the trial's thread count before
    /// the measurement window opens, moving one-time worker creation cost out
    /// of the first sample.
    pub warm_up: bool,
}

/// Runs `payload` once per configured repetition, appending one sample per
/// repetition to the trial in repetition order.
///
/// Each sample is the elapsed wall-clock time of a single payload call divided
/// by the trial's directive-repeat count (the payload loops the construct that
/// many times internally). If the host clock reports end-before-start, the
/// negative value is propagated as-is: the overhead calculator may clamp it
/// later, but the anomaly itself stays detectable.
pub fn run_trial(payload: &impl Payload, trial: &mut Trial, options: &RunnerOptions) {
    if options.warm_up && trial.threads > 0 {
        pool::warm_up(trial.threads);
    }

    let origin = Instant::now();

    for _ in 0..trial.repetitions {
        let before = Timestamp::since(origin);

        payload.run(trial);

        let after = Timestamp::since(origin);

        let time = Timestamp::delta(before, after).as_micros()
            / f64::from(trial.directive_repeats.get());

        let sample = if options.epcc {
            epcc_sample(time, trial.threads, trial.iterations)
        } else {
            time
        };

        trial.samples.push(sample);
    }
}

/// Rescales a directive-normalized elapsed time (µs) to the EPCC per-thread
/// overhead-accounting convention.
///
/// Two overhead-accounting conventions exist for this kind of benchmark and
/// downstream consumers expect one of them applied consistently across a whole
/// run, so the choice is configurable rather than hardcoded.
#[must_use]
pub fn epcc_sample(normalized_micros: f64, threads: u32, iterations: u64) -> f64 {
    normalized_micros * f64::from(threads) / iterations as f64
}
