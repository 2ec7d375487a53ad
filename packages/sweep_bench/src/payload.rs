//! Contracts implemented by the workload code injected into the harness.

use crate::Trial;

/// A benchmark workload.
///
/// The harness invokes `run` exactly once per timed sample and expects the
/// payload to execute its construct-under-test [`Trial::directive_repeats`]
/// times internally. From the harness's point of view each call is a single,
/// synchronous, blocking unit of work; any parallelism the payload spawns is
/// the subject of measurement, not a harness concern.
///
/// Plain functions and closures of type `Fn(&Trial)` implement this trait,
/// so payload variants can be passed directly:
///
/// ```
/// use sweep_bench::{Payload, Trial};
///
/// fn spin(trial: &Trial) {
///     std::hint::black_box(trial.workload);
/// }
///
/// fn takes_payload(payload: &impl Payload, trial: &Trial) {
///     payload.run(trial);
/// }
///
/// takes_payload(&spin, &Trial::default());
/// ```
pub trait Payload {
    /// Executes the workload once under the given configuration.
    fn run(&self, trial: &Trial);
}

impl<F> Payload for F
where
    F: Fn(&Trial),
{
    fn run(&self, trial: &Trial) {
        self(trial);
    }
}

/// Hooks bracketing every timed call of an offload-family sweep, including the
/// reference's.
///
/// The hooks own the device-resident staging buffer: `preprocessing` sizes it
/// to the trial's `array_size` (reusing the previous allocation when the size
/// is unchanged) and `postprocessing` releases or retains it. Both are invoked
/// for every trial and must never be skipped, even when reuse means no actual
/// work occurs - allocation cost must stay out of the measurement window of
/// unrelated trials.
pub trait OffloadHooks {
    /// Verifies that the device can actually execute work.
    ///
    /// Called once before any measurement begins. Returning an error aborts the
    /// whole family run; collecting host-only timings and presenting them as
    /// device measurements would be meaningless.
    fn probe(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Runs before every timed call, sized by the upcoming trial.
    fn preprocessing(&mut self, trial: &Trial);

    /// Runs after every timed call.
    fn postprocessing(&mut self);
}
