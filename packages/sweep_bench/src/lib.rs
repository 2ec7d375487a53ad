//! Parameterized microbenchmark harness for parallel-execution constructs.
//!
//! This package measures the runtime overhead of parallel constructs (work-sharing
//! loops, tasking, synchronization, scheduling policies, staged "offload" execution)
//! relative to a serial or simplified reference implementation. It expands a
//! multi-dimensional parameter space into concrete trial configurations, times a
//! reference and a test workload under identical conditions, derives an overhead
//! metric, and exports the collected series as JSON for downstream performance-model
//! fitting.
//!
//! The harness itself is single-threaded orchestration: it launches each payload as
//! an opaque, blocking unit of work and brackets it with timestamps on the invoking
//! thread. Payloads are expected to spawn and join their own parallel regions, for
//! which a pre-warmed per-thread-count [`rayon`] pool registry is provided so that
//! pool construction cost never lands inside a measured sample.
//!
//! The core functionality includes:
//! - [`Session`] - drives the parameter sweep for one benchmark family and pairs
//!   every test measurement with its reference measurement
//! - [`Trial`] - one configuration plus its collected timing samples
//! - [`SweepParams`] - normalized parameter vectors (defaults substituted, sort
//!   conventions applied)
//! - [`ResultStore`] - read-merge-write JSON persistence of measurement series
//! - [`Payload`] / [`OffloadHooks`] - the contracts injected payload code implements
//!
//! # Basic example
//!
//! ```no_run
//! use sweep_bench::{RawParams, Session, SessionOptions, SweepParams, Trial};
//!
//! fn busy(trial: &Trial) {
//!     for _ in 0..trial.directive_repeats.get() {
//!         for i in 0..trial.iterations {
//!             std::hint::black_box(i * trial.workload);
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), sweep_bench::SessionError> {
//! let params = SweepParams::worksharing(RawParams::default());
//! let mut session = Session::new(params, SessionOptions::default());
//! let summary = session.run_worksharing("DEMO", "BUSY", &busy, &busy)?;
//! println!("collected {} overhead records", summary.overhead.len());
//! # Ok(())
//! # }
//! ```

mod cli;
mod clock;
mod overhead;
mod params;
mod payload;
mod pool;
mod report;
mod runner;
mod store;
mod sweep;
mod trial;

pub use cli::*;
pub use clock::*;
pub use overhead::*;
pub use params::*;
pub use payload::*;
pub use pool::*;
pub use report::*;
pub use runner::*;
pub use store::*;
pub use sweep::*;
pub use trial::*;
