//! The unit of measurement: one configuration plus its collected samples.

use std::num::NonZero;

use new_zealand::nz;

/// One benchmark configuration together with the timing samples observed for it.
///
/// A trial is built incrementally: the sweep engine fills in the configuration
/// axes, the benchmark runner appends one sample (in microseconds) per completed
/// repetition, and from then on the record is treated as read-only by the
/// overhead calculator, the result store and the reporter.
///
/// The `teams`, `gpu_threads` and `array_size` axes are only meaningful for the
/// offload family, `tasks` and `child_nodes` only for the task-tree family;
/// everything else leaves them at zero.
#[derive(Clone, Debug, PartialEq)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain measurement configuration record, constructed with struct update syntax"
)]
pub struct Trial {
    /// Number of timed samples to collect for this configuration.
    pub repetitions: u32,

    /// Size of the inner work-sharing loop.
    pub iterations: u64,

    /// Synthetic compute cost per unit of work.
    pub workload: u64,

    /// Number of times the parallel construct is executed per timed sample.
    /// Each sample is divided by this value to amortize constant overhead.
    pub directive_repeats: NonZero<u32>,

    /// Requested parallelism width. Zero means "one worker per processor".
    pub threads: u32,

    /// Total number of tasks to create (task-tree family only).
    pub tasks: u64,

    /// Branching factor of the generated tree (task-tree family only).
    /// Zero marks the flat reference configuration.
    pub child_nodes: u32,

    /// Number of teams on the device (offload family only).
    pub teams: u32,

    /// Threads per team on the device (offload family only).
    pub gpu_threads: u32,

    /// Number of elements staged to the device (offload family only).
    pub array_size: u64,

    /// Observed timings in microseconds, one entry per completed repetition,
    /// in repetition order. Appended to only by the benchmark runner.
    pub samples: Vec<f64>,
}

impl Default for Trial {
    fn default() -> Self {
        Self {
            repetitions: 0,
            iterations: 0,
            workload: 0,
            directive_repeats: nz!(1),
            threads: 0,
            tasks: 0,
            child_nodes: 0,
            teams: 0,
            gpu_threads: 0,
            array_size: 0,
            samples: Vec::new(),
        }
    }
}

impl Trial {
    /// The middle element of the sorted sample sequence, or `None` when no
    /// samples have been collected yet.
    #[must_use]
    pub fn median_sample(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);

        Some(sorted[sorted.len() / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_empty_record_is_none() {
        assert_eq!(Trial::default().median_sample(), None);
    }

    #[test]
    fn median_is_middle_of_sorted_samples() {
        let trial = Trial {
            samples: vec![30.0, 10.0, 20.0],
            ..Trial::default()
        };

        assert_eq!(trial.median_sample(), Some(20.0));
    }

    #[test]
    fn median_of_even_count_takes_upper_middle() {
        let trial = Trial {
            samples: vec![4.0, 1.0, 3.0, 2.0],
            ..Trial::default()
        };

        // Same convention as sorting and indexing at len / 2.
        assert_eq!(trial.median_sample(), Some(3.0));
    }
}
