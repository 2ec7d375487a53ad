//! Process-wide sweep axes, normalized once at startup and read-only thereafter.

use std::num::NonZero;

use new_zealand::nz;
use nonempty::NonEmpty;

use crate::pool;

/// Raw axis values as produced by the configuration surface, before
/// normalization. Empty vectors mean "use the family default".
#[derive(Clone, Debug, Default)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain configuration input record, constructed field by field"
)]
pub struct RawParams {
    /// Number of timed samples per configuration.
    pub repetitions: Vec<u32>,

    /// Inner loop sizes.
    pub iterations: Vec<u64>,

    /// Parallelism widths.
    pub threads: Vec<u32>,

    /// Synthetic compute cost per unit of work.
    pub workload: Vec<u64>,

    /// Element counts staged to the device (offload family).
    pub array_sizes: Vec<u64>,

    /// Team counts on the device (offload family).
    pub teams: Vec<u32>,

    /// Threads per team on the device (offload family).
    pub gpu_threads: Vec<u32>,

    /// Branching factors (task-tree family).
    pub child_nodes: Vec<u32>,

    /// Total task counts (task-tree family).
    pub tasks: Vec<u64>,

    /// Construct executions per timed sample. `None` or zero means 1.
    pub directive_repeats: Option<u32>,

    /// CPU thread count the device is compared against (offload family).
    /// `None` or zero means all available processors.
    pub reference_threads: Option<u32>,
}

/// Normalized parameter vectors for one benchmark family.
///
/// Every vector is non-empty (defaults were substituted where configuration
/// left an axis empty) and sorted by convention: descending, except the
/// thread-like axes (`threads`, `gpu_threads`, `child_nodes`) which sort
/// ascending. Created once per process and never mutated afterwards.
///
/// `child_nodes` is the one axis that may be empty: a configured branching
/// factor of exactly 1 would produce a non-terminating tree and is silently
/// filtered out, which can leave nothing to sweep.
#[derive(Clone, Debug)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain configuration record; tests and binaries construct it directly"
)]
pub struct SweepParams {
    /// Numbers of timed samples per configuration.
    pub repetitions: NonEmpty<u32>,

    /// Inner loop sizes.
    pub iterations: NonEmpty<u64>,

    /// Parallelism widths. For the offload family this holds a single entry:
    /// the CPU baseline the device is compared against.
    pub threads: NonEmpty<u32>,

    /// Synthetic compute cost per unit of work.
    pub workload: NonEmpty<u64>,

    /// Element counts staged to the device.
    pub array_sizes: NonEmpty<u64>,

    /// Team counts on the device.
    pub teams: NonEmpty<u32>,

    /// Threads per team on the device.
    pub gpu_threads: NonEmpty<u32>,

    /// Branching factors for the task-tree family, value 1 removed.
    pub child_nodes: Vec<u32>,

    /// Total task counts for the task-tree family.
    pub tasks: NonEmpty<u64>,

    /// Construct executions per timed sample, at least 1.
    pub directive_repeats: NonZero<u32>,
}

impl SweepParams {
    /// Normalizes raw axes for a CPU work-sharing family sweep
    /// (work-sharing loops, synchronization, scheduling, tasking).
    #[must_use]
    pub fn worksharing(raw: RawParams) -> Self {
        let threads = if raw.threads.is_empty() {
            ascending(halving_sequence(pool::available_threads(), 1), 1)
        } else {
            ascending(raw.threads, 1)
        };

        Self {
            repetitions: descending(raw.repetitions, 5),
            iterations: descending(raw.iterations, 100),
            threads,
            workload: descending(raw.workload, 2),
            array_sizes: descending(raw.array_sizes, 100_000),
            teams: descending(raw.teams, 5),
            gpu_threads: ascending(raw.gpu_threads, 10),
            child_nodes: Vec::new(),
            tasks: descending(raw.tasks, 100),
            directive_repeats: directive_floor(raw.directive_repeats),
        }
    }

    /// Normalizes raw axes for an offload family sweep.
    ///
    /// Defaults for team and per-team thread counts are deliberately low so
    /// that most devices can handle them.
    #[must_use]
    pub fn offload(raw: RawParams) -> Self {
        let baseline = match raw.reference_threads {
            Some(threads) if threads > 0 => threads,
            _ => pool::available_threads(),
        };

        Self {
            repetitions: descending(raw.repetitions, 5),
            iterations: descending(raw.iterations, 10),
            threads: NonEmpty::new(baseline),
            workload: descending(raw.workload, 10),
            array_sizes: descending(raw.array_sizes, 100_000),
            teams: descending(raw.teams, 5),
            gpu_threads: ascending(raw.gpu_threads, 10),
            child_nodes: Vec::new(),
            tasks: descending(raw.tasks, 100),
            directive_repeats: directive_floor(raw.directive_repeats),
        }
    }

    /// Normalizes raw axes for a task-tree family sweep.
    ///
    /// Branching factor 1 is removed from the swept set: one child per node
    /// would create an unbounded tree for the same total task count. The
    /// directive-repeat count is fixed at 1 for this family.
    #[must_use]
    pub fn task_tree(raw: RawParams) -> Self {
        let child_nodes = if raw.child_nodes.is_empty() {
            let mut defaults = halving_sequence(pool::available_threads(), 2);
            defaults.sort_unstable();
            defaults
        } else {
            let mut configured: Vec<u32> = raw
                .child_nodes
                .into_iter()
                .filter(|&children| children != 1)
                .collect();
            configured.sort_unstable();
            configured
        };

        Self {
            repetitions: descending(raw.repetitions, 5),
            iterations: descending(raw.iterations, 100),
            threads: ascending(raw.threads, 1),
            workload: descending(raw.workload, 2),
            array_sizes: descending(raw.array_sizes, 100_000),
            teams: descending(raw.teams, 5),
            gpu_threads: ascending(raw.gpu_threads, 10),
            child_nodes,
            tasks: descending(raw.tasks, 100),
            directive_repeats: nz!(1),
        }
    }
}

fn descending<T: Ord + Copy>(mut values: Vec<T>, default: T) -> NonEmpty<T> {
    if values.is_empty() {
        values.push(default);
    }
    values.sort_unstable_by(|a, b| b.cmp(a));

    NonEmpty::from_vec(values).expect("default substitution guarantees at least one value")
}

fn ascending<T: Ord + Copy>(mut values: Vec<T>, default: T) -> NonEmpty<T> {
    if values.is_empty() {
        values.push(default);
    }
    values.sort_unstable();

    NonEmpty::from_vec(values).expect("default substitution guarantees at least one value")
}

/// The halving sequence `from, from/2, ..., down_to` (integer division).
fn halving_sequence(from: u32, down_to: u32) -> Vec<u32> {
    let mut sequence = Vec::new();
    let mut value = from;

    while value >= down_to {
        sequence.push(value);
        if value == 1 {
            break;
        }
        value /= 2;
    }

    sequence
}

fn directive_floor(configured: Option<u32>) -> NonZero<u32> {
    configured
        .and_then(NonZero::new)
        .unwrap_or(nz!(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_axes_receive_defaults() {
        let params = SweepParams::worksharing(RawParams::default());

        assert_eq!(params.repetitions.len(), 1);
        assert_eq!(*params.repetitions.first(), 5);
        assert_eq!(*params.iterations.first(), 100);
        assert_eq!(*params.workload.first(), 2);
        assert_eq!(params.directive_repeats.get(), 1);
    }

    #[test]
    fn default_thread_axis_is_an_ascending_halving_sequence() {
        let params = SweepParams::worksharing(RawParams::default());

        let threads: Vec<u32> = params.threads.iter().copied().collect();
        assert_eq!(*threads.first().unwrap(), 1);
        assert!(threads.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(*threads.last().unwrap(), pool::available_threads());
    }

    #[test]
    fn descending_axes_sort_descending() {
        let params = SweepParams::worksharing(RawParams {
            iterations: vec![10, 1000, 100],
            ..RawParams::default()
        });

        let iterations: Vec<u64> = params.iterations.iter().copied().collect();
        assert_eq!(iterations, vec![1000, 100, 10]);
    }

    #[test]
    fn thread_axis_sorts_ascending() {
        let params = SweepParams::worksharing(RawParams {
            threads: vec![8, 2, 4],
            ..RawParams::default()
        });

        let threads: Vec<u32> = params.threads.iter().copied().collect();
        assert_eq!(threads, vec![2, 4, 8]);
    }

    #[test]
    fn directive_repeats_floor_at_one() {
        let zero = SweepParams::worksharing(RawParams {
            directive_repeats: Some(0),
            ..RawParams::default()
        });
        let unset = SweepParams::worksharing(RawParams::default());
        let set = SweepParams::worksharing(RawParams {
            directive_repeats: Some(4),
            ..RawParams::default()
        });

        assert_eq!(zero.directive_repeats.get(), 1);
        assert_eq!(unset.directive_repeats.get(), 1);
        assert_eq!(set.directive_repeats.get(), 4);
    }

    #[test]
    fn single_child_branching_factor_is_filtered() {
        let params = SweepParams::task_tree(RawParams {
            child_nodes: vec![1, 2, 4],
            ..RawParams::default()
        });

        assert_eq!(params.child_nodes, vec![2, 4]);
    }

    #[test]
    fn filtering_can_empty_the_child_axis() {
        let params = SweepParams::task_tree(RawParams {
            child_nodes: vec![1],
            ..RawParams::default()
        });

        assert!(params.child_nodes.is_empty());
    }

    #[test]
    fn default_child_axis_excludes_one() {
        let params = SweepParams::task_tree(RawParams::default());

        assert!(params.child_nodes.iter().all(|&children| children > 1));
    }

    #[test]
    fn task_tree_directive_repeats_are_pinned_to_one() {
        let params = SweepParams::task_tree(RawParams {
            directive_repeats: Some(8),
            ..RawParams::default()
        });

        assert_eq!(params.directive_repeats.get(), 1);
    }

    #[test]
    fn offload_baseline_defaults_to_available_processors() {
        let params = SweepParams::offload(RawParams::default());

        assert_eq!(*params.threads.first(), pool::available_threads());
        assert_eq!(params.threads.len(), 1);
    }

    #[test]
    fn offload_baseline_honors_explicit_reference() {
        let params = SweepParams::offload(RawParams {
            reference_threads: Some(3),
            ..RawParams::default()
        });

        assert_eq!(*params.threads.first(), 3);
    }

    #[test]
    fn offload_gpu_threads_sort_ascending_and_teams_descending() {
        let params = SweepParams::offload(RawParams {
            gpu_threads: vec![32, 8, 16],
            teams: vec![2, 8, 4],
            ..RawParams::default()
        });

        let gpu_threads: Vec<u32> = params.gpu_threads.iter().copied().collect();
        let teams: Vec<u32> = params.teams.iter().copied().collect();
        assert_eq!(gpu_threads, vec![8, 16, 32]);
        assert_eq!(teams, vec![8, 4, 2]);
    }

    #[test]
    fn halving_sequence_stops_at_lower_bound() {
        assert_eq!(halving_sequence(8, 1), vec![8, 4, 2, 1]);
        assert_eq!(halving_sequence(8, 2), vec![8, 4, 2]);
        assert_eq!(halving_sequence(1, 1), vec![1]);
        assert_eq!(halving_sequence(6, 1), vec![6, 3, 1]);
    }
}
