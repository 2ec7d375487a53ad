//! Expands parameter vectors into trials and drives the benchmark runner.
//!
//! Three family drivers share the same shape: nested iteration over the
//! family's parameter vectors in a fixed order, one reference trial per outer
//! combination, one test trial per inner combination, and an overhead record
//! derived from every matched pair. The sweep is finite by construction
//! because every normalized parameter vector is finite.

use std::slice;

use thiserror::Error;

use crate::{
    METRIC_OVERHEAD, METRIC_REFERENCE_TIME, METRIC_TEST_TIME, OffloadHooks, OverheadModel,
    Payload, PointLayout, ResultStore, RunnerOptions, SweepParams, Trial, overhead, report,
    runner,
};

/// Errors surfaced by a benchmark session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// A result document could not be written.
    #[error("failed to persist results: {0}")]
    Io(#[from] std::io::Error),

    /// The offload device failed its reachability probe. Measuring anyway
    /// would silently collect meaningless host-only timings.
    #[error("offload device unreachable: {0}")]
    DeviceUnreachable(String),

    /// The configuration surface produced unusable input.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Mode flags applying to every family run within a session.
#[derive(Clone, Copy, Debug, Default)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain flag set, constructed with struct update syntax"
)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "each flag is an independently selectable mode"
)]
pub struct SessionOptions {
    /// Suppress all console reporting.
    pub quiet: bool,

    /// Persist collected series to the per-family JSON documents.
    pub save_results: bool,

    /// Use EPCC-style per-thread overhead accounting for work-sharing runs.
    pub epcc: bool,

    /// Warm up the worker pool before each measurement window.
    pub warm_up: bool,

    /// Clamp work-sharing overhead at or below 1.0 µs to exactly 1.0.
    pub clamp_low: bool,
}

/// Everything one family run produced, in sweep order.
#[derive(Debug, Default)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain result record handed back to the caller"
)]
pub struct FamilySummary {
    /// Reference records, duplicated once per inner-sweep step.
    pub reference: Vec<Trial>,

    /// Test records, one per inner combination.
    pub test: Vec<Trial>,

    /// Overhead records, paired with `test` by index.
    pub overhead: Vec<Trial>,
}

/// Drives the parameter sweeps for benchmark families.
///
/// A session owns the normalized parameter vectors, the mode flags and the
/// result store. Its control flow is single-threaded: payload calls and disk
/// writes are the only blocking operations, and nothing in the session runs
/// concurrently with anything else.
#[derive(Debug)]
pub struct Session {
    params: SweepParams,
    options: SessionOptions,
    store: ResultStore,
}

impl Session {
    /// Creates a session persisting results into the current working directory.
    pub fn new(params: SweepParams, options: SessionOptions) -> Self {
        Self::with_store(params, options, ResultStore::new())
    }

    /// Creates a session persisting results through the given store.
    pub fn with_store(params: SweepParams, options: SessionOptions, store: ResultStore) -> Self {
        Self {
            params,
            options,
            store,
        }
    }

    /// The normalized parameter vectors this session sweeps.
    #[must_use]
    pub fn params(&self) -> &SweepParams {
        &self.params
    }

    /// Deletes the family's stored results so the upcoming sweep exports a
    /// clean document instead of accumulating onto prior runs.
    pub fn remove_prior_results(&mut self, family: &str) -> Result<(), SessionError> {
        self.store.remove(family)?;
        Ok(())
    }

    /// Runs a CPU work-sharing family sweep.
    ///
    /// Loop order: repetitions, iterations, workload, then thread count. One
    /// reference trial runs at `threads = 1` per outer combination; the
    /// reference record is exported once per thread count (tagged with that
    /// thread count) because the downstream modeling format needs the same
    /// sample-set cardinality for every metric series.
    ///
    /// In EPCC mode the iteration count actually run for the test is
    /// multiplied by the thread count, so each thread performs the nominal
    /// per-thread iteration count; the stored record keeps the user-specified
    /// units.
    pub fn run_worksharing(
        &mut self,
        family: &str,
        test_name: &str,
        test: &impl Payload,
        reference: &impl Payload,
    ) -> Result<FamilySummary, SessionError> {
        let runner_options = RunnerOptions {
            epcc: self.options.epcc,
            warm_up: self.options.warm_up,
        };

        let mut summary = FamilySummary::default();

        for &repetitions in self.params.repetitions.iter() {
            for &iterations in self.params.iterations.iter() {
                for &workload in self.params.workload.iter() {
                    let mut reference_record = Trial {
                        repetitions,
                        iterations,
                        workload,
                        directive_repeats: self.params.directive_repeats,
                        threads: 1,
                        ..Trial::default()
                    };
                    runner::run_trial(reference, &mut reference_record, &runner_options);

                    for &threads in self.params.threads.iter() {
                        let mut duplicated_reference = reference_record.clone();
                        duplicated_reference.threads = threads;
                        summary.reference.push(duplicated_reference);

                        let run_iterations = if self.options.epcc {
                            iterations * u64::from(threads)
                        } else {
                            iterations
                        };

                        let mut test_record = Trial {
                            repetitions,
                            iterations: run_iterations,
                            workload,
                            directive_repeats: self.params.directive_repeats,
                            threads,
                            ..Trial::default()
                        };
                        runner::run_trial(test, &mut test_record, &runner_options);

                        // Display in user-specified units even when the run
                        // itself used the per-thread convention.
                        test_record.iterations = iterations;

                        let overhead_record = overhead::derive(
                            &reference_record,
                            &test_record,
                            OverheadModel::PerThread {
                                clamp_low: self.options.clamp_low,
                            },
                        );

                        summary.test.push(test_record);
                        summary.overhead.push(overhead_record);
                    }
                }
            }
        }

        if self.options.save_results {
            self.store.save(
                family,
                test_name,
                &summary.reference,
                METRIC_REFERENCE_TIME,
                PointLayout::Worksharing,
            )?;
            self.store.save(
                family,
                test_name,
                &summary.test,
                METRIC_TEST_TIME,
                PointLayout::Worksharing,
            )?;
            self.store.save(
                family,
                test_name,
                &summary.overhead,
                METRIC_OVERHEAD,
                PointLayout::Worksharing,
            )?;
        }

        if !self.options.quiet {
            print!("{}", report::worksharing_table(test_name, &summary.overhead));
        }

        Ok(summary)
    }

    /// Runs an offload family sweep.
    ///
    /// The hooks' reachability probe runs before any measurement; a failure
    /// aborts the whole run. `preprocessing` runs before every timed call
    /// including the reference's, `postprocessing` after; neither is ever
    /// skipped. The reference runs on the CPU baseline thread count, and
    /// overhead is the direct difference against it.
    ///
    /// Each (teams, threads-per-team) pair is exported and reported as its own
    /// experiment, named `<test>_Teams_<teams>_Threads_<gpu threads>`, which
    /// keeps the exported parameter count down.
    pub fn run_offload(
        &mut self,
        family: &str,
        test_name: &str,
        hooks: &mut impl OffloadHooks,
        test: &impl Payload,
        reference: &impl Payload,
    ) -> Result<FamilySummary, SessionError> {
        hooks.probe().map_err(SessionError::DeviceUnreachable)?;

        // EPCC accounting is a work-sharing convention; it does not apply here.
        let runner_options = RunnerOptions {
            epcc: false,
            warm_up: self.options.warm_up,
        };

        let baseline_threads = *self.params.threads.first();
        let mut summary = FamilySummary::default();

        for &repetitions in self.params.repetitions.iter() {
            for &array_size in self.params.array_sizes.iter() {
                for &iterations in self.params.iterations.iter() {
                    for &workload in self.params.workload.iter() {
                        let mut reference_record = Trial {
                            repetitions,
                            iterations,
                            workload,
                            array_size,
                            directive_repeats: self.params.directive_repeats,
                            threads: baseline_threads,
                            ..Trial::default()
                        };

                        hooks.preprocessing(&reference_record);
                        runner::run_trial(reference, &mut reference_record, &runner_options);
                        hooks.postprocessing();

                        for &teams in self.params.teams.iter() {
                            for &gpu_threads in self.params.gpu_threads.iter() {
                                let mut test_record = Trial {
                                    repetitions,
                                    iterations,
                                    workload,
                                    array_size,
                                    teams,
                                    gpu_threads,
                                    directive_repeats: self.params.directive_repeats,
                                    threads: baseline_threads,
                                    ..Trial::default()
                                };

                                hooks.preprocessing(&test_record);
                                runner::run_trial(test, &mut test_record, &runner_options);
                                hooks.postprocessing();

                                let overhead_record = overhead::derive(
                                    &reference_record,
                                    &test_record,
                                    OverheadModel::Direct,
                                );

                                let experiment_name =
                                    format!("{test_name}_Teams_{teams}_Threads_{gpu_threads}");

                                if self.options.save_results {
                                    self.store.save(
                                        family,
                                        &experiment_name,
                                        slice::from_ref(&test_record),
                                        METRIC_TEST_TIME,
                                        PointLayout::Offload,
                                    )?;
                                    self.store.save(
                                        family,
                                        &experiment_name,
                                        slice::from_ref(&overhead_record),
                                        METRIC_OVERHEAD,
                                        PointLayout::Offload,
                                    )?;
                                }

                                if !self.options.quiet {
                                    print!(
                                        "{}",
                                        report::offload_table(
                                            &experiment_name,
                                            slice::from_ref(&overhead_record),
                                        )
                                    );
                                }

                                summary.test.push(test_record);
                                summary.overhead.push(overhead_record);
                            }
                        }

                        summary.reference.push(reference_record);
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Runs a task-tree family sweep.
    ///
    /// Loop order: repetitions, total task count, workload, then branching
    /// factor. The reference is the flat task loop at the same total task
    /// count, marked with a branching factor of 0; overhead is the direct
    /// difference against it.
    pub fn run_task_tree(
        &mut self,
        family: &str,
        test_name: &str,
        test: &impl Payload,
        reference: &impl Payload,
    ) -> Result<FamilySummary, SessionError> {
        // EPCC accounting is a work-sharing convention; it does not apply here.
        let runner_options = RunnerOptions {
            epcc: false,
            warm_up: self.options.warm_up,
        };

        let mut summary = FamilySummary::default();

        for &repetitions in self.params.repetitions.iter() {
            for &tasks in self.params.tasks.iter() {
                for &workload in self.params.workload.iter() {
                    let mut reference_record = Trial {
                        repetitions,
                        tasks,
                        child_nodes: 0,
                        workload,
                        directive_repeats: self.params.directive_repeats,
                        ..Trial::default()
                    };
                    runner::run_trial(reference, &mut reference_record, &runner_options);

                    for &child_nodes in &self.params.child_nodes {
                        let mut test_record = Trial {
                            repetitions,
                            tasks,
                            child_nodes,
                            workload,
                            directive_repeats: self.params.directive_repeats,
                            ..Trial::default()
                        };
                        runner::run_trial(test, &mut test_record, &runner_options);

                        let overhead_record = overhead::derive(
                            &reference_record,
                            &test_record,
                            OverheadModel::Direct,
                        );

                        summary.test.push(test_record);
                        summary.overhead.push(overhead_record);
                    }

                    summary.reference.push(reference_record);
                }
            }
        }

        if self.options.save_results {
            self.store.save(
                family,
                test_name,
                &summary.test,
                METRIC_TEST_TIME,
                PointLayout::TaskTree,
            )?;
            self.store.save(
                family,
                test_name,
                &summary.overhead,
                METRIC_OVERHEAD,
                PointLayout::TaskTree,
            )?;
        }

        if !self.options.quiet {
            print!("{}", report::task_tree_table(test_name, &summary.overhead));
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use new_zealand::nz;
    use nonempty::NonEmpty;

    use super::*;
    use crate::RawParams;

    fn noop(_: &Trial) {}

    fn small_worksharing_params() -> SweepParams {
        SweepParams {
            repetitions: NonEmpty::from_vec(vec![3, 2]).unwrap(),
            iterations: NonEmpty::new(10),
            threads: NonEmpty::from_vec(vec![1, 2]).unwrap(),
            workload: NonEmpty::new(1),
            array_sizes: NonEmpty::new(10),
            teams: NonEmpty::new(1),
            gpu_threads: NonEmpty::new(1),
            child_nodes: vec![2],
            tasks: NonEmpty::new(4),
            directive_repeats: nz!(1),
        }
    }

    fn quiet_options() -> SessionOptions {
        SessionOptions {
            quiet: true,
            ..SessionOptions::default()
        }
    }

    #[test]
    fn every_pair_has_matching_sample_cardinality() {
        let mut session = Session::new(small_worksharing_params(), quiet_options());

        let summary = session
            .run_worksharing("FAM", "NOOP", &noop, &noop)
            .unwrap();

        assert_eq!(summary.reference.len(), summary.test.len());
        assert_eq!(summary.test.len(), summary.overhead.len());
        for ((reference, test), overhead) in summary
            .reference
            .iter()
            .zip(&summary.test)
            .zip(&summary.overhead)
        {
            assert_eq!(reference.samples.len(), test.samples.len());
            assert_eq!(test.samples.len(), overhead.samples.len());
            assert_eq!(test.samples.len(), test.repetitions as usize);
        }
    }

    #[test]
    fn reference_is_duplicated_once_per_thread_count() {
        let mut session = Session::new(small_worksharing_params(), quiet_options());

        let summary = session
            .run_worksharing("FAM", "NOOP", &noop, &noop)
            .unwrap();

        // 2 repetitions x 1 iteration count x 1 workload x 2 thread counts.
        assert_eq!(summary.reference.len(), 4);

        let threads: Vec<u32> = summary
            .reference
            .iter()
            .map(|record| record.threads)
            .collect();
        assert_eq!(threads, vec![1, 2, 1, 2]);
    }

    #[test]
    fn epcc_mode_reports_nominal_iteration_counts() {
        let mut session = Session::new(
            small_worksharing_params(),
            SessionOptions {
                quiet: true,
                epcc: true,
                ..SessionOptions::default()
            },
        );

        let observed = RefCell::new(Vec::new());
        let recording = |trial: &Trial| observed.borrow_mut().push(trial.iterations);

        let summary = session
            .run_worksharing("FAM", "NOOP", &recording, &noop)
            .unwrap();

        // The run itself used iterations * threads...
        assert!(observed.borrow().contains(&20));
        // ...but the stored records show the user-specified units.
        assert!(summary.test.iter().all(|record| record.iterations == 10));
    }

    #[test]
    fn task_tree_reference_has_zero_branching_factor() {
        let mut session = Session::new(small_worksharing_params(), quiet_options());

        let summary = session.run_task_tree("FAM", "TREE", &noop, &noop).unwrap();

        assert!(summary.reference.iter().all(|record| record.child_nodes == 0));
        assert!(summary.test.iter().all(|record| record.child_nodes == 2));
        assert_eq!(summary.test.len(), summary.overhead.len());
    }

    #[test]
    fn empty_child_axis_produces_references_but_no_pairs() {
        let params = SweepParams {
            child_nodes: Vec::new(),
            ..small_worksharing_params()
        };
        let mut session = Session::new(params, quiet_options());

        let summary = session.run_task_tree("FAM", "TREE", &noop, &noop).unwrap();

        assert!(!summary.reference.is_empty());
        assert!(summary.test.is_empty());
        assert!(summary.overhead.is_empty());
    }

    struct RecordingHooks {
        calls: Vec<&'static str>,
        probe_result: Result<(), String>,
    }

    impl RecordingHooks {
        fn reachable() -> Self {
            Self {
                calls: Vec::new(),
                probe_result: Ok(()),
            }
        }
    }

    impl OffloadHooks for RecordingHooks {
        fn probe(&mut self) -> Result<(), String> {
            self.calls.push("probe");
            self.probe_result.clone()
        }

        fn preprocessing(&mut self, _trial: &Trial) {
            self.calls.push("pre");
        }

        fn postprocessing(&mut self) {
            self.calls.push("post");
        }
    }

    #[test]
    fn offload_hooks_bracket_reference_and_every_test() {
        let mut session = Session::new(small_worksharing_params(), quiet_options());
        let mut hooks = RecordingHooks::reachable();

        let summary = session
            .run_offload("FAM", "COPY", &mut hooks, &noop, &noop)
            .unwrap();

        // One reference and one (teams, gpu_threads) combination per outer
        // combination: every timed call is bracketed by pre and post.
        let timed_calls = summary.reference.len() + summary.test.len();
        let pre_count = hooks.calls.iter().filter(|&&call| call == "pre").count();
        let post_count = hooks.calls.iter().filter(|&&call| call == "post").count();
        assert_eq!(pre_count, timed_calls);
        assert_eq!(post_count, timed_calls);
        assert_eq!(hooks.calls.first(), Some(&"probe"));
    }

    #[test]
    fn failed_probe_aborts_before_any_measurement() {
        let mut session = Session::new(small_worksharing_params(), quiet_options());
        let mut hooks = RecordingHooks {
            calls: Vec::new(),
            probe_result: Err("no device".to_owned()),
        };

        let invoked = RefCell::new(false);
        let marking = |_: &Trial| *invoked.borrow_mut() = true;

        let result = session.run_offload("FAM", "COPY", &mut hooks, &marking, &marking);

        assert!(matches!(result, Err(SessionError::DeviceUnreachable(_))));
        assert!(!*invoked.borrow());
        assert_eq!(hooks.calls, vec!["probe"]);
    }

    #[test]
    fn offload_overhead_is_a_direct_difference() {
        let mut session = Session::new(small_worksharing_params(), quiet_options());
        let mut hooks = RecordingHooks::reachable();

        let summary = session
            .run_offload("FAM", "COPY", &mut hooks, &noop, &noop)
            .unwrap();

        for (test, overhead) in summary.test.iter().zip(&summary.overhead) {
            assert_eq!(overhead.teams, test.teams);
            assert_eq!(overhead.samples.len(), test.samples.len());
        }
    }

    #[test]
    fn saving_exports_all_three_worksharing_metrics() {
        let directory = tempfile::tempdir().unwrap();
        let store = ResultStore::in_directory(directory.path());
        let mut session = Session::with_store(
            small_worksharing_params(),
            SessionOptions {
                quiet: true,
                save_results: true,
                ..SessionOptions::default()
            },
            store,
        );

        let summary = session
            .run_worksharing("FAM", "NOOP", &noop, &noop)
            .unwrap();

        let path = directory.path().join("FAM_runs.json");
        let document = crate::ResultDocument::load(&path);

        for metric in [METRIC_REFERENCE_TIME, METRIC_TEST_TIME, METRIC_OVERHEAD] {
            let series = document.series("NOOP", metric).unwrap();
            assert_eq!(series.len(), summary.overhead.len());
        }
        assert_eq!(
            document.parameters(),
            ["Threads", "Workload", "Iterations"]
        );
    }

    #[test]
    fn removing_prior_results_starts_a_clean_document() {
        let directory = tempfile::tempdir().unwrap();
        let options = SessionOptions {
            quiet: true,
            save_results: true,
            ..SessionOptions::default()
        };

        let store = ResultStore::in_directory(directory.path());
        let mut session = Session::with_store(small_worksharing_params(), options, store);
        session.run_worksharing("FAM", "NOOP", &noop, &noop).unwrap();

        // A second session accumulates unless prior results are removed first.
        let store = ResultStore::in_directory(directory.path());
        let mut session = Session::with_store(small_worksharing_params(), options, store);
        session.remove_prior_results("FAM").unwrap();
        let summary = session
            .run_worksharing("FAM", "NOOP", &noop, &noop)
            .unwrap();

        let document =
            crate::ResultDocument::load(&directory.path().join("FAM_runs.json"));
        assert_eq!(
            document.series("NOOP", METRIC_OVERHEAD).unwrap().len(),
            summary.overhead.len()
        );
    }

    #[test]
    fn normalized_defaults_drive_a_finite_sweep() {
        // Guards the termination argument: defaults substituted for empty
        // vectors always yield a finite, non-empty sweep.
        let params = SweepParams::worksharing(RawParams::default());
        let expected_pairs = params.repetitions.len()
            * params.iterations.len()
            * params.workload.len()
            * params.threads.len();

        let mut session = Session::new(params, quiet_options());
        let summary = session
            .run_worksharing("FAM", "NOOP", &noop, &noop)
            .unwrap();

        assert_eq!(summary.overhead.len(), expected_pairs);
    }
}
