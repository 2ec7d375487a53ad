//! End-to-end work-sharing runs through the public API only.

use sweep_bench::{
    METRIC_OVERHEAD, RawParams, ResultDocument, ResultStore, Session, SessionOptions,
    SweepParams, Trial, pool_for,
};

fn spin(trial: &Trial) {
    let mut accumulator = 0.0_f32;
    for i in 0..trial.iterations * trial.workload {
        accumulator += i as f32;
    }
    std::hint::black_box(accumulator);
}

fn parallel_spin(trial: &Trial) {
    pool_for(trial.threads).install(|| spin(trial));
}

fn small_params() -> SweepParams {
    SweepParams::worksharing(RawParams {
        repetitions: vec![3],
        iterations: vec![10],
        threads: vec![2],
        workload: vec![1],
        ..RawParams::default()
    })
}

#[test]
fn overhead_is_test_minus_scaled_reference() {
    let mut session = Session::new(
        small_params(),
        SessionOptions {
            quiet: true,
            ..SessionOptions::default()
        },
    );

    let summary = session
        .run_worksharing("E2E", "SPIN", &parallel_spin, &spin)
        .unwrap();

    assert_eq!(summary.overhead.len(), 1);
    let reference = &summary.reference[0];
    let test = &summary.test[0];
    let overhead = &summary.overhead[0];

    assert_eq!(overhead.samples.len(), 3);
    for ((&reference_time, &test_time), &overhead_time) in reference
        .samples
        .iter()
        .zip(&test.samples)
        .zip(&overhead.samples)
    {
        // Same expression and evaluation order as the calculator, so the
        // comparison is exact despite floating point.
        assert_eq!(overhead_time, test_time - reference_time / 2.0);
    }
}

#[test]
fn consecutive_sessions_accumulate_into_one_document() {
    let directory = tempfile::tempdir().unwrap();
    let options = SessionOptions {
        quiet: true,
        save_results: true,
        ..SessionOptions::default()
    };

    for _ in 0..2 {
        let store = ResultStore::in_directory(directory.path());
        let mut session = Session::with_store(small_params(), options, store);
        session
            .run_worksharing("E2E", "SPIN", &parallel_spin, &spin)
            .unwrap();
    }

    let document = ResultDocument::load(&directory.path().join("E2E_runs.json"));
    assert_eq!(document.series("SPIN", METRIC_OVERHEAD).unwrap().len(), 2);
}
