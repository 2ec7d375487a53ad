//! Derives per-repetition overhead from a matched (reference, test) pair.

use crate::Trial;

/// How the reference time is scaled before it is subtracted from the test time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(
    clippy::exhaustive_enums,
    reason = "the two accounting models are the complete set"
)]
pub enum OverheadModel {
    /// Work-sharing accounting: `test - reference / test.threads`. The serial
    /// baseline is divided by the parallel width it is being compared against.
    ///
    /// With `clamp_low` enabled, any overhead at or below 1.0 µs is reported as
    /// exactly 1.0. Measurement noise can produce non-physical near-zero or
    /// negative overhead, which a downstream curve-fitting tool cannot accept
    /// on a log-style axis.
    PerThread {
        /// Clamp overheads `<= 1.0` to exactly `1.0`.
        clamp_low: bool,
    },

    /// Direct accounting: `test - reference`, used by the offload family (fixed
    /// CPU baseline) and the task-tree family (flat task loop at equal total
    /// task count). Never clamped.
    Direct,
}

/// Derives the overhead record for a matched pair.
///
/// The result carries the configuration axes of the *test* record, not the
/// reference's - the reference's axes may differ (its thread count is 1 for
/// work-sharing sweeps, its branching factor 0 for task-tree sweeps).
///
/// # Panics
///
/// Panics if the two records do not hold the same number of samples. The
/// downstream modeling format requires equal sample cardinality per point, so
/// a mismatch here is a correctness bug in the sweep, not a tolerable
/// approximation.
#[must_use]
pub fn derive(reference: &Trial, test: &Trial, model: OverheadModel) -> Trial {
    assert_eq!(
        reference.samples.len(),
        test.samples.len(),
        "reference and test records must hold the same number of samples"
    );

    let mut overhead = Trial {
        samples: Vec::with_capacity(test.samples.len()),
        ..test.clone()
    };

    for (&reference_time, &test_time) in reference.samples.iter().zip(&test.samples) {
        let value = match model {
            OverheadModel::PerThread { clamp_low } => {
                let raw = test_time - reference_time / f64::from(test.threads);

                if clamp_low && raw <= 1.0 { 1.0 } else { raw }
            }
            OverheadModel::Direct => test_time - reference_time,
        };

        overhead.samples.push(value);
    }

    overhead
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(reference_samples: Vec<f64>, test_samples: Vec<f64>, threads: u32) -> (Trial, Trial) {
        let reference = Trial {
            threads: 1,
            samples: reference_samples,
            ..Trial::default()
        };
        let test = Trial {
            threads,
            samples: test_samples,
            ..Trial::default()
        };

        (reference, test)
    }

    #[test]
    fn per_thread_model_scales_the_reference() {
        let (reference, test) = pair(vec![100.0, 200.0], vec![60.0, 110.0], 4);

        let overhead = derive(&reference, &test, OverheadModel::PerThread { clamp_low: false });

        assert_eq!(overhead.samples, vec![35.0, 60.0]);
    }

    #[test]
    fn direct_model_subtracts_without_scaling() {
        let (reference, test) = pair(vec![100.0, 200.0], vec![160.0, 210.0], 4);

        let overhead = derive(&reference, &test, OverheadModel::Direct);

        assert_eq!(overhead.samples, vec![60.0, 10.0]);
    }

    #[test]
    fn clamp_replaces_low_overhead_with_exactly_one() {
        let (reference, test) = pair(vec![20.0], vec![0.0], 4);

        let clamped = derive(&reference, &test, OverheadModel::PerThread { clamp_low: true });

        // Raw overhead is -5.0; clamped it must be exactly 1.0.
        assert_eq!(clamped.samples, vec![1.0]);
    }

    #[test]
    fn disabled_clamp_preserves_negative_overhead() {
        let (reference, test) = pair(vec![20.0], vec![0.0], 4);

        let raw = derive(&reference, &test, OverheadModel::PerThread { clamp_low: false });

        assert_eq!(raw.samples, vec![-5.0]);
    }

    #[test]
    fn clamp_never_applies_to_the_direct_model() {
        let (reference, test) = pair(vec![20.0], vec![15.0], 4);

        let overhead = derive(&reference, &test, OverheadModel::Direct);

        assert_eq!(overhead.samples, vec![-5.0]);
    }

    #[test]
    fn overhead_carries_the_test_records_axes() {
        let reference = Trial {
            threads: 1,
            workload: 2,
            samples: vec![10.0],
            ..Trial::default()
        };
        let test = Trial {
            threads: 8,
            workload: 2,
            iterations: 100,
            samples: vec![12.0],
            ..Trial::default()
        };

        let overhead = derive(&reference, &test, OverheadModel::Direct);

        assert_eq!(overhead.threads, 8);
        assert_eq!(overhead.iterations, 100);
    }

    #[test]
    #[should_panic(expected = "same number of samples")]
    fn mismatched_sample_counts_are_rejected() {
        let (reference, test) = pair(vec![1.0, 2.0], vec![1.0], 2);

        drop(derive(&reference, &test, OverheadModel::Direct));
    }
}
