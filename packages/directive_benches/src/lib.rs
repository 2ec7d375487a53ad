//! Shared payload building blocks for the benchmark binaries.
//!
//! Every binary measures the same synthetic compute kernel under different
//! parallel constructs, so the kernel lives here. It must be opaque to the
//! optimizer: if the delay loop were hoisted or folded away, every measured
//! construct would degenerate to its bare dispatch cost.

use std::hint::black_box;

/// Burns CPU time proportional to `workload`.
///
/// The accumulator depends on the iteration index so no two iterations are
/// provably identical to the optimizer.
#[inline]
pub fn delay(iteration: u64, workload: u64) {
    let mut accumulator = 0.0_f32;

    for _ in 0..workload {
        accumulator += iteration as f32;
    }

    black_box(accumulator);
}

/// Burns CPU time proportional to `workload` and returns the accumulated
/// value, for constructs that need a value to combine.
#[inline]
#[must_use]
pub fn delay_value(iteration: u64, workload: u64) -> f32 {
    let mut accumulator = 0.0_f32;

    for _ in 0..workload {
        accumulator += iteration as f32;
    }

    black_box(accumulator)
}

/// Burns CPU time proportional to `workload`, accumulating into a slot of a
/// staged buffer.
#[inline]
pub fn array_delay(iteration: u64, workload: u64, slot: &mut f32) {
    for _ in 0..workload {
        *slot += iteration as f32;
    }

    black_box(slot);
}

/// Prints the standard run banner unless quiet mode was selected.
pub fn banner(binary: &str, quiet: bool) {
    if !quiet {
        println!("{binary} {}", env!("CARGO_PKG_VERSION"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_value_scales_with_workload() {
        assert_eq!(delay_value(2, 3), 6.0);
        assert_eq!(delay_value(5, 0), 0.0);
    }

    #[test]
    fn array_delay_accumulates_into_the_slot() {
        let mut slot = 1.0;

        array_delay(3, 2, &mut slot);

        assert_eq!(slot, 7.0);
    }
}
