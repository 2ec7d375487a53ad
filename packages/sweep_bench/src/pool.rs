//! Pre-warmed worker pool registry.
//!
//! Most parallel runtimes reuse worker threads once they exist, so only the
//! initial creation of a pool is very costly. Payloads and the runner's warm-up
//! both draw their pools from this registry, which keeps pool construction cost
//! out of every measured sample: the first request for a given thread count pays
//! for the construction, every later request reuses the same pool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use rayon::{ThreadPool, ThreadPoolBuilder};

static POOLS: OnceLock<Mutex<HashMap<u32, Arc<ThreadPool>>>> = OnceLock::new();

/// Returns the shared pool for the requested parallelism width, constructing it
/// on first use.
///
/// A width of zero requests one worker per available processor.
#[must_use]
pub fn pool_for(threads: u32) -> Arc<ThreadPool> {
    let pools = POOLS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut pools = pools.lock().expect("pool registry lock is never poisoned");

    Arc::clone(pools.entry(threads).or_insert_with(|| {
        Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(threads as usize)
                .build()
                .expect("pool construction only fails for thread counts the platform cannot provide"),
        )
    }))
}

/// Runs an empty region on the pool for the requested width, forcing its worker
/// threads into existence before a measurement window opens.
#[cfg_attr(test, mutants::skip)] // An empty broadcast has no observable effect to assert on.
pub fn warm_up(threads: u32) {
    pool_for(threads).broadcast(|_| ());
}

/// The number of processors available to this process.
#[cfg_attr(test, mutants::skip)] // The fallback fork cannot be reached on platforms that report parallelism.
#[must_use]
pub fn available_threads() -> u32 {
    std::thread::available_parallelism()
        .map(|count| u32::try_from(count.get()).expect("processor counts fit in u32"))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_has_requested_width() {
        let pool = pool_for(2);

        assert_eq!(pool.current_num_threads(), 2);
    }

    #[test]
    fn same_width_reuses_the_pool() {
        let first = pool_for(3);
        let second = pool_for(3);

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn warm_up_executes_on_workers() {
        // Must not deadlock or panic; the broadcast returning is the assertion.
        warm_up(2);
    }

    #[test]
    fn at_least_one_processor_is_reported() {
        assert!(available_threads() >= 1);
    }
}
