//! Batched, seeded Monte Carlo execution
//!
//! Work is split into fixed-size batches, each with its own `SmallRng`. The
//! batch seeds are drawn from a master generator in batch order before any
//! batch runs, so results depend only on `(seed, batch_size)` and never on
//! thread scheduling or on whether the `parallel` feature is enabled.

use std::ops::Range;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::{Error, Result};

/// Split `0..total` into consecutive ranges of at most `batch_size`
pub(crate) fn batch_ranges(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..total.div_ceil(batch_size))
        .map(|i| {
            let start = i * batch_size;
            start..(start + batch_size).min(total)
        })
        .collect()
}

/// Per-batch seeds drawn in order from a master generator
pub(crate) fn batch_seeds(seed: u64, count: usize) -> Vec<u64> {
    let mut master = SmallRng::seed_from_u64(seed);
    (0..count).map(|_| master.random()).collect()
}

/// Run `work` once per batch and return the outputs in batch order.
///
/// `work` receives the index range it covers and a generator private to the
/// batch.
pub(crate) fn run_batches<T, F>(total: usize, batch_size: usize, seed: u64, work: F) -> Vec<T>
where
    T: Send,
    F: Fn(Range<usize>, &mut SmallRng) -> T + Sync + Send,
{
    let ranges = batch_ranges(total, batch_size);
    let seeds = batch_seeds(seed, ranges.len());
    let jobs: Vec<(Range<usize>, u64)> = ranges.into_iter().zip(seeds).collect();

    #[cfg(feature = "parallel")]
    let outputs: Vec<T> = jobs
        .into_par_iter()
        .map(|(range, batch_seed)| {
            let mut rng = SmallRng::seed_from_u64(batch_seed);
            work(range, &mut rng)
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outputs: Vec<T> = jobs
        .into_iter()
        .map(|(range, batch_seed)| {
            let mut rng = SmallRng::seed_from_u64(batch_seed);
            work(range, &mut rng)
        })
        .collect();

    outputs
}

/// [`run_batches`] for fallible work, stopping at the first error in batch order
pub(crate) fn try_run_batches<T, F>(
    total: usize,
    batch_size: usize,
    seed: u64,
    work: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(Range<usize>, &mut SmallRng) -> Result<T> + Sync + Send,
{
    run_batches(total, batch_size, seed, work)
        .into_iter()
        .collect()
}

/// Reject sizes that would produce an empty result
pub(crate) fn check_sizes(days: Option<usize>, sims: usize) -> Result<()> {
    if sims == 0 {
        return Err(Error::invalid_parameter("sims", "must be at least 1"));
    }
    if days == Some(0) {
        return Err(Error::invalid_parameter("days", "must be at least 1"));
    }
    Ok(())
}
