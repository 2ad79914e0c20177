/// Uniform sampling without replacement over a pluggable random source.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot sample {requested} items from {available}")]
pub struct SampleError {
    pub requested: usize,
    pub available: usize,
}

/// Draw `k` distinct items uniformly at random, in random order.
pub fn sample_without_replacement<'a, T, R>(
    items: &'a [T],
    k: usize,
    rng: &mut R,
) -> Result<Vec<&'a T>, SampleError>
where
    R: Rng,
{
    if k > items.len() {
        return Err(SampleError {
            requested: k,
            available: items.len(),
        });
    }
    Ok(items.choose_multiple(rng, k).collect())
}

/// Draw a random subset whose size is uniform in `1..=items.len()`.
/// Empty input yields an empty subset.
pub fn sample_nonempty_subset<'a, T, R>(
    items: &'a [T],
    rng: &mut R,
) -> Result<Vec<&'a T>, SampleError>
where
    R: Rng,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let k = rng.gen_range(1..=items.len());
    sample_without_replacement(items, k, rng)
}
