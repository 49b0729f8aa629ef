//! Null distribution of psi under seeded row permutations.

use distantia_dtw::{Distance, DtwConfig, DtwError, Sequence, psi_lock_step};
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::error::AnalysisError;
use crate::permute::{Permutation, permute};

/// Configuration for a permutation null distribution.
///
/// Construct via [`NullConfig::new`] (or `Default`), then chain `with_*`
/// methods to override defaults.
///
/// # Defaults
///
/// | Parameter     | Default                         |
/// |---------------|---------------------------------|
/// | `permutation` | `Permutation::RestrictedByRow`  |
/// | `block_size`  | 3                               |
/// | `seed`        | 1                               |
/// | `repetitions` | 100                             |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullConfig {
    permutation: Permutation,
    block_size: usize,
    seed: u64,
    repetitions: usize,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl NullConfig {
    /// Create a configuration with the documented defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            permutation: Permutation::RestrictedByRow,
            block_size: 3,
            seed: 1,
            repetitions: 100,
        }
    }

    /// Set the row-shuffling policy.
    #[must_use]
    pub fn with_permutation(mut self, permutation: Permutation) -> Self {
        self.permutation = permutation;
        self
    }

    /// Set the block size used by the restricted policies.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the base seed. Replicate `i` permutes the first sequence with
    /// `seed + i` and the second with `seed + i + 1`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of values returned, the unpermuted psi included.
    #[must_use]
    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Return the row-shuffling policy.
    #[must_use]
    pub fn permutation(&self) -> Permutation {
        self.permutation
    }

    /// Return the block size.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Return the base seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the number of values returned.
    #[must_use]
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Compute the DTW psi null distribution of `a` and `b`.
    ///
    /// Element 0 is the psi of the unpermuted sequences; every other element
    /// is the psi of one pair of permuted copies. Replicates run in parallel
    /// and each owns its generator, so the output does not depend on the
    /// thread count.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AnalysisError::InvalidRepetitions`] | `repetitions` is zero |
    /// | [`AnalysisError::Dtw`] | the sequences differ in column count |
    #[instrument(skip(self, a, b, dtw), fields(permutation = %self.permutation, repetitions = self.repetitions))]
    pub fn run(&self, a: &Sequence, b: &Sequence, dtw: &DtwConfig) -> Result<Vec<f64>, AnalysisError> {
        let null = self.replicate(a, b, |x, y| dtw.psi(x, y))?;
        info!(observed = null[0], replicates = null.len() - 1, "null distribution computed");
        Ok(null)
    }

    /// Compute the lock-step psi null distribution of `a` and `b`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AnalysisError::InvalidRepetitions`] | `repetitions` is zero |
    /// | [`AnalysisError::Dtw`] | the sequences differ in shape |
    #[instrument(skip(self, a, b), fields(permutation = %self.permutation, repetitions = self.repetitions))]
    pub fn run_lock_step(
        &self,
        a: &Sequence,
        b: &Sequence,
        metric: Distance,
    ) -> Result<Vec<f64>, AnalysisError> {
        let null = self.replicate(a, b, |x, y| psi_lock_step(x, y, metric))?;
        info!(observed = null[0], replicates = null.len() - 1, "lock-step null distribution computed");
        Ok(null)
    }

    fn replicate<F>(&self, a: &Sequence, b: &Sequence, score: F) -> Result<Vec<f64>, AnalysisError>
    where
        F: Fn(&Sequence, &Sequence) -> Result<f64, DtwError> + Sync,
    {
        if self.repetitions == 0 {
            return Err(AnalysisError::InvalidRepetitions {
                repetitions: self.repetitions,
            });
        }

        let observed = score(a, b)?;
        let permuted: Vec<f64> = (1..self.repetitions)
            .into_par_iter()
            .map(|i| -> Result<f64, AnalysisError> {
                let seed = self.seed.wrapping_add(i as u64);
                let a_i = permute(a, self.permutation, self.block_size, seed)?;
                let b_i = permute(b, self.permutation, self.block_size, seed.wrapping_add(1))?;
                Ok(score(&a_i, &b_i)?)
            })
            .collect::<Result<_, _>>()?;

        let mut null = Vec::with_capacity(self.repetitions);
        null.push(observed);
        null.extend(permuted);
        Ok(null)
    }
}

/// Null distribution of DTW psi with metric and permutation selected by name.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AnalysisError::Dtw`] | unknown metric, or the sequences differ in column count |
/// | [`AnalysisError::UnknownPermutation`] | `permutation` is not a known policy |
/// | [`AnalysisError::InvalidRepetitions`] | `repetitions` is zero |
#[allow(clippy::too_many_arguments)]
pub fn null_psi(
    a: &Sequence,
    b: &Sequence,
    metric: &str,
    diagonal: bool,
    weighted: bool,
    trim_blocks: bool,
    permutation: &str,
    block_size: usize,
    seed: u64,
    repetitions: usize,
) -> Result<Vec<f64>, AnalysisError> {
    let dtw = DtwConfig::new()
        .with_distance(metric.parse()?)
        .with_diagonal(diagonal)
        .with_weighted(weighted)
        .with_trim_blocks(trim_blocks);
    NullConfig::new()
        .with_permutation(permutation.parse()?)
        .with_block_size(block_size)
        .with_seed(seed)
        .with_repetitions(repetitions)
        .run(a, b, &dtw)
}

/// Null distribution of lock-step psi. See [`NullConfig::run_lock_step`].
///
/// # Errors
///
/// Same as [`NullConfig::run_lock_step`].
pub fn null_psi_lock_step(
    a: &Sequence,
    b: &Sequence,
    metric: Distance,
    null: &NullConfig,
) -> Result<Vec<f64>, AnalysisError> {
    null.run_lock_step(a, b, metric)
}
