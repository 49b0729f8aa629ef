//! Seeded row shuffles used to build null distributions of psi.

use std::fmt;
use std::str::FromStr;

use distantia_dtw::Sequence;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::AnalysisError;

/// Row-shuffling policy.
///
/// "By row" policies move whole rows and keep the values of each observation
/// together; the others shuffle every column independently. "Restricted"
/// policies only exchange rows within contiguous blocks of `block_size` rows,
/// while "free" policies treat the whole sequence as a single block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Permutation {
    /// Independent shuffle of each column over the whole sequence.
    Free,
    /// Shuffle of whole rows over the whole sequence.
    FreeByRow,
    /// Independent shuffle of each column within blocks.
    Restricted,
    /// Shuffle of whole rows within blocks.
    #[default]
    RestrictedByRow,
}

impl Permutation {
    /// All policies.
    pub const ALL: [Permutation; 4] = [
        Permutation::Free,
        Permutation::FreeByRow,
        Permutation::Restricted,
        Permutation::RestrictedByRow,
    ];

    /// Canonical name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::FreeByRow => "free_by_row",
            Self::Restricted => "restricted",
            Self::RestrictedByRow => "restricted_by_row",
        }
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Permutation {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(key))
            .ok_or_else(|| AnalysisError::UnknownPermutation { name: s.to_string() })
    }
}

/// Return a shuffled copy of `seq`.
///
/// Walks each block forward: row `j` is exchanged with a uniformly drawn row
/// in `j..block_end`. Row policies draw one target per row; column policies
/// draw one target per cell. `block_size` is clamped to `[2, rows]` and
/// ignored by the free policies. Sequences with fewer than two rows are
/// returned unchanged. Column names are kept.
///
/// The same `(seq, permutation, block_size, seed)` always gives the same output.
///
/// # Errors
///
/// Returns [`AnalysisError::Dtw`] if the shuffled values cannot form a sequence,
/// which does not happen for a valid input.
pub fn permute(
    seq: &Sequence,
    permutation: Permutation,
    block_size: usize,
    seed: u64,
) -> Result<Sequence, AnalysisError> {
    let rows = seq.rows();
    if rows < 2 {
        return Ok(seq.clone());
    }

    let cols = seq.cols();
    let mut data = seq.as_matrix().as_slice().to_vec();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let block = match permutation {
        Permutation::Free | Permutation::FreeByRow => rows,
        Permutation::Restricted | Permutation::RestrictedByRow => block_size.clamp(2, rows),
    };
    let by_row = matches!(permutation, Permutation::FreeByRow | Permutation::RestrictedByRow);

    for start in (0..rows).step_by(block) {
        let end = (start + block).min(rows);
        for j in start..end.saturating_sub(1) {
            if by_row {
                let target = rng.gen_range(j..end);
                swap_cells(&mut data, cols, j, target, 0..cols);
            } else {
                for k in 0..cols {
                    let target = rng.gen_range(j..end);
                    swap_cells(&mut data, cols, j, target, k..k + 1);
                }
            }
        }
    }

    let permuted =
        Sequence::from_row_major(rows, cols, data)?.with_column_names(seq.column_names().to_vec())?;
    Ok(permuted)
}

fn swap_cells(data: &mut [f64], cols: usize, i: usize, j: usize, columns: std::ops::Range<usize>) {
    if i == j {
        return;
    }
    for k in columns {
        data.swap(i * cols + k, j * cols + k);
    }
}
