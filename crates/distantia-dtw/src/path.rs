//! Least-cost path types, backtracking, and block trimming.

use tracing::{debug, instrument};

use crate::constraint::BandConstraint;
use crate::distance::Distance;
use crate::error::DtwError;
use crate::matrix::{Matrix, check_columns};
use crate::sequence::Sequence;

/// A single cell of a least-cost path, mapping row `a` of the first sequence
/// to row `b` of the second. Indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStep {
    /// Row in the first sequence.
    pub a: usize,
    /// Row in the second sequence.
    pub b: usize,
    /// Distance between the two rows.
    pub dist: f64,
    /// Accumulated cost at this cell.
    pub cost: f64,
}

/// One-based presentation of a [`PathStep`] for tabular output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathRecord {
    /// One-based row in the first sequence.
    pub a: usize,
    /// One-based row in the second sequence.
    pub b: usize,
    /// Distance between the two rows.
    pub dist: f64,
    /// Accumulated cost at this cell.
    pub cost: f64,
}

/// Least-cost path ordered from the terminal cell back to the origin.
///
/// Consecutive steps never increase either index and change each index by at
/// most one.
#[derive(Debug, Clone, PartialEq)]
pub struct CostPath(Vec<PathStep>);

impl CostPath {
    pub(crate) fn new(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }

    /// Return the steps as a slice.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Return the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the path has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of the step distances.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.0.iter().map(|s| s.dist).sum()
    }

    /// Return a copy with block interiors removed.
    ///
    /// A step is dropped when it sits strictly inside a run of three or more
    /// consecutive steps sharing the same `a` index, or the same `b` index.
    /// Endpoints of the path are always kept.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        let steps = &self.0;
        let n = steps.len();
        let interior = |i: usize, key: fn(&PathStep) -> usize| {
            i > 0 && i + 1 < n && key(&steps[i]) == key(&steps[i - 1]) && key(&steps[i]) == key(&steps[i + 1])
        };
        let kept = steps
            .iter()
            .enumerate()
            .filter(|&(i, _)| !interior(i, |s| s.a) && !interior(i, |s| s.b))
            .map(|(_, s)| *s)
            .collect();
        Self(kept)
    }

    /// Row indices of the first sequence, in path order.
    pub fn a_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|s| s.a)
    }

    /// Row indices of the second sequence, in path order.
    pub fn b_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|s| s.b)
    }

    /// One-based records for output.
    #[must_use]
    pub fn records(&self) -> Vec<PathRecord> {
        self.0
            .iter()
            .map(|s| PathRecord {
                a: s.a + 1,
                b: s.b + 1,
                dist: s.dist,
                cost: s.cost,
            })
            .collect()
    }

    /// Return a path over the same cells with distances recomputed between
    /// the rows of `a` and `b`. Costs are reset to zero.
    ///
    /// Used to score a column subset along a path found on the full sequences.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::ColumnMismatch`] | the sequences differ in column count |
    /// | [`DtwError::PathOutOfBounds`] | a step references a row missing from `a` or `b` |
    pub fn with_distances(&self, a: &Sequence, b: &Sequence, metric: Distance) -> Result<Self, DtwError> {
        check_columns(a, b)?;
        self.0
            .iter()
            .map(|s| {
                if s.a >= a.rows() || s.b >= b.rows() {
                    return Err(DtwError::PathOutOfBounds {
                        a: s.a,
                        b: s.b,
                        a_rows: a.rows(),
                        b_rows: b.rows(),
                    });
                }
                Ok(PathStep {
                    a: s.a,
                    b: s.b,
                    dist: metric.compute(a.row(s.a), b.row(s.b)),
                    cost: 0.0,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl<'a> IntoIterator for &'a CostPath {
    type Item = &'a PathStep;
    type IntoIter = std::slice::Iter<'a, PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Backtrack the least-cost path from the terminal cell to the origin.
///
/// At each cell the path moves to the in-bounds, in-band neighbour with the
/// strictly lowest accumulated cost; ties go to the first candidate in this
/// order:
///
/// | Moves | Candidates |
/// |---|---|
/// | orthogonal | `(r-1, c)`, `(r, c-1)` |
/// | diagonal | `(r-1, c-1)`, `(r-1, c)`, `(r, c-1)` |
///
/// The path stops when no candidate remains, which is the origin unless the
/// band excludes every neighbour first.
///
/// # Errors
///
/// Returns [`DtwError::ShapeMismatch`] if `dist` and `cost` differ in shape.
#[instrument(skip(dist, cost), fields(rows = dist.rows(), cols = dist.cols()))]
pub fn cost_path(
    dist: &Matrix,
    cost: &Matrix,
    diagonal: bool,
    band: BandConstraint,
) -> Result<CostPath, DtwError> {
    if dist.shape() != cost.shape() {
        return Err(DtwError::ShapeMismatch {
            dist_rows: dist.rows(),
            dist_cols: dist.cols(),
            cost_rows: cost.rows(),
            cost_cols: cost.cols(),
        });
    }

    let rows = dist.rows();
    let cols = dist.cols();
    let mut steps = Vec::with_capacity(rows + cols);
    let (mut r, mut c) = (rows - 1, cols - 1);

    loop {
        steps.push(PathStep {
            a: r,
            b: c,
            dist: dist[(r, c)],
            cost: cost[(r, c)],
        });

        let up = r.checked_sub(1).map(|r1| (r1, c));
        let left = c.checked_sub(1).map(|c1| (r, c1));
        let diag = if diagonal {
            r.checked_sub(1).zip(c.checked_sub(1))
        } else {
            None
        };

        let mut best: Option<((usize, usize), f64)> = None;
        for (i, j) in [diag, up, left].into_iter().flatten() {
            if !band.allows(i, j, rows, cols) {
                continue;
            }
            let candidate = cost[(i, j)];
            if best.is_none_or(|(_, lowest)| candidate < lowest) {
                best = Some(((i, j), candidate));
            }
        }

        match best {
            Some(((i, j), _)) => (r, c) = (i, j),
            None => break,
        }
    }

    debug!(len = steps.len(), end_a = r, end_b = c, "cost path traced");
    Ok(CostPath::new(steps))
}

/// Remove block interiors from `path`. See [`CostPath::trimmed`].
#[must_use]
pub fn trim_path(path: &CostPath) -> CostPath {
    path.trimmed()
}

/// Sum of the step distances of `path`.
#[must_use]
pub fn path_sum(path: &CostPath) -> f64 {
    path.sum()
}
