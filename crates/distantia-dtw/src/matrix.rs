//! Dense row-major matrices and the distance matrix between two sequences.

use std::ops::Index;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::distance::Distance;
use crate::error::DtwError;
use crate::sequence::Sequence;

/// Dense row-major `f64` matrix with at least one row and one column.
///
/// Holds distance matrices and cost matrices. Entry `(i, j)` relates row `i`
/// of the first sequence to row `j` of the second.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a matrix from a flat row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DtwError::InvalidMatrixShape`] if either dimension is zero or
    /// `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, DtwError> {
        if rows == 0 || cols == 0 || data.len() != rows * cols {
            return Err(DtwError::InvalidMatrixShape {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a matrix from pre-validated data.
    pub(crate) fn from_raw(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert!(rows > 0 && cols > 0);
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Return `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Return the value at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows` or `j >= cols`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.rows, "row index {i} out of bounds for {} rows", self.rows);
        assert!(j < self.cols, "column index {j} out of bounds for {} columns", self.cols);
        self.data[i * self.cols + j]
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.rows, "row index {i} out of bounds for {} rows", self.rows);
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterate over rows.
    pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.cols)
    }

    /// Borrow the flat row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume and return the flat row-major buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.data
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        &self.data[i * self.cols + j]
    }
}

/// Compute the distance between every row of `a` and every row of `b`.
///
/// Returns an `a.rows() x b.rows()` matrix. Rows are computed in parallel.
///
/// # Errors
///
/// Returns [`DtwError::ColumnMismatch`] if the sequences differ in column count.
#[instrument(skip(a, b), fields(a_rows = a.rows(), b_rows = b.rows()))]
pub fn distance_matrix(a: &Sequence, b: &Sequence, metric: Distance) -> Result<Matrix, DtwError> {
    check_columns(a, b)?;

    let n = a.rows();
    let m = b.rows();
    let mut data = vec![0.0; n * m];
    data.par_chunks_mut(m).enumerate().for_each(|(i, out)| {
        let row_a = a.row(i);
        for (j, cell) in out.iter_mut().enumerate() {
            *cell = metric.compute(row_a, b.row(j));
        }
    });

    debug!(n, m, %metric, "distance matrix computed");
    Ok(Matrix::from_raw(n, m, data))
}

/// Sum of distances between rows with the same index in `a` and `b`.
///
/// Lock-step comparison of two aligned sequences; no warping.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DtwError::ColumnMismatch`] | the sequences differ in column count |
/// | [`DtwError::RowMismatch`] | the sequences differ in row count |
pub fn lock_step_distance(a: &Sequence, b: &Sequence, metric: Distance) -> Result<f64, DtwError> {
    check_columns(a, b)?;
    if a.rows() != b.rows() {
        return Err(DtwError::RowMismatch {
            a_rows: a.rows(),
            b_rows: b.rows(),
        });
    }
    Ok(a.iter_rows()
        .zip(b.iter_rows())
        .map(|(x, y)| metric.compute(x, y))
        .sum())
}

pub(crate) fn check_columns(a: &Sequence, b: &Sequence) -> Result<(), DtwError> {
    if a.cols() != b.cols() {
        return Err(DtwError::ColumnMismatch {
            a_cols: a.cols(),
            b_cols: b.cols(),
        });
    }
    Ok(())
}
