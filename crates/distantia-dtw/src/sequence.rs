//! Multivariate sequence type with validation guarantees.

use std::collections::HashSet;

use crate::error::DtwError;
use crate::matrix::Matrix;

/// Owned, validated multivariate time series.
///
/// Rows are observations in time order, columns are variables. Guaranteed to
/// have at least one row and one column, all values finite, and exactly one
/// name per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    values: Matrix,
    names: Vec<String>,
}

impl Sequence {
    /// Create a sequence from a vector of rows.
    ///
    /// Columns are named `x1, x2, ...`; use [`with_column_names`][Self::with_column_names]
    /// to override them.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::EmptySequence`] | `rows` is empty |
    /// | [`DtwError::NoColumns`] | the first row is empty |
    /// | [`DtwError::RaggedRow`] | a row differs in length from the first row |
    /// | [`DtwError::NonFiniteValue`] | any value is NaN or infinite |
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, DtwError> {
        let first = rows.first().ok_or(DtwError::EmptySequence)?;
        let n_cols = first.len();
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n_cols {
                return Err(DtwError::RaggedRow {
                    row,
                    expected: n_cols,
                    got: values.len(),
                });
            }
            data.extend_from_slice(values);
        }
        Self::from_row_major(rows.len(), n_cols, data)
    }

    /// Create a sequence from a flat row-major buffer.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::EmptySequence`] | `n_rows` is zero |
    /// | [`DtwError::NoColumns`] | `n_cols` is zero |
    /// | [`DtwError::RaggedRow`] | `data.len()` is not `n_rows * n_cols` |
    /// | [`DtwError::NonFiniteValue`] | any value is NaN or infinite |
    pub fn from_row_major(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Result<Self, DtwError> {
        if n_rows == 0 {
            return Err(DtwError::EmptySequence);
        }
        if n_cols == 0 {
            return Err(DtwError::NoColumns);
        }
        if data.len() != n_rows * n_cols {
            return Err(DtwError::RaggedRow {
                row: data.len() / n_cols,
                expected: n_cols,
                got: data.len() % n_cols,
            });
        }
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(DtwError::NonFiniteValue {
                row: index / n_cols,
                col: index % n_cols,
            });
        }
        Ok(Self::from_matrix_unchecked(Matrix::from_raw(n_rows, n_cols, data)))
    }

    /// Wrap an already validated matrix, assigning default column names.
    pub(crate) fn from_matrix_unchecked(values: Matrix) -> Self {
        let names = default_names(values.cols());
        Self { values, names }
    }

    /// Replace the column names.
    ///
    /// # Errors
    ///
    /// Returns [`DtwError::ColumnNameMismatch`] if `names.len()` differs from the column count.
    pub fn with_column_names(mut self, names: Vec<String>) -> Result<Self, DtwError> {
        if names.len() != self.cols() {
            return Err(DtwError::ColumnNameMismatch {
                names: names.len(),
                cols: self.cols(),
            });
        }
        self.names = names;
        Ok(self)
    }

    /// Number of observations.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.values.rows()
    }

    /// Number of variables.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.values.cols()
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows()`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        self.values.row(i)
    }

    /// Iterate over rows in time order.
    pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.values.iter_rows()
    }

    /// Column names, one per column.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Borrow the underlying values.
    #[must_use]
    pub fn as_matrix(&self) -> &Matrix {
        &self.values
    }

    /// Return a single-column copy holding column `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DtwError::ColumnOutOfBounds`] if `index >= cols()`.
    pub fn select_column(&self, index: usize) -> Result<Self, DtwError> {
        self.check_column(index)?;
        let data: Vec<f64> = self.iter_rows().map(|row| row[index]).collect();
        Ok(Self {
            values: Matrix::from_raw(self.rows(), 1, data),
            names: vec![self.names[index].clone()],
        })
    }

    /// Return a copy without column `index`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::ColumnOutOfBounds`] | `index >= cols()` |
    /// | [`DtwError::NoColumns`] | the sequence has a single column |
    pub fn delete_column(&self, index: usize) -> Result<Self, DtwError> {
        self.check_column(index)?;
        let n_cols = self.cols() - 1;
        if n_cols == 0 {
            return Err(DtwError::NoColumns);
        }
        let mut data = Vec::with_capacity(self.rows() * n_cols);
        for row in self.iter_rows() {
            data.extend(
                row.iter()
                    .enumerate()
                    .filter(|&(k, _)| k != index)
                    .map(|(_, &v)| v),
            );
        }
        let names = self
            .names
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != index)
            .map(|(_, name)| name.clone())
            .collect();
        Ok(Self {
            values: Matrix::from_raw(self.rows(), n_cols, data),
            names,
        })
    }

    /// Return a copy holding the given rows, keeping only the first occurrence
    /// of each index and preserving the order in which they appear.
    ///
    /// Indices past the last row are ignored. Returns `None` when no index
    /// selects a row.
    #[must_use]
    pub fn select_unique_rows(&self, indices: impl IntoIterator<Item = usize>) -> Option<Self> {
        let mut seen = HashSet::new();
        let mut data = Vec::new();
        let mut n_rows = 0;
        for i in indices {
            if i < self.rows() && seen.insert(i) {
                data.extend_from_slice(self.row(i));
                n_rows += 1;
            }
        }
        (n_rows > 0).then(|| Self {
            values: Matrix::from_raw(n_rows, self.cols(), data),
            names: self.names.clone(),
        })
    }

    fn check_column(&self, index: usize) -> Result<(), DtwError> {
        if index >= self.cols() {
            return Err(DtwError::ColumnOutOfBounds {
                index,
                cols: self.cols(),
            });
        }
        Ok(())
    }
}

impl TryFrom<Vec<Vec<f64>>> for Sequence {
    type Error = DtwError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

fn default_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("x{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> Sequence {
        Sequence::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])
        .unwrap()
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(Sequence::from_rows(&[]), Err(DtwError::EmptySequence)));
    }

    #[test]
    fn rejects_no_columns() {
        assert!(matches!(
            Sequence::from_rows(&[vec![], vec![]]),
            Err(DtwError::NoColumns)
        ));
    }

    #[test]
    fn rejects_ragged_rows() {
        let result = Sequence::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(
            result,
            Err(DtwError::RaggedRow { row: 1, expected: 2, got: 1 })
        ));
    }

    #[test]
    fn rejects_nan_with_position() {
        let result = Sequence::from_rows(&[vec![1.0, 2.0], vec![3.0, f64::NAN]]);
        assert!(matches!(result, Err(DtwError::NonFiniteValue { row: 1, col: 1 })));
    }

    #[test]
    fn rejects_infinity() {
        let result = Sequence::from_row_major(1, 2, vec![f64::NEG_INFINITY, 0.0]);
        assert!(matches!(result, Err(DtwError::NonFiniteValue { row: 0, col: 0 })));
    }

    #[test]
    fn default_and_custom_names() {
        let s = seq();
        assert_eq!(s.column_names(), &["x1", "x2", "x3"]);
        let named = s
            .with_column_names(vec!["a".into(), "b".into(), "c".into()])
            .unwrap();
        assert_eq!(named.column_names()[1], "b");
    }

    #[test]
    fn rejects_wrong_name_count() {
        let result = seq().with_column_names(vec!["a".into()]);
        assert!(matches!(
            result,
            Err(DtwError::ColumnNameMismatch { names: 1, cols: 3 })
        ));
    }

    #[test]
    fn select_and_delete_column() {
        let s = seq();
        let only = s.select_column(1).unwrap();
        assert_eq!(only.cols(), 1);
        assert_eq!(only.row(2), &[8.0]);
        assert_eq!(only.column_names(), &["x2"]);

        let without = s.delete_column(1).unwrap();
        assert_eq!(without.cols(), 2);
        assert_eq!(without.row(0), &[1.0, 3.0]);
        assert_eq!(without.column_names(), &["x1", "x3"]);
    }

    #[test]
    fn column_out_of_bounds() {
        assert!(matches!(
            seq().select_column(3),
            Err(DtwError::ColumnOutOfBounds { index: 3, cols: 3 })
        ));
    }

    #[test]
    fn delete_last_column_fails() {
        let single = seq().select_column(0).unwrap();
        assert!(matches!(single.delete_column(0), Err(DtwError::NoColumns)));
    }

    #[test]
    fn unique_rows_keep_first_occurrence_order() {
        let s = seq();
        let subset = s.select_unique_rows([2, 2, 0, 2, 0, 1]).unwrap();
        assert_eq!(subset.rows(), 3);
        assert_eq!(subset.row(0), &[7.0, 8.0, 9.0]);
        assert_eq!(subset.row(1), &[1.0, 2.0, 3.0]);
        assert_eq!(subset.row(2), &[4.0, 5.0, 6.0]);
        assert!(s.select_unique_rows([]).is_none());
    }
}
