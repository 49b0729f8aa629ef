//! Error types for sequence validation and DTW computation.

/// Errors from sequence construction, distance selection, and DTW computation.
///
/// Numeric degeneracies (NaN from a chi zero pair, division by a zero
/// auto-sum) are not errors: they propagate as IEEE values.
#[derive(Debug, thiserror::Error)]
pub enum DtwError {
    /// Returned when a distance name or abbreviation is not in the catalog.
    #[error("unknown distance \"{name}\" (expected one of: {expected})")]
    UnknownDistance {
        /// The name that failed to parse.
        name: String,
        /// Comma-separated list of valid names.
        expected: &'static str,
    },

    /// Returned when a cost policy name is not recognised.
    #[error("unknown cost policy \"{name}\" (expected one of: orthogonal, diagonal, weighted_diagonal)")]
    UnknownCostPolicy {
        /// The name that failed to parse.
        name: String,
    },

    /// Returned when two vectors handed to a distance function differ in length.
    #[error("vectors must have the same length, got {x_len} and {y_len}")]
    LengthMismatch {
        /// Length of the first vector.
        x_len: usize,
        /// Length of the second vector.
        y_len: usize,
    },

    /// Returned when two sequences have a different number of columns.
    #[error("sequences must have the same number of columns, got {a_cols} and {b_cols}")]
    ColumnMismatch {
        /// Column count of the first sequence.
        a_cols: usize,
        /// Column count of the second sequence.
        b_cols: usize,
    },

    /// Returned when a lock-step comparison receives sequences of different length.
    #[error("lock-step comparison requires the same number of rows, got {a_rows} and {b_rows}")]
    RowMismatch {
        /// Row count of the first sequence.
        a_rows: usize,
        /// Row count of the second sequence.
        b_rows: usize,
    },

    /// Returned when a distance matrix and a cost matrix differ in shape.
    #[error("distance matrix is {dist_rows}x{dist_cols} but cost matrix is {cost_rows}x{cost_cols}")]
    ShapeMismatch {
        /// Rows of the distance matrix.
        dist_rows: usize,
        /// Columns of the distance matrix.
        dist_cols: usize,
        /// Rows of the cost matrix.
        cost_rows: usize,
        /// Columns of the cost matrix.
        cost_cols: usize,
    },

    /// Returned when a flat buffer does not hold `rows * cols` values.
    #[error("buffer of {len} values cannot form a {rows}x{cols} matrix")]
    InvalidMatrixShape {
        /// Requested number of rows.
        rows: usize,
        /// Requested number of columns.
        cols: usize,
        /// Length of the provided buffer.
        len: usize,
    },

    /// Returned when a sequence has no rows.
    #[error("sequence must have at least one row")]
    EmptySequence,

    /// Returned when a sequence has rows but no columns.
    #[error("sequence must have at least one column")]
    NoColumns,

    /// Returned when a row has a different number of values than the first row.
    #[error("row {row} has {got} values, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Number of values in the first row.
        expected: usize,
        /// Number of values in the offending row.
        got: usize,
    },

    /// Returned when a sequence contains NaN, infinity, or negative infinity.
    #[error("sequence contains non-finite value at row {row}, column {col}")]
    NonFiniteValue {
        /// Zero-based row of the first non-finite value.
        row: usize,
        /// Zero-based column of the first non-finite value.
        col: usize,
    },

    /// Returned when the number of column names differs from the number of columns.
    #[error("got {names} column names for {cols} columns")]
    ColumnNameMismatch {
        /// Number of names provided.
        names: usize,
        /// Number of columns in the sequence.
        cols: usize,
    },

    /// Returned when a column index is outside the sequence.
    #[error("column {index} out of bounds for sequence with {cols} columns")]
    ColumnOutOfBounds {
        /// The requested column.
        index: usize,
        /// Number of columns in the sequence.
        cols: usize,
    },

    /// Returned when a Sakoe-Chiba bandwidth is outside `[0, 1]`.
    #[error("bandwidth must be in [0, 1], got {bandwidth}")]
    InvalidBandwidth {
        /// The rejected bandwidth.
        bandwidth: f64,
    },

    /// Returned when a path step references a row missing from a sequence.
    #[error("path step ({a}, {b}) is outside sequences with {a_rows} and {b_rows} rows")]
    PathOutOfBounds {
        /// Zero-based row in the first sequence.
        a: usize,
        /// Zero-based row in the second sequence.
        b: usize,
        /// Row count of the first sequence.
        a_rows: usize,
        /// Row count of the second sequence.
        b_rows: usize,
    },
}
