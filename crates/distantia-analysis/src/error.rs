use distantia_dtw::DtwError;

/// Errors from permutation, null distribution, and importance analyses.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Returned when a permutation name is not recognised.
    #[error(
        "unknown permutation \"{name}\" (expected one of: free, free_by_row, restricted, restricted_by_row)"
    )]
    UnknownPermutation {
        /// The name that failed to parse.
        name: String,
    },

    /// Returned when a null distribution is requested with zero repetitions.
    #[error("repetitions must be at least 1, got {repetitions}")]
    InvalidRepetitions {
        /// The invalid repetitions value provided.
        repetitions: usize,
    },

    /// Returned when an importance analysis gets fewer than two columns.
    #[error("importance requires at least 2 columns, got {cols}")]
    TooFewColumns {
        /// Number of columns in the sequences.
        cols: usize,
    },

    /// Wraps a DTW error encountered while computing psi.
    #[error("DTW error during analysis: {0}")]
    Dtw(#[from] DtwError),
}
