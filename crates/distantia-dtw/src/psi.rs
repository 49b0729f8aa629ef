//! Psi dissimilarity score and the DTW pipeline configuration.

use tracing::{debug, instrument};

use crate::auto_sum::{auto_sum, auto_sum_full};
use crate::constraint::BandConstraint;
use crate::cost::{CostPolicy, cost_matrix};
use crate::distance::Distance;
use crate::error::DtwError;
use crate::matrix::{Matrix, distance_matrix, lock_step_distance};
use crate::path::{CostPath, cost_path};
use crate::sequence::Sequence;

/// Combine a path sum and an auto-sum into psi.
///
/// `psi = (2 * path_sum - auto_sum) / auto_sum`, plus one when the cost
/// matrix allowed diagonal moves. A zero auto-sum yields NaN or infinity.
#[must_use]
pub fn psi_equation(path_sum: f64, auto_sum: f64, diagonal: bool) -> f64 {
    let psi = (2.0 * path_sum - auto_sum) / auto_sum;
    if diagonal { psi + 1.0 } else { psi }
}

/// Psi of two equal-length sequences compared row by row, without warping.
///
/// `psi = (lock_step_distance - auto_sum) / auto_sum + 1`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DtwError::ColumnMismatch`] | the sequences differ in column count |
/// | [`DtwError::RowMismatch`] | the sequences differ in row count |
pub fn psi_lock_step(a: &Sequence, b: &Sequence, metric: Distance) -> Result<f64, DtwError> {
    let dist = lock_step_distance(a, b, metric)?;
    let auto = auto_sum_full(a, b, metric);
    Ok((dist - auto) / auto + 1.0)
}

/// Configuration of the DTW psi pipeline.
///
/// Construct via [`DtwConfig::new`] (or `Default`), then chain `with_*`
/// methods to override defaults.
///
/// # Defaults
///
/// | Parameter     | Default                          |
/// |---------------|----------------------------------|
/// | `distance`    | `Distance::Euclidean`            |
/// | `diagonal`    | true                             |
/// | `weighted`    | true                             |
/// | `trim_blocks` | false                            |
/// | `band`        | `BandConstraint::Unconstrained`  |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DtwConfig {
    distance: Distance,
    diagonal: bool,
    weighted: bool,
    trim_blocks: bool,
    band: BandConstraint,
}

impl Default for DtwConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DtwConfig {
    /// Create a configuration with the documented defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            distance: Distance::Euclidean,
            diagonal: true,
            weighted: true,
            trim_blocks: false,
            band: BandConstraint::Unconstrained,
        }
    }

    /// Set the row distance metric.
    #[must_use]
    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    /// Allow or forbid diagonal moves.
    #[must_use]
    pub fn with_diagonal(mut self, diagonal: bool) -> Self {
        self.diagonal = diagonal;
        self
    }

    /// Weight diagonal moves by [`DIAGONAL_WEIGHT`](crate::DIAGONAL_WEIGHT).
    /// Enabling weighting also enables diagonal moves.
    #[must_use]
    pub fn with_weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    /// Remove block interiors from the path before scoring.
    #[must_use]
    pub fn with_trim_blocks(mut self, trim_blocks: bool) -> Self {
        self.trim_blocks = trim_blocks;
        self
    }

    /// Restrict the path to a band around the diagonal.
    #[must_use]
    pub fn with_band(mut self, band: BandConstraint) -> Self {
        self.band = band;
        self
    }

    /// Return the row distance metric.
    #[must_use]
    pub fn distance(&self) -> Distance {
        self.distance
    }

    /// Return the cost-matrix policy implied by the `diagonal` and `weighted` flags.
    #[must_use]
    pub fn policy(&self) -> CostPolicy {
        CostPolicy::from_flags(self.diagonal, self.weighted)
    }

    /// Return whether diagonal moves are allowed, accounting for `weighted`.
    #[must_use]
    pub fn diagonal(&self) -> bool {
        self.policy().uses_diagonal()
    }

    /// Return whether diagonal moves are weighted.
    #[must_use]
    pub fn weighted(&self) -> bool {
        self.weighted
    }

    /// Return whether block interiors are trimmed.
    #[must_use]
    pub fn trim_blocks(&self) -> bool {
        self.trim_blocks
    }

    /// Return the band constraint.
    #[must_use]
    pub fn band(&self) -> BandConstraint {
        self.band
    }

    /// Run the full pipeline and keep every intermediate product.
    ///
    /// # Errors
    ///
    /// Returns [`DtwError::ColumnMismatch`] if the sequences differ in column count.
    #[instrument(skip(self, a, b), fields(a_rows = a.rows(), b_rows = b.rows(), distance = %self.distance))]
    pub fn align(&self, a: &Sequence, b: &Sequence) -> Result<Alignment, DtwError> {
        let dist = distance_matrix(a, b, self.distance)?;
        let policy = self.policy();
        let cost = cost_matrix(&dist, policy);
        let mut path = cost_path(&dist, &cost, policy.uses_diagonal(), self.band)?;
        if self.trim_blocks {
            path = path.trimmed();
        }

        let path_sum = path.sum();
        let auto_sum = auto_sum(a, b, self.distance, self.trim_blocks.then_some(&path));
        let psi = psi_equation(path_sum, auto_sum, policy.uses_diagonal());
        debug!(path_len = path.len(), path_sum, auto_sum, psi, "alignment complete");

        Ok(Alignment {
            distance: dist,
            cost,
            path,
            path_sum,
            auto_sum,
            psi,
        })
    }

    /// Return the least-cost path, trimmed when `trim_blocks` is set.
    ///
    /// # Errors
    ///
    /// Returns [`DtwError::ColumnMismatch`] if the sequences differ in column count.
    pub fn path(&self, a: &Sequence, b: &Sequence) -> Result<CostPath, DtwError> {
        self.align(a, b).map(|alignment| alignment.path)
    }

    /// Return psi for `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns [`DtwError::ColumnMismatch`] if the sequences differ in column count.
    pub fn psi(&self, a: &Sequence, b: &Sequence) -> Result<f64, DtwError> {
        self.align(a, b).map(|alignment| alignment.psi)
    }

    /// Psi of `a` and `b` along a fixed `path` found on other columns of the
    /// same rows.
    ///
    /// Step distances are recomputed on `a` and `b`; the auto-sum uses the
    /// path rows when trimming is enabled.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::ColumnMismatch`] | the sequences differ in column count |
    /// | [`DtwError::PathOutOfBounds`] | a path step references a missing row |
    pub fn psi_along(&self, a: &Sequence, b: &Sequence, path: &CostPath) -> Result<f64, DtwError> {
        let rescored = path.with_distances(a, b, self.distance)?;
        let auto_sum = auto_sum(a, b, self.distance, self.trim_blocks.then_some(&rescored));
        Ok(psi_equation(rescored.sum(), auto_sum, self.diagonal()))
    }
}

/// Every product of one DTW run.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    distance: Matrix,
    cost: Matrix,
    path: CostPath,
    path_sum: f64,
    auto_sum: f64,
    psi: f64,
}

impl Alignment {
    /// Distance matrix, rows of the first sequence by rows of the second.
    #[must_use]
    pub fn distance_matrix(&self) -> &Matrix {
        &self.distance
    }

    /// Least-cost matrix.
    #[must_use]
    pub fn cost_matrix(&self) -> &Matrix {
        &self.cost
    }

    /// Least-cost path, trimmed if the configuration trims blocks.
    #[must_use]
    pub fn path(&self) -> &CostPath {
        &self.path
    }

    /// Sum of distances along the path.
    #[must_use]
    pub fn path_sum(&self) -> f64 {
        self.path_sum
    }

    /// Auto-sum used to normalise the path sum.
    #[must_use]
    pub fn auto_sum(&self) -> f64 {
        self.auto_sum
    }

    /// Psi dissimilarity score.
    #[must_use]
    pub fn psi(&self) -> f64 {
        self.psi
    }
}

/// Psi of `a` and `b` with a metric selected by name.
///
/// `weighted = true` implies `diagonal = true`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DtwError::UnknownDistance`] | `metric` is not a known distance |
/// | [`DtwError::ColumnMismatch`] | the sequences differ in column count |
pub fn psi(
    a: &Sequence,
    b: &Sequence,
    metric: &str,
    diagonal: bool,
    weighted: bool,
    trim_blocks: bool,
) -> Result<f64, DtwError> {
    DtwConfig::new()
        .with_distance(metric.parse()?)
        .with_diagonal(diagonal)
        .with_weighted(weighted)
        .with_trim_blocks(trim_blocks)
        .psi(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(rows: &[[f64; 2]]) -> Sequence {
        let rows: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
        Sequence::from_rows(&rows).unwrap()
    }

    fn ramp(n: usize) -> Sequence {
        seq(&(0..n).map(|i| [i as f64, i as f64]).collect::<Vec<_>>())
    }

    #[test]
    fn equation_with_and_without_diagonal() {
        assert!((psi_equation(3.0, 5.0, false) - 0.2).abs() < 1e-12);
        assert!((psi_equation(1.0, 5.0, true) - 0.4).abs() < 1e-12);
        assert_eq!(psi_equation(0.0, 4.0, true), 0.0);
    }

    #[test]
    fn zero_auto_sum_propagates() {
        assert!(psi_equation(0.0, 0.0, false).is_nan());
        assert!(psi_equation(1.0, 0.0, false).is_infinite());
    }

    #[test]
    fn defaults() {
        let config = DtwConfig::default();
        assert_eq!(config.distance(), Distance::Euclidean);
        assert_eq!(config.policy(), CostPolicy::WeightedDiagonal);
        assert!(config.diagonal());
        assert!(!config.trim_blocks());
        assert_eq!(config.band(), BandConstraint::Unconstrained);
    }

    #[test]
    fn weighted_implies_diagonal() {
        let config = DtwConfig::new().with_diagonal(false).with_weighted(true);
        assert!(config.diagonal());
        let config = DtwConfig::new().with_diagonal(false).with_weighted(false);
        assert_eq!(config.policy(), CostPolicy::Orthogonal);
    }

    #[test]
    fn self_comparison_is_zero() {
        let a = seq(&[[0.0, 1.0], [2.0, 0.5], [1.0, 3.0], [4.0, 2.0]]);
        let psi = DtwConfig::new().psi(&a, &a).unwrap();
        assert_eq!(psi, 0.0);
    }

    #[test]
    fn orthogonal_scenario() {
        let config = DtwConfig::new().with_diagonal(false).with_weighted(false);
        let alignment = config.align(&ramp(4), &ramp(3)).unwrap();
        let s = 2.0_f64.sqrt();
        assert_eq!(alignment.path().len(), 6);
        assert!((alignment.path_sum() - 3.0 * s).abs() < 1e-12);
        assert!((alignment.auto_sum() - 5.0 * s).abs() < 1e-12);
        assert!((alignment.psi() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn diagonal_scenario() {
        let config = DtwConfig::new().with_weighted(false);
        let alignment = config.align(&ramp(4), &ramp(3)).unwrap();
        assert_eq!(alignment.path().len(), 4);
        assert!((alignment.psi() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn psi_along_own_path_matches_psi() {
        let a = seq(&[[0.0, 1.0], [2.0, 0.5], [1.0, 3.0]]);
        let b = seq(&[[1.0, 1.0], [0.0, 2.0], [3.0, 1.0], [2.0, 2.0]]);
        let config = DtwConfig::new();
        let alignment = config.align(&a, &b).unwrap();
        let along = config.psi_along(&a, &b, alignment.path()).unwrap();
        assert!((along - alignment.psi()).abs() < 1e-12);
    }

    #[test]
    fn lock_step_of_identical_sequences_is_zero() {
        let a = ramp(5);
        assert_eq!(psi_lock_step(&a, &a, Distance::Manhattan).unwrap(), 0.0);
    }

    #[test]
    fn lock_step_value() {
        let a = seq(&[[0.0, 0.0], [1.0, 0.0]]);
        let b = seq(&[[0.0, 1.0], [1.0, 1.0]]);
        // lock-step 2, auto-sum 2 -> (2 - 2) / 2 + 1 = 1
        assert_eq!(psi_lock_step(&a, &b, Distance::Manhattan).unwrap(), 1.0);
    }

    #[test]
    fn free_function_parses_metric() {
        let a = ramp(4);
        let b = ramp(3);
        let value = psi(&a, &b, "euc", false, false, false).unwrap();
        assert!((value - 0.2).abs() < 1e-12);
        assert!(matches!(
            psi(&a, &b, "nope", true, true, false),
            Err(DtwError::UnknownDistance { .. })
        ));
    }

    #[test]
    fn column_mismatch() {
        let a = ramp(3);
        let b = Sequence::from_rows(&[vec![1.0]]).unwrap();
        assert!(matches!(
            DtwConfig::new().psi(&a, &b),
            Err(DtwError::ColumnMismatch { .. })
        ));
    }
}
