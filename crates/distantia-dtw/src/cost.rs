//! Least-cost matrix accumulation.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::error::DtwError;
use crate::matrix::Matrix;

/// Multiplier applied to the local distance when a weighted-diagonal cost
/// matrix reaches a cell through a diagonal move.
pub const DIAGONAL_WEIGHT: f64 = 1.414214;

/// Moves allowed while accumulating the cost matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CostPolicy {
    /// Only vertical and horizontal moves.
    Orthogonal,
    /// Vertical, horizontal, and unweighted diagonal moves.
    Diagonal,
    /// Vertical, horizontal, and diagonal moves whose local distance is
    /// multiplied by [`DIAGONAL_WEIGHT`].
    #[default]
    WeightedDiagonal,
}

impl CostPolicy {
    /// Build a policy from the `diagonal` and `weighted` flags.
    ///
    /// `weighted` implies `diagonal`.
    #[must_use]
    pub fn from_flags(diagonal: bool, weighted: bool) -> Self {
        match (diagonal, weighted) {
            (_, true) => Self::WeightedDiagonal,
            (true, false) => Self::Diagonal,
            (false, false) => Self::Orthogonal,
        }
    }

    /// Return true if the policy allows diagonal moves.
    #[must_use]
    pub fn uses_diagonal(&self) -> bool {
        !matches!(self, Self::Orthogonal)
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Orthogonal => "orthogonal",
            Self::Diagonal => "diagonal",
            Self::WeightedDiagonal => "weighted_diagonal",
        }
    }
}

impl fmt::Display for CostPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CostPolicy {
    type Err = DtwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orthogonal" => Ok(Self::Orthogonal),
            "diagonal" => Ok(Self::Diagonal),
            "weighted_diagonal" => Ok(Self::WeightedDiagonal),
            _ => Err(DtwError::UnknownCostPolicy { name: s.to_string() }),
        }
    }
}

/// Accumulate the least-cost matrix of a distance matrix.
///
/// `cost[0,0] = dist[0,0]`; the first row and first column are running sums
/// of the distances along the border. Every interior cell adds its local
/// distance to the cheapest predecessor allowed by `policy`:
///
/// | Policy | Interior cell |
/// |---|---|
/// | `Orthogonal` | `dist + min(up, left)` |
/// | `Diagonal` | `dist + min(up, left, diag)` |
/// | `WeightedDiagonal` | `min(dist + min(up, left), diag + dist * DIAGONAL_WEIGHT)` |
#[must_use]
#[instrument(skip(dist), fields(rows = dist.rows(), cols = dist.cols()))]
pub fn cost_matrix(dist: &Matrix, policy: CostPolicy) -> Matrix {
    let rows = dist.rows();
    let cols = dist.cols();
    let mut cost = vec![0.0; rows * cols];

    cost[0] = dist[(0, 0)];
    for j in 1..cols {
        cost[j] = cost[j - 1] + dist[(0, j)];
    }
    for i in 1..rows {
        cost[i * cols] = cost[(i - 1) * cols] + dist[(i, 0)];
    }

    for i in 1..rows {
        for j in 1..cols {
            let d = dist[(i, j)];
            let up = cost[(i - 1) * cols + j];
            let left = cost[i * cols + j - 1];
            let diag = cost[(i - 1) * cols + j - 1];
            cost[i * cols + j] = match policy {
                CostPolicy::Orthogonal => up.min(left) + d,
                CostPolicy::Diagonal => up.min(left).min(diag) + d,
                CostPolicy::WeightedDiagonal => (up.min(left) + d).min(diag + d * DIAGONAL_WEIGHT),
            };
        }
    }

    debug!(%policy, terminal = cost[rows * cols - 1], "cost matrix accumulated");
    Matrix::from_raw(rows, cols, cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::BandConstraint;
    use crate::path::cost_path;

    fn dist() -> Matrix {
        Matrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 1.0, 2.0]).unwrap()
    }

    #[test]
    fn flags_map_to_policy() {
        assert_eq!(CostPolicy::from_flags(false, false), CostPolicy::Orthogonal);
        assert_eq!(CostPolicy::from_flags(true, false), CostPolicy::Diagonal);
        assert_eq!(CostPolicy::from_flags(true, true), CostPolicy::WeightedDiagonal);
        assert_eq!(CostPolicy::from_flags(false, true), CostPolicy::WeightedDiagonal);
        assert!(!CostPolicy::Orthogonal.uses_diagonal());
        assert!(CostPolicy::WeightedDiagonal.uses_diagonal());
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("Diagonal".parse::<CostPolicy>().unwrap(), CostPolicy::Diagonal);
        assert_eq!(
            "weighted_diagonal".parse::<CostPolicy>().unwrap(),
            CostPolicy::WeightedDiagonal
        );
        assert!(matches!(
            "zigzag".parse::<CostPolicy>(),
            Err(DtwError::UnknownCostPolicy { .. })
        ));
    }

    #[test]
    fn border_is_running_sum() {
        let c = cost_matrix(&dist(), CostPolicy::Orthogonal);
        assert_eq!(c.row(0), &[1.0, 3.0, 6.0]);
        assert_eq!(c[(1, 0)], 5.0);
    }

    #[test]
    fn orthogonal_interior() {
        let c = cost_matrix(&dist(), CostPolicy::Orthogonal);
        // (1,1): 1 + min(3, 5) = 4; (1,2): 2 + min(6, 4) = 6
        assert_eq!(c.row(1), &[5.0, 4.0, 6.0]);
    }

    #[test]
    fn diagonal_interior() {
        let c = cost_matrix(&dist(), CostPolicy::Diagonal);
        // (1,1): 1 + min(3, 5, 1) = 2; (1,2): 2 + min(6, 2, 3) = 4
        assert_eq!(c.row(1), &[5.0, 2.0, 4.0]);
    }

    #[test]
    fn weighted_diagonal_interior() {
        let c = cost_matrix(&dist(), CostPolicy::WeightedDiagonal);
        let c11 = (3.0_f64 + 1.0).min(1.0 + DIAGONAL_WEIGHT);
        let c12 = (c11.min(6.0) + 2.0).min(3.0 + 2.0 * DIAGONAL_WEIGHT);
        assert!((c[(1, 1)] - c11).abs() < 1e-12);
        assert!((c[(1, 2)] - c12).abs() < 1e-12);
    }

    #[test]
    fn single_cell() {
        let d = Matrix::new(1, 1, vec![7.0]).unwrap();
        assert_eq!(cost_matrix(&d, CostPolicy::Diagonal).as_slice(), &[7.0]);
    }

    #[test]
    fn origin_and_path_costs_for_every_policy() {
        let d = Matrix::new(3, 3, vec![2.0, 1.0, 3.0, 4.0, 0.0, 2.0, 1.0, 5.0, 1.0]).unwrap();
        for policy in [CostPolicy::Orthogonal, CostPolicy::Diagonal, CostPolicy::WeightedDiagonal] {
            let c = cost_matrix(&d, policy);
            assert_eq!(c[(0, 0)], d[(0, 0)], "{policy}");

            let path = cost_path(&d, &c, policy.uses_diagonal(), BandConstraint::Unconstrained).unwrap();
            assert_eq!(path.steps().last().map(|s| (s.a, s.b)), Some((0, 0)), "{policy}");
            for w in path.steps().windows(2) {
                assert!(w[0].cost >= w[1].cost, "{policy}: cost drops from {:?} to {:?}", w[1], w[0]);
            }
        }
    }
}
