//! Dynamic time warping dissimilarity between multivariate sequences.
//!
//! Pure math library with zero I/O. Builds the distance matrix between two
//! sequences, accumulates a least-cost matrix under orthogonal, diagonal, or
//! weighted-diagonal moves, backtracks the least-cost path (optionally inside
//! a Sakoe-Chiba band and with block trimming), and normalises the path sum by
//! the auto-sum of both sequences to produce the psi score.

mod auto_sum;
mod constraint;
mod cost;
mod distance;
mod error;
mod matrix;
mod path;
mod psi;
mod sequence;

pub use auto_sum::{auto_distance, auto_sum, auto_sum_full, auto_sum_path};
pub use constraint::{BandConstraint, Bandwidth};
pub use cost::{CostPolicy, DIAGONAL_WEIGHT, cost_matrix};
pub use distance::{Distance, distance};
pub use error::DtwError;
pub use matrix::{Matrix, distance_matrix, lock_step_distance};
pub use path::{CostPath, PathRecord, PathStep, cost_path, path_sum, trim_path};
pub use psi::{Alignment, DtwConfig, psi, psi_equation, psi_lock_step};
pub use sequence::Sequence;
