//! Analyses built on the psi pipeline: seeded permutations, null
//! distributions of psi, and variable importance.
//!
//! Every random draw comes from a `ChaCha8Rng` seeded per call, so results
//! are reproducible and independent of the rayon thread count.

mod error;
mod importance;
mod null;
mod permute;

pub use error::AnalysisError;
pub use importance::{
    ImportanceMethod, VariableImportance, importance, importance_lock_step, variable_importance,
};
pub use null::{NullConfig, null_psi, null_psi_lock_step};
pub use permute::{Permutation, permute};
