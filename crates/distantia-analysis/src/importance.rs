//! Leave-one-variable-in / leave-one-variable-out importance of psi.

use distantia_dtw::{Distance, DtwConfig, DtwError, Sequence, psi_lock_step};
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::error::AnalysisError;

/// How subset psi values are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ImportanceMethod {
    /// Score every column subset along the path found with all columns.
    #[default]
    Robust,
    /// Re-run the full DTW pipeline on every column subset.
    ///
    /// `importance_pct` is `psi_difference * 100 / psi`, as for
    /// [`Robust`](Self::Robust). Older releases reported
    /// `(psi - psi_without) * 100 / psi` for this method; that value is
    /// recoverable from the `psi` and `psi_without` fields.
    Legacy,
}

impl ImportanceMethod {
    /// Canonical name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Robust => "robust",
            Self::Legacy => "legacy",
        }
    }
}

/// Importance of one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableImportance {
    /// Column name, taken from the first sequence.
    pub variable: String,
    /// Psi with every column. Identical across all rows of one table.
    pub psi: f64,
    /// Psi using only this column.
    pub psi_only_with: f64,
    /// Psi using every column except this one.
    pub psi_without: f64,
    /// `psi_only_with - psi_without`.
    pub psi_difference: f64,
    /// `psi_difference` as a percentage of `psi`.
    pub importance_pct: f64,
}

impl VariableImportance {
    fn new(variable: &str, psi: f64, psi_only_with: f64, psi_without: f64) -> Self {
        let psi_difference = psi_only_with - psi_without;
        Self {
            variable: variable.to_string(),
            psi,
            psi_only_with,
            psi_without,
            psi_difference,
            importance_pct: psi_difference * 100.0 / psi,
        }
    }
}

/// Compute the importance table of `a` and `b`, one row per column.
///
/// With [`ImportanceMethod::Robust`] the least-cost path is computed once on
/// all columns; each subset only recomputes the step distances along that
/// path and its own auto-sum. With [`ImportanceMethod::Legacy`] each subset
/// gets its own alignment. Columns are processed in parallel.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AnalysisError::Dtw`] | the sequences differ in column count |
/// | [`AnalysisError::TooFewColumns`] | the sequences have a single column |
#[instrument(skip(a, b, dtw), fields(cols = a.cols(), method = method.name()))]
pub fn variable_importance(
    a: &Sequence,
    b: &Sequence,
    dtw: &DtwConfig,
    method: ImportanceMethod,
) -> Result<Vec<VariableImportance>, AnalysisError> {
    check_subsets(a, b)?;

    let table = match method {
        ImportanceMethod::Robust => {
            let alignment = dtw.align(a, b)?;
            let path = alignment.path();
            per_column(a, b, alignment.psi(), |x, y| dtw.psi_along(x, y, path))?
        }
        ImportanceMethod::Legacy => {
            let psi = dtw.psi(a, b)?;
            per_column(a, b, psi, |x, y| dtw.psi(x, y))?
        }
    };

    info!(psi = table[0].psi, variables = table.len(), "importance computed");
    Ok(table)
}

/// Compute the importance table using lock-step psi.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AnalysisError::Dtw`] | the sequences differ in shape |
/// | [`AnalysisError::TooFewColumns`] | the sequences have a single column |
#[instrument(skip(a, b), fields(cols = a.cols()))]
pub fn importance_lock_step(
    a: &Sequence,
    b: &Sequence,
    metric: Distance,
) -> Result<Vec<VariableImportance>, AnalysisError> {
    check_subsets(a, b)?;
    let psi = psi_lock_step(a, b, metric)?;
    let table = per_column(a, b, psi, |x, y| psi_lock_step(x, y, metric))?;
    info!(psi, variables = table.len(), "lock-step importance computed");
    Ok(table)
}

/// Robust importance table with the metric selected by name.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AnalysisError::Dtw`] | unknown metric, or the sequences differ in column count |
/// | [`AnalysisError::TooFewColumns`] | the sequences have a single column |
pub fn importance(
    a: &Sequence,
    b: &Sequence,
    metric: &str,
    diagonal: bool,
    weighted: bool,
    trim_blocks: bool,
) -> Result<Vec<VariableImportance>, AnalysisError> {
    let dtw = DtwConfig::new()
        .with_distance(metric.parse()?)
        .with_diagonal(diagonal)
        .with_weighted(weighted)
        .with_trim_blocks(trim_blocks);
    variable_importance(a, b, &dtw, ImportanceMethod::Robust)
}

fn check_subsets(a: &Sequence, b: &Sequence) -> Result<(), AnalysisError> {
    if a.cols() != b.cols() {
        return Err(DtwError::ColumnMismatch {
            a_cols: a.cols(),
            b_cols: b.cols(),
        }
        .into());
    }
    if a.cols() < 2 {
        return Err(AnalysisError::TooFewColumns { cols: a.cols() });
    }
    Ok(())
}

fn per_column<F>(
    a: &Sequence,
    b: &Sequence,
    psi: f64,
    score: F,
) -> Result<Vec<VariableImportance>, AnalysisError>
where
    F: Fn(&Sequence, &Sequence) -> Result<f64, DtwError> + Sync,
{
    let names = a.column_names();
    (0..a.cols())
        .into_par_iter()
        .map(|i| -> Result<VariableImportance, AnalysisError> {
            let only_with = score(&a.select_column(i)?, &b.select_column(i)?)?;
            let without = score(&a.delete_column(i)?, &b.delete_column(i)?)?;
            Ok(VariableImportance::new(&names[i], psi, only_with, without))
        })
        .collect()
}
