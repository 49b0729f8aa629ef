//! JSON result writer for psi, path, null distribution, and importance outputs.

use std::fs;
use std::path::{Path, PathBuf};

use distantia_analysis::{NullConfig, VariableImportance};
use distantia_dtw::{Alignment, CostPath, Distance, DtwConfig};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// How a psi value was obtained, recorded in every artifact.
#[derive(Debug, Clone, Copy)]
pub enum Method<'a> {
    /// Dynamic time warping with the given configuration.
    Dtw(&'a DtwConfig),
    /// Row-by-row comparison of equal-length sequences.
    LockStep(Distance),
}

/// Writes analysis results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_psi.json`, `{experiment}_path.json`,
/// `{experiment}_null.json`, and `{experiment}_importance.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Path of the artifact of the given kind.
    pub fn artifact_path(&self, kind: &str) -> PathBuf {
        self.output_dir.join(self.experiment.file_name(kind))
    }

    /// Write a DTW alignment summary to `{experiment}_psi.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_psi(&self, dtw: &DtwConfig, alignment: &Alignment) -> Result<PathBuf, IoError> {
        let artifact = PsiArtifact {
            experiment: self.experiment.as_str(),
            method: MethodEntry::from(Method::Dtw(dtw)),
            psi: alignment.psi(),
            path_sum: Some(alignment.path_sum()),
            auto_sum: Some(alignment.auto_sum()),
            path_length: Some(alignment.path().len()),
            a_rows: alignment.distance_matrix().rows(),
            b_rows: alignment.distance_matrix().cols(),
        };
        self.write("psi", &artifact)
    }

    /// Write a lock-step psi to `{experiment}_psi.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_lock_step_psi(&self, metric: Distance, rows: usize, psi: f64) -> Result<PathBuf, IoError> {
        let artifact = PsiArtifact {
            experiment: self.experiment.as_str(),
            method: MethodEntry::from(Method::LockStep(metric)),
            psi,
            path_sum: None,
            auto_sum: None,
            path_length: None,
            a_rows: rows,
            b_rows: rows,
        };
        self.write("psi", &artifact)
    }

    /// Write a least-cost path to `{experiment}_path.json`, with one-based
    /// indices in path order (terminal cell first).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(steps = path.len()))]
    pub fn write_path(&self, dtw: &DtwConfig, path: &CostPath) -> Result<PathBuf, IoError> {
        let steps = path
            .records()
            .into_iter()
            .map(|r| PathEntry {
                a: r.a,
                b: r.b,
                dist: r.dist,
                cost: r.cost,
            })
            .collect();

        let artifact = PathArtifact {
            experiment: self.experiment.as_str(),
            method: MethodEntry::from(Method::Dtw(dtw)),
            path_sum: path.sum(),
            steps,
        };
        self.write("path", &artifact)
    }

    /// Write a null distribution to `{experiment}_null.json`.
    ///
    /// `values[0]` is stored as the observed psi, the rest as replicates.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(values = values.len()))]
    pub fn write_null(&self, method: Method<'_>, null: &NullConfig, values: &[f64]) -> Result<PathBuf, IoError> {
        let (observed, replicates) = match values.split_first() {
            Some((first, rest)) => (Some(*first), rest),
            None => (None, values),
        };

        let artifact = NullArtifact {
            experiment: self.experiment.as_str(),
            method: MethodEntry::from(method),
            permutation: null.permutation().name(),
            block_size: null.block_size(),
            seed: null.seed(),
            repetitions: null.repetitions(),
            observed,
            replicates,
        };
        self.write("null", &artifact)
    }

    /// Write an importance table to `{experiment}_importance.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(variables = table.len()))]
    pub fn write_importance(
        &self,
        method: Method<'_>,
        importance_method: &str,
        table: &[VariableImportance],
    ) -> Result<PathBuf, IoError> {
        let variables = table
            .iter()
            .map(|row| ImportanceEntry {
                variable: &row.variable,
                psi: row.psi,
                psi_only_with: row.psi_only_with,
                psi_without: row.psi_without,
                psi_difference: row.psi_difference,
                importance_pct: row.importance_pct,
            })
            .collect();

        let artifact = ImportanceArtifact {
            experiment: self.experiment.as_str(),
            method: MethodEntry::from(method),
            importance_method,
            variables,
        };
        self.write("importance", &artifact)
    }

    fn write<T: Serialize>(&self, kind: &str, artifact: &T) -> Result<PathBuf, IoError> {
        let path = self.artifact_path(kind);
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), kind, "result written");
        Ok(path)
    }
}

// --- Serializable artifact structs ---

#[derive(Serialize)]
struct MethodEntry {
    kind: &'static str,
    distance: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost_policy: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trim_blocks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bandwidth: Option<f64>,
}

impl From<Method<'_>> for MethodEntry {
    fn from(method: Method<'_>) -> Self {
        match method {
            Method::Dtw(dtw) => Self {
                kind: "dtw",
                distance: dtw.distance().name(),
                cost_policy: Some(dtw.policy().name()),
                trim_blocks: Some(dtw.trim_blocks()),
                bandwidth: dtw.band().bandwidth(),
            },
            Method::LockStep(metric) => Self {
                kind: "lock_step",
                distance: metric.name(),
                cost_policy: None,
                trim_blocks: None,
                bandwidth: None,
            },
        }
    }
}

#[derive(Serialize)]
struct PsiArtifact<'a> {
    experiment: &'a str,
    method: MethodEntry,
    psi: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    path_sum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_sum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path_length: Option<usize>,
    a_rows: usize,
    b_rows: usize,
}

#[derive(Serialize)]
struct PathEntry {
    a: usize,
    b: usize,
    dist: f64,
    cost: f64,
}

#[derive(Serialize)]
struct PathArtifact<'a> {
    experiment: &'a str,
    method: MethodEntry,
    path_sum: f64,
    steps: Vec<PathEntry>,
}

#[derive(Serialize)]
struct NullArtifact<'a> {
    experiment: &'a str,
    method: MethodEntry,
    permutation: &'static str,
    block_size: usize,
    seed: u64,
    repetitions: usize,
    observed: Option<f64>,
    replicates: &'a [f64],
}

#[derive(Serialize)]
struct ImportanceEntry<'a> {
    variable: &'a str,
    psi: f64,
    psi_only_with: f64,
    psi_without: f64,
    psi_difference: f64,
    importance_pct: f64,
}

#[derive(Serialize)]
struct ImportanceArtifact<'a> {
    experiment: &'a str,
    method: MethodEntry,
    importance_method: &'a str,
    variables: Vec<ImportanceEntry<'a>>,
}
