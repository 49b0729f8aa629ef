use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use distantia_analysis::{
    ImportanceMethod, NullConfig, VariableImportance, importance_lock_step, variable_importance,
};
use distantia_dtw::{BandConstraint, Distance, DtwConfig, Sequence, psi_lock_step};
use distantia_io::{ExperimentName, Method, ResultWriter, SequenceReader};

#[derive(Parser)]
#[command(name = "distantia")]
#[command(about = "Dissimilarity (psi) between multivariate time series via dynamic time warping")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for permutations
    #[arg(long, default_value_t = 1, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Inputs and DTW parameters shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct DtwArgs {
    /// Path to the CSV file of the first sequence
    #[arg(long)]
    a: PathBuf,

    /// Path to the CSV file of the second sequence
    #[arg(long)]
    b: PathBuf,

    /// Row distance metric (full name or 3-letter abbreviation)
    #[arg(long, default_value = "euclidean")]
    distance: String,

    /// Allow diagonal moves in the cost matrix. For orthogonal moves only,
    /// pass --weighted false as well, since weighting implies diagonal moves
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    diagonal: bool,

    /// Weight diagonal moves by sqrt(2) (implies --diagonal true)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    weighted: bool,

    /// Remove block interiors from the least-cost path before scoring
    #[arg(long, default_value_t = false)]
    trim_blocks: bool,

    /// Sakoe-Chiba band width as a fraction of the row count, in [0, 1]
    #[arg(long)]
    bandwidth: Option<f64>,

    /// Column to drop from both inputs (repeatable), e.g. a time column
    #[arg(long = "skip-column")]
    skip_columns: Vec<String>,

    /// Experiment name for output files (must match [a-zA-Z0-9_-]+); no file is written without it
    #[arg(long)]
    experiment: Option<String>,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the psi dissimilarity of two sequences
    Psi {
        #[command(flatten)]
        dtw: DtwArgs,

        /// Compare rows one-to-one instead of warping (equal row counts required)
        #[arg(long, default_value_t = false)]
        lock_step: bool,
    },

    /// Print the least-cost path between two sequences
    Path {
        #[command(flatten)]
        dtw: DtwArgs,
    },

    /// Compute the null distribution of psi under row permutations
    Null {
        #[command(flatten)]
        dtw: DtwArgs,

        /// Permutation policy: free, free_by_row, restricted, or restricted_by_row
        #[arg(long, default_value = "restricted_by_row")]
        permutation: String,

        /// Rows per block for the restricted policies
        #[arg(long, default_value_t = 3)]
        block_size: usize,

        /// Number of psi values, the unpermuted one included
        #[arg(long, default_value_t = 100)]
        repetitions: usize,

        /// Use lock-step psi instead of DTW psi
        #[arg(long, default_value_t = false)]
        lock_step: bool,
    },

    /// Compute the contribution of each variable to psi
    Importance {
        #[command(flatten)]
        dtw: DtwArgs,

        /// Importance method: "robust", "legacy", or "lock-step"
        #[arg(long, default_value = "robust")]
        method: String,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct PsiOutput {
    experiment: Option<String>,
    distance: &'static str,
    lock_step: bool,
    a_rows: usize,
    b_rows: usize,
    psi: f64,
    path_sum: Option<f64>,
    auto_sum: Option<f64>,
}

#[derive(Serialize)]
struct PathOutput {
    experiment: Option<String>,
    distance: &'static str,
    path_sum: f64,
    steps: Vec<StepOutput>,
}

#[derive(Serialize)]
struct StepOutput {
    a: usize,
    b: usize,
    dist: f64,
    cost: f64,
}

#[derive(Serialize)]
struct NullOutput {
    experiment: Option<String>,
    permutation: &'static str,
    repetitions: usize,
    observed: f64,
    null_mean: Option<f64>,
    null: Vec<f64>,
}

#[derive(Serialize)]
struct ImportanceOutput {
    experiment: Option<String>,
    method: &'static str,
    psi: f64,
    variables: Vec<VariableOutput>,
}

#[derive(Serialize)]
struct VariableOutput {
    variable: String,
    psi_only_with: f64,
    psi_without: f64,
    psi_difference: f64,
    importance_pct: f64,
}

/// Importance variants exposed on the command line.
#[derive(Debug, Clone, Copy)]
enum ImportanceKind {
    Dtw(ImportanceMethod),
    LockStep,
}

impl ImportanceKind {
    fn name(self) -> &'static str {
        match self {
            Self::Dtw(method) => method.name(),
            Self::LockStep => "lock_step",
        }
    }
}

fn parse_importance_method(s: &str) -> Result<ImportanceKind> {
    match s {
        "robust" => Ok(ImportanceKind::Dtw(ImportanceMethod::Robust)),
        "legacy" => Ok(ImportanceKind::Dtw(ImportanceMethod::Legacy)),
        "lock-step" | "lock_step" => Ok(ImportanceKind::LockStep),
        other => anyhow::bail!("unknown importance method: {other} (expected robust, legacy, or lock-step)"),
    }
}

fn build_dtw(args: &DtwArgs) -> Result<DtwConfig> {
    let distance: Distance = args.distance.parse()?;
    let band = match args.bandwidth {
        Some(bandwidth) => BandConstraint::sakoe_chiba(bandwidth)?,
        None => BandConstraint::Unconstrained,
    };
    Ok(DtwConfig::new()
        .with_distance(distance)
        .with_diagonal(args.diagonal)
        .with_weighted(args.weighted)
        .with_trim_blocks(args.trim_blocks)
        .with_band(band))
}

fn read_pair(args: &DtwArgs) -> Result<(Sequence, Sequence)> {
    let a = SequenceReader::new(&args.a)
        .with_skip_columns(args.skip_columns.clone())
        .read()
        .with_context(|| format!("failed to read sequence a from {}", args.a.display()))?;
    let b = SequenceReader::new(&args.b)
        .with_skip_columns(args.skip_columns.clone())
        .read()
        .with_context(|| format!("failed to read sequence b from {}", args.b.display()))?;
    info!(a_rows = a.rows(), b_rows = b.rows(), cols = a.cols(), "sequences loaded");
    Ok((a, b))
}

fn open_writer(args: &DtwArgs) -> Result<Option<ResultWriter>> {
    args.experiment
        .as_ref()
        .map(|name| -> Result<ResultWriter> {
            let experiment = ExperimentName::new(name.clone())?;
            Ok(ResultWriter::new(&args.output_dir, experiment)?)
        })
        .transpose()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Psi { dtw, lock_step } => {
            let config = build_dtw(&dtw)?;
            let writer = open_writer(&dtw)?;
            let (a, b) = read_pair(&dtw)?;

            let output = if lock_step {
                let psi = psi_lock_step(&a, &b, config.distance()).context("lock-step psi failed")?;
                if let Some(writer) = &writer {
                    writer.write_lock_step_psi(config.distance(), a.rows(), psi)?;
                }
                PsiOutput {
                    experiment: dtw.experiment,
                    distance: config.distance().name(),
                    lock_step,
                    a_rows: a.rows(),
                    b_rows: b.rows(),
                    psi,
                    path_sum: None,
                    auto_sum: None,
                }
            } else {
                let alignment = config.align(&a, &b).context("psi computation failed")?;
                if let Some(writer) = &writer {
                    writer.write_psi(&config, &alignment)?;
                }
                PsiOutput {
                    experiment: dtw.experiment,
                    distance: config.distance().name(),
                    lock_step,
                    a_rows: a.rows(),
                    b_rows: b.rows(),
                    psi: alignment.psi(),
                    path_sum: Some(alignment.path_sum()),
                    auto_sum: Some(alignment.auto_sum()),
                }
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Path { dtw } => {
            let config = build_dtw(&dtw)?;
            let writer = open_writer(&dtw)?;
            let (a, b) = read_pair(&dtw)?;

            let path = config.path(&a, &b).context("path computation failed")?;
            info!(steps = path.len(), "path computed");
            if let Some(writer) = &writer {
                writer.write_path(&config, &path)?;
            }

            let output = PathOutput {
                experiment: dtw.experiment,
                distance: config.distance().name(),
                path_sum: path.sum(),
                steps: path
                    .records()
                    .into_iter()
                    .map(|r| StepOutput {
                        a: r.a,
                        b: r.b,
                        dist: r.dist,
                        cost: r.cost,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Null {
            dtw,
            permutation,
            block_size,
            repetitions,
            lock_step,
        } => {
            let config = build_dtw(&dtw)?;
            let null_config = NullConfig::new()
                .with_permutation(permutation.parse()?)
                .with_block_size(block_size)
                .with_seed(cli.seed)
                .with_repetitions(repetitions);
            let writer = open_writer(&dtw)?;
            let (a, b) = read_pair(&dtw)?;

            let (null, method) = if lock_step {
                let null = null_config
                    .run_lock_step(&a, &b, config.distance())
                    .context("lock-step null distribution failed")?;
                (null, Method::LockStep(config.distance()))
            } else {
                let null = null_config
                    .run(&a, &b, &config)
                    .context("null distribution failed")?;
                (null, Method::Dtw(&config))
            };
            if let Some(writer) = &writer {
                writer.write_null(method, &null_config, &null)?;
            }

            let replicates = &null[1..];
            let null_mean = (!replicates.is_empty())
                .then(|| replicates.iter().sum::<f64>() / replicates.len() as f64);
            let output = NullOutput {
                experiment: dtw.experiment,
                permutation: null_config.permutation().name(),
                repetitions,
                observed: null[0],
                null_mean,
                null,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Importance { dtw, method } => {
            let kind = parse_importance_method(&method)?;
            let config = build_dtw(&dtw)?;
            let writer = open_writer(&dtw)?;
            let (a, b) = read_pair(&dtw)?;

            let (table, artifact_method): (Vec<VariableImportance>, Method<'_>) = match kind {
                ImportanceKind::Dtw(method) => (
                    variable_importance(&a, &b, &config, method).context("importance failed")?,
                    Method::Dtw(&config),
                ),
                ImportanceKind::LockStep => (
                    importance_lock_step(&a, &b, config.distance())
                        .context("lock-step importance failed")?,
                    Method::LockStep(config.distance()),
                ),
            };
            if let Some(writer) = &writer {
                writer.write_importance(artifact_method, kind.name(), &table)?;
            }

            let output = ImportanceOutput {
                experiment: dtw.experiment,
                method: kind.name(),
                psi: table[0].psi,
                variables: table
                    .into_iter()
                    .map(|row| VariableOutput {
                        variable: row.variable,
                        psi_only_with: row.psi_only_with,
                        psi_without: row.psi_without,
                        psi_difference: row.psi_difference,
                        importance_pct: row.importance_pct,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use distantia_dtw::CostPolicy;

    use super::*;

    fn dtw_args(extra: &[&str]) -> DtwArgs {
        let mut argv = vec!["distantia", "psi", "--a", "a.csv", "--b", "b.csv"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Psi { dtw, .. } => dtw,
            _ => unreachable!(),
        }
    }

    #[test]
    fn orthogonal_needs_both_flags_off() {
        let defaults = build_dtw(&dtw_args(&[])).unwrap();
        assert_eq!(defaults.policy(), CostPolicy::WeightedDiagonal);

        let diagonal_off = build_dtw(&dtw_args(&["--diagonal", "false"])).unwrap();
        assert_eq!(diagonal_off.policy(), CostPolicy::WeightedDiagonal);

        let both_off = build_dtw(&dtw_args(&["--diagonal", "false", "--weighted", "false"])).unwrap();
        assert_eq!(both_off.policy(), CostPolicy::Orthogonal);

        let unweighted = build_dtw(&dtw_args(&["--weighted", "false"])).unwrap();
        assert_eq!(unweighted.policy(), CostPolicy::Diagonal);
    }

    #[test]
    fn bandwidth_is_validated() {
        assert!(build_dtw(&dtw_args(&["--bandwidth", "1.5"])).is_err());
        let banded = build_dtw(&dtw_args(&["--bandwidth", "0.2"])).unwrap();
        assert_eq!(banded.band().bandwidth(), Some(0.2));
    }
}
