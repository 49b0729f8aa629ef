//! End-to-end integration tests: CSV -> psi/null/importance -> JSON -> deserialize.

use std::fs;
use std::path::Path;

use distantia_analysis::{ImportanceMethod, NullConfig, Permutation, variable_importance};
use distantia_dtw::{DtwConfig, Sequence};
use distantia_io::{ExperimentName, Method, ResultWriter, SequenceReader};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> Sequence {
    SequenceReader::new(&fixture_path(name))
        .with_skip_columns(vec!["depth".into()])
        .read()
        .expect("fixture should parse")
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn writer(dir: &TempDir, name: &str) -> ResultWriter {
    ResultWriter::new(dir.path(), ExperimentName::new(name.into()).unwrap()).unwrap()
}

#[test]
fn fixtures_parse_with_and_without_depth() {
    let a = read_fixture("pollen_a.csv");
    assert_eq!((a.rows(), a.cols()), (12, 3));
    assert_eq!(a.column_names(), ["pinus", "quercus", "alnus"]);

    let with_depth = SequenceReader::new(&fixture_path("pollen_b.csv")).read().unwrap();
    assert_eq!((with_depth.rows(), with_depth.cols()), (9, 4));
    assert_eq!(with_depth.column_names()[0], "depth");
}

#[test]
fn psi_round_trip() {
    let a = read_fixture("pollen_a.csv");
    let b = read_fixture("pollen_b.csv");
    let dtw = DtwConfig::new();
    let alignment = dtw.align(&a, &b).unwrap();

    let dir = TempDir::new().unwrap();
    let path = writer(&dir, "psi_rt").write_psi(&dtw, &alignment).unwrap();
    assert_eq!(path, dir.path().join("psi_rt_psi.json"));

    let content = read_json(&path);
    assert_eq!(content["experiment"], "psi_rt");
    assert_eq!(content["a_rows"].as_u64().unwrap(), 12);
    assert_eq!(content["b_rows"].as_u64().unwrap(), 9);
    let psi = content["psi"].as_f64().unwrap();
    assert!(psi.is_finite() && psi > 0.0, "psi = {psi}");
    assert!((psi - alignment.psi()).abs() < 1e-12);
}

#[test]
fn self_comparison_writes_zero_psi() {
    let a = read_fixture("pollen_a.csv");
    let dtw = DtwConfig::new();
    let alignment = dtw.align(&a, &a).unwrap();

    let dir = TempDir::new().unwrap();
    let path = writer(&dir, "self").write_psi(&dtw, &alignment).unwrap();
    assert_eq!(read_json(&path)["psi"].as_f64().unwrap(), 0.0);
}

#[test]
fn path_round_trip_spans_both_sequences() {
    let a = read_fixture("pollen_a.csv");
    let b = read_fixture("pollen_b.csv");
    let dtw = DtwConfig::new().with_weighted(false);
    let cost_path = dtw.path(&a, &b).unwrap();

    let dir = TempDir::new().unwrap();
    let path = writer(&dir, "path_rt").write_path(&dtw, &cost_path).unwrap();
    let content = read_json(&path);
    let steps = content["steps"].as_array().unwrap();

    assert_eq!(steps.len(), cost_path.len());
    assert_eq!(steps[0]["a"].as_u64().unwrap(), 12);
    assert_eq!(steps[0]["b"].as_u64().unwrap(), 9);
    let last = steps.last().unwrap();
    assert_eq!(last["a"].as_u64().unwrap(), 1);
    assert_eq!(last["b"].as_u64().unwrap(), 1);
    assert!((content["path_sum"].as_f64().unwrap() - cost_path.sum()).abs() < 1e-12);
}

#[test]
fn null_round_trip() {
    let a = read_fixture("pollen_a.csv");
    let b = read_fixture("pollen_b.csv");
    let dtw = DtwConfig::new();
    let config = NullConfig::new()
        .with_permutation(Permutation::Restricted)
        .with_seed(11)
        .with_repetitions(6);
    let null = config.run(&a, &b, &dtw).unwrap();

    let dir = TempDir::new().unwrap();
    let path = writer(&dir, "null_rt")
        .write_null(Method::Dtw(&dtw), &config, &null)
        .unwrap();
    let content = read_json(&path);

    assert_eq!(content["permutation"], "restricted");
    assert_eq!(content["seed"].as_u64().unwrap(), 11);
    assert_eq!(content["replicates"].as_array().unwrap().len(), 5);
    let observed = content["observed"].as_f64().unwrap();
    assert!((observed - dtw.psi(&a, &b).unwrap()).abs() < 1e-12);
}

#[test]
fn importance_round_trip() {
    let a = read_fixture("pollen_a.csv");
    let b = read_fixture("pollen_b.csv");
    let dtw = DtwConfig::new();
    let table = variable_importance(&a, &b, &dtw, ImportanceMethod::Robust).unwrap();

    let dir = TempDir::new().unwrap();
    let path = writer(&dir, "imp_rt")
        .write_importance(Method::Dtw(&dtw), ImportanceMethod::Robust.name(), &table)
        .unwrap();
    let content = read_json(&path);
    let variables = content["variables"].as_array().unwrap();

    assert_eq!(content["importance_method"], "robust");
    let names: Vec<&str> = variables.iter().map(|v| v["variable"].as_str().unwrap()).collect();
    assert_eq!(names, ["pinus", "quercus", "alnus"]);
    for (entry, row) in variables.iter().zip(&table) {
        assert!((entry["psi_difference"].as_f64().unwrap() - row.psi_difference).abs() < 1e-12);
    }
}
