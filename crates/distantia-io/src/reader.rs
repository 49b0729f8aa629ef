//! CSV sequence reader with full input validation.

use std::path::{Path, PathBuf};

use distantia_dtw::Sequence;
use tracing::{debug, info, instrument};

use crate::IoError;

/// Reads one multivariate sequence from a CSV file.
///
/// Expected CSV format:
/// - Header row required; header cells become the column names
/// - One row per observation, in sequence order
/// - Every kept cell must parse as a finite `f64`
///
/// Columns listed with [`with_skip_columns`](Self::with_skip_columns) (a time
/// or sample-id column, for instance) are dropped before parsing.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::UnknownColumn`] | A skipped column is not in the header |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, empty, or unparseable |
/// | [`IoError::Sequence`] | No column left after skipping |
pub struct SequenceReader {
    path: PathBuf,
    skip_columns: Vec<String>,
}

impl SequenceReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            skip_columns: Vec::new(),
        }
    }

    /// Drop the named columns instead of parsing them.
    #[must_use]
    pub fn with_skip_columns(mut self, names: Vec<String>) -> Self {
        self.skip_columns = names;
        self
    }

    /// Read and validate the CSV file, returning a [`Sequence`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Sequence, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that short or long rows surface as
        // InconsistentRowLength rather than a bare CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr
            .headers()
            .map_err(|e| self.csv_error(e))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let expected_cols = header.len();

        for name in &self.skip_columns {
            if !header.contains(name) {
                return Err(IoError::UnknownColumn {
                    path: self.path.clone(),
                    name: name.clone(),
                });
            }
        }

        let kept: Vec<usize> = (0..expected_cols)
            .filter(|&i| !self.skip_columns.contains(&header[i]))
            .collect();
        let names: Vec<String> = kept.iter().map(|&i| header[i].clone()).collect();
        debug!(expected_cols, kept = kept.len(), "read CSV header");

        let mut data = Vec::new();
        let mut n_rows = 0;

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            for &col_index in &kept {
                let raw = record.get(col_index).unwrap_or("");
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    })?;
                data.push(value);
            }
            n_rows += 1;
        }

        if n_rows == 0 {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let sequence = Sequence::from_row_major(n_rows, kept.len(), data)?.with_column_names(names)?;
        info!(rows = sequence.rows(), cols = sequence.cols(), "sequence loaded");
        Ok(sequence)
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use distantia_dtw::DtwError;
    use tempfile::NamedTempFile;

    use super::*;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn reads_values_and_names() {
        let f = write_csv("pinus,quercus\n1.0,2.0\n3.0,4.5\n5,6\n");
        let seq = SequenceReader::new(f.path()).read().unwrap();
        assert_eq!(seq.rows(), 3);
        assert_eq!(seq.cols(), 2);
        assert_eq!(seq.column_names(), ["pinus", "quercus"]);
        assert_eq!(seq.row(1), [3.0, 4.5]);
        assert_eq!(seq.row(2), [5.0, 6.0]);
    }

    #[test]
    fn skips_named_columns() {
        let f = write_csv("depth,a,b\n0.1,1,2\n0.2,3,4\n");
        let seq = SequenceReader::new(f.path())
            .with_skip_columns(vec!["depth".into()])
            .read()
            .unwrap();
        assert_eq!(seq.column_names(), ["a", "b"]);
        assert_eq!(seq.row(0), [1.0, 2.0]);
    }

    #[test]
    fn unknown_skip_column() {
        let f = write_csv("a,b\n1,2\n");
        let result = SequenceReader::new(f.path())
            .with_skip_columns(vec!["time".into()])
            .read();
        assert!(matches!(result, Err(IoError::UnknownColumn { name, .. }) if name == "time"));
    }

    #[test]
    fn skipping_every_column_fails() {
        let f = write_csv("a\n1\n2\n");
        let result = SequenceReader::new(f.path())
            .with_skip_columns(vec!["a".into()])
            .read();
        assert!(matches!(result, Err(IoError::Sequence(DtwError::NoColumns))));
    }

    #[test]
    fn missing_file() {
        let result = SequenceReader::new(Path::new("/nonexistent/sequence.csv")).read();
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn header_only_is_empty() {
        let f = write_csv("a,b\n");
        assert!(matches!(
            SequenceReader::new(f.path()).read(),
            Err(IoError::EmptyDataset { .. })
        ));
    }

    #[test]
    fn inconsistent_row_length() {
        let f = write_csv("a,b\n1,2\n3\n");
        assert!(matches!(
            SequenceReader::new(f.path()).read(),
            Err(IoError::InconsistentRowLength {
                row_index: 1,
                expected: 2,
                got: 1,
                ..
            })
        ));
    }

    #[test]
    fn non_finite_and_unparseable_cells() {
        for (content, raw) in [
            ("a,b\n1,NaN\n", "NaN"),
            ("a,b\n1,inf\n", "inf"),
            ("a,b\n1,abc\n", "abc"),
            ("a,b\n1,\n", ""),
        ] {
            let f = write_csv(content);
            let result = SequenceReader::new(f.path()).read();
            assert!(
                matches!(&result, Err(IoError::NonFiniteValue { row_index: 0, col_index: 1, raw: r, .. }) if r == raw),
                "{content:?}: {result:?}"
            );
        }
    }

    #[test]
    fn cells_are_trimmed() {
        let f = write_csv("a , b\n 1 , 2 \n");
        let seq = SequenceReader::new(f.path()).read().unwrap();
        assert_eq!(seq.column_names(), ["a", "b"]);
        assert_eq!(seq.row(0), [1.0, 2.0]);
    }
}
