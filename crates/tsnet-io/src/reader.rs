//! CSV series reader with full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use tsnet_metrics::TimeSeries;
use tsnet_pairwise::SeriesCollection;

use crate::IoError;

/// Reads a collection of equal-length series from a CSV file.
///
/// Expected CSV format:
/// - Header row required (first column is the series id, remaining are positional time steps)
/// - `id,t0,t1,...,tn`
/// - One row per series, all rows must have the same number of columns
///
/// The ids become the collection's names, in file order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows, or zero time steps |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::DuplicateId`] | Same id appears twice |
pub struct SeriesReader {
    path: PathBuf,
}

impl SeriesReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<SeriesCollection, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible so the row-length check below reports the row instead of a parse error
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");
        if expected_cols < 2 {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let mut names = Vec::new();
        let mut series = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let id = record.get(0).unwrap_or("").to_string();

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    id,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            if let Some(&first_row) = seen.get(&id) {
                return Err(IoError::DuplicateId {
                    path: self.path.clone(),
                    id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(id.clone(), row_index);

            let values = record
                .iter()
                .skip(1)
                .enumerate()
                .map(|(col_index, raw)| self.parse_value(row_index, col_index, raw))
                .collect::<Result<Vec<f64>, IoError>>()?;
            let ts = TimeSeries::new(values).map_err(|_| IoError::EmptyDataset {
                path: self.path.clone(),
            })?;

            names.push(id);
            series.push(ts);
        }

        if series.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_series = series.len(),
            n_timesteps = expected_cols - 1,
            "series loaded"
        );
        Ok(SeriesCollection::new(series).with_names(names)?)
    }

    fn parse_value(&self, row_index: usize, col_index: usize, raw: &str) -> Result<f64, IoError> {
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(IoError::NonFiniteValue {
                path: self.path.clone(),
                row_index,
                col_index,
                raw: raw.to_string(),
            }),
        }
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
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tsnet_pairwise::SeriesSource;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_valid_collection() {
        let csv = "id,t0,t1,t2,t3\nS01,0.0,0.1,0.0,0.1\nS02,0.1,0.0,0.1,0.0\nS03,5.0,5.1,5.0,5.1\n";
        let f = write_csv(csv);
        let c = SeriesReader::new(f.path()).read().unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.names().unwrap(), ["S01", "S02", "S03"]);
        assert_eq!(c.fetch(2).unwrap().as_ref(), &[5.0, 5.1, 5.0, 5.1]);
    }

    #[test]
    fn value_round_trip() {
        let csv = "id,t0,t1\nA, 1.23456789 ,9.87654321\n";
        let f = write_csv(csv);
        let c = SeriesReader::new(f.path()).read().unwrap();
        let vals = c.fetch(0).unwrap();
        assert!((vals[0] - 1.23456789).abs() < 1e-12);
        assert!((vals[1] - 9.87654321).abs() < 1e-12);
    }

    #[test]
    fn insertion_order_preserved() {
        let csv = "id,t0\nZZZ,1.0\nAAA,2.0\nMMM,3.0\n";
        let f = write_csv(csv);
        let c = SeriesReader::new(f.path()).read().unwrap();
        assert_eq!(c.names().unwrap(), ["ZZZ", "AAA", "MMM"]);
    }

    #[test]
    fn error_file_not_found() {
        let result = SeriesReader::new(Path::new("/nonexistent/file.csv")).read();
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn error_empty_dataset() {
        let f = write_csv("id,t0,t1,t2\n");
        let result = SeriesReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::EmptyDataset { .. })));
        let f = write_csv("id\nA\n");
        let result = SeriesReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::EmptyDataset { .. })));
    }

    #[test]
    fn error_inconsistent_row_length() {
        let csv = "id,t0,t1,t2\nB01,1.0,2.0,3.0\nB02,1.0,2.0\n";
        let f = write_csv(csv);
        let result = SeriesReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::InconsistentRowLength { row_index: 1, .. })
        ));
    }

    #[test]
    fn error_non_finite_values() {
        for bad in ["NaN", "Inf", "abc", ""] {
            let f = write_csv(&format!("id,t0,t1\nB01,1.0,{bad}\n"));
            let result = SeriesReader::new(f.path()).read();
            assert!(
                matches!(result, Err(IoError::NonFiniteValue { col_index: 1, .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn error_duplicate_id() {
        let csv = "id,t0,t1\nB01,1.0,2.0\nB02,3.0,4.0\nB01,5.0,6.0\n";
        let f = write_csv(csv);
        let result = SeriesReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::DuplicateId {
                first_row: 0,
                second_row: 2,
                ..
            })
        ));
    }
}
