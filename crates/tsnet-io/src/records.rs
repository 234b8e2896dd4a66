//! Record batch files: the output of one partition.
//!
//! Indices are one-based in files and zero-based in memory.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use tsnet_pairwise::{DistanceMatrix, DistanceRecord, merge_into};

use crate::IoError;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Spelling of a missing distance in CSV files.
pub(crate) const MISSING: &str = "NA";

const CSV_HEADER: [&str; 3] = ["i", "j", "dist"];

/// Encoding of a record batch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// bincode in a versioned envelope.
    Binary,
    /// CSV with header `i,j,dist`; missing distances are `NA`.
    Csv,
}

impl RecordFormat {
    /// `Csv` for a `.csv` extension, `Binary` otherwise.
    #[must_use]
    pub fn detect(path: &Path) -> Self {
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            Self::Csv
        } else {
            Self::Binary
        }
    }

    /// File extension for this format, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Csv => "csv",
        }
    }
}

/// Versioned envelope for a binary record batch.
#[derive(Serialize, Deserialize)]
struct RecordEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Records with one-based indices.
    records: Vec<DistanceRecord>,
}

/// Write a batch of zero-based records to `path`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::Encode`] | bincode encoding failed |
/// | [`IoError::CsvParse`] | CSV writing failed |
/// | [`IoError::WriteFile`] | file write failed |
#[instrument(skip_all, fields(path = %path.display(), n_records = records.len()))]
pub fn write_records(path: &Path, records: &[DistanceRecord], format: RecordFormat) -> Result<(), IoError> {
    let bytes = match format {
        RecordFormat::Binary => {
            let envelope = RecordEnvelope {
                format_version: FORMAT_VERSION,
                records: records
                    .iter()
                    .map(|r| DistanceRecord::new(r.i + 1, r.j + 1, r.dist))
                    .collect(),
            };
            bincode::serialize(&envelope).map_err(|e| IoError::Encode {
                path: path.to_path_buf(),
                source: e,
            })?
        }
        RecordFormat::Csv => {
            let csv_error = |e: csv::Error| IoError::CsvParse {
                path: path.to_path_buf(),
                offset: 0,
                source: e,
            };
            let mut wtr = csv::Writer::from_writer(Vec::new());
            wtr.write_record(CSV_HEADER).map_err(csv_error)?;
            for r in records {
                wtr.write_record([(r.i + 1).to_string(), (r.j + 1).to_string(), format_distance(r.dist)])
                    .map_err(csv_error)?;
            }
            wtr.into_inner().map_err(|e| IoError::WriteFile {
                path: path.to_path_buf(),
                source: e.into_error(),
            })?
        }
    };
    fs::write(path, bytes).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!("record batch written");
    Ok(())
}

/// Read a batch written by [`write_records`], as zero-based records.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | file doesn't exist or is unreadable |
/// | [`IoError::Decode`] | not a bincode record envelope |
/// | [`IoError::IncompatibleVersion`] | binary format version mismatch |
/// | [`IoError::CsvParse`] | malformed CSV record |
/// | [`IoError::InvalidHeader`] | CSV header is not `i,j,dist` |
/// | [`IoError::InvalidEntry`] | an index below 1, or an unparseable field |
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_records(path: &Path, format: RecordFormat) -> Result<Vec<DistanceRecord>, IoError> {
    let records = match format {
        RecordFormat::Binary => read_binary(path)?,
        RecordFormat::Csv => read_csv(path)?,
    };
    debug!(n_records = records.len(), "record batch read");
    Ok(records)
}

/// Fold record batch files into an `n x n` matrix, one file in memory at a time.
///
/// Each file's format comes from [`RecordFormat::detect`]. Files may be given
/// in any order; cells no record writes stay 0.
///
/// # Errors
///
/// Any error from [`read_records`], or [`IoError::Pairwise`] for a record
/// outside the matrix.
#[instrument(skip(paths), fields(n_files = paths.len()))]
pub fn merge_files<P: AsRef<Path>>(paths: &[P], n: usize) -> Result<DistanceMatrix, IoError> {
    let mut matrix = DistanceMatrix::unfilled(n);
    for path in paths {
        let path = path.as_ref();
        let records = read_records(path, RecordFormat::detect(path))?;
        matrix = merge_into(matrix, records)?;
    }
    info!(n, "record batches merged");
    Ok(matrix)
}

fn read_binary(path: &Path) -> Result<Vec<DistanceRecord>, IoError> {
    let bytes = fs::read(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let envelope: RecordEnvelope = bincode::deserialize(&bytes).map_err(|e| IoError::Decode {
        path: path.to_path_buf(),
        source: e,
    })?;
    if envelope.format_version != FORMAT_VERSION {
        return Err(IoError::IncompatibleVersion {
            expected: FORMAT_VERSION,
            found: envelope.format_version,
            path: path.to_path_buf(),
        });
    }
    envelope
        .records
        .into_iter()
        .enumerate()
        .map(|(row_index, r)| {
            let i = zero_based(path, row_index, r.i)?;
            let j = zero_based(path, row_index, r.j)?;
            Ok(DistanceRecord::new(i, j, r.dist))
        })
        .collect()
}

fn read_csv(path: &Path) -> Result<Vec<DistanceRecord>, IoError> {
    let file = fs::File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let csv_error = |e: csv::Error| IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let header = rdr.headers().map_err(csv_error)?;
    if header.iter().ne(CSV_HEADER) {
        return Err(IoError::InvalidHeader {
            path: path.to_path_buf(),
            expected: "i,j,dist",
            found: header.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut records = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let row = result.map_err(csv_error)?;
        let invalid = |reason: String| IoError::InvalidEntry {
            path: path.to_path_buf(),
            row_index,
            reason,
        };
        let index = |field: &str| -> Result<usize, IoError> {
            let raw = field.parse::<usize>().map_err(|_| invalid(format!("bad index \"{field}\"")))?;
            zero_based(path, row_index, raw)
        };
        let i = index(&row[0])?;
        let j = index(&row[1])?;
        let dist = parse_distance(&row[2]).ok_or_else(|| invalid(format!("bad distance \"{}\"", &row[2])))?;
        records.push(DistanceRecord::new(i, j, dist));
    }
    Ok(records)
}

fn zero_based(path: &Path, row_index: usize, index: usize) -> Result<usize, IoError> {
    index.checked_sub(1).ok_or_else(|| IoError::InvalidEntry {
        path: path.to_path_buf(),
        row_index,
        reason: "indices are one-based".to_string(),
    })
}

/// `NA` for missing values, otherwise the shortest exact decimal form.
pub(crate) fn format_distance(value: f64) -> String {
    if value.is_nan() {
        MISSING.to_string()
    } else {
        value.to_string()
    }
}

/// Inverse of [`format_distance`]; also accepts `NaN`.
pub(crate) fn parse_distance(raw: &str) -> Option<f64> {
    if raw == MISSING {
        Some(f64::NAN)
    } else {
        raw.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn batch() -> Vec<DistanceRecord> {
        vec![
            DistanceRecord::new(0, 1, 0.25),
            DistanceRecord::new(1, 0, 0.25),
            DistanceRecord::new(2, 0, f64::NAN),
        ]
    }

    fn same(a: &[DistanceRecord], b: &[DistanceRecord]) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| {
                x.i == y.i && x.j == y.j && (x.dist == y.dist || (x.dist.is_nan() && y.dist.is_nan()))
            })
    }

    #[test]
    fn both_formats_preserve_records() {
        let dir = TempDir::new().unwrap();
        for format in [RecordFormat::Binary, RecordFormat::Csv] {
            let path = dir.path().join(format!("part.{}", format.extension()));
            write_records(&path, &batch(), format).unwrap();
            assert_eq!(RecordFormat::detect(&path), format);
            assert!(same(&read_records(&path, format).unwrap(), &batch()), "{format:?}");
        }
    }

    #[test]
    fn csv_is_one_based_with_na() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("part.csv");
        write_records(&path, &batch(), RecordFormat::Csv).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "i,j,dist\n1,2,0.25\n2,1,0.25\n3,1,NA\n");
    }

    #[test]
    fn zero_index_in_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "i,j,dist\n1,2,0.5\n0,1,0.5\n").unwrap();
        let err = read_records(&path, RecordFormat::Csv).unwrap_err();
        assert!(matches!(err, IoError::InvalidEntry { row_index: 1, .. }));
    }

    #[test]
    fn wrong_header_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "row,col,value\n1,2,0.5\n").unwrap();
        assert!(matches!(
            read_records(&path, RecordFormat::Csv),
            Err(IoError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn version_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.bin");
        let envelope = RecordEnvelope {
            format_version: 99,
            records: Vec::new(),
        };
        fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        assert!(matches!(
            read_records(&path, RecordFormat::Binary),
            Err(IoError::IncompatibleVersion { expected: 1, found: 99, .. })
        ));
    }

    #[test]
    fn merge_files_in_any_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.csv");
        write_records(&a, &[DistanceRecord::new(0, 1, 1.0), DistanceRecord::new(1, 0, 1.0)], RecordFormat::Binary)
            .unwrap();
        write_records(&b, &[DistanceRecord::new(1, 2, 2.0), DistanceRecord::new(2, 1, 2.0)], RecordFormat::Csv)
            .unwrap();
        let ab = merge_files(&[&a, &b], 3).unwrap();
        let ba = merge_files(&[&b, &a], 3).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.get(2, 1), 2.0);
        assert_eq!(ab.get(0, 2), 0.0);
    }

    #[test]
    fn merge_files_rejects_out_of_range() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        write_records(&a, &[DistanceRecord::new(0, 5, 1.0)], RecordFormat::Csv).unwrap();
        assert!(matches!(merge_files(&[&a], 3), Err(IoError::Pairwise(_))));
    }
}
