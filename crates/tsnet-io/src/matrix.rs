//! Distance matrix CSV files.
//!
//! Layout: a header `,name_1,...,name_n`, then one row per series starting
//! with its name. Missing cells are written as `NA`.

use std::fs;
use std::path::Path;

use tracing::{debug, instrument};
use tsnet_pairwise::DistanceMatrix;

use crate::records::{format_distance, parse_distance};
use crate::IoError;

/// Write `matrix` as CSV, labelling rows and columns with [`DistanceMatrix::labels`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::CsvParse`] | CSV writing failed |
/// | [`IoError::WriteFile`] | file write failed |
#[instrument(skip_all, fields(path = %path.display(), n = matrix.len()))]
pub fn write_matrix(path: &Path, matrix: &DistanceMatrix) -> Result<(), IoError> {
    let csv_error = |e: csv::Error| IoError::CsvParse {
        path: path.to_path_buf(),
        offset: 0,
        source: e,
    };
    let labels = matrix.labels();
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(std::iter::once("").chain(labels.iter().map(String::as_str)))
        .map_err(csv_error)?;
    for (i, label) in labels.iter().enumerate() {
        let row = matrix.row(i).iter().map(|&v| format_distance(v));
        wtr.write_record(std::iter::once(label.clone()).chain(row))
            .map_err(csv_error)?;
    }
    let bytes = wtr.into_inner().map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e.into_error(),
    })?;
    fs::write(path, bytes).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!("matrix written");
    Ok(())
}

/// Read a matrix written by [`write_matrix`]. Header labels become the names.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | file doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | malformed CSV record |
/// | [`IoError::InvalidHeader`] | header does not start with an empty cell |
/// | [`IoError::InconsistentRowLength`] | a row has a different column count than the header |
/// | [`IoError::InvalidEntry`] | an unparseable cell, a row label out of order, or a row count differing from the column count |
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_matrix(path: &Path) -> Result<DistanceMatrix, IoError> {
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
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let header = rdr.headers().map_err(csv_error)?;
    if header.get(0) != Some("") {
        return Err(IoError::InvalidHeader {
            path: path.to_path_buf(),
            expected: "an empty first cell followed by series names",
            found: header.iter().collect::<Vec<_>>().join(","),
        });
    }
    let names: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
    let n = names.len();

    let mut rows = Vec::with_capacity(n);
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_error)?;
        let invalid = |reason: String| IoError::InvalidEntry {
            path: path.to_path_buf(),
            row_index,
            reason,
        };
        let label = record.get(0).unwrap_or("");
        if record.len() != n + 1 {
            return Err(IoError::InconsistentRowLength {
                path: path.to_path_buf(),
                row_index,
                id: label.to_string(),
                expected: n + 1,
                got: record.len(),
            });
        }
        if names.get(row_index).map(String::as_str) != Some(label) {
            return Err(invalid(format!("row label \"{label}\" does not match its column")));
        }
        let values = record
            .iter()
            .skip(1)
            .map(|raw| parse_distance(raw).ok_or_else(|| invalid(format!("bad cell \"{raw}\""))))
            .collect::<Result<Vec<f64>, IoError>>()?;
        rows.push(values);
    }
    if rows.len() != n {
        return Err(IoError::InvalidEntry {
            path: path.to_path_buf(),
            row_index: rows.len(),
            reason: format!("{} rows for {n} columns", rows.len()),
        });
    }
    let matrix = DistanceMatrix::from_rows(rows)?.with_names(names)?;
    debug!(n, "matrix read");
    Ok(matrix)
}
