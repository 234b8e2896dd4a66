//! I/O error types for tsnet-io.

use std::path::PathBuf;

use tsnet_pairwise::PairwiseError;

/// Errors from reading series, record batches and matrices, and writing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a series directory cannot be listed.
    #[error("cannot list directory {path}")]
    ReadDir {
        /// Directory that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a file or directory holds no data.
    #[error("empty dataset (no data) in {path}")]
    EmptyDataset {
        /// Path to the file or directory.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} ({id}) has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Identifier in the first column of the offending row.
        id: String,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a series value is NaN, Inf, or not a number.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the file.
        path: PathBuf,
        /// Zero-based row index (excluding header); 0 for single-series files.
        row_index: usize,
        /// Zero-based position of the value within its series.
        col_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when the same series identifier appears more than once.
    #[error("duplicate series id \"{id}\" in {path}: first at row {first_row}, again at row {second_row}")]
    DuplicateId {
        /// Path to the CSV file.
        path: PathBuf,
        /// The duplicated identifier.
        id: String,
        /// Zero-based row index of the first occurrence.
        first_row: usize,
        /// Zero-based row index of the second occurrence.
        second_row: usize,
    },

    /// Returned when a header does not match the expected layout.
    #[error("unexpected header in {path}: expected {expected}, found \"{found}\"")]
    InvalidHeader {
        /// Path to the CSV file.
        path: PathBuf,
        /// Description of the expected header.
        expected: &'static str,
        /// Header as read.
        found: String,
    },

    /// Returned when a record or matrix cell cannot be interpreted.
    #[error("invalid entry in {path}: row {row_index}: {reason}")]
    InvalidEntry {
        /// Path to the file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// What is wrong with the entry.
        reason: String,
    },

    /// Returned when the run name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid run name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidRunName {
        /// The invalid name.
        name: String,
    },

    /// Returned when bincode encoding fails.
    #[error("cannot encode {path}")]
    Encode {
        /// Destination path.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when bincode decoding fails.
    #[error("cannot decode {path}")]
    Decode {
        /// Source path.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when a binary record batch has an unknown format version.
    #[error("incompatible record batch version in {path}: expected {expected}, found {found}")]
    IncompatibleVersion {
        /// The format version this build writes.
        expected: u32,
        /// The format version found in the file.
        found: u32,
        /// Path to the record batch.
        path: PathBuf,
    },

    /// Returned when a JSON artifact cannot be serialized.
    #[error("cannot serialize JSON for {path}")]
    Json {
        /// Destination path.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Wraps an engine, partition or merge error.
    #[error(transparent)]
    Pairwise(#[from] PairwiseError),
}
