//! File I/O for tsnet: series readers, directory-backed partitions, record
//! batches, matrices and network artifacts.

mod directory;
mod domain;
mod error;
mod matrix;
mod reader;
mod records;
mod writer;

pub use directory::{SeriesDirectory, write_binary_series};
pub use domain::RunName;
pub use error::IoError;
pub use matrix::{read_matrix, write_matrix};
pub use reader::SeriesReader;
pub use records::{RecordFormat, merge_files, read_records, write_records};
pub use writer::ResultWriter;
