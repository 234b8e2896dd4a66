//! A directory of series files, loaded one series at a time.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use tsnet_metrics::{SeriesDistance, TimeSeries};
use tsnet_pairwise::{PairwiseError, PartitionConfig, SeriesCollection, SeriesSource};

use crate::records::{RecordFormat, write_records};
use crate::IoError;

/// Series stored one per file in a directory.
///
/// Files are ordered by file name, so series `k` is the `k`-th name in
/// lexicographic order; names are the file stems. A `.bin` file holds a
/// bincode `Vec<f64>`; any other file holds numbers separated by commas,
/// whitespace or newlines. Hidden files and subdirectories are ignored.
///
/// Opening only lists the directory. Values are read by [`load`](Self::load)
/// or, through [`SeriesSource`], inside the worker evaluating a pair.
#[derive(Debug, Clone)]
pub struct SeriesDirectory {
    root: PathBuf,
    files: Vec<PathBuf>,
    names: Vec<String>,
}

impl SeriesDirectory {
    /// List the series files under `root`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::ReadDir`] | the directory cannot be listed |
    /// | [`IoError::EmptyDataset`] | no series files |
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn open(root: &Path) -> Result<Self, IoError> {
        let read_dir_error = |source| IoError::ReadDir {
            path: root.to_path_buf(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(root).map_err(read_dir_error)? {
            let entry = entry.map_err(read_dir_error)?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if path.is_file() && !hidden {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(IoError::EmptyDataset {
                path: root.to_path_buf(),
            });
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        let names = files
            .iter()
            .map(|p| {
                p.file_stem()
                    .map_or_else(String::new, |s| s.to_string_lossy().into_owned())
            })
            .collect();
        info!(n_series = files.len(), "series directory opened");
        Ok(Self {
            root: root.to_path_buf(),
            files,
            names,
        })
    }

    /// The directory this store reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Series files in series order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Read series `index`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Pairwise`] | `index` out of range |
    /// | [`IoError::FileNotFound`] | the file cannot be read |
    /// | [`IoError::Decode`] | a `.bin` file is not a bincode `Vec<f64>` |
    /// | [`IoError::NonFiniteValue`] | a value is NaN, Inf, or not a number |
    /// | [`IoError::EmptyDataset`] | the file holds no values |
    pub fn load(&self, index: usize) -> Result<Vec<f64>, IoError> {
        let path = self.files.get(index).ok_or(PairwiseError::IndexOutOfRange {
            index,
            n: self.files.len(),
        })?;
        let bytes = fs::read(path).map_err(|e| IoError::FileNotFound {
            path: path.clone(),
            source: e,
        })?;
        let values = if path.extension().is_some_and(|ext| ext == "bin") {
            let values: Vec<f64> = bincode::deserialize(&bytes).map_err(|e| IoError::Decode {
                path: path.clone(),
                source: e,
            })?;
            if let Some(col_index) = values.iter().position(|v| !v.is_finite()) {
                return Err(IoError::NonFiniteValue {
                    path: path.clone(),
                    row_index: 0,
                    col_index,
                    raw: values[col_index].to_string(),
                });
            }
            values
        } else {
            parse_text(path, &String::from_utf8_lossy(&bytes))?
        };
        if values.is_empty() {
            return Err(IoError::EmptyDataset { path: path.clone() });
        }
        debug!(index, len = values.len(), "series loaded");
        Ok(values)
    }

    /// Read every series into memory.
    ///
    /// # Errors
    ///
    /// The first error from [`load`](Self::load).
    pub fn load_all(&self) -> Result<SeriesCollection, IoError> {
        let series = (0..self.len())
            .map(|k| {
                let values = self.load(k)?;
                TimeSeries::new(values).map_err(PairwiseError::from).map_err(IoError::from)
            })
            .collect::<Result<Vec<_>, IoError>>()?;
        Ok(SeriesCollection::new(series).with_names(self.names.clone())?)
    }

    /// Compute one partition over this directory and write its records to `output`.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Pairwise`] | invalid concurrency or worker pool failure |
    /// | [`IoError::Encode`] / [`IoError::WriteFile`] | the batch cannot be written |
    #[instrument(skip_all, fields(root = %self.root.display(), part = config.part(), output = %output.display()))]
    pub fn compute_partition<M>(
        &self,
        config: &PartitionConfig,
        metric: &M,
        output: &Path,
        format: RecordFormat,
    ) -> Result<usize, IoError>
    where
        M: SeriesDistance + ?Sized,
    {
        let records = config.compute(self, metric)?;
        write_records(output, &records, format)?;
        info!(records = records.len(), "partition written");
        Ok(records.len())
    }
}

impl SeriesSource for SeriesDirectory {
    fn len(&self) -> usize {
        self.files.len()
    }

    fn names(&self) -> Option<&[String]> {
        Some(&self.names)
    }

    fn fetch(&self, index: usize) -> Result<Cow<'_, [f64]>, PairwiseError> {
        self.load(index)
            .map(Cow::Owned)
            .map_err(|e| PairwiseError::Source {
                index,
                message: e.to_string(),
            })
    }
}

/// Write `values` as a `.bin` series file.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::Encode`] | bincode encoding failed |
/// | [`IoError::WriteFile`] | file write failed |
pub fn write_binary_series(path: &Path, values: &[f64]) -> Result<(), IoError> {
    let bytes = bincode::serialize(values).map_err(|e| IoError::Encode {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, bytes).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_text(path: &Path, text: &str) -> Result<Vec<f64>, IoError> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .enumerate()
        .map(|(col_index, raw)| match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(IoError::NonFiniteValue {
                path: path.to_path_buf(),
                row_index: 0,
                col_index,
                raw: raw.to_string(),
            }),
        })
        .collect()
}
