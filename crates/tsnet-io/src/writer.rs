//! Artifact writer: matrices, partitions and networks under one run name.

use std::fs;
use std::path::{Path, PathBuf};

use petgraph::EdgeType;
use serde::Serialize;
use tracing::{debug, info, instrument};
use tsnet_graph::{Network, RecurrenceNetwork, TransitionNetwork};
use tsnet_pairwise::{DistanceMatrix, DistanceRecord};

use crate::domain::RunName;
use crate::matrix::write_matrix;
use crate::records::{RecordFormat, write_records};
use crate::IoError;

/// Writes run artifacts into an output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named:
///
/// | Artifact  | File |
/// |-----------|------|
/// | matrix    | `{run}_matrix.csv` |
/// | partition | `{run}_part{p}of{t}.{bin,csv}` |
/// | network   | `{run}_network.json` |
pub struct ResultWriter {
    output_dir: PathBuf,
    run: RunName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and run name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), run = %run))]
    pub fn new(output_dir: &Path, run: RunName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            run,
        })
    }

    /// Path of the matrix file.
    #[must_use]
    pub fn matrix_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_matrix.csv", self.run))
    }

    /// Path of the network file.
    #[must_use]
    pub fn network_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_network.json", self.run))
    }

    /// Path of the record batch for 1-based `part` of `total_parts`.
    #[must_use]
    pub fn partition_path(&self, part: usize, total_parts: usize, format: RecordFormat) -> PathBuf {
        self.output_dir.join(format!(
            "{}_part{part}of{total_parts}.{}",
            self.run,
            format.extension()
        ))
    }

    /// Write a distance matrix to `{run}_matrix.csv`.
    ///
    /// # Errors
    ///
    /// See [`write_matrix`].
    pub fn write_matrix(&self, matrix: &DistanceMatrix) -> Result<PathBuf, IoError> {
        let path = self.matrix_path();
        write_matrix(&path, matrix)?;
        info!(path = %path.display(), "matrix written");
        Ok(path)
    }

    /// Write one partition's records to `{run}_part{p}of{t}.{ext}`.
    ///
    /// # Errors
    ///
    /// See [`write_records`].
    pub fn write_partition(
        &self,
        records: &[DistanceRecord],
        part: usize,
        total_parts: usize,
        format: RecordFormat,
    ) -> Result<PathBuf, IoError> {
        let path = self.partition_path(part, total_parts, format);
        write_records(&path, records, format)?;
        info!(path = %path.display(), n_records = records.len(), "partition written");
        Ok(path)
    }

    /// Write a network to `{run}_network.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Json`] | serialization failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all)]
    pub fn write_network<Ty: EdgeType>(&self, network: &Network<Ty>) -> Result<PathBuf, IoError> {
        self.write_artifact(&NetworkArtifact::new(self.run.as_str(), network))
    }

    /// Write a recurrence network with its embedding parameters.
    ///
    /// # Errors
    ///
    /// Same as [`write_network`](Self::write_network).
    #[instrument(skip_all)]
    pub fn write_recurrence(&self, recurrence: &RecurrenceNetwork) -> Result<PathBuf, IoError> {
        let mut artifact = NetworkArtifact::new(self.run.as_str(), recurrence.network());
        artifact.recurrence = Some(RecurrenceEntry {
            embedding_dim: recurrence.embedding_dim(),
            lag: recurrence.lag(),
            radius: recurrence.radius(),
        });
        self.write_artifact(&artifact)
    }

    /// Write a transition network with its bin breakpoints.
    ///
    /// # Errors
    ///
    /// Same as [`write_network`](Self::write_network).
    #[instrument(skip_all)]
    pub fn write_transition(&self, transition: &TransitionNetwork) -> Result<PathBuf, IoError> {
        let mut artifact = NetworkArtifact::new(self.run.as_str(), transition.network());
        artifact.breaks = Some(transition.breaks());
        self.write_artifact(&artifact)
    }

    fn write_artifact(&self, artifact: &NetworkArtifact<'_>) -> Result<PathBuf, IoError> {
        let path = self.network_path();
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Json {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), edges = artifact.edges.len(), "network written");
        Ok(path)
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct NetworkArtifact<'a> {
    run: &'a str,
    directed: bool,
    weighted: bool,
    nodes: Vec<&'a str>,
    edges: Vec<EdgeEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recurrence: Option<RecurrenceEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    breaks: Option<&'a [f64]>,
}

impl<'a> NetworkArtifact<'a> {
    fn new<Ty: EdgeType>(run: &'a str, network: &'a Network<Ty>) -> Self {
        let nodes = network.node_names();
        let edges = network
            .edges()
            .into_iter()
            .map(|e| EdgeEntry {
                source: nodes[e.source],
                target: nodes[e.target],
                weight: e.weight,
            })
            .collect();
        Self {
            run,
            directed: network.is_directed(),
            weighted: network.is_weighted(),
            nodes,
            edges,
            recurrence: None,
            breaks: None,
        }
    }
}

#[derive(Serialize)]
struct EdgeEntry<'a> {
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
}

#[derive(Serialize)]
struct RecurrenceEntry {
    embedding_dim: usize,
    lag: usize,
    radius: f64,
}
