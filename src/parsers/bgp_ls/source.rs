/*!
Transport-neutral BGP-LS record sources.

This module defines:
- `LsdbSource`: a tiny async trait that returns classified `LsaRecord`s without
  exposing where they came from (live RPC, snapshot file, fixtures).
- `SnapshotFileSource`: reads a JSON/YAML snapshot, either already-classified records
  or a raw GoBGP `ListPath` dump.
- `SourceError`: acquisition and decoding errors at the source layer.
*/

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::parsers::bgp_ls::{
    gobgp_json::{self, ClassifyError, ListPathResponse},
    record::LsaRecord,
};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML snapshot: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("cannot tell snapshot encoding from file name: {0}")]
    UnsupportedEncoding(PathBuf),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// What a snapshot file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotFormat {
    /// A list of tagged `LsaRecord`s.
    #[default]
    Records,
    /// The unfiltered output of GoBGP's `ListPath` for the BGP-LS family.
    GobgpListPath,
}

impl FromStr for SnapshotFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "records" => Ok(SnapshotFormat::Records),
            "gobgp" | "gobgp-list-path" => Ok(SnapshotFormat::GobgpListPath),
            other => Err(format!(
                "unknown snapshot format '{other}' (expected 'records' or 'gobgp')"
            )),
        }
    }
}

impl Display for SnapshotFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotFormat::Records => write!(f, "records"),
            SnapshotFormat::GobgpListPath => write!(f, "gobgp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Yaml,
}

impl Encoding {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Encoding::Json),
            "yaml" | "yml" => Some(Encoding::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    pub format: SnapshotFormat,
}

impl SnapshotConfig {
    pub fn new(path: impl Into<PathBuf>, format: SnapshotFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

/// A small async interface for fetching the BGP-LS table as classified records.
#[async_trait]
pub trait LsdbSource: Send + Sync {
    async fn fetch_records(&mut self) -> Result<Vec<LsaRecord>, SourceError>;
}

/// Decodes snapshot text that has already been read into memory.
pub fn decode_snapshot(
    text: &str,
    encoding: Encoding,
    format: SnapshotFormat,
) -> Result<Vec<LsaRecord>, SourceError> {
    let records = match (format, encoding) {
        (SnapshotFormat::Records, Encoding::Json) => serde_json::from_str(text)?,
        (SnapshotFormat::Records, Encoding::Yaml) => serde_yaml::from_str(text)?,
        (SnapshotFormat::GobgpListPath, Encoding::Json) => {
            let responses: Vec<ListPathResponse> = serde_json::from_str(text)?;
            gobgp_json::classify_destinations(&responses)?
        }
        (SnapshotFormat::GobgpListPath, Encoding::Yaml) => {
            let responses: Vec<ListPathResponse> = serde_yaml::from_str(text)?;
            gobgp_json::classify_destinations(&responses)?
        }
    };
    Ok(records)
}

/// Reads a snapshot file every time records are requested.
pub struct SnapshotFileSource {
    config: SnapshotConfig,
}

impl SnapshotFileSource {
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }
}

#[async_trait]
impl LsdbSource for SnapshotFileSource {
    async fn fetch_records(&mut self) -> Result<Vec<LsaRecord>, SourceError> {
        let path = &self.config.path;
        let encoding = Encoding::from_path(path)
            .ok_or_else(|| SourceError::UnsupportedEncoding(path.clone()))?;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;
        let records = decode_snapshot(&text, encoding, self.config.format)?;
        debug!(
            path = %path.display(),
            format = %self.config.format,
            records = records.len(),
            "loaded LSDB snapshot"
        );
        Ok(records)
    }
}

/// Records held in memory, handed out as-is on every fetch.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<LsaRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<LsaRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl LsdbSource for StaticSource {
    async fn fetch_records(&mut self) -> Result<Vec<LsaRecord>, SourceError> {
        Ok(self.records.clone())
    }
}
