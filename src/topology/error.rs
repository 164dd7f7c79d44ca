use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parsers::bgp_ls::{record::RecordKind, source::SourceError};

/// A record the builder refuses. Building stops at the first one; no graph is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecordError {
    #[error("record #{index}: LSA type is missing")]
    MissingType { index: usize },
    #[error("record #{index}: unrecognized LSA type '{kind}'")]
    UnrecognizedType { index: usize, kind: String },
    #[error("record #{index}: {kind} LSA fields could not be decoded")]
    UndecodableFields { index: usize, kind: RecordKind },
    #[error("record #{index}: {kind} LSA is missing required field '{field}'")]
    MissingRouterId {
        index: usize,
        kind: RecordKind,
        field: &'static str,
    },
}

impl MalformedRecordError {
    /// Position of the offending record in the input sequence.
    pub fn index(&self) -> usize {
        match self {
            MalformedRecordError::MissingType { index }
            | MalformedRecordError::UnrecognizedType { index, .. }
            | MalformedRecordError::UndecodableFields { index, .. }
            | MalformedRecordError::MissingRouterId { index, .. } => *index,
        }
    }
}

/// Two distinct router IDs ended up with the same identity after relabeling.
/// Not an error: the nodes are merged and the build carries on.
#[doc(alias = "IdentityCollisionWarning")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityCollision {
    pub identity: String,
    pub surviving_router_id: String,
    pub absorbed_router_id: String,
}

impl Display for IdentityCollision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' claimed by {} and {}; {} kept",
            self.identity,
            self.absorbed_router_id,
            self.surviving_router_id,
            self.surviving_router_id
        )
    }
}

/// Error type for fetching and building a topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("acquisition error: {0}")]
    Source(#[from] SourceError),
    #[error("malformed record: {0}")]
    Build(#[from] MalformedRecordError),
}

pub type TopologyResult<T> = Result<T, TopologyError>;
