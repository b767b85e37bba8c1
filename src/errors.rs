// /src/errors.rs
//! Diagnostics for the changeset debugger. None of these ever abort the host's update.
use thiserror::Error;

use crate::types::ChangeType;

#[derive(Error, Debug)]
pub enum ChangesetDebugError {
    #[error("{kind} does not expose its `{field}` field")]
    MissingDiffData {
        kind: &'static str,
        field: &'static str,
    },

    #[error("{change} at logical index {index} resolved to position {position}, but only {len} items are tracked")]
    PositionOutOfBounds {
        change: ChangeType,
        index: usize,
        position: usize,
        len: usize,
    },

    #[error("{change} claims {count} items but only {supplied} were supplied")]
    RangeExceedsSuppliedItems {
        change: ChangeType,
        count: usize,
        supplied: usize,
    },

    #[error("A changeset listener is already installed for this process")]
    ListenerAlreadyInstalled,

    #[error("Unknown change type: {0}")]
    UnknownChangeType(String),

    #[error("Unknown attribution: {0}")]
    UnknownAttribution(String),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T, E = ChangesetDebugError> = std::result::Result<T, E>;
