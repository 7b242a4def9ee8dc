//! Domain errors for the Ravel campaign engine.

use thiserror::Error;

use crate::domain::models::{EventId, ImageId, IRootId, InstId, Idiom};

/// Domain-level errors that can occur while loading, resolving or running
/// a campaign.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A snapshot referenced an image the registry lacks.
    #[error("Image not found: {0}")]
    UnknownImage(ImageId),

    /// A snapshot referenced an unregistered instruction.
    #[error("Instruction not found: {0}")]
    UnknownInst(InstId),

    /// An iRoot referenced an unknown event.
    #[error("iRoot event not found: {0}")]
    UnknownEvent(EventId),

    /// A memo or history referenced an iRoot outside the catalog.
    #[error("iRoot not found: {0}")]
    UnknownIRoot(IRootId),

    #[error("iRoot {id} has {actual} events but {idiom} requires {expected}")]
    /// An iRoot's event count does not fit its idiom.
    ArityMismatch {
        /// Offending iRoot.
        id: IRootId,
        /// Its declared idiom.
        idiom: Idiom,
        /// Events the idiom requires.
        expected: usize,
        /// Events listed.
        actual: usize,
    },

    #[error("Memo integrity violation: {set} references iRoot {id} with no runtime info")]
    /// A memo set names an iRoot with no runtime info.
    IntegrityViolation {
        /// Name of the set.
        set: &'static str,
        /// The dangling iRoot.
        id: IRootId,
    },

    #[error("Snapshot I/O error on {path}: {reason}")]
    /// Reading or writing a snapshot file failed.
    Snapshot {
        /// File involved.
        path: String,
        /// Underlying I/O error.
        reason: String,
    },

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The target could not be spawned or waited on.
    #[error("Failed to launch target: {0}")]
    LaunchFailed(String),

    /// A report file could not be appended.
    #[error("Reporting sink error: {0}")]
    Reporting(String),
}

/// Result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
