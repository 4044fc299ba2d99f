//! Errors surfaced by the operator

use std::time::Duration;

use thiserror::Error;
use trustroll_common::{ErrorKind, ObjectKey};

/// Operator-level error
#[derive(Debug, Error)]
pub enum Error {
    /// A reconciler or store operation failed
    #[error(transparent)]
    Rotation(#[from] trustroll_common::Error),

    /// A pass did not finish within the configured bound
    #[error("reconcile pass timed out after {0:?}")]
    Timeout(Duration),

    /// Output could not be encoded
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the pass should be requeued on the short interval
    ///
    /// A timed-out pass wrote nothing or exactly one whole object, so it is
    /// as safe to redo as a lost conditional write.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Rotation(e) => e.is_transient(),
            Error::Timeout(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Secret the failure is about, if it concerns a single object
    pub fn key(&self) -> Option<&ObjectKey> {
        match self {
            Error::Rotation(e) => Some(e.key()),
            Error::Timeout(_) | Error::Json(_) => None,
        }
    }

    /// Whether a conditional write lost to a concurrent writer
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Rotation(e) if e.kind() == ErrorKind::Conflict)
    }
}
