//! Error types for trust chain reconciliation
//!
//! Every variant carries the key of the object involved so a failed pass can
//! be traced back to a concrete Secret. Errors are classified by
//! [`ErrorKind`]; callers decide between a short requeue (transient) and a
//! persistent failure condition from that classification alone.

use thiserror::Error;

use crate::config::ObjectKey;

/// Boxed source error from an object store backend
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An upstream object has not been provisioned yet
    NotFound,
    /// Optimistic-concurrency precondition failed
    Conflict,
    /// Transport or serialization failure in the object store
    Store,
    /// Persisted state could not be interpreted
    CorruptState,
    /// A required data field is not populated (yet)
    Incomplete,
}

/// Main error type for trustroll operations
#[derive(Debug, Error)]
pub enum Error {
    /// The upstream root credential Secret does not exist
    #[error("root credential {key} not found")]
    RootCredentialUnavailable {
        /// Key of the missing root credential
        key: ObjectKey,
    },

    /// The trust bundle Secret does not exist
    #[error("trust bundle {key} not found")]
    TrustBundleUnavailable {
        /// Key of the missing trust bundle
        key: ObjectKey,
    },

    /// A conditional write lost against a concurrent writer
    #[error("conflict writing {key}: {message}")]
    Conflict {
        /// Key of the object that was concurrently modified
        key: ObjectKey,
        /// Detail from the store
        message: String,
    },

    /// Object store transport or serialization failure
    #[error("store {operation} failed for {key}: {source}")]
    Store {
        /// Key of the object being accessed
        key: ObjectKey,
        /// Store operation that failed (get, create, update)
        operation: &'static str,
        /// The underlying store error
        #[source]
        source: BoxError,
    },

    /// An annotation does not parse as RFC3339
    #[error("annotation {annotation}={value:?} on {key} is not a valid RFC3339 timestamp")]
    MalformedTimestamp {
        /// Key of the object carrying the annotation
        key: ObjectKey,
        /// Annotation name
        annotation: String,
        /// The unparseable value
        value: String,
        /// Parser error
        #[source]
        source: chrono::ParseError,
    },

    /// A timestamp that must be present is absent
    #[error("{key} has no {field} timestamp")]
    MissingTimestamp {
        /// Key of the object missing the timestamp
        key: ObjectKey,
        /// Annotation or metadata field name
        field: String,
    },

    /// A required data field is missing from a Secret
    #[error("{key} is missing data field {field}")]
    IncompleteCredential {
        /// Key of the incomplete Secret
        key: ObjectKey,
        /// Missing data field
        field: String,
    },
}

impl Error {
    /// Wrap a store backend failure
    pub fn store(
        key: &ObjectKey,
        operation: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Store {
            key: key.clone(),
            operation,
            source: source.into(),
        }
    }

    /// Create a conflict error for the given object
    pub fn conflict(key: &ObjectKey, message: impl Into<String>) -> Self {
        Self::Conflict {
            key: key.clone(),
            message: message.into(),
        }
    }

    /// Create an incomplete-credential error for the given object and field
    pub fn incomplete(key: &ObjectKey, field: impl Into<String>) -> Self {
        Self::IncompleteCredential {
            key: key.clone(),
            field: field.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::RootCredentialUnavailable { .. } | Error::TrustBundleUnavailable { .. } => {
                ErrorKind::NotFound
            }
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Store { .. } => ErrorKind::Store,
            Error::MalformedTimestamp { .. } | Error::MissingTimestamp { .. } => {
                ErrorKind::CorruptState
            }
            Error::IncompleteCredential { .. } => ErrorKind::Incomplete,
        }
    }

    /// Whether a dependent reconciliation should simply requeue
    ///
    /// Not-yet-provisioned objects and lost conditional writes resolve on
    /// their own; anything else is surfaced as a failure condition.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound | ErrorKind::Conflict)
    }

    /// Check if this error is retryable
    ///
    /// Corrupt persisted state needs a human; everything else may succeed on
    /// a later pass.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::CorruptState)
    }

    /// Key of the object this error is about
    pub fn key(&self) -> &ObjectKey {
        match self {
            Error::RootCredentialUnavailable { key }
            | Error::TrustBundleUnavailable { key }
            | Error::Conflict { key, .. }
            | Error::Store { key, .. }
            | Error::MalformedTimestamp { key, .. }
            | Error::MissingTimestamp { key, .. }
            | Error::IncompleteCredential { key, .. } => key,
        }
    }
}
