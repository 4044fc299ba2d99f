//! Common types for trustroll: errors, configuration, and object store access
//!
//! Both reconcilers in `trustroll-rotation` talk to Kubernetes Secrets only
//! through the [`store::SecretStore`] capability, so everything they need to
//! read and write an object lives here.

#![deny(missing_docs)]

pub mod accessor;
pub mod annotations;
pub mod clock;
pub mod config;
pub mod error;
pub mod retry;
pub mod store;
pub mod telemetry;

pub use accessor::SecretAccessor;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AnnotationKeys, ObjectKey, RotationConfig};
pub use error::{Error, ErrorKind};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Field manager / reporting component name used for writes and Events
pub const FIELD_MANAGER: &str = "trustroll";
