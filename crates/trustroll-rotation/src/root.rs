//! Upstream root credential
//!
//! Produced and rotated by an external CA; this crate only reads it.

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Secret;
use trustroll_common::annotations::required_field;
use trustroll_common::{Error, ObjectKey, Result};

/// Serving certificate field in the root credential
pub const ROOT_SOURCE_TLS_CRT: &str = "tls.crt";
/// Serving key field in the root credential
pub const ROOT_SOURCE_TLS_KEY: &str = "tls.key";
/// CA certificate field in the root credential
pub const ROOT_SOURCE_CA_CRT: &str = "ca.crt";

/// Snapshot of the upstream root credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCredential {
    /// Serving certificate
    pub tls_crt: Vec<u8>,
    /// Serving private key
    pub tls_key: Vec<u8>,
    /// CA certificate
    pub ca_crt: Vec<u8>,
    /// When this generation of the credential was issued
    pub issued_at: DateTime<Utc>,
}

impl RootCredential {
    /// Read a root credential from its Secret
    ///
    /// The Secret's creationTimestamp is the issuance time: rotating the
    /// credential recreates the Secret.
    pub fn from_secret(secret: &Secret, key: &ObjectKey) -> Result<Self> {
        let issued_at = secret
            .metadata
            .creation_timestamp
            .as_ref()
            .map(|t| t.0)
            .ok_or_else(|| Error::MissingTimestamp {
                key: key.clone(),
                field: "creationTimestamp".to_string(),
            })?;

        Ok(Self {
            tls_crt: required_field(secret, key, ROOT_SOURCE_TLS_CRT)?,
            tls_key: required_field(secret, key, ROOT_SOURCE_TLS_KEY)?,
            ca_crt: required_field(secret, key, ROOT_SOURCE_CA_CRT)?,
            issued_at,
        })
    }
}
