//! Object keys and annotation names used by the reconcilers
//!
//! Nothing here is a process-wide global: a [`RotationConfig`] is built once
//! and handed to each reconciler, so independent instances (tests, multiple
//! credential pairs) never share state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default namespace of the upstream root credential and the gateway credential
pub const DEFAULT_GATEWAY_NAMESPACE: &str = "istio-system";
/// Default namespace of the trust bundle
pub const DEFAULT_BUNDLE_NAMESPACE: &str = "kcp-system";
/// Default name of the upstream root credential Secret
pub const DEFAULT_ROOT_CREDENTIAL_NAME: &str = "klm-watcher-root-secret";
/// Default name of the trust bundle Secret
pub const DEFAULT_TRUST_BUNDLE_NAME: &str = "ca-bundle";
/// Default name of the gateway credential Secret
pub const DEFAULT_GATEWAY_CREDENTIAL_NAME: &str = "gateway-secret";

/// Stable (name, namespace) identity of a Secret
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    /// Object name
    pub name: String,
    /// Object namespace
    pub namespace: String,
}

impl ObjectKey {
    /// Create a key from a name and namespace
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Annotation names carrying rotation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnotationKeys {
    /// RFC3339 timestamp of the last state-changing write
    pub last_modified_at: String,
    /// RFC3339 issuance time of the root credential last mirrored into the bundle
    pub root_issued_at: String,
    /// `"true"` while two CA generations must both be trusted
    pub migration_pending: String,
    /// `"true"` once every consumer has adopted the newest CA
    pub all_clients_migrated: String,
}

impl Default for AnnotationKeys {
    fn default() -> Self {
        Self {
            last_modified_at: "lastModifiedAt".to_string(),
            root_issued_at: "rootIssuedAt".to_string(),
            migration_pending: "migrationPending".to_string(),
            all_clients_migrated: "allClientsMigrated".to_string(),
        }
    }
}

/// Locations of the three Secrets taking part in a rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationConfig {
    /// Upstream root credential (read-only)
    pub root_credential: ObjectKey,
    /// Trust bundle owned by the trust bundle reconciler
    pub trust_bundle: ObjectKey,
    /// Gateway credential owned by the gateway reconciler
    pub gateway_credential: ObjectKey,
    /// Annotation names
    #[serde(default)]
    pub annotations: AnnotationKeys,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            root_credential: ObjectKey::new(
                DEFAULT_ROOT_CREDENTIAL_NAME,
                DEFAULT_GATEWAY_NAMESPACE,
            ),
            trust_bundle: ObjectKey::new(DEFAULT_TRUST_BUNDLE_NAME, DEFAULT_BUNDLE_NAMESPACE),
            gateway_credential: ObjectKey::new(
                DEFAULT_GATEWAY_CREDENTIAL_NAME,
                DEFAULT_GATEWAY_NAMESPACE,
            ),
            annotations: AnnotationKeys::default(),
        }
    }
}
