//! Secret store capability
//!
//! The reconcilers only ever get, create, and update whole Secrets. Updates
//! are conditional on `metadata.resourceVersion`: a write based on a stale
//! read fails with [`Error::Conflict`](crate::Error::Conflict) and the caller
//! redoes the pass from a fresh read.

mod kubernetes;
mod memory;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;

#[cfg(test)]
use mockall::automock;

use crate::config::ObjectKey;
use crate::Result;

pub use self::kubernetes::KubeSecretStore;
pub use self::memory::MemorySecretStore;

/// Trait abstracting Secret persistence
///
/// Implemented by [`KubeSecretStore`] in production and by
/// [`MemorySecretStore`] for tests and simulations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get a Secret, `Ok(None)` if it does not exist
    async fn get(&self, key: &ObjectKey) -> Result<Option<Secret>>;

    /// Create a Secret, returning it as persisted
    ///
    /// Fails with a conflict if the Secret already exists.
    async fn create(&self, secret: &Secret) -> Result<Secret>;

    /// Replace a Secret conditionally on its resourceVersion
    async fn update(&self, secret: &Secret) -> Result<Secret>;
}

/// Key of a Secret from its metadata
///
/// Missing name or namespace map to empty strings; the store then reports
/// the write against an obviously invalid key.
pub fn secret_key(secret: &Secret) -> ObjectKey {
    ObjectKey::new(
        secret.metadata.name.clone().unwrap_or_default(),
        secret.metadata.namespace.clone().unwrap_or_default(),
    )
}

/// An empty Opaque Secret at the given key
pub fn new_secret(key: &ObjectKey) -> Secret {
    Secret {
        metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
            name: Some(key.name.clone()),
            namespace: Some(key.namespace.clone()),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(Default::default()),
        ..Default::default()
    }
}
