//! In-memory Secret store
//!
//! Mirrors the API server semantics the reconcilers depend on: create fails
//! on an existing object, update fails unless the caller's resourceVersion is
//! current, and every successful write bumps the version.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use parking_lot::Mutex;

use super::{secret_key, SecretStore};
use crate::clock::{Clock, SystemClock};
use crate::config::ObjectKey;
use crate::error::Error;
use crate::Result;

/// A failure to return from the next write
#[derive(Debug, Clone)]
enum InjectedFailure {
    Conflict(String),
    Store(String),
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<ObjectKey, Secret>,
    next_version: u64,
    writes: usize,
    fail_next_write: Option<InjectedFailure>,
}

impl Inner {
    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    fn take_failure(&mut self, key: &ObjectKey, operation: &'static str) -> Result<()> {
        match self.fail_next_write.take() {
            None => Ok(()),
            Some(InjectedFailure::Conflict(message)) => Err(Error::conflict(key, message)),
            Some(InjectedFailure::Store(message)) => Err(Error::store(key, operation, message)),
        }
    }
}

/// Secret store held in process memory
pub struct MemorySecretStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySecretStore {
    /// Create an empty store stamping creation times from the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store stamping creation times from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
        }
    }

    /// Insert or overwrite a Secret as an external actor would
    ///
    /// Keeps the given creationTimestamp (defaulting to now) and assigns a
    /// fresh resourceVersion. Does not count as a write by the reconcilers.
    pub fn seed(&self, mut secret: Secret) -> Secret {
        let key = secret_key(&secret);
        let mut inner = self.inner.lock();
        if secret.metadata.creation_timestamp.is_none() {
            secret.metadata.creation_timestamp = Some(Time(self.clock.now()));
        }
        secret.metadata.resource_version = Some(inner.bump_version());
        inner.objects.insert(key, secret.clone());
        secret
    }

    /// Current state of a Secret without going through the async trait
    pub fn peek(&self, key: &ObjectKey) -> Option<Secret> {
        self.inner.lock().objects.get(key).cloned()
    }

    /// Delete a Secret
    pub fn remove(&self, key: &ObjectKey) -> Option<Secret> {
        self.inner.lock().objects.remove(key)
    }

    /// Number of successful create/update calls
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }

    /// Make the next create/update fail with a conflict
    pub fn fail_next_write_with_conflict(&self, message: impl Into<String>) {
        self.inner.lock().fail_next_write = Some(InjectedFailure::Conflict(message.into()));
    }

    /// Make the next create/update fail with a store error
    pub fn fail_next_write_with_store_error(&self, message: impl Into<String>) {
        self.inner.lock().fail_next_write = Some(InjectedFailure::Store(message.into()));
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Secret>> {
        Ok(self.peek(key))
    }

    async fn create(&self, secret: &Secret) -> Result<Secret> {
        let key = secret_key(secret);
        let mut inner = self.inner.lock();
        inner.take_failure(&key, "create")?;
        if inner.objects.contains_key(&key) {
            return Err(Error::conflict(&key, "already exists"));
        }

        let mut stored = secret.clone();
        stored.metadata.creation_timestamp = Some(Time(self.clock.now()));
        stored.metadata.resource_version = Some(inner.bump_version());
        inner.objects.insert(key, stored.clone());
        inner.writes += 1;
        Ok(stored)
    }

    async fn update(&self, secret: &Secret) -> Result<Secret> {
        let key = secret_key(secret);
        let mut inner = self.inner.lock();
        inner.take_failure(&key, "update")?;

        let current_version = match inner.objects.get(&key) {
            Some(current) => current.metadata.resource_version.clone(),
            None => return Err(Error::store(&key, "update", "object does not exist")),
        };
        if secret.metadata.resource_version.is_none()
            || secret.metadata.resource_version != current_version
        {
            return Err(Error::conflict(
                &key,
                format!(
                    "resourceVersion {:?} does not match current {:?}",
                    secret.metadata.resource_version, current_version
                ),
            ));
        }

        let mut stored = secret.clone();
        stored.metadata.resource_version = Some(inner.bump_version());
        inner.objects.insert(key, stored.clone());
        inner.writes += 1;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::new_secret;

    fn key() -> ObjectKey {
        ObjectKey::new("gateway-secret", "istio-system")
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemorySecretStore::new();
        assert!(store.get(&key()).await.unwrap().is_none());

        let created = store.create(&new_secret(&key())).await.unwrap();
        assert!(created.metadata.resource_version.is_some());
        assert!(created.metadata.creation_timestamp.is_some());

        let fetched = store.get(&key()).await.unwrap().expect("secret should exist");
        assert_eq!(fetched.metadata.resource_version, created.metadata.resource_version);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = MemorySecretStore::new();
        store.create(&new_secret(&key())).await.unwrap();

        let err = store.create(&new_secret(&key())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = MemorySecretStore::new();
        let first = store.create(&new_secret(&key())).await.unwrap();

        // Another writer lands first
        let second = store.update(&first).await.unwrap();
        assert_ne!(first.metadata.resource_version, second.metadata.resource_version);

        let err = store.update(&first).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_update_without_version_conflicts() {
        let store = MemorySecretStore::new();
        store.create(&new_secret(&key())).await.unwrap();

        let err = store.update(&new_secret(&key())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_update_missing_object_is_store_error() {
        let store = MemorySecretStore::new();
        let mut secret = new_secret(&key());
        secret.metadata.resource_version = Some("1".to_string());

        let err = store.update(&secret).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Store);
    }

    #[tokio::test]
    async fn test_injected_failures_apply_once() {
        let store = MemorySecretStore::new();
        store.fail_next_write_with_store_error("etcd timeout");

        let err = store.create(&new_secret(&key())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Store);
        assert!(store.peek(&key()).is_none());

        store.create(&new_secret(&key())).await.unwrap();
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_seed_is_not_counted_as_write() {
        let store = MemorySecretStore::new();
        let seeded = store.seed(new_secret(&key()));
        assert!(seeded.metadata.resource_version.is_some());
        assert_eq!(store.writes(), 0);
        assert!(store.remove(&key()).is_some());
        assert!(store.peek(&key()).is_none());
    }
}
