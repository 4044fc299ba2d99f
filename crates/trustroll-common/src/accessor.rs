//! Timestamp-stamping access to the Secret store
//!
//! Every state-changing write made by a reconciler goes through
//! [`SecretAccessor`], which sets the `lastModifiedAt` annotation right before
//! the single whole-object write. Reads are passed through unchanged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Secret;

use crate::annotations::set_timestamp;
use crate::clock::Clock;
use crate::config::ObjectKey;
use crate::store::SecretStore;
use crate::Result;

/// Shared get/create/update accessor used by both reconcilers
#[derive(Clone)]
pub struct SecretAccessor {
    store: Arc<dyn SecretStore>,
    clock: Arc<dyn Clock>,
    last_modified_annotation: String,
}

impl SecretAccessor {
    /// Create an accessor stamping `last_modified_annotation` from `clock`
    pub fn new(
        store: Arc<dyn SecretStore>,
        clock: Arc<dyn Clock>,
        last_modified_annotation: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            last_modified_annotation: last_modified_annotation.into(),
        }
    }

    /// Current time according to the accessor's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Get a Secret, `Ok(None)` if absent
    pub async fn find(&self, key: &ObjectKey) -> Result<Option<Secret>> {
        self.store.get(key).await
    }

    /// Stamp and create a Secret
    pub async fn create(&self, mut secret: Secret) -> Result<Secret> {
        self.stamp(&mut secret);
        self.store.create(&secret).await
    }

    /// Stamp and conditionally replace a Secret
    pub async fn update(&self, mut secret: Secret) -> Result<Secret> {
        self.stamp(&mut secret);
        self.store.update(&secret).await
    }

    /// Conditionally replace a Secret without touching `lastModifiedAt`
    ///
    /// For writes that do not change trust material, such as an external
    /// migration signal.
    pub async fn update_unstamped(&self, secret: &Secret) -> Result<Secret> {
        self.store.update(secret).await
    }

    fn stamp(&self, secret: &mut Secret) {
        set_timestamp(secret, &self.last_modified_annotation, self.clock.now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::read_timestamp;
    use crate::clock::ManualClock;
    use crate::error::Error;
    use crate::store::{new_secret, MockSecretStore};
    use chrono::{TimeZone, Utc};

    fn key() -> ObjectKey {
        ObjectKey::new("ca-bundle", "kcp-system")
    }

    #[tokio::test]
    async fn test_create_stamps_last_modified_at() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut store = MockSecretStore::new();
        store
            .expect_create()
            .withf(move |s| {
                read_timestamp(s, &key(), "lastModifiedAt").ok().flatten() == Some(now)
            })
            .times(1)
            .returning(|s| Ok(s.clone()));

        let accessor = SecretAccessor::new(
            Arc::new(store),
            Arc::new(ManualClock::new(now)),
            "lastModifiedAt",
        );
        accessor.create(new_secret(&key())).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_propagates_conflict_unchanged() {
        let mut store = MockSecretStore::new();
        store
            .expect_update()
            .times(1)
            .returning(|s| Err(Error::conflict(&crate::store::secret_key(s), "stale")));

        let accessor = SecretAccessor::new(
            Arc::new(store),
            Arc::new(ManualClock::new(Utc::now())),
            "lastModifiedAt",
        );
        let err = accessor.update(new_secret(&key())).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_unstamped_leaves_annotation_alone() {
        let mut store = MockSecretStore::new();
        store
            .expect_update()
            .withf(|s| s.metadata.annotations.is_none())
            .times(1)
            .returning(|s| Ok(s.clone()));

        let accessor = SecretAccessor::new(
            Arc::new(store),
            Arc::new(ManualClock::new(Utc::now())),
            "lastModifiedAt",
        );
        accessor.update_unstamped(&new_secret(&key())).await.unwrap();
    }
}
