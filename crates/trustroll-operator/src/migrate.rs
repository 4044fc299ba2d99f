//! Setting the external "all clients migrated" signal by hand
//!
//! Consumers normally report adoption of the new CA themselves. This is the
//! operator escape hatch for when they cannot.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use trustroll_common::annotations::set_flag;
use trustroll_common::store::SecretStore;
use trustroll_common::{Clock, Error, Result, RotationConfig, SecretAccessor};
use trustroll_rotation::TrustBundle;

/// Result of a mark-migrated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkOutcome {
    /// The signal was set; the next pass collapses the history
    Marked,
    /// The signal was already set
    AlreadyMarked,
    /// No migration window is open; nothing was written
    NoMigrationPending,
}

/// Set `allClientsMigrated` on the trust bundle
///
/// The write is conditional on the resourceVersion that was read and does
/// not move `lastModifiedAt`: the trust material itself is unchanged until
/// the reconciler collapses the history.
pub async fn mark_all_clients_migrated(
    store: Arc<dyn SecretStore>,
    clock: Arc<dyn Clock>,
    config: &RotationConfig,
) -> Result<MarkOutcome> {
    let key = &config.trust_bundle;
    let annotations = &config.annotations;
    let accessor = SecretAccessor::new(store, clock, annotations.last_modified_at.clone());

    let mut secret = accessor
        .find(key)
        .await?
        .ok_or_else(|| Error::TrustBundleUnavailable { key: key.clone() })?;
    let bundle = TrustBundle::from_secret(&secret, key, annotations)?;

    if bundle.all_clients_migrated {
        return Ok(MarkOutcome::AlreadyMarked);
    }
    if !bundle.migration_pending {
        return Ok(MarkOutcome::NoMigrationPending);
    }

    set_flag(&mut secret, &annotations.all_clients_migrated, true);
    accessor.update_unstamped(&secret).await?;
    info!(key = %key, "marked all clients migrated");
    Ok(MarkOutcome::Marked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use trustroll_common::annotations::{read_flag, set_data_field, set_timestamp};
    use trustroll_common::store::{new_secret, MemorySecretStore};
    use trustroll_common::ManualClock;

    fn seed_bundle(store: &MemorySecretStore, config: &RotationConfig, pending: bool) {
        let mut secret = new_secret(&config.trust_bundle);
        for field in ["root.tls.crt", "root.tls.key", "root.ca.crt", "ca-bundle-0"] {
            set_data_field(&mut secret, field, b"B".to_vec());
        }
        if pending {
            set_data_field(&mut secret, "ca-bundle-1", b"A".to_vec());
        }
        set_timestamp(
            &mut secret,
            "lastModifiedAt",
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        );
        set_flag(&mut secret, "migrationPending", pending);
        store.seed(secret);
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_marks_pending_bundle_without_restamping() {
        let store = Arc::new(MemorySecretStore::new());
        let config = RotationConfig::default();
        seed_bundle(&store, &config, true);
        let before = store.peek(&config.trust_bundle).unwrap();

        let outcome = mark_all_clients_migrated(store.clone(), clock(), &config)
            .await
            .unwrap();

        assert_eq!(outcome, MarkOutcome::Marked);
        let after = store.peek(&config.trust_bundle).unwrap();
        assert!(read_flag(&after, "allClientsMigrated"));
        assert_eq!(
            after.metadata.annotations.as_ref().unwrap().get("lastModifiedAt"),
            before.metadata.annotations.as_ref().unwrap().get("lastModifiedAt"),
        );

        let again = mark_all_clients_migrated(store.clone(), clock(), &config)
            .await
            .unwrap();
        assert_eq!(again, MarkOutcome::AlreadyMarked);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_stable_bundle_is_left_alone() {
        let store = Arc::new(MemorySecretStore::new());
        let config = RotationConfig::default();
        seed_bundle(&store, &config, false);

        let outcome = mark_all_clients_migrated(store.clone(), clock(), &config)
            .await
            .unwrap();

        assert_eq!(outcome, MarkOutcome::NoMigrationPending);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_missing_bundle_is_unavailable() {
        let store = Arc::new(MemorySecretStore::new());
        let err = mark_all_clients_migrated(store, clock(), &RotationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TrustBundleUnavailable { .. }));
    }
}
