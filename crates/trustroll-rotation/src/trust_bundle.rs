//! Trust bundle reconciliation
//!
//! The trust bundle is the durable record of which CAs are trusted and
//! whether a migration window is open. Only [`TrustBundleReconciler`] writes
//! it, apart from the external `allClientsMigrated` signal.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Secret;
use serde::Serialize;
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

use trustroll_common::annotations::{
    clear_annotation, data_field, read_flag, read_timestamp, remove_data_field, required_field,
    set_data_field, set_flag, set_timestamp,
};
use trustroll_common::store::{new_secret, SecretStore};
use trustroll_common::{
    AnnotationKeys, Clock, Error, ObjectKey, Result, RotationConfig, SecretAccessor,
};

use crate::history::{CaHistory, MAX_CA_SLOTS};
use crate::root::RootCredential;

/// Mirrored root serving certificate field
pub const BUNDLE_ROOT_TLS_CRT: &str = "root.tls.crt";
/// Mirrored root serving key field
pub const BUNDLE_ROOT_TLS_KEY: &str = "root.tls.key";
/// Mirrored root CA field
pub const BUNDLE_ROOT_CA_CRT: &str = "root.ca.crt";

/// Parsed trust bundle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustBundle {
    /// Mirror of the root serving certificate
    pub root_tls_crt: Vec<u8>,
    /// Mirror of the root serving key
    pub root_tls_key: Vec<u8>,
    /// Mirror of the root CA
    pub root_ca_crt: Vec<u8>,
    /// Issuance time of the mirrored root; absent on bundles written before it was recorded
    pub root_issued_at: Option<DateTime<Utc>>,
    /// Trusted CAs, newest first
    pub history: CaHistory,
    /// Time of the last state-changing write
    pub last_modified_at: DateTime<Utc>,
    /// Two CA generations must both be trusted
    pub migration_pending: bool,
    /// External signal that the previous CA can be dropped
    pub all_clients_migrated: bool,
}

/// How the root credential relates to what the bundle last recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootChange {
    None,
    /// A different CA: open (or extend) a migration window
    NewCa,
    /// Same CA, reissued or edited serving material
    Reissued,
}

impl TrustBundle {
    /// Fresh bundle trusting only the root's CA
    pub fn bootstrap(root: &RootCredential, now: DateTime<Utc>) -> Self {
        Self {
            root_tls_crt: root.tls_crt.clone(),
            root_tls_key: root.tls_key.clone(),
            root_ca_crt: root.ca_crt.clone(),
            root_issued_at: Some(root.issued_at),
            history: CaHistory::new(root.ca_crt.clone()),
            last_modified_at: now,
            migration_pending: false,
            all_clients_migrated: false,
        }
    }

    /// Parse a trust bundle Secret
    pub fn from_secret(secret: &Secret, key: &ObjectKey, annotations: &AnnotationKeys) -> Result<Self> {
        let last_modified_at = read_timestamp(secret, key, &annotations.last_modified_at)?
            .ok_or_else(|| Error::MissingTimestamp {
                key: key.clone(),
                field: annotations.last_modified_at.clone(),
            })?;

        let slots: [Option<Vec<u8>>; MAX_CA_SLOTS] = std::array::from_fn(|i| {
            data_field(secret, &CaHistory::slot_field(i)).map(<[u8]>::to_vec)
        });
        let history = CaHistory::from_slots(slots)
            .ok_or_else(|| Error::incomplete(key, CaHistory::slot_field(0)))?;

        Ok(Self {
            root_tls_crt: required_field(secret, key, BUNDLE_ROOT_TLS_CRT)?,
            root_tls_key: required_field(secret, key, BUNDLE_ROOT_TLS_KEY)?,
            root_ca_crt: required_field(secret, key, BUNDLE_ROOT_CA_CRT)?,
            root_issued_at: read_timestamp(secret, key, &annotations.root_issued_at)?,
            history,
            last_modified_at,
            migration_pending: read_flag(secret, &annotations.migration_pending),
            all_clients_migrated: read_flag(secret, &annotations.all_clients_migrated),
        })
    }

    /// Write data fields and flags into `secret`
    ///
    /// `lastModifiedAt` is left to the accessor, which stamps it on write.
    pub fn write_into(&self, secret: &mut Secret, annotations: &AnnotationKeys) {
        set_data_field(secret, BUNDLE_ROOT_TLS_CRT, self.root_tls_crt.clone());
        set_data_field(secret, BUNDLE_ROOT_TLS_KEY, self.root_tls_key.clone());
        set_data_field(secret, BUNDLE_ROOT_CA_CRT, self.root_ca_crt.clone());

        for index in 0..MAX_CA_SLOTS {
            let field = CaHistory::slot_field(index);
            match self.history.slot(index) {
                Some(ca) => set_data_field(secret, &field, ca.to_vec()),
                None => remove_data_field(secret, &field),
            }
        }

        match self.root_issued_at {
            Some(ts) => set_timestamp(secret, &annotations.root_issued_at, ts),
            None => clear_annotation(secret, &annotations.root_issued_at),
        }
        set_flag(secret, &annotations.migration_pending, self.migration_pending);
        set_flag(secret, &annotations.all_clients_migrated, self.all_clients_migrated);
    }

    /// Concatenated trust chain, slot 0 first
    pub fn chain(&self) -> Vec<u8> {
        self.history.chain()
    }

    /// Classify the root against what was last mirrored
    ///
    /// Issuance is compared with the recorded root issuance time, never with
    /// `lastModifiedAt`: the two come from different clocks, and a root issued
    /// ahead of the local clock must not look new again after every write.
    fn detect_change(&self, root: &RootCredential) -> RootChange {
        let recorded = self.root_issued_at.unwrap_or(self.last_modified_at);
        let reissued = root.issued_at > recorded;
        let edited = root.ca_crt != self.root_ca_crt
            || root.tls_crt != self.root_tls_crt
            || root.tls_key != self.root_tls_key;

        if !reissued && !edited {
            RootChange::None
        } else if root.ca_crt != self.history.current() {
            RootChange::NewCa
        } else {
            RootChange::Reissued
        }
    }

    fn mirror(&mut self, root: &RootCredential) {
        self.root_tls_crt = root.tls_crt.clone();
        self.root_tls_key = root.tls_key.clone();
        self.root_ca_crt = root.ca_crt.clone();
        self.root_issued_at = Some(root.issued_at);
    }

    fn rotate(&mut self, root: &RootCredential) -> Option<Vec<u8>> {
        let dropped = self.history.rotate_in(root.ca_crt.clone());
        self.mirror(root);
        self.migration_pending = true;
        dropped
    }

    fn collapse(&mut self, root: &RootCredential) -> usize {
        let discarded = self.history.len().saturating_sub(1);
        self.history.collapse_to(root.ca_crt.clone());
        self.mirror(root);
        self.migration_pending = false;
        self.all_clients_migrated = false;
        discarded
    }
}

/// What a trust bundle pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BundleOutcome {
    /// The bundle did not exist and was created from the root credential
    Created,
    /// A new CA was rotated into slot 0 and the migration window opened
    MigrationStarted {
        /// A window was already open and has been extended
        extended: bool,
        /// The oldest CA fell off the end of the history
        dropped_oldest: bool,
    },
    /// Root serving material was re-mirrored without a CA change
    Refreshed,
    /// The migration window was closed
    Collapsed {
        /// Number of superseded CAs discarded
        discarded: usize,
    },
    /// Nothing to do; no write happened
    Unchanged,
}

impl BundleOutcome {
    /// Whether the pass wrote the bundle
    pub fn changed(&self) -> bool {
        !matches!(self, BundleOutcome::Unchanged)
    }
}

/// Read access to the current trust bundle
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TrustBundleLookup: Send + Sync {
    /// Current trust bundle, or [`Error::TrustBundleUnavailable`]
    async fn find_trust_bundle(&self) -> Result<TrustBundle>;
}

/// Maintains the trust bundle from the root credential
pub struct TrustBundleReconciler {
    accessor: SecretAccessor,
    config: Arc<RotationConfig>,
}

impl TrustBundleReconciler {
    /// Create a reconciler over `store`
    pub fn new(
        store: Arc<dyn SecretStore>,
        clock: Arc<dyn Clock>,
        config: Arc<RotationConfig>,
    ) -> Self {
        let accessor = SecretAccessor::new(store, clock, config.annotations.last_modified_at.clone());
        Self { accessor, config }
    }

    /// Run one pass
    ///
    /// Performs at most one whole-object write. A pass that finds nothing to
    /// do writes nothing, so `lastModifiedAt` only moves on real changes.
    pub async fn reconcile(&self) -> Result<BundleOutcome> {
        let key = &self.config.trust_bundle;
        let annotations = &self.config.annotations;

        let Some(secret) = self.accessor.find(key).await? else {
            return self.bootstrap().await;
        };

        let root = self.find_root().await?;
        let mut bundle = TrustBundle::from_secret(&secret, key, annotations)?;

        let outcome = if bundle.all_clients_migrated {
            if root.ca_crt != bundle.history.current() {
                warn!(
                    key = %key,
                    "root CA changed before the migration window closed; collapsing onto the new CA"
                );
            }
            let discarded = bundle.collapse(&root);
            BundleOutcome::Collapsed { discarded }
        } else {
            match bundle.detect_change(&root) {
                RootChange::None => {
                    debug!(key = %key, "trust bundle up to date");
                    return Ok(BundleOutcome::Unchanged);
                }
                RootChange::NewCa => {
                    let extended = bundle.migration_pending;
                    let dropped = bundle.rotate(&root);
                    if extended {
                        warn!(key = %key, "root rotated again while a migration is pending");
                    }
                    if dropped.is_some() {
                        warn!(
                            key = %key,
                            slots = MAX_CA_SLOTS,
                            "CA history full; oldest CA is no longer trusted"
                        );
                    }
                    BundleOutcome::MigrationStarted {
                        extended,
                        dropped_oldest: dropped.is_some(),
                    }
                }
                RootChange::Reissued => {
                    bundle.mirror(&root);
                    BundleOutcome::Refreshed
                }
            }
        };

        let mut updated = secret;
        bundle.write_into(&mut updated, annotations);
        self.accessor.update(updated).await?;

        info!(
            key = %key,
            outcome = ?outcome,
            trusted = bundle.history.len(),
            migration_pending = bundle.migration_pending,
            "trust bundle updated"
        );
        Ok(outcome)
    }

    async fn bootstrap(&self) -> Result<BundleOutcome> {
        let key = &self.config.trust_bundle;
        let root = self.find_root().await?;

        let bundle = TrustBundle::bootstrap(&root, self.accessor.now());
        let mut secret = new_secret(key);
        bundle.write_into(&mut secret, &self.config.annotations);
        self.accessor.create(secret).await?;

        info!(key = %key, root = %self.config.root_credential, "created trust bundle");
        Ok(BundleOutcome::Created)
    }

    async fn find_root(&self) -> Result<RootCredential> {
        let key = &self.config.root_credential;
        let secret = self
            .accessor
            .find(key)
            .await?
            .ok_or_else(|| Error::RootCredentialUnavailable { key: key.clone() })?;
        RootCredential::from_secret(&secret, key)
    }
}

#[async_trait]
impl TrustBundleLookup for TrustBundleReconciler {
    async fn find_trust_bundle(&self) -> Result<TrustBundle> {
        let key = &self.config.trust_bundle;
        let secret = self
            .accessor
            .find(key)
            .await?
            .ok_or_else(|| Error::TrustBundleUnavailable { key: key.clone() })?;
        TrustBundle::from_secret(&secret, key, &self.config.annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pem, t, Fixture};
    use trustroll_common::annotations::{annotation, set_annotation};
    use trustroll_common::ErrorKind;

    fn reconciler(fx: &Fixture) -> TrustBundleReconciler {
        TrustBundleReconciler::new(fx.store.clone(), fx.clock.clone(), fx.config.clone())
    }

    async fn bundle(fx: &Fixture) -> TrustBundle {
        reconciler(fx).find_trust_bundle().await.unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_creates_bundle_from_root() {
        let fx = Fixture::new();
        fx.publish_root("A", t(0));
        fx.clock.set(t(5));

        let outcome = reconciler(&fx).reconcile().await.unwrap();

        assert_eq!(outcome, BundleOutcome::Created);
        let bundle = bundle(&fx).await;
        assert_eq!(bundle.history.current(), pem("A"));
        assert_eq!(bundle.history.len(), 1);
        assert_eq!(bundle.root_ca_crt, pem("A"));
        assert_eq!(bundle.root_tls_crt, pem("A-leaf"));
        assert_eq!(bundle.last_modified_at, t(5));
        assert_eq!(bundle.root_issued_at, Some(t(0)));
        assert!(!bundle.migration_pending);
        assert!(!bundle.all_clients_migrated);

        let secret = fx.bundle_secret();
        assert_eq!(annotation(&secret, "migrationPending"), None);
        assert_eq!(annotation(&secret, "allClientsMigrated"), None);
    }

    #[tokio::test]
    async fn test_no_root_fails_without_writing() {
        let fx = Fixture::new();

        let err = reconciler(&fx).reconcile().await.unwrap_err();

        assert!(matches!(err, Error::RootCredentialUnavailable { .. }));
        assert!(err.is_transient());
        assert_eq!(fx.store.writes(), 0);
        assert!(fx.store.peek(&fx.config.trust_bundle).is_none());
    }

    #[tokio::test]
    async fn test_root_deleted_after_bootstrap_is_unavailable() {
        let fx = Fixture::new();
        fx.seed_bundle(&["A"], t(0), false, false);

        let err = reconciler(&fx).reconcile().await.unwrap_err();

        assert!(matches!(err, Error::RootCredentialUnavailable { .. }));
        assert_eq!(fx.store.writes(), 0);
    }

    #[tokio::test]
    async fn test_newer_root_starts_migration() {
        let fx = Fixture::new();
        fx.seed_bundle(&["A"], t(0), false, false);
        fx.publish_root("B", t(10));
        fx.clock.set(t(20));

        let outcome = reconciler(&fx).reconcile().await.unwrap();

        assert_eq!(
            outcome,
            BundleOutcome::MigrationStarted {
                extended: false,
                dropped_oldest: false
            }
        );
        let bundle = bundle(&fx).await;
        assert_eq!(bundle.history.slot(0), Some(pem("B").as_slice()));
        assert_eq!(bundle.history.slot(1), Some(pem("A").as_slice()));
        assert_eq!(bundle.root_ca_crt, pem("B"));
        assert_eq!(bundle.root_tls_key, b"B-key");
        assert!(bundle.migration_pending);
        assert_eq!(bundle.last_modified_at, t(20));
        assert_eq!(fx.store.writes(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_root_performs_no_write() {
        let fx = Fixture::new();
        fx.publish_root("A", t(0));
        fx.seed_bundle(&["A"], t(0), false, false);
        fx.clock.set(t(100));
        let before = fx.bundle_secret();

        for _ in 0..3 {
            let outcome = reconciler(&fx).reconcile().await.unwrap();
            assert_eq!(outcome, BundleOutcome::Unchanged);
            assert!(!outcome.changed());
        }

        assert_eq!(fx.store.writes(), 0);
        assert_eq!(fx.bundle_secret(), before);
    }

    #[tokio::test]
    async fn test_collapse_drops_history_and_clears_flags() {
        let fx = Fixture::new();
        fx.publish_root("B", t(10));
        fx.seed_bundle(&["B", "A"], t(20), true, true);
        fx.clock.set(t(30));

        let outcome = reconciler(&fx).reconcile().await.unwrap();

        assert_eq!(outcome, BundleOutcome::Collapsed { discarded: 1 });
        let bundle = bundle(&fx).await;
        assert_eq!(bundle.history, CaHistory::new(pem("B")));
        assert!(!bundle.migration_pending);
        assert!(!bundle.all_clients_migrated);
        assert_eq!(bundle.last_modified_at, t(30));

        let secret = fx.bundle_secret();
        assert!(data_field(&secret, "ca-bundle-1").is_none());
        assert_eq!(annotation(&secret, "migrationPending"), None);
        assert_eq!(annotation(&secret, "allClientsMigrated"), None);
    }

    #[tokio::test]
    async fn test_collapse_takes_precedence_and_mirrors_latest_root() {
        let fx = Fixture::new();
        fx.seed_bundle(&["B", "A"], t(20), true, true);
        fx.publish_root("C", t(25));
        fx.clock.set(t(30));

        let outcome = reconciler(&fx).reconcile().await.unwrap();

        assert_eq!(outcome, BundleOutcome::Collapsed { discarded: 1 });
        let bundle = bundle(&fx).await;
        assert_eq!(bundle.history, CaHistory::new(pem("C")));
        assert_eq!(bundle.root_ca_crt, pem("C"));
        assert_eq!(bundle.root_tls_crt, pem("C-leaf"));
        assert!(!bundle.migration_pending);
    }

    #[tokio::test]
    async fn test_rotation_while_pending_extends_history() {
        let fx = Fixture::new();
        fx.seed_bundle(&["B", "A"], t(20), true, false);
        fx.publish_root("C", t(25));
        fx.clock.set(t(30));

        let outcome = reconciler(&fx).reconcile().await.unwrap();

        assert_eq!(
            outcome,
            BundleOutcome::MigrationStarted {
                extended: true,
                dropped_oldest: false
            }
        );
        let bundle = bundle(&fx).await;
        assert_eq!(bundle.history.chain(), [pem("C"), pem("B"), pem("A")].concat());
        assert!(bundle.migration_pending);
    }

    #[tokio::test]
    async fn test_rollback_to_trusted_ca_does_not_duplicate_it() {
        let fx = Fixture::new();
        fx.seed_bundle(&["B", "A"], t(20), true, false);
        fx.publish_root("A", t(25));
        fx.clock.set(t(30));

        let outcome = reconciler(&fx).reconcile().await.unwrap();

        assert_eq!(
            outcome,
            BundleOutcome::MigrationStarted {
                extended: true,
                dropped_oldest: false
            }
        );
        let bundle = bundle(&fx).await;
        assert_eq!(bundle.history.len(), 2);
        assert_eq!(bundle.history.chain(), [pem("A"), pem("B")].concat());
        assert!(bundle.migration_pending);
        assert!(data_field(&fx.bundle_secret(), "ca-bundle-2").is_none());
    }

    #[tokio::test]
    async fn test_full_history_drops_oldest() {
        let fx = Fixture::new();
        fx.seed_bundle(&["C", "B", "A"], t(20), true, false);
        fx.publish_root("D", t(25));
        fx.clock.set(t(30));

        let outcome = reconciler(&fx).reconcile().await.unwrap();

        assert_eq!(
            outcome,
            BundleOutcome::MigrationStarted {
                extended: true,
                dropped_oldest: true
            }
        );
        let bundle = bundle(&fx).await;
        assert_eq!(bundle.history.len(), MAX_CA_SLOTS);
        assert_eq!(bundle.history.chain(), [pem("D"), pem("C"), pem("B")].concat());
    }

    #[tokio::test]
    async fn test_in_place_ca_edit_is_detected_without_newer_timestamp() {
        let fx = Fixture::new();
        fx.seed_bundle(&["A"], t(20), false, false);
        // Root edited in place: creationTimestamp predates the bundle.
        fx.publish_root("B", t(10));
        fx.clock.set(t(30));

        let outcome = reconciler(&fx).reconcile().await.unwrap();

        assert!(matches!(outcome, BundleOutcome::MigrationStarted { .. }));
        assert_eq!(bundle(&fx).await.history.current(), pem("B"));
    }

    #[tokio::test]
    async fn test_reissued_serving_cert_refreshes_without_migration() {
        let fx = Fixture::new();
        fx.seed_bundle(&["A"], t(20), false, false);
        fx.publish_root("A", t(25));
        let mut root = fx.store.peek(&fx.config.root_credential).unwrap();
        set_data_field(&mut root, "tls.crt", pem("A-leaf-2"));
        fx.store.seed(root);
        fx.clock.set(t(30));

        let outcome = reconciler(&fx).reconcile().await.unwrap();

        assert_eq!(outcome, BundleOutcome::Refreshed);
        let bundle = bundle(&fx).await;
        assert_eq!(bundle.root_tls_crt, pem("A-leaf-2"));
        assert_eq!(bundle.history.len(), 1);
        assert!(!bundle.migration_pending);
        assert_eq!(bundle.last_modified_at, t(30));
    }

    #[tokio::test]
    async fn test_root_issued_ahead_of_local_clock_is_mirrored_once() {
        let fx = Fixture::new();
        fx.seed_bundle(&["A"], t(10), false, false);
        fx.publish_root("A", t(25));
        fx.clock.set(t(20));

        let outcome = reconciler(&fx).reconcile().await.unwrap();
        assert_eq!(outcome, BundleOutcome::Refreshed);
        let bundle = bundle(&fx).await;
        assert_eq!(bundle.root_issued_at, Some(t(25)));
        assert_eq!(bundle.last_modified_at, t(20));

        for _ in 0..3 {
            fx.clock.advance(chrono::Duration::microseconds(1));
            let outcome = reconciler(&fx).reconcile().await.unwrap();
            assert_eq!(outcome, BundleOutcome::Unchanged);
        }
        assert_eq!(fx.store.writes(), 1);
    }

    #[tokio::test]
    async fn test_recorded_issuance_still_detects_newer_root() {
        let fx = Fixture::new();
        fx.publish_root("A", t(25));
        fx.clock.set(t(20));
        reconciler(&fx).reconcile().await.unwrap();

        fx.publish_root("B", t(26));
        fx.clock.set(t(21));
        let outcome = reconciler(&fx).reconcile().await.unwrap();

        assert!(matches!(outcome, BundleOutcome::MigrationStarted { .. }));
        assert_eq!(bundle(&fx).await.root_issued_at, Some(t(26)));
    }

    #[tokio::test]
    async fn test_malformed_timestamp_aborts_without_write() {
        let fx = Fixture::new();
        fx.publish_root("B", t(10));
        fx.seed_bundle(&["A"], t(0), false, false);
        let mut secret = fx.bundle_secret();
        set_annotation(&mut secret, "lastModifiedAt", "yesterday".to_string());
        fx.store.seed(secret);

        let err = reconciler(&fx).reconcile().await.unwrap_err();

        assert!(matches!(err, Error::MalformedTimestamp { .. }));
        assert_eq!(err.kind(), ErrorKind::CorruptState);
        assert!(!err.is_retryable());
        assert_eq!(fx.store.writes(), 0);
    }

    #[tokio::test]
    async fn test_conflict_leaves_bundle_untouched() {
        let fx = Fixture::new();
        fx.seed_bundle(&["A"], t(0), false, false);
        fx.publish_root("B", t(10));
        let before = fx.bundle_secret();
        fx.store.fail_next_write_with_conflict("resourceVersion is stale");

        let err = reconciler(&fx).reconcile().await.unwrap_err();

        assert!(matches!(err, Error::Conflict { .. }));
        assert_eq!(fx.bundle_secret(), before);

        // A fresh pass converges.
        let outcome = reconciler(&fx).reconcile().await.unwrap();
        assert!(matches!(outcome, BundleOutcome::MigrationStarted { .. }));
    }

    #[tokio::test]
    async fn test_store_error_is_propagated() {
        let fx = Fixture::new();
        fx.publish_root("A", t(0));
        fx.store.fail_next_write_with_store_error("connection reset");

        let err = reconciler(&fx).reconcile().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Store);
        assert!(!err.is_transient());
        assert!(fx.store.peek(&fx.config.trust_bundle).is_none());
    }

    #[tokio::test]
    async fn test_lookup_reports_missing_bundle() {
        let fx = Fixture::new();
        let err = reconciler(&fx).find_trust_bundle().await.unwrap_err();
        assert!(matches!(err, Error::TrustBundleUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_bundle_without_slot_zero_is_incomplete() {
        let fx = Fixture::new();
        fx.seed_bundle(&["A"], t(0), false, false);
        let mut secret = fx.bundle_secret();
        remove_data_field(&mut secret, "ca-bundle-0");
        fx.store.seed(secret);

        let err = reconciler(&fx).find_trust_bundle().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Incomplete);
        assert!(err.to_string().contains("ca-bundle-0"));
    }
}
