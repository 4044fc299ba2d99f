//! Read-only view of the rotation state

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use trustroll_common::annotations::read_timestamp;
use trustroll_common::store::SecretStore;
use trustroll_common::{ObjectKey, Result, RotationConfig};
use trustroll_rotation::{GatewayCredential, TrustBundle};

/// Snapshot of all three Secrets
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Upstream root credential
    pub root_credential: RootStatus,
    /// Trust bundle, if it exists
    pub trust_bundle: Option<BundleStatus>,
    /// Gateway credential, if it exists
    pub gateway_credential: Option<GatewayStatus>,
}

/// Root credential presence and issuance time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootStatus {
    /// Location
    pub key: ObjectKey,
    /// Whether the Secret exists
    pub present: bool,
    /// Creation timestamp of the current generation
    pub issued_at: Option<DateTime<Utc>>,
}

/// Trust bundle migration state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleStatus {
    /// Location
    pub key: ObjectKey,
    /// Number of populated CA slots
    pub trusted_cas: usize,
    /// A migration window is open
    pub migration_pending: bool,
    /// The external migration signal is set
    pub all_clients_migrated: bool,
    /// Last state-changing write
    pub last_modified_at: DateTime<Utc>,
}

/// Gateway credential freshness
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    /// Location
    pub key: ObjectKey,
    /// Last write, absent on a credential never written by the reconciler
    pub last_modified_at: Option<DateTime<Utc>>,
    /// Deployed material equals what the current bundle calls for
    pub in_sync: bool,
}

/// Read all three Secrets and summarize them
///
/// Corrupt bundle or gateway state is reported as an error, not papered over.
pub async fn collect_status(
    store: Arc<dyn SecretStore>,
    config: &RotationConfig,
) -> Result<StatusReport> {
    let root = store.get(&config.root_credential).await?;
    let root_credential = RootStatus {
        key: config.root_credential.clone(),
        present: root.is_some(),
        issued_at: root
            .as_ref()
            .and_then(|s| s.metadata.creation_timestamp.as_ref())
            .map(|t| t.0),
    };

    let bundle = match store.get(&config.trust_bundle).await? {
        Some(secret) => Some(TrustBundle::from_secret(
            &secret,
            &config.trust_bundle,
            &config.annotations,
        )?),
        None => None,
    };

    let gateway_credential = match store.get(&config.gateway_credential).await? {
        Some(secret) => {
            let key = &config.gateway_credential;
            let deployed = GatewayCredential::from_secret(&secret, key)?;
            Some(GatewayStatus {
                key: key.clone(),
                last_modified_at: read_timestamp(&secret, key, &config.annotations.last_modified_at)?,
                in_sync: bundle
                    .as_ref()
                    .is_some_and(|b| GatewayCredential::from_bundle(b) == deployed),
            })
        }
        None => None,
    };

    Ok(StatusReport {
        root_credential,
        trust_bundle: bundle.map(|b| bundle_status(&config.trust_bundle, &b)),
        gateway_credential,
    })
}

fn bundle_status(key: &ObjectKey, bundle: &TrustBundle) -> BundleStatus {
    BundleStatus {
        key: key.clone(),
        trusted_cas: bundle.history.len(),
        migration_pending: bundle.migration_pending,
        all_clients_migrated: bundle.all_clients_migrated,
        last_modified_at: bundle.last_modified_at,
    }
}
