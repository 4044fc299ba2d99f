//! Gateway credential reconciliation
//!
//! The gateway credential is what the mTLS edge actually serves and
//! validates against. It is derived entirely from the trust bundle and only
//! replaced when the bundle is strictly newer than what is deployed.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Secret;
use serde::Serialize;
use tracing::{debug, info};

use trustroll_common::annotations::{read_timestamp, required_field, set_data_field};
use trustroll_common::store::{new_secret, SecretStore};
use trustroll_common::{Clock, ObjectKey, Result, RotationConfig, SecretAccessor};

use crate::trust_bundle::{TrustBundle, TrustBundleLookup};

/// Serving certificate field
pub const GATEWAY_TLS_CRT: &str = "tls.crt";
/// Serving key field
pub const GATEWAY_TLS_KEY: &str = "tls.key";
/// Trust chain field
pub const GATEWAY_CA_CRT: &str = "ca.crt";

/// Material served by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCredential {
    /// Serving certificate
    pub tls_crt: Vec<u8>,
    /// Serving key
    pub tls_key: Vec<u8>,
    /// Every trusted CA, newest first
    pub ca_chain: Vec<u8>,
}

impl GatewayCredential {
    /// Derive the credential a bundle calls for
    pub fn from_bundle(bundle: &TrustBundle) -> Self {
        Self {
            tls_crt: bundle.root_tls_crt.clone(),
            tls_key: bundle.root_tls_key.clone(),
            ca_chain: bundle.chain(),
        }
    }

    /// Read the deployed credential from its Secret
    pub fn from_secret(secret: &Secret, key: &ObjectKey) -> Result<Self> {
        Ok(Self {
            tls_crt: required_field(secret, key, GATEWAY_TLS_CRT)?,
            tls_key: required_field(secret, key, GATEWAY_TLS_KEY)?,
            ca_chain: required_field(secret, key, GATEWAY_CA_CRT)?,
        })
    }

    /// Write the credential's data fields into `secret`
    pub fn write_into(&self, secret: &mut Secret) {
        set_data_field(secret, GATEWAY_TLS_CRT, self.tls_crt.clone());
        set_data_field(secret, GATEWAY_TLS_KEY, self.tls_key.clone());
        set_data_field(secret, GATEWAY_CA_CRT, self.ca_chain.clone());
    }
}

/// What a gateway pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GatewayOutcome {
    /// The gateway credential did not exist and was created
    Created,
    /// A newer trust bundle was propagated
    Updated,
    /// The deployed credential is at least as new as the bundle
    Unchanged,
}

impl GatewayOutcome {
    /// Whether the pass wrote the gateway credential
    pub fn changed(&self) -> bool {
        !matches!(self, GatewayOutcome::Unchanged)
    }
}

/// Propagates the trust bundle into the gateway credential
pub struct GatewayCredentialReconciler {
    lookup: Arc<dyn TrustBundleLookup>,
    accessor: SecretAccessor,
    config: Arc<RotationConfig>,
}

impl GatewayCredentialReconciler {
    /// Create a reconciler reading bundles through `lookup`
    pub fn new(
        lookup: Arc<dyn TrustBundleLookup>,
        store: Arc<dyn SecretStore>,
        clock: Arc<dyn Clock>,
        config: Arc<RotationConfig>,
    ) -> Self {
        let accessor = SecretAccessor::new(store, clock, config.annotations.last_modified_at.clone());
        Self {
            lookup,
            accessor,
            config,
        }
    }

    /// Run one pass
    ///
    /// The timestamp comparison is the only ordering between the two objects:
    /// a bundle that is not strictly newer never replaces the deployed chain.
    /// A deployed credential without `lastModifiedAt` counts as stale.
    pub async fn reconcile(&self) -> Result<GatewayOutcome> {
        let key = &self.config.gateway_credential;
        let bundle = self.lookup.find_trust_bundle().await?;
        let credential = GatewayCredential::from_bundle(&bundle);

        let Some(mut secret) = self.accessor.find(key).await? else {
            let mut secret = new_secret(key);
            credential.write_into(&mut secret);
            self.accessor.create(secret).await?;
            info!(
                key = %key,
                trusted = bundle.history.len(),
                "created gateway credential"
            );
            return Ok(GatewayOutcome::Created);
        };

        let deployed_at = read_timestamp(&secret, key, &self.config.annotations.last_modified_at)?;
        if let Some(deployed_at) = deployed_at {
            if bundle.last_modified_at <= deployed_at {
                debug!(
                    key = %key,
                    bundle_modified_at = %bundle.last_modified_at,
                    deployed_at = %deployed_at,
                    "gateway credential up to date"
                );
                return Ok(GatewayOutcome::Unchanged);
            }
        }

        credential.write_into(&mut secret);
        self.accessor.update(secret).await?;
        info!(
            key = %key,
            trusted = bundle.history.len(),
            bundle_modified_at = %bundle.last_modified_at,
            "gateway credential updated"
        );
        Ok(GatewayOutcome::Updated)
    }
}
