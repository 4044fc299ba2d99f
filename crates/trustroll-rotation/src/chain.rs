//! Ordered composition of the two reconcilers

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use trustroll_common::store::SecretStore;
use trustroll_common::{Clock, Result, RotationConfig};

use crate::gateway::{GatewayCredentialReconciler, GatewayOutcome};
use crate::trust_bundle::{BundleOutcome, TrustBundle, TrustBundleLookup, TrustBundleReconciler};

/// Outcome of one full pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainOutcome {
    /// What the trust bundle step did
    pub bundle: BundleOutcome,
    /// What the gateway step did
    pub gateway: GatewayOutcome,
}

impl ChainOutcome {
    /// Whether either object was written
    pub fn changed(&self) -> bool {
        self.bundle.changed() || self.gateway.changed()
    }
}

/// Runs the trust bundle step, then the gateway step
///
/// The gateway step runs on every pass, not only after a bundle change, so
/// a gateway write that failed on an earlier pass is caught up. Its
/// newer-only rule keeps this a no-op when nothing changed.
pub struct TrustChainReconciler {
    bundle: Arc<TrustBundleReconciler>,
    gateway: GatewayCredentialReconciler,
}

impl TrustChainReconciler {
    /// Wire both reconcilers over the same store and clock
    pub fn new(
        store: Arc<dyn SecretStore>,
        clock: Arc<dyn Clock>,
        config: Arc<RotationConfig>,
    ) -> Self {
        let bundle = Arc::new(TrustBundleReconciler::new(
            store.clone(),
            clock.clone(),
            config.clone(),
        ));
        let gateway = GatewayCredentialReconciler::new(bundle.clone(), store, clock, config);
        Self { bundle, gateway }
    }

    /// Run both steps in dependency order
    ///
    /// A bundle failure aborts the pass before the gateway is looked at.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<ChainOutcome> {
        let bundle = self.bundle.reconcile().await?;
        let gateway = self.gateway.reconcile().await?;
        Ok(ChainOutcome { bundle, gateway })
    }

    /// Current trust bundle
    pub async fn find_trust_bundle(&self) -> Result<TrustBundle> {
        self.bundle.find_trust_bundle().await
    }
}
