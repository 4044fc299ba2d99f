//! Zero-downtime CA rotation for an mTLS gateway
//!
//! Two reconcilers keep a trust chain consistent while the upstream root
//! credential is rotated out-of-band:
//!
//! ```text
//!  root credential ──► TrustBundleReconciler ──► trust bundle (3 CA slots + migration state)
//!                                                     │
//!                                                     ▼
//!                      GatewayCredentialReconciler ──► gateway credential (cert, key, CA chain)
//! ```
//!
//! The trust bundle keeps the previous CA trusted next to the new one until
//! an external signal (`allClientsMigrated`) says every consumer has moved
//! on. The gateway credential is only ever replaced by a strictly newer
//! bundle, so a stale pass can never narrow the chain peers validate against.
//!
//! Both reconcilers are idempotent and safe to call in any order;
//! [`TrustChainReconciler`] runs them in dependency order.

#![deny(missing_docs)]

mod chain;
mod gateway;
mod history;
mod root;
mod trust_bundle;

pub use chain::{ChainOutcome, TrustChainReconciler};
pub use gateway::{
    GatewayCredential, GatewayCredentialReconciler, GatewayOutcome, GATEWAY_CA_CRT,
    GATEWAY_TLS_CRT, GATEWAY_TLS_KEY,
};
pub use history::{CaHistory, CA_SLOT_PREFIX, MAX_CA_SLOTS};
pub use root::{RootCredential, ROOT_SOURCE_CA_CRT, ROOT_SOURCE_TLS_CRT, ROOT_SOURCE_TLS_KEY};
pub use trust_bundle::{
    BundleOutcome, TrustBundle, TrustBundleLookup, TrustBundleReconciler, BUNDLE_ROOT_CA_CRT,
    BUNDLE_ROOT_TLS_CRT, BUNDLE_ROOT_TLS_KEY,
};
