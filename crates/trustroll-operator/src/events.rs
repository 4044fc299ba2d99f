//! Kubernetes Event recording for rotation milestones
//!
//! Events are fire-and-forget: a failed publish is logged and never fails a
//! pass. They make migration windows visible through `kubectl describe
//! secret` without reading operator logs.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

#[cfg(test)]
use mockall::automock;

use trustroll_common::{ObjectKey, RotationConfig};
use trustroll_rotation::{BundleOutcome, ChainOutcome, GatewayOutcome};

use crate::error::Error;

/// Reporting component name on published Events
pub const CONTROLLER_NAME: &str = "trustroll";

/// Publishes Kubernetes Events
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an Event about `resource`; failures are logged, not returned
    async fn publish(
        &self,
        resource: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// Publisher backed by `kube::runtime::events::Recorder`
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    /// Create a publisher reporting as `controller_name`
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note,
            action: action.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, resource).await {
            warn!(reason, action, error = %e, "failed to publish Kubernetes event");
        }
    }
}

/// Event reason strings
pub mod reasons {
    /// Trust bundle bootstrapped from the root credential
    pub const TRUST_BUNDLE_CREATED: &str = "TrustBundleCreated";
    /// New CA rotated in; old CA still trusted
    pub const MIGRATION_STARTED: &str = "MigrationStarted";
    /// Superseded CAs discarded
    pub const MIGRATION_COMPLETED: &str = "MigrationCompleted";
    /// Gateway credential created or replaced
    pub const GATEWAY_CREDENTIAL_UPDATED: &str = "GatewayCredentialUpdated";
    /// A pass failed for a reason that will not resolve by itself
    pub const ROTATION_FAILED: &str = "RotationFailed";
}

/// Event action strings
pub mod actions {
    /// A reconciliation pass
    pub const RECONCILE: &str = "Reconcile";
}

/// Reference to a core/v1 Secret for Event regarding fields
pub fn secret_reference(key: &ObjectKey) -> ObjectReference {
    ObjectReference {
        api_version: Some("v1".to_string()),
        kind: Some("Secret".to_string()),
        name: Some(key.name.clone()),
        namespace: Some(key.namespace.clone()),
        ..Default::default()
    }
}

/// A Normal or Warning Event derived from a pass result
#[derive(Debug, Clone, PartialEq)]
pub struct PassEvent {
    /// Which Secret the Event is about
    pub regarding: ObjectKey,
    /// Normal or Warning
    pub type_: EventType,
    /// Reason string from [`reasons`]
    pub reason: &'static str,
    /// Human-readable detail
    pub note: String,
}

/// Events worth recording for a successful pass
pub fn events_for_outcome(outcome: &ChainOutcome, rotation: &RotationConfig) -> Vec<PassEvent> {
    let mut events = Vec::new();

    match outcome.bundle {
        BundleOutcome::Created => events.push(PassEvent {
            regarding: rotation.trust_bundle.clone(),
            type_: EventType::Normal,
            reason: reasons::TRUST_BUNDLE_CREATED,
            note: "trust bundle created from the root credential".to_string(),
        }),
        BundleOutcome::MigrationStarted {
            extended,
            dropped_oldest,
        } => {
            let mut note = if extended {
                "root CA rotated again; migration window extended".to_string()
            } else {
                "root CA rotated; previous CA trusted until all clients migrate".to_string()
            };
            if dropped_oldest {
                note.push_str("; oldest CA dropped from history");
            }
            events.push(PassEvent {
                regarding: rotation.trust_bundle.clone(),
                type_: if dropped_oldest {
                    EventType::Warning
                } else {
                    EventType::Normal
                },
                reason: reasons::MIGRATION_STARTED,
                note,
            });
        }
        BundleOutcome::Collapsed { discarded } => events.push(PassEvent {
            regarding: rotation.trust_bundle.clone(),
            type_: EventType::Normal,
            reason: reasons::MIGRATION_COMPLETED,
            note: format!("all clients migrated; discarded {discarded} superseded CA(s)"),
        }),
        BundleOutcome::Refreshed | BundleOutcome::Unchanged => {}
    }

    match outcome.gateway {
        GatewayOutcome::Created | GatewayOutcome::Updated => events.push(PassEvent {
            regarding: rotation.gateway_credential.clone(),
            type_: EventType::Normal,
            reason: reasons::GATEWAY_CREDENTIAL_UPDATED,
            note: "gateway credential now serves the latest trust bundle".to_string(),
        }),
        GatewayOutcome::Unchanged => {}
    }

    events
}

/// Warning Event for a failed pass, if the failure needs attention
///
/// Transient failures requeue quietly; anything else is surfaced on the
/// Secret the error names, or on the trust bundle when it names none.
pub fn event_for_error(error: &Error, rotation: &RotationConfig) -> Option<PassEvent> {
    if error.is_transient() {
        return None;
    }
    Some(PassEvent {
        regarding: error.key().unwrap_or(&rotation.trust_bundle).clone(),
        type_: EventType::Warning,
        reason: reasons::ROTATION_FAILED,
        note: error.to_string(),
    })
}
