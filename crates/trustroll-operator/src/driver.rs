//! Watch-driven pass scheduler
//!
//! The reconcilers only expose idempotent passes. [`Driver`] decides when to
//! run them: on any watch event for the three Secrets, on a periodic resync,
//! and after a failure with a delay that depends on whether the failure is
//! transient. Bursts of watch events collapse into a single pass.

use std::future::Future;
use std::sync::Arc;

use futures::{FutureExt, Stream, StreamExt};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, error, info, warn};

use trustroll_common::retry::retry_with_backoff;
use trustroll_common::store::SecretStore;
use trustroll_common::{Clock, ObjectKey, RotationConfig};
use trustroll_rotation::{ChainOutcome, TrustChainReconciler};

use crate::config::DriverConfig;
use crate::error::Error;
use crate::events::{
    actions, event_for_error, events_for_outcome, secret_reference, EventPublisher, PassEvent,
};

/// Runs trust chain passes and records their results
pub struct Driver {
    chain: TrustChainReconciler,
    events: Arc<dyn EventPublisher>,
    rotation: Arc<RotationConfig>,
    config: DriverConfig,
}

impl Driver {
    /// Create a driver over `store`
    pub fn new(
        store: Arc<dyn SecretStore>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
        rotation: Arc<RotationConfig>,
        config: DriverConfig,
    ) -> Self {
        Self {
            chain: TrustChainReconciler::new(store, clock, rotation.clone()),
            events,
            rotation,
            config,
        }
    }

    /// Run one pass under the timeout, redoing it after lost writes
    pub async fn run_pass(&self) -> Result<ChainOutcome, Error> {
        retry_with_backoff(
            &self.config.conflict_retry,
            "trust_chain_pass",
            Error::is_conflict,
            || async {
                match tokio::time::timeout(self.config.pass_timeout, self.chain.reconcile()).await {
                    Ok(result) => result.map_err(Error::from),
                    Err(_) => Err(Error::Timeout(self.config.pass_timeout)),
                }
            },
        )
        .await
    }

    /// Delay before the next pass after `error`
    pub fn requeue_after(&self, error: &Error) -> Duration {
        if error.is_transient() {
            self.config.transient_requeue
        } else {
            self.config.error_requeue
        }
    }

    /// Run a pass, log and record the result, return the delay until the next
    pub async fn pass_and_record(&self) -> Duration {
        match self.run_pass().await {
            Ok(outcome) => {
                if outcome.changed() {
                    info!(
                        bundle = ?outcome.bundle,
                        gateway = ?outcome.gateway,
                        "trust chain reconciled"
                    );
                } else {
                    debug!("trust chain unchanged");
                }
                for event in events_for_outcome(&outcome, &self.rotation) {
                    self.publish(event).await;
                }
                self.config.resync_interval
            }
            Err(e) => {
                let retry_in = self.requeue_after(&e);
                if e.is_transient() {
                    warn!(error = %e, retry_in = ?retry_in, "trust chain pass did not complete");
                } else {
                    error!(error = %e, retry_in = ?retry_in, "trust chain pass failed");
                }
                if let Some(event) = event_for_error(&e, &self.rotation) {
                    self.publish(event).await;
                }
                retry_in
            }
        }
    }

    /// Drive passes until `shutdown` resolves
    ///
    /// The first pass runs immediately. Every item from `triggers` schedules
    /// a pass right away; items that are already queued are drained first so
    /// a burst causes one pass. Shutdown is only observed between passes.
    pub async fn run<S, F>(&self, triggers: S, shutdown: F)
    where
        S: Stream<Item = ObjectKey> + Send,
        F: Future<Output = ()> + Send,
    {
        let mut triggers = std::pin::pin!(triggers.fuse());
        let mut shutdown = std::pin::pin!(shutdown);
        let mut next_pass = Instant::now();

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested, stopping trust chain driver");
                    return;
                }
                Some(source) = triggers.next() => {
                    debug!(source = %source, "watch event triggered a pass");
                    while let Some(Some(_)) = triggers.next().now_or_never() {}
                }
                _ = sleep_until(next_pass) => {}
            }

            let delay = self.pass_and_record().await;
            next_pass = Instant::now() + delay;
        }
    }

    async fn publish(&self, event: PassEvent) {
        self.events
            .publish(
                &secret_reference(&event.regarding),
                event.type_,
                event.reason,
                actions::RECONCILE,
                Some(event.note),
            )
            .await;
    }
}
