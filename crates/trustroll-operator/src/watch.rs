//! Watch streams on the Secrets taking part in a rotation

use futures::stream::{self, BoxStream};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client};
use tracing::warn;

use trustroll_common::{ObjectKey, RotationConfig};

/// Watcher timeout (seconds); below the client read timeout so idle watches
/// are closed by the API server first
const WATCH_TIMEOUT_SECS: u32 = 25;

/// Field selector matching a single object by name
pub fn name_selector(key: &ObjectKey) -> String {
    format!("metadata.name={}", key.name)
}

/// Watch one Secret, yielding its key on every observed change
///
/// Watch errors are logged and retried with backoff by the watcher itself.
pub fn watch_secret(client: Client, key: ObjectKey) -> BoxStream<'static, ObjectKey> {
    let api: Api<Secret> = Api::namespaced(client, &key.namespace);
    let config = watcher::Config::default()
        .fields(&name_selector(&key))
        .timeout(WATCH_TIMEOUT_SECS);

    watcher(api, config)
        .default_backoff()
        .filter_map(move |event| {
            let key = key.clone();
            async move {
                match event {
                    Ok(_) => Some(key),
                    Err(e) => {
                        warn!(key = %key, error = %e, "secret watch failed");
                        None
                    }
                }
            }
        })
        .boxed()
}

/// Merged triggers for every Secret named in `config`
pub fn watch_rotation_secrets(
    client: Client,
    config: &RotationConfig,
) -> BoxStream<'static, ObjectKey> {
    stream::select_all([
        watch_secret(client.clone(), config.root_credential.clone()),
        watch_secret(client.clone(), config.trust_bundle.clone()),
        watch_secret(client, config.gateway_credential.clone()),
    ])
    .boxed()
}
