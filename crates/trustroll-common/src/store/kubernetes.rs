//! Kubernetes-backed Secret store

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, PostParams};
use kube::Client;
use tracing::debug;

use super::{secret_key, SecretStore};
use crate::config::ObjectKey;
use crate::error::Error;
use crate::{Result, FIELD_MANAGER};

/// Secret store talking to the Kubernetes API
///
/// `update` uses `replace`, so the API server enforces the resourceVersion
/// precondition and answers 409 when another writer got there first.
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    /// Create a new store wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }
}

fn map_write_error(key: &ObjectKey, operation: &'static str, err: kube::Error) -> Error {
    match err {
        kube::Error::Api(ae) if ae.code == 409 => Error::conflict(key, ae.message),
        other => Error::store(key, operation, other),
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Secret>> {
        match self.api(&key.namespace).get(&key.name).await {
            Ok(secret) => Ok(Some(secret)),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                debug!(secret = %key, "secret not found");
                Ok(None)
            }
            Err(e) => Err(Error::store(key, "get", e)),
        }
    }

    async fn create(&self, secret: &Secret) -> Result<Secret> {
        let key = secret_key(secret);
        self.api(&key.namespace)
            .create(&Self::post_params(), secret)
            .await
            .map_err(|e| map_write_error(&key, "create", e))
    }

    async fn update(&self, secret: &Secret) -> Result<Secret> {
        let key = secret_key(secret);
        if secret.metadata.resource_version.is_none() {
            // replace without a version is an unconditional overwrite
            return Err(Error::conflict(&key, "update without resourceVersion"));
        }
        self.api(&key.namespace)
            .replace(&key.name, &Self::post_params(), secret)
            .await
            .map_err(|e| map_write_error(&key, "update", e))
    }
}
