//! # Kubernetes Collaborators
//!
//! `OperatorStatusProvider` and `ClusterOperatorStore` on top of the
//! Kubernetes API, using `DynamicObject` so neither the operator resource nor
//! the ClusterOperator type needs a compiled-in definition.

use crate::constants::{
    CLUSTER_OPERATOR_GROUP, CLUSTER_OPERATOR_KIND, CLUSTER_OPERATOR_PLURAL,
    CLUSTER_OPERATOR_VERSION, CONTROLLER_NAME,
};
use crate::crd::{ClusterOperator, OperatorStatus};
use crate::provider::{
    ClusterOperatorStore, OperatorStatusProvider, ProviderError, ResourceEvent, StoreError,
};
use anyhow::Context;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use kube::api::{Api, ApiResource, DeleteParams, DynamicObject, GroupVersionKind, PostParams};
use kube::Client;
use kube_runtime::watcher::{self, Event};
use kube_runtime::WatchStreamExt;
use tracing::{debug, warn};

/// Coordinates of a single Kubernetes object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    /// Empty for cluster-scoped objects
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    /// The ClusterOperator with the given identity
    pub fn cluster_operator(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: CLUSTER_OPERATOR_GROUP.to_string(),
            version: CLUSTER_OPERATOR_VERSION.to_string(),
            kind: CLUSTER_OPERATOR_KIND.to_string(),
            plural: CLUSTER_OPERATOR_PLURAL.to_string(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(&self.group, &self.version, &self.kind),
            &self.plural,
        )
    }

    #[must_use]
    pub fn api(&self, client: Client) -> Api<DynamicObject> {
        let resource = self.api_resource();
        if self.namespace.is_empty() {
            Api::all_with(client, &resource)
        } else {
            Api::namespaced_with(client, &self.namespace, &resource)
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}/{}", self.kind, self.name)
        } else {
            write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
        }
    }
}

/// Map a kube API error onto the store's error classes
fn classify_error(error: kube::Error, operation: &str, target: &ResourceRef) -> StoreError {
    match error {
        kube::Error::Api(response) if response.code == 404 => {
            StoreError::NotFound(format!("{target}: {}", response.message))
        }
        kube::Error::Api(response) if response.code == 409 && response.reason == "AlreadyExists" => {
            StoreError::AlreadyExists(format!("{target}: {}", response.message))
        }
        kube::Error::Api(response) if response.code == 409 => {
            StoreError::Conflict(format!("{target}: {}", response.message))
        }
        other => StoreError::Other(
            anyhow::Error::new(other).context(format!("failed to {operation} {target}")),
        ),
    }
}

fn from_dynamic(object: DynamicObject) -> Result<ClusterOperator, StoreError> {
    let value = serde_json::to_value(object).context("failed to encode ClusterOperator")?;
    Ok(serde_json::from_value(value).context("failed to decode ClusterOperator")?)
}

fn to_dynamic(operator: &ClusterOperator) -> Result<DynamicObject, StoreError> {
    let value = serde_json::to_value(operator).context("failed to encode ClusterOperator")?;
    Ok(serde_json::from_value(value).context("failed to build ClusterOperator request")?)
}

/// NotFound on delete means the object is already gone
fn ignore_not_found(result: Result<(), StoreError>, target: &ResourceRef) -> Result<(), StoreError> {
    match result {
        Err(StoreError::NotFound(_)) => {
            debug!(target = %target, "already deleted");
            Ok(())
        }
        other => other,
    }
}

/// Payload-free event for a watcher event; `None` for relist bookkeeping
fn resource_event<K>(event: &Event<K>) -> Option<ResourceEvent> {
    match event {
        Event::InitApply(_) => Some(ResourceEvent::Added),
        Event::Apply(_) => Some(ResourceEvent::Updated),
        Event::Delete(_) => Some(ResourceEvent::Deleted),
        Event::Init | Event::InitDone => None,
    }
}

/// Watch one named object and turn its watch events into payload-free
/// `ResourceEvent`s. Watch errors are retried with the default backoff.
fn watch_object(api: Api<DynamicObject>, target: &ResourceRef) -> BoxStream<'static, ResourceEvent> {
    let config = watcher::Config::default().fields(&format!("metadata.name={}", target.name));
    let target = target.to_string();
    watcher::watcher(api, config)
        .default_backoff()
        .filter_map(move |event| {
            let event = match event {
                Ok(event) => resource_event(&event),
                Err(e) => {
                    warn!(target = %target, error = %e, "watch error, retrying");
                    None
                }
            };
            futures::future::ready(event)
        })
        .boxed()
}

/// Reads the detailed status from `.status` of an operator custom resource
#[derive(Clone)]
pub struct KubeOperatorStatusProvider {
    api: Api<DynamicObject>,
    source: ResourceRef,
}

impl std::fmt::Debug for KubeOperatorStatusProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeOperatorStatusProvider")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl KubeOperatorStatusProvider {
    #[must_use]
    pub fn new(client: Client, source: ResourceRef) -> Self {
        Self {
            api: source.api(client),
            source,
        }
    }
}

#[async_trait]
impl OperatorStatusProvider for KubeOperatorStatusProvider {
    async fn current_status(&self) -> Result<Option<OperatorStatus>, ProviderError> {
        let object = self
            .api
            .get_opt(&self.source.name)
            .await
            .with_context(|| format!("failed to get {}", self.source))?
            .ok_or_else(|| ProviderError::NotFound(self.source.to_string()))?;

        match object.data.get("status") {
            None | Some(serde_json::Value::Null) => {
                debug!(source = %self.source, "operator has not reported a status yet");
                Ok(None)
            }
            Some(status) => {
                let status: OperatorStatus = serde_json::from_value(status.clone())
                    .with_context(|| format!("failed to decode status of {}", self.source))?;
                Ok(Some(status))
            }
        }
    }

    fn subscribe(&self) -> BoxStream<'static, ResourceEvent> {
        watch_object(self.api.clone(), &self.source)
    }
}

/// Reads and writes the ClusterOperator object
#[derive(Clone)]
pub struct KubeClusterOperatorStore {
    api: Api<DynamicObject>,
    target: ResourceRef,
}

impl std::fmt::Debug for KubeClusterOperatorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterOperatorStore")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl KubeClusterOperatorStore {
    #[must_use]
    pub fn new(client: Client, namespace: &str, name: &str) -> Self {
        let target = ResourceRef::cluster_operator(namespace, name);
        Self {
            api: target.api(client),
            target,
        }
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(CONTROLLER_NAME.to_string()),
            ..PostParams::default()
        }
    }
}

#[async_trait]
impl ClusterOperatorStore for KubeClusterOperatorStore {
    async fn get(&self) -> Result<ClusterOperator, StoreError> {
        let object = self
            .api
            .get(&self.target.name)
            .await
            .map_err(|e| classify_error(e, "get", &self.target))?;
        from_dynamic(object)
    }

    async fn create(&self, operator: &ClusterOperator) -> Result<ClusterOperator, StoreError> {
        let object = self
            .api
            .create(&Self::post_params(), &to_dynamic(operator)?)
            .await
            .map_err(|e| classify_error(e, "create", &self.target))?;
        from_dynamic(object)
    }

    async fn update_status(
        &self,
        operator: &ClusterOperator,
    ) -> Result<ClusterOperator, StoreError> {
        let body = serde_json::to_vec(&to_dynamic(operator)?)
            .context("failed to encode ClusterOperator")?;
        let object = self
            .api
            .replace_status(&self.target.name, &Self::post_params(), body)
            .await
            .map_err(|e| classify_error(e, "update status of", &self.target))?;
        from_dynamic(object)
    }

    async fn delete(&self) -> Result<(), StoreError> {
        let result = self
            .api
            .delete(&self.target.name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| classify_error(e, "delete", &self.target));
        ignore_not_found(result, &self.target)
    }

    fn subscribe(&self) -> BoxStream<'static, ResourceEvent> {
        watch_object(self.api.clone(), &self.target)
    }
}
