//! # Reconcile
//!
//! The read-modify-write pass against the ClusterOperator.

use crate::controller::conditions::cluster_operator_conditions;
use crate::controller::reconciler::types::{
    Reconciler, ReconcilerError, StoreOperation, SyncOutcome,
};
use crate::crd::{ClusterOperator, ClusterOperatorStatus, OperatorStatus};
use crate::observability;
use tracing::{debug, info};

/// Build the ClusterOperator the controller wants to see.
///
/// Starts from a copy of `original` (or an empty object), drops its whole
/// `status`, overwrites kind/apiVersion/namespace/name and writes freshly
/// computed conditions. Fields outside `status` are left as they were.
///
/// # Errors
///
/// Returns an error if a condition cannot be encoded.
pub fn desired_cluster_operator(
    original: Option<&ClusterOperator>,
    namespace: &str,
    name: &str,
    status: Option<&OperatorStatus>,
) -> Result<ClusterOperator, serde_json::Error> {
    let mut desired = original.cloned().unwrap_or_default();
    desired.status = None;
    desired.set_identity(namespace, name);
    desired.status = Some(ClusterOperatorStatus {
        conditions: cluster_operator_conditions(status)?,
        ..ClusterOperatorStatus::default()
    });
    Ok(desired)
}

/// Strip fields the API server assigns so the object can be created
fn creatable(desired: &ClusterOperator) -> ClusterOperator {
    let mut request = desired.clone();
    let metadata = &mut request.metadata;
    metadata.resource_version = None;
    metadata.uid = None;
    metadata.creation_timestamp = None;
    metadata.deletion_timestamp = None;
    metadata.generation = None;
    metadata.managed_fields = None;
    request
}

impl Reconciler {
    /// Run one sync pass
    ///
    /// # Errors
    ///
    /// Returns an error when the status cannot be read, a condition cannot
    /// be encoded, or a store call fails in a way that is not handled here.
    pub async fn sync(&self) -> Result<SyncOutcome, ReconcilerError> {
        let current = match self.provider.current_status().await {
            Ok(current) => current,
            Err(e) if e.is_not_found() => {
                info!(
                    namespace = %self.namespace,
                    name = %self.name,
                    "operator status not found, deleting ClusterOperator"
                );
                self.store
                    .delete()
                    .await
                    .map_err(ReconcilerError::store(StoreOperation::Delete))?;
                observability::metrics::increment_status_writes(StoreOperation::Delete.as_str());
                return Ok(SyncOutcome::Deleted);
            }
            Err(e) => return Err(ReconcilerError::Provider(e)),
        };

        let original = match self.store.get().await {
            Ok(original) => Some(original),
            Err(e) if e.is_not_found() => {
                info!(
                    namespace = %self.namespace,
                    name = %self.name,
                    "ClusterOperator not found"
                );
                None
            }
            Err(source) => {
                return Err(ReconcilerError::Store {
                    operation: StoreOperation::Get,
                    source,
                })
            }
        };

        let desired = desired_cluster_operator(
            original.as_ref(),
            &self.namespace,
            &self.name,
            current.as_ref(),
        )?;

        if original.as_ref() == Some(&desired) {
            debug!(name = %self.name, "ClusterOperator already up to date");
            return Ok(SyncOutcome::Unchanged);
        }

        debug!(
            name = %self.name,
            conditions = ?desired.conditions(),
            "updating ClusterOperator status"
        );
        match self.store.update_status(&desired).await {
            Ok(_) => {
                observability::metrics::increment_status_writes(
                    StoreOperation::UpdateStatus.as_str(),
                );
                Ok(SyncOutcome::Updated)
            }
            Err(e) if e.is_not_found() => self.create_with_status(&desired).await,
            Err(source) => Err(ReconcilerError::Store {
                operation: StoreOperation::UpdateStatus,
                source,
            }),
        }
    }

    /// Create the ClusterOperator and then write its status, since create
    /// does not persist the status subresource.
    async fn create_with_status(
        &self,
        desired: &ClusterOperator,
    ) -> Result<SyncOutcome, ReconcilerError> {
        let mut fresh = match self.store.create(&creatable(desired)).await {
            Ok(fresh) => fresh,
            Err(e) if e.is_not_found() => {
                info!(
                    name = %self.name,
                    "ClusterOperator API not registered yet, will retry"
                );
                return Ok(SyncOutcome::ApiNotRegistered);
            }
            Err(source) => {
                return Err(ReconcilerError::Store {
                    operation: StoreOperation::Create,
                    source,
                })
            }
        };
        observability::metrics::increment_status_writes(StoreOperation::Create.as_str());
        info!(namespace = %self.namespace, name = %self.name, "created ClusterOperator");

        fresh.status.clone_from(&desired.status);
        self.store
            .update_status(&fresh)
            .await
            .map_err(ReconcilerError::store(StoreOperation::UpdateStatus))?;
        observability::metrics::increment_status_writes(StoreOperation::UpdateStatus.as_str());
        Ok(SyncOutcome::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ConditionStatus, OperatorCondition};

    #[test]
    fn test_desired_from_empty_object() {
        let status = OperatorStatus::new(vec![OperatorCondition::new(
            "Available",
            ConditionStatus::True,
        )]);

        let desired = desired_cluster_operator(None, "", "etcd", Some(&status)).unwrap();

        assert_eq!(desired.kind.as_deref(), Some("ClusterOperator"));
        assert_eq!(desired.metadata.name.as_deref(), Some("etcd"));
        let types: Vec<&str> = desired.conditions().iter().map(|c| c.r#type.as_str()).collect();
        assert_eq!(types, vec!["Available", "Failing"]);
    }

    #[test]
    fn test_desired_preserves_fields_outside_status() {
        let original: ClusterOperator = serde_json::from_value(serde_json::json!({
            "apiVersion": "config.openshift.io/v1",
            "kind": "ClusterOperator",
            "metadata": {"name": "etcd", "labels": {"team": "storage"}, "resourceVersion": "9"},
            "spec": {"managementState": "Managed"},
            "status": {
                "conditions": [{"type": "Failing", "status": "True", "reason": "Old"}],
                "versions": [{"name": "operator", "version": "4.1"}]
            }
        }))
        .unwrap();

        let desired =
            desired_cluster_operator(Some(&original), "", "etcd", Some(&OperatorStatus::default()))
                .unwrap();

        assert_eq!(desired.extra, original.extra);
        assert_eq!(desired.metadata.labels, original.metadata.labels);
        assert_eq!(desired.metadata.resource_version.as_deref(), Some("9"));
        let status = desired.status.unwrap();
        assert!(status.extra.is_empty(), "status is regenerated from scratch");
        assert_eq!(status.conditions.len(), 1);
        assert_eq!(status.conditions[0].status, ConditionStatus::False);
    }

    #[test]
    fn test_desired_is_stable_for_same_input() {
        let status = OperatorStatus::new(vec![
            OperatorCondition::new("InstallerFailing", ConditionStatus::True).with_message("x"),
        ]);
        let first = desired_cluster_operator(None, "", "etcd", Some(&status)).unwrap();
        let second = desired_cluster_operator(Some(&first), "", "etcd", Some(&status)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_creatable_strips_server_fields() {
        let mut desired = ClusterOperator::new("", "etcd");
        desired.metadata.resource_version = Some("12".to_string());
        desired.metadata.uid = Some("abc".to_string());
        desired.metadata.generation = Some(3);

        let request = creatable(&desired);

        assert!(request.metadata.resource_version.is_none());
        assert!(request.metadata.uid.is_none());
        assert!(request.metadata.generation.is_none());
        assert_eq!(request.metadata.name.as_deref(), Some("etcd"));
    }
}
