//! # ClusterOperator
//!
//! The externally visible status object (`config.openshift.io/v1`).
//!
//! Its schema belongs to another component, so only the fields the
//! controller owns are typed. Everything else on the object round-trips
//! through `extra` untouched.

use crate::constants::{
    CLUSTER_OPERATOR_GROUP, CLUSTER_OPERATOR_KIND, CLUSTER_OPERATOR_VERSION,
};
use crate::crd::status::null_as_default;
use crate::crd::ConditionStatus;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ClusterOperator object
///
/// # Example
///
/// ```yaml
/// apiVersion: config.openshift.io/v1
/// kind: ClusterOperator
/// metadata:
///   name: kube-apiserver
/// status:
///   conditions:
///   - type: Available
///     status: "True"
///   - type: Failing
///     status: "False"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOperator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Standard object metadata. Keys `ObjectMeta` does not model are
    /// dropped on decode; the API server prunes such keys anyway.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClusterOperatorStatus>,
    /// Top-level fields not owned by this controller (spec, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ClusterOperator {
    /// Empty object with only its identity set
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        let mut operator = Self::default();
        operator.set_identity(namespace, name);
        operator
    }

    /// Overwrite kind, apiVersion, namespace and name.
    ///
    /// An empty namespace means the object is cluster-scoped, so no
    /// namespace is recorded at all.
    pub fn set_identity(&mut self, namespace: &str, name: &str) {
        self.kind = Some(CLUSTER_OPERATOR_KIND.to_string());
        self.api_version = Some(format!(
            "{CLUSTER_OPERATOR_GROUP}/{CLUSTER_OPERATOR_VERSION}"
        ));
        self.metadata.namespace = (!namespace.is_empty()).then(|| namespace.to_string());
        self.metadata.name = Some(name.to_string());
    }

    #[must_use]
    pub fn conditions(&self) -> &[ClusterOperatorCondition] {
        self.status
            .as_ref()
            .map_or(&[], |status| status.conditions.as_slice())
    }

    #[must_use]
    pub fn find_condition(&self, condition_type: &str) -> Option<&ClusterOperatorCondition> {
        self.conditions()
            .iter()
            .find(|condition| condition.r#type == condition_type)
    }
}

/// Status of the ClusterOperator
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOperatorStatus {
    /// Conditions in the fixed order Available, Failing, Progressing
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: Vec<ClusterOperatorCondition>,
    /// Status fields written by someone else. Regenerating the status drops them.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Condition as stored on the ClusterOperator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOperatorCondition {
    /// Type of condition
    pub r#type: String,
    /// Status of condition (True, False, Unknown)
    pub status: ConditionStatus,
    /// Last transition time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    /// Reason for condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Message describing condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClusterOperatorCondition {
    pub fn new(condition_type: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            r#type: condition_type.into(),
            status,
            last_transition_time: None,
            reason: None,
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = serde_json::json!({
            "apiVersion": "config.openshift.io/v1",
            "kind": "ClusterOperator",
            "metadata": {"name": "kube-apiserver", "resourceVersion": "42"},
            "spec": {"managementState": "Managed"},
            "status": {
                "conditions": [{"type": "Failing", "status": "False"}],
                "versions": [{"name": "operator", "version": "4.1.0"}]
            }
        });

        let operator: ClusterOperator = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(
            operator.extra.get("spec"),
            Some(&serde_json::json!({"managementState": "Managed"}))
        );
        assert!(operator.status.as_ref().unwrap().extra.contains_key("versions"));
        assert_eq!(serde_json::to_value(&operator).unwrap(), raw);
    }

    #[test]
    fn test_standard_metadata_survives_round_trip() {
        let raw = serde_json::json!({
            "apiVersion": "config.openshift.io/v1",
            "kind": "ClusterOperator",
            "metadata": {
                "name": "kube-apiserver",
                "labels": {"team": "apiserver"},
                "annotations": {"include.release.openshift.io/self-managed": "true"},
                "finalizers": ["example.com/cleanup"],
                "ownerReferences": [{
                    "apiVersion": "config.openshift.io/v1",
                    "kind": "ClusterVersion",
                    "name": "version",
                    "uid": "1234"
                }]
            }
        });

        let operator: ClusterOperator = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(serde_json::to_value(&operator).unwrap(), raw);
    }

    #[test]
    fn test_foreign_conditions_decode_leniently() {
        let operator: ClusterOperator = serde_json::from_value(serde_json::json!({
            "metadata": {"name": "etcd"},
            "status": {"conditions": [{"type": "Upgradeable", "status": ""}]}
        }))
        .unwrap();
        assert_eq!(operator.conditions()[0].status, ConditionStatus::Unknown);

        let operator: ClusterOperator = serde_json::from_value(serde_json::json!({
            "metadata": {"name": "etcd"},
            "status": {"conditions": null}
        }))
        .unwrap();
        assert!(operator.conditions().is_empty());
    }

    #[test]
    fn test_set_identity_cluster_scoped_omits_namespace() {
        let operator = ClusterOperator::new("", "kube-apiserver");

        assert_eq!(operator.kind.as_deref(), Some("ClusterOperator"));
        assert_eq!(
            operator.api_version.as_deref(),
            Some("config.openshift.io/v1")
        );
        assert_eq!(operator.metadata.name.as_deref(), Some("kube-apiserver"));
        assert!(operator.metadata.namespace.is_none());
    }

    #[test]
    fn test_set_identity_overwrites_existing_values() {
        let mut operator = ClusterOperator::new("old-ns", "old-name");
        operator.kind = Some("Something".to_string());

        operator.set_identity("openshift-config", "etcd");

        assert_eq!(operator.kind.as_deref(), Some("ClusterOperator"));
        assert_eq!(
            operator.metadata.namespace.as_deref(),
            Some("openshift-config")
        );
        assert_eq!(operator.metadata.name.as_deref(), Some("etcd"));
    }

    #[test]
    fn test_find_condition_without_status() {
        let operator = ClusterOperator::new("", "etcd");
        assert!(operator.conditions().is_empty());
        assert!(operator.find_condition("Failing").is_none());
    }
}
