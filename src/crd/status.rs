//! # Operator Status
//!
//! The detailed status an operator publishes on its own custom resource.
//! The controller only ever reads these types.

use serde::{Deserialize, Deserializer, Serialize};

/// Status of a condition (True, False, Unknown)
///
/// Any other value, including an empty string, decodes as `Unknown` so a
/// single malformed condition cannot make the whole status unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ConditionStatus {
    True,
    False,
    #[serde(other)]
    Unknown,
}

impl ConditionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode `null` as the type's default (empty list, empty string)
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Detailed operator status as reported by the status provider
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorStatus {
    /// Generation of the operator resource the status was computed for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Conditions in the order the operator wrote them
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: Vec<OperatorCondition>,
}

impl OperatorStatus {
    #[must_use]
    pub fn new(conditions: Vec<OperatorCondition>) -> Self {
        Self {
            observed_generation: None,
            conditions,
        }
    }

    /// Find the first condition of the given type
    #[must_use]
    pub fn find_condition(&self, condition_type: &str) -> Option<&OperatorCondition> {
        self.conditions
            .iter()
            .find(|condition| condition.r#type == condition_type)
    }
}

/// A single operator condition
///
/// Empty `reason` and `message` are left out when serialized, so they
/// disappear from the translated ClusterOperator condition instead of
/// being written as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorCondition {
    /// Type of condition
    pub r#type: String,
    /// Status of condition
    pub status: ConditionStatus,
    /// Last transition time (RFC3339), copied verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    /// Machine-readable reason
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub reason: String,
    /// Human-readable message, may span several lines
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub message: String,
}

impl OperatorCondition {
    pub fn new(condition_type: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            r#type: condition_type.into(),
            status,
            last_transition_time: None,
            reason: String::new(),
            message: String::new(),
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}
