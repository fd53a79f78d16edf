//! # Condition Translation
//!
//! Converts the operator's detailed conditions into ClusterOperator conditions.
//!
//! - `Available` and `Progressing` are copied one-to-one when present and
//!   omitted when absent.
//! - Every condition whose type ends in `Failing` is folded into a single
//!   aggregate `Failing` condition, which is always emitted.

use crate::constants::{
    CONDITION_TYPE_AVAILABLE, CONDITION_TYPE_FAILING, CONDITION_TYPE_PROGRESSING,
    FAILING_CONDITION_SUFFIX, MULTIPLE_CONDITIONS_FAILING_REASON,
};
use crate::crd::{ClusterOperatorCondition, ConditionStatus, OperatorCondition, OperatorStatus};

/// Reshape one operator condition into the ClusterOperator schema.
///
/// Both schemas share the same wire shape, so the condition is encoded and
/// decoded through JSON. `None` in gives `None` out.
///
/// # Errors
///
/// Returns an error only if the condition cannot be encoded.
pub fn to_cluster_operator_condition(
    condition: Option<&OperatorCondition>,
) -> Result<Option<ClusterOperatorCondition>, serde_json::Error> {
    let Some(condition) = condition else {
        return Ok(None);
    };
    let value = serde_json::to_value(condition)?;
    serde_json::from_value(value).map(Some)
}

/// Fold every `*Failing` condition into the aggregate `Failing` condition.
///
/// - none True: `False`, no reason or message
/// - exactly one True: `True`, reason is that condition's type
/// - several True: `True`, reason is [`MULTIPLE_CONDITIONS_FAILING_REASON`]
///
/// The message joins every line of every True condition's message, each
/// prefixed with `"<Type>: "`, in the order the operator reported them.
/// Empty messages contribute nothing.
#[must_use]
pub fn aggregate_failing_condition(conditions: &[OperatorCondition]) -> ClusterOperatorCondition {
    let failing: Vec<&OperatorCondition> = conditions
        .iter()
        .filter(|condition| {
            condition.r#type.ends_with(FAILING_CONDITION_SUFFIX) && condition.is_true()
        })
        .collect();

    let mut aggregate = ClusterOperatorCondition::new(CONDITION_TYPE_FAILING, ConditionStatus::False);
    if failing.is_empty() {
        return aggregate;
    }

    aggregate.status = ConditionStatus::True;
    let messages: Vec<String> = failing
        .iter()
        .filter(|condition| !condition.message.is_empty())
        .flat_map(|condition| {
            condition
                .message
                .split('\n')
                .map(move |line| format!("{}: {}", condition.r#type, line))
        })
        .collect();
    if !messages.is_empty() {
        aggregate.message = Some(messages.join("\n"));
    }
    aggregate.reason = Some(match failing.as_slice() {
        [only] => only.r#type.clone(),
        _ => MULTIPLE_CONDITIONS_FAILING_REASON.to_string(),
    });
    aggregate
}

/// Aggregate `Failing` condition for an operator that has not reported any status yet
#[must_use]
pub fn unknown_failing_condition() -> ClusterOperatorCondition {
    ClusterOperatorCondition::new(CONDITION_TYPE_FAILING, ConditionStatus::Unknown)
}

/// Build the ClusterOperator condition list in the fixed order
/// Available, Failing, Progressing.
///
/// `None` means the operator has not published a status at all: Failing is
/// `Unknown` and the optional conditions are omitted.
///
/// # Errors
///
/// Returns an error if a condition cannot be encoded.
pub fn cluster_operator_conditions(
    status: Option<&OperatorStatus>,
) -> Result<Vec<ClusterOperatorCondition>, serde_json::Error> {
    let Some(status) = status else {
        return Ok(vec![unknown_failing_condition()]);
    };

    let mut conditions = Vec::with_capacity(3);
    if let Some(available) =
        to_cluster_operator_condition(status.find_condition(CONDITION_TYPE_AVAILABLE))?
    {
        conditions.push(available);
    }
    conditions.push(aggregate_failing_condition(&status.conditions));
    if let Some(progressing) =
        to_cluster_operator_condition(status.find_condition(CONDITION_TYPE_PROGRESSING))?
    {
        conditions.push(progressing);
    }
    Ok(conditions)
}
