// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for `HostnameRequest` resources.
//!
//! Conditions form an ordered set keyed by type. Each provisioning step gates
//! on its own condition being `True` in the *persisted* status, so these
//! helpers are the only place conditions are constructed and mutated.
//!
//! # Condition Format
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The pipeline step being reported (e.g. `Claimed`, `CertificateIssued`)
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `observedGeneration`: Spec generation the condition was computed against
//! - `lastTransitionTime`: RFC3339 timestamp, preserved while the status value
//!   is unchanged so `kubectl describe` shows real transition times

use crate::crd::{Condition, HostnameRequest, HostnameRequestStatus};
use anyhow::Result;
use chrono::Utc;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;

/// Set (insert or replace) a condition in the set, preserving the previous
/// `lastTransitionTime` when the status value did not change.
pub fn set_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
    observed_generation: Option<i64>,
) {
    let last_transition_time = match find_condition(conditions, condition_type) {
        Some(existing) if existing.status == status => existing
            .last_transition_time
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
        _ => Utc::now().to_rfc3339(),
    };

    let condition = Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        observed_generation,
        last_transition_time: Some(last_transition_time),
    };

    if let Some(existing) = conditions
        .iter_mut()
        .find(|c| c.r#type == condition_type)
    {
        *existing = condition;
    } else {
        conditions.push(condition);
    }
}

/// Find a condition by type.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Whether a condition exists and is `True`.
#[must_use]
pub fn is_condition_true(conditions: &[Condition], condition_type: &str) -> bool {
    find_condition(conditions, condition_type).is_some_and(|c| c.status == "True")
}

/// Remove the named conditions from the set.
///
/// Used by drift detection: a removed condition re-opens its pipeline step on
/// the next reconcile.
pub fn remove_conditions(conditions: &mut Vec<Condition>, condition_types: &[&str]) {
    conditions.retain(|c| !condition_types.contains(&c.r#type.as_str()));
}

/// Persist a status through the status subresource with a merge patch.
///
/// # Errors
///
/// Returns an error when the API rejects the patch; optimistic-concurrency
/// conflicts surface here and the work queue retries the reconcile.
pub async fn persist_status(
    client: &Client,
    request: &HostnameRequest,
    status: &HostnameRequestStatus,
) -> Result<()> {
    let namespace = request.namespace().unwrap_or_default();
    let api: Api<HostnameRequest> = Api::namespaced(client.clone(), &namespace);

    api.patch_status(
        &request.name_any(),
        &PatchParams::default(),
        &Patch::Merge(&json!({ "status": status })),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
