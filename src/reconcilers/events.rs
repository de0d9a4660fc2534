// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes Event posting for `HostnameRequest` state transitions.
//!
//! Every externally visible transition (claim, issuance, assignment, drift,
//! teardown) records an Event so `kubectl describe` shows a chronological
//! trail. Event creation failures are logged and swallowed; observability
//! must never fail a reconcile.

use anyhow::Result;
use k8s_openapi::api::core::v1::{Event, ObjectReference};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use k8s_openapi::chrono::Utc;
use kube::api::{Api, PostParams};
use kube::{Client, Resource, ResourceExt};
use tracing::warn;

/// Event type for normal transitions.
pub const EVENT_TYPE_NORMAL: &str = "Normal";

/// Event type for failures and drift.
pub const EVENT_TYPE_WARNING: &str = "Warning";

/// Create a Kubernetes Event for a resource.
///
/// # Arguments
///
/// * `client` - Kubernetes API client
/// * `resource` - The resource the event refers to
/// * `event_type` - [`EVENT_TYPE_NORMAL`] or [`EVENT_TYPE_WARNING`]
/// * `reason` - Short CamelCase reason (e.g. `Claimed`, `DriftDetected`)
/// * `message` - Human-readable message describing the event
pub async fn create_event<T>(
    client: &Client,
    resource: &T,
    event_type: &str,
    reason: &str,
    message: &str,
) -> Result<()>
where
    T: Resource<DynamicType = ()> + ResourceExt,
{
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    let event_api: Api<Event> = Api::namespaced(client.clone(), &namespace);

    let now = Time(Utc::now());
    let event = Event {
        metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
            generate_name: Some(format!("{name}-")),
            namespace: Some(namespace.clone()),
            ..Default::default()
        },
        involved_object: ObjectReference {
            api_version: Some(T::api_version(&()).to_string()),
            kind: Some(T::kind(&()).to_string()),
            name: Some(name.clone()),
            namespace: Some(namespace),
            uid: resource.meta().uid.clone(),
            ..Default::default()
        },
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        type_: Some(event_type.to_string()),
        first_timestamp: Some(now.clone()),
        last_timestamp: Some(now),
        count: Some(1),
        ..Default::default()
    };

    match event_api.create(&PostParams::default(), &event).await {
        Ok(_) => Ok(()),
        Err(e) => {
            warn!("Failed to create event for {}: {}", name, e);
            Ok(())
        }
    }
}
