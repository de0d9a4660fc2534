// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Route admission glue.
//!
//! Listener-level admission is open: every listener allows `HTTPRoute`s from
//! all namespaces, and hostname-level authorization is delegated to the
//! external policy engine consuming `HostnameGrant`s. The namespace access
//! label is informational glue recording which gateway a namespace uses.

use crate::crd::HostnameRequest;
use crate::labels::LABEL_GATEWAY_ACCESS;
use anyhow::{Context as _, Result};
use gateway_api::apis::standard::gateways::{
    Gateway, GatewayListenersAllowedRoutes, GatewayListenersAllowedRoutesNamespaces,
    GatewayListenersAllowedRoutesNamespacesFrom,
};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::{debug, info};

/// Ensure every listener on the gateway admits routes from all namespaces.
///
/// # Errors
///
/// Returns an error when the gateway cannot be read or written.
pub async fn ensure_allowed_routes(
    client: &Client,
    gateway_name: &str,
    gateway_namespace: &str,
) -> Result<()> {
    let api: Api<Gateway> = Api::namespaced(client.clone(), gateway_namespace);
    let mut gateway = api
        .get(gateway_name)
        .await
        .with_context(|| format!("failed to get gateway {gateway_name}"))?;

    let mut updated = false;
    for listener in &mut gateway.spec.listeners {
        let already_open = listener
            .allowed_routes
            .as_ref()
            .and_then(|allowed| allowed.namespaces.as_ref())
            .and_then(|namespaces| namespaces.from.as_ref())
            .is_some_and(|from| matches!(from, GatewayListenersAllowedRoutesNamespacesFrom::All));

        if !already_open {
            listener.allowed_routes = Some(GatewayListenersAllowedRoutes {
                kinds: None,
                namespaces: Some(GatewayListenersAllowedRoutesNamespaces {
                    from: Some(GatewayListenersAllowedRoutesNamespacesFrom::All),
                    selector: None,
                }),
            });
            updated = true;
        }
    }

    if updated {
        api.replace(gateway_name, &PostParams::default(), &gateway)
            .await
            .with_context(|| format!("failed to update allowedRoutes on {gateway_name}"))?;
        info!(gateway = gateway_name, "Opened listener route admission");
    }

    Ok(())
}

/// Label the requesting namespace with its assigned gateway.
///
/// # Errors
///
/// Returns an error when the namespace cannot be read or patched.
pub async fn ensure_namespace_label(
    client: &Client,
    namespace: &str,
    gateway_name: &str,
) -> Result<()> {
    let api: Api<Namespace> = Api::all(client.clone());
    let ns = api
        .get(namespace)
        .await
        .with_context(|| format!("failed to get namespace {namespace}"))?;

    let current = ns
        .metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(LABEL_GATEWAY_ACCESS));
    if current.map(String::as_str) == Some(gateway_name) {
        return Ok(());
    }

    let patch = json!({ "metadata": { "labels": { LABEL_GATEWAY_ACCESS: gateway_name } } });
    api.patch(namespace, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .with_context(|| format!("failed to label namespace {namespace}"))?;

    info!(namespace, gateway = gateway_name, "Labeled namespace for gateway access");
    Ok(())
}

/// Remove the access label from the namespace unless a sibling request still
/// references the same gateway.
///
/// # Errors
///
/// Returns an error when the request list or the namespace patch fails;
/// a namespace that is already gone is success.
pub async fn remove_namespace_label_if_unused(
    client: &Client,
    namespace: &str,
    gateway_name: &str,
    gateway_namespace: &str,
    excluding_uid: &str,
) -> Result<()> {
    let requests: Api<HostnameRequest> = Api::namespaced(client.clone(), namespace);
    let siblings = requests
        .list(&Default::default())
        .await
        .context("failed to list sibling hostname requests")?;

    let still_used = siblings
        .items
        .iter()
        .filter(|request| request.metadata.deletion_timestamp.is_none())
        .filter(|request| request.uid().as_deref() != Some(excluding_uid))
        .filter_map(|request| request.status.as_ref())
        .any(|status| {
            status.assigned_gateway == gateway_name
                && status.assigned_gateway_namespace == gateway_namespace
        });

    if still_used {
        debug!(
            namespace,
            gateway = gateway_name,
            "Keeping namespace label, sibling request still uses the gateway"
        );
        return Ok(());
    }

    let api: Api<Namespace> = Api::all(client.clone());
    let Some(ns) = api
        .get_opt(namespace)
        .await
        .with_context(|| format!("failed to get namespace {namespace}"))?
    else {
        return Ok(());
    };

    if ns
        .metadata
        .labels
        .as_ref()
        .is_none_or(|labels| !labels.contains_key(LABEL_GATEWAY_ACCESS))
    {
        return Ok(());
    }

    // Merge-patching a label to null deletes it
    let patch = json!({ "metadata": { "labels": { LABEL_GATEWAY_ACCESS: null } } });
    api.patch(namespace, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .with_context(|| format!("failed to unlabel namespace {namespace}"))?;

    info!(namespace, "Removed gateway access label");
    Ok(())
}
