// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `LoadBalancerConfiguration` synthesizer.
//!
//! The synthesized spec is a pure function of the set of live requests
//! assigned to a gateway (plus the gateway's scheme and WAF): membership is
//! re-derived by listing requests, never tracked through back-pointers, so
//! concurrent reconciles of requests sharing a gateway converge on the same
//! bundle regardless of ordering. Writes are full-spec replacement so drift
//! corrects on every reconcile.

use crate::crd::{
    HostnameRequest, ListenerConfiguration, LoadBalancerConfiguration,
    LoadBalancerConfigurationSpec, TargetGroupConfiguration, WafV2Configuration,
};
use crate::gateway::{is_not_found, lbconfig_name, tgconfig_name};
use anyhow::{Context as _, Result};
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::{debug, info};

/// Collect the certificate bundle for a gateway from the live request list.
///
/// A request contributes its certificate iff it is assigned to the gateway,
/// not being deleted, and has a certificate identifier in status. The
/// `extra_certificate` lets the reconcile that is *about to* persist its own
/// assignment participate before its status lands.
///
/// The result is sorted and deduplicated; index 0 is the default certificate.
///
/// # Errors
///
/// Returns an error when listing requests fails.
pub async fn collect_assigned_certificates(
    client: &Client,
    gateway_name: &str,
    gateway_namespace: &str,
    extra_certificate: Option<&str>,
) -> Result<Vec<String>> {
    let api: Api<HostnameRequest> = Api::all(client.clone());
    let requests = api
        .list(&Default::default())
        .await
        .context("failed to list hostname requests")?;

    let mut certificates: Vec<String> = requests
        .items
        .iter()
        .filter(|request| request.metadata.deletion_timestamp.is_none())
        .filter_map(|request| request.status.as_ref())
        .filter(|status| {
            status.assigned_gateway == gateway_name
                && status.assigned_gateway_namespace == gateway_namespace
                && !status.certificate_id.is_empty()
        })
        .map(|status| status.certificate_id.clone())
        .collect();

    if let Some(extra) = extra_certificate {
        certificates.push(extra.to_string());
    }

    certificates.sort();
    certificates.dedup();
    Ok(certificates)
}

/// Build the deterministic listener list for a certificate bundle.
///
/// With no certificates the HTTPS listener is omitted entirely; otherwise the
/// lexicographically smallest identifier is the default certificate and the
/// rest ride SNI. The HTTP listener is always appended.
#[must_use]
pub fn build_listener_configurations(
    certificate_ids: &[String],
    https_port: i32,
    http_port: i32,
) -> Vec<ListenerConfiguration> {
    let mut sorted = certificate_ids.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut listeners = Vec::with_capacity(2);

    if let Some((default_certificate, rest)) = sorted.split_first() {
        listeners.push(ListenerConfiguration {
            protocol_port: format!("HTTPS:{https_port}"),
            default_certificate: Some(default_certificate.clone()),
            certificates: (!rest.is_empty()).then(|| rest.to_vec()),
        });
    }

    listeners.push(ListenerConfiguration {
        protocol_port: format!("HTTP:{http_port}"),
        default_certificate: None,
        certificates: None,
    });

    listeners
}

/// Write the full `LoadBalancerConfiguration` spec for a gateway.
///
/// Creates the object if absent, replaces the spec otherwise.
///
/// # Errors
///
/// Returns an error when the create or patch fails.
#[allow(clippy::too_many_arguments)]
pub async fn sync_lbconfig(
    client: &Client,
    gateway_name: &str,
    gateway_namespace: &str,
    certificate_ids: &[String],
    visibility: &str,
    waf_arn: &str,
    https_port: i32,
    http_port: i32,
) -> Result<()> {
    let config_name = lbconfig_name(gateway_name);
    let api: Api<LoadBalancerConfiguration> = Api::namespaced(client.clone(), gateway_namespace);

    let spec = LoadBalancerConfigurationSpec {
        scheme: Some(visibility.to_string()),
        listener_configurations: Some(build_listener_configurations(
            certificate_ids,
            https_port,
            http_port,
        )),
        waf_v2: (!waf_arn.is_empty()).then(|| WafV2Configuration {
            web_acl: waf_arn.to_string(),
        }),
    };

    match api.get_opt(&config_name).await? {
        Some(_) => {
            api.patch(
                &config_name,
                &PatchParams::default(),
                &Patch::Merge(&json!({ "spec": spec })),
            )
            .await
            .with_context(|| format!("failed to update LoadBalancerConfiguration {config_name}"))?;
            debug!(
                config = %config_name,
                certificates = certificate_ids.len(),
                "Updated LoadBalancerConfiguration"
            );
        }
        None => {
            let config = LoadBalancerConfiguration {
                metadata: kube::api::ObjectMeta {
                    name: Some(config_name.clone()),
                    namespace: Some(gateway_namespace.to_string()),
                    ..Default::default()
                },
                spec,
            };
            api.create(&PostParams::default(), &config)
                .await
                .with_context(|| format!("failed to create LoadBalancerConfiguration {config_name}"))?;
            info!(
                config = %config_name,
                certificates = certificate_ids.len(),
                "Created LoadBalancerConfiguration"
            );
            crate::metrics::record_resource_created("loadbalancer_configuration");
        }
    }

    Ok(())
}

/// Delete a gateway's `LoadBalancerConfiguration` and its
/// `TargetGroupConfiguration`. Not-found is success.
///
/// # Errors
///
/// Returns an error on API failures other than not-found.
pub async fn delete_lbconfig(
    client: &Client,
    gateway_name: &str,
    gateway_namespace: &str,
) -> Result<()> {
    let config_name = lbconfig_name(gateway_name);
    let api: Api<LoadBalancerConfiguration> = Api::namespaced(client.clone(), gateway_namespace);
    match api.delete(&config_name, &DeleteParams::default()).await {
        Ok(_) => {
            info!(config = %config_name, "Deleted LoadBalancerConfiguration");
            crate::metrics::record_resource_deleted("loadbalancer_configuration");
        }
        Err(err) if is_not_found(&err) => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to delete LoadBalancerConfiguration {config_name}"))
        }
    }

    let tg_name = tgconfig_name(gateway_name);
    let tg_api: Api<TargetGroupConfiguration> = Api::namespaced(client.clone(), gateway_namespace);
    match tg_api.delete(&tg_name, &DeleteParams::default()).await {
        Ok(_) => info!(config = %tg_name, "Deleted TargetGroupConfiguration"),
        Err(err) if is_not_found(&err) => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to delete TargetGroupConfiguration {tg_name}"))
        }
    }

    Ok(())
}

/// Count requests still assigned to a gateway, excluding one uid (the request
/// currently tearing down) and any request already being deleted.
///
/// Used by the teardown pipeline: the last user turns off the lights.
///
/// # Errors
///
/// Returns an error when listing requests fails.
pub async fn remaining_assignments(
    client: &Client,
    gateway_name: &str,
    gateway_namespace: &str,
    excluding_uid: &str,
) -> Result<usize> {
    let api: Api<HostnameRequest> = Api::all(client.clone());
    let requests = api
        .list(&Default::default())
        .await
        .context("failed to list hostname requests")?;

    Ok(requests
        .items
        .iter()
        .filter(|request| request.metadata.deletion_timestamp.is_none())
        .filter(|request| request.uid().as_deref() != Some(excluding_uid))
        .filter_map(|request| request.status.as_ref())
        .filter(|status| {
            status.assigned_gateway == gateway_name
                && status.assigned_gateway_namespace == gateway_namespace
        })
        .count())
}

#[cfg(test)]
#[path = "lbconfig_tests.rs"]
mod lbconfig_tests;
