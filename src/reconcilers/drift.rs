// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Drift detection: spec-hash changes and disappearance of assigned
//! external resources.
//!
//! Runs at the head of every normal reconcile. Spec drift triggers a full
//! reprovisioning cleanup; resource drift invalidates the affected progress
//! conditions so the pipeline re-runs from the newly opened step. Detection
//! never aborts the reconcile in flight.

use crate::aws::CertificateAuthority;
use crate::crd::{HostnameRequest, HostnameRequestSpec, HostnameRequestStatus, LoadBalancerConfiguration};
use crate::gateway::lbconfig_name;
use crate::reconcilers::certificate::probe_certificate_drift;
use crate::reconcilers::status::is_condition_true;
use crate::status_reasons::{
    CONDITION_CERTIFICATE_ISSUED, CONDITION_DNS_ALIAS_READY, CONDITION_DNS_VALIDATED,
    CONDITION_LISTENER_ATTACHED, CONDITION_READY,
};
use anyhow::Result;
use gateway_api::apis::standard::gateways::Gateway;
use kube::{Api, Client};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Compute the re-provisioning hash of a request spec.
///
/// Hashes `hostname|zoneId|visibility|gatewayClass` with defaults applied, so
/// making a default explicit does not read as a spec change. The first 8
/// bytes of the SHA-256 digest are enough to detect edits.
#[must_use]
pub fn compute_spec_hash(spec: &HostnameRequestSpec) -> String {
    let data = format!(
        "{}|{}|{}|{}",
        spec.hostname,
        spec.zone_id,
        spec.effective_visibility(),
        spec.effective_gateway_class()
    );
    let digest = Sha256::digest(data.as_bytes());
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// Whether the observed hash denotes a changed spec. An empty observed hash
/// means the request has never completed provisioning, which is not drift.
#[must_use]
pub fn spec_drifted(observed_hash: &str, computed_hash: &str) -> bool {
    !observed_hash.is_empty() && observed_hash != computed_hash
}

/// One observed divergence between status and the external world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriftObservation {
    /// The assigned gateway no longer exists
    GatewayMissing {
        /// Name of the vanished gateway
        gateway: String,
    },
    /// The gateway exists but its `LoadBalancerConfiguration` is gone
    LbConfigMissing {
        /// Name of the vanished configuration
        config: String,
    },
    /// The certificate disappeared or entered `FAILED`/`REVOKED`
    CertificateUnusable {
        /// Identifier of the unusable certificate
        certificate_id: String,
    },
}

impl DriftObservation {
    /// Conditions invalidated by this observation. Removing them re-opens the
    /// corresponding pipeline steps on the next pass.
    #[must_use]
    pub fn invalidated_conditions(&self) -> &'static [&'static str] {
        match self {
            DriftObservation::GatewayMissing { .. } | DriftObservation::LbConfigMissing { .. } => &[
                CONDITION_LISTENER_ATTACHED,
                CONDITION_DNS_ALIAS_READY,
                CONDITION_READY,
            ],
            DriftObservation::CertificateUnusable { .. } => &[
                CONDITION_CERTIFICATE_ISSUED,
                CONDITION_DNS_VALIDATED,
                CONDITION_LISTENER_ATTACHED,
                CONDITION_DNS_ALIAS_READY,
                CONDITION_READY,
            ],
        }
    }

    /// Whether the gateway assignment fields must be cleared too.
    #[must_use]
    pub fn clears_assignment(&self) -> bool {
        matches!(self, DriftObservation::GatewayMissing { .. })
    }

    /// Whether the stored certificate identifier must be cleared.
    #[must_use]
    pub fn clears_certificate(&self) -> bool {
        matches!(self, DriftObservation::CertificateUnusable { .. })
    }

    /// Metric label for this observation.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DriftObservation::GatewayMissing { .. } => "gateway",
            DriftObservation::LbConfigMissing { .. } => "loadbalancer_configuration",
            DriftObservation::CertificateUnusable { .. } => "certificate",
        }
    }

    /// Human-readable description for events and condition messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            DriftObservation::GatewayMissing { gateway } => {
                format!("assigned gateway {gateway} no longer exists")
            }
            DriftObservation::LbConfigMissing { config } => {
                format!("load balancer configuration {config} no longer exists")
            }
            DriftObservation::CertificateUnusable { certificate_id } => {
                format!("certificate {certificate_id} is missing or failed")
            }
        }
    }
}

/// Probe the assigned external resources and report divergences.
///
/// Only probes what the status claims exists: a request that never attached
/// has nothing to drift. Transient probe failures are logged and skipped so
/// an AWS hiccup is not mistaken for a vanished certificate.
///
/// # Errors
///
/// Returns an error when a cluster API probe fails (as opposed to a probe
/// observing absence).
pub async fn detect_resource_drift(
    client: &Client,
    authority: &dyn CertificateAuthority,
    request: &HostnameRequest,
    status: &HostnameRequestStatus,
) -> Result<Vec<DriftObservation>> {
    let mut observations = Vec::new();

    if !status.assigned_gateway.is_empty()
        && is_condition_true(&status.conditions, CONDITION_LISTENER_ATTACHED)
    {
        let gateways: Api<Gateway> =
            Api::namespaced(client.clone(), &status.assigned_gateway_namespace);
        match gateways.get_opt(&status.assigned_gateway).await? {
            None => observations.push(DriftObservation::GatewayMissing {
                gateway: status.assigned_gateway.clone(),
            }),
            Some(_) => {
                let config = lbconfig_name(&status.assigned_gateway);
                let configs: Api<LoadBalancerConfiguration> =
                    Api::namespaced(client.clone(), &status.assigned_gateway_namespace);
                if configs.get_opt(&config).await?.is_none() {
                    observations.push(DriftObservation::LbConfigMissing { config });
                }
            }
        }
    }

    if !status.certificate_id.is_empty() {
        match probe_certificate_drift(authority, &status.certificate_id).await {
            Ok(true) => observations.push(DriftObservation::CertificateUnusable {
                certificate_id: status.certificate_id.clone(),
            }),
            Ok(false) => {}
            Err(err) => {
                warn!(
                    request = request.metadata.name.as_deref().unwrap_or_default(),
                    error = %err,
                    "Skipping certificate drift probe"
                );
            }
        }
    }

    Ok(observations)
}

/// Apply drift observations to an in-memory status: remove invalidated
/// conditions and clear the fields each observation poisons.
pub fn apply_drift_observations(
    status: &mut HostnameRequestStatus,
    observations: &[DriftObservation],
) {
    for observation in observations {
        crate::reconcilers::status::remove_conditions(
            &mut status.conditions,
            observation.invalidated_conditions(),
        );
        if observation.clears_assignment() {
            status.assigned_gateway.clear();
            status.assigned_gateway_namespace.clear();
            status.assigned_load_balancer.clear();
        }
        if observation.clears_certificate() {
            status.certificate_id.clear();
        }
        crate::metrics::record_drift_observed(observation.kind());
    }
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod drift_tests;
