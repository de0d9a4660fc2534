// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain claim registry: the cluster-wide lock on `(zoneId, hostname)`.
//!
//! The claim is the only durable cross-request synchronization primitive.
//! It never relies on controller-local state: a restart or leader handoff
//! re-reads ownership from the cluster, so a closed claim stays closed.

use crate::crd::{
    DomainClaim, DomainClaimOwnerRef, DomainClaimSpec, DomainClaimStatus, HostnameRequest,
};
use anyhow::{Context as _, Result};
use chrono::Utc;
use kube::api::{DeleteParams, ObjectMeta, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use tracing::{debug, info};

/// Outcome of a claim attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The claim exists and is owned by this request
    Owned,
    /// The claim is held by a different request; terminal until a user resolves it
    Conflict,
}

/// Ensure a `DomainClaim` exists for this request's hostname.
///
/// First-come-first-serve: the claim is created if absent; if present its
/// `ownerRef.uid` decides ownership. A create that loses the race to another
/// reconcile re-reads the winner's claim and reports [`ClaimOutcome::Conflict`]
/// unless the winner turns out to be this same request.
///
/// # Errors
///
/// Returns an error on API failures other than the create race.
pub async fn ensure_claim(client: &Client, request: &HostnameRequest) -> Result<ClaimOutcome> {
    let claim_name = claim_name(&request.spec.zone_id, &request.spec.hostname);
    let api: Api<DomainClaim> = Api::all(client.clone());
    let uid = request.meta().uid.clone().unwrap_or_default();

    match api.get_opt(&claim_name).await.context("failed to get domain claim")? {
        Some(claim) => Ok(ownership(&claim, request, &uid)),
        None => {
            let claim = DomainClaim {
                metadata: ObjectMeta {
                    name: Some(claim_name.clone()),
                    ..Default::default()
                },
                spec: DomainClaimSpec {
                    zone_id: request.spec.zone_id.clone(),
                    hostname: request.spec.hostname.clone(),
                    owner_ref: DomainClaimOwnerRef {
                        namespace: request.namespace().unwrap_or_default(),
                        name: request.name_any(),
                        uid: uid.clone(),
                    },
                },
                status: Some(DomainClaimStatus {
                    claimed_at: Some(Utc::now().to_rfc3339()),
                }),
            };

            match api.create(&PostParams::default(), &claim).await {
                Ok(_) => {
                    info!(
                        claim = %claim_name,
                        hostname = %request.spec.hostname,
                        "Created domain claim"
                    );
                    crate::metrics::record_resource_created("domain_claim");
                    Ok(ClaimOutcome::Owned)
                }
                Err(err) if crate::gateway::is_already_exists(&err) => {
                    // Race: someone else created it between our get and create.
                    // Re-fetch and re-judge ownership instead of assuming defeat.
                    let claim = api
                        .get(&claim_name)
                        .await
                        .context("failed to re-fetch domain claim after create race")?;
                    Ok(ownership(&claim, request, &uid))
                }
                Err(err) => Err(err).context("failed to create domain claim"),
            }
        }
    }
}

/// Release the claim, but only when this request owns it.
///
/// Not-found is success; a claim held by another request is left untouched.
///
/// # Errors
///
/// Returns an error on API failures.
pub async fn release_claim(client: &Client, request: &HostnameRequest) -> Result<()> {
    let claim_name = claim_name(&request.spec.zone_id, &request.spec.hostname);
    let api: Api<DomainClaim> = Api::all(client.clone());
    let uid = request.meta().uid.clone().unwrap_or_default();

    let Some(claim) = api
        .get_opt(&claim_name)
        .await
        .context("failed to get domain claim")?
    else {
        return Ok(());
    };

    if ownership(&claim, request, &uid) != ClaimOutcome::Owned {
        debug!(
            claim = %claim_name,
            "Skipping claim release, held by another request"
        );
        return Ok(());
    }

    match api.delete(&claim_name, &DeleteParams::default()).await {
        Ok(_) => {
            info!(claim = %claim_name, "Released domain claim");
            crate::metrics::record_resource_deleted("domain_claim");
            Ok(())
        }
        Err(err) if crate::gateway::is_not_found(&err) => Ok(()),
        Err(err) => Err(err).context("failed to delete domain claim"),
    }
}

fn ownership(claim: &DomainClaim, request: &HostnameRequest, uid: &str) -> ClaimOutcome {
    let owner = &claim.spec.owner_ref;
    if owner.namespace == request.namespace().unwrap_or_default()
        && owner.name == request.name_any()
        && owner.uid == uid
    {
        ClaimOutcome::Owned
    } else {
        ClaimOutcome::Conflict
    }
}

/// Deterministic claim name for a `(zoneId, hostname)` pair.
///
/// Lowercased `<zone>-<hostname>` with `*` sanitized to `wildcard` so the
/// result is a valid Kubernetes object name. The hostname itself is stored
/// verbatim in the claim spec.
#[must_use]
pub fn claim_name(zone_id: &str, hostname: &str) -> String {
    let sanitized = hostname.replace('*', "wildcard");
    format!(
        "{}-{}",
        zone_id.to_lowercase(),
        sanitized.to_lowercase()
    )
}

#[cfg(test)]
#[path = "claim_tests.rs"]
mod claim_tests;
