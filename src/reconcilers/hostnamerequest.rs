// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The `HostnameRequest` reconciliation engine.
//!
//! Drives a request through the nine-step provisioning pipeline:
//!
//! ```text
//! Validate -> Claim -> RequestCert -> EnsureValidation -> PollIssuance ->
//! Assign (includes LB-config sync) -> EnsureAlias -> EnsureAdmission -> MarkReady
//! ```
//!
//! Each step gates on its own condition being `True` in the persisted status,
//! so a reconcile can resume from any interruption: status plus remote state
//! form a total order visible across restarts. Transient failures set the
//! condition `False` with a reason and yield with a requeue delay; terminal
//! failures park the request until a spec edit; unexpected failures bubble to
//! the work queue for exponential backoff.
//!
//! Deletion runs the ordered teardown pipeline under the finalizer, waiting
//! for certificate detachment and shrinking the gateway pool when the last
//! assignment leaves.

use crate::aws::{CertificateAuthority, DnsRegistry};
use crate::config::{hostname_allowed, Config};
use crate::constants::{
    FINALIZER, REQUEUE_MEDIUM_SECS, REQUEUE_SHORT_SECS, REQUEUE_WHEN_READY_SECS,
};
use crate::crd::{HostnameRequest, HostnameRequestSpec, HostnameRequestStatus};
use crate::gateway::{
    gateway_info, is_not_found, GatewayInfo, GatewayPool, PlacementOutcome, PlacementRequest,
};
use crate::reconcilers::admission::{
    ensure_allowed_routes, ensure_namespace_label, remove_namespace_label_if_unused,
};
use crate::reconcilers::alias::{delete_alias_records, ensure_alias_records, AliasError};
use crate::reconcilers::certificate::{
    self, certificate_in_use, delete_validation_records, poll_issuance, IssuancePoll,
    ValidationError,
};
use crate::reconcilers::claim::{ensure_claim, release_claim, ClaimOutcome};
use crate::reconcilers::drift::{
    apply_drift_observations, compute_spec_hash, detect_resource_drift, spec_drifted,
};
use crate::reconcilers::events::{create_event, EVENT_TYPE_NORMAL, EVENT_TYPE_WARNING};
use crate::reconcilers::finalizers::{ensure_finalizer, has_finalizer, remove_finalizer};
use crate::reconcilers::lbconfig::{
    collect_assigned_certificates, delete_lbconfig, remaining_assignments, sync_lbconfig,
};
use crate::reconcilers::status::{is_condition_true, persist_status, remove_conditions, set_condition};
use crate::status_reasons::*;
use anyhow::{Context as _, Result};
use gateway_api::apis::standard::gateways::Gateway;
use kube::api::DeleteParams;
use kube::runtime::controller::Action;
use kube::{Api, Client, ResourceExt};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Shared dependencies handed to every reconcile.
pub struct Context {
    /// Kubernetes API client
    pub client: Client,
    /// Certificate authority adapter (ACM in production)
    pub certificate_authority: Arc<dyn CertificateAuthority>,
    /// DNS registry adapter (Route53 in production)
    pub dns_registry: Arc<dyn DnsRegistry>,
    /// Gateway pool allocator
    pub pool: GatewayPool,
    /// Controller configuration
    pub config: Config,
}

static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // The CRD schema enforces the plain form; the controller additionally
    // accepts a single leading wildcard label for ACM wildcard certificates.
    Regex::new(r"^(\*\.)?([a-z0-9]+(-[a-z0-9]+)*\.)+[a-z]{2,}$").unwrap()
});

static WAF_ARN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^arn:aws:wafv2:[a-z0-9-]+:[0-9]+:.*$").unwrap());

fn requeue_after(reason: &str, secs: u64) -> Action {
    crate::metrics::record_requeue(reason);
    Action::requeue(Duration::from_secs(secs))
}

/// Reconcile one `HostnameRequest`.
///
/// # Errors
///
/// Returns an error only for unexpected failures; the work queue retries
/// those with exponential backoff. Expected waits yield requeue actions.
pub async fn reconcile_hostname_request(ctx: &Context, request: HostnameRequest) -> Result<Action> {
    if request.metadata.deletion_timestamp.is_some() {
        return reconcile_delete(ctx, &request).await;
    }

    ensure_finalizer(&ctx.client, &request, FINALIZER).await?;

    let namespace = request.namespace().unwrap_or_default();
    let name = request.name_any();
    let generation = request.metadata.generation;
    info!(
        hostname = %request.spec.hostname,
        zone_id = %request.spec.zone_id,
        "Reconciling HostnameRequest {namespace}/{name}"
    );

    let mut status = request.status.clone().unwrap_or_default();

    // Spec drift: the hashed fields changed, so everything provisioned for
    // the old spec is torn down (finalizer kept) and the pipeline restarts.
    let computed_hash = compute_spec_hash(&request.spec);
    if spec_drifted(&status.observed_spec_hash, &computed_hash) {
        info!(
            old_hash = %status.observed_spec_hash,
            new_hash = %computed_hash,
            hostname = %request.spec.hostname,
            "Spec changed, triggering re-provisioning"
        );
        create_event(
            &ctx.client,
            &request,
            EVENT_TYPE_NORMAL,
            "SpecChanged",
            "Spec changed, cleaning up for re-provisioning",
        )
        .await?;
        crate::metrics::record_drift_observed("spec");

        if let Err(err) = teardown_external_resources(ctx, &request, &status, false).await {
            warn!(error = %err, "Best-effort cleanup during reprovisioning failed");
        }

        status = HostnameRequestStatus::default();
        persist_status(&ctx.client, &request, &status).await?;
        return Ok(Action::requeue(Duration::ZERO));
    }

    // Resource drift: invalidate conditions for vanished externals, then keep
    // going; re-opened steps run again further down this same pass.
    let observations =
        detect_resource_drift(&ctx.client, ctx.certificate_authority.as_ref(), &request, &status)
            .await?;
    if !observations.is_empty() {
        for observation in &observations {
            warn!(request = %name, "Drift detected: {}", observation.describe());
            create_event(
                &ctx.client,
                &request,
                EVENT_TYPE_WARNING,
                REASON_DRIFT_DETECTED,
                &observation.describe(),
            )
            .await?;
        }
        apply_drift_observations(&mut status, &observations);
        persist_status(&ctx.client, &request, &status).await?;
    }

    // Step 1: Validate
    if let Err(message) = validate_request(&request.spec, &ctx.config) {
        set_condition(
            &mut status.conditions,
            CONDITION_RESOURCE_VALIDATION_ERROR,
            "True",
            REASON_VALIDATION_FAILED,
            &message,
            generation,
        );
        set_condition(
            &mut status.conditions,
            CONDITION_READY,
            "False",
            REASON_VALIDATION_FAILED,
            &message,
            generation,
        );
        persist_status(&ctx.client, &request, &status).await?;
        create_event(
            &ctx.client,
            &request,
            EVENT_TYPE_WARNING,
            REASON_VALIDATION_FAILED,
            &format!("Request validation failed: {message}"),
        )
        .await?;
        // A spec edit is required to progress
        return Ok(Action::await_change());
    }
    remove_conditions(&mut status.conditions, &[CONDITION_RESOURCE_VALIDATION_ERROR]);

    // Step 2: Claim the domain (first-come-first-serve)
    let newly_claimed = !is_condition_true(&status.conditions, CONDITION_CLAIMED);
    match ensure_claim(&ctx.client, &request).await {
        Ok(ClaimOutcome::Owned) => {
            set_condition(
                &mut status.conditions,
                CONDITION_CLAIMED,
                "True",
                REASON_CLAIMED,
                "Domain successfully claimed",
                generation,
            );
            if newly_claimed {
                create_event(
                    &ctx.client,
                    &request,
                    EVENT_TYPE_NORMAL,
                    REASON_CLAIMED,
                    "Domain successfully claimed",
                )
                .await?;
            }
        }
        Ok(ClaimOutcome::Conflict) => {
            let message = "Hostname already claimed by another request";
            set_condition(
                &mut status.conditions,
                CONDITION_CLAIMED,
                "False",
                REASON_ALREADY_CLAIMED,
                message,
                generation,
            );
            set_condition(
                &mut status.conditions,
                CONDITION_READY,
                "False",
                REASON_ALREADY_CLAIMED,
                message,
                generation,
            );
            persist_status(&ctx.client, &request, &status).await?;
            create_event(
                &ctx.client,
                &request,
                EVENT_TYPE_WARNING,
                REASON_ALREADY_CLAIMED,
                message,
            )
            .await?;
            // Terminal until a user resolves the conflict
            return Ok(Action::await_change());
        }
        Err(err) => {
            set_condition(
                &mut status.conditions,
                CONDITION_CLAIMED,
                "False",
                REASON_CLAIM_FAILED,
                &err.to_string(),
                generation,
            );
            persist_status(&ctx.client, &request, &status).await?;
            return Err(err);
        }
    }

    // Step 3: Request the certificate, storing the identifier before
    // anything else depends on it.
    if status.certificate_id.is_empty() {
        match certificate::request_certificate(
            ctx.certificate_authority.as_ref(),
            &request.spec.hostname,
            &namespace,
            request.spec.environment.as_deref(),
        )
        .await
        {
            Ok(certificate_id) => {
                status.certificate_id = certificate_id;
                set_condition(
                    &mut status.conditions,
                    CONDITION_CERTIFICATE_REQUESTED,
                    "True",
                    REASON_REQUESTED,
                    "Certificate requested from ACM",
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
            }
            Err(err) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_CERTIFICATE_REQUESTED,
                    "False",
                    REASON_REQUEST_FAILED,
                    &err.to_string(),
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                return Err(err);
            }
        }
    }

    // Step 4: Ensure the authority's DNS validation records exist
    if !is_condition_true(&status.conditions, CONDITION_DNS_VALIDATED) {
        match certificate::ensure_validation_records(
            ctx.certificate_authority.as_ref(),
            ctx.dns_registry.as_ref(),
            &status.certificate_id,
            &request.spec.zone_id,
        )
        .await
        {
            Ok(()) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_DNS_VALIDATED,
                    "True",
                    REASON_RECORDS_CREATED,
                    "DNS validation records created",
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
            }
            Err(ValidationError::RecordsNotReady) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_DNS_VALIDATED,
                    "False",
                    REASON_PENDING_VALIDATION_RECORDS,
                    "Waiting for ACM to publish validation records",
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                return Ok(requeue_after(REASON_PENDING_VALIDATION_RECORDS, REQUEUE_SHORT_SECS));
            }
            Err(ValidationError::Other(err)) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_DNS_VALIDATED,
                    "False",
                    REASON_VALIDATION_RECORD_FAILED,
                    &err.to_string(),
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                return Err(err);
            }
        }
    }

    // Step 5: Poll for issuance
    if !is_condition_true(&status.conditions, CONDITION_CERTIFICATE_ISSUED) {
        match poll_issuance(ctx.certificate_authority.as_ref(), &status.certificate_id).await {
            Ok(IssuancePoll::Issued) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_CERTIFICATE_ISSUED,
                    "True",
                    REASON_ISSUED,
                    "Certificate issued by ACM",
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                create_event(
                    &ctx.client,
                    &request,
                    EVENT_TYPE_NORMAL,
                    "CertificateIssued",
                    "ACM certificate issued",
                )
                .await?;
            }
            Ok(IssuancePoll::Pending) => {
                debug!(hostname = %request.spec.hostname, "Certificate not yet issued, requeuing");
                set_condition(
                    &mut status.conditions,
                    CONDITION_CERTIFICATE_ISSUED,
                    "False",
                    REASON_PENDING_ISSUANCE,
                    "Waiting for ACM to issue certificate",
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                return Ok(requeue_after(REASON_PENDING_ISSUANCE, REQUEUE_MEDIUM_SECS));
            }
            Ok(IssuancePoll::FailedTerminally(message)) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_CERTIFICATE_ISSUED,
                    "False",
                    REASON_VALIDATION_FAILED,
                    &message,
                    generation,
                );
                set_condition(
                    &mut status.conditions,
                    CONDITION_READY,
                    "False",
                    REASON_VALIDATION_FAILED,
                    &message,
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                create_event(
                    &ctx.client,
                    &request,
                    EVENT_TYPE_WARNING,
                    REASON_VALIDATION_FAILED,
                    &message,
                )
                .await?;
                return Ok(Action::await_change());
            }
            Err(err) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_CERTIFICATE_ISSUED,
                    "False",
                    REASON_CHECK_FAILED,
                    &err.to_string(),
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                return Err(err);
            }
        }
    }

    // Step 6: Assign to a gateway and attach the certificate bundle
    if !is_condition_true(&status.conditions, CONDITION_LISTENER_ATTACHED) {
        match ensure_gateway_assignment(ctx, &request, &mut status).await {
            Ok(AssignmentOutcome::Attached) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_LISTENER_ATTACHED,
                    "True",
                    REASON_ATTACHED,
                    "Certificate attached to Gateway",
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                create_event(
                    &ctx.client,
                    &request,
                    EVENT_TYPE_NORMAL,
                    "GatewayAssigned",
                    &format!("Assigned to gateway {}", status.assigned_gateway),
                )
                .await?;
            }
            Ok(AssignmentOutcome::CreateRaceLost) => {
                // The winner's gateway shows up in the next pool listing
                persist_status(&ctx.client, &request, &status).await?;
                return Ok(requeue_after(REASON_ATTACHMENT_FAILED, REQUEUE_SHORT_SECS));
            }
            Ok(AssignmentOutcome::SelectorUnsatisfiable) => {
                let message = "No gateway matching selector with available capacity";
                set_condition(
                    &mut status.conditions,
                    CONDITION_LISTENER_ATTACHED,
                    "False",
                    REASON_NO_GATEWAY_MATCHING_SELECTOR,
                    message,
                    generation,
                );
                set_condition(
                    &mut status.conditions,
                    CONDITION_READY,
                    "False",
                    REASON_NO_GATEWAY_MATCHING_SELECTOR,
                    message,
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                create_event(
                    &ctx.client,
                    &request,
                    EVENT_TYPE_WARNING,
                    REASON_NO_GATEWAY_MATCHING_SELECTOR,
                    message,
                )
                .await?;
                return Ok(Action::await_change());
            }
            Err(err) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_LISTENER_ATTACHED,
                    "False",
                    REASON_ATTACHMENT_FAILED,
                    &err.to_string(),
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                create_event(
                    &ctx.client,
                    &request,
                    EVENT_TYPE_WARNING,
                    "GatewayAssignmentFailed",
                    &format!("Failed to assign gateway: {err}"),
                )
                .await?;
                return Err(err);
            }
        }
    }

    // Step 7: Point the hostname at the ALB
    if !is_condition_true(&status.conditions, CONDITION_DNS_ALIAS_READY) {
        match ensure_alias(ctx, &request, &mut status).await {
            Ok(()) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_DNS_ALIAS_READY,
                    "True",
                    REASON_ALIAS_CREATED,
                    "Route53 alias records created",
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
            }
            Err(AliasStepError::WaitingForLoadBalancer) => {
                info!(
                    gateway = %status.assigned_gateway,
                    "Waiting for LoadBalancer to be provisioned"
                );
                set_condition(
                    &mut status.conditions,
                    CONDITION_DNS_ALIAS_READY,
                    "False",
                    REASON_WAITING_FOR_LOAD_BALANCER,
                    "Assigned gateway has no load balancer address yet",
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                return Ok(requeue_after(REASON_WAITING_FOR_LOAD_BALANCER, REQUEUE_MEDIUM_SECS));
            }
            Err(AliasStepError::UnknownRegion(err)) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_DNS_ALIAS_READY,
                    "False",
                    REASON_UNKNOWN_REGION,
                    &err.to_string(),
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                // A region missing from the catalog is an operator problem;
                // let the work queue back off while it gets fixed.
                return Err(err);
            }
            Err(AliasStepError::Other(err)) => {
                set_condition(
                    &mut status.conditions,
                    CONDITION_DNS_ALIAS_READY,
                    "False",
                    REASON_ALIAS_FAILED,
                    &err.to_string(),
                    generation,
                );
                persist_status(&ctx.client, &request, &status).await?;
                return Err(err);
            }
        }
    }

    // Step 8: Admission glue; never blocks provisioning
    if let Err(err) = ensure_admission(ctx, &request, &status).await {
        info!(error = %err, "Failed to configure route admission, continuing anyway");
    }

    // Step 9: Mark ready
    let newly_ready = !is_condition_true(&status.conditions, CONDITION_READY);
    status.observed_generation = generation;
    status.observed_spec_hash = computed_hash;
    set_condition(
        &mut status.conditions,
        CONDITION_READY,
        "True",
        REASON_READY,
        "Hostname request fully provisioned",
        generation,
    );
    persist_status(&ctx.client, &request, &status).await?;
    if newly_ready {
        create_event(
            &ctx.client,
            &request,
            EVENT_TYPE_NORMAL,
            REASON_READY,
            "Hostname fully provisioned",
        )
        .await?;
        info!(hostname = %request.spec.hostname, "Successfully reconciled HostnameRequest");
    }

    // Periodic pass keeps drift detection honest even without watch events
    Ok(Action::requeue(Duration::from_secs(REQUEUE_WHEN_READY_SECS)))
}

/// Validate the request spec against the schema rules and the allowlist.
fn validate_request(spec: &HostnameRequestSpec, config: &Config) -> Result<(), String> {
    if spec.zone_id.is_empty() {
        return Err("zoneId is required".to_string());
    }
    if spec.hostname.is_empty() {
        return Err("hostname is required".to_string());
    }
    if !HOSTNAME_RE.is_match(&spec.hostname) {
        return Err(format!("hostname {} is not a valid DNS name", spec.hostname));
    }
    if let Some(environment) = spec.environment.as_deref() {
        if !matches!(environment, "dev" | "staging" | "prod") {
            return Err(format!("environment {environment} must be dev, staging or prod"));
        }
    }
    if let Some(visibility) = spec.visibility.as_deref() {
        if !matches!(visibility, "internet-facing" | "internal") {
            return Err(format!(
                "visibility {visibility} must be internet-facing or internal"
            ));
        }
    }
    if let Some(waf_arn) = spec.waf_arn.as_deref() {
        if !WAF_ARN_RE.is_match(waf_arn) {
            return Err(format!("wafArn {waf_arn} is not a WAFv2 WebACL ARN"));
        }
    }
    if !hostname_allowed(&config.allowed_domains, &spec.hostname) {
        return Err(format!(
            "hostname {} is outside the allowed domains",
            spec.hostname
        ));
    }
    Ok(())
}

/// Outcome of the assignment step.
enum AssignmentOutcome {
    /// Assigned and the certificate bundle is synced
    Attached,
    /// Another reconcile created the next gateway first; retry shortly
    CreateRaceLost,
    /// The selector admits no gateway; terminal
    SelectorUnsatisfiable,
}

/// Assign the request to a pool gateway and sync the certificate bundle.
async fn ensure_gateway_assignment(
    ctx: &Context,
    request: &HostnameRequest,
    status: &mut HostnameRequestStatus,
) -> Result<AssignmentOutcome> {
    // A prior assignment is honored while the gateway still exists
    if !status.assigned_gateway.is_empty() {
        let api: Api<Gateway> =
            Api::namespaced(ctx.client.clone(), &status.assigned_gateway_namespace);
        match api.get_opt(&status.assigned_gateway).await? {
            Some(gw) => {
                let info = gateway_info(&gw);
                attach_to_gateway(ctx, request, status, &info).await?;
                return Ok(AssignmentOutcome::Attached);
            }
            None => {
                info!(
                    gateway = %status.assigned_gateway,
                    "Previously assigned gateway not found, reassigning"
                );
                status.assigned_gateway.clear();
                status.assigned_gateway_namespace.clear();
                status.assigned_load_balancer.clear();
            }
        }
    }

    let placement = PlacementRequest {
        gateway_class: request.spec.effective_gateway_class(),
        visibility: request.spec.effective_visibility(),
        waf_arn: request.spec.effective_waf_arn(),
        selector: request.spec.gateway_selector.as_ref(),
    };

    match ctx.pool.select(&placement).await? {
        PlacementOutcome::Assigned(info) => {
            attach_to_gateway(ctx, request, status, &info).await?;
            Ok(AssignmentOutcome::Attached)
        }
        PlacementOutcome::SelectorUnsatisfiable => Ok(AssignmentOutcome::SelectorUnsatisfiable),
        PlacementOutcome::MustCreate => {
            info!("No gateway with capacity found, creating new gateway");
            let index = ctx.pool.next_index().await?;
            match ctx
                .pool
                .create_gateway(placement.visibility, placement.waf_arn, index)
                .await?
            {
                Some(info) => {
                    attach_to_gateway(ctx, request, status, &info).await?;
                    Ok(AssignmentOutcome::Attached)
                }
                None => Ok(AssignmentOutcome::CreateRaceLost),
            }
        }
    }
}

/// Record the assignment and synthesize the gateway's certificate bundle.
async fn attach_to_gateway(
    ctx: &Context,
    request: &HostnameRequest,
    status: &mut HostnameRequestStatus,
    info: &GatewayInfo,
) -> Result<()> {
    status.assigned_gateway = info.name.clone();
    status.assigned_gateway_namespace = info.namespace.clone();

    // The bundle is derived from the live request list; our own certificate
    // is unioned in because this status update has not landed yet.
    let certificates = collect_assigned_certificates(
        &ctx.client,
        &info.name,
        &info.namespace,
        Some(status.certificate_id.as_str()).filter(|id| !id.is_empty()),
    )
    .await?;

    sync_lbconfig(
        &ctx.client,
        &info.name,
        &info.namespace,
        &certificates,
        request.spec.effective_visibility(),
        request.spec.effective_waf_arn(),
        ctx.pool.https_port(),
        ctx.pool.http_port(),
    )
    .await?;

    ctx.pool
        .update_certificate_count_hint(&info.name, certificates.len())
        .await?;

    info!(
        gateway = %info.name,
        hostname = %request.spec.hostname,
        certificates = certificates.len(),
        "Attached to gateway"
    );
    Ok(())
}

/// Alias-step failures that map to distinct conditions.
enum AliasStepError {
    WaitingForLoadBalancer,
    UnknownRegion(anyhow::Error),
    Other(anyhow::Error),
}

/// Write the A + AAAA alias records once the ALB has an address.
async fn ensure_alias(
    ctx: &Context,
    request: &HostnameRequest,
    status: &mut HostnameRequestStatus,
) -> Result<(), AliasStepError> {
    let api: Api<Gateway> = Api::namespaced(ctx.client.clone(), &status.assigned_gateway_namespace);
    let gateway = api
        .get(&status.assigned_gateway)
        .await
        .context("failed to get assigned gateway")
        .map_err(AliasStepError::Other)?;

    let alb_dns = gateway_info(&gateway).load_balancer_dns;
    if alb_dns.is_empty() {
        return Err(AliasStepError::WaitingForLoadBalancer);
    }

    status.assigned_load_balancer = alb_dns.clone();

    match ensure_alias_records(
        ctx.dns_registry.as_ref(),
        &request.spec.zone_id,
        &request.spec.hostname,
        &alb_dns,
    )
    .await
    {
        Ok(()) => Ok(()),
        Err(AliasError::UnknownRegion(err)) => Err(AliasStepError::UnknownRegion(err.into())),
        Err(AliasError::Other(err)) => Err(AliasStepError::Other(err)),
    }
}

/// Namespace label plus open listener admission.
async fn ensure_admission(
    ctx: &Context,
    request: &HostnameRequest,
    status: &HostnameRequestStatus,
) -> Result<()> {
    let namespace = request.namespace().unwrap_or_default();
    ensure_namespace_label(&ctx.client, &namespace, &status.assigned_gateway).await?;
    ensure_allowed_routes(
        &ctx.client,
        &status.assigned_gateway,
        &status.assigned_gateway_namespace,
    )
    .await
}

/// The ordered teardown pipeline, shared by finalizer deletion and
/// spec-drift reprovisioning.
///
/// When `blocking` is set (finalizer path), the certificate in-use gate and
/// gateway deletion return a requeue action instead of advancing; the
/// reprovisioning path runs everything best-effort and never yields.
///
/// Returns `Some(action)` when the caller must requeue without finishing.
async fn teardown_external_resources(
    ctx: &Context,
    request: &HostnameRequest,
    status: &HostnameRequestStatus,
    blocking: bool,
) -> Result<Option<Action>> {
    let namespace = request.namespace().unwrap_or_default();
    let uid = request.uid().unwrap_or_default();

    // 1. Alias records
    if !status.assigned_load_balancer.is_empty() {
        delete_alias_records(
            ctx.dns_registry.as_ref(),
            &request.spec.zone_id,
            &request.spec.hostname,
            &status.assigned_load_balancer,
        )
        .await;
    }

    // 2. Re-synthesize the gateway bundle without this request
    let assigned_gateway: Option<GatewayInfo> = if status.assigned_gateway.is_empty() {
        None
    } else {
        let api: Api<Gateway> =
            Api::namespaced(ctx.client.clone(), &status.assigned_gateway_namespace);
        match api.get_opt(&status.assigned_gateway).await {
            Ok(Some(gw)) => Some(gateway_info(&gw)),
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "Could not probe assigned gateway during teardown");
                None
            }
        }
    };

    if let Some(info) = &assigned_gateway {
        match collect_assigned_certificates(&ctx.client, &info.name, &info.namespace, None).await {
            Ok(certificates) => {
                // Scheme and WAF belong to the gateway, not the departing request
                if let Err(err) = sync_lbconfig(
                    &ctx.client,
                    &info.name,
                    &info.namespace,
                    &certificates,
                    &info.visibility,
                    &info.waf_arn,
                    ctx.pool.https_port(),
                    ctx.pool.http_port(),
                )
                .await
                {
                    warn!(error = %err, "Failed to shrink certificate bundle during teardown");
                } else if let Err(err) = ctx
                    .pool
                    .update_certificate_count_hint(&info.name, certificates.len())
                    .await
                {
                    warn!(error = %err, "Failed to update capacity hint during teardown");
                }
            }
            Err(err) => {
                warn!(error = %err, "Failed to collect certificate bundle during teardown");
            }
        }
    }

    // 3. Namespace access label
    if !status.assigned_gateway.is_empty() {
        if let Err(err) = remove_namespace_label_if_unused(
            &ctx.client,
            &namespace,
            &status.assigned_gateway,
            &status.assigned_gateway_namespace,
            &uid,
        )
        .await
        {
            warn!(error = %err, "Failed to clean namespace access label");
        }
    }

    // 4. Validation CNAMEs
    if !status.certificate_id.is_empty() {
        delete_validation_records(
            ctx.certificate_authority.as_ref(),
            ctx.dns_registry.as_ref(),
            &status.certificate_id,
            &request.spec.zone_id,
        )
        .await;
    }

    // 5 + 6. Certificate deletion, gated on detachment
    if !status.certificate_id.is_empty() {
        let in_use = match certificate_in_use(
            ctx.certificate_authority.as_ref(),
            &status.certificate_id,
        )
        .await
        {
            Ok(in_use) => in_use,
            Err(err) => {
                warn!(error = %err, "Could not check certificate usage");
                if blocking {
                    return Ok(Some(requeue_after(
                        REASON_WAITING_FOR_CERT_DETACHMENT,
                        REQUEUE_SHORT_SECS,
                    )));
                }
                true
            }
        };

        if in_use {
            if blocking {
                info!(
                    certificate_id = %status.certificate_id,
                    "Certificate still in use, waiting for detachment"
                );
                return Ok(Some(requeue_after(
                    REASON_WAITING_FOR_CERT_DETACHMENT,
                    REQUEUE_SHORT_SECS,
                )));
            }
            warn!(
                certificate_id = %status.certificate_id,
                "Certificate still in use, leaving it behind for reprovisioning"
            );
        } else if let Err(err) = certificate::delete_certificate(
            ctx.certificate_authority.as_ref(),
            &status.certificate_id,
        )
        .await
        {
            warn!(error = %err, "Failed to delete certificate");
            if blocking {
                return Ok(Some(requeue_after(
                    REASON_WAITING_FOR_CERT_DETACHMENT,
                    REQUEUE_SHORT_SECS,
                )));
            }
        }
    }

    // 7. Domain claim
    if let Err(err) = release_claim(&ctx.client, request).await {
        warn!(error = %err, "Failed to release domain claim");
    }

    // 8. Pool shrink: the last assignment turns off the lights
    if assigned_gateway.is_some() {
        match remaining_assignments(
            &ctx.client,
            &status.assigned_gateway,
            &status.assigned_gateway_namespace,
            &uid,
        )
        .await
        {
            Ok(0) => {
                info!(
                    gateway = %status.assigned_gateway,
                    "Last assignment gone, deleting gateway"
                );
                if let Err(err) = delete_lbconfig(
                    &ctx.client,
                    &status.assigned_gateway,
                    &status.assigned_gateway_namespace,
                )
                .await
                {
                    warn!(error = %err, "Failed to delete LoadBalancerConfiguration");
                }

                let api: Api<Gateway> =
                    Api::namespaced(ctx.client.clone(), &status.assigned_gateway_namespace);
                match api
                    .delete(&status.assigned_gateway, &DeleteParams::default())
                    .await
                {
                    Ok(_) => {
                        crate::metrics::record_resource_deleted("gateway");
                    }
                    Err(err) if is_not_found(&err) => {}
                    Err(err) => {
                        // Leaking a whole gateway is worse than a slow delete
                        error!(error = %err, "Failed to delete empty gateway");
                        if blocking {
                            return Ok(Some(requeue_after(
                                REASON_TERMINATING,
                                REQUEUE_SHORT_SECS,
                            )));
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "Could not count remaining gateway assignments");
            }
        }
    }

    Ok(None)
}

/// Finalizer-driven deletion.
async fn reconcile_delete(ctx: &Context, request: &HostnameRequest) -> Result<Action> {
    if !has_finalizer(request, FINALIZER) {
        return Ok(Action::await_change());
    }

    info!(
        hostname = %request.spec.hostname,
        "Deleting HostnameRequest"
    );

    let mut status = request.status.clone().unwrap_or_default();
    set_condition(
        &mut status.conditions,
        CONDITION_DELETING,
        "True",
        REASON_TERMINATING,
        "Teardown pipeline running",
        request.metadata.generation,
    );
    if let Err(err) = persist_status(&ctx.client, request, &status).await {
        warn!(error = %err, "Failed to persist Deleting condition");
    }

    if let Some(action) = teardown_external_resources(ctx, request, &status, true).await? {
        return Ok(action);
    }

    // 9. Clear assignment fields, persist, release the finalizer
    status.assigned_gateway.clear();
    status.assigned_gateway_namespace.clear();
    status.assigned_load_balancer.clear();
    status.certificate_id.clear();
    if let Err(err) = persist_status(&ctx.client, request, &status).await {
        warn!(error = %err, "Failed to persist final status before finalizer removal");
    }

    remove_finalizer(&ctx.client, request, FINALIZER).await?;

    info!(
        hostname = %request.spec.hostname,
        "Successfully deleted HostnameRequest"
    );
    Ok(Action::await_change())
}

#[cfg(test)]
#[path = "hostnamerequest_tests.rs"]
mod hostnamerequest_tests;
