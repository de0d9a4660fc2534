// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate lifecycle: request, DNS validation, issuance polling, teardown.
//!
//! Every step is re-entrant: the certificate identifier is persisted in
//! status before anything else depends on it, so a reconcile can resume from
//! any interruption by describing the stored certificate.

use crate::aws::{
    AdapterError, CertificateAuthority, CertificateState, DnsRegistry, DnsRecord,
};
use crate::constants::VALIDATION_RECORD_TTL_SECS;
use crate::labels::{TAG_ENVIRONMENT, TAG_HOSTNAME, TAG_MANAGED_BY, TAG_NAMESPACE};
use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Outcome of one issuance poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssuancePoll {
    /// The certificate is issued and usable
    Issued,
    /// Validation has not completed; poll again later
    Pending,
    /// The certificate can never become usable (failed, timed out, revoked)
    FailedTerminally(String),
}

/// Signals from the validation-record step that the engine maps to requeues.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The authority has not published validation records yet; retry shortly.
    #[error("certificate authority has not published validation records yet")]
    RecordsNotReady,

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Request a DNS-validated certificate for the hostname.
///
/// The caller must persist the returned identifier in status before doing
/// anything else with it; a crash between request and persist is recovered by
/// the next reconcile requesting again (the orphan expires unvalidated).
///
/// # Errors
///
/// Returns an error when the authority rejects the request.
pub async fn request_certificate(
    authority: &dyn CertificateAuthority,
    hostname: &str,
    namespace: &str,
    environment: Option<&str>,
) -> Result<String> {
    let mut tags = BTreeMap::new();
    tags.insert(TAG_MANAGED_BY.to_string(), crate::labels::MANAGED_BY_ALBY.to_string());
    tags.insert(TAG_HOSTNAME.to_string(), hostname.to_string());
    tags.insert(TAG_NAMESPACE.to_string(), namespace.to_string());
    if let Some(environment) = environment {
        tags.insert(TAG_ENVIRONMENT.to_string(), environment.to_string());
    }

    let certificate_id = authority
        .request_certificate(hostname, &tags)
        .await
        .context("failed to request certificate")?;

    info!(hostname, %certificate_id, "Requested certificate");
    crate::metrics::record_resource_created("certificate");
    Ok(certificate_id)
}

/// Ensure the authority's DNS validation records exist in the hosted zone.
///
/// # Errors
///
/// Returns [`ValidationError::RecordsNotReady`] while the authority has not
/// published any records (they appear moments after the request); the engine
/// requeues shortly. Other failures bubble as [`ValidationError::Other`].
pub async fn ensure_validation_records(
    authority: &dyn CertificateAuthority,
    registry: &dyn DnsRegistry,
    certificate_id: &str,
    zone_id: &str,
) -> Result<(), ValidationError> {
    let records = authority
        .validation_records(certificate_id)
        .await
        .context("failed to fetch validation records")?;

    if records.is_empty() {
        return Err(ValidationError::RecordsNotReady);
    }

    for record in &records {
        let dns_record = DnsRecord {
            name: record.name.clone(),
            record_type: record.record_type.clone(),
            value: record.value.clone(),
            ttl: VALIDATION_RECORD_TTL_SECS,
            alias_target: None,
        };

        registry
            .upsert_record(zone_id, &dns_record)
            .await
            .with_context(|| format!("failed to upsert validation record {}", record.name))?;

        debug!(
            name = %record.name,
            zone_id, "Upserted certificate validation record"
        );
        crate::metrics::record_resource_created("validation_record");
    }

    info!(
        certificate_id,
        count = records.len(),
        "All validation records in place"
    );
    Ok(())
}

/// Poll the authority for issuance progress.
///
/// # Errors
///
/// Returns an error when the describe call itself fails.
pub async fn poll_issuance(
    authority: &dyn CertificateAuthority,
    certificate_id: &str,
) -> Result<IssuancePoll> {
    let details = authority
        .describe_certificate(certificate_id)
        .await
        .context("failed to describe certificate")?;

    Ok(match details.state {
        CertificateState::Issued => IssuancePoll::Issued,
        CertificateState::PendingValidation => IssuancePoll::Pending,
        state if state.is_terminal_failure() => {
            IssuancePoll::FailedTerminally(format!("certificate in failed state: {state:?}"))
        }
        // Unfamiliar states poll again rather than guessing
        _ => IssuancePoll::Pending,
    })
}

/// Delete the authority's validation CNAMEs from the hosted zone. Best-effort:
/// individual failures are logged, never propagated.
pub async fn delete_validation_records(
    authority: &dyn CertificateAuthority,
    registry: &dyn DnsRegistry,
    certificate_id: &str,
    zone_id: &str,
) {
    let records = match authority.validation_records(certificate_id).await {
        Ok(records) => records,
        Err(err) => {
            warn!(
                certificate_id,
                error = %err,
                "Could not fetch validation records for cleanup"
            );
            return;
        }
    };

    for record in records {
        let dns_record = DnsRecord {
            name: record.name.clone(),
            record_type: record.record_type,
            value: record.value,
            ttl: VALIDATION_RECORD_TTL_SECS,
            alias_target: None,
        };

        match registry.delete_record(zone_id, &dns_record).await {
            Ok(()) => {
                crate::metrics::record_resource_deleted("validation_record");
            }
            Err(err) => {
                warn!(name = %record.name, error = %err, "Failed to delete validation record");
            }
        }
    }
}

/// Whether the authority still reports the certificate as attached somewhere.
///
/// A missing certificate reads as not-in-use: the goal of the caller is
/// deletion, and there is nothing left to delete.
///
/// # Errors
///
/// Returns an error when the describe call fails for reasons other than
/// not-found.
pub async fn certificate_in_use(
    authority: &dyn CertificateAuthority,
    certificate_id: &str,
) -> Result<bool> {
    match authority.describe_certificate(certificate_id).await {
        Ok(details) => Ok(!details.in_use_by.is_empty()),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err).context("failed to check certificate usage"),
    }
}

/// Delete the certificate. Not-found is success; an in-use conflict is
/// surfaced so the caller can requeue and give the LBC time to detach.
///
/// # Errors
///
/// Returns the conflict or any other adapter failure.
pub async fn delete_certificate(
    authority: &dyn CertificateAuthority,
    certificate_id: &str,
) -> Result<(), AdapterError> {
    match authority.delete_certificate(certificate_id).await {
        Ok(()) => {
            info!(certificate_id, "Deleted certificate");
            crate::metrics::record_resource_deleted("certificate");
            Ok(())
        }
        Err(err) if err.is_not_found() => Ok(()),
        Err(err) => Err(err),
    }
}

/// Certificate is unusable when the spec can never converge on it again.
///
/// Used by drift detection to decide whether a stored certificate must be
/// discarded and re-requested.
#[must_use]
pub fn certificate_unusable(state: &CertificateState) -> bool {
    matches!(
        state,
        CertificateState::Failed | CertificateState::Revoked
    )
}

/// Detect a missing-or-unusable certificate, for drift probes.
///
/// # Errors
///
/// Returns an error when the describe call fails transiently.
pub async fn probe_certificate_drift(
    authority: &dyn CertificateAuthority,
    certificate_id: &str,
) -> Result<bool> {
    match authority.describe_certificate(certificate_id).await {
        Ok(details) => Ok(certificate_unusable(&details.state)),
        Err(err) if err.is_not_found() => Ok(true),
        Err(err) => Err(err).context("failed to probe certificate"),
    }
}

#[cfg(test)]
#[path = "certificate_tests.rs"]
mod certificate_tests;
