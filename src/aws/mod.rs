// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! AWS capability adapters for certificate issuance and DNS.
//!
//! The reconcilers never touch AWS SDK types directly; they speak the
//! [`CertificateAuthority`] and [`DnsRegistry`] traits defined here. Swapping
//! ACM/Route53 for equivalents means writing another adapter, not changing
//! the core.
//!
//! # Modules
//!
//! - [`regions`] - Static region → ALB canonical hosted zone catalog
//! - [`acm`] - ACM-backed [`CertificateAuthority`]
//! - [`route53`] - Route53-backed [`DnsRegistry`]
//! - [`mock`] - In-memory adapters for tests

pub mod acm;
pub mod mock;
pub mod regions;
pub mod route53;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors surfaced by the external adapters.
///
/// The variants map one-to-one onto the controller's error handling bands:
/// `NotFound`/`Conflict` carry semantic meaning per call site, `Retryable`
/// requeues with backoff, `Fatal` fails the reconcile loudly.
#[derive(Error, Debug, Clone)]
pub enum AdapterError {
    /// The referenced remote resource does not exist.
    #[error("resource not found: {resource}")]
    NotFound {
        /// Identifier of the missing resource (ARN, record name, ...)
        resource: String,
    },

    /// The remote service refused the operation because the resource is
    /// referenced elsewhere (e.g. a certificate still attached to an ALB).
    #[error("resource in use: {resource}: {reason}")]
    Conflict {
        /// Identifier of the contended resource
        resource: String,
        /// Service-provided explanation
        reason: String,
    },

    /// A transient failure (throttling, timeout, 5xx); retry later.
    #[error("transient {service} failure: {reason}")]
    Retryable {
        /// Logical service name (`acm`, `route53`)
        service: String,
        /// Service-provided explanation
        reason: String,
    },

    /// A non-retryable failure (validation error, malformed input).
    #[error("{service} rejected the request: {reason}")]
    Fatal {
        /// Logical service name (`acm`, `route53`)
        service: String,
        /// Service-provided explanation
        reason: String,
    },
}

impl AdapterError {
    /// Whether this error denotes a missing remote resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdapterError::NotFound { .. })
    }

    /// Whether retrying the same call later can reasonably succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdapterError::Retryable { .. } | AdapterError::Conflict { .. }
        )
    }
}

/// Lifecycle state of a certificate as reported by the authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CertificateState {
    /// DNS validation records have not been satisfied yet
    PendingValidation,
    /// The certificate is issued and usable
    Issued,
    /// Issuance failed
    Failed,
    /// DNS validation was not completed within the authority's deadline
    ValidationTimedOut,
    /// The certificate was revoked
    Revoked,
    /// Any state outside the lifecycle this controller drives
    Other(String),
}

impl CertificateState {
    /// Map an ACM status string (`PENDING_VALIDATION`, `ISSUED`, ...) to a state.
    #[must_use]
    pub fn from_acm(status: &str) -> Self {
        match status {
            "PENDING_VALIDATION" => CertificateState::PendingValidation,
            "ISSUED" => CertificateState::Issued,
            "FAILED" => CertificateState::Failed,
            "VALIDATION_TIMED_OUT" => CertificateState::ValidationTimedOut,
            "REVOKED" => CertificateState::Revoked,
            other => CertificateState::Other(other.to_string()),
        }
    }

    /// Whether the certificate can never become usable again.
    #[must_use]
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            CertificateState::Failed
                | CertificateState::ValidationTimedOut
                | CertificateState::Revoked
        )
    }
}

/// Certificate details returned by [`CertificateAuthority::describe_certificate`].
#[derive(Clone, Debug)]
pub struct CertificateDetails {
    /// Certificate identifier (ACM ARN)
    pub id: String,
    /// Domain the certificate covers
    pub domain: String,
    /// Current lifecycle state
    pub state: CertificateState,
    /// ARNs of load balancers still referencing the certificate
    pub in_use_by: Vec<String>,
}

/// A DNS record the authority requires for certificate validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationRecord {
    /// Record name (e.g. `_abc123.api.example.com`)
    pub name: String,
    /// Record type; always `CNAME` for DNS validation
    pub record_type: String,
    /// Record value provided by the authority
    pub value: String,
}

/// Alias target for A/AAAA records pointing at a load balancer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasTarget {
    /// DNS name of the target load balancer
    pub dns_name: String,
    /// Canonical hosted zone of the load balancer (per region)
    pub hosted_zone_id: String,
    /// Whether the registry should health-check the target
    pub evaluate_target_health: bool,
}

/// A DNS record in a hosted zone.
///
/// Either a plain value record (`CNAME` with `value` + `ttl`) or an alias
/// record (`A`/`AAAA` with `alias_target`, no TTL).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DnsRecord {
    /// Fully-qualified record name
    pub name: String,
    /// Record type: `A`, `AAAA`, or `CNAME`
    pub record_type: String,
    /// Record value for plain records; empty for alias records
    pub value: String,
    /// TTL for plain records; ignored for alias records
    pub ttl: i64,
    /// Alias target for A/AAAA records pointing at a load balancer
    pub alias_target: Option<AliasTarget>,
}

/// Capability contract over the certificate authority (ACM).
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// Request a DNS-validated certificate for `domain`.
    ///
    /// Not idempotent on its own: the caller must store the returned
    /// identifier in status before calling again.
    async fn request_certificate(
        &self,
        domain: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<String, AdapterError>;

    /// Fetch current state and usage of a certificate.
    async fn describe_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<CertificateDetails, AdapterError>;

    /// Fetch the DNS records required to validate a certificate.
    ///
    /// May be empty transiently just after [`Self::request_certificate`].
    async fn validation_records(
        &self,
        certificate_id: &str,
    ) -> Result<Vec<ValidationRecord>, AdapterError>;

    /// Delete a certificate. Fails with [`AdapterError::Conflict`] while the
    /// authority still considers it attached.
    async fn delete_certificate(&self, certificate_id: &str) -> Result<(), AdapterError>;
}

/// Capability contract over the DNS registry (Route53).
#[async_trait]
pub trait DnsRegistry: Send + Sync {
    /// Create or replace a record; atomic on `(name, type)`.
    async fn upsert_record(&self, zone_id: &str, record: &DnsRecord) -> Result<(), AdapterError>;

    /// Delete a record. Deleting a record that does not exist is success.
    async fn delete_record(&self, zone_id: &str, record: &DnsRecord) -> Result<(), AdapterError>;

    /// Look up a record by name and type.
    async fn get_record(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Option<DnsRecord>, AdapterError>;
}
