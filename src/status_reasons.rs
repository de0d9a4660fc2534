// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition types and reasons for Alby resources.
//!
//! This module defines constants for condition types and reasons following
//! Kubernetes conventions. Reasons are programmatic identifiers in CamelCase
//! that explain why a condition has a particular status; together they form
//! the externally observable contract of the controller.
//!
//! # Condition Types
//!
//! A `HostnameRequest` carries one condition per provisioning step, flipped to
//! `True` in pipeline order, plus the encompassing `Ready` condition:
//!
//! ```yaml
//! status:
//!   conditions:
//!     - type: Claimed
//!       status: "True"
//!       reason: Claimed
//!     - type: CertificateRequested
//!       status: "True"
//!       reason: Requested
//!     - type: CertificateIssued
//!       status: "False"
//!       reason: PendingIssuance
//!       message: "Waiting for ACM to issue certificate"
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// The domain claim is held by this request
pub const CONDITION_CLAIMED: &str = "Claimed";

/// An ACM certificate has been requested
pub const CONDITION_CERTIFICATE_REQUESTED: &str = "CertificateRequested";

/// ACM DNS validation records exist in the hosted zone
pub const CONDITION_DNS_VALIDATED: &str = "DnsValidated";

/// The ACM certificate has been issued
pub const CONDITION_CERTIFICATE_ISSUED: &str = "CertificateIssued";

/// The certificate is attached to a gateway listener via its `LoadBalancerConfiguration`
pub const CONDITION_LISTENER_ATTACHED: &str = "ListenerAttached";

/// A + AAAA alias records point the hostname at the assigned ALB
pub const CONDITION_DNS_ALIAS_READY: &str = "DnsAliasReady";

/// All provisioning steps completed
pub const CONDITION_READY: &str = "Ready";

/// The request is being torn down under its finalizer
pub const CONDITION_DELETING: &str = "Deleting";

/// The spec failed validation
pub const CONDITION_RESOURCE_VALIDATION_ERROR: &str = "ResourceValidationError";

// ============================================================================
// Success Reasons
// ============================================================================

/// Domain successfully claimed
pub const REASON_CLAIMED: &str = "Claimed";

/// Certificate requested from ACM
pub const REASON_REQUESTED: &str = "Requested";

/// DNS validation records created in the hosted zone
pub const REASON_RECORDS_CREATED: &str = "RecordsCreated";

/// Certificate issued by ACM
pub const REASON_ISSUED: &str = "Issued";

/// Certificate attached to the assigned gateway
pub const REASON_ATTACHED: &str = "Attached";

/// Alias records created in the hosted zone
pub const REASON_ALIAS_CREATED: &str = "Created";

/// All provisioning steps completed
pub const REASON_READY: &str = "Ready";

/// Teardown pipeline is running
pub const REASON_TERMINATING: &str = "Terminating";

// ============================================================================
// Transient Reasons (condition False, requeued)
// ============================================================================

/// ACM has not yet published validation records for the certificate
pub const REASON_PENDING_VALIDATION_RECORDS: &str = "PendingValidationRecords";

/// ACM has not yet issued the certificate
pub const REASON_PENDING_ISSUANCE: &str = "PendingIssuance";

/// The assigned gateway has no load balancer address yet
pub const REASON_WAITING_FOR_LOAD_BALANCER: &str = "WaitingForLoadBalancer";

/// ACM still reports the certificate as in use by a load balancer
pub const REASON_WAITING_FOR_CERT_DETACHMENT: &str = "WaitingForCertDetachment";

// ============================================================================
// Terminal Reasons (condition False, not requeued)
// ============================================================================

/// Hostname already claimed by another request
pub const REASON_ALREADY_CLAIMED: &str = "AlreadyClaimed";

/// The certificate entered a failed state (`FAILED`, `VALIDATION_TIMED_OUT`, `REVOKED`)
pub const REASON_VALIDATION_FAILED: &str = "ValidationFailed";

/// No pool gateway matches the request's `gatewaySelector`
pub const REASON_NO_GATEWAY_MATCHING_SELECTOR: &str = "NoGatewayMatchingSelector";

/// The ALB DNS name names a region absent from the hosted zone catalog
pub const REASON_UNKNOWN_REGION: &str = "UnknownRegion";

// ============================================================================
// Failure Reasons (condition False, reconcile errored)
// ============================================================================

/// The domain claim could not be read or created
pub const REASON_CLAIM_FAILED: &str = "ClaimFailed";

/// The ACM certificate request failed
pub const REASON_REQUEST_FAILED: &str = "RequestFailed";

/// Creating validation records in the hosted zone failed
pub const REASON_VALIDATION_RECORD_FAILED: &str = "ValidationRecordFailed";

/// Describing the certificate failed
pub const REASON_CHECK_FAILED: &str = "CheckFailed";

/// Gateway assignment or listener attachment failed
pub const REASON_ATTACHMENT_FAILED: &str = "AttachmentFailed";

/// Alias record creation failed
pub const REASON_ALIAS_FAILED: &str = "AliasFailed";

// ============================================================================
// Drift Reasons
// ============================================================================

/// An assigned external resource disappeared or failed
pub const REASON_DRIFT_DETECTED: &str = "DriftDetected";

#[cfg(test)]
#[path = "status_reasons_tests.rs"]
mod status_reasons_tests;
