// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status_reasons` module
//!
//! These tests pin the externally observable condition vocabulary. A change
//! here breaks consumers watching `HostnameRequest` status, so the constants
//! are asserted literally.

#[cfg(test)]
mod tests {
    use crate::status_reasons::*;

    // ============================================================================
    // Test Condition Type Constants
    // ============================================================================

    #[test]
    fn test_condition_types_are_pipeline_ordered_vocabulary() {
        assert_eq!(CONDITION_CLAIMED, "Claimed");
        assert_eq!(CONDITION_CERTIFICATE_REQUESTED, "CertificateRequested");
        assert_eq!(CONDITION_DNS_VALIDATED, "DnsValidated");
        assert_eq!(CONDITION_CERTIFICATE_ISSUED, "CertificateIssued");
        assert_eq!(CONDITION_LISTENER_ATTACHED, "ListenerAttached");
        assert_eq!(CONDITION_DNS_ALIAS_READY, "DnsAliasReady");
        assert_eq!(CONDITION_READY, "Ready");
        assert_eq!(CONDITION_DELETING, "Deleting");
        assert_eq!(
            CONDITION_RESOURCE_VALIDATION_ERROR,
            "ResourceValidationError"
        );
    }

    // ============================================================================
    // Test Transient Reason Constants
    // ============================================================================

    #[test]
    fn test_reason_pending_validation_records_constant() {
        assert_eq!(REASON_PENDING_VALIDATION_RECORDS, "PendingValidationRecords");
    }

    #[test]
    fn test_reason_pending_issuance_constant() {
        assert_eq!(REASON_PENDING_ISSUANCE, "PendingIssuance");
    }

    #[test]
    fn test_reason_waiting_for_load_balancer_constant() {
        assert_eq!(REASON_WAITING_FOR_LOAD_BALANCER, "WaitingForLoadBalancer");
    }

    #[test]
    fn test_reason_waiting_for_cert_detachment_constant() {
        assert_eq!(
            REASON_WAITING_FOR_CERT_DETACHMENT,
            "WaitingForCertDetachment"
        );
    }

    // ============================================================================
    // Test Terminal Reason Constants
    // ============================================================================

    #[test]
    fn test_reason_already_claimed_constant() {
        assert_eq!(REASON_ALREADY_CLAIMED, "AlreadyClaimed");
    }

    #[test]
    fn test_reason_validation_failed_constant() {
        assert_eq!(REASON_VALIDATION_FAILED, "ValidationFailed");
    }

    #[test]
    fn test_reason_no_gateway_matching_selector_constant() {
        assert_eq!(
            REASON_NO_GATEWAY_MATCHING_SELECTOR,
            "NoGatewayMatchingSelector"
        );
    }

    #[test]
    fn test_reason_unknown_region_constant() {
        assert_eq!(REASON_UNKNOWN_REGION, "UnknownRegion");
    }

    // ============================================================================
    // Test Drift Reason Constants
    // ============================================================================

    #[test]
    fn test_reason_drift_detected_constant() {
        assert_eq!(REASON_DRIFT_DETECTED, "DriftDetected");
    }

    #[test]
    fn test_reasons_are_camel_case() {
        // Reason tokens surface in `kubectl describe`; they must be CamelCase
        // identifiers with no whitespace.
        for reason in [
            REASON_CLAIMED,
            REASON_REQUESTED,
            REASON_RECORDS_CREATED,
            REASON_ISSUED,
            REASON_ATTACHED,
            REASON_ALIAS_CREATED,
            REASON_READY,
            REASON_TERMINATING,
            REASON_PENDING_VALIDATION_RECORDS,
            REASON_PENDING_ISSUANCE,
            REASON_WAITING_FOR_LOAD_BALANCER,
            REASON_WAITING_FOR_CERT_DETACHMENT,
            REASON_ALREADY_CLAIMED,
            REASON_VALIDATION_FAILED,
            REASON_NO_GATEWAY_MATCHING_SELECTOR,
            REASON_UNKNOWN_REGION,
            REASON_CLAIM_FAILED,
            REASON_REQUEST_FAILED,
            REASON_VALIDATION_RECORD_FAILED,
            REASON_CHECK_FAILED,
            REASON_ATTACHMENT_FAILED,
            REASON_ALIAS_FAILED,
            REASON_DRIFT_DETECTED,
        ] {
            assert!(!reason.contains(' '), "reason '{reason}' contains whitespace");
            assert!(
                reason.chars().next().is_some_and(char::is_uppercase),
                "reason '{reason}' is not CamelCase"
            );
        }
    }
}
