// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for spec hashing and drift invalidation.

use super::*;
use crate::crd::Condition;
use crate::reconcilers::status::{find_condition, set_condition};

fn spec(hostname: &str) -> HostnameRequestSpec {
    HostnameRequestSpec {
        zone_id: "Z1".to_string(),
        hostname: hostname.to_string(),
        environment: None,
        visibility: None,
        gateway_class: None,
        gateway_selector: None,
        waf_arn: None,
    }
}

fn full_conditions() -> Vec<Condition> {
    let mut conditions = Vec::new();
    for condition_type in [
        "Claimed",
        "CertificateRequested",
        "DnsValidated",
        "CertificateIssued",
        "ListenerAttached",
        "DnsAliasReady",
        "Ready",
    ] {
        set_condition(&mut conditions, condition_type, "True", "ok", "ok", Some(1));
    }
    conditions
}

#[test]
fn test_spec_hash_is_stable() {
    assert_eq!(
        compute_spec_hash(&spec("api.example.com")),
        compute_spec_hash(&spec("api.example.com"))
    );
}

#[test]
fn test_spec_hash_is_16_hex_chars() {
    let hash = compute_spec_hash(&spec("api.example.com"));
    assert_eq!(hash.len(), 16, "first 8 bytes hex-encoded");
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_spec_hash_changes_with_hostname() {
    assert_ne!(
        compute_spec_hash(&spec("api.example.com")),
        compute_spec_hash(&spec("web.example.com"))
    );
}

#[test]
fn test_spec_hash_treats_explicit_defaults_as_unchanged() {
    // Making the default visibility/class explicit must not trigger
    // reprovisioning.
    let implicit = spec("api.example.com");
    let mut explicit = spec("api.example.com");
    explicit.visibility = Some("internet-facing".to_string());
    explicit.gateway_class = Some("aws-alb".to_string());

    assert_eq!(compute_spec_hash(&implicit), compute_spec_hash(&explicit));
}

#[test]
fn test_spec_hash_changes_with_visibility() {
    let mut internal = spec("api.example.com");
    internal.visibility = Some("internal".to_string());

    assert_ne!(
        compute_spec_hash(&spec("api.example.com")),
        compute_spec_hash(&internal)
    );
}

#[test]
fn test_spec_hash_ignores_environment_and_waf() {
    // Environment is informational and WAF moves gateways, not certificates
    // or DNS; neither participates in the reprovisioning hash.
    let mut tagged = spec("api.example.com");
    tagged.environment = Some("prod".to_string());
    tagged.waf_arn = Some("arn:aws:wafv2:us-east-1:123456789012:regional/webacl/x".to_string());

    assert_eq!(
        compute_spec_hash(&spec("api.example.com")),
        compute_spec_hash(&tagged)
    );
}

#[test]
fn test_spec_drifted_gating() {
    let computed = compute_spec_hash(&spec("api.example.com"));

    // Never-provisioned request has no observed hash: not drift
    assert!(!spec_drifted("", &computed));
    assert!(!spec_drifted(&computed, &computed));
    assert!(spec_drifted("0123456789abcdef", &computed));
}

#[test]
fn test_gateway_missing_invalidates_attachment_chain() {
    let mut status = HostnameRequestStatus {
        assigned_gateway: "gw-01".to_string(),
        assigned_gateway_namespace: "edge".to_string(),
        assigned_load_balancer: "lb.us-east-1.elb.amazonaws.com".to_string(),
        certificate_id: "arn:a".to_string(),
        conditions: full_conditions(),
        ..Default::default()
    };

    apply_drift_observations(
        &mut status,
        &[DriftObservation::GatewayMissing {
            gateway: "gw-01".to_string(),
        }],
    );

    assert!(find_condition(&status.conditions, "ListenerAttached").is_none());
    assert!(find_condition(&status.conditions, "DnsAliasReady").is_none());
    assert!(find_condition(&status.conditions, "Ready").is_none());
    // Certificate progress survives a gateway loss
    assert!(find_condition(&status.conditions, "CertificateIssued").is_some());
    assert_eq!(status.certificate_id, "arn:a");
    // Assignment fields are cleared for re-selection
    assert!(status.assigned_gateway.is_empty());
    assert!(status.assigned_load_balancer.is_empty());
}

#[test]
fn test_lbconfig_missing_keeps_assignment() {
    let mut status = HostnameRequestStatus {
        assigned_gateway: "gw-01".to_string(),
        assigned_gateway_namespace: "edge".to_string(),
        conditions: full_conditions(),
        ..Default::default()
    };

    apply_drift_observations(
        &mut status,
        &[DriftObservation::LbConfigMissing {
            config: "gw-01-config".to_string(),
        }],
    );

    assert!(find_condition(&status.conditions, "ListenerAttached").is_none());
    // The gateway itself is still there; the next pass re-synthesizes the
    // configuration for the same assignment.
    assert_eq!(status.assigned_gateway, "gw-01");
}

#[test]
fn test_certificate_unusable_invalidates_certificate_chain() {
    let mut status = HostnameRequestStatus {
        certificate_id: "arn:a".to_string(),
        assigned_gateway: "gw-01".to_string(),
        conditions: full_conditions(),
        ..Default::default()
    };

    apply_drift_observations(
        &mut status,
        &[DriftObservation::CertificateUnusable {
            certificate_id: "arn:a".to_string(),
        }],
    );

    assert!(find_condition(&status.conditions, "CertificateIssued").is_none());
    assert!(find_condition(&status.conditions, "DnsValidated").is_none());
    assert!(find_condition(&status.conditions, "ListenerAttached").is_none());
    assert!(find_condition(&status.conditions, "Ready").is_none());
    // The claim survives; the hostname is still ours
    assert!(find_condition(&status.conditions, "Claimed").is_some());
    assert!(status.certificate_id.is_empty());
    // Gateway assignment survives a certificate loss
    assert_eq!(status.assigned_gateway, "gw-01");
}
