// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for request validation and requeue plumbing.

use super::*;

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

#[test]
fn test_validate_accepts_plain_hostname() {
    assert!(validate_request(&spec("api.example.com"), &Config::default()).is_ok());
}

#[test]
fn test_validate_accepts_wildcard_hostname() {
    assert!(validate_request(&spec("*.example.com"), &Config::default()).is_ok());
}

#[test]
fn test_validate_accepts_hyphenated_labels() {
    assert!(validate_request(&spec("my-api.eu-west.example.com"), &Config::default()).is_ok());
}

#[test]
fn test_validate_rejects_missing_zone() {
    let mut bad = spec("api.example.com");
    bad.zone_id = String::new();
    let err = validate_request(&bad, &Config::default()).unwrap_err();
    assert!(err.contains("zoneId"));
}

#[test]
fn test_validate_rejects_malformed_hostnames() {
    for hostname in [
        "",
        "no-dots",
        "UPPER.example.com",
        "under_score.example.com",
        "trailing-.example.com",
        "api.example.c",
        "api..example.com",
        "*.*.example.com",
    ] {
        assert!(
            validate_request(&spec(hostname), &Config::default()).is_err(),
            "hostname {hostname:?} should be rejected"
        );
    }
}

#[test]
fn test_validate_rejects_unknown_environment() {
    let mut bad = spec("api.example.com");
    bad.environment = Some("qa".to_string());
    assert!(validate_request(&bad, &Config::default()).is_err());

    bad.environment = Some("staging".to_string());
    assert!(validate_request(&bad, &Config::default()).is_ok());
}

#[test]
fn test_validate_rejects_unknown_visibility() {
    let mut bad = spec("api.example.com");
    bad.visibility = Some("public".to_string());
    assert!(validate_request(&bad, &Config::default()).is_err());

    bad.visibility = Some("internal".to_string());
    assert!(validate_request(&bad, &Config::default()).is_ok());
}

#[test]
fn test_validate_rejects_malformed_waf_arn() {
    let mut bad = spec("api.example.com");
    bad.waf_arn = Some("arn:aws:iam::123:role/x".to_string());
    assert!(validate_request(&bad, &Config::default()).is_err());

    bad.waf_arn =
        Some("arn:aws:wafv2:us-east-1:123456789012:regional/webacl/name/id".to_string());
    assert!(validate_request(&bad, &Config::default()).is_ok());
}

#[test]
fn test_validate_enforces_domain_allowlist() {
    let config = Config {
        allowed_domains: vec!["example.com".to_string()],
        ..Config::default()
    };

    assert!(validate_request(&spec("api.example.com"), &config).is_ok());
    let err = validate_request(&spec("api.other.org"), &config).unwrap_err();
    assert!(err.contains("allowed domains"));
}

#[test]
fn test_requeue_after_returns_requested_delay() {
    let action = requeue_after(REASON_PENDING_ISSUANCE, REQUEUE_MEDIUM_SECS);
    assert_eq!(
        action,
        Action::requeue(Duration::from_secs(REQUEUE_MEDIUM_SECS))
    );
}
