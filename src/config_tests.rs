// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for configuration parsing and the domain allowlist.

use super::*;

#[test]
fn test_default_config_matches_constants() {
    let config = Config::default();

    assert_eq!(config.gateway_namespace, "edge");
    assert_eq!(config.gateway_class, "aws-alb");
    assert_eq!(config.http_port, 80);
    assert_eq!(config.https_port, 443);
    assert!(config.allowed_domains.is_empty());
}

#[test]
fn test_parse_domain_list_trims_and_drops_empties() {
    let domains = parse_domain_list(" example.com, .example.org ,, corp.internal ");

    assert_eq!(
        domains,
        vec![
            "example.com".to_string(),
            "example.org".to_string(),
            "corp.internal".to_string()
        ]
    );
}

#[test]
fn test_parse_domain_list_lowercases() {
    assert_eq!(parse_domain_list("Example.COM"), vec!["example.com"]);
}

#[test]
fn test_empty_allowlist_allows_everything() {
    assert!(hostname_allowed(&[], "api.example.com"));
    assert!(hostname_allowed(&[], "anything.at.all"));
}

#[test]
fn test_allowlist_matches_apex_and_subdomains() {
    let allowed = vec!["example.com".to_string()];

    assert!(hostname_allowed(&allowed, "example.com"));
    assert!(hostname_allowed(&allowed, "api.example.com"));
    assert!(hostname_allowed(&allowed, "deep.api.example.com"));
}

#[test]
fn test_allowlist_rejects_suffix_collisions() {
    // "notexample.com" ends with "example.com" as a string but is a
    // different registrable domain; it must be rejected.
    let allowed = vec!["example.com".to_string()];

    assert!(!hostname_allowed(&allowed, "notexample.com"));
    assert!(!hostname_allowed(&allowed, "example.com.evil.org"));
}

#[test]
fn test_allowlist_handles_wildcard_hostnames() {
    let allowed = vec!["example.com".to_string()];

    assert!(hostname_allowed(&allowed, "*.example.com"));
    assert!(!hostname_allowed(&allowed, "*.other.org"));
}

#[test]
fn test_allowlist_multiple_apexes() {
    let allowed = vec!["example.com".to_string(), "corp.internal".to_string()];

    assert!(hostname_allowed(&allowed, "web.corp.internal"));
    assert!(hostname_allowed(&allowed, "web.example.com"));
    assert!(!hostname_allowed(&allowed, "web.other.io"));
}
