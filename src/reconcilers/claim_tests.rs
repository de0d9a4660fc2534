// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for domain claim naming and ownership judgment.

use super::*;
use kube::api::ObjectMeta;

fn request(namespace: &str, name: &str, uid: &str) -> HostnameRequest {
    let mut ghr = HostnameRequest::new(
        name,
        crate::crd::HostnameRequestSpec {
            zone_id: "Z1".to_string(),
            hostname: "api.example.com".to_string(),
            environment: None,
            visibility: None,
            gateway_class: None,
            gateway_selector: None,
            waf_arn: None,
        },
    );
    ghr.metadata = ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        uid: Some(uid.to_string()),
        ..Default::default()
    };
    ghr
}

fn claim_for(namespace: &str, name: &str, uid: &str) -> DomainClaim {
    DomainClaim {
        metadata: ObjectMeta {
            name: Some("z1-api.example.com".to_string()),
            ..Default::default()
        },
        spec: DomainClaimSpec {
            zone_id: "Z1".to_string(),
            hostname: "api.example.com".to_string(),
            owner_ref: DomainClaimOwnerRef {
                namespace: namespace.to_string(),
                name: name.to_string(),
                uid: uid.to_string(),
            },
        },
        status: None,
    }
}

#[test]
fn test_claim_name_lowercases_zone_and_hostname() {
    assert_eq!(claim_name("Z1", "API.Example.COM"), "z1-api.example.com");
}

#[test]
fn test_claim_name_sanitizes_wildcards() {
    assert_eq!(
        claim_name("Z1", "*.example.com"),
        "z1-wildcard.example.com"
    );
}

#[test]
fn test_claim_name_is_deterministic() {
    assert_eq!(
        claim_name("Z2", "api.example.com"),
        claim_name("Z2", "api.example.com")
    );
    // Different zones must never collide for the same hostname
    assert_ne!(
        claim_name("Z1", "api.example.com"),
        claim_name("Z2", "api.example.com")
    );
}

#[test]
fn test_ownership_matches_same_request() {
    let ghr = request("team-a", "api", "uid-1");
    let claim = claim_for("team-a", "api", "uid-1");
    assert_eq!(ownership(&claim, &ghr, "uid-1"), ClaimOutcome::Owned);
}

#[test]
fn test_ownership_rejects_different_uid() {
    // Same namespace/name but a recreated request (new uid) must not inherit
    // the old claim.
    let ghr = request("team-a", "api", "uid-2");
    let claim = claim_for("team-a", "api", "uid-1");
    assert_eq!(ownership(&claim, &ghr, "uid-2"), ClaimOutcome::Conflict);
}

#[test]
fn test_ownership_rejects_different_namespace() {
    let ghr = request("team-b", "api", "uid-1");
    let claim = claim_for("team-a", "api", "uid-1");
    assert_eq!(ownership(&claim, &ghr, "uid-1"), ClaimOutcome::Conflict);
}
