// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the DNS alias writer.

use super::*;
use crate::aws::mock::MockDnsRegistry;

const ALB_DNS: &str = "k8s-edge-gw01-abc123.us-east-1.elb.amazonaws.com";

#[tokio::test]
async fn test_ensure_alias_records_creates_a_and_aaaa() {
    let registry = MockDnsRegistry::new();

    ensure_alias_records(&registry, "Z1", "api.example.com", ALB_DNS)
        .await
        .unwrap();

    assert!(registry.has_record("Z1", "api.example.com", "A"));
    assert!(registry.has_record("Z1", "api.example.com", "AAAA"));
    assert_eq!(registry.record_count(), 2);
}

#[tokio::test]
async fn test_alias_records_carry_canonical_hosted_zone() {
    let registry = MockDnsRegistry::new();

    ensure_alias_records(&registry, "Z1", "api.example.com", ALB_DNS)
        .await
        .unwrap();

    for record in registry.all_records() {
        let alias = record.alias_target.expect("alias target set");
        assert_eq!(alias.dns_name, ALB_DNS);
        assert_eq!(alias.hosted_zone_id, "Z35SXDOTRQ7X7K");
        assert!(alias.evaluate_target_health);
        assert_eq!(record.ttl, 0, "alias records carry no TTL");
    }
}

#[tokio::test]
async fn test_ensure_alias_records_unknown_region() {
    let registry = MockDnsRegistry::new();

    let err = ensure_alias_records(
        &registry,
        "Z1",
        "api.example.com",
        "lb-123.xx-fake-9.elb.amazonaws.com",
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AliasError::UnknownRegion(_)));
    assert_eq!(registry.record_count(), 0);
}

#[tokio::test]
async fn test_delete_alias_records_removes_both() {
    let registry = MockDnsRegistry::new();
    ensure_alias_records(&registry, "Z1", "api.example.com", ALB_DNS)
        .await
        .unwrap();

    delete_alias_records(&registry, "Z1", "api.example.com", ALB_DNS).await;

    assert_eq!(registry.record_count(), 0);
}

#[tokio::test]
async fn test_delete_alias_records_tolerates_absent_records() {
    let registry = MockDnsRegistry::new();
    // Nothing to delete: must not panic or error
    delete_alias_records(&registry, "Z1", "api.example.com", ALB_DNS).await;
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let registry = MockDnsRegistry::new();

    ensure_alias_records(&registry, "Z1", "api.example.com", ALB_DNS)
        .await
        .unwrap();
    ensure_alias_records(&registry, "Z1", "api.example.com", ALB_DNS)
        .await
        .unwrap();

    assert_eq!(registry.record_count(), 2);
}
