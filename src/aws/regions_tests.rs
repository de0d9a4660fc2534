// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the region catalog.

use super::*;

#[test]
fn test_alb_hosted_zone_id_known_regions() {
    assert_eq!(alb_hosted_zone_id("us-east-1").unwrap(), "Z35SXDOTRQ7X7K");
    assert_eq!(alb_hosted_zone_id("eu-west-1").unwrap(), "Z32O12XQLNTSW2");
    assert_eq!(alb_hosted_zone_id("ap-south-1").unwrap(), "ZP97RAFLXTNZK");
}

#[test]
fn test_alb_hosted_zone_id_unknown_region() {
    let err = alb_hosted_zone_id("mars-north-1").unwrap_err();
    assert_eq!(err, RegionError::UnknownRegion("mars-north-1".to_string()));
}

#[test]
fn test_extract_region_from_standard_alb_dns() {
    let region =
        extract_region_from_alb_dns("k8s-edge-gw01-abc123def456.us-east-1.elb.amazonaws.com")
            .unwrap();
    assert_eq!(region, "us-east-1");
}

#[test]
fn test_extract_region_from_internal_alb_dns() {
    let region =
        extract_region_from_alb_dns("internal-k8s-edge-gw02-0a1b2c.eu-central-1.elb.amazonaws.com")
            .unwrap();
    assert_eq!(region, "eu-central-1");
}

#[test]
fn test_extract_region_rejects_short_names() {
    assert!(matches!(
        extract_region_from_alb_dns("example.com"),
        Err(RegionError::UnparsableDnsName(_))
    ));
}

#[test]
fn test_extract_region_rejects_non_elb_names() {
    assert!(matches!(
        extract_region_from_alb_dns("foo.us-east-1.s3.amazonaws.com"),
        Err(RegionError::UnparsableDnsName(_))
    ));
}

#[test]
fn test_hosted_zone_id_for_dns_round_trip() {
    let zone_id =
        alb_hosted_zone_id_for_dns("k8s-edge-gw01-abc.us-west-2.elb.amazonaws.com").unwrap();
    assert_eq!(zone_id, "Z1H1FL5HABSF5");
}

#[test]
fn test_hosted_zone_id_for_dns_unknown_region() {
    let err = alb_hosted_zone_id_for_dns("lb-123.xx-fake-9.elb.amazonaws.com").unwrap_err();
    assert_eq!(err, RegionError::UnknownRegion("xx-fake-9".to_string()));
}

#[test]
fn test_catalog_has_no_duplicate_regions() {
    let mut regions: Vec<&str> = Vec::new();
    for region in [
        "us-east-1",
        "us-east-2",
        "us-west-1",
        "us-west-2",
        "eu-west-1",
    ] {
        assert!(!regions.contains(&region));
        regions.push(region);
        assert!(alb_hosted_zone_id(region).is_ok());
    }
}
