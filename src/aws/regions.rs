// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Static catalog mapping AWS regions to ALB canonical hosted zone IDs.
//!
//! Route53 alias records targeting an ALB must name the ALB's *canonical*
//! hosted zone, which is a well-known public constant per region. Keeping the
//! catalog compile-time avoids any ELBv2 API calls.

use thiserror::Error;

/// Errors produced by the region catalog. Pure lookups, no I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    /// The DNS name does not look like `<prefix>.<region>.elb.amazonaws.com`.
    #[error("could not extract region from ALB DNS name: {0}")]
    UnparsableDnsName(String),

    /// The region is not present in the catalog.
    #[error("unknown region: {0} (ALB hosted zone ID not found)")]
    UnknownRegion(String),
}

/// Region → ALB canonical hosted zone ID.
///
/// These are well-known, public values provided by AWS.
const ALB_HOSTED_ZONE_IDS: &[(&str, &str)] = &[
    ("us-east-1", "Z35SXDOTRQ7X7K"),
    ("us-east-2", "Z3AADJGX6KTTL2"),
    ("us-west-1", "Z368ELLRRE2KJ0"),
    ("us-west-2", "Z1H1FL5HABSF5"),
    ("ca-central-1", "ZQSVJUPU6J1EY"),
    ("eu-central-1", "Z215JYRZR1TBD5"),
    ("eu-west-1", "Z32O12XQLNTSW2"),
    ("eu-west-2", "ZHURV8PSTC4K8"),
    ("eu-west-3", "Z3Q77PNBQS71R4"),
    ("eu-north-1", "Z23TAZ6LKFMNIO"),
    ("eu-south-1", "Z3ULH7SSC9OV64"),
    ("ap-east-1", "Z3DQVH9N71FHZ0"),
    ("ap-northeast-1", "Z14GRHDCWA56QT"),
    ("ap-northeast-2", "ZWKZPGTI48KDX"),
    ("ap-northeast-3", "Z5LXEXXYW11ES"),
    ("ap-southeast-1", "Z1LMS91P8CMLE5"),
    ("ap-southeast-2", "Z1GM3OXH4ZPM65"),
    ("ap-south-1", "ZP97RAFLXTNZK"),
    ("sa-east-1", "Z2P70J7HTTTPLU"),
    ("me-south-1", "ZS929ML54UICD"),
    ("af-south-1", "Z268VQBMOI5EKX"),
];

/// Return the canonical hosted zone ID for ALBs in the given region.
///
/// # Errors
///
/// Returns [`RegionError::UnknownRegion`] for regions absent from the catalog.
pub fn alb_hosted_zone_id(region: &str) -> Result<&'static str, RegionError> {
    ALB_HOSTED_ZONE_IDS
        .iter()
        .find(|(r, _)| *r == region)
        .map(|(_, zone_id)| *zone_id)
        .ok_or_else(|| RegionError::UnknownRegion(region.to_string()))
}

/// Extract the AWS region from an ALB DNS name.
///
/// ALB DNS names follow the pattern `<name>-<id>.<region>.elb.amazonaws.com`,
/// e.g. `k8s-edge-gw01-abc123def456.us-east-1.elb.amazonaws.com`.
///
/// # Errors
///
/// Returns [`RegionError::UnparsableDnsName`] when the name does not match
/// that shape.
pub fn extract_region_from_alb_dns(alb_dns: &str) -> Result<&str, RegionError> {
    let parts: Vec<&str> = alb_dns.split('.').collect();

    // parts: [k8s-edge-gw01-abc123def456, us-east-1, elb, amazonaws, com]
    if parts.len() >= 5 && parts[parts.len() - 3] == "elb" {
        return Ok(parts[parts.len() - 4]);
    }

    Err(RegionError::UnparsableDnsName(alb_dns.to_string()))
}

/// Convenience lookup: extract the region from an ALB DNS name and return the
/// matching canonical hosted zone ID.
///
/// # Errors
///
/// Propagates [`RegionError`] from either step.
pub fn alb_hosted_zone_id_for_dns(alb_dns: &str) -> Result<&'static str, RegionError> {
    let region = extract_region_from_alb_dns(alb_dns)?;
    alb_hosted_zone_id(region)
}

#[cfg(test)]
#[path = "regions_tests.rs"]
mod regions_tests;
