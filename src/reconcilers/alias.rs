// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS alias writer: points the hostname at the assigned ALB.
//!
//! Alias records are written as an A + AAAA pair targeting the load
//! balancer's DNS name and its region's canonical hosted zone. Both are
//! deleted together on teardown.

use crate::aws::regions::{alb_hosted_zone_id_for_dns, RegionError};
use crate::aws::{AliasTarget, DnsRecord, DnsRegistry};
use anyhow::Context as _;
use tracing::{info, warn};

/// Record types written for every alias pair.
pub const ALIAS_RECORD_TYPES: [&str; 2] = ["A", "AAAA"];

/// Failures from the alias writer the engine maps to distinct conditions.
#[derive(Debug, thiserror::Error)]
pub enum AliasError {
    /// The ALB DNS name names a region missing from the catalog.
    #[error(transparent)]
    UnknownRegion(#[from] RegionError),

    /// Registry failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Upsert A and AAAA alias records for `hostname` targeting `alb_dns`.
///
/// # Errors
///
/// Returns [`AliasError::UnknownRegion`] when the ALB's region is not in the
/// catalog, [`AliasError::Other`] on registry failures.
pub async fn ensure_alias_records(
    registry: &dyn DnsRegistry,
    zone_id: &str,
    hostname: &str,
    alb_dns: &str,
) -> Result<(), AliasError> {
    let hosted_zone_id = alb_hosted_zone_id_for_dns(alb_dns)?;

    for record_type in ALIAS_RECORD_TYPES {
        let record = alias_record(hostname, record_type, alb_dns, hosted_zone_id);
        registry
            .upsert_record(zone_id, &record)
            .await
            .with_context(|| format!("failed to upsert {record_type} alias for {hostname}"))?;
        crate::metrics::record_resource_created("alias_record");
    }

    info!(hostname, target = alb_dns, zone_id, "Alias records in place");
    Ok(())
}

/// Delete the A and AAAA alias records. Best-effort: failures are logged so
/// teardown can continue to the steps that actually gate deletion.
pub async fn delete_alias_records(
    registry: &dyn DnsRegistry,
    zone_id: &str,
    hostname: &str,
    alb_dns: &str,
) {
    let hosted_zone_id = match alb_hosted_zone_id_for_dns(alb_dns) {
        Ok(zone) => zone,
        Err(err) => {
            warn!(hostname, alb_dns, error = %err, "Cannot derive alias target for cleanup");
            return;
        }
    };

    for record_type in ALIAS_RECORD_TYPES {
        let record = alias_record(hostname, record_type, alb_dns, hosted_zone_id);
        match registry.delete_record(zone_id, &record).await {
            Ok(()) => {
                crate::metrics::record_resource_deleted("alias_record");
            }
            Err(err) => {
                warn!(hostname, record_type, error = %err, "Failed to delete alias record");
            }
        }
    }
}

fn alias_record(
    hostname: &str,
    record_type: &str,
    alb_dns: &str,
    hosted_zone_id: &str,
) -> DnsRecord {
    DnsRecord {
        name: hostname.to_string(),
        record_type: record_type.to_string(),
        value: String::new(),
        ttl: 0,
        alias_target: Some(AliasTarget {
            dns_name: alb_dns.to_string(),
            hosted_zone_id: hosted_zone_id.to_string(),
            evaluate_target_health: true,
        }),
    }
}

#[cfg(test)]
#[path = "alias_tests.rs"]
mod alias_tests;
