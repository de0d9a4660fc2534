// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Route53-backed implementation of [`DnsRegistry`].
//!
//! Records are written through `ChangeResourceRecordSets` with UPSERT/DELETE
//! semantics, which are atomic per `(name, type)`. Alias records carry an
//! alias target and no TTL; plain records carry value + TTL.

use crate::aws::{AdapterError, AliasTarget, DnsRecord, DnsRegistry};
use crate::constants::AWS_CALL_TIMEOUT_SECS;
use async_trait::async_trait;
use aws_sdk_route53::types::{
    AliasTarget as SdkAliasTarget, Change, ChangeAction, ChangeBatch, ResourceRecord,
    ResourceRecordSet, RrType,
};
use aws_sdk_route53::Client as Route53Client;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// [`DnsRegistry`] implementation backed by AWS Route53.
pub struct Route53DnsRegistry {
    client: Route53Client,
}

impl Route53DnsRegistry {
    /// Create a Route53 adapter from a shared SDK configuration.
    #[must_use]
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Route53Client::new(sdk_config),
        }
    }

    async fn change_record(
        &self,
        zone_id: &str,
        record: &DnsRecord,
        action: ChangeAction,
    ) -> Result<(), AdapterError> {
        let record_set = build_record_set(record)?;

        let change = Change::builder()
            .action(action.clone())
            .resource_record_set(record_set)
            .build()
            .map_err(|e| fatal(format!("invalid change for {}: {e}", record.name)))?;

        let batch = ChangeBatch::builder()
            .changes(change)
            .build()
            .map_err(|e| fatal(format!("invalid change batch: {e}")))?;

        let result = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(normalize_zone_id(zone_id))
            .change_batch(batch)
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(
                    zone_id,
                    name = %record.name,
                    record_type = %record.record_type,
                    ?action,
                    "Applied Route53 record change"
                );
                Ok(())
            }
            Err(e) => {
                let service_error = e.into_service_error();
                // Deleting a record that is already gone surfaces as
                // InvalidChangeBatch; the registry contract treats it as success.
                if action == ChangeAction::Delete && service_error.is_invalid_change_batch() {
                    debug!(
                        zone_id,
                        name = %record.name,
                        "Route53 record already absent, treating delete as success"
                    );
                    return Ok(());
                }
                if service_error.is_no_such_hosted_zone() {
                    return Err(AdapterError::NotFound {
                        resource: zone_id.to_string(),
                    });
                }
                Err(retryable(service_error))
            }
        }
    }
}

/// Run an SDK future under the standard AWS call timeout.
async fn with_timeout<T, F>(operation: &str, fut: F) -> Result<T, AdapterError>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    match tokio::time::timeout(Duration::from_secs(AWS_CALL_TIMEOUT_SECS), fut).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Retryable {
            service: "route53".to_string(),
            reason: format!("{operation} timed out after {AWS_CALL_TIMEOUT_SECS}s"),
        }),
    }
}

fn retryable(reason: impl ToString) -> AdapterError {
    AdapterError::Retryable {
        service: "route53".to_string(),
        reason: reason.to_string(),
    }
}

fn fatal(reason: impl ToString) -> AdapterError {
    AdapterError::Fatal {
        service: "route53".to_string(),
        reason: reason.to_string(),
    }
}

/// Build the SDK record set for either an alias or a plain value record.
fn build_record_set(record: &DnsRecord) -> Result<ResourceRecordSet, AdapterError> {
    let rr_type = parse_rr_type(&record.record_type)?;
    let mut builder = ResourceRecordSet::builder()
        .name(&record.name)
        .r#type(rr_type);

    if let Some(alias) = &record.alias_target {
        let alias_target = SdkAliasTarget::builder()
            .dns_name(&alias.dns_name)
            .hosted_zone_id(&alias.hosted_zone_id)
            .evaluate_target_health(alias.evaluate_target_health)
            .build()
            .map_err(|e| fatal(format!("invalid alias target for {}: {e}", record.name)))?;
        builder = builder.alias_target(alias_target);
    } else {
        let value = ResourceRecord::builder()
            .value(&record.value)
            .build()
            .map_err(|e| fatal(format!("invalid record value for {}: {e}", record.name)))?;
        builder = builder.ttl(record.ttl).resource_records(value);
    }

    builder
        .build()
        .map_err(|e| fatal(format!("invalid record set for {}: {e}", record.name)))
}

fn parse_rr_type(record_type: &str) -> Result<RrType, AdapterError> {
    match record_type {
        "A" => Ok(RrType::A),
        "AAAA" => Ok(RrType::Aaaa),
        "CNAME" => Ok(RrType::Cname),
        other => Err(fatal(format!("unsupported record type: {other}"))),
    }
}

/// Strip the `/hostedzone/` prefix users sometimes paste from the console.
fn normalize_zone_id(zone_id: &str) -> &str {
    zone_id.trim_start_matches("/hostedzone/")
}

#[async_trait]
impl DnsRegistry for Route53DnsRegistry {
    async fn upsert_record(&self, zone_id: &str, record: &DnsRecord) -> Result<(), AdapterError> {
        with_timeout(
            "ChangeResourceRecordSets",
            self.change_record(zone_id, record, ChangeAction::Upsert),
        )
        .await
    }

    async fn delete_record(&self, zone_id: &str, record: &DnsRecord) -> Result<(), AdapterError> {
        with_timeout(
            "ChangeResourceRecordSets",
            self.change_record(zone_id, record, ChangeAction::Delete),
        )
        .await
    }

    async fn get_record(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Option<DnsRecord>, AdapterError> {
        let rr_type = parse_rr_type(record_type)?;

        let result = with_timeout("ListResourceRecordSets", async {
            self.client
                .list_resource_record_sets()
                .hosted_zone_id(normalize_zone_id(zone_id))
                .start_record_name(name)
                .start_record_type(rr_type)
                .max_items(1)
                .send()
                .await
                .map_err(|e| {
                    let service_error = e.into_service_error();
                    if service_error.is_no_such_hosted_zone() {
                        AdapterError::NotFound {
                            resource: zone_id.to_string(),
                        }
                    } else {
                        retryable(service_error)
                    }
                })
        })
        .await?;

        for rrs in result.resource_record_sets() {
            // Route53 returns names with a trailing dot
            let record_name = rrs.name();
            if record_name.trim_end_matches('.') != name.trim_end_matches('.')
                || rrs.r#type().as_str() != record_type
            {
                continue;
            }

            let mut record = DnsRecord {
                name: record_name.to_string(),
                record_type: record_type.to_string(),
                ttl: rrs.ttl().unwrap_or_default(),
                ..DnsRecord::default()
            };

            if let Some(alias) = rrs.alias_target() {
                record.alias_target = Some(AliasTarget {
                    dns_name: alias.dns_name().to_string(),
                    hosted_zone_id: alias.hosted_zone_id().to_string(),
                    evaluate_target_health: alias.evaluate_target_health(),
                });
            } else if let Some(value) = rrs.resource_records().first() {
                record.value = value.value().to_string();
            }

            return Ok(Some(record));
        }

        Ok(None)
    }
}
