// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! ACM-backed implementation of [`CertificateAuthority`].
//!
//! All calls run under a 30 s timeout and map SDK failures into the
//! [`AdapterError`] taxonomy the reconcilers act on. Credentials and region
//! come from the ambient SDK config (IRSA on EKS, env/profile elsewhere).

use crate::aws::{
    AdapterError, CertificateAuthority, CertificateDetails, CertificateState, ValidationRecord,
};
use crate::constants::AWS_CALL_TIMEOUT_SECS;
use async_trait::async_trait;
use aws_sdk_acm::types::{Tag, ValidationMethod};
use aws_sdk_acm::Client as AcmClient;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// [`CertificateAuthority`] implementation backed by AWS Certificate Manager.
pub struct AcmCertificateAuthority {
    client: AcmClient,
}

impl AcmCertificateAuthority {
    /// Create an ACM adapter from a shared SDK configuration.
    #[must_use]
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: AcmClient::new(sdk_config),
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
            service: "acm".to_string(),
            reason: format!("{operation} timed out after {AWS_CALL_TIMEOUT_SECS}s"),
        }),
    }
}

fn retryable(reason: impl ToString) -> AdapterError {
    AdapterError::Retryable {
        service: "acm".to_string(),
        reason: reason.to_string(),
    }
}

fn fatal(reason: impl ToString) -> AdapterError {
    AdapterError::Fatal {
        service: "acm".to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl CertificateAuthority for AcmCertificateAuthority {
    async fn request_certificate(
        &self,
        domain: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<String, AdapterError> {
        let mut acm_tags = Vec::with_capacity(tags.len());
        for (key, value) in tags {
            let tag = Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| fatal(format!("invalid certificate tag {key}: {e}")))?;
            acm_tags.push(tag);
        }

        let result = with_timeout("RequestCertificate", async {
            self.client
                .request_certificate()
                .domain_name(domain)
                .validation_method(ValidationMethod::Dns)
                .set_tags(Some(acm_tags))
                .send()
                .await
                .map_err(|e| retryable(e.into_service_error()))
        })
        .await?;

        let arn = result
            .certificate_arn()
            .ok_or_else(|| fatal("RequestCertificate returned no certificate ARN"))?;

        debug!(domain, arn, "Requested ACM certificate");
        Ok(arn.to_string())
    }

    async fn describe_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<CertificateDetails, AdapterError> {
        let result = with_timeout("DescribeCertificate", async {
            self.client
                .describe_certificate()
                .certificate_arn(certificate_id)
                .send()
                .await
                .map_err(|e| {
                    let service_error = e.into_service_error();
                    if service_error.is_resource_not_found_exception() {
                        AdapterError::NotFound {
                            resource: certificate_id.to_string(),
                        }
                    } else {
                        retryable(service_error)
                    }
                })
        })
        .await?;

        let certificate = result
            .certificate()
            .ok_or_else(|| fatal("DescribeCertificate returned no certificate"))?;

        let state = certificate
            .status()
            .map(|s| CertificateState::from_acm(s.as_str()))
            .unwrap_or_else(|| CertificateState::Other("UNKNOWN".to_string()));

        Ok(CertificateDetails {
            id: certificate_id.to_string(),
            domain: certificate.domain_name().unwrap_or_default().to_string(),
            state,
            in_use_by: certificate.in_use_by().to_vec(),
        })
    }

    async fn validation_records(
        &self,
        certificate_id: &str,
    ) -> Result<Vec<ValidationRecord>, AdapterError> {
        let result = with_timeout("DescribeCertificate", async {
            self.client
                .describe_certificate()
                .certificate_arn(certificate_id)
                .send()
                .await
                .map_err(|e| {
                    let service_error = e.into_service_error();
                    if service_error.is_resource_not_found_exception() {
                        AdapterError::NotFound {
                            resource: certificate_id.to_string(),
                        }
                    } else {
                        retryable(service_error)
                    }
                })
        })
        .await?;

        let certificate = result
            .certificate()
            .ok_or_else(|| fatal("DescribeCertificate returned no certificate"))?;

        // ACM publishes the resource record a moment after the request;
        // options without one yet are simply skipped.
        let mut records = Vec::new();
        for dvo in certificate.domain_validation_options() {
            if let Some(rr) = dvo.resource_record() {
                records.push(ValidationRecord {
                    name: rr.name().to_string(),
                    record_type: rr.r#type().as_str().to_string(),
                    value: rr.value().to_string(),
                });
            }
        }

        Ok(records)
    }

    async fn delete_certificate(&self, certificate_id: &str) -> Result<(), AdapterError> {
        with_timeout("DeleteCertificate", async {
            match self
                .client
                .delete_certificate()
                .certificate_arn(certificate_id)
                .send()
                .await
            {
                Ok(_) => Ok(()),
                Err(e) => {
                    let service_error = e.into_service_error();
                    if service_error.is_resource_not_found_exception() {
                        Err(AdapterError::NotFound {
                            resource: certificate_id.to_string(),
                        })
                    } else if service_error.is_resource_in_use_exception() {
                        Err(AdapterError::Conflict {
                            resource: certificate_id.to_string(),
                            reason: service_error.to_string(),
                        })
                    } else {
                        Err(retryable(service_error))
                    }
                }
            }
        })
        .await
    }
}
