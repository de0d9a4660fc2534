// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory adapter implementations for tests.
//!
//! The mocks model just enough of ACM and Route53 to exercise the
//! reconciler steps: certificates move through scripted lifecycle states,
//! validation records appear with the certificate, and DNS records live in a
//! `(zone, name, type)`-keyed map with UPSERT semantics.

use crate::aws::{
    AdapterError, CertificateAuthority, CertificateDetails, CertificateState, DnsRecord,
    DnsRegistry, ValidationRecord,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Scriptable in-memory certificate authority.
#[derive(Default)]
pub struct MockCertificateAuthority {
    inner: Mutex<MockCaState>,
}

#[derive(Default)]
struct MockCaState {
    certificates: BTreeMap<String, CertificateDetails>,
    validation_records: BTreeMap<String, Vec<ValidationRecord>>,
    request_count: u64,
}

impl MockCertificateAuthority {
    /// Create an empty mock authority.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a certificate to a new lifecycle state.
    pub fn set_state(&self, certificate_id: &str, state: CertificateState) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(details) = inner.certificates.get_mut(certificate_id) {
            details.state = state;
        }
    }

    /// Script the load balancers still holding a certificate.
    pub fn set_in_use_by(&self, certificate_id: &str, in_use_by: Vec<String>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(details) = inner.certificates.get_mut(certificate_id) {
            details.in_use_by = in_use_by;
        }
    }

    /// Drop the validation records for a certificate, simulating the window
    /// right after a request when ACM has not published them yet.
    pub fn clear_validation_records(&self, certificate_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.validation_records.insert(certificate_id.to_string(), Vec::new());
    }

    /// Remove a certificate entirely, simulating external deletion.
    pub fn remove_certificate(&self, certificate_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.certificates.remove(certificate_id);
        inner.validation_records.remove(certificate_id);
    }

    /// Whether a certificate currently exists.
    #[must_use]
    pub fn has_certificate(&self, certificate_id: &str) -> bool {
        self.inner.lock().unwrap().certificates.contains_key(certificate_id)
    }

    /// Number of `request_certificate` calls observed.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.inner.lock().unwrap().request_count
    }
}

#[async_trait]
impl CertificateAuthority for MockCertificateAuthority {
    async fn request_certificate(
        &self,
        domain: &str,
        _tags: &BTreeMap<String, String>,
    ) -> Result<String, AdapterError> {
        let mut inner = self.inner.lock().unwrap();
        inner.request_count += 1;
        let arn = format!("arn:aws:acm:us-east-1:123456789012:certificate/{domain}");

        inner.certificates.insert(
            arn.clone(),
            CertificateDetails {
                id: arn.clone(),
                domain: domain.to_string(),
                state: CertificateState::PendingValidation,
                in_use_by: Vec::new(),
            },
        );
        inner.validation_records.insert(
            arn.clone(),
            vec![ValidationRecord {
                name: format!("_acm-validation.{domain}"),
                record_type: "CNAME".to_string(),
                value: "_validation-value.acm-validations.aws.".to_string(),
            }],
        );

        Ok(arn)
    }

    async fn describe_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<CertificateDetails, AdapterError> {
        self.inner
            .lock()
            .unwrap()
            .certificates
            .get(certificate_id)
            .cloned()
            .ok_or_else(|| AdapterError::NotFound {
                resource: certificate_id.to_string(),
            })
    }

    async fn validation_records(
        &self,
        certificate_id: &str,
    ) -> Result<Vec<ValidationRecord>, AdapterError> {
        self.inner
            .lock()
            .unwrap()
            .validation_records
            .get(certificate_id)
            .cloned()
            .ok_or_else(|| AdapterError::NotFound {
                resource: certificate_id.to_string(),
            })
    }

    async fn delete_certificate(&self, certificate_id: &str) -> Result<(), AdapterError> {
        let mut inner = self.inner.lock().unwrap();

        match inner.certificates.get(certificate_id) {
            None => Err(AdapterError::NotFound {
                resource: certificate_id.to_string(),
            }),
            Some(details) if !details.in_use_by.is_empty() => Err(AdapterError::Conflict {
                resource: certificate_id.to_string(),
                reason: format!("in use by {}", details.in_use_by.join(", ")),
            }),
            Some(_) => {
                inner.certificates.remove(certificate_id);
                inner.validation_records.remove(certificate_id);
                Ok(())
            }
        }
    }
}

/// In-memory DNS registry keyed by `(zoneId, name, type)`.
#[derive(Default)]
pub struct MockDnsRegistry {
    records: Mutex<BTreeMap<String, DnsRecord>>,
}

impl MockDnsRegistry {
    /// Create an empty mock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(zone_id: &str, name: &str, record_type: &str) -> String {
        format!("{zone_id}:{name}:{record_type}")
    }

    /// Whether a record exists.
    #[must_use]
    pub fn has_record(&self, zone_id: &str, name: &str, record_type: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .contains_key(&Self::key(zone_id, name, record_type))
    }

    /// Snapshot of all records, for assertions.
    #[must_use]
    pub fn all_records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    /// Number of records currently stored.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl DnsRegistry for MockDnsRegistry {
    async fn upsert_record(&self, zone_id: &str, record: &DnsRecord) -> Result<(), AdapterError> {
        self.records.lock().unwrap().insert(
            Self::key(zone_id, &record.name, &record.record_type),
            record.clone(),
        );
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record: &DnsRecord) -> Result<(), AdapterError> {
        // Deleting an absent record is success, matching UPSERT/DELETE semantics
        self.records
            .lock()
            .unwrap()
            .remove(&Self::key(zone_id, &record.name, &record.record_type));
        Ok(())
    }

    async fn get_record(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Option<DnsRecord>, AdapterError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&Self::key(zone_id, name, record_type))
            .cloned())
    }
}
