// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for gateway hostname orchestration.
//!
//! This module defines all Kubernetes Custom Resource Definitions used by Alby
//! to provision HTTPS endpoints on AWS EKS declaratively.
//!
//! # Resource Types
//!
//! ## User-facing
//!
//! - [`HostnameRequest`] - A request to expose a hostname through a pooled ALB gateway
//! - [`HostnameGrant`] - Informational namespace-to-hostname grants consumed by an
//!   external policy engine
//!
//! ## Controller-internal
//!
//! - [`DomainClaim`] - Cluster-scoped first-come-first-serve lock on `(zoneId, hostname)`
//!
//! ## AWS Load Balancer Controller
//!
//! - [`LoadBalancerConfiguration`] - Per-gateway ALB configuration (scheme, listeners,
//!   certificate bundle, WAF) consumed by the LBC
//! - [`TargetGroupConfiguration`] - Per-gateway target group defaults (IP targets)
//!
//! # Example: Requesting a Hostname
//!
//! ```rust,no_run
//! use alby::crd::HostnameRequestSpec;
//!
//! let spec = HostnameRequestSpec {
//!     zone_id: "Z0123456789ABCDEFGHIJ".to_string(),
//!     hostname: "api.example.com".to_string(),
//!     environment: Some("prod".to_string()),
//!     visibility: Some("internet-facing".to_string()),
//!     gateway_class: None,
//!     gateway_selector: None,
//!     waf_arn: None,
//! };
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label selector to match pool gateways.
///
/// A label selector is a label query over a set of resources. The result of matchLabels and
/// matchExpressions are `ANDed`. An empty label selector matches all objects.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Map of {key,value} pairs. A single {key,value} in the matchLabels map is equivalent
    /// to an element of matchExpressions, whose key field is "key", the operator is "In",
    /// and the values array contains only "value". All requirements must be satisfied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_labels: Option<BTreeMap<String, String>>,

    /// List of label selector requirements. All requirements must be satisfied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_expressions: Option<Vec<LabelSelectorRequirement>>,
}

/// A label selector requirement is a selector that contains values, a key, and an operator
/// that relates the key and values.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelectorRequirement {
    /// The label key that the selector applies to.
    pub key: String,

    /// Operator represents a key's relationship to a set of values.
    /// Valid operators are In, `NotIn`, Exists and `DoesNotExist`.
    pub operator: String,

    /// An array of string values. If the operator is In or `NotIn`,
    /// the values array must be non-empty. If the operator is Exists or `DoesNotExist`,
    /// the values array must be empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

/// Status condition following Kubernetes conventions.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g. `Claimed`, `CertificateIssued`, `Ready`).
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Generation of the spec this condition was computed against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// `HostnameRequest` requests a public or internal HTTPS endpoint for a hostname.
///
/// Submitting one drives the full provisioning pipeline: domain claim, ACM
/// certificate with DNS validation, gateway pool placement, listener
/// attachment via the gateway's `LoadBalancerConfiguration`, and Route53
/// alias records pointing at the provisioned ALB.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "gateway.firestoned.io",
    version = "v1alpha1",
    kind = "HostnameRequest",
    namespaced,
    shortname = "ghr",
    doc = "HostnameRequest provisions a traffic-serving HTTPS endpoint for a fully-qualified hostname on a pooled ALB gateway.",
    printcolumn = r#"{"name":"Hostname","type":"string","jsonPath":".spec.hostname"}"#,
    printcolumn = r#"{"name":"Gateway","type":"string","jsonPath":".status.assignedGateway"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "HostnameRequestStatus")]
#[serde(rename_all = "camelCase")]
pub struct HostnameRequestSpec {
    /// Identifier of the pre-existing Route53 hosted zone where DNS records are created.
    pub zone_id: String,

    /// Fully-qualified DNS name to expose (e.g. `api.example.com`).
    #[schemars(regex(pattern = r"^([a-z0-9]+(-[a-z0-9]+)*\.)+[a-z]{2,}$"))]
    pub hostname: String,

    /// Logical environment tag (`dev`, `staging`, `prod`). Purely informational;
    /// propagated onto the ACM certificate tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(regex(pattern = r"^(dev|staging|prod)$"))]
    pub environment: Option<String>,

    /// Whether the serving ALB is `internet-facing` or `internal`.
    /// Defaults to `internet-facing`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(regex(pattern = r"^(internet-facing|internal)$"))]
    pub visibility: Option<String>,

    /// `GatewayClass` to place this hostname on. Defaults to `aws-alb`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_class: Option<String>,

    /// Optionally restricts which pool gateways this request may be assigned to.
    /// If set, only gateways whose labels match are considered, and no new
    /// gateway is created on its behalf.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_selector: Option<LabelSelector>,

    /// Optional AWS WAFv2 WebACL ARN to associate with the load balancer.
    /// All hostnames sharing a gateway share its WAF (ALB constraint), so the
    /// request is only placed on gateways with an identical WAF selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(regex(pattern = r"^arn:aws:wafv2:[a-z0-9-]+:[0-9]+:.*$"))]
    pub waf_arn: Option<String>,
}

impl HostnameRequestSpec {
    /// Visibility with the default applied.
    #[must_use]
    pub fn effective_visibility(&self) -> &str {
        self.visibility
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(crate::constants::DEFAULT_VISIBILITY)
    }

    /// Gateway class with the default applied.
    #[must_use]
    pub fn effective_gateway_class(&self) -> &str {
        self.gateway_class
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(crate::constants::DEFAULT_GATEWAY_CLASS)
    }

    /// WAF ARN, empty string when unset (empty-equals-empty in placement).
    #[must_use]
    pub fn effective_waf_arn(&self) -> &str {
        self.waf_arn.as_deref().unwrap_or("")
    }
}

/// Observed state of a `HostnameRequest`.
///
/// Every field serializes even when empty: status writes are merge patches,
/// and an omitted field would survive the patch when drift detection or
/// teardown needs it cleared.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostnameRequestStatus {
    /// Generation of the spec that was last fully reconciled.
    pub observed_generation: Option<i64>,

    /// Hash of the spec fields that require re-provisioning when changed.
    #[serde(default)]
    pub observed_spec_hash: String,

    /// ARN of the ACM certificate requested for this hostname.
    #[serde(default)]
    pub certificate_id: String,

    /// Name of the pool gateway this hostname is assigned to.
    #[serde(default)]
    pub assigned_gateway: String,

    /// Namespace of the assigned gateway.
    #[serde(default)]
    pub assigned_gateway_namespace: String,

    /// DNS name of the ALB serving this hostname.
    #[serde(default)]
    pub assigned_load_balancer: String,

    /// Latest observations of the provisioning pipeline, keyed by type.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Reference tying a `DomainClaim` to exactly one `HostnameRequest`.
///
/// The `uid` never changes after creation; a claim whose owner uid differs
/// from the requesting resource denotes a conflict, never a transfer.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainClaimOwnerRef {
    /// Namespace of the owning `HostnameRequest`.
    pub namespace: String,

    /// Name of the owning `HostnameRequest`.
    pub name: String,

    /// UID of the owning `HostnameRequest`.
    pub uid: String,
}

/// `DomainClaim` is the cluster-wide first-come-first-serve lock on a hostname.
///
/// At most one claim exists for any `(zoneId, hostname)` pair; its name is
/// derived deterministically from that pair. Controller restarts and leader
/// handoffs must not re-open a closed claim, so this is a durable record
/// rather than controller memory.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "gateway.firestoned.io",
    version = "v1alpha1",
    kind = "DomainClaim",
    doc = "DomainClaim locks a (zoneId, hostname) pair to a single HostnameRequest, cluster-wide.",
    printcolumn = r#"{"name":"Hostname","type":"string","jsonPath":".spec.hostname"}"#,
    printcolumn = r#"{"name":"Owner","type":"string","jsonPath":".spec.ownerRef.name"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "DomainClaimStatus")]
#[serde(rename_all = "camelCase")]
pub struct DomainClaimSpec {
    /// Hosted zone the claimed hostname lives in.
    pub zone_id: String,

    /// The claimed fully-qualified hostname, stored verbatim (wildcards included).
    pub hostname: String,

    /// The single `HostnameRequest` holding this claim.
    pub owner_ref: DomainClaimOwnerRef,
}

/// `DomainClaim` status.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainClaimStatus {
    /// When the claim was taken (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<String>,
}

/// `HostnameGrant` lists hostnames a namespace is permitted to route.
///
/// Alby does not enforce grants itself; an external policy engine (Kyverno,
/// Gatekeeper) consumes them to admit or reject `HTTPRoute` hostnames.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "gateway.firestoned.io",
    version = "v1alpha1",
    kind = "HostnameGrant",
    namespaced,
    doc = "HostnameGrant records which hostnames a namespace may route; consumed by an external policy engine."
)]
#[kube(status = "HostnameGrantStatus")]
#[serde(rename_all = "camelCase")]
pub struct HostnameGrantSpec {
    /// Namespace the grant applies to.
    pub namespace: String,

    /// Hostnames the namespace may route.
    pub hostnames: Vec<String>,
}

/// `HostnameGrant` status.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostnameGrantStatus {
    /// When the grant was recorded (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granted_at: Option<String>,
}

/// A single listener entry in a `LoadBalancerConfiguration`.
///
/// HTTPS listeners carry the certificate bundle; the default certificate is
/// the lexicographically smallest ARN so the bundle is a pure function of the
/// assigned request set, independent of reconcile order.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListenerConfiguration {
    /// Protocol and port, e.g. `HTTPS:443` or `HTTP:80`.
    pub protocol_port: String,

    /// Default certificate ARN served when SNI does not match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_certificate: Option<String>,

    /// Additional certificate ARNs served via SNI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificates: Option<Vec<String>>,
}

/// WAFv2 association for a load balancer.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct WafV2Configuration {
    /// ARN of the WAFv2 WebACL to associate.
    #[serde(rename = "webACL")]
    pub web_acl: String,
}

/// `LoadBalancerConfiguration` parametrizes the ALB the LBC provisions for a gateway.
///
/// Owned by the AWS Load Balancer Controller's API group; Alby writes it and
/// the LBC consumes it. Writes are full-spec replacement so drift corrects on
/// every reconcile.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "gateway.k8s.aws",
    version = "v1beta1",
    kind = "LoadBalancerConfiguration",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerConfigurationSpec {
    /// ALB scheme: `internet-facing` or `internal`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    /// Ordered listener configurations (HTTPS with certificate bundle, then HTTP).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listener_configurations: Option<Vec<ListenerConfiguration>>,

    /// Optional WAFv2 WebACL association.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waf_v2: Option<WafV2Configuration>,
}

/// Default target group settings for a gateway.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroupDefaults {
    /// Target registration mode; `ip` enables plain `ClusterIP` services.
    pub target_type: String,
}

/// `TargetGroupConfiguration` sets target group defaults for a gateway's ALB.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "gateway.k8s.aws",
    version = "v1beta1",
    kind = "TargetGroupConfiguration",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroupConfigurationSpec {
    /// Defaults applied to every target group the LBC creates for the gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_configuration: Option<TargetGroupDefaults>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
