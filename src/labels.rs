// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all reconcilers.
//!
//! This module defines standard Kubernetes labels and Alby-specific labels/annotations
//! to ensure consistency across all resources created by the controller.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

/// Value for `app.kubernetes.io/managed-by` on resources created by this controller
pub const MANAGED_BY_ALBY: &str = "alby";

// ============================================================================
// Gateway Pool Annotations
// ============================================================================

/// Annotation recording the visibility (`internet-facing` or `internal`) of a pool gateway
pub const ANNOTATION_VISIBILITY: &str = "gateway.firestoned.io/visibility";

/// Annotation tracking the number of certificates attached to a pool gateway.
///
/// This is a placement hint only; authoritative capacity is recomputed from the
/// live `HostnameRequest` list.
pub const ANNOTATION_CERTIFICATE_COUNT: &str = "gateway.firestoned.io/certificate-count";

/// Annotation tracking the number of listener rules on a pool gateway (placement hint)
pub const ANNOTATION_RULE_COUNT: &str = "gateway.firestoned.io/rule-count";

/// Annotation naming the `LoadBalancerConfiguration` that parametrizes a pool gateway
pub const ANNOTATION_LOADBALANCER_CONFIGURATION: &str =
    "gateway.firestoned.io/loadbalancer-configuration";

/// Annotation recording the WAFv2 WebACL ARN shared by all hostnames on a pool gateway
pub const ANNOTATION_WAF_ARN: &str = "gateway.firestoned.io/waf-arn";

// ============================================================================
// Namespace Labels
// ============================================================================

/// Label applied to namespaces that host `HTTPRoute`s for an assigned gateway.
///
/// The value is the gateway name. Listener-level admission is open to all
/// namespaces; this label is informational glue for the external policy engine.
pub const LABEL_GATEWAY_ACCESS: &str = "gateway.firestoned.io/access";

// ============================================================================
// ACM Certificate Tags
// ============================================================================

/// Tag key marking ACM certificates as managed by this controller
pub const TAG_MANAGED_BY: &str = "managed-by";

/// Tag key recording the hostname a certificate was requested for
pub const TAG_HOSTNAME: &str = "hostname";

/// Tag key recording the namespace of the owning `HostnameRequest`
pub const TAG_NAMESPACE: &str = "namespace";

/// Tag key recording the logical environment (`dev`, `staging`, `prod`)
pub const TAG_ENVIRONMENT: &str = "environment";
