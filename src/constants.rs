// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Alby operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all Alby CRDs
pub const API_GROUP: &str = "gateway.firestoned.io";

/// API version for all Alby CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "gateway.firestoned.io/v1alpha1";

/// Kind name for `HostnameRequest` resource
pub const KIND_HOSTNAME_REQUEST: &str = "HostnameRequest";

/// Kind name for `DomainClaim` resource
pub const KIND_DOMAIN_CLAIM: &str = "DomainClaim";

/// Kind name for `HostnameGrant` resource
pub const KIND_HOSTNAME_GRANT: &str = "HostnameGrant";

/// Finalizer placed on every `HostnameRequest` so teardown runs before deletion
pub const FINALIZER: &str = "gateway-orchestrator.firestoned.io/finalizer";

// ============================================================================
// AWS Load Balancer Controller Constants
// ============================================================================

/// API group of the LBC configuration CRDs
pub const LBC_API_GROUP: &str = "gateway.k8s.aws";

/// Kind name of the per-gateway load balancer configuration CRD
pub const KIND_LOADBALANCER_CONFIGURATION: &str = "LoadBalancerConfiguration";

// ============================================================================
// Gateway Pool Constants
// ============================================================================

/// Soft limit for certificates attached to a single gateway (ALB SNI limit ~25)
pub const MAX_CERTIFICATES_PER_GATEWAY: usize = 20;

/// Soft limit for listener rules on a single gateway
pub const MAX_RULES_PER_GATEWAY: usize = 100;

/// Prefix for pool gateway names (`gw-01`, `gw-02`, ...)
pub const GATEWAY_NAME_PREFIX: &str = "gw-";

/// Default namespace in which the gateway pool lives
pub const DEFAULT_GATEWAY_NAMESPACE: &str = "edge";

/// Default `GatewayClass` stamped onto created gateways
pub const DEFAULT_GATEWAY_CLASS: &str = "aws-alb";

/// Default HTTP listener port replicated into each `LoadBalancerConfiguration`
pub const DEFAULT_HTTP_PORT: i32 = 80;

/// Default HTTPS listener port replicated into each `LoadBalancerConfiguration`
pub const DEFAULT_HTTPS_PORT: i32 = 443;

/// Default gateway visibility when the request does not set one
pub const DEFAULT_VISIBILITY: &str = "internet-facing";

// ============================================================================
// Requeue and Timeout Constants
// ============================================================================

/// Short requeue delay for ACM validation records and certificate in-use waits
pub const REQUEUE_SHORT_SECS: u64 = 15;

/// Medium requeue delay for certificate issuance polling and ALB provisioning
pub const REQUEUE_MEDIUM_SECS: u64 = 30;

/// Requeue interval for ready requests (periodic drift detection)
pub const REQUEUE_WHEN_READY_SECS: u64 = 300;

/// Requeue delay applied by the error policy after a reconcile error
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Per-call timeout for AWS API calls
pub const AWS_CALL_TIMEOUT_SECS: u64 = 30;

/// TTL for ACM DNS validation CNAME records
pub const VALIDATION_RECORD_TTL_SECS: i64 = 300;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// How long a leader lease is valid before it must be renewed
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 30;

/// Deadline for the active leader to renew its lease
pub const DEFAULT_LEASE_RENEW_DEADLINE_SECS: u64 = 20;

/// Retry period for non-leaders attempting to acquire the lease
pub const DEFAULT_LEASE_RETRY_PERIOD_SECS: u64 = 5;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Default bind address for the metrics and health HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// HTTP path serving Prometheus metrics
pub const METRICS_SERVER_PATH: &str = "/metrics";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of Tokio worker threads for the controller runtime
pub const TOKIO_WORKER_THREADS: usize = 4;
