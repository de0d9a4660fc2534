// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Alby - Gateway Hostname Orchestrator for AWS EKS
//!
//! Alby is a Kubernetes controller written in Rust that lets project teams
//! self-provision public or internal HTTPS endpoints by declaring a single
//! [`crd::HostnameRequest`] resource. It reconciles that resource against the
//! Kubernetes API, AWS ACM, and AWS Route53, and delegates ALB provisioning
//! to the AWS Load Balancer Controller through declarative
//! `LoadBalancerConfiguration` objects.
//!
//! ## Overview
//!
//! Submitting a request drives an idempotent nine-step pipeline: the hostname
//! is locked cluster-wide through a `DomainClaim`, an ACM certificate is
//! requested and DNS-validated, the request is placed onto a pooled `Gateway`
//! with first-fit capacity accounting, the gateway's certificate bundle is
//! re-synthesized deterministically, and A/AAAA alias records point the
//! hostname at the provisioned ALB. Teardown runs the pipeline in reverse
//! under a finalizer, waiting for certificate detachment and shrinking the
//! pool when the last hostname leaves a gateway.
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definitions (requests, claims, grants, LBC configs)
//! - [`reconcilers`] - The reconciliation engine and its subsystems
//! - [`gateway`] - Gateway pool allocation and creation
//! - [`aws`] - Capability adapters over ACM and Route53
//! - [`selector`] - Label selector matching for `gatewaySelector`
//! - [`config`] - Environment-driven controller configuration
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use alby::crd::HostnameRequestSpec;
//!
//! let spec = HostnameRequestSpec {
//!     zone_id: "Z0123456789ABCDEFGHIJ".to_string(),
//!     hostname: "api.example.com".to_string(),
//!     environment: Some("prod".to_string()),
//!     visibility: None,
//!     gateway_class: None,
//!     gateway_selector: None,
//!     waf_arn: None,
//! };
//! ```

pub mod aws;
pub mod config;
pub mod constants;
pub mod crd;
pub mod gateway;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod selector;
pub mod status_reasons;
