// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller configuration loaded from environment variables.
//!
//! All knobs follow the `ALBY_` prefix convention. Unset variables fall back
//! to the defaults in [`crate::constants`], so a bare deployment works out of
//! the box against the `edge` namespace and the `aws-alb` gateway class.
//!
//! | Variable | Default | Purpose |
//! |---|---|---|
//! | `ALBY_METRICS_BIND_ADDRESS` | `0.0.0.0:8080` | Metrics + health HTTP server |
//! | `ALBY_GATEWAY_NAMESPACE` | `edge` | Namespace hosting the gateway pool |
//! | `ALBY_GATEWAY_CLASS` | `aws-alb` | `GatewayClass` filter and stamp |
//! | `ALBY_HTTP_PORT` | `80` | HTTP listener port for created gateways |
//! | `ALBY_HTTPS_PORT` | `443` | HTTPS listener port for created gateways |
//! | `ALBY_ALLOWED_DOMAINS` | (empty) | Comma-separated apex allowlist; empty allows all |
//! | `ALBY_ENABLE_LEADER_ELECTION` | `true` | Single-writer lease gate |

use crate::constants::{
    DEFAULT_GATEWAY_CLASS, DEFAULT_GATEWAY_NAMESPACE, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT,
    DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_RETRY_PERIOD_SECS, METRICS_SERVER_BIND_ADDRESS,
};

/// Runtime configuration for the controller.
#[derive(Clone, Debug)]
pub struct Config {
    /// Bind address for the metrics and health probe HTTP server.
    pub metrics_bind_address: String,

    /// Namespace in which the gateway pool lives.
    pub gateway_namespace: String,

    /// `GatewayClass` used to filter pool members and stamp created gateways.
    pub gateway_class: String,

    /// HTTP listener port replicated into each `LoadBalancerConfiguration`.
    pub http_port: i32,

    /// HTTPS listener port replicated into each `LoadBalancerConfiguration`.
    pub https_port: i32,

    /// Optional apex-domain allowlist enforced during request validation.
    /// Empty means every hostname is allowed.
    pub allowed_domains: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics_bind_address: METRICS_SERVER_BIND_ADDRESS.to_string(),
            gateway_namespace: DEFAULT_GATEWAY_NAMESPACE.to_string(),
            gateway_class: DEFAULT_GATEWAY_CLASS.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            https_port: DEFAULT_HTTPS_PORT,
            allowed_domains: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from `ALBY_*` environment variables.
    ///
    /// Unset or unparsable values fall back to defaults rather than failing
    /// startup; a misconfigured port is logged by the caller when it differs
    /// from the listener ports already stamped on the pool.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            metrics_bind_address: env_or("ALBY_METRICS_BIND_ADDRESS", &defaults.metrics_bind_address),
            gateway_namespace: env_or("ALBY_GATEWAY_NAMESPACE", &defaults.gateway_namespace),
            gateway_class: env_or("ALBY_GATEWAY_CLASS", &defaults.gateway_class),
            http_port: env_parse_or("ALBY_HTTP_PORT", defaults.http_port),
            https_port: env_parse_or("ALBY_HTTPS_PORT", defaults.https_port),
            allowed_domains: parse_domain_list(
                &std::env::var("ALBY_ALLOWED_DOMAINS").unwrap_or_default(),
            ),
        }
    }
}

/// Leader election configuration.
#[derive(Clone, Debug)]
pub struct LeaderElectionConfig {
    /// Whether to gate reconciliation behind a leader lease.
    pub enabled: bool,
    /// Name of the `Lease` object.
    pub lease_name: String,
    /// Namespace holding the `Lease` object.
    pub lease_namespace: String,
    /// Identity written into the lease; defaults to the pod name.
    pub identity: String,
    /// How long an acquired lease is valid.
    pub lease_duration: u64,
    /// Retry period for non-leaders attempting acquisition.
    pub retry_period: u64,
}

impl LeaderElectionConfig {
    /// Load leader election configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let enabled = std::env::var("ALBY_ENABLE_LEADER_ELECTION")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let lease_name =
            std::env::var("ALBY_LEASE_NAME").unwrap_or_else(|_| "alby-leader".to_string());

        let lease_namespace = std::env::var("ALBY_LEASE_NAMESPACE")
            .or_else(|_| std::env::var("POD_NAMESPACE"))
            .unwrap_or_else(|_| DEFAULT_GATEWAY_NAMESPACE.to_string());

        let lease_duration = std::env::var("ALBY_LEASE_DURATION_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_LEASE_DURATION_SECS);

        let retry_period = std::env::var("ALBY_LEASE_RETRY_PERIOD_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_LEASE_RETRY_PERIOD_SECS);

        let identity = std::env::var("POD_NAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .unwrap_or_else(|_| format!("alby-{}", rand::random::<u32>()));

        Self {
            enabled,
            lease_name,
            lease_namespace,
            identity,
            lease_duration,
            retry_period,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

/// Parse a comma-separated domain allowlist, trimming whitespace and dropping
/// empty entries. Domains are lowercased so allowlist checks are
/// case-insensitive.
#[must_use]
pub fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().trim_start_matches('.').to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

/// Check a hostname against the apex allowlist.
///
/// A hostname is allowed when the list is empty, when it equals an allowed
/// apex, or when it is a subdomain of one (`api.example.com` matches
/// `example.com`, `notexample.com` does not).
#[must_use]
pub fn hostname_allowed(allowed_domains: &[String], hostname: &str) -> bool {
    if allowed_domains.is_empty() {
        return true;
    }

    let hostname = hostname.trim_start_matches("*.").to_lowercase();
    allowed_domains
        .iter()
        .any(|apex| hostname == *apex || hostname.ends_with(&format!(".{apex}")))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
