// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Gateway pool management.
//!
//! The pool is the set of `Gateway` resources named `gw-NN` in the configured
//! namespace. Placement is first-fit over the name-sorted pool: the first
//! gateway whose class, visibility, WAF, labels, and remaining capacity all
//! match wins, so placements do not oscillate between reconciles.
//!
//! Capacity counters live in gateway annotations and are *hints*; the
//! authoritative certificate set is recomputed from the live request list by
//! the `LoadBalancerConfiguration` synthesizer.

use crate::constants::{
    GATEWAY_NAME_PREFIX, LBC_API_GROUP, MAX_CERTIFICATES_PER_GATEWAY, MAX_RULES_PER_GATEWAY,
};
use crate::crd::{
    LabelSelector, ListenerConfiguration, LoadBalancerConfiguration, LoadBalancerConfigurationSpec,
    TargetGroupConfiguration, TargetGroupConfigurationSpec, TargetGroupDefaults,
    WafV2Configuration,
};
use crate::labels::{
    ANNOTATION_CERTIFICATE_COUNT, ANNOTATION_LOADBALANCER_CONFIGURATION, ANNOTATION_RULE_COUNT,
    ANNOTATION_VISIBILITY, ANNOTATION_WAF_ARN, K8S_MANAGED_BY, MANAGED_BY_ALBY,
};
use crate::selector::matches_selector;
use anyhow::{Context as _, Result};
use gateway_api::apis::standard::gateways::{
    Gateway, GatewayInfrastructure, GatewayInfrastructureParametersRef, GatewayListeners,
    GatewayListenersTls, GatewayListenersTlsMode, GatewaySpec,
};
use kube::api::{ObjectMeta, PostParams};
use kube::{Api, Client, ResourceExt};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Metadata and capacity info for one pool gateway.
#[derive(Clone, Debug, Default)]
pub struct GatewayInfo {
    /// Gateway name (`gw-NN`)
    pub name: String,
    /// Namespace the gateway lives in
    pub namespace: String,
    /// `GatewayClass` the gateway is bound to
    pub gateway_class: String,
    /// `internet-facing` or `internal`
    pub visibility: String,
    /// WAFv2 WebACL ARN shared by the gateway, empty if none
    pub waf_arn: String,
    /// Certificates attached (annotation hint)
    pub certificate_count: usize,
    /// Listener rules in use (annotation hint)
    pub rule_count: usize,
    /// Gateway labels, for selector matching
    pub labels: BTreeMap<String, String>,
    /// ALB DNS name from status, empty until the LBC provisions it
    pub load_balancer_dns: String,
}

/// What a request needs from a gateway to be placed on it.
#[derive(Clone, Debug)]
pub struct PlacementRequest<'a> {
    /// Required `GatewayClass`
    pub gateway_class: &'a str,
    /// Required visibility
    pub visibility: &'a str,
    /// Required WAF selection (empty equals empty)
    pub waf_arn: &'a str,
    /// Optional label restriction on candidates
    pub selector: Option<&'a LabelSelector>,
}

/// Result of a placement attempt.
#[derive(Clone, Debug)]
pub enum PlacementOutcome {
    /// A pool member satisfies the placement predicate
    Assigned(GatewayInfo),
    /// No member fits and no selector forbids growing the pool
    MustCreate,
    /// No member matches the request's selector; selectors never authorize
    /// creating new gateways, so this is terminal until the spec changes
    SelectorUnsatisfiable,
}

/// Manages the gateway pool in a single namespace.
pub struct GatewayPool {
    client: Client,
    namespace: String,
    gateway_class: String,
    http_port: i32,
    https_port: i32,
}

impl GatewayPool {
    /// Create a pool manager.
    #[must_use]
    pub fn new(
        client: Client,
        namespace: String,
        gateway_class: String,
        http_port: i32,
        https_port: i32,
    ) -> Self {
        Self {
            client,
            namespace,
            gateway_class,
            http_port,
            https_port,
        }
    }

    /// Namespace the pool lives in.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// HTTP listener port stamped on created gateways.
    #[must_use]
    pub fn http_port(&self) -> i32 {
        self.http_port
    }

    /// HTTPS listener port stamped on created gateways.
    #[must_use]
    pub fn https_port(&self) -> i32 {
        self.https_port
    }

    /// Select a gateway for the request using first-fit over the name-sorted pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be listed.
    pub async fn select(&self, request: &PlacementRequest<'_>) -> Result<PlacementOutcome> {
        let api: Api<Gateway> = Api::namespaced(self.client.clone(), &self.namespace);
        let mut gateways = api
            .list(&Default::default())
            .await
            .context("failed to list gateway pool")?
            .items;

        // First-fit needs a stable order; names sort gw-01 < gw-02 < ...
        gateways.sort_by(|a, b| a.name_any().cmp(&b.name_any()));

        for gw in &gateways {
            let info = gateway_info(gw);

            if let Some(selector) = request.selector {
                if !matches_selector(selector, &info.labels) {
                    continue;
                }
            }

            if fits(&info, request) {
                return Ok(PlacementOutcome::Assigned(info));
            }
        }

        // Selectors constrain the user; they never authorize pool growth.
        if request.selector.is_some() {
            return Ok(PlacementOutcome::SelectorUnsatisfiable);
        }

        Ok(PlacementOutcome::MustCreate)
    }

    /// Compute the next free gateway index (`max + 1`, empty pool yields 1).
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be listed.
    pub async fn next_index(&self) -> Result<u32> {
        let api: Api<Gateway> = Api::namespaced(self.client.clone(), &self.namespace);
        let gateways = api
            .list(&Default::default())
            .await
            .context("failed to list gateway pool")?;

        let max = gateways
            .items
            .iter()
            .filter_map(|gw| parse_gateway_index(&gw.name_any()))
            .max()
            .unwrap_or(0);

        Ok(max + 1)
    }

    /// Create gateway `gw-<index>` with its configuration sidecars.
    ///
    /// The `LoadBalancerConfiguration` must exist before the gateway whose
    /// `infrastructure.parametersRef` names it, so sidecars are written first.
    /// Returns `None` when another reconcile won the create race; the caller
    /// yields and rediscovers the winner's gateway on the next pass.
    ///
    /// # Errors
    ///
    /// Returns an error if any create fails for a reason other than the race.
    pub async fn create_gateway(
        &self,
        visibility: &str,
        waf_arn: &str,
        index: u32,
    ) -> Result<Option<GatewayInfo>> {
        let name = format!("{GATEWAY_NAME_PREFIX}{index:02}");
        let config_name = lbconfig_name(&name);

        self.create_lbconfig_stub(&config_name, visibility, waf_arn)
            .await?;
        self.create_targetgroup_config(&name).await?;

        let gateway = self.build_gateway(&name, &config_name, visibility, waf_arn);
        let api: Api<Gateway> = Api::namespaced(self.client.clone(), &self.namespace);

        match api.create(&PostParams::default(), &gateway).await {
            Ok(created) => {
                info!(
                    gateway = %name,
                    namespace = %self.namespace,
                    visibility, "Created pool gateway"
                );
                crate::metrics::record_resource_created("gateway");
                Ok(Some(gateway_info(&created)))
            }
            Err(err) if is_already_exists(&err) => {
                warn!(
                    gateway = %name,
                    "Gateway already exists, yielding to the reconcile that created it"
                );
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("failed to create gateway {name}")),
        }
    }

    /// Update the certificate-count annotation on a pool gateway.
    ///
    /// The counter is a placement hint; writers race on it with optimistic
    /// concurrency and lost writes are corrected by the next reconcile, which
    /// recomputes the authoritative bundle from the live request list.
    ///
    /// # Errors
    ///
    /// Returns an error when the patch fails for a reason other than the
    /// gateway having disappeared.
    pub async fn update_certificate_count_hint(
        &self,
        gateway_name: &str,
        certificate_count: usize,
    ) -> Result<()> {
        let api: Api<Gateway> = Api::namespaced(self.client.clone(), &self.namespace);
        let patch = serde_json::json!({
            "metadata": {
                "annotations": {
                    ANNOTATION_CERTIFICATE_COUNT: certificate_count.to_string(),
                }
            }
        });

        match api
            .patch(
                gateway_name,
                &kube::api::PatchParams::default(),
                &kube::api::Patch::Merge(&patch),
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_not_found(&err) => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to update capacity hint on {gateway_name}")),
        }
    }

    /// Write the initial `LoadBalancerConfiguration` for a new gateway.
    ///
    /// Carries the scheme, an HTTP listener stub, and the WAF; the HTTPS
    /// listener appears once the first certificate lands via the synthesizer.
    async fn create_lbconfig_stub(
        &self,
        config_name: &str,
        visibility: &str,
        waf_arn: &str,
    ) -> Result<()> {
        let api: Api<LoadBalancerConfiguration> =
            Api::namespaced(self.client.clone(), &self.namespace);

        let config = LoadBalancerConfiguration {
            metadata: ObjectMeta {
                name: Some(config_name.to_string()),
                namespace: Some(self.namespace.clone()),
                labels: Some(managed_by_labels()),
                ..Default::default()
            },
            spec: LoadBalancerConfigurationSpec {
                scheme: Some(visibility.to_string()),
                listener_configurations: Some(vec![ListenerConfiguration {
                    protocol_port: format!("HTTP:{}", self.http_port),
                    default_certificate: None,
                    certificates: None,
                }]),
                waf_v2: (!waf_arn.is_empty()).then(|| WafV2Configuration {
                    web_acl: waf_arn.to_string(),
                }),
            },
        };

        match api.create(&PostParams::default(), &config).await {
            Ok(_) => {
                info!(config = config_name, "Created LoadBalancerConfiguration");
                crate::metrics::record_resource_created("loadbalancer_configuration");
                Ok(())
            }
            Err(err) if is_already_exists(&err) => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to create LoadBalancerConfiguration {config_name}")),
        }
    }

    /// Write the `TargetGroupConfiguration` so the ALB registers pod IPs
    /// directly, letting plain `ClusterIP` services back routes.
    async fn create_targetgroup_config(&self, gateway_name: &str) -> Result<()> {
        let config_name = tgconfig_name(gateway_name);
        let api: Api<TargetGroupConfiguration> =
            Api::namespaced(self.client.clone(), &self.namespace);

        let config = TargetGroupConfiguration {
            metadata: ObjectMeta {
                name: Some(config_name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(managed_by_labels()),
                ..Default::default()
            },
            spec: TargetGroupConfigurationSpec {
                default_configuration: Some(TargetGroupDefaults {
                    target_type: "ip".to_string(),
                }),
            },
        };

        match api.create(&PostParams::default(), &config).await {
            Ok(_) => {
                info!(config = %config_name, "Created TargetGroupConfiguration");
                Ok(())
            }
            Err(err) if is_already_exists(&err) => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to create TargetGroupConfiguration {config_name}")),
        }
    }

    fn build_gateway(
        &self,
        name: &str,
        config_name: &str,
        visibility: &str,
        waf_arn: &str,
    ) -> Gateway {
        let mut annotations = BTreeMap::new();
        annotations.insert(ANNOTATION_VISIBILITY.to_string(), visibility.to_string());
        annotations.insert(ANNOTATION_CERTIFICATE_COUNT.to_string(), "0".to_string());
        annotations.insert(ANNOTATION_RULE_COUNT.to_string(), "0".to_string());
        annotations.insert(
            ANNOTATION_LOADBALANCER_CONFIGURATION.to_string(),
            config_name.to_string(),
        );
        if !waf_arn.is_empty() {
            annotations.insert(ANNOTATION_WAF_ARN.to_string(), waf_arn.to_string());
        }

        // The HTTPS listener needs a TLS block to pass Gateway API validation;
        // actual certificates live in the LoadBalancerConfiguration.
        let tls_placeholder = GatewayListenersTls {
            mode: Some(GatewayListenersTlsMode::Terminate),
            options: Some(BTreeMap::from([(
                format!("{LBC_API_GROUP}/certificate-source"),
                "loadbalancer-configuration".to_string(),
            )])),
            ..Default::default()
        };

        Gateway {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(self.namespace.clone()),
                annotations: Some(annotations),
                labels: Some(managed_by_labels()),
                ..Default::default()
            },
            spec: GatewaySpec {
                gateway_class_name: self.gateway_class.clone(),
                infrastructure: Some(GatewayInfrastructure {
                    parameters_ref: Some(GatewayInfrastructureParametersRef {
                        group: LBC_API_GROUP.to_string(),
                        kind: "LoadBalancerConfiguration".to_string(),
                        name: config_name.to_string(),
                    }),
                    ..Default::default()
                }),
                listeners: vec![
                    GatewayListeners {
                        name: "https".to_string(),
                        port: self.https_port,
                        protocol: "HTTPS".to_string(),
                        tls: Some(tls_placeholder),
                        ..Default::default()
                    },
                    GatewayListeners {
                        name: "http".to_string(),
                        port: self.http_port,
                        protocol: "HTTP".to_string(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            status: None,
        }
    }
}

/// Extract pool metadata and capacity hints from a `Gateway`.
#[must_use]
pub fn gateway_info(gw: &Gateway) -> GatewayInfo {
    let annotations = gw.metadata.annotations.clone().unwrap_or_default();

    let load_balancer_dns = gw
        .status
        .as_ref()
        .and_then(|status| status.addresses.as_ref())
        .and_then(|addresses| {
            addresses
                .iter()
                .find(|addr| addr.r#type.as_deref() == Some("Hostname"))
        })
        .map(|addr| addr.value.clone())
        .unwrap_or_default();

    GatewayInfo {
        name: gw.name_any(),
        namespace: gw.namespace().unwrap_or_default(),
        gateway_class: gw.spec.gateway_class_name.clone(),
        visibility: annotations
            .get(ANNOTATION_VISIBILITY)
            .cloned()
            .unwrap_or_default(),
        waf_arn: annotations
            .get(ANNOTATION_WAF_ARN)
            .cloned()
            .unwrap_or_default(),
        certificate_count: annotations
            .get(ANNOTATION_CERTIFICATE_COUNT)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        rule_count: annotations
            .get(ANNOTATION_RULE_COUNT)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        labels: gw.metadata.labels.clone().unwrap_or_default(),
        load_balancer_dns,
    }
}

/// The placement predicate: class, visibility, and WAF homogeneity plus
/// remaining capacity. Selector matching happens in [`GatewayPool::select`]
/// because it also decides whether creation is allowed.
#[must_use]
pub fn fits(info: &GatewayInfo, request: &PlacementRequest<'_>) -> bool {
    info.gateway_class == request.gateway_class
        && info.visibility == request.visibility
        && info.waf_arn == request.waf_arn
        && info.certificate_count < MAX_CERTIFICATES_PER_GATEWAY
        && info.rule_count < MAX_RULES_PER_GATEWAY
}

/// Parse the numeric index out of a pool gateway name (`gw-07` → 7).
#[must_use]
pub fn parse_gateway_index(name: &str) -> Option<u32> {
    name.strip_prefix(GATEWAY_NAME_PREFIX)?.parse().ok()
}

/// Name of the `LoadBalancerConfiguration` paired with a gateway.
#[must_use]
pub fn lbconfig_name(gateway_name: &str) -> String {
    format!("{gateway_name}-config")
}

/// Name of the `TargetGroupConfiguration` paired with a gateway.
#[must_use]
pub fn tgconfig_name(gateway_name: &str) -> String {
    format!("{gateway_name}-tgconfig")
}

/// Whether a kube error is an already-exists conflict from a create race.
#[must_use]
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409)
}

/// Whether a kube error is a not-found.
#[must_use]
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

fn managed_by_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(K8S_MANAGED_BY.to_string(), MANAGED_BY_ALBY.to_string())])
}
