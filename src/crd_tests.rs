// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for CRD serialization and wire format.
//!
//! The serialized shapes are contracts with kubectl users and with the AWS
//! Load Balancer Controller, so field names are asserted against literal JSON.

#[cfg(test)]
mod tests {
    use crate::crd::*;
    use serde_json::json;

    fn minimal_spec() -> HostnameRequestSpec {
        HostnameRequestSpec {
            zone_id: "Z1".to_string(),
            hostname: "api.example.com".to_string(),
            environment: None,
            visibility: None,
            gateway_class: None,
            gateway_selector: None,
            waf_arn: None,
        }
    }

    #[test]
    fn test_hostname_request_spec_camel_case_wire_format() {
        let spec = HostnameRequestSpec {
            environment: Some("prod".to_string()),
            visibility: Some("internal".to_string()),
            gateway_class: Some("aws-alb".to_string()),
            waf_arn: Some("arn:aws:wafv2:us-east-1:123456789012:regional/webacl/x".to_string()),
            ..minimal_spec()
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["zoneId"], "Z1");
        assert_eq!(value["hostname"], "api.example.com");
        assert_eq!(value["environment"], "prod");
        assert_eq!(value["visibility"], "internal");
        assert_eq!(value["gatewayClass"], "aws-alb");
        assert_eq!(
            value["wafArn"],
            "arn:aws:wafv2:us-east-1:123456789012:regional/webacl/x"
        );
    }

    #[test]
    fn test_hostname_request_spec_omits_unset_optionals() {
        let value = serde_json::to_value(minimal_spec()).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("environment"));
        assert!(!object.contains_key("visibility"));
        assert!(!object.contains_key("gatewayClass"));
        assert!(!object.contains_key("gatewaySelector"));
        assert!(!object.contains_key("wafArn"));
    }

    #[test]
    fn test_hostname_request_status_serializes_cleared_fields() {
        // Status writes are merge patches; empty fields must serialize so a
        // drift reset actually clears the stored values.
        let status = HostnameRequestStatus::default();
        let value = serde_json::to_value(&status).unwrap();

        assert_eq!(value["certificateId"], "");
        assert_eq!(value["assignedGateway"], "");
        assert_eq!(value["assignedLoadBalancer"], "");
        assert_eq!(value["observedSpecHash"], "");
        assert_eq!(value["observedGeneration"], json!(null));
        assert_eq!(value["conditions"], json!([]));
    }

    #[test]
    fn test_hostname_request_status_round_trip() {
        let status = HostnameRequestStatus {
            observed_generation: Some(3),
            observed_spec_hash: "a1b2c3d4e5f60718".to_string(),
            certificate_id: "arn:aws:acm:us-east-1:123456789012:certificate/abc".to_string(),
            assigned_gateway: "gw-01".to_string(),
            assigned_gateway_namespace: "edge".to_string(),
            assigned_load_balancer: "k8s-edge-gw01-abc.us-east-1.elb.amazonaws.com".to_string(),
            conditions: vec![Condition {
                r#type: "Ready".to_string(),
                status: "True".to_string(),
                reason: Some("Ready".to_string()),
                message: Some("Hostname request fully provisioned".to_string()),
                observed_generation: Some(3),
                last_transition_time: Some("2025-06-01T12:00:00Z".to_string()),
            }],
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["assignedGateway"], "gw-01");
        assert_eq!(value["observedSpecHash"], "a1b2c3d4e5f60718");

        let back: HostnameRequestStatus = serde_json::from_value(value).unwrap();
        assert_eq!(back.assigned_gateway, "gw-01");
        assert_eq!(back.conditions.len(), 1);
        assert_eq!(back.conditions[0].r#type, "Ready");
    }

    #[test]
    fn test_domain_claim_owner_ref_wire_format() {
        let spec = DomainClaimSpec {
            zone_id: "Z1".to_string(),
            hostname: "*.example.com".to_string(),
            owner_ref: DomainClaimOwnerRef {
                namespace: "team-a".to_string(),
                name: "wildcard-example".to_string(),
                uid: "0000-1111".to_string(),
            },
        };

        let value = serde_json::to_value(&spec).unwrap();
        // Hostname is stored verbatim; only the claim *name* sanitizes wildcards.
        assert_eq!(value["hostname"], "*.example.com");
        assert_eq!(value["ownerRef"]["namespace"], "team-a");
        assert_eq!(value["ownerRef"]["uid"], "0000-1111");
    }

    #[test]
    fn test_loadbalancer_configuration_wire_format() {
        let spec = LoadBalancerConfigurationSpec {
            scheme: Some("internet-facing".to_string()),
            listener_configurations: Some(vec![
                ListenerConfiguration {
                    protocol_port: "HTTPS:443".to_string(),
                    default_certificate: Some("arn:a".to_string()),
                    certificates: Some(vec!["arn:b".to_string()]),
                },
                ListenerConfiguration {
                    protocol_port: "HTTP:80".to_string(),
                    default_certificate: None,
                    certificates: None,
                },
            ]),
            waf_v2: Some(WafV2Configuration {
                web_acl: "arn:aws:wafv2:us-east-1:123456789012:regional/webacl/x".to_string(),
            }),
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["scheme"], "internet-facing");
        assert_eq!(
            value["listenerConfigurations"][0]["protocolPort"],
            "HTTPS:443"
        );
        assert_eq!(
            value["listenerConfigurations"][0]["defaultCertificate"],
            "arn:a"
        );
        assert_eq!(value["listenerConfigurations"][1]["protocolPort"], "HTTP:80");
        // The LBC expects the exact key "webACL", not camelCase "webAcl".
        assert_eq!(
            value["wafV2"]["webACL"],
            "arn:aws:wafv2:us-east-1:123456789012:regional/webacl/x"
        );
    }

    #[test]
    fn test_http_listener_omits_certificate_fields() {
        let listener = ListenerConfiguration {
            protocol_port: "HTTP:80".to_string(),
            default_certificate: None,
            certificates: None,
        };

        let value = serde_json::to_value(&listener).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("defaultCertificate"));
        assert!(!object.contains_key("certificates"));
    }

    #[test]
    fn test_target_group_configuration_wire_format() {
        let spec = TargetGroupConfigurationSpec {
            default_configuration: Some(TargetGroupDefaults {
                target_type: "ip".to_string(),
            }),
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["defaultConfiguration"]["targetType"], "ip");
    }

    #[test]
    fn test_condition_optional_fields_omitted() {
        let condition = Condition {
            r#type: "Claimed".to_string(),
            status: "True".to_string(),
            reason: None,
            message: None,
            observed_generation: None,
            last_transition_time: None,
        };

        let value = serde_json::to_value(&condition).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2, "only type and status should serialize");
    }
}
