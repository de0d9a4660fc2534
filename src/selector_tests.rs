// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for gateway selector matching logic.

use super::*;
use crate::crd::{LabelSelector, LabelSelectorRequirement};
use std::collections::BTreeMap;

fn create_labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn test_empty_selector_matches_every_gateway() {
    let selector = LabelSelector {
        match_labels: None,
        match_expressions: None,
    };

    let labels = create_labels(&[("team", "payments"), ("tier", "edge")]);
    assert!(matches_selector(&selector, &labels));

    let empty_labels = BTreeMap::new();
    assert!(matches_selector(&selector, &empty_labels));
}

#[test]
fn test_match_labels_exact_match() {
    let selector = LabelSelector {
        match_labels: Some(create_labels(&[("team", "payments")])),
        match_expressions: None,
    };

    let labels = create_labels(&[("team", "payments"), ("tier", "edge")]);
    assert!(matches_selector(&selector, &labels));
}

#[test]
fn test_match_labels_missing_key() {
    let selector = LabelSelector {
        match_labels: Some(create_labels(&[("team", "payments")])),
        match_expressions: None,
    };

    let labels = create_labels(&[("tier", "edge")]);
    assert!(!matches_selector(&selector, &labels));
}

#[test]
fn test_match_labels_wrong_value() {
    let selector = LabelSelector {
        match_labels: Some(create_labels(&[("team", "payments")])),
        match_expressions: None,
    };

    let labels = create_labels(&[("team", "search")]);
    assert!(!matches_selector(&selector, &labels));
}

#[test]
fn test_match_expression_in_operator() {
    let selector = LabelSelector {
        match_labels: None,
        match_expressions: Some(vec![LabelSelectorRequirement {
            key: "tier".to_string(),
            operator: "In".to_string(),
            values: Some(vec!["edge".to_string(), "internal".to_string()]),
        }]),
    };

    assert!(matches_selector(&selector, &create_labels(&[("tier", "edge")])));
    assert!(!matches_selector(&selector, &create_labels(&[("tier", "batch")])));
    assert!(!matches_selector(&selector, &BTreeMap::new()));
}

#[test]
fn test_match_expression_not_in_operator() {
    let selector = LabelSelector {
        match_labels: None,
        match_expressions: Some(vec![LabelSelectorRequirement {
            key: "tier".to_string(),
            operator: "NotIn".to_string(),
            values: Some(vec!["batch".to_string()]),
        }]),
    };

    assert!(matches_selector(&selector, &create_labels(&[("tier", "edge")])));
    assert!(!matches_selector(&selector, &create_labels(&[("tier", "batch")])));
    // Missing label passes NotIn
    assert!(matches_selector(&selector, &BTreeMap::new()));
}

#[test]
fn test_match_expression_exists_operator() {
    let selector = LabelSelector {
        match_labels: None,
        match_expressions: Some(vec![LabelSelectorRequirement {
            key: "waf".to_string(),
            operator: "Exists".to_string(),
            values: None,
        }]),
    };

    assert!(matches_selector(&selector, &create_labels(&[("waf", "enabled")])));
    assert!(!matches_selector(&selector, &create_labels(&[("tier", "edge")])));
}

#[test]
fn test_match_expression_does_not_exist_operator() {
    let selector = LabelSelector {
        match_labels: None,
        match_expressions: Some(vec![LabelSelectorRequirement {
            key: "waf".to_string(),
            operator: "DoesNotExist".to_string(),
            values: None,
        }]),
    };

    assert!(matches_selector(&selector, &create_labels(&[("tier", "edge")])));
    assert!(!matches_selector(&selector, &create_labels(&[("waf", "enabled")])));
}

#[test]
fn test_unknown_operator_fails_closed() {
    let selector = LabelSelector {
        match_labels: None,
        match_expressions: Some(vec![LabelSelectorRequirement {
            key: "tier".to_string(),
            operator: "Near".to_string(),
            values: Some(vec!["edge".to_string()]),
        }]),
    };

    assert!(!matches_selector(&selector, &create_labels(&[("tier", "edge")])));
}

#[test]
fn test_combined_match_labels_and_expressions_are_anded() {
    let selector = LabelSelector {
        match_labels: Some(create_labels(&[("team", "payments")])),
        match_expressions: Some(vec![LabelSelectorRequirement {
            key: "tier".to_string(),
            operator: "In".to_string(),
            values: Some(vec!["edge".to_string()]),
        }]),
    };

    assert!(matches_selector(
        &selector,
        &create_labels(&[("team", "payments"), ("tier", "edge")])
    ));
    assert!(!matches_selector(
        &selector,
        &create_labels(&[("team", "payments"), ("tier", "batch")])
    ));
    assert!(!matches_selector(
        &selector,
        &create_labels(&[("team", "search"), ("tier", "edge")])
    ));
}
