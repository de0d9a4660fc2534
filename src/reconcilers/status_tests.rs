// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for condition set manipulation.

use super::*;

#[test]
fn test_set_condition_inserts_new_condition() {
    let mut conditions = Vec::new();

    set_condition(
        &mut conditions,
        "Claimed",
        "True",
        "Claimed",
        "Domain successfully claimed",
        Some(1),
    );

    assert_eq!(conditions.len(), 1);
    let condition = &conditions[0];
    assert_eq!(condition.r#type, "Claimed");
    assert_eq!(condition.status, "True");
    assert_eq!(condition.reason.as_deref(), Some("Claimed"));
    assert_eq!(condition.observed_generation, Some(1));
    assert!(condition.last_transition_time.is_some());
}

#[test]
fn test_set_condition_replaces_by_type() {
    let mut conditions = Vec::new();

    set_condition(&mut conditions, "Ready", "False", "Pending", "waiting", Some(1));
    set_condition(&mut conditions, "Ready", "True", "Ready", "done", Some(1));

    assert_eq!(conditions.len(), 1);
    assert_eq!(conditions[0].status, "True");
    assert_eq!(conditions[0].reason.as_deref(), Some("Ready"));
}

#[test]
fn test_set_condition_preserves_transition_time_when_status_unchanged() {
    let mut conditions = vec![Condition {
        r#type: "CertificateIssued".to_string(),
        status: "False".to_string(),
        reason: Some("PendingIssuance".to_string()),
        message: Some("waiting".to_string()),
        observed_generation: Some(1),
        last_transition_time: Some("2020-01-01T00:00:00+00:00".to_string()),
    }];

    // Same status value, new message: the transition time must not move.
    set_condition(
        &mut conditions,
        "CertificateIssued",
        "False",
        "PendingIssuance",
        "still waiting",
        Some(1),
    );

    assert_eq!(
        conditions[0].last_transition_time.as_deref(),
        Some("2020-01-01T00:00:00+00:00")
    );
    assert_eq!(conditions[0].message.as_deref(), Some("still waiting"));
}

#[test]
fn test_set_condition_resets_transition_time_on_status_flip() {
    let mut conditions = vec![Condition {
        r#type: "CertificateIssued".to_string(),
        status: "False".to_string(),
        reason: Some("PendingIssuance".to_string()),
        message: Some("waiting".to_string()),
        observed_generation: Some(1),
        last_transition_time: Some("2020-01-01T00:00:00+00:00".to_string()),
    }];

    set_condition(
        &mut conditions,
        "CertificateIssued",
        "True",
        "Issued",
        "issued",
        Some(1),
    );

    assert_ne!(
        conditions[0].last_transition_time.as_deref(),
        Some("2020-01-01T00:00:00+00:00")
    );
}

#[test]
fn test_is_condition_true() {
    let mut conditions = Vec::new();
    assert!(!is_condition_true(&conditions, "Claimed"));

    set_condition(&mut conditions, "Claimed", "False", "AlreadyClaimed", "no", None);
    assert!(!is_condition_true(&conditions, "Claimed"));

    set_condition(&mut conditions, "Claimed", "True", "Claimed", "yes", None);
    assert!(is_condition_true(&conditions, "Claimed"));
}

#[test]
fn test_remove_conditions_reopens_steps() {
    let mut conditions = Vec::new();
    for condition_type in ["Claimed", "CertificateIssued", "ListenerAttached", "Ready"] {
        set_condition(&mut conditions, condition_type, "True", "ok", "ok", Some(1));
    }

    remove_conditions(&mut conditions, &["ListenerAttached", "Ready"]);

    assert!(is_condition_true(&conditions, "Claimed"));
    assert!(is_condition_true(&conditions, "CertificateIssued"));
    assert!(find_condition(&conditions, "ListenerAttached").is_none());
    assert!(find_condition(&conditions, "Ready").is_none());
}
