// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for the gateway hostname orchestrator.
//!
//! [`hostnamerequest`] owns the state machine; the sibling modules are the
//! subsystems it coordinates: the domain claim registry, the certificate
//! lifecycle, the `LoadBalancerConfiguration` synthesizer, the DNS alias
//! writer, the drift detector, and the route admission glue.

pub mod admission;
pub mod alias;
pub mod certificate;
pub mod claim;
pub mod drift;
pub mod events;
pub mod finalizers;
pub mod hostnamerequest;
pub mod lbconfig;
pub mod status;

pub use hostnamerequest::{reconcile_hostname_request, Context};
