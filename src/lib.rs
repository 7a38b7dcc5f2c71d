// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Vanity Domain Manager
//!
//! Vanity Domain Manager consumes domain jobs from a NATS JetStream work queue, verifies
//! that each vanity hostname is delegated to the platform, and provisions the matching
//! TLS secret and ingress route on Kubernetes.
//!
//! ## Overview
//!
//! For every `add` or `change` job the pipeline:
//!
//! 1. checks that DNS for the hostname points at the desired CNAME or A targets
//! 2. validates a caller-supplied certificate bundle when one is present
//! 3. writes the TLS secret, then the ingress route
//!
//! `remove` jobs delete the secret and then the route. Every outcome is published as a
//! [`JobStatus`](jobs::JobStatus) on the status stream for the job's reference id.
//! Failures are redelivered with exponential backoff until the delivery limit is reached.
//!
//! ## Modules
//!
//! - [`jobs`] - job and status payloads
//! - [`verifiers`] - DNS and certificate checks
//! - [`environment`] - Kubernetes secret and ingress access
//! - [`reconcilers`] - job processing, environment writes and retry decisions
//! - [`queue`] - queue seams and the NATS JetStream adapter
//! - [`status`] - status publishing
//! - [`router`] - HTTP ingestion
//! - [`config`] - YAML configuration
//!
//! ## Example
//!
//! ```rust
//! use vanity_domain_manager::jobs::DomainJob;
//!
//! let job: DomainJob = serde_json::from_str(r#"{
//!     "type": "add",
//!     "referenceId": "req-1",
//!     "domain": {
//!         "vanityDomain": "shop.example.com",
//!         "desiredDnsTargetType": "CNAME",
//!         "desiredCNAME": "lb.vendor.net"
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(job.domain.resource_name(), "shop-example-com");
//! ```

pub mod config;
pub mod constants;
pub mod environment;
pub mod errors;
pub mod jobs;
pub mod labels;
pub mod metrics;
pub mod queue;
pub mod reconcilers;
pub mod router;
pub mod status;
pub mod verifiers;

#[cfg(test)]
pub(crate) mod test_support;
