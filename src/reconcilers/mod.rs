// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Job reconciliation pipeline.
//!
//! # Architecture
//!
//! A delivered job flows through three layers:
//!
//! 1. **Delivery** - [`DeliveryController`] parses the payload and decides ack, retry
//!    or drop from the processing outcome
//! 2. **Job** - [`JobProcessor`] validates the job, runs the verification pipeline and
//!    drives the environment
//! 3. **Environment** - [`EnvironmentReconciler`] writes the TLS secret and ingress
//!    through an [`EnvironmentController`](crate::environment::EnvironmentController)
//!
//! Only the delivery layer makes retry decisions; every other layer returns errors.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vanity_domain_manager::config::ClusterConfig;
//! use vanity_domain_manager::environment::KubeEnvironment;
//! use vanity_domain_manager::reconcilers::EnvironmentReconciler;
//! use vanity_domain_manager::jobs::VanityDomain;
//!
//! async fn route(client: kube::Client, cluster: ClusterConfig, domain: VanityDomain) {
//!     let env = Arc::new(KubeEnvironment::new(client, cluster.namespace.clone()));
//!     let reconciler = EnvironmentReconciler::new(env, cluster);
//!     reconciler.set_route(&domain).await.unwrap();
//! }
//! ```

pub mod delivery;
pub mod environment;
pub mod job;
pub mod resources;
pub mod retry;

pub use delivery::{DeliveryController, DeliveryState};
pub use environment::EnvironmentReconciler;
pub use job::JobProcessor;
pub use retry::{decide, retry_delay, DeliveryDecision};
