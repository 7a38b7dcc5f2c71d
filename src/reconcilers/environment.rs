// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Environment Reconciler: idempotent create-or-update and delete of the TLS secret
//! and routing rule of one vanity domain.
//!
//! Writes are read-then-write. A get that fails with [`EnvironmentError::NotFound`]
//! leads to a create; a successful get leads to an update of the fetched object. Any
//! other get error is returned as is and never falls through to create, so an
//! authorization or transport failure is not mistaken for a missing object.
//!
//! Deletes treat not-found as success. Nothing here retries.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ClusterConfig;
use crate::constants::{RESOURCE_ROUTE, RESOURCE_TLS_SECRET};
use crate::environment::EnvironmentController;
use crate::errors::EnvironmentError;
use crate::jobs::VanityDomain;
use crate::metrics;
use crate::reconcilers::resources::{build_ingress, build_tls_secret, merge_ingress, merge_secret};

/// Drives the secret and ingress of a vanity domain to the desired state.
#[derive(Clone)]
pub struct EnvironmentReconciler {
    controller: Arc<dyn EnvironmentController>,
    cluster: ClusterConfig,
}

impl EnvironmentReconciler {
    /// Create a reconciler writing through `controller` with the cluster defaults in
    /// `cluster`.
    #[must_use]
    pub fn new(controller: Arc<dyn EnvironmentController>, cluster: ClusterConfig) -> Self {
        Self {
            controller,
            cluster,
        }
    }

    /// Create or update the TLS secret holding the caller-supplied material.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::MissingCertificate`] when the domain carries no
    /// material, or the controller error from the failing call.
    pub async fn set_tls(&self, domain: &VanityDomain) -> Result<(), EnvironmentError> {
        let material = domain.provided_certificate.as_ref().ok_or_else(|| {
            EnvironmentError::MissingCertificate {
                hostname: domain.vanity_domain.clone(),
            }
        })?;

        let desired = build_tls_secret(domain, material, &self.cluster.namespace);
        let name = domain.tls_secret_name();

        match self.controller.get_secret(&name).await {
            Ok(existing) => {
                debug!(name = %name, "TLS secret exists, updating");
                let result = self
                    .controller
                    .update_secret(&merge_secret(existing, desired))
                    .await;
                metrics::record_resource_operation(RESOURCE_TLS_SECRET, "update", result.is_ok());
                result?;
                info!(hostname = %domain.vanity_domain, name = %name, "Updated TLS secret");
            }
            Err(e) if e.is_not_found() => {
                debug!(name = %name, "TLS secret does not exist, creating");
                let result = self.controller.create_secret(&desired).await;
                metrics::record_resource_operation(RESOURCE_TLS_SECRET, "create", result.is_ok());
                result?;
                info!(hostname = %domain.vanity_domain, name = %name, "Created TLS secret");
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }

    /// Delete the TLS secret. A missing secret is not an error.
    ///
    /// # Errors
    ///
    /// Returns the controller error for any failure other than not-found.
    pub async fn unset_tls(&self, domain: &VanityDomain) -> Result<(), EnvironmentError> {
        let name = domain.tls_secret_name();

        match self.controller.delete_secret(&name).await {
            Ok(()) => {
                metrics::record_resource_operation(RESOURCE_TLS_SECRET, "delete", true);
                info!(hostname = %domain.vanity_domain, name = %name, "Deleted TLS secret");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(name = %name, "TLS secret already absent");
                Ok(())
            }
            Err(e) => {
                metrics::record_resource_operation(RESOURCE_TLS_SECRET, "delete", false);
                Err(e)
            }
        }
    }

    /// Create or update the routing rule for the domain.
    ///
    /// # Errors
    ///
    /// Returns the controller error from the failing call.
    pub async fn set_route(&self, domain: &VanityDomain) -> Result<(), EnvironmentError> {
        let desired = build_ingress(domain, &self.cluster);
        let name = domain.resource_name();

        match self.controller.get_route(&name).await {
            Ok(existing) => {
                debug!(name = %name, "Ingress exists, updating");
                let result = self
                    .controller
                    .update_route(&merge_ingress(existing, desired))
                    .await;
                metrics::record_resource_operation(RESOURCE_ROUTE, "update", result.is_ok());
                result?;
                info!(hostname = %domain.vanity_domain, name = %name, "Updated ingress");
            }
            Err(e) if e.is_not_found() => {
                debug!(name = %name, "Ingress does not exist, creating");
                let result = self.controller.create_route(&desired).await;
                metrics::record_resource_operation(RESOURCE_ROUTE, "create", result.is_ok());
                result?;
                info!(hostname = %domain.vanity_domain, name = %name, "Created ingress");
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }

    /// Delete the routing rule. A missing rule is not an error.
    ///
    /// # Errors
    ///
    /// Returns the controller error for any failure other than not-found.
    pub async fn unset_route(&self, domain: &VanityDomain) -> Result<(), EnvironmentError> {
        let name = domain.resource_name();

        match self.controller.delete_route(&name).await {
            Ok(()) => {
                metrics::record_resource_operation(RESOURCE_ROUTE, "delete", true);
                info!(hostname = %domain.vanity_domain, name = %name, "Deleted ingress");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(name = %name, "Ingress already absent");
                Ok(())
            }
            Err(e) => {
                metrics::record_resource_operation(RESOURCE_ROUTE, "delete", false);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod environment_tests;
