// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Job State Machine: per-job orchestration of verification and reconciliation.
//!
//! # Add / Change
//!
//! 1. Validate the job shape (no network call)
//! 2. Verify DNS ownership; a failure aborts before anything is written
//! 3. Validate the supplied certificate, if any; a failure aborts before the secret
//!    is written
//! 4. Write the TLS secret (only with a supplied certificate), then the ingress that
//!    references it
//! 5. Publish the success status
//!
//! # Remove
//!
//! Delete the TLS secret, then the ingress, then publish the success status. No
//! verification runs.
//!
//! Every failure is returned as a [`JobError`]; retry and drop decisions belong to the
//! delivery controller.

use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tracing::{debug, info};

use crate::errors::{EnvironmentError, JobError};
use crate::jobs::{JobKind, VanityDomain};
use crate::metrics;
use crate::reconcilers::environment::EnvironmentReconciler;
use crate::status::StatusPublisher;
use crate::verifiers::{validate_certificate, verify_dns, ChainVerifier, NameResolver};

/// Processes one job end to end.
#[derive(Clone)]
pub struct JobProcessor {
    resolver: Arc<dyn NameResolver>,
    verifier: Arc<dyn ChainVerifier>,
    reconciler: EnvironmentReconciler,
    status: StatusPublisher,
    clock: fn() -> SystemTime,
}

impl JobProcessor {
    #[must_use]
    pub fn new(
        resolver: Arc<dyn NameResolver>,
        verifier: Arc<dyn ChainVerifier>,
        reconciler: EnvironmentReconciler,
        status: StatusPublisher,
    ) -> Self {
        Self {
            resolver,
            verifier,
            reconciler,
            status,
            clock: SystemTime::now,
        }
    }

    /// Replace the clock used for certificate validity checks.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> SystemTime) -> Self {
        self.clock = clock;
        self
    }

    /// Process `domain` according to `kind`, publishing a success status at the end.
    ///
    /// # Errors
    ///
    /// Returns the first failing step as a [`JobError`].
    pub async fn process(
        &self,
        reference_id: &str,
        domain: &VanityDomain,
        kind: JobKind,
    ) -> Result<(), JobError> {
        let start = Instant::now();

        let result = match kind {
            JobKind::Add | JobKind::Change => self.configure(domain).await,
            JobKind::Remove => self.remove(domain).await,
        };
        let result = match result {
            Ok(()) => self.status.send_success(reference_id).await.map_err(|source| {
                JobError::StatusPublish {
                    reference_id: reference_id.to_string(),
                    source,
                }
            }),
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => metrics::record_job_success(kind.as_str(), start.elapsed()),
            Err(e) => metrics::record_job_failure(kind.as_str(), e.category(), start.elapsed()),
        }

        result
    }

    async fn configure(&self, domain: &VanityDomain) -> Result<(), JobError> {
        let hostname = domain.vanity_domain.as_str();
        info!(hostname = %hostname, "Configuring vanity domain");

        validate_job(domain)?;

        verify_dns(self.resolver.as_ref(), domain)
            .await
            .map_err(|source| JobError::DnsVerification {
                hostname: hostname.to_string(),
                source,
            })?;
        info!(hostname = %hostname, "Vanity domain verified");

        if domain.has_provided_certificate() {
            validate_certificate(domain, self.verifier.as_ref(), (self.clock)()).map_err(
                |source| JobError::CertificateValidation {
                    hostname: hostname.to_string(),
                    source,
                },
            )?;
            debug!(hostname = %hostname, "Provided certificate validated");

            self.reconciler
                .set_tls(domain)
                .await
                .map_err(|source| reconciliation_error("set TLS", hostname, source))?;
        }

        self.reconciler
            .set_route(domain)
            .await
            .map_err(|source| reconciliation_error("set custom domain", hostname, source))?;

        info!(hostname = %hostname, "Vanity domain set in environment");
        Ok(())
    }

    async fn remove(&self, domain: &VanityDomain) -> Result<(), JobError> {
        let hostname = domain.vanity_domain.as_str();
        info!(hostname = %hostname, "Removing vanity domain");

        self.reconciler
            .unset_tls(domain)
            .await
            .map_err(|source| reconciliation_error("remove TLS", hostname, source))?;

        self.reconciler
            .unset_route(domain)
            .await
            .map_err(|source| reconciliation_error("remove vanity domain", hostname, source))?;

        info!(hostname = %hostname, "Vanity domain removed from environment");
        Ok(())
    }
}

/// Reject a job that cannot be verified.
///
/// # Errors
///
/// Returns [`JobError::Validation`] when the hostname or target type is empty, or when
/// neither target field is populated.
pub fn validate_job(domain: &VanityDomain) -> Result<(), JobError> {
    let reason = if domain.vanity_domain.is_empty() {
        Some("hostname is empty")
    } else if domain.desired_dns_target_type.is_empty() {
        Some("DNS target type is empty")
    } else if domain.desired_cname_target.is_empty() && domain.desired_a_record_targets.is_empty()
    {
        Some("no DNS target was provided")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(JobError::Validation {
            hostname: domain.vanity_domain.clone(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

fn reconciliation_error(step: &str, hostname: &str, source: EnvironmentError) -> JobError {
    JobError::Reconciliation {
        step: step.to_string(),
        hostname: hostname.to_string(),
        source,
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod job_tests;
