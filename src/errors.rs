// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the job reconciliation pipeline.
//!
//! This module provides specialized error types for:
//! - DNS ownership verification and certificate validation
//! - Environment Controller (cluster API) operations
//! - Durable queue operations (publish, ack, nak, stream setup)
//! - Per-job processing, which wraps all of the above
//!
//! Components return these errors instead of retrying. The `Display` text of a
//! [`JobError`] becomes the `errorMessage` of the status published for the job.

use thiserror::Error;

/// Errors produced by the verification pipeline.
///
/// Every variant is retried by the delivery controller, since the underlying condition
/// (DNS propagation, certificate rollout) may resolve on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Resolution failed or returned no records
    #[error("DNS lookup for '{hostname}' failed: {reason}")]
    DnsLookupFailed {
        /// The hostname that was looked up
        hostname: String,
        /// Resolver error or a note about the empty answer
        reason: String,
    },

    /// Resolution succeeded but the live records do not match the desired targets
    #[error("Incorrect {record_type} value for '{hostname}': {found}, expected {expected}")]
    DnsMismatch {
        /// The hostname that was looked up
        hostname: String,
        /// `CNAME` or `A`
        record_type: String,
        /// The offending value returned by the resolver
        found: String,
        /// What the job asked for
        expected: String,
    },

    /// The job asked for a DNS target type this system cannot verify
    #[error("Unsupported DNS target type: '{target_type}'")]
    UnsupportedTargetType {
        /// The target type as supplied
        target_type: String,
    },

    /// The certificate text did not contain a decodable PEM block
    #[error("Failed to decode PEM block: {reason}")]
    PemDecodeFailed {
        /// Why decoding failed
        reason: String,
    },

    /// The PEM block was not a valid X.509 certificate
    #[error("Failed to parse certificate: {reason}")]
    ParseFailed {
        /// Parser error
        reason: String,
    },

    /// The current time is before the certificate's not-before
    #[error("Certificate is not yet valid (not before {not_before})")]
    NotYetValid {
        /// The certificate's not-before timestamp
        not_before: String,
    },

    /// The current time is after the certificate's not-after
    #[error("Certificate has expired (not after {not_after})")]
    Expired {
        /// The certificate's not-after timestamp
        not_after: String,
    },

    /// The chain does not lead to a trusted root or lacks server authentication usage
    #[error("Certificate verification failed: {reason}")]
    UntrustedChain {
        /// Verifier error
        reason: String,
    },

    /// The certificate is valid but not for this hostname
    #[error("Certificate is not valid for '{hostname}': {reason}")]
    HostnameMismatch {
        /// The vanity hostname
        hostname: String,
        /// Verifier error
        reason: String,
    },
}

/// Errors returned by the Environment Controller.
///
/// [`EnvironmentError::NotFound`] is distinguishable from every other failure so the
/// reconciler can choose between create and update, and treat deletes as idempotent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    /// The resource does not exist
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Resource kind (e.g., `Secret`, `Ingress`)
        kind: String,
        /// Resource name
        name: String,
    },

    /// Any other API failure (authorization, transport, validation, conflict)
    #[error("Failed to {operation} {kind} '{name}': {reason}")]
    Api {
        /// The attempted operation (`get`, `create`, `update`, `delete`)
        operation: String,
        /// Resource kind
        kind: String,
        /// Resource name
        name: String,
        /// API error text, verbatim
        reason: String,
    },

    /// `set_tls` was called for a domain without caller-supplied certificate material
    #[error("No certificate was provided for '{hostname}'")]
    MissingCertificate {
        /// The vanity hostname
        hostname: String,
    },
}

impl EnvironmentError {
    /// Returns `true` for [`EnvironmentError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors from the durable queue transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Could not connect to the queue server
    #[error("Failed to connect to queue at {url}: {reason}")]
    Connect {
        /// Server URL
        url: String,
        /// Transport error
        reason: String,
    },

    /// Could not create or look up a stream
    #[error("Failed to ensure stream '{stream}': {reason}")]
    Stream {
        /// Stream name
        stream: String,
        /// Transport error
        reason: String,
    },

    /// Could not create or look up the durable consumer
    #[error("Failed to ensure consumer '{consumer}': {reason}")]
    Consumer {
        /// Consumer name
        consumer: String,
        /// Transport error
        reason: String,
    },

    /// A message could not be serialized
    #[error("Failed to serialize message for {subject}: {reason}")]
    Serialize {
        /// Destination subject
        subject: String,
        /// Serializer error
        reason: String,
    },

    /// A publish was rejected or not acknowledged by the stream
    #[error("Failed to publish to {subject}: {reason}")]
    Publish {
        /// Destination subject
        subject: String,
        /// Transport error
        reason: String,
    },

    /// Delivery metadata (delivery count) could not be read
    #[error("Failed to read delivery metadata for {subject}: {reason}")]
    Metadata {
        /// Delivery subject
        subject: String,
        /// Transport error
        reason: String,
    },

    /// An acknowledgment could not be sent
    #[error("Failed to acknowledge delivery on {subject}: {reason}")]
    Ack {
        /// Delivery subject
        subject: String,
        /// Transport error
        reason: String,
    },

    /// A negative acknowledgment could not be sent
    #[error("Failed to schedule redelivery on {subject}: {reason}")]
    Nak {
        /// Delivery subject
        subject: String,
        /// Transport error
        reason: String,
    },
}

/// Errors that abort processing of a single job.
///
/// The delivery controller decides what to do with them; this type only describes
/// what went wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job is structurally invalid
    #[error("Invalid job data for vanity domain '{hostname}': {reason}")]
    Validation {
        /// The vanity hostname (may be empty)
        hostname: String,
        /// What is missing
        reason: String,
    },

    /// DNS ownership could not be proven
    #[error("Domain verification failed for {hostname}: {source}")]
    DnsVerification {
        /// The vanity hostname
        hostname: String,
        /// Underlying verification error
        source: VerificationError,
    },

    /// The supplied certificate is unusable
    #[error("TLS certificate validation failed for {hostname}: {source}")]
    CertificateValidation {
        /// The vanity hostname
        hostname: String,
        /// Underlying verification error
        source: VerificationError,
    },

    /// The environment could not be driven to the desired state
    #[error("Failed to {step} for {hostname}: {source}")]
    Reconciliation {
        /// Which reconciliation step failed (e.g., `set TLS`)
        step: String,
        /// The vanity hostname
        hostname: String,
        /// Underlying environment error
        source: EnvironmentError,
    },

    /// The success status could not be published
    #[error("Failed to send status update for {reference_id}: {source}")]
    StatusPublish {
        /// The job's reference id
        reference_id: String,
        /// Underlying queue error
        source: QueueError,
    },
}

impl JobError {
    /// Stable category label for logs and metrics.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::DnsVerification { .. } | Self::CertificateValidation { .. } => "verification",
            Self::Reconciliation { .. } => "reconciliation",
            Self::StatusPublish { .. } => "status_publish",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
