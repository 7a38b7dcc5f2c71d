// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the vanity domain manager.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Application Constants
// ============================================================================

/// Application name used for labels, client names and field managers
pub const APP_NAME: &str = "vanity-domain-manager";

/// Human-readable NATS connection name
pub const NATS_CLIENT_NAME: &str = "Vanity Domain Verifier";

/// Environment value that enables development behavior (no NATS JWT auth)
pub const DEVELOPMENT_ENVIRONMENT: &str = "development";

// ============================================================================
// Queue Subject and Stream Constants
// ============================================================================

/// Subject segment shared by all queue subjects
pub const SUBJECT_SERVICE_SEGMENT: &str = "vanityDomainVerifier";

/// Subject segment for domain jobs
pub const SUBJECT_JOB_SEGMENT: &str = "domainjob";

/// Subject segment for status updates
pub const SUBJECT_STATUS_SEGMENT: &str = "status";

/// Wildcard token matching every remaining subject token
pub const SUBJECT_WILDCARD: &str = ">";

/// Stream name suffix for the job stream (prefixed with `{env}_`)
pub const JOB_STREAM_SUFFIX: &str = "vanitydomainverifier_jobs";

/// Stream name suffix for the status stream (prefixed with `{env}_`)
pub const STATUS_STREAM_SUFFIX: &str = "vanitydomainverifier_status";

/// Job stream description
pub const JOB_STREAM_DESCRIPTION: &str = "Job Queue for Vanity Domain Verifier";

/// Status stream description
pub const STATUS_STREAM_DESCRIPTION: &str =
    "Queue for Status Updates coming from Vanity Domain Verifier";

/// Maximum age of a stream message (7 days)
pub const STREAM_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// Maximum number of messages retained per stream
pub const STREAM_MAX_MESSAGES: i64 = 1_000_000_000;

/// Maximum size of a stream in bytes (4 MiB)
pub const STREAM_MAX_BYTES: i64 = 4 << 20;

/// Durable consumer name for the domain job worker
pub const JOB_CONSUMER_NAME: &str = "vanityDomainVerifier-domainjob-worker";

/// Durable consumer description
pub const JOB_CONSUMER_DESCRIPTION: &str = "The consumer for the vanityDomainVerifier";

/// NATS connection timeout (15 seconds)
pub const NATS_CONNECT_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// Delivery & Retry Constants
// ============================================================================

/// Maximum number of deliveries before a job is dropped
pub const MAX_DELIVERIES: u64 = 10;

/// Base delay for the first redelivery (30 seconds)
pub const BASE_RETRY_DELAY_SECS: u64 = 30;

/// Default number of deliveries processed concurrently by one worker
pub const DEFAULT_MAX_CONCURRENT_DELIVERIES: usize = 1;

// ============================================================================
// DNS Verification Constants
// ============================================================================

/// Maximum number of CNAME hops followed when resolving a canonical name
pub const MAX_CNAME_CHAIN_DEPTH: usize = 8;

// ============================================================================
// Kubernetes Resource Constants
// ============================================================================

/// Suffix appended to the resource name to build the TLS secret name
pub const TLS_SECRET_SUFFIX: &str = "-tls-cert";

/// Kubernetes secret type for TLS material
pub const SECRET_TYPE_TLS: &str = "kubernetes.io/tls";

/// Secret data key for the private key
pub const SECRET_KEY_TLS_KEY: &str = "tls.key";

/// Secret data key for the certificate
pub const SECRET_KEY_TLS_CERT: &str = "tls.crt";

/// Secret data key for the CA bundle (left empty)
pub const SECRET_KEY_CA_CERT: &str = "ca.crt";

/// Ingress path type for the vanity domain rule
pub const INGRESS_PATH_TYPE: &str = "ImplementationSpecific";

/// Ingress path for the vanity domain rule
pub const INGRESS_PATH: &str = "/";

/// Resource type label for TLS secrets (metrics and logs)
pub const RESOURCE_TLS_SECRET: &str = "Secret";

/// Resource type label for routing rules (metrics and logs)
pub const RESOURCE_ROUTE: &str = "Ingress";

// ============================================================================
// HTTP Router Constants
// ============================================================================

/// Default port for the HTTP ingestion router
pub const DEFAULT_ROUTER_PORT: u16 = 9595;

/// Bind address for the HTTP ingestion router
pub const ROUTER_BIND_ADDRESS: &str = "0.0.0.0";

/// Path for the health endpoint
pub const HEALTH_PATH: &str = "/health";

/// Path for the Prometheus metrics endpoint
pub const METRICS_PATH: &str = "/metrics";

/// Path for job submission
pub const JOBS_PATH: &str = "/v1/jobs";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
