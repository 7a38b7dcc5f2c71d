// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Durable queue seams and naming.
//!
//! The pipeline depends on three small traits instead of a concrete transport:
//!
//! - [`MessagePublisher`] publishes a payload to a subject and waits for the stream's
//!   acknowledgment
//! - [`Delivery`] is one delivered message with its delivery count and ack/nak
//! - [`JobQueue`] enqueues a [`DomainJob`] for the HTTP ingestion layer
//!
//! [`Subjects`] derives every stream name and subject from the environment name. The
//! NATS JetStream implementation lives in [`nats`].

pub mod nats;

use async_trait::async_trait;
use std::time::Duration;

use crate::constants::{
    JOB_STREAM_SUFFIX, STATUS_STREAM_SUFFIX, SUBJECT_JOB_SEGMENT, SUBJECT_SERVICE_SEGMENT,
    SUBJECT_STATUS_SEGMENT, SUBJECT_WILDCARD,
};
use crate::errors::QueueError;
use crate::jobs::DomainJob;

/// Publishes payloads to durable subjects.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish `payload` to `subject`, returning once the stream has stored it.
    async fn publish(&self, subject: String, payload: Vec<u8>) -> Result<(), QueueError>;
}

/// One message delivered by the durable consumer.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Subject the message was published to.
    fn subject(&self) -> &str;

    /// Raw message payload.
    fn payload(&self) -> &[u8];

    /// How many times the transport has delivered this message, starting at 1.
    fn delivery_count(&self) -> Result<u64, QueueError>;

    /// Acknowledge the message, removing it from the stream.
    async fn ack(&self) -> Result<(), QueueError>;

    /// Negatively acknowledge the message and ask for redelivery after `delay`.
    async fn nak_with_delay(&self, delay: Duration) -> Result<(), QueueError>;
}

/// Enqueues domain jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Publish `job` on the job stream. The outcome arrives later on the status stream.
    async fn add_domain_job(&self, job: &DomainJob) -> Result<(), QueueError>;
}

/// Stream names and subjects scoped to one environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subjects {
    environment: String,
}

impl Subjects {
    /// Naming for `environment` (e.g., `production`).
    #[must_use]
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
        }
    }

    /// Environment the names are scoped to.
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// `{env}.vanityDomainVerifier.domainjob.{token}`
    #[must_use]
    pub fn job_subject(&self, token: &str) -> String {
        format!(
            "{}.{SUBJECT_SERVICE_SEGMENT}.{SUBJECT_JOB_SEGMENT}.{token}",
            self.environment
        )
    }

    /// `{env}.vanityDomainVerifier.status.{token}`
    #[must_use]
    pub fn status_subject(&self, token: &str) -> String {
        format!(
            "{}.{SUBJECT_SERVICE_SEGMENT}.{SUBJECT_STATUS_SEGMENT}.{token}",
            self.environment
        )
    }

    /// Subject filter matching every job subject.
    #[must_use]
    pub fn job_filter(&self) -> String {
        self.job_subject(SUBJECT_WILDCARD)
    }

    /// Subject filter matching every status subject.
    #[must_use]
    pub fn status_filter(&self) -> String {
        self.status_subject(SUBJECT_WILDCARD)
    }

    /// `{env}_vanitydomainverifier_jobs`
    #[must_use]
    pub fn job_stream(&self) -> String {
        format!("{}_{JOB_STREAM_SUFFIX}", self.environment)
    }

    /// `{env}_vanitydomainverifier_status`
    #[must_use]
    pub fn status_stream(&self) -> String {
        format!("{}_{STATUS_STREAM_SUFFIX}", self.environment)
    }
}
