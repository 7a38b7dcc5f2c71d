// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! NATS JetStream transport.
//!
//! [`QueueManager`] owns the JetStream context. On startup it ensures both work-queue
//! streams exist (the queue topology), then runs the durable domain job consumer.

use async_nats::jetstream::consumer::{pull, AckPolicy};
use async_nats::jetstream::stream::{self, RetentionPolicy};
use async_nats::jetstream::{self, AckKind};
use async_nats::{ConnectOptions, Event};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::{
    JOB_CONSUMER_DESCRIPTION, JOB_CONSUMER_NAME, JOB_STREAM_DESCRIPTION, MAX_DELIVERIES,
    NATS_CLIENT_NAME, NATS_CONNECT_TIMEOUT_SECS, STATUS_STREAM_DESCRIPTION, STREAM_MAX_AGE_SECS,
    STREAM_MAX_BYTES, STREAM_MAX_MESSAGES,
};
use crate::errors::QueueError;
use crate::jobs::DomainJob;
use crate::queue::{Delivery, JobQueue, MessagePublisher, Subjects};
use crate::reconcilers::DeliveryController;

/// Connection to NATS JetStream with the job and status streams in place.
#[derive(Clone)]
pub struct QueueManager {
    jetstream: jetstream::Context,
    job_stream: stream::Stream,
    subjects: Subjects,
}

impl QueueManager {
    /// Connect to NATS and ensure both streams exist.
    ///
    /// Outside the development environment the connection authenticates with the
    /// configured user JWT, signing the server nonce with the NKey seed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Connect`] when the seed is invalid or the connection fails,
    /// or [`QueueError::Stream`] when a stream cannot be ensured.
    pub async fn start(config: &Config) -> Result<Self, QueueError> {
        let url = config.nats.connection_string.clone();
        info!(url = %url, "Connecting to NATS");

        let mut options = ConnectOptions::new()
            .name(NATS_CLIENT_NAME)
            .retry_on_initial_connect()
            .max_reconnects(None::<usize>)
            .connection_timeout(Duration::from_secs(NATS_CONNECT_TIMEOUT_SECS))
            .event_callback(|event| async move {
                match event {
                    Event::Connected => info!("NATS has successfully connected"),
                    Event::Disconnected => warn!("NATS is disconnected"),
                    Event::Closed => info!("NATS connection closed"),
                    other => debug!(event = %other, "NATS connection event"),
                }
            });

        if !config.is_development() {
            info!("Using NATS JWT authentication");
            let key_pair = std::sync::Arc::new(
                nkeys::KeyPair::from_seed(&config.nats.seed).map_err(|e| QueueError::Connect {
                    url: url.clone(),
                    reason: format!("invalid nkey seed: {e}"),
                })?,
            );
            options = options.jwt(config.nats.jwt.clone(), move |nonce| {
                let key_pair = key_pair.clone();
                async move { key_pair.sign(&nonce).map_err(async_nats::AuthError::new) }
            });
        }

        let client = options
            .connect(url.as_str())
            .await
            .map_err(|e| QueueError::Connect {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let subjects = Subjects::new(config.system.environment.clone());
        let jetstream = jetstream::new(client);
        let job_stream = ensure_streams(&jetstream, &subjects).await?;

        Ok(Self {
            jetstream,
            job_stream,
            subjects,
        })
    }

    /// Naming used by this manager.
    #[must_use]
    pub fn subjects(&self) -> &Subjects {
        &self.subjects
    }

    /// Consume domain jobs until the message stream ends.
    ///
    /// Up to `max_concurrent` deliveries are handled at the same time.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Consumer`] when the consumer cannot be created or its
    /// message stream cannot be opened.
    pub async fn start_domain_job_worker(
        &self,
        controller: DeliveryController,
        max_concurrent: usize,
    ) -> Result<(), QueueError> {
        info!(consumer = JOB_CONSUMER_NAME, max_concurrent, "Starting domain job worker");

        let consumer_error = |e: &dyn std::fmt::Display| QueueError::Consumer {
            consumer: JOB_CONSUMER_NAME.to_string(),
            reason: e.to_string(),
        };

        let consumer = self
            .job_stream
            .get_or_create_consumer(JOB_CONSUMER_NAME, job_consumer_config(&self.subjects))
            .await
            .map_err(|e| consumer_error(&e))?;

        let messages = consumer.messages().await.map_err(|e| consumer_error(&e))?;

        messages
            .for_each_concurrent(max_concurrent, |message| {
                let controller = &controller;
                async move {
                    match message {
                        Ok(message) => {
                            controller.handle(&NatsDelivery::new(message)).await;
                        }
                        Err(e) => warn!(error = %e, "Failed to receive delivery"),
                    }
                }
            })
            .await;

        warn!(consumer = JOB_CONSUMER_NAME, "Domain job message stream ended");
        Ok(())
    }
}

/// Ensure the status and job streams exist, returning the job stream.
///
/// # Errors
///
/// Returns [`QueueError::Stream`] naming the stream that failed.
pub async fn ensure_streams(
    jetstream: &jetstream::Context,
    subjects: &Subjects,
) -> Result<stream::Stream, QueueError> {
    for config in [status_stream_config(subjects), job_stream_config(subjects)] {
        let name = config.name.clone();
        jetstream
            .get_or_create_stream(config)
            .await
            .map_err(|e| QueueError::Stream {
                stream: name.clone(),
                reason: e.to_string(),
            })?;
        info!(stream = %name, "Stream ready");
    }

    let name = subjects.job_stream();
    jetstream
        .get_stream(&name)
        .await
        .map_err(|e| QueueError::Stream {
            stream: name.clone(),
            reason: e.to_string(),
        })
}

fn work_queue_stream_config(name: String, description: &str, subject: String) -> stream::Config {
    stream::Config {
        name,
        description: Some(description.to_string()),
        subjects: vec![subject],
        retention: RetentionPolicy::WorkQueue,
        max_age: Duration::from_secs(STREAM_MAX_AGE_SECS),
        max_messages: STREAM_MAX_MESSAGES,
        max_bytes: STREAM_MAX_BYTES,
        ..Default::default()
    }
}

/// Work-queue stream holding domain jobs.
#[must_use]
pub fn job_stream_config(subjects: &Subjects) -> stream::Config {
    work_queue_stream_config(
        subjects.job_stream(),
        JOB_STREAM_DESCRIPTION,
        subjects.job_filter(),
    )
}

/// Work-queue stream holding status updates.
#[must_use]
pub fn status_stream_config(subjects: &Subjects) -> stream::Config {
    work_queue_stream_config(
        subjects.status_stream(),
        STATUS_STREAM_DESCRIPTION,
        subjects.status_filter(),
    )
}

/// Durable pull consumer for domain jobs.
#[must_use]
pub fn job_consumer_config(subjects: &Subjects) -> pull::Config {
    pull::Config {
        name: Some(JOB_CONSUMER_NAME.to_string()),
        durable_name: Some(JOB_CONSUMER_NAME.to_string()),
        description: Some(JOB_CONSUMER_DESCRIPTION.to_string()),
        ack_policy: AckPolicy::Explicit,
        filter_subject: subjects.job_filter(),
        max_deliver: i64::try_from(MAX_DELIVERIES).unwrap_or(i64::MAX),
        ..Default::default()
    }
}

#[async_trait]
impl MessagePublisher for QueueManager {
    async fn publish(&self, subject: String, payload: Vec<u8>) -> Result<(), QueueError> {
        let publish_error = |e: &dyn std::fmt::Display| QueueError::Publish {
            subject: subject.clone(),
            reason: e.to_string(),
        };

        self.jetstream
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| publish_error(&e))?
            .await
            .map_err(|e| publish_error(&e))?;

        debug!(subject = %subject, "Published message");
        Ok(())
    }
}

#[async_trait]
impl JobQueue for QueueManager {
    async fn add_domain_job(&self, job: &DomainJob) -> Result<(), QueueError> {
        let subject = self.subjects.job_subject(&job.reference_id);
        let payload = serde_json::to_vec(job).map_err(|e| QueueError::Serialize {
            subject: subject.clone(),
            reason: e.to_string(),
        })?;

        self.publish(subject.clone(), payload).await?;

        info!(subject = %subject, reference_id = %job.reference_id, "Job published");
        Ok(())
    }
}

/// A JetStream message seen through the [`Delivery`] seam.
pub struct NatsDelivery {
    message: jetstream::Message,
}

impl NatsDelivery {
    #[must_use]
    pub fn new(message: jetstream::Message) -> Self {
        Self { message }
    }
}

#[async_trait]
impl Delivery for NatsDelivery {
    fn subject(&self) -> &str {
        self.message.subject.as_str()
    }

    fn payload(&self) -> &[u8] {
        &self.message.payload
    }

    fn delivery_count(&self) -> Result<u64, QueueError> {
        let info = self.message.info().map_err(|e| QueueError::Metadata {
            subject: self.subject().to_string(),
            reason: e.to_string(),
        })?;
        Ok(u64::try_from(info.delivered).unwrap_or(0))
    }

    async fn ack(&self) -> Result<(), QueueError> {
        self.message.ack().await.map_err(|e| QueueError::Ack {
            subject: self.subject().to_string(),
            reason: e.to_string(),
        })
    }

    async fn nak_with_delay(&self, delay: Duration) -> Result<(), QueueError> {
        self.message
            .ack_with(AckKind::Nak(Some(delay)))
            .await
            .map_err(|e| QueueError::Nak {
                subject: self.subject().to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "nats_tests.rs"]
mod nats_tests;
