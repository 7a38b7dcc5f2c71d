// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Delivery & Retry Controller.
//!
//! Wraps the [`JobProcessor`] with durable-queue semantics. Each delivery moves through
//! `received → processing → {acknowledged | retry-scheduled | dropped}`:
//!
//! - a payload that does not parse is left pending: no ack, no nak, no status
//! - success is acknowledged
//! - a failure below the delivery limit publishes a non-terminal failure status and is
//!   redelivered after [`retry_delay`](crate::reconcilers::retry::retry_delay)
//! - a failure at the delivery limit publishes a dropped status and is acknowledged
//!
//! Failing to publish a failure status or to ack/nak is logged and counted; the
//! decision stands.

use tracing::{error, info, warn};

use crate::errors::JobError;
use crate::jobs::DomainJob;
use crate::metrics;
use crate::queue::Delivery;
use crate::reconcilers::job::JobProcessor;
use crate::reconcilers::retry::{decide, DeliveryDecision};
use crate::status::StatusPublisher;

/// Final state of one delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryState {
    /// The payload did not parse; the delivery was left pending
    Unparsable,
    /// The job was applied and the delivery acknowledged
    Acknowledged,
    /// The job failed and will be redelivered
    RetryScheduled(std::time::Duration),
    /// The job failed for the last time and was removed
    Dropped,
}

/// Decides acknowledge, retry or drop for each delivery.
#[derive(Clone)]
pub struct DeliveryController {
    processor: JobProcessor,
    status: StatusPublisher,
    max_deliveries: u64,
}

impl DeliveryController {
    #[must_use]
    pub fn new(processor: JobProcessor, status: StatusPublisher, max_deliveries: u64) -> Self {
        Self {
            processor,
            status,
            max_deliveries,
        }
    }

    /// Handle one delivery to completion.
    pub async fn handle(&self, delivery: &dyn Delivery) -> DeliveryState {
        let subject = delivery.subject();
        info!(subject = %subject, "Received delivery");

        let job: DomainJob = match serde_json::from_slice(delivery.payload()) {
            Ok(job) => job,
            Err(e) => {
                warn!(
                    subject = %subject,
                    error = %e,
                    "Failed to parse job payload, leaving delivery pending"
                );
                metrics::record_delivery_decision("unparsable");
                return DeliveryState::Unparsable;
            }
        };

        info!(
            subject = %subject,
            reference_id = %job.reference_id,
            hostname = %job.domain.vanity_domain,
            kind = %job.kind,
            "Processing domain job"
        );

        let outcome = self
            .processor
            .process(&job.reference_id, &job.domain, job.kind)
            .await;

        let delivery_count = match &outcome {
            Ok(()) => 0,
            Err(_) => read_delivery_count(delivery),
        };
        let decision = decide(&outcome, delivery_count, self.max_deliveries);
        metrics::record_delivery_decision(decision.as_str());

        match (decision, outcome) {
            (DeliveryDecision::Drop, Err(e)) => {
                error!(
                    subject = %subject,
                    reference_id = %job.reference_id,
                    delivery_count,
                    max_deliveries = self.max_deliveries,
                    error = %e,
                    "Job reached max deliveries, removing it from the queue"
                );
                self.publish_failure(&job.reference_id, &e, true).await;
                ack(delivery).await;
                DeliveryState::Dropped
            }
            (DeliveryDecision::RetryAfter(delay), Err(e)) => {
                warn!(
                    subject = %subject,
                    reference_id = %job.reference_id,
                    delivery_count,
                    retry_after = ?delay,
                    error = %e,
                    "Job failed, scheduling redelivery"
                );
                self.publish_failure(&job.reference_id, &e, false).await;
                if let Err(nak_err) = delivery.nak_with_delay(delay).await {
                    warn!(subject = %subject, error = %nak_err, "Failed to schedule redelivery");
                    metrics::record_ack_failure("nak");
                }
                DeliveryState::RetryScheduled(delay)
            }
            (DeliveryDecision::Ack, _) | (_, Ok(())) => {
                info!(
                    subject = %subject,
                    reference_id = %job.reference_id,
                    "Job processed successfully"
                );
                ack(delivery).await;
                DeliveryState::Acknowledged
            }
        }
    }

    async fn publish_failure(&self, reference_id: &str, err: &JobError, dropped: bool) {
        if let Err(publish_err) = self
            .status
            .send_failure(reference_id, &err.to_string(), dropped)
            .await
        {
            warn!(
                reference_id = %reference_id,
                error = %publish_err,
                "Failed to send status update"
            );
            metrics::record_status_publish_failure(if dropped { "dropped" } else { "failure" });
        }
    }
}

fn read_delivery_count(delivery: &dyn Delivery) -> u64 {
    match delivery.delivery_count() {
        Ok(count) => count,
        Err(e) => {
            warn!(
                subject = %delivery.subject(),
                error = %e,
                "Failed to read delivery count, treating as first delivery"
            );
            0
        }
    }
}

async fn ack(delivery: &dyn Delivery) {
    if let Err(e) = delivery.ack().await {
        warn!(subject = %delivery.subject(), error = %e, "Failed to acknowledge delivery");
        metrics::record_ack_failure("ack");
    }
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod delivery_tests;
