// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status Publisher: emits [`JobStatus`] records on the status stream.
//!
//! Each status is published to `{env}.vanityDomainVerifier.status.{referenceId}`.
//! Publish failures are returned to the caller.

use std::sync::Arc;
use tracing::info;

use crate::errors::QueueError;
use crate::jobs::JobStatus;
use crate::queue::{MessagePublisher, Subjects};

/// Serializes and publishes job status updates.
#[derive(Clone)]
pub struct StatusPublisher {
    publisher: Arc<dyn MessagePublisher>,
    subjects: Subjects,
}

impl StatusPublisher {
    #[must_use]
    pub fn new(publisher: Arc<dyn MessagePublisher>, subjects: Subjects) -> Self {
        Self {
            publisher,
            subjects,
        }
    }

    /// Publish `status` on the subject keyed by its reference id.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Serialize`] or the publisher's error.
    pub async fn send_status_update(&self, status: &JobStatus) -> Result<(), QueueError> {
        let subject = self.subjects.status_subject(&status.reference_id);
        let payload = serde_json::to_vec(status).map_err(|e| QueueError::Serialize {
            subject: subject.clone(),
            reason: e.to_string(),
        })?;

        self.publisher.publish(subject.clone(), payload).await?;

        info!(
            subject = %subject,
            reference_id = %status.reference_id,
            success = status.success,
            dropped = status.dropped,
            "Status update published"
        );
        Ok(())
    }

    /// Publish a terminal success status.
    ///
    /// # Errors
    ///
    /// See [`StatusPublisher::send_status_update`].
    pub async fn send_success(&self, reference_id: &str) -> Result<(), QueueError> {
        self.send_status_update(&JobStatus::succeeded(reference_id))
            .await
    }

    /// Publish a failure status; `dropped` marks it terminal.
    ///
    /// # Errors
    ///
    /// See [`StatusPublisher::send_status_update`].
    pub async fn send_failure(
        &self,
        reference_id: &str,
        error_message: &str,
        dropped: bool,
    ) -> Result<(), QueueError> {
        self.send_status_update(&JobStatus::failed(reference_id, error_message, dropped))
            .await
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
