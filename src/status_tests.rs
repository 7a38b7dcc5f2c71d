// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::test_support::RecordingPublisher;

    #[tokio::test]
    async fn test_status_published_on_reference_subject() {
        let recorder = Arc::new(RecordingPublisher::default());
        let status = StatusPublisher::new(recorder.clone(), Subjects::new("production"));

        status.send_success("req-42").await.unwrap();

        assert_eq!(
            recorder.subjects(),
            vec!["production.vanityDomainVerifier.status.req-42".to_string()]
        );
        assert_eq!(recorder.statuses(), vec![JobStatus::succeeded("req-42")]);
    }

    #[tokio::test]
    async fn test_failure_status_carries_message_and_dropped() {
        let recorder = Arc::new(RecordingPublisher::default());
        let status = StatusPublisher::new(recorder.clone(), Subjects::new("production"));

        status
            .send_failure("req-7", "Domain verification failed", true)
            .await
            .unwrap();

        let published = recorder.statuses();
        assert_eq!(published.len(), 1);
        assert!(!published[0].success);
        assert!(published[0].dropped);
        assert_eq!(published[0].error_message, "Domain verification failed");
    }

    #[tokio::test]
    async fn test_publish_failure_propagates() {
        let status = StatusPublisher::new(
            Arc::new(RecordingPublisher::failing()),
            Subjects::new("production"),
        );

        let err = status.send_success("req-42").await.unwrap_err();

        assert!(matches!(err, QueueError::Publish { .. }));
    }
}
